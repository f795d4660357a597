//! Error types for `rolo-core`.

use thiserror::Error;

/// A scoped lookup that found nothing in the caller's account.
///
/// Rows owned by another account are reported exactly like rows that do not
/// exist at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Missing {
  #[error("account {0} not found")]
  Account(i64),

  #[error("activity {0} not found")]
  Activity(i64),

  #[error("activity type {0} not found")]
  ActivityType(i64),

  #[error("contact {0} not found")]
  Contact(i64),
}

#[derive(Debug, Error)]
pub enum Error {
  #[error(transparent)]
  NotFound(#[from] Missing),

  /// A write was rejected by a storage constraint (foreign key, uniqueness).
  #[error("invalid parameters: {0}")]
  InvalidParameters(String),

  #[error("invalid sort criteria: {0:?}")]
  InvalidSort(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
