//! Error type for `rolo-store-sqlite`.

use rolo_core::Missing;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  /// A stored column could not be decoded into its domain type.
  #[error("decode error: {0}")]
  Decode(String),

  #[error(transparent)]
  NotFound(#[from] Missing),
}

impl Error {
  /// `true` when SQLite rejected a write because of a constraint (foreign
  /// key, uniqueness, `NOT NULL`, `CHECK`).
  pub fn is_constraint_violation(&self) -> bool {
    matches!(
      self,
      Error::Database(tokio_rusqlite::Error::Rusqlite(
        rusqlite::Error::SqliteFailure(e, _)
      )) if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
  }
}

impl From<Error> for rolo_core::Error {
  fn from(e: Error) -> Self {
    match e {
      Error::NotFound(missing) => rolo_core::Error::NotFound(missing),
      e if e.is_constraint_violation() => {
        rolo_core::Error::InvalidParameters(e.to_string())
      }
      e => rolo_core::Error::Store(Box::new(e)),
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
