//! Accounts, the tenant boundary every other entity is scoped by.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier of an account.
///
/// Kept distinct from the plain `i64` ids of other entities so a caller's
/// account can never be passed where a contact or activity id is expected.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct AccountId(i64);

impl AccountId {
  pub const fn new(id: i64) -> Self { Self(id) }

  pub const fn get(self) -> i64 { self.0 }
}

impl fmt::Display for AccountId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { self.0.fmt(f) }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
  pub account_id: AccountId,
  pub name:       String,
  pub created_at: DateTime<Utc>,
}
