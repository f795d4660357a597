//! Contacts and their derived activity statistics.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::AccountId;

/// A person record owned by an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
  pub contact_id: i64,
  pub account_id: AccountId,
  pub first_name: String,
  pub last_name:  Option<String>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl Contact {
  pub fn summary(&self) -> ContactSummary {
    ContactSummary {
      contact_id: self.contact_id,
      first_name: self.first_name.clone(),
      last_name:  self.last_name.clone(),
    }
  }
}

/// The short form of a contact embedded in activities and journal entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactSummary {
  pub contact_id: i64,
  pub first_name: String,
  pub last_name:  Option<String>,
}

impl ContactSummary {
  /// First and last name joined by a space, or just the first name.
  pub fn complete_name(&self) -> String {
    match &self.last_name {
      Some(last) if !last.is_empty() => format!("{} {last}", self.first_name),
      _ => self.first_name.clone(),
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewContact {
  pub first_name: String,
  #[serde(default)]
  pub last_name:  Option<String>,
}

/// Number of activities a contact attended in one calendar year.
///
/// Rebuilt from scratch whenever the contact's attendance changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityStatistic {
  pub year:  i32,
  pub count: u32,
}
