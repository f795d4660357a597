//! Per-account activity types: classifications of activities.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::AccountId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityType {
  pub activity_type_id: i64,
  pub account_id:       AccountId,
  pub name:             String,
  pub created_at:       DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewActivityType {
  pub name: String,
}
