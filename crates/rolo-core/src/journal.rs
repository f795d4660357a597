//! Journal entries: audit records derived from an activity's current state.
//!
//! An activity has at most one journal entry at a time. Updating the activity
//! deletes its entry and records a fresh one.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::{AccountId, activity::NewActivity, contact::ContactSummary};

/// The record a journal entry was derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum Journalable {
  Activity(i64),
}

impl Journalable {
  pub fn kind(&self) -> &'static str {
    match self {
      Self::Activity(_) => "activity",
    }
  }

  pub fn id(&self) -> i64 {
    match self {
      Self::Activity(id) => *id,
    }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalEntry {
  pub journal_entry_id: i64,
  pub account_id:       AccountId,
  pub journalable:      Journalable,
  pub date:             NaiveDate,
  pub data:             serde_json::Value,
  pub created_at:       DateTime<Utc>,
}

/// Snapshot of an activity as stored in [`JournalEntry::data`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityJournalData {
  #[serde(rename = "type")]
  pub kind:          String,
  pub id:            i64,
  pub summary:       String,
  pub description:   String,
  pub activity_type: Option<String>,
  pub day:           u32,
  /// Abbreviated weekday, e.g. `Fri`.
  pub day_name:      String,
  pub month:         u32,
  /// Abbreviated month, e.g. `Mar`.
  pub month_name:    String,
  pub year:          i32,
  pub attendees:     Vec<ContactSummary>,
}

impl ActivityJournalData {
  pub fn new(
    activity_id: i64,
    input: &NewActivity,
    activity_type: Option<String>,
    attendees: Vec<ContactSummary>,
  ) -> Self {
    let date = input.date_it_happened;
    Self {
      kind: Journalable::Activity(activity_id).kind().to_owned(),
      id: activity_id,
      summary: input.summary.clone(),
      description: input.description.clone(),
      activity_type,
      day: date.day(),
      day_name: date.format("%a").to_string(),
      month: date.month(),
      month_name: date.format("%b").to_string(),
      year: date.year(),
      attendees,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn journal_data_describes_the_date() {
    let input = NewActivity {
      summary:          "Lunch".into(),
      description:      "Lunch with Bob".into(),
      date_it_happened: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
      activity_type_id: None,
      contacts:         vec![7],
    };
    let data = ActivityJournalData::new(12, &input, Some("Meal".into()), vec![]);

    assert_eq!(data.kind, "activity");
    assert_eq!(data.id, 12);
    assert_eq!((data.day, data.month, data.year), (1, 3, 2024));
    assert_eq!(data.day_name, "Fri");
    assert_eq!(data.month_name, "Mar");
    assert_eq!(data.activity_type.as_deref(), Some("Meal"));

    let json = serde_json::to_value(&data).unwrap();
    assert_eq!(json["type"], "activity");
  }
}
