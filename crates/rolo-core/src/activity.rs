//! Activities: logged interactions between the account owner and contacts.

use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::{AccountId, activity_type::ActivityType, contact::ContactSummary};

/// Upper bound on `summary`, in characters.
pub const SUMMARY_MAX_CHARS: usize = 100_000;

/// Upper bound on `description`, in characters.
pub const DESCRIPTION_MAX_CHARS: usize = 1_000_000;

/// A stored activity, with its type and attendees resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
  pub activity_id:      i64,
  pub account_id:       AccountId,
  pub summary:          String,
  pub description:      String,
  pub date_it_happened: NaiveDate,
  pub activity_type:    Option<ActivityType>,
  /// Ordered by contact id.
  pub attendees:        Vec<ContactSummary>,
  pub created_at:       DateTime<Utc>,
  pub updated_at:       DateTime<Utc>,
}

impl Activity {
  pub fn attendee_ids(&self) -> Vec<i64> {
    self.attendees.iter().map(|c| c.contact_id).collect()
  }
}

/// Validated input for creating or replacing an activity.
///
/// Updates are full replacements: `activity_type_id: None` clears the type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewActivity {
  pub summary:          String,
  pub description:      String,
  pub date_it_happened: NaiveDate,
  pub activity_type_id: Option<i64>,
  /// Attendee contact ids. Never empty once validated.
  pub contacts:         Vec<i64>,
}

impl NewActivity {
  /// Attendee ids with duplicates removed, first occurrence wins.
  pub fn attendee_ids(&self) -> Vec<i64> {
    let mut seen = HashSet::with_capacity(self.contacts.len());
    let mut ids = self.contacts.clone();
    ids.retain(|id| seen.insert(*id));
    ids
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn attendee_ids_are_deduplicated_in_order() {
    let input = NewActivity {
      summary:          "Lunch".into(),
      description:      "Lunch with Bob".into(),
      date_it_happened: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
      activity_type_id: None,
      contacts:         vec![7, 3, 7, 9, 3],
    };
    assert_eq!(input.attendee_ids(), vec![7, 3, 9]);
  }

  #[test]
  fn attendee_ids_scale_linearly() {
    let contacts: Vec<i64> = (0..200_000).map(|i| (i * 7919) % 100_000).collect();
    let input = NewActivity {
      summary:          "Party".into(),
      description:      "Everyone came twice".into(),
      date_it_happened: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
      activity_type_id: None,
      contacts:         contacts.clone(),
    };

    let start = std::time::Instant::now();
    let ids = input.attendee_ids();
    assert!(start.elapsed() < std::time::Duration::from_secs(2));

    assert_eq!(ids.len(), 100_000);
    assert_eq!(ids[..], contacts[..100_000]);
  }
}
