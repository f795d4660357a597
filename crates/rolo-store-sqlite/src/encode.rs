//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 UTC strings so that ordering
//! by the column text orders by time. Calendar dates are stored as
//! `YYYY-MM-DD`. Journal snapshots are stored as compact JSON.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use rolo_core::{
  AccountId,
  account::Account,
  activity::Activity,
  activity_type::ActivityType,
  contact::{Contact, ContactSummary},
  journal::{JournalEntry, Journalable},
};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::Decode(format!("timestamp {s:?}: {e}")))
}

// ─── NaiveDate ───────────────────────────────────────────────────────────────

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .map_err(|e| Error::Decode(format!("date {s:?}: {e}")))
}

// ─── Journalable ─────────────────────────────────────────────────────────────

pub fn decode_journalable(kind: &str, id: i64) -> Result<Journalable> {
  match kind {
    "activity" => Ok(Journalable::Activity(id)),
    other => Err(Error::Decode(format!("unknown journalable type: {other:?}"))),
  }
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read from an `accounts` row.
pub struct RawAccount {
  pub account_id: i64,
  pub name:       String,
  pub created_at: String,
}

impl RawAccount {
  pub const COLUMNS: &'static str = "account_id, name, created_at";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      account_id: row.get(0)?,
      name:       row.get(1)?,
      created_at: row.get(2)?,
    })
  }

  pub fn into_account(self) -> Result<Account> {
    Ok(Account {
      account_id: AccountId::new(self.account_id),
      name:       self.name,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

/// Raw values read from a `contacts` row.
pub struct RawContact {
  pub contact_id: i64,
  pub account_id: i64,
  pub first_name: String,
  pub last_name:  Option<String>,
  pub created_at: String,
  pub updated_at: String,
}

impl RawContact {
  pub const COLUMNS: &'static str =
    "contact_id, account_id, first_name, last_name, created_at, updated_at";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      contact_id: row.get(0)?,
      account_id: row.get(1)?,
      first_name: row.get(2)?,
      last_name:  row.get(3)?,
      created_at: row.get(4)?,
      updated_at: row.get(5)?,
    })
  }

  /// The short form needs no decoding, so it is available inside
  /// transactions before any fallible conversion.
  pub fn summary(&self) -> ContactSummary {
    ContactSummary {
      contact_id: self.contact_id,
      first_name: self.first_name.clone(),
      last_name:  self.last_name.clone(),
    }
  }

  pub fn into_contact(self) -> Result<Contact> {
    Ok(Contact {
      contact_id: self.contact_id,
      account_id: AccountId::new(self.account_id),
      first_name: self.first_name,
      last_name:  self.last_name,
      created_at: decode_dt(&self.created_at)?,
      updated_at: decode_dt(&self.updated_at)?,
    })
  }
}

/// Raw values read from an `activity_types` row.
pub struct RawActivityType {
  pub activity_type_id: i64,
  pub account_id:       i64,
  pub name:             String,
  pub created_at:       String,
}

impl RawActivityType {
  pub const COLUMNS: &'static str = "activity_type_id, account_id, name, created_at";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      activity_type_id: row.get(0)?,
      account_id:       row.get(1)?,
      name:             row.get(2)?,
      created_at:       row.get(3)?,
    })
  }

  pub fn into_activity_type(self) -> Result<ActivityType> {
    Ok(ActivityType {
      activity_type_id: self.activity_type_id,
      account_id:       AccountId::new(self.account_id),
      name:             self.name,
      created_at:       decode_dt(&self.created_at)?,
    })
  }
}

/// Raw values read from an `activities` row left-joined with its type.
/// Attendees are loaded by a second query.
pub struct RawActivity {
  pub activity_id:      i64,
  pub account_id:       i64,
  pub summary:          String,
  pub description:      String,
  pub date_it_happened: String,
  pub created_at:       String,
  pub updated_at:       String,
  pub activity_type:    Option<RawActivityType>,
  pub attendees:        Vec<ContactSummary>,
}

impl RawActivity {
  /// `SELECT` prefix every activity query shares; callers append `WHERE`.
  pub const SELECT: &'static str = "SELECT
       a.activity_id, a.account_id, a.summary, a.description,
       a.date_it_happened, a.created_at, a.updated_at,
       t.activity_type_id, t.account_id, t.name, t.created_at
     FROM activities a
     LEFT JOIN activity_types t ON t.activity_type_id = a.activity_type_id";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    let type_id: Option<i64> = row.get(7)?;
    let activity_type = match type_id {
      Some(activity_type_id) => Some(RawActivityType {
        activity_type_id,
        account_id: row.get(8)?,
        name: row.get(9)?,
        created_at: row.get(10)?,
      }),
      None => None,
    };

    Ok(Self {
      activity_id: row.get(0)?,
      account_id: row.get(1)?,
      summary: row.get(2)?,
      description: row.get(3)?,
      date_it_happened: row.get(4)?,
      created_at: row.get(5)?,
      updated_at: row.get(6)?,
      activity_type,
      attendees: Vec::new(),
    })
  }

  pub fn into_activity(self) -> Result<Activity> {
    Ok(Activity {
      activity_id:      self.activity_id,
      account_id:       AccountId::new(self.account_id),
      summary:          self.summary,
      description:      self.description,
      date_it_happened: decode_date(&self.date_it_happened)?,
      activity_type:    self
        .activity_type
        .map(RawActivityType::into_activity_type)
        .transpose()?,
      attendees:        self.attendees,
      created_at:       decode_dt(&self.created_at)?,
      updated_at:       decode_dt(&self.updated_at)?,
    })
  }
}

/// Raw values read from a `journal_entries` row.
pub struct RawJournalEntry {
  pub journal_entry_id: i64,
  pub account_id:       i64,
  pub journalable_type: String,
  pub journalable_id:   i64,
  pub date:             String,
  pub data:             String,
  pub created_at:       String,
}

impl RawJournalEntry {
  pub const COLUMNS: &'static str = "journal_entry_id, account_id, journalable_type, \
                                     journalable_id, date, data, created_at";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      journal_entry_id: row.get(0)?,
      account_id:       row.get(1)?,
      journalable_type: row.get(2)?,
      journalable_id:   row.get(3)?,
      date:             row.get(4)?,
      data:             row.get(5)?,
      created_at:       row.get(6)?,
    })
  }

  pub fn into_entry(self) -> Result<JournalEntry> {
    Ok(JournalEntry {
      journal_entry_id: self.journal_entry_id,
      account_id:       AccountId::new(self.account_id),
      journalable:      decode_journalable(&self.journalable_type, self.journalable_id)?,
      date:             decode_date(&self.date)?,
      data:             serde_json::from_str(&self.data)?,
      created_at:       decode_dt(&self.created_at)?,
    })
  }
}
