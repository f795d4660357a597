//! [`SqliteStore`], the SQLite implementation of [`ScopedStore`].

use std::{collections::BTreeSet, path::Path};

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension as _};

use rolo_core::{
  AccountId, Missing,
  account::Account,
  activity::{Activity, NewActivity},
  activity_type::{ActivityType, NewActivityType},
  contact::{ActivityStatistic, Contact, ContactSummary, NewContact},
  journal::{ActivityJournalData, JournalEntry, Journalable},
  query::{Page, PageRequest, Sort, SortField, YearlyStatistics},
  store::ScopedStore,
};

use crate::{
  Result,
  encode::{
    RawAccount, RawActivity, RawActivityType, RawContact, RawJournalEntry,
    encode_date, encode_dt,
  },
  schema::SCHEMA,
};

/// Outcome of work done inside a connection call: either the value, or the
/// scoped reference that could not be resolved. A `Missing` outcome never
/// commits.
type Scoped<T> = std::result::Result<T, Missing>;

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Rolo activity store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// List activities of `account`, optionally only those attended by
  /// `contact_id`.
  async fn page_activities(
    &self,
    account: AccountId,
    contact_id: Option<i64>,
    sort: Sort,
    page: PageRequest,
  ) -> Result<Page<Activity>> {
    let account_id = account.get();

    let listing: Scoped<(u64, Vec<RawActivity>)> = self
      .conn
      .call(move |conn| {
        if let Some(id) = contact_id
          && find_contact(conn, account_id, id)?.is_none()
        {
          return Ok(Err(Missing::Contact(id)));
        }
        Ok(Ok(query_activities(conn, account_id, contact_id, sort, page)?))
      })
      .await?;

    let (total, raws) = listing?;
    let items = raws
      .into_iter()
      .map(RawActivity::into_activity)
      .collect::<Result<_>>()?;
    Ok(Page { items, total, request: page })
  }
}

// ─── Synchronous helpers ─────────────────────────────────────────────────────
//
// These run on the connection thread, inside `Connection::call`. Passing a
// `&Transaction` works through deref.

fn find_contact(
  conn: &Connection,
  account_id: i64,
  contact_id: i64,
) -> rusqlite::Result<Option<RawContact>> {
  conn
    .query_row(
      &format!(
        "SELECT {} FROM contacts WHERE contact_id = ?1 AND account_id = ?2",
        RawContact::COLUMNS
      ),
      rusqlite::params![contact_id, account_id],
      RawContact::from_row,
    )
    .optional()
}

fn find_activity_type(
  conn: &Connection,
  account_id: i64,
  activity_type_id: i64,
) -> rusqlite::Result<Option<RawActivityType>> {
  conn
    .query_row(
      &format!(
        "SELECT {} FROM activity_types WHERE activity_type_id = ?1 AND account_id = ?2",
        RawActivityType::COLUMNS
      ),
      rusqlite::params![activity_type_id, account_id],
      RawActivityType::from_row,
    )
    .optional()
}

fn load_attendees(
  conn: &Connection,
  activity_id: i64,
) -> rusqlite::Result<Vec<ContactSummary>> {
  let mut stmt = conn.prepare_cached(
    "SELECT c.contact_id, c.first_name, c.last_name
     FROM activity_contact ac
     JOIN contacts c ON c.contact_id = ac.contact_id
     WHERE ac.activity_id = ?1
     ORDER BY c.contact_id",
  )?;
  let rows = stmt
    .query_map(rusqlite::params![activity_id], |row| {
      Ok(ContactSummary {
        contact_id: row.get(0)?,
        first_name: row.get(1)?,
        last_name:  row.get(2)?,
      })
    })?
    .collect();
  rows
}

fn find_activity(
  conn: &Connection,
  account_id: i64,
  activity_id: i64,
) -> rusqlite::Result<Option<RawActivity>> {
  let raw = conn
    .query_row(
      &format!(
        "{} WHERE a.activity_id = ?1 AND a.account_id = ?2",
        RawActivity::SELECT
      ),
      rusqlite::params![activity_id, account_id],
      RawActivity::from_row,
    )
    .optional()?;

  match raw {
    Some(mut raw) => {
      raw.attendees = load_attendees(conn, raw.activity_id)?;
      Ok(Some(raw))
    }
    None => Ok(None),
  }
}

fn query_activities(
  conn: &Connection,
  account_id: i64,
  contact_id: Option<i64>,
  sort: Sort,
  page: PageRequest,
) -> rusqlite::Result<(u64, Vec<RawActivity>)> {
  let filter = "a.account_id = ?1
     AND (?2 IS NULL OR EXISTS (
       SELECT 1 FROM activity_contact ac
       WHERE ac.activity_id = a.activity_id AND ac.contact_id = ?2
     ))";

  let total: i64 = conn.query_row(
    &format!("SELECT COUNT(*) FROM activities a WHERE {filter}"),
    rusqlite::params![account_id, contact_id],
    |row| row.get(0),
  )?;

  // The column comes from a closed enum, never from request text.
  let column = match sort.field {
    SortField::CreatedAt => "a.created_at",
    SortField::UpdatedAt => "a.updated_at",
    SortField::DateItHappened => "a.date_it_happened",
  };
  let dir = sort.direction.as_sql();
  let sql = format!(
    "{} WHERE {filter}
     ORDER BY {column} {dir}, a.activity_id {dir}
     LIMIT ?3 OFFSET ?4",
    RawActivity::SELECT
  );

  let mut stmt = conn.prepare(&sql)?;
  let mut raws = stmt
    .query_map(
      rusqlite::params![
        account_id,
        contact_id,
        i64::from(page.limit),
        page.offset() as i64,
      ],
      RawActivity::from_row,
    )?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  for raw in &mut raws {
    raw.attendees = load_attendees(conn, raw.activity_id)?;
  }

  Ok((total as u64, raws))
}

/// Resolve the activity type and attendees an input refers to, within the
/// caller's account. Attendees are checked first.
fn resolve_references(
  conn: &Connection,
  account_id: i64,
  input: &NewActivity,
) -> rusqlite::Result<Scoped<(Option<RawActivityType>, Vec<ContactSummary>)>> {
  let mut attendees = Vec::new();
  for id in input.attendee_ids() {
    match find_contact(conn, account_id, id)? {
      Some(contact) => attendees.push(contact.summary()),
      None => return Ok(Err(Missing::Contact(id))),
    }
  }

  let activity_type = match input.activity_type_id {
    Some(id) => match find_activity_type(conn, account_id, id)? {
      Some(t) => Some(t),
      None => return Ok(Err(Missing::ActivityType(id))),
    },
    None => None,
  };

  Ok(Ok((activity_type, attendees)))
}

fn attendee_ids(conn: &Connection, activity_id: i64) -> rusqlite::Result<Vec<i64>> {
  let mut stmt = conn.prepare_cached(
    "SELECT contact_id FROM activity_contact WHERE activity_id = ?1 ORDER BY contact_id",
  )?;
  let ids = stmt
    .query_map(rusqlite::params![activity_id], |row| row.get(0))?
    .collect();
  ids
}

fn attach(
  conn: &Connection,
  account_id: i64,
  activity_id: i64,
  contact_id: i64,
) -> rusqlite::Result<()> {
  conn.execute(
    "INSERT INTO activity_contact (activity_id, contact_id, account_id)
     VALUES (?1, ?2, ?3)",
    rusqlite::params![activity_id, contact_id, account_id],
  )?;
  Ok(())
}

fn detach(conn: &Connection, activity_id: i64, contact_id: i64) -> rusqlite::Result<()> {
  conn.execute(
    "DELETE FROM activity_contact WHERE activity_id = ?1 AND contact_id = ?2",
    rusqlite::params![activity_id, contact_id],
  )?;
  Ok(())
}

/// Rebuild a contact's per-year attendance counts from the join table.
fn recalculate_statistics(
  conn: &Connection,
  account_id: i64,
  contact_id: i64,
) -> rusqlite::Result<()> {
  conn.execute(
    "DELETE FROM activity_statistics WHERE contact_id = ?1",
    rusqlite::params![contact_id],
  )?;
  conn.execute(
    "INSERT INTO activity_statistics (contact_id, account_id, year, count)
     SELECT ?1, ?2, CAST(strftime('%Y', a.date_it_happened) AS INTEGER), COUNT(*)
     FROM activity_contact ac
     JOIN activities a ON a.activity_id = ac.activity_id
     WHERE ac.contact_id = ?1
     GROUP BY strftime('%Y', a.date_it_happened)",
    rusqlite::params![contact_id, account_id],
  )?;
  Ok(())
}

fn delete_journal_entry(conn: &Connection, journalable: Journalable) -> rusqlite::Result<usize> {
  conn.execute(
    "DELETE FROM journal_entries
     WHERE journalable_type = ?1 AND journalable_id = ?2",
    rusqlite::params![journalable.kind(), journalable.id()],
  )
}

fn record_journal_entry(
  conn: &Connection,
  account_id: i64,
  data: &ActivityJournalData,
  date: &str,
  now: &str,
) -> tokio_rusqlite::Result<()> {
  let journalable = Journalable::Activity(data.id);
  let json = serde_json::to_string(data)
    .map_err(|e| tokio_rusqlite::Error::Other(Box::new(e)))?;
  conn.execute(
    "INSERT INTO journal_entries
       (account_id, journalable_type, journalable_id, date, data, created_at)
     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    rusqlite::params![account_id, journalable.kind(), journalable.id(), date, json, now],
  )?;
  Ok(())
}

/// Re-read an activity that was just written in the same transaction.
fn reload_activity(
  conn: &Connection,
  account_id: i64,
  activity_id: i64,
) -> rusqlite::Result<RawActivity> {
  find_activity(conn, account_id, activity_id)?.ok_or(rusqlite::Error::QueryReturnedNoRows)
}

// ─── ScopedStore impl ────────────────────────────────────────────────────────

impl ScopedStore for SqliteStore {
  type Error = crate::Error;

  // ── Accounts ──────────────────────────────────────────────────────────────

  async fn create_account(&self, name: String) -> Result<Account> {
    let now = encode_dt(Utc::now());

    let raw: RawAccount = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO accounts (name, created_at) VALUES (?1, ?2)",
          rusqlite::params![name, now],
        )?;
        Ok(RawAccount {
          account_id: conn.last_insert_rowid(),
          name,
          created_at: now,
        })
      })
      .await?;

    raw.into_account()
  }

  async fn get_account(&self, id: AccountId) -> Result<Option<Account>> {
    let raw: Option<RawAccount> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {} FROM accounts WHERE account_id = ?1", RawAccount::COLUMNS),
              rusqlite::params![id.get()],
              RawAccount::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawAccount::into_account).transpose()
  }

  // ── Contacts ──────────────────────────────────────────────────────────────

  async fn add_contact(&self, account: AccountId, input: NewContact) -> Result<Contact> {
    let now = encode_dt(Utc::now());
    let account_id = account.get();

    let raw: RawContact = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO contacts (account_id, first_name, last_name, created_at, updated_at)
           VALUES (?1, ?2, ?3, ?4, ?4)",
          rusqlite::params![account_id, input.first_name, input.last_name, now],
        )?;
        Ok(RawContact {
          contact_id: conn.last_insert_rowid(),
          account_id,
          first_name: input.first_name,
          last_name: input.last_name,
          created_at: now.clone(),
          updated_at: now,
        })
      })
      .await?;

    raw.into_contact()
  }

  async fn get_contact(&self, account: AccountId, contact_id: i64) -> Result<Option<Contact>> {
    let account_id = account.get();

    let raw = self
      .conn
      .call(move |conn| Ok(find_contact(conn, account_id, contact_id)?))
      .await?;

    raw.map(RawContact::into_contact).transpose()
  }

  async fn list_contacts(&self, account: AccountId, page: PageRequest) -> Result<Page<Contact>> {
    let account_id = account.get();

    let (total, raws): (u64, Vec<RawContact>) = self
      .conn
      .call(move |conn| {
        let total: i64 = conn.query_row(
          "SELECT COUNT(*) FROM contacts WHERE account_id = ?1",
          rusqlite::params![account_id],
          |row| row.get(0),
        )?;

        let mut stmt = conn.prepare(&format!(
          "SELECT {} FROM contacts WHERE account_id = ?1
           ORDER BY contact_id LIMIT ?2 OFFSET ?3",
          RawContact::COLUMNS
        ))?;
        let rows = stmt
          .query_map(
            rusqlite::params![account_id, i64::from(page.limit), page.offset() as i64],
            RawContact::from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok((total as u64, rows))
      })
      .await?;

    let items = raws
      .into_iter()
      .map(RawContact::into_contact)
      .collect::<Result<_>>()?;
    Ok(Page { items, total, request: page })
  }

  async fn activity_statistics(
    &self,
    account: AccountId,
    contact_id: i64,
  ) -> Result<Vec<ActivityStatistic>> {
    let account_id = account.get();

    let stats: Scoped<Vec<ActivityStatistic>> = self
      .conn
      .call(move |conn| {
        if find_contact(conn, account_id, contact_id)?.is_none() {
          return Ok(Err(Missing::Contact(contact_id)));
        }

        let mut stmt = conn.prepare(
          "SELECT year, count FROM activity_statistics
           WHERE contact_id = ?1 AND account_id = ?2
           ORDER BY year DESC",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![contact_id, account_id], |row| {
            Ok(ActivityStatistic {
              year:  row.get(0)?,
              count: row.get(1)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(Ok(rows))
      })
      .await?;

    Ok(stats?)
  }

  // ── Activity types ────────────────────────────────────────────────────────

  async fn add_activity_type(
    &self,
    account: AccountId,
    input: NewActivityType,
  ) -> Result<ActivityType> {
    let now = encode_dt(Utc::now());
    let account_id = account.get();

    let raw: RawActivityType = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO activity_types (account_id, name, created_at) VALUES (?1, ?2, ?3)",
          rusqlite::params![account_id, input.name, now],
        )?;
        Ok(RawActivityType {
          activity_type_id: conn.last_insert_rowid(),
          account_id,
          name: input.name,
          created_at: now,
        })
      })
      .await?;

    raw.into_activity_type()
  }

  async fn get_activity_type(
    &self,
    account: AccountId,
    activity_type_id: i64,
  ) -> Result<Option<ActivityType>> {
    let account_id = account.get();

    let raw = self
      .conn
      .call(move |conn| Ok(find_activity_type(conn, account_id, activity_type_id)?))
      .await?;

    raw.map(RawActivityType::into_activity_type).transpose()
  }

  async fn list_activity_types(&self, account: AccountId) -> Result<Vec<ActivityType>> {
    let account_id = account.get();

    let raws: Vec<RawActivityType> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {} FROM activity_types WHERE account_id = ?1 ORDER BY name, activity_type_id",
          RawActivityType::COLUMNS
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![account_id], RawActivityType::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawActivityType::into_activity_type).collect()
  }

  // ── Activities ────────────────────────────────────────────────────────────

  async fn list_activities(
    &self,
    account: AccountId,
    sort: Sort,
    page: PageRequest,
  ) -> Result<Page<Activity>> {
    self.page_activities(account, None, sort, page).await
  }

  async fn list_contact_activities(
    &self,
    account: AccountId,
    contact_id: i64,
    sort: Sort,
    page: PageRequest,
  ) -> Result<Page<Activity>> {
    self.page_activities(account, Some(contact_id), sort, page).await
  }

  async fn get_activity(&self, account: AccountId, activity_id: i64) -> Result<Option<Activity>> {
    let account_id = account.get();

    let raw = self
      .conn
      .call(move |conn| Ok(find_activity(conn, account_id, activity_id)?))
      .await?;

    raw.map(RawActivity::into_activity).transpose()
  }

  async fn create_activity(&self, account: AccountId, input: NewActivity) -> Result<Activity> {
    let now = encode_dt(Utc::now());
    let account_id = account.get();

    let created: Scoped<RawActivity> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let (activity_type, attendees) = match resolve_references(&tx, account_id, &input)? {
          Ok(refs) => refs,
          Err(missing) => return Ok(Err(missing)),
        };

        let date = encode_date(input.date_it_happened);
        tx.execute(
          "INSERT INTO activities (
             account_id, activity_type_id, summary, description,
             date_it_happened, created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
          rusqlite::params![
            account_id,
            activity_type.as_ref().map(|t| t.activity_type_id),
            input.summary,
            input.description,
            date,
            now,
          ],
        )?;
        let activity_id = tx.last_insert_rowid();

        for contact in &attendees {
          attach(&tx, account_id, activity_id, contact.contact_id)?;
          recalculate_statistics(&tx, account_id, contact.contact_id)?;
        }

        let journal = ActivityJournalData::new(
          activity_id,
          &input,
          activity_type.map(|t| t.name),
          attendees,
        );
        record_journal_entry(&tx, account_id, &journal, &date, &now)?;

        let raw = reload_activity(&tx, account_id, activity_id)?;
        tx.commit()?;
        Ok(Ok(raw))
      })
      .await?;

    let activity = created?.into_activity()?;
    tracing::debug!(
      account = %account,
      activity_id = activity.activity_id,
      attendees = activity.attendees.len(),
      "activity created"
    );
    Ok(activity)
  }

  async fn update_activity(
    &self,
    account: AccountId,
    activity_id: i64,
    input: NewActivity,
  ) -> Result<Activity> {
    let now = encode_dt(Utc::now());
    let account_id = account.get();

    let updated: Scoped<RawActivity> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        if find_activity(&tx, account_id, activity_id)?.is_none() {
          return Ok(Err(Missing::Activity(activity_id)));
        }

        let (activity_type, attendees) = match resolve_references(&tx, account_id, &input)? {
          Ok(refs) => refs,
          Err(missing) => return Ok(Err(missing)),
        };

        let date = encode_date(input.date_it_happened);
        tx.execute(
          "UPDATE activities
           SET activity_type_id = ?1, summary = ?2, description = ?3,
               date_it_happened = ?4, updated_at = ?5
           WHERE activity_id = ?6 AND account_id = ?7",
          rusqlite::params![
            activity_type.as_ref().map(|t| t.activity_type_id),
            input.summary,
            input.description,
            date,
            now,
            activity_id,
            account_id,
          ],
        )?;

        // Reconcile attendance.
        let existing: BTreeSet<i64> = attendee_ids(&tx, activity_id)?.into_iter().collect();
        let wanted: BTreeSet<i64> = attendees.iter().map(|c| c.contact_id).collect();

        for id in existing.difference(&wanted) {
          detach(&tx, activity_id, *id)?;
        }
        for id in wanted.difference(&existing) {
          attach(&tx, account_id, activity_id, *id)?;
        }

        // The date may have moved between years, so retained attendees are
        // recounted too.
        for id in existing.union(&wanted) {
          recalculate_statistics(&tx, account_id, *id)?;
        }

        delete_journal_entry(&tx, Journalable::Activity(activity_id))?;
        let journal = ActivityJournalData::new(
          activity_id,
          &input,
          activity_type.map(|t| t.name),
          attendees,
        );
        record_journal_entry(&tx, account_id, &journal, &date, &now)?;

        let raw = reload_activity(&tx, account_id, activity_id)?;
        tx.commit()?;
        Ok(Ok(raw))
      })
      .await?;

    let activity = updated?.into_activity()?;
    tracing::debug!(
      account = %account,
      activity_id,
      attendees = activity.attendees.len(),
      "activity updated"
    );
    Ok(activity)
  }

  async fn delete_activity(&self, account: AccountId, activity_id: i64) -> Result<i64> {
    let account_id = account.get();

    let deleted: Scoped<i64> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        if find_activity(&tx, account_id, activity_id)?.is_none() {
          return Ok(Err(Missing::Activity(activity_id)));
        }

        let former = attendee_ids(&tx, activity_id)?;

        delete_journal_entry(&tx, Journalable::Activity(activity_id))?;
        tx.execute(
          "DELETE FROM activity_contact WHERE activity_id = ?1",
          rusqlite::params![activity_id],
        )?;
        tx.execute(
          "DELETE FROM activities WHERE activity_id = ?1 AND account_id = ?2",
          rusqlite::params![activity_id, account_id],
        )?;

        for id in former {
          recalculate_statistics(&tx, account_id, id)?;
        }

        tx.commit()?;
        Ok(Ok(activity_id))
      })
      .await?;

    let id = deleted?;
    tracing::debug!(account = %account, activity_id = id, "activity deleted");
    Ok(id)
  }

  async fn yearly_activity_statistics(&self, account: AccountId) -> Result<YearlyStatistics> {
    let account_id = account.get();

    let rows: Vec<(i32, u32)> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT CAST(strftime('%Y', date_it_happened) AS INTEGER) AS year, COUNT(*)
           FROM activities
           WHERE account_id = ?1
           GROUP BY year",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![account_id], |row| Ok((row.get(0)?, row.get(1)?)))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(YearlyStatistics(rows.into_iter().collect()))
  }

  // ── Journal ───────────────────────────────────────────────────────────────

  async fn journal_entries(
    &self,
    account: AccountId,
    activity_id: i64,
  ) -> Result<Vec<JournalEntry>> {
    let account_id = account.get();
    let journalable = Journalable::Activity(activity_id);

    let raws: Vec<RawJournalEntry> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {} FROM journal_entries
           WHERE journalable_type = ?1 AND journalable_id = ?2 AND account_id = ?3
           ORDER BY journal_entry_id",
          RawJournalEntry::COLUMNS
        ))?;
        let rows = stmt
          .query_map(
            rusqlite::params![journalable.kind(), journalable.id(), account_id],
            RawJournalEntry::from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawJournalEntry::into_entry).collect()
  }
}
