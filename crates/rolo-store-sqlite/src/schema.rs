//! SQL schema for the Rolo SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
///
/// `AUTOINCREMENT` keeps ids of deleted rows from being handed out again, so
/// a stale id keeps resolving to "not found".
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS accounts (
    account_id  INTEGER PRIMARY KEY AUTOINCREMENT,
    name        TEXT NOT NULL,
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS contacts (
    contact_id  INTEGER PRIMARY KEY AUTOINCREMENT,
    account_id  INTEGER NOT NULL REFERENCES accounts(account_id),
    first_name  TEXT NOT NULL,
    last_name   TEXT,
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS activity_types (
    activity_type_id INTEGER PRIMARY KEY AUTOINCREMENT,
    account_id       INTEGER NOT NULL REFERENCES accounts(account_id),
    name             TEXT NOT NULL,
    created_at       TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS activities (
    activity_id      INTEGER PRIMARY KEY AUTOINCREMENT,
    account_id       INTEGER NOT NULL REFERENCES accounts(account_id),
    activity_type_id INTEGER REFERENCES activity_types(activity_type_id),
    summary          TEXT NOT NULL,
    description      TEXT NOT NULL,
    date_it_happened TEXT NOT NULL,   -- YYYY-MM-DD
    created_at       TEXT NOT NULL,   -- RFC 3339 UTC, fixed width
    updated_at       TEXT NOT NULL
);

-- Attendance. account_id is denormalised for scoping checks.
CREATE TABLE IF NOT EXISTS activity_contact (
    activity_id INTEGER NOT NULL REFERENCES activities(activity_id),
    contact_id  INTEGER NOT NULL REFERENCES contacts(contact_id),
    account_id  INTEGER NOT NULL REFERENCES accounts(account_id),
    PRIMARY KEY (activity_id, contact_id)
);

-- Derived; rebuilt per contact whenever its attendance changes.
CREATE TABLE IF NOT EXISTS activity_statistics (
    contact_id  INTEGER NOT NULL REFERENCES contacts(contact_id),
    account_id  INTEGER NOT NULL REFERENCES accounts(account_id),
    year        INTEGER NOT NULL,
    count       INTEGER NOT NULL,
    PRIMARY KEY (contact_id, year)
);

-- At most one entry per journalable record.
CREATE TABLE IF NOT EXISTS journal_entries (
    journal_entry_id INTEGER PRIMARY KEY AUTOINCREMENT,
    account_id       INTEGER NOT NULL REFERENCES accounts(account_id),
    journalable_type TEXT NOT NULL,   -- 'activity'
    journalable_id   INTEGER NOT NULL,
    date             TEXT NOT NULL,
    data             TEXT NOT NULL,   -- JSON snapshot
    created_at       TEXT NOT NULL,
    UNIQUE (journalable_type, journalable_id)
);

CREATE INDEX IF NOT EXISTS contacts_account_idx       ON contacts(account_id);
CREATE INDEX IF NOT EXISTS activity_types_account_idx ON activity_types(account_id);
CREATE INDEX IF NOT EXISTS activities_account_idx     ON activities(account_id);
CREATE INDEX IF NOT EXISTS activity_contact_contact_idx ON activity_contact(contact_id);

PRAGMA user_version = 1;
";
