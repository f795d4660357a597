//! The `ScopedStore` trait.
//!
//! Every method takes the caller's [`AccountId`] explicitly; rows owned by
//! any other account are invisible. Storage backends (e.g.
//! `rolo-store-sqlite`) implement it, and the API layer depends only on this
//! abstraction.

use std::future::Future;

use crate::{
  AccountId,
  account::Account,
  activity::{Activity, NewActivity},
  activity_type::{ActivityType, NewActivityType},
  contact::{ActivityStatistic, Contact, NewContact},
  journal::JournalEntry,
  query::{Page, PageRequest, Sort, YearlyStatistics},
};

/// Abstraction over an account-scoped activity store.
///
/// Single-entity lookups return `None` for rows that are absent or owned by
/// another account. Mutations and relational listings report the same case as
/// a [`Missing`](crate::Missing) error, which the backend error converts into
/// [`Error::NotFound`](crate::Error::NotFound).
///
/// Multi-entity mutations (create, update, delete of activities) are atomic:
/// when any step fails, including a scoped reference check, nothing is
/// written.
pub trait ScopedStore: Send + Sync {
  type Error: std::error::Error + Into<crate::Error> + Send + Sync + 'static;

  // ── Accounts ──────────────────────────────────────────────────────────

  fn create_account(
    &self,
    name: String,
  ) -> impl Future<Output = Result<Account, Self::Error>> + Send + '_;

  fn get_account(
    &self,
    id: AccountId,
  ) -> impl Future<Output = Result<Option<Account>, Self::Error>> + Send + '_;

  // ── Contacts ──────────────────────────────────────────────────────────

  fn add_contact(
    &self,
    account: AccountId,
    input: NewContact,
  ) -> impl Future<Output = Result<Contact, Self::Error>> + Send + '_;

  fn get_contact(
    &self,
    account: AccountId,
    contact_id: i64,
  ) -> impl Future<Output = Result<Option<Contact>, Self::Error>> + Send + '_;

  /// Contacts of the account ordered by id.
  fn list_contacts(
    &self,
    account: AccountId,
    page: PageRequest,
  ) -> impl Future<Output = Result<Page<Contact>, Self::Error>> + Send + '_;

  /// Per-year attendance counts for a contact, most recent year first.
  fn activity_statistics(
    &self,
    account: AccountId,
    contact_id: i64,
  ) -> impl Future<Output = Result<Vec<ActivityStatistic>, Self::Error>> + Send + '_;

  // ── Activity types ────────────────────────────────────────────────────

  fn add_activity_type(
    &self,
    account: AccountId,
    input: NewActivityType,
  ) -> impl Future<Output = Result<ActivityType, Self::Error>> + Send + '_;

  fn get_activity_type(
    &self,
    account: AccountId,
    activity_type_id: i64,
  ) -> impl Future<Output = Result<Option<ActivityType>, Self::Error>> + Send + '_;

  fn list_activity_types(
    &self,
    account: AccountId,
  ) -> impl Future<Output = Result<Vec<ActivityType>, Self::Error>> + Send + '_;

  // ── Activities ────────────────────────────────────────────────────────

  fn list_activities(
    &self,
    account: AccountId,
    sort: Sort,
    page: PageRequest,
  ) -> impl Future<Output = Result<Page<Activity>, Self::Error>> + Send + '_;

  /// Activities attended by one contact. Fails with
  /// [`Missing::Contact`](crate::Missing::Contact) if the contact is not in
  /// the account.
  fn list_contact_activities(
    &self,
    account: AccountId,
    contact_id: i64,
    sort: Sort,
    page: PageRequest,
  ) -> impl Future<Output = Result<Page<Activity>, Self::Error>> + Send + '_;

  fn get_activity(
    &self,
    account: AccountId,
    activity_id: i64,
  ) -> impl Future<Output = Result<Option<Activity>, Self::Error>> + Send + '_;

  /// Persist a new activity, its journal entry, and its attendee
  /// associations, then recompute each attendee's statistics.
  fn create_activity(
    &self,
    account: AccountId,
    input: NewActivity,
  ) -> impl Future<Output = Result<Activity, Self::Error>> + Send + '_;

  /// Replace an activity's fields, re-record its journal entry, and reconcile
  /// its attendees. Statistics are recomputed for every contact that was or
  /// is an attendee.
  fn update_activity(
    &self,
    account: AccountId,
    activity_id: i64,
    input: NewActivity,
  ) -> impl Future<Output = Result<Activity, Self::Error>> + Send + '_;

  /// Delete an activity with its journal entry and attendee associations.
  /// Former attendees' statistics are recomputed. Returns the deleted id.
  fn delete_activity(
    &self,
    account: AccountId,
    activity_id: i64,
  ) -> impl Future<Output = Result<i64, Self::Error>> + Send + '_;

  fn yearly_activity_statistics(
    &self,
    account: AccountId,
  ) -> impl Future<Output = Result<YearlyStatistics, Self::Error>> + Send + '_;

  // ── Journal ───────────────────────────────────────────────────────────

  /// Journal entries recorded for an activity. Holds at most one entry.
  fn journal_entries(
    &self,
    account: AccountId,
    activity_id: i64,
  ) -> impl Future<Output = Result<Vec<JournalEntry>, Self::Error>> + Send + '_;
}
