//! JSON representations returned by the API.
//!
//! Single resources are wrapped as `{"data": ...}`; listings use the
//! paginated [`Collection`] envelope.

use chrono::{DateTime, NaiveDate, Utc};
use rolo_core::{
  AccountId,
  activity::Activity,
  activity_type::ActivityType,
  contact::{ActivityStatistic, Contact, ContactSummary},
  query::{Page, Sort, YearlyStatistics},
};
use serde::Serialize;

// ─── Envelopes ────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct Item<T> {
  pub data: T,
}

impl<T> Item<T> {
  pub fn new(data: T) -> Self { Self { data } }
}

/// Body of a successful delete.
#[derive(Debug, Serialize)]
pub struct Deleted {
  pub deleted: bool,
  pub id:      i64,
}

impl Deleted {
  pub fn new(id: i64) -> Self { Self { deleted: true, id } }
}

#[derive(Debug, Serialize)]
pub struct Links {
  pub first: String,
  pub last:  String,
  pub prev:  Option<String>,
  pub next:  Option<String>,
}

#[derive(Debug, Serialize)]
pub struct Meta {
  pub current_page: u32,
  pub from:         Option<u64>,
  pub last_page:    u32,
  pub path:         String,
  pub per_page:     u32,
  pub to:           Option<u64>,
  pub total:        u64,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub statistics:   Option<YearlyStatistics>,
}

/// A page of resources with navigation links.
#[derive(Debug, Serialize)]
pub struct Collection<T> {
  pub data:  Vec<T>,
  pub links: Links,
  pub meta:  Meta,
}

impl<T> Collection<T> {
  /// `path` is the listing's URL path without a query string. When the
  /// request carried an explicit sort it is repeated in every link.
  pub fn new(page: Page<T>, path: &str, sort: Option<Sort>) -> Self {
    let current = page.request.page;
    let limit = page.request.limit;
    let last = page.last_page();
    let link = |n: u32| {
      let mut url = format!("{path}?page={n}&limit={limit}");
      if let Some(sort) = sort {
        url.push_str(&format!("&sort={sort}"));
      }
      url
    };

    let links = Links {
      first: link(1),
      last:  link(last),
      prev:  (current > 1).then(|| link(current - 1)),
      next:  (current < last).then(|| link(current + 1)),
    };
    let meta = Meta {
      current_page: current,
      from: page.from(),
      last_page: last,
      path: path.to_owned(),
      per_page: limit,
      to: page.to(),
      total: page.total,
      statistics: None,
    };

    Self {
      data: page.items,
      links,
      meta,
    }
  }

  pub fn with_statistics(mut self, statistics: YearlyStatistics) -> Self {
    self.meta.statistics = Some(statistics);
    self
  }
}

// ─── Resources ────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct AccountRef {
  pub id: AccountId,
}

#[derive(Debug, Serialize)]
pub struct ActivityTypeResource {
  pub id:         i64,
  pub object:     &'static str,
  pub name:       String,
  pub account:    AccountRef,
  pub created_at: DateTime<Utc>,
}

impl From<ActivityType> for ActivityTypeResource {
  fn from(t: ActivityType) -> Self {
    Self {
      id:         t.activity_type_id,
      object:     "activityType",
      name:       t.name,
      account:    AccountRef { id: t.account_id },
      created_at: t.created_at,
    }
  }
}

/// The compact contact embedded in an activity's attendee list.
#[derive(Debug, Serialize)]
pub struct ContactShortResource {
  pub id:            i64,
  pub object:        &'static str,
  pub first_name:    String,
  pub last_name:     Option<String>,
  pub complete_name: String,
}

impl From<ContactSummary> for ContactShortResource {
  fn from(c: ContactSummary) -> Self {
    Self {
      id:            c.contact_id,
      object:        "contact",
      complete_name: c.complete_name(),
      first_name:    c.first_name,
      last_name:     c.last_name,
    }
  }
}

#[derive(Debug, Serialize)]
pub struct ContactResource {
  pub id:            i64,
  pub object:        &'static str,
  pub first_name:    String,
  pub last_name:     Option<String>,
  pub complete_name: String,
  pub account:       AccountRef,
  /// Present on single-contact responses only.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub statistics:    Option<Vec<ActivityStatistic>>,
  pub created_at:    DateTime<Utc>,
  pub updated_at:    DateTime<Utc>,
}

impl From<Contact> for ContactResource {
  fn from(c: Contact) -> Self {
    Self {
      id:            c.contact_id,
      object:        "contact",
      complete_name: c.summary().complete_name(),
      first_name:    c.first_name,
      last_name:     c.last_name,
      account:       AccountRef { id: c.account_id },
      statistics:    None,
      created_at:    c.created_at,
      updated_at:    c.updated_at,
    }
  }
}

#[derive(Debug, Serialize)]
pub struct Attendees {
  pub total:    usize,
  pub contacts: Vec<ContactShortResource>,
}

#[derive(Debug, Serialize)]
pub struct ActivityResource {
  pub id:               i64,
  pub object:           &'static str,
  pub summary:          String,
  pub description:      String,
  pub date_it_happened: NaiveDate,
  pub activity_type:    Option<ActivityTypeResource>,
  pub attendees:        Attendees,
  pub account:          AccountRef,
  pub created_at:       DateTime<Utc>,
  pub updated_at:       DateTime<Utc>,
}

impl From<Activity> for ActivityResource {
  fn from(a: Activity) -> Self {
    Self {
      id:               a.activity_id,
      object:           "activity",
      summary:          a.summary,
      description:      a.description,
      date_it_happened: a.date_it_happened,
      activity_type:    a.activity_type.map(Into::into),
      attendees:        Attendees {
        total:    a.attendees.len(),
        contacts: a.attendees.into_iter().map(Into::into).collect(),
      },
      account:          AccountRef { id: a.account_id },
      created_at:       a.created_at,
      updated_at:       a.updated_at,
    }
  }
}

#[cfg(test)]
mod tests {
  use rolo_core::query::PageRequest;
  use serde_json::json;

  use super::*;

  fn page(n: u32, len: usize, total: u64) -> Page<u8> {
    Page {
      items:   vec![0; len],
      total,
      request: PageRequest::new(n, 3),
    }
  }

  #[test]
  fn middle_page_links_both_ways() {
    let c = Collection::new(page(2, 3, 7), "/api/activities", None);
    assert_eq!(c.links.first, "/api/activities?page=1&limit=3");
    assert_eq!(c.links.last, "/api/activities?page=3&limit=3");
    assert_eq!(c.links.prev.as_deref(), Some("/api/activities?page=1&limit=3"));
    assert_eq!(c.links.next.as_deref(), Some("/api/activities?page=3&limit=3"));
    assert_eq!((c.meta.from, c.meta.to), (Some(4), Some(6)));
  }

  #[test]
  fn sort_is_carried_into_links() {
    let sort = "-date_it_happened".parse().unwrap();
    let c = Collection::new(page(3, 1, 7), "/api/activities", Some(sort));
    assert_eq!(
      c.links.last,
      "/api/activities?page=3&limit=3&sort=-date_it_happened"
    );
    assert!(c.links.next.is_none());
  }

  #[test]
  fn statistics_only_serialized_when_set() {
    let c = Collection::new(page(1, 0, 0), "/api/contacts", None);
    let v = serde_json::to_value(&c).unwrap();
    assert!(v["meta"].get("statistics").is_none());
    assert_eq!(v["meta"]["last_page"], json!(1));
    assert_eq!(v["meta"]["from"], json!(null));

    let mut stats = YearlyStatistics::default();
    stats.0.insert(2024, 2);
    let v = serde_json::to_value(c.with_statistics(stats)).unwrap();
    assert_eq!(v["meta"]["statistics"], json!({"2024": 2}));
  }
}
