//! Ordering and pagination parameters shared by every listing.

use std::{collections::BTreeMap, fmt, str::FromStr};

use serde::Serialize;

use crate::Error;

// ─── Sorting ─────────────────────────────────────────────────────────────────

/// Columns an activity listing can be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
  #[default]
  CreatedAt,
  UpdatedAt,
  DateItHappened,
}

impl SortField {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::CreatedAt => "created_at",
      Self::UpdatedAt => "updated_at",
      Self::DateItHappened => "date_it_happened",
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
  #[default]
  Asc,
  Desc,
}

impl SortDirection {
  pub fn as_sql(self) -> &'static str {
    match self {
      Self::Asc => "ASC",
      Self::Desc => "DESC",
    }
  }
}

/// A sort criterion. Parsed from `field` or `-field` (descending).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Sort {
  pub field:     SortField,
  pub direction: SortDirection,
}

impl FromStr for Sort {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let (direction, name) = match s.strip_prefix('-') {
      Some(rest) => (SortDirection::Desc, rest),
      None => (SortDirection::Asc, s),
    };
    let field = match name {
      "created_at" => SortField::CreatedAt,
      "updated_at" => SortField::UpdatedAt,
      "date_it_happened" => SortField::DateItHappened,
      _ => return Err(Error::InvalidSort(s.to_owned())),
    };
    Ok(Self { field, direction })
  }
}

impl fmt::Display for Sort {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if self.direction == SortDirection::Desc {
      f.write_str("-")?;
    }
    f.write_str(self.field.as_str())
  }
}

// ─── Pagination ──────────────────────────────────────────────────────────────

/// A 1-based page of `limit` items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
  pub page:  u32,
  pub limit: u32,
}

impl PageRequest {
  /// Both values are clamped to at least 1.
  pub fn new(page: u32, limit: u32) -> Self {
    Self {
      page:  page.max(1),
      limit: limit.max(1),
    }
  }

  pub fn offset(&self) -> u64 { u64::from(self.page - 1) * u64::from(self.limit) }
}

impl Default for PageRequest {
  fn default() -> Self { Self::new(1, 10) }
}

/// One page of a listing plus the size of the whole listing.
#[derive(Debug, Clone)]
pub struct Page<T> {
  pub items:   Vec<T>,
  pub total:   u64,
  pub request: PageRequest,
}

impl<T> Page<T> {
  /// Number of the last page; an empty listing still has one page.
  pub fn last_page(&self) -> u32 {
    let limit = u64::from(self.request.limit);
    let pages = self.total.div_ceil(limit).max(1);
    u32::try_from(pages).unwrap_or(u32::MAX)
  }

  /// 1-based position of the first item on this page, if any.
  pub fn from(&self) -> Option<u64> {
    (!self.items.is_empty()).then(|| self.request.offset() + 1)
  }

  /// 1-based position of the last item on this page, if any.
  pub fn to(&self) -> Option<u64> {
    (!self.items.is_empty()).then(|| self.request.offset() + self.items.len() as u64)
  }

  pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
    Page {
      items:   self.items.into_iter().map(f).collect(),
      total:   self.total,
      request: self.request,
    }
  }
}

// ─── Statistics ──────────────────────────────────────────────────────────────

/// Number of activities per calendar year of `date_it_happened`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct YearlyStatistics(pub BTreeMap<i32, u32>);

impl YearlyStatistics {
  pub fn count_for(&self, year: i32) -> u32 { self.0.get(&year).copied().unwrap_or(0) }

  pub fn total(&self) -> u32 { self.0.values().sum() }
}
