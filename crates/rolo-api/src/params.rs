//! Query-string and path parameters shared by the listing endpoints.

use axum::{
  Json,
  extract::{
    Path, Query,
    rejection::{JsonRejection, PathRejection, QueryRejection},
  },
};
use rolo_core::query::{PageRequest, Sort};
use serde::Deserialize;
use serde_json::Value;

use crate::{ApiConfig, error::ApiError};

/// `?sort=<field>&page=<n>&limit=<n>`
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
  pub sort:  Option<String>,
  pub page:  Option<u32>,
  pub limit: Option<u32>,
}

impl ListParams {
  /// The requested sort, or the default (`created_at` ascending).
  pub fn sort(&self) -> Result<Sort, ApiError> {
    match &self.sort {
      Some(s) => Ok(s.parse::<Sort>()?),
      None => Ok(Sort::default()),
    }
  }

  /// The requested page, checked against the configured limits.
  pub fn page(&self, config: &ApiConfig) -> Result<PageRequest, ApiError> {
    let limit = match self.limit {
      None => config.default_limit,
      Some(0) => {
        return Err(ApiError::InvalidQuery("limit must be at least 1".into()));
      }
      Some(limit) if limit > config.max_limit => {
        return Err(ApiError::LimitTooBig {
          limit,
          max: config.max_limit,
        });
      }
      Some(limit) => limit,
    };
    Ok(PageRequest::new(self.page.unwrap_or(1), limit))
  }
}

/// Unwrap a query extractor; unparseable query strings are `InvalidQuery`.
pub fn query<T>(query: Result<Query<T>, QueryRejection>) -> Result<T, ApiError> {
  query
    .map(|Query(q)| q)
    .map_err(|e| ApiError::InvalidQuery(e.body_text()))
}

/// Unwrap an id path segment. An id that is not an integer can never name a
/// row, so it is reported as not found.
pub fn id(path: Result<Path<i64>, PathRejection>, what: &str) -> Result<i64, ApiError> {
  path
    .map(|Path(id)| id)
    .map_err(|_| ApiError::NotFound(format!("{what} not found")))
}

/// Unwrap a JSON body extractor.
pub fn body(json: Result<Json<Value>, JsonRejection>) -> Result<Value, ApiError> {
  json
    .map(|Json(v)| v)
    .map_err(|e| ApiError::MalformedJson(e.body_text()))
}

#[cfg(test)]
mod tests {
  use super::*;

  fn params(limit: Option<u32>) -> ListParams {
    ListParams {
      limit,
      ..Default::default()
    }
  }

  #[test]
  fn default_limit_applies() {
    let page = params(None).page(&ApiConfig::default()).unwrap();
    assert_eq!((page.page, page.limit), (1, 10));
  }

  #[test]
  fn limit_above_max_is_rejected() {
    let err = params(Some(101)).page(&ApiConfig::default()).unwrap_err();
    assert!(matches!(err, ApiError::LimitTooBig { limit: 101, max: 100 }));
    assert_eq!(err.error_code(), Some(30));

    assert!(params(Some(100)).page(&ApiConfig::default()).is_ok());
  }

  #[test]
  fn zero_limit_is_an_invalid_query() {
    let err = params(Some(0)).page(&ApiConfig::default()).unwrap_err();
    assert_eq!(err.error_code(), Some(40));
  }

  #[test]
  fn unknown_sort_is_an_invalid_query() {
    let p = ListParams {
      sort: Some("summary".into()),
      ..Default::default()
    };
    assert_eq!(p.sort().unwrap_err().error_code(), Some(40));
  }
}
