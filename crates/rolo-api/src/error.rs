//! API error type and [`axum::response::IntoResponse`] implementation.
//!
//! Every error is rendered as
//! `{"error": {"message": "...", "error_code": N}}`; validation failures add
//! an `errors` map of field name to messages.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::validation::ValidationErrors;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not authorized")]
  Unauthorized,

  #[error("{0}")]
  NotFound(String),

  #[error("the given data failed validation: {0}")]
  Validation(ValidationErrors),

  #[error("problems parsing JSON: {0}")]
  MalformedJson(String),

  #[error("invalid query: {0}")]
  InvalidQuery(String),

  #[error("the limit parameter is too big: {limit} > {max}")]
  LimitTooBig { limit: u32, max: u32 },

  #[error("invalid parameters: {0}")]
  InvalidParameters(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  /// Convert any store error through [`rolo_core::Error`], which tells scoped
  /// misses and constraint violations apart from other failures.
  pub fn from_store<E: Into<rolo_core::Error>>(e: E) -> Self { e.into().into() }

  pub fn status(&self) -> StatusCode {
    match self {
      ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
      ApiError::NotFound(_) => StatusCode::NOT_FOUND,
      ApiError::Validation(_)
      | ApiError::MalformedJson(_)
      | ApiError::InvalidQuery(_)
      | ApiError::LimitTooBig { .. }
      | ApiError::InvalidParameters(_) => StatusCode::BAD_REQUEST,
      ApiError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }

  /// Stable numeric code clients can switch on.
  pub fn error_code(&self) -> Option<u16> {
    match self {
      ApiError::LimitTooBig { .. } => Some(30),
      ApiError::NotFound(_) => Some(31),
      ApiError::Validation(_) => Some(32),
      ApiError::MalformedJson(_) => Some(37),
      ApiError::InvalidQuery(_) => Some(40),
      ApiError::InvalidParameters(_) => Some(41),
      ApiError::Unauthorized => Some(42),
      ApiError::Store(_) => None,
    }
  }
}

impl From<rolo_core::Error> for ApiError {
  fn from(e: rolo_core::Error) -> Self {
    match e {
      rolo_core::Error::NotFound(missing) => ApiError::NotFound(missing.to_string()),
      rolo_core::Error::InvalidParameters(m) => ApiError::InvalidParameters(m),
      e @ rolo_core::Error::InvalidSort(_) => ApiError::InvalidQuery(e.to_string()),
      rolo_core::Error::Store(e) => ApiError::Store(e),
    }
  }
}

impl From<rolo_core::Missing> for ApiError {
  fn from(missing: rolo_core::Missing) -> Self { ApiError::NotFound(missing.to_string()) }
}

impl From<ValidationErrors> for ApiError {
  fn from(errors: ValidationErrors) -> Self { ApiError::Validation(errors) }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();
    let message = match &self {
      ApiError::Store(e) => {
        tracing::error!(error = %e, "store failure");
        "Internal server error".to_owned()
      }
      ApiError::Validation(_) => "The given data failed validation.".to_owned(),
      other => other.to_string(),
    };

    let mut body = json!({
      "error": {
        "message":    message,
        "error_code": self.error_code(),
      }
    });
    if let ApiError::Validation(errors) = &self {
      body["errors"] = json!(errors);
    }

    (status, Json(body)).into_response()
  }
}
