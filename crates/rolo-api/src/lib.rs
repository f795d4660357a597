//! JSON REST API for Rolo.
//!
//! Exposes an axum [`Router`] backed by any [`rolo_core::store::ScopedStore`].
//! Every handler reads the caller's account through [`CurrentAccount`], which
//! expects an [`AccountId`](rolo_core::AccountId) in the request extensions.
//! Authentication, TLS, and transport concerns are the caller's
//! responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", rolo_api::api_router(store.clone(), ApiConfig::default()))
//! ```

pub mod account;
pub mod activities;
pub mod activity_types;
pub mod contacts;
pub mod error;
pub mod params;
pub mod resources;
pub mod validation;

use std::sync::Arc;

use axum::{
  Router,
  extract::DefaultBodyLimit,
  routing::get,
};
use rolo_core::store::ScopedStore;
use serde::Deserialize;

pub use account::CurrentAccount;
pub use error::ApiError;

/// Largest accepted request body. A maximal description is 1 000 000
/// characters, which can take up to 4 bytes each.
const BODY_LIMIT: usize = 8 * 1024 * 1024;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Pagination limits for listing endpoints.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
  /// Page size used when a request has no `limit`.
  pub default_limit: u32,
  /// Requests asking for more than this are rejected.
  pub max_limit:     u32,
}

impl Default for ApiConfig {
  fn default() -> Self {
    Self {
      default_limit: 10,
      max_limit:     100,
    }
  }
}

// ─── State ────────────────────────────────────────────────────────────────────

/// Shared state threaded through all API handlers.
pub struct ApiState<S> {
  pub store:  Arc<S>,
  pub config: Arc<ApiConfig>,
}

impl<S> Clone for ApiState<S> {
  fn clone(&self) -> Self {
    Self {
      store:  self.store.clone(),
      config: self.config.clone(),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>, config: ApiConfig) -> Router<()>
where
  S: ScopedStore + 'static,
{
  let state = ApiState {
    store,
    config: Arc::new(config),
  };

  Router::new()
    // Activities
    .route(
      "/activities",
      get(activities::list::<S>).post(activities::create::<S>),
    )
    .route(
      "/activities/{id}",
      get(activities::get_one::<S>)
        .put(activities::update::<S>)
        .patch(activities::update::<S>)
        .delete(activities::delete_one::<S>),
    )
    // Contacts
    .route("/contacts", get(contacts::list::<S>).post(contacts::create::<S>))
    .route("/contacts/{id}", get(contacts::get_one::<S>))
    .route("/contacts/{id}/activities", get(activities::list_for_contact::<S>))
    // Activity types
    .route(
      "/activitytypes",
      get(activity_types::list::<S>).post(activity_types::create::<S>),
    )
    .route("/activitytypes/{id}", get(activity_types::get_one::<S>))
    .layer(DefaultBodyLimit::max(BODY_LIMIT))
    .with_state(state)
}
