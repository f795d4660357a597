//! HTTP server for Rolo.
//!
//! Wraps the [`rolo_api`] router with Basic authentication and request
//! tracing, mounted under `/api`.

pub mod auth;
pub mod error;

pub use error::Error;

use std::{path::PathBuf, sync::Arc};

use axum::{Router, middleware};
use rolo_api::ApiConfig;
use rolo_core::store::ScopedStore;
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use auth::{AuthConfig, Credential};

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml`.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  pub host:       String,
  pub port:       u16,
  pub store_path: PathBuf,
  #[serde(default)]
  pub api:        ApiConfig,
  /// Logins accepted by the server, each bound to one account.
  #[serde(default)]
  pub users:      Vec<Credential>,
}

// ─── Application state ────────────────────────────────────────────────────────

pub struct AppState<S> {
  pub store:  Arc<S>,
  pub config: Arc<ServerConfig>,
  pub auth:   Arc<AuthConfig>,
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      store:  self.store.clone(),
      config: self.config.clone(),
      auth:   self.auth.clone(),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the server's [`Router`]: the authenticated API under `/api`.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: ScopedStore + 'static,
{
  let api = rolo_api::api_router(state.store.clone(), state.config.api.clone())
    .layer(middleware::from_fn_with_state(state.auth.clone(), auth::require_account));

  Router::new()
    .nest("/api", api)
    .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
  use super::*;

  use argon2::{Argon2, PasswordHasher, password_hash::SaltString};
  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
  };
  use base64::Engine as _;
  use base64::engine::general_purpose::STANDARD as B64;
  use rand_core::OsRng;
  use rolo_core::AccountId;
  use rolo_store_sqlite::SqliteStore;
  use serde_json::{Value, json};
  use tower::ServiceExt as _;

  const PASSWORD: &str = "secret";

  /// Two accounts, `alice` and `bob`, sharing one password.
  async fn make_state() -> AppState<SqliteStore> {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let alice = store.create_account("Alice".into()).await.unwrap().account_id;
    let bob = store.create_account("Bob".into()).await.unwrap().account_id;

    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
      .hash_password(PASSWORD.as_bytes(), &salt)
      .unwrap()
      .to_string();
    let user = |username: &str, account_id: AccountId| Credential {
      username: username.to_string(),
      password_hash: hash.clone(),
      account_id,
    };
    let users = vec![user("alice", alice), user("bob", bob)];

    AppState {
      store:  Arc::new(store),
      auth:   Arc::new(AuthConfig {
        credentials: users.clone(),
      }),
      config: Arc::new(ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 8080,
        store_path: PathBuf::from(":memory:"),
        api: ApiConfig::default(),
        users,
      }),
    }
  }

  fn auth_header(user: &str) -> String {
    format!("Basic {}", B64.encode(format!("{user}:{PASSWORD}")))
  }

  async fn send(
    state: &AppState<SqliteStore>,
    user: Option<&str>,
    method: &str,
    uri: &str,
    body: Option<&str>,
  ) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
      builder = builder.header(header::AUTHORIZATION, auth_header(user));
    }
    if body.is_some() {
      builder = builder.header(header::CONTENT_TYPE, "application/json");
    }
    let req = builder
      .body(Body::from(body.unwrap_or_default().to_string()))
      .unwrap();

    let resp = router(state.clone()).oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
      .await
      .unwrap();
    let json = if bytes.is_empty() {
      Value::Null
    } else {
      serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
  }

  async fn contact(state: &AppState<SqliteStore>, user: &str, first: &str) -> i64 {
    let body = json!({"first_name": first}).to_string();
    let (status, json) = send(state, Some(user), "POST", "/api/contacts", Some(&body)).await;
    assert_eq!(status, StatusCode::CREATED);
    json["data"]["id"].as_i64().unwrap()
  }

  fn activity_body(date: &str, contacts: &[i64]) -> String {
    json!({
      "summary":          "Lunch",
      "description":      "Lunch downtown",
      "date_it_happened": date,
      "contacts":         contacts,
    })
    .to_string()
  }

  async fn activity(
    state: &AppState<SqliteStore>,
    user: &str,
    date: &str,
    contacts: &[i64],
  ) -> i64 {
    let body = activity_body(date, contacts);
    let (status, json) =
      send(state, Some(user), "POST", "/api/activities", Some(&body)).await;
    assert_eq!(status, StatusCode::CREATED, "{json}");
    json["data"]["id"].as_i64().unwrap()
  }

  // ── Auth ─────────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn unauthenticated_requests_return_401() {
    let state = make_state().await;
    let req = Request::builder()
      .uri("/api/activities")
      .body(Body::empty())
      .unwrap();
    let resp = router(state).oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert!(resp.headers().contains_key(header::WWW_AUTHENTICATE));
  }

  #[tokio::test]
  async fn unauthorized_body_carries_error_code() {
    let state = make_state().await;
    let (status, json) = send(&state, None, "GET", "/api/contacts", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["error"]["error_code"], json!(42));
  }

  // ── Create ───────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn create_returns_201_and_counts_attendance() {
    let state = make_state().await;
    let bob = contact(&state, "alice", "Bob").await;

    let body = activity_body("2024-03-01", &[bob]);
    let (status, json) =
      send(&state, Some("alice"), "POST", "/api/activities", Some(&body)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["data"]["object"], json!("activity"));
    assert_eq!(json["data"]["date_it_happened"], json!("2024-03-01"));
    assert_eq!(json["data"]["attendees"]["total"], json!(1));
    assert_eq!(json["data"]["attendees"]["contacts"][0]["id"], json!(bob));
    assert_eq!(json["data"]["activity_type"], Value::Null);

    let (_, json) =
      send(&state, Some("alice"), "GET", &format!("/api/contacts/{bob}"), None).await;
    assert_eq!(json["data"]["statistics"], json!([{"year": 2024, "count": 1}]));
  }

  #[tokio::test]
  async fn validation_failure_lists_fields() {
    let state = make_state().await;
    let body = json!({"description": "x", "date_it_happened": "soon"}).to_string();
    let (status, json) =
      send(&state, Some("alice"), "POST", "/api/activities", Some(&body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["error_code"], json!(32));
    assert!(json["errors"]["summary"].is_array());
    assert!(json["errors"]["date_it_happened"].is_array());
    assert!(json["errors"]["contacts"].is_array());
  }

  #[tokio::test]
  async fn malformed_json_is_rejected() {
    let state = make_state().await;
    let (status, json) =
      send(&state, Some("alice"), "POST", "/api/activities", Some("{not json")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["error_code"], json!(37));
  }

  #[tokio::test]
  async fn foreign_contact_is_not_found_and_nothing_persists() {
    let state = make_state().await;
    let bobs_contact = contact(&state, "bob", "Carol").await;

    let body = activity_body("2024-03-01", &[bobs_contact]);
    let (status, json) =
      send(&state, Some("alice"), "POST", "/api/activities", Some(&body)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"]["error_code"], json!(31));

    let (_, json) = send(&state, Some("alice"), "GET", "/api/activities", None).await;
    assert_eq!(json["meta"]["total"], json!(0));
    let (_, json) = send(&state, Some("bob"), "GET", "/api/activities", None).await;
    assert_eq!(json["meta"]["total"], json!(0));
  }

  // ── Scoping ──────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn other_accounts_activity_is_not_found() {
    let state = make_state().await;
    let carol = contact(&state, "alice", "Carol").await;
    let id = activity(&state, "alice", "2024-03-01", &[carol]).await;
    let uri = format!("/api/activities/{id}");

    let (status, _) = send(&state, Some("alice"), "GET", &uri, None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, json) = send(&state, Some("bob"), "GET", &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"]["error_code"], json!(31));

    let body = activity_body("2024-03-02", &[carol]);
    let (status, _) = send(&state, Some("bob"), "PUT", &uri, Some(&body)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&state, Some("bob"), "DELETE", &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&state, Some("alice"), "GET", &uri, None).await;
    assert_eq!(status, StatusCode::OK);
  }

  #[tokio::test]
  async fn non_numeric_id_is_not_found() {
    let state = make_state().await;
    let (status, _) =
      send(&state, Some("alice"), "GET", "/api/activities/abc", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
  }

  // ── Update ───────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn update_replaces_attendees_and_recounts() {
    let state = make_state().await;
    let bob = contact(&state, "alice", "Bob").await;
    let carol = contact(&state, "alice", "Carol").await;
    let id = activity(&state, "alice", "2024-03-01", &[bob]).await;

    let body = activity_body("2023-06-15", &[carol]);
    let (status, json) = send(
      &state,
      Some("alice"),
      "PUT",
      &format!("/api/activities/{id}"),
      Some(&body),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["attendees"]["contacts"][0]["id"], json!(carol));
    assert_eq!(json["data"]["attendees"]["total"], json!(1));

    let (_, json) =
      send(&state, Some("alice"), "GET", &format!("/api/contacts/{bob}"), None).await;
    assert_eq!(json["data"]["statistics"], json!([]));
    let (_, json) =
      send(&state, Some("alice"), "GET", &format!("/api/contacts/{carol}"), None).await;
    assert_eq!(json["data"]["statistics"], json!([{"year": 2023, "count": 1}]));
  }

  #[tokio::test]
  async fn update_with_invalid_body_is_400() {
    let state = make_state().await;
    let bob = contact(&state, "alice", "Bob").await;
    let id = activity(&state, "alice", "2024-03-01", &[bob]).await;

    let body = json!({"summary": ""}).to_string();
    let (status, json) = send(
      &state,
      Some("alice"),
      "PATCH",
      &format!("/api/activities/{id}"),
      Some(&body),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["error_code"], json!(32));
  }

  // ── Delete ───────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn delete_twice_is_404() {
    let state = make_state().await;
    let bob = contact(&state, "alice", "Bob").await;
    let id = activity(&state, "alice", "2024-03-01", &[bob]).await;
    let uri = format!("/api/activities/{id}");

    let (status, json) = send(&state, Some("alice"), "DELETE", &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, json!({"deleted": true, "id": id}));

    let (status, _) = send(&state, Some("alice"), "DELETE", &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, json) =
      send(&state, Some("alice"), "GET", &format!("/api/contacts/{bob}"), None).await;
    assert_eq!(json["data"]["statistics"], json!([]));
  }

  // ── Listing ──────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn list_is_paginated_with_statistics() {
    let state = make_state().await;
    let bob = contact(&state, "alice", "Bob").await;
    for date in ["2023-01-01", "2024-01-01", "2024-02-01"] {
      activity(&state, "alice", date, &[bob]).await;
    }

    let (status, json) = send(
      &state,
      Some("alice"),
      "GET",
      "/api/activities?limit=2&sort=-date_it_happened",
      None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"].as_array().unwrap().len(), 2);
    assert_eq!(json["data"][0]["date_it_happened"], json!("2024-02-01"));
    assert_eq!(json["meta"]["total"], json!(3));
    assert_eq!(json["meta"]["last_page"], json!(2));
    assert_eq!(json["meta"]["path"], json!("/api/activities"));
    assert_eq!(json["meta"]["statistics"], json!({"2023": 1, "2024": 2}));
    assert_eq!(
      json["links"]["next"],
      json!("/api/activities?page=2&limit=2&sort=-date_it_happened")
    );
    assert_eq!(json["links"]["prev"], Value::Null);
  }

  #[tokio::test]
  async fn invalid_sort_is_rejected() {
    let state = make_state().await;
    let (status, json) =
      send(&state, Some("alice"), "GET", "/api/activities?sort=summary", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["error_code"], json!(40));
  }

  #[tokio::test]
  async fn limit_too_big_is_rejected() {
    let state = make_state().await;
    let (status, json) =
      send(&state, Some("alice"), "GET", "/api/activities?limit=101", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["error_code"], json!(30));
  }

  #[tokio::test]
  async fn contact_activities_only_lists_attended() {
    let state = make_state().await;
    let bob = contact(&state, "alice", "Bob").await;
    let carol = contact(&state, "alice", "Carol").await;
    let with_bob = activity(&state, "alice", "2024-03-01", &[bob, carol]).await;
    activity(&state, "alice", "2024-03-02", &[carol]).await;

    let uri = format!("/api/contacts/{bob}/activities");
    let (status, json) = send(&state, Some("alice"), "GET", &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["meta"]["total"], json!(1));
    assert_eq!(json["data"][0]["id"], json!(with_bob));

    let (status, _) = send(&state, Some("bob"), "GET", &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
  }

  // ── Activity types ───────────────────────────────────────────────────────────

  #[tokio::test]
  async fn activity_with_type() {
    let state = make_state().await;
    let bob = contact(&state, "alice", "Bob").await;
    let body = json!({"name": "Meal"}).to_string();
    let (status, json) =
      send(&state, Some("alice"), "POST", "/api/activitytypes", Some(&body)).await;
    assert_eq!(status, StatusCode::CREATED);
    let type_id = json["data"]["id"].as_i64().unwrap();

    let body = json!({
      "summary":          "Dinner",
      "description":      "Dinner with Bob",
      "date_it_happened": "2024-03-01",
      "activity_type_id": type_id,
      "contacts":         [bob],
    })
    .to_string();
    let (status, json) =
      send(&state, Some("alice"), "POST", "/api/activities", Some(&body)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["data"]["activity_type"]["name"], json!("Meal"));

    // Bob's account can neither see nor use Alice's type.
    let (status, _) = send(
      &state,
      Some("bob"),
      "GET",
      &format!("/api/activitytypes/{type_id}"),
      None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let dan = contact(&state, "bob", "Dan").await;
    let body = json!({
      "summary":          "Dinner",
      "description":      "Dinner with Dan",
      "date_it_happened": "2024-03-01",
      "activity_type_id": type_id,
      "contacts":         [dan],
    })
    .to_string();
    let (status, json) =
      send(&state, Some("bob"), "POST", "/api/activities", Some(&body)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"]["error_code"], json!(31));

    let (_, json) = send(&state, Some("bob"), "GET", "/api/activities", None).await;
    assert_eq!(json["meta"]["total"], json!(0));
  }
}
