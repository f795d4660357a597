//! Handlers for `/activities` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/activities` | `?sort`, `?page`, `?limit`; yearly statistics in `meta` |
//! | `GET`  | `/activities/{id}` | 404 if not in the caller's account |
//! | `POST` | `/activities` | Body: see [`crate::validation::activity`]; returns 201 |
//! | `PUT`/`PATCH` | `/activities/{id}` | Full replacement |
//! | `DELETE` | `/activities/{id}` | `{"deleted": true, "id": N}` |
//! | `GET`  | `/contacts/{id}/activities` | Activities the contact attended |

use axum::{
  Json,
  extract::{
    OriginalUri, Path, Query, State,
    rejection::{JsonRejection, PathRejection, QueryRejection},
  },
  http::StatusCode,
  response::IntoResponse,
};
use rolo_core::{Missing, store::ScopedStore};
use serde_json::Value;

use crate::{
  ApiState,
  account::CurrentAccount,
  error::ApiError,
  params::{self, ListParams},
  resources::{ActivityResource, Collection, Deleted, Item},
  validation,
};

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /activities[?sort=-date_it_happened][&page=2][&limit=20]`
pub async fn list<S: ScopedStore>(
  State(state): State<ApiState<S>>,
  CurrentAccount(account): CurrentAccount,
  OriginalUri(uri): OriginalUri,
  query: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<Collection<ActivityResource>>, ApiError> {
  let params = params::query(query)?;
  let sort = params.sort()?;
  let page = params.page(&state.config)?;

  let activities = state
    .store
    .list_activities(account, sort, page)
    .await
    .map_err(ApiError::from_store)?;
  let statistics = state
    .store
    .yearly_activity_statistics(account)
    .await
    .map_err(ApiError::from_store)?;

  let explicit_sort = params.sort.is_some().then_some(sort);
  Ok(Json(
    Collection::new(activities.map(Into::into), uri.path(), explicit_sort)
      .with_statistics(statistics),
  ))
}

/// `GET /contacts/{id}/activities`
pub async fn list_for_contact<S: ScopedStore>(
  State(state): State<ApiState<S>>,
  CurrentAccount(account): CurrentAccount,
  OriginalUri(uri): OriginalUri,
  path: Result<Path<i64>, PathRejection>,
  query: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<Collection<ActivityResource>>, ApiError> {
  let contact_id = params::id(path, "contact")?;
  let params = params::query(query)?;
  let sort = params.sort()?;
  let page = params.page(&state.config)?;

  let activities = state
    .store
    .list_contact_activities(account, contact_id, sort, page)
    .await
    .map_err(ApiError::from_store)?;
  let statistics = state
    .store
    .yearly_activity_statistics(account)
    .await
    .map_err(ApiError::from_store)?;

  let explicit_sort = params.sort.is_some().then_some(sort);
  Ok(Json(
    Collection::new(activities.map(Into::into), uri.path(), explicit_sort)
      .with_statistics(statistics),
  ))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /activities/{id}`
pub async fn get_one<S: ScopedStore>(
  State(state): State<ApiState<S>>,
  CurrentAccount(account): CurrentAccount,
  path: Result<Path<i64>, PathRejection>,
) -> Result<Json<Item<ActivityResource>>, ApiError> {
  let id = params::id(path, "activity")?;
  let activity = state
    .store
    .get_activity(account, id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or(Missing::Activity(id))?;
  Ok(Json(Item::new(activity.into())))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// `POST /activities`
pub async fn create<S: ScopedStore>(
  State(state): State<ApiState<S>>,
  CurrentAccount(account): CurrentAccount,
  payload: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
  let input = validation::activity(&params::body(payload)?)?;

  let activity = state
    .store
    .create_activity(account, input)
    .await
    .map_err(ApiError::from_store)?;
  tracing::info!(
    %account,
    activity_id = activity.activity_id,
    attendees = activity.attendees.len(),
    "activity created"
  );

  Ok((
    StatusCode::CREATED,
    Json(Item::new(ActivityResource::from(activity))),
  ))
}

// ─── Update ───────────────────────────────────────────────────────────────────

/// `PUT /activities/{id}` (also `PATCH`)
///
/// The activity is looked up before the body is validated, so an id outside
/// the caller's account is a 404 even when the body is invalid.
pub async fn update<S: ScopedStore>(
  State(state): State<ApiState<S>>,
  CurrentAccount(account): CurrentAccount,
  path: Result<Path<i64>, PathRejection>,
  payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Item<ActivityResource>>, ApiError> {
  let id = params::id(path, "activity")?;
  state
    .store
    .get_activity(account, id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or(Missing::Activity(id))?;

  let input = validation::activity(&params::body(payload)?)?;
  let activity = state
    .store
    .update_activity(account, id, input)
    .await
    .map_err(ApiError::from_store)?;
  tracing::info!(%account, activity_id = id, "activity updated");

  Ok(Json(Item::new(activity.into())))
}

// ─── Delete ───────────────────────────────────────────────────────────────────

/// `DELETE /activities/{id}`
pub async fn delete_one<S: ScopedStore>(
  State(state): State<ApiState<S>>,
  CurrentAccount(account): CurrentAccount,
  path: Result<Path<i64>, PathRejection>,
) -> Result<Json<Deleted>, ApiError> {
  let id = params::id(path, "activity")?;
  let deleted = state
    .store
    .delete_activity(account, id)
    .await
    .map_err(ApiError::from_store)?;
  tracing::info!(%account, activity_id = deleted, "activity deleted");

  Ok(Json(Deleted::new(deleted)))
}
