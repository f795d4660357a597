//! Handlers for `/activitytypes` endpoints.

use axum::{
  Json,
  extract::{
    Path, State,
    rejection::{JsonRejection, PathRejection},
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
  params,
  resources::{ActivityTypeResource, Item},
  validation,
};

/// `GET /activitytypes`: every type in the account, unpaginated.
pub async fn list<S: ScopedStore>(
  State(state): State<ApiState<S>>,
  CurrentAccount(account): CurrentAccount,
) -> Result<Json<Item<Vec<ActivityTypeResource>>>, ApiError> {
  let types = state
    .store
    .list_activity_types(account)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(Item::new(types.into_iter().map(Into::into).collect())))
}

/// `POST /activitytypes`, body: `{"name":"Meal"}`
pub async fn create<S: ScopedStore>(
  State(state): State<ApiState<S>>,
  CurrentAccount(account): CurrentAccount,
  payload: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
  let input = validation::activity_type(&params::body(payload)?)?;
  let activity_type = state
    .store
    .add_activity_type(account, input)
    .await
    .map_err(ApiError::from_store)?;
  tracing::info!(
    %account,
    activity_type_id = activity_type.activity_type_id,
    "activity type created"
  );

  Ok((
    StatusCode::CREATED,
    Json(Item::new(ActivityTypeResource::from(activity_type))),
  ))
}

/// `GET /activitytypes/{id}`
pub async fn get_one<S: ScopedStore>(
  State(state): State<ApiState<S>>,
  CurrentAccount(account): CurrentAccount,
  path: Result<Path<i64>, PathRejection>,
) -> Result<Json<Item<ActivityTypeResource>>, ApiError> {
  let id = params::id(path, "activity type")?;
  let activity_type = state
    .store
    .get_activity_type(account, id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or(Missing::ActivityType(id))?;
  Ok(Json(Item::new(activity_type.into())))
}
