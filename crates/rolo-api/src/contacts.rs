//! Handlers for `/contacts` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/contacts` | `?page`, `?limit`; ordered by id |
//! | `POST` | `/contacts` | Body: `{"first_name":"Bob","last_name":"Loblaw"}` |
//! | `GET`  | `/contacts/{id}` | Includes per-year activity statistics |

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
  resources::{Collection, ContactResource, Item},
  validation,
};

/// `GET /contacts[?page=N][&limit=N]`
pub async fn list<S: ScopedStore>(
  State(state): State<ApiState<S>>,
  CurrentAccount(account): CurrentAccount,
  OriginalUri(uri): OriginalUri,
  query: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<Collection<ContactResource>>, ApiError> {
  let page = params::query(query)?.page(&state.config)?;
  let contacts = state
    .store
    .list_contacts(account, page)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(Collection::new(contacts.map(Into::into), uri.path(), None)))
}

/// `POST /contacts`
pub async fn create<S: ScopedStore>(
  State(state): State<ApiState<S>>,
  CurrentAccount(account): CurrentAccount,
  payload: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
  let input = validation::contact(&params::body(payload)?)?;
  let contact = state
    .store
    .add_contact(account, input)
    .await
    .map_err(ApiError::from_store)?;
  tracing::info!(%account, contact_id = contact.contact_id, "contact created");

  Ok((
    StatusCode::CREATED,
    Json(Item::new(ContactResource::from(contact))),
  ))
}

/// `GET /contacts/{id}`
pub async fn get_one<S: ScopedStore>(
  State(state): State<ApiState<S>>,
  CurrentAccount(account): CurrentAccount,
  path: Result<Path<i64>, PathRejection>,
) -> Result<Json<Item<ContactResource>>, ApiError> {
  let id = params::id(path, "contact")?;
  let contact = state
    .store
    .get_contact(account, id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or(Missing::Contact(id))?;
  let statistics = state
    .store
    .activity_statistics(account, id)
    .await
    .map_err(ApiError::from_store)?;

  let mut resource = ContactResource::from(contact);
  resource.statistics = Some(statistics);
  Ok(Json(Item::new(resource)))
}
