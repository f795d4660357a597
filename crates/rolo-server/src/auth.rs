//! HTTP Basic authentication resolving the caller's account.

use std::sync::Arc;

use argon2::{Argon2, PasswordHash, PasswordVerifier};
use axum::{
  extract::{Request, State},
  http::{HeaderMap, header},
  middleware::Next,
  response::Response,
};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as B64;
use rolo_core::AccountId;
use serde::Deserialize;

use crate::error::Error;

/// One login and the account it acts on.
#[derive(Debug, Clone, Deserialize)]
pub struct Credential {
  pub username:      String,
  /// PHC string produced by argon2, e.g. `$argon2id$v=19$…`
  pub password_hash: String,
  pub account_id:    AccountId,
}

/// Credentials accepted as valid for this server instance.
#[derive(Debug, Clone, Default)]
pub struct AuthConfig {
  pub credentials: Vec<Credential>,
}

impl AuthConfig {
  fn find(&self, username: &str) -> Option<&Credential> {
    self.credentials.iter().find(|c| c.username == username)
  }
}

/// Check the `Authorization` header and return the account it grants.
pub fn verify_auth(headers: &HeaderMap, config: &AuthConfig) -> Result<AccountId, Error> {
  let header_val = headers
    .get(header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .ok_or(Error::Unauthorized)?;

  let encoded = header_val
    .strip_prefix("Basic ")
    .ok_or(Error::Unauthorized)?;

  let decoded = B64.decode(encoded).map_err(|_| Error::Unauthorized)?;
  let creds   = std::str::from_utf8(&decoded).map_err(|_| Error::Unauthorized)?;

  let (username, password) = creds.split_once(':').ok_or(Error::Unauthorized)?;
  let credential = config.find(username).ok_or(Error::Unauthorized)?;

  let parsed_hash = PasswordHash::new(&credential.password_hash)
    .map_err(|_| Error::Unauthorized)?;

  Argon2::default()
    .verify_password(password.as_bytes(), &parsed_hash)
    .map_err(|_| Error::Unauthorized)?;

  Ok(credential.account_id)
}

/// Middleware: authenticate the request and store its [`AccountId`] in the
/// request extensions for [`rolo_api::CurrentAccount`].
pub async fn require_account(
  State(auth): State<Arc<AuthConfig>>,
  mut req: Request,
  next: Next,
) -> Result<Response, Error> {
  let account = verify_auth(req.headers(), &auth).inspect_err(|_| {
    tracing::debug!(uri = %req.uri(), "rejected unauthenticated request");
  })?;
  req.extensions_mut().insert(account);
  Ok(next.run(req).await)
}
