//! The [`CurrentAccount`] extractor.

use axum::{extract::FromRequestParts, http::request::Parts};
use rolo_core::AccountId;

use crate::error::ApiError;

/// The authenticated caller's account.
///
/// Read from the request extensions, where the authentication layer in front
/// of the API router is expected to have inserted an [`AccountId`]. A request
/// without one is rejected as unauthorized.
#[derive(Debug, Clone, Copy)]
pub struct CurrentAccount(pub AccountId);

impl<S> FromRequestParts<S> for CurrentAccount
where
  S: Send + Sync,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    _state: &S,
  ) -> Result<Self, Self::Rejection> {
    parts
      .extensions
      .get::<AccountId>()
      .copied()
      .map(CurrentAccount)
      .ok_or(ApiError::Unauthorized)
  }
}

#[cfg(test)]
mod tests {
  use axum::{body::Body, http::Request};

  use super::*;

  async fn extract(req: Request<Body>) -> Result<CurrentAccount, ApiError> {
    let (mut parts, _) = req.into_parts();
    CurrentAccount::from_request_parts(&mut parts, &()).await
  }

  #[tokio::test]
  async fn reads_account_from_extensions() {
    let mut req = Request::new(Body::empty());
    req.extensions_mut().insert(AccountId::new(7));
    let CurrentAccount(account) = extract(req).await.unwrap();
    assert_eq!(account, AccountId::new(7));
  }

  #[tokio::test]
  async fn missing_account_is_unauthorized() {
    let err = extract(Request::new(Body::empty())).await.unwrap_err();
    assert!(matches!(err, ApiError::Unauthorized));
  }
}
