//! Custom Axum extractors.
//!
//! - [`BearerToken`]: raw token from `Authorization: Bearer <token>`
//! - [`Caller`]: any authenticated identity (401 otherwise)
//! - [`AdminCaller`]: an authenticated admin (403 for shoppers)
//!
//! ```ignore
//! async fn restock(AdminCaller(admin): AdminCaller, ...) -> WebResult<Json<...>> {
//!     state.catalog.restock(&admin, id, quantity).await?;
//! }
//! ```

use crate::error::AppError;
use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};
use std::sync::Arc;
use sweet_shop_auth::IdentityService;
use sweet_shop_core::Identity;

/// Bearer token extracted from the `Authorization` header.
#[derive(Debug, Clone)]
pub struct BearerToken(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for BearerToken
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::unauthorized("Missing authorization header"))?;

        let token = header
            .strip_prefix("Bearer ")
            .map(str::trim)
            .ok_or_else(|| {
                AppError::unauthorized("Invalid authorization format. Expected 'Bearer <token>'")
            })?;

        if token.is_empty() {
            return Err(AppError::unauthorized("Empty bearer token"));
        }

        Ok(Self(token.to_string()))
    }
}

/// The authenticated caller.
#[derive(Debug, Clone, Copy)]
pub struct Caller(pub Identity);

#[async_trait]
impl<S> FromRequestParts<S> for Caller
where
    Arc<IdentityService>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let BearerToken(token) = BearerToken::from_request_parts(parts, state).await?;
        let identity = Arc::<IdentityService>::from_ref(state).authenticate(&token)?;
        Ok(Self(identity))
    }
}

/// An authenticated caller holding the admin role.
#[derive(Debug, Clone, Copy)]
pub struct AdminCaller(pub Identity);

#[async_trait]
impl<S> FromRequestParts<S> for AdminCaller
where
    Arc<IdentityService>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Caller(identity) = Caller::from_request_parts(parts, state).await?;
        if !identity.is_admin() {
            tracing::debug!(user_id = %identity.user_id, "Admin route refused");
            return Err(AppError::forbidden("admin role required"));
        }
        Ok(Self(identity))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use axum::http::{Request, StatusCode};

    async fn bearer(header: Option<&str>) -> Result<BearerToken, AppError> {
        let mut builder = Request::builder().uri("/");
        if let Some(value) = header {
            builder = builder.header(AUTHORIZATION, value);
        }
        let (mut parts, ()) = builder.body(()).unwrap().into_parts();
        BearerToken::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn test_bearer_token_extracted() {
        let token = bearer(Some("Bearer abc123")).await.unwrap();
        assert_eq!(token.0, "abc123");
    }

    #[tokio::test]
    async fn test_missing_or_malformed_header_is_unauthorized() {
        for header in [None, Some("Basic abc"), Some("Bearer "), Some("abc")] {
            let err = bearer(header).await.unwrap_err();
            assert_eq!(err.status(), StatusCode::UNAUTHORIZED, "{header:?}");
        }
    }
}
