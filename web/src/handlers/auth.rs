//! Account endpoints: register, login, logout and the caller's profile.

use crate::extractors::{BearerToken, Caller};
use crate::handlers::sweets::MessageBody;
use crate::WebResult;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use sweet_shop_auth::{IdentityService, LoginRequest, RegisterRequest, UserProfile};

/// `{ message, user }`
#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    /// What happened.
    pub message: &'static str,
    /// The new account.
    pub user: UserProfile,
}

/// `{ message, token, expiresAt, user }`
#[derive(Debug, Serialize)]
pub struct LoginBody {
    /// What happened.
    pub message: &'static str,
    /// Bearer token for subsequent requests.
    pub token: String,
    /// When the token stops working.
    #[serde(rename = "expiresAt")]
    pub expires_at: DateTime<Utc>,
    /// The logged-in account.
    pub user: UserProfile,
}

/// `{ user }`
#[derive(Debug, Serialize)]
pub struct ProfileBody {
    /// The caller's account.
    pub user: UserProfile,
}

/// `POST /api/auth/register`
///
/// # Errors
///
/// 400 for missing fields, a malformed email, a weak password or a taken email.
pub async fn register(
    State(identity): State<Arc<IdentityService>>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> WebResult<(StatusCode, Json<RegisterResponse>)> {
    let Json(request) = payload?;
    let user = identity.register(request).await?;
    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "User registered successfully",
            user,
        }),
    ))
}

/// `POST /api/auth/login`
///
/// # Errors
///
/// 400 for missing fields, 404 for an unknown email, 401 for a wrong password.
pub async fn login(
    State(identity): State<Arc<IdentityService>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> WebResult<Json<LoginBody>> {
    let Json(request) = payload?;
    let session = identity.login(request).await?;
    Ok(Json(LoginBody {
        message: "Login successful",
        token: session.token,
        expires_at: session.expires_at,
        user: session.user,
    }))
}

/// `POST /api/auth/logout`
///
/// # Errors
///
/// 401 when the token is missing or already invalid.
pub async fn logout(
    State(identity): State<Arc<IdentityService>>,
    BearerToken(token): BearerToken,
) -> WebResult<Json<MessageBody>> {
    identity.logout(&token)?;
    Ok(Json(MessageBody {
        message: "Logged out",
    }))
}

/// `GET /api/auth/me`
///
/// # Errors
///
/// 401 without a valid token, 404 if the account has since been removed.
pub async fn me(
    State(identity): State<Arc<IdentityService>>,
    Caller(caller): Caller,
) -> WebResult<Json<ProfileBody>> {
    let user = identity.profile(caller.user_id).await?;
    Ok(Json(ProfileBody { user }))
}
