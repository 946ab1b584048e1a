//! User records and request/response payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sweet_shop_core::{Identity, Role, UserId};

/// A registered account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Display name.
    pub username: String,
    /// Lower-cased, unique email.
    pub email: String,
    /// Encoded salted password hash.
    pub password_hash: String,
    /// Authorization role.
    pub role: Role,
    /// Registration time.
    pub created_at: DateTime<Utc>,
}

impl User {
    /// The identity handed to the catalog for this user.
    #[must_use]
    pub const fn identity(&self) -> Identity {
        Identity::new(self.id, self.role)
    }

    /// Public view of the account.
    #[must_use]
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
            role: self.role,
        }
    }
}

/// Public account fields returned to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Unique user ID.
    pub id: UserId,
    /// Display name.
    pub username: String,
    /// Email address.
    pub email: String,
    /// Authorization role.
    pub role: Role,
}

/// Registration payload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterRequest {
    /// Display name.
    pub username: Option<String>,
    /// Email address.
    pub email: Option<String>,
    /// Plain-text password.
    pub password: Option<String>,
}

/// Login payload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginRequest {
    /// Email address.
    pub email: Option<String>,
    /// Plain-text password.
    pub password: Option<String>,
}

/// Successful login.
#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    /// Opaque bearer token.
    pub token: String,
    /// When the token stops working.
    #[serde(rename = "expiresAt")]
    pub expires_at: DateTime<Utc>,
    /// The logged-in account.
    pub user: UserProfile,
}

/// Admin account to create or refresh at startup.
#[derive(Debug, Clone)]
pub struct AdminSeed {
    /// Display name.
    pub username: String,
    /// Email address.
    pub email: String,
    /// Plain-text password.
    pub password: String,
}
