//! Identity service: register, login, authenticate, logout, admin seeding.

use crate::config::AuthConfig;
use crate::error::{AuthError, Result};
use crate::password::{hash_password, verify_password};
use crate::providers::UserStore;
use crate::session::SessionRegistry;
use crate::user::{AdminSeed, LoginRequest, LoginResponse, RegisterRequest, User, UserProfile};
use crate::utils::{is_strong_password, is_valid_email, normalize_email};
use std::sync::Arc;
use sweet_shop_core::environment::Clock;
use sweet_shop_core::{Identity, Role, UserId};

/// Issues and checks bearer tokens on behalf of the HTTP layer.
pub struct IdentityService {
    users: Arc<dyn UserStore>,
    sessions: SessionRegistry,
    clock: Arc<dyn Clock>,
    config: AuthConfig,
}

impl std::fmt::Debug for IdentityService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityService")
            .field("sessions", &self.sessions.len())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl IdentityService {
    /// Create a service over a user store.
    #[must_use]
    pub fn new(users: Arc<dyn UserStore>, clock: Arc<dyn Clock>, config: AuthConfig) -> Self {
        Self {
            users,
            sessions: SessionRegistry::new(),
            clock,
            config,
        }
    }

    /// Register a shopper account.
    ///
    /// # Errors
    ///
    /// - [`AuthError::Validation`] for missing fields, a malformed email or a weak password
    /// - [`AuthError::UserAlreadyExists`] if the email is taken
    /// - [`AuthError::DatabaseError`] on store failure
    #[tracing::instrument(skip_all)]
    pub async fn register(&self, request: RegisterRequest) -> Result<UserProfile> {
        let (Some(username), Some(email), Some(password)) = (
            non_blank(request.username),
            non_blank(request.email),
            non_blank(request.password),
        ) else {
            return Err(AuthError::Validation("all fields are required".to_string()));
        };

        let user = self.build_user(username, &email, password, Role::User).await?;
        let user = self.users.create(user).await?;
        tracing::info!(user_id = %user.id, "User registered");
        Ok(user.profile())
    }

    /// Exchange email and password for a bearer token.
    ///
    /// # Errors
    ///
    /// - [`AuthError::Validation`] if either field is missing
    /// - [`AuthError::UserNotFound`] for an unknown email
    /// - [`AuthError::InvalidPassword`] for a wrong password
    /// - [`AuthError::DatabaseError`] on store failure
    #[tracing::instrument(skip_all)]
    pub async fn login(&self, request: LoginRequest) -> Result<LoginResponse> {
        let (Some(email), Some(password)) = (
            non_blank(request.email),
            request.password.filter(|p| !p.is_empty()),
        ) else {
            return Err(AuthError::Validation(
                "email and password are required".to_string(),
            ));
        };

        let email = normalize_email(&email);
        let user = self
            .users
            .find_by_email(&email)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        let encoded = user.password_hash.clone();
        let matches = tokio::task::spawn_blocking(move || verify_password(&password, &encoded))
            .await
            .map_err(|_| AuthError::InternalError)?;
        if !matches {
            tracing::warn!(user_id = %user.id, "Login rejected");
            return Err(AuthError::InvalidPassword);
        }

        let expires_at = self.clock.now() + self.config.session_ttl;
        let token = self
            .sessions
            .issue(user.identity(), expires_at)
            .ok_or(AuthError::InternalError)?;

        tracing::info!(user_id = %user.id, role = %user.role, "Login succeeded");
        Ok(LoginResponse {
            token,
            expires_at,
            user: user.profile(),
        })
    }

    /// Resolve a bearer token into the caller's identity.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidToken`] for unknown, revoked or expired tokens.
    pub fn authenticate(&self, token: &str) -> Result<Identity> {
        self.sessions
            .resolve(token, self.clock.now())
            .map(|s| s.identity)
            .ok_or(AuthError::InvalidToken)
    }

    /// Revoke a bearer token.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidToken`] if the token was not live.
    pub fn logout(&self, token: &str) -> Result<()> {
        if self.sessions.revoke(token) {
            Ok(())
        } else {
            Err(AuthError::InvalidToken)
        }
    }

    /// Profile of an authenticated caller.
    ///
    /// # Errors
    ///
    /// - [`AuthError::UserNotFound`] if the account no longer exists
    /// - [`AuthError::DatabaseError`] on store failure
    pub async fn profile(&self, id: UserId) -> Result<UserProfile> {
        self.users
            .find_by_id(id)
            .await?
            .map(|u| u.profile())
            .ok_or(AuthError::UserNotFound)
    }

    /// Create the admin account, or refresh its password and role.
    ///
    /// # Errors
    ///
    /// - [`AuthError::Validation`] for a malformed email or weak password
    /// - [`AuthError::DatabaseError`] on store failure
    #[tracing::instrument(skip_all, fields(email = %seed.email))]
    pub async fn seed_admin(&self, seed: AdminSeed) -> Result<UserProfile> {
        let user = self
            .build_user(seed.username, &seed.email, seed.password, Role::Admin)
            .await?;
        let user = self.users.upsert(user).await?;
        tracing::info!(user_id = %user.id, "Admin account ready");
        Ok(user.profile())
    }

    /// Drop expired sessions; returns how many were removed.
    pub fn purge_expired_sessions(&self) -> usize {
        self.sessions.purge_expired(self.clock.now())
    }

    async fn build_user(
        &self,
        username: String,
        email: &str,
        password: String,
        role: Role,
    ) -> Result<User> {
        let email = normalize_email(email);
        if !is_valid_email(&email) {
            return Err(AuthError::Validation("invalid email format".to_string()));
        }
        if !is_strong_password(&password) {
            return Err(AuthError::Validation(
                "password must be at least 8 characters and contain a letter and a number"
                    .to_string(),
            ));
        }

        let (memory_kib, iterations) = (self.config.hash_memory_kib, self.config.hash_iterations);
        let password_hash =
            tokio::task::spawn_blocking(move || hash_password(&password, memory_kib, iterations))
                .await
                .map_err(|_| AuthError::InternalError)??;

        Ok(User {
            id: UserId::new(),
            username: username.trim().to_string(),
            email,
            password_hash,
            role,
            created_at: self.clock.now(),
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
