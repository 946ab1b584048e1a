//! User store trait.
//!
//! Dyn-compatible (boxed futures) so the identity service can hold an
//! `Arc<dyn UserStore>` chosen at startup.
//!
//! # Implementations
//!
//! - [`crate::stores::InMemoryUserStore`]
//! - `PostgresUserStore` (in `sweet-shop-postgres`)

use crate::error::Result;
use crate::user::User;
use std::future::Future;
use std::pin::Pin;
use sweet_shop_core::UserId;

/// Boxed future returned by [`UserStore`] methods.
pub type UserFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// Persistent storage for user accounts.
pub trait UserStore: Send + Sync {
    /// Insert a new user.
    ///
    /// Email uniqueness must be enforced atomically by the store.
    ///
    /// # Errors
    ///
    /// - `AuthError::UserAlreadyExists` if the email is taken
    /// - `AuthError::DatabaseError` if the write fails
    fn create(&self, user: User) -> UserFuture<'_, User>;

    /// Look up a user by (normalized) email.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::DatabaseError` if the read fails.
    fn find_by_email<'a>(&'a self, email: &'a str) -> UserFuture<'a, Option<User>>;

    /// Look up a user by ID.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::DatabaseError` if the read fails.
    fn find_by_id(&self, id: UserId) -> UserFuture<'_, Option<User>>;

    /// Insert the user, or refresh username, password hash and role of the
    /// existing user with the same email. Returns the stored record.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::DatabaseError` if the write fails.
    fn upsert(&self, user: User) -> UserFuture<'_, User>;
}
