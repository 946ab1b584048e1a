//! In-memory user store.

use crate::error::AuthError;
use crate::providers::{UserFuture, UserStore};
use crate::user::User;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use sweet_shop_core::UserId;

/// Users keyed by normalized email, guarded by one mutex.
#[derive(Debug, Clone, Default)]
pub struct InMemoryUserStore {
    users_by_email: Arc<Mutex<HashMap<String, User>>>,
}

impl InMemoryUserStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, User>>, AuthError> {
        self.users_by_email
            .lock()
            .map_err(|_| AuthError::InternalError)
    }
}

impl UserStore for InMemoryUserStore {
    fn create(&self, user: User) -> UserFuture<'_, User> {
        Box::pin(async move {
            let mut users = self.lock()?;
            if users.contains_key(&user.email) {
                return Err(AuthError::UserAlreadyExists);
            }
            users.insert(user.email.clone(), user.clone());
            Ok(user)
        })
    }

    fn find_by_email<'a>(&'a self, email: &'a str) -> UserFuture<'a, Option<User>> {
        Box::pin(async move { Ok(self.lock()?.get(email).cloned()) })
    }

    fn find_by_id(&self, id: UserId) -> UserFuture<'_, Option<User>> {
        Box::pin(async move { Ok(self.lock()?.values().find(|u| u.id == id).cloned()) })
    }

    fn upsert(&self, user: User) -> UserFuture<'_, User> {
        Box::pin(async move {
            let mut users = self.lock()?;
            let stored = match users.get_mut(&user.email) {
                Some(existing) => {
                    existing.username = user.username;
                    existing.password_hash = user.password_hash;
                    existing.role = user.role;
                    existing.clone()
                }
                None => {
                    users.insert(user.email.clone(), user.clone());
                    user
                }
            };
            Ok(stored)
        })
    }
}
