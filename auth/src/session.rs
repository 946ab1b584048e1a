//! In-process bearer session registry.
//!
//! Tokens are 32 random bytes, base64url encoded. Only a SHA-256 digest of
//! each token is kept as the map key.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use rand::RngCore;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::RwLock;
use sweet_shop_core::Identity;

const TOKEN_BYTES: usize = 32;

/// A live session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Session {
    /// Who the token belongs to.
    pub identity: Identity,
    /// When the token stops working.
    pub expires_at: DateTime<Utc>,
}

/// Token → session map.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<String, Session>>,
}

impl SessionRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a fresh token for `identity`, valid until `expires_at`.
    ///
    /// Returns `None` only if the registry lock is poisoned.
    pub fn issue(&self, identity: Identity, expires_at: DateTime<Utc>) -> Option<String> {
        let mut bytes = [0u8; TOKEN_BYTES];
        rand::thread_rng().fill_bytes(&mut bytes);
        let token = URL_SAFE_NO_PAD.encode(bytes);

        self.sessions.write().ok()?.insert(
            key(&token),
            Session {
                identity,
                expires_at,
            },
        );
        Some(token)
    }

    /// Resolve a token at time `now`. Expired sessions are evicted.
    pub fn resolve(&self, token: &str, now: DateTime<Utc>) -> Option<Session> {
        let key = key(token);
        let session = *self.sessions.read().ok()?.get(&key)?;
        if session.expires_at > now {
            return Some(session);
        }

        if let Ok(mut sessions) = self.sessions.write() {
            sessions.remove(&key);
        }
        None
    }

    /// Revoke a token. Returns `false` if it was not live.
    pub fn revoke(&self, token: &str) -> bool {
        self.sessions
            .write()
            .map(|mut sessions| sessions.remove(&key(token)).is_some())
            .unwrap_or(false)
    }

    /// Drop every session that expired at or before `now`.
    pub fn purge_expired(&self, now: DateTime<Utc>) -> usize {
        let Ok(mut sessions) = self.sessions.write() else {
            return 0;
        };
        let before = sessions.len();
        sessions.retain(|_, s| s.expires_at > now);
        before - sessions.len()
    }

    /// Number of stored sessions (including not yet purged expired ones).
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.read().map_or(0, |s| s.len())
    }

    /// Whether no sessions are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn key(token: &str) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(token.as_bytes()))
}
