//! Identity service settings.

use chrono::Duration;

/// Default session lifetime: 24 hours.
pub const DEFAULT_SESSION_TTL_SECS: i64 = 24 * 60 * 60;

/// Default Argon2 memory cost in KiB (19 MiB).
pub const DEFAULT_HASH_MEMORY_KIB: u32 = 19 * 1024;

/// Default Argon2 passes over memory.
pub const DEFAULT_HASH_ITERATIONS: u32 = 2;

/// Identity service configuration.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// How long an issued bearer token stays valid.
    pub session_ttl: Duration,
    /// Argon2 memory cost for new password hashes, in KiB.
    pub hash_memory_kib: u32,
    /// Argon2 time cost for new password hashes.
    pub hash_iterations: u32,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session_ttl: Duration::seconds(DEFAULT_SESSION_TTL_SECS),
            hash_memory_kib: DEFAULT_HASH_MEMORY_KIB,
            hash_iterations: DEFAULT_HASH_ITERATIONS,
        }
    }
}

impl AuthConfig {
    /// Override the session lifetime.
    #[must_use]
    pub const fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = ttl;
        self
    }

    /// Override the Argon2 cost (tests use the minimum).
    #[must_use]
    pub const fn with_hash_cost(mut self, memory_kib: u32, iterations: u32) -> Self {
        self.hash_memory_kib = memory_kib;
        self.hash_iterations = iterations;
        self
    }
}
