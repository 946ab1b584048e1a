//! `PostgreSQL` stores for the Sweet Shop backend.
//!
//! - [`PostgresCatalogStore`] implements `CatalogStore`. Purchase and restock
//!   are single `UPDATE ... RETURNING` statements, so Postgres row locking
//!   serializes concurrent stock changes on the same record.
//! - [`PostgresUserStore`] implements `UserStore` with a `UNIQUE` email column.
//!
//! # Example
//!
//! ```ignore
//! use sweet_shop_postgres::{PoolConfig, PostgresCatalogStore, connect, migrate};
//!
//! let pool = connect(&PoolConfig::new("postgres://localhost/sweets")).await?;
//! migrate(&pool).await?;
//! let store = PostgresCatalogStore::new(pool);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod catalog;
mod users;

pub use catalog::PostgresCatalogStore;
pub use users::PostgresUserStore;

use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use sweet_shop_core::StoreError;

/// Connection pool settings.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// `PostgreSQL` connection URL.
    pub url: String,
    /// Maximum number of pooled connections.
    pub max_connections: u32,
    /// Minimum number of idle connections.
    pub min_connections: u32,
    /// How long to wait for a connection.
    pub connect_timeout: Duration,
}

impl PoolConfig {
    /// Defaults: 10 max, 2 min, 30 s timeout.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: 10,
            min_connections: 2,
            connect_timeout: Duration::from_secs(30),
        }
    }
}

/// Open a connection pool.
///
/// # Errors
///
/// Returns [`StoreError::DatabaseError`] if the database is unreachable.
pub async fn connect(config: &PoolConfig) -> Result<PgPool, StoreError> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(config.connect_timeout)
        .connect(&config.url)
        .await
        .map_err(|e| StoreError::DatabaseError(format!("Failed to connect: {e}")))
}

/// Create or upgrade the `sweets` and `users` tables.
///
/// # Errors
///
/// Returns [`StoreError::DatabaseError`] if a migration fails.
pub async fn migrate(pool: &PgPool) -> Result<(), StoreError> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| StoreError::DatabaseError(format!("Migration failed: {e}")))
}
