//! Catalog store trait.
//!
//! The store is the single source of truth for stock. Every stock mutation
//! is one atomic conditional operation inside the store; the catalog never
//! reads a quantity and writes it back.
//!
//! # Implementations
//!
//! - `PostgresCatalogStore` (in `sweet-shop-postgres`): conditional
//!   `UPDATE ... RETURNING` statements
//! - `InMemoryCatalogStore` (in `sweet-shop-testing`): a mutex-held map
//!
//! # Dyn Compatibility
//!
//! Methods return boxed futures instead of using `async fn` so the store can
//! be shared as `Arc<dyn CatalogStore>`.

use crate::search::SearchPredicate;
use crate::sweet::{Sweet, SweetFields, SweetId};
use chrono::{DateTime, Utc};
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Database connection or query error.
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// A stored row could not be decoded into a [`Sweet`].
    #[error("Corrupt record: {0}")]
    Corrupt(String),

    /// A write would break a storage constraint (e.g. stock overflow).
    #[error("{0}")]
    Constraint(String),
}

/// Boxed future returned by every [`CatalogStore`] method.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + Send + 'a>>;

/// Persistent storage for catalog items.
///
/// Implementations must make [`decrement_if_available`](Self::decrement_if_available)
/// and [`increment`](Self::increment) linearizable per record: two concurrent
/// decrements whose sum exceeds the stock must not both succeed.
pub trait CatalogStore: Send + Sync {
    /// Persist a new record.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the write fails.
    fn insert(&self, sweet: Sweet) -> StoreFuture<'_, Sweet>;

    /// Fetch one record.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the read fails.
    fn get(&self, id: SweetId) -> StoreFuture<'_, Option<Sweet>>;

    /// All records in creation order (oldest first).
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the read fails.
    fn list(&self) -> StoreFuture<'_, Vec<Sweet>>;

    /// Replace the mutable fields of a record and stamp `updated_at`.
    ///
    /// Returns `None` when the record does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the write fails.
    fn replace(
        &self,
        id: SweetId,
        fields: SweetFields,
        updated_at: DateTime<Utc>,
    ) -> StoreFuture<'_, Option<Sweet>>;

    /// Delete a record. Returns `false` when it did not exist.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the write fails.
    fn remove(&self, id: SweetId) -> StoreFuture<'_, bool>;

    /// Atomically subtract `amount` from stock if at least `amount` is available.
    ///
    /// Returns the updated record, or `None` when the record is missing or
    /// stock is insufficient. The two cases are not distinguished.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the write fails.
    fn decrement_if_available(
        &self,
        id: SweetId,
        amount: u32,
        updated_at: DateTime<Utc>,
    ) -> StoreFuture<'_, Option<Sweet>>;

    /// Atomically add `amount` to stock.
    ///
    /// Returns `None` when the record is missing.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Constraint`] when the result would exceed
    /// [`crate::sweet::MAX_QUANTITY`], or another [`StoreError`] if the write fails.
    fn increment(
        &self,
        id: SweetId,
        amount: u32,
        updated_at: DateTime<Utc>,
    ) -> StoreFuture<'_, Option<Sweet>>;

    /// All records matching the predicate, most recently created first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the read fails.
    fn find(&self, predicate: SearchPredicate) -> StoreFuture<'_, Vec<Sweet>>;

    /// Cheap connectivity check for readiness probes.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the store is unreachable.
    fn ping(&self) -> StoreFuture<'_, ()>;
}
