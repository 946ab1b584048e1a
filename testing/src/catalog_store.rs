//! In-memory [`CatalogStore`].
//!
//! Every operation takes the same mutex for its whole check-and-write, which
//! makes conditional stock updates linearizable. The lock is never held
//! across an `.await`.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use sweet_shop_core::search::SearchPredicate;
use sweet_shop_core::store::{CatalogStore, StoreError, StoreFuture};
use sweet_shop_core::sweet::{MAX_QUANTITY, Sweet, SweetFields, SweetId};

#[derive(Debug, Default)]
struct Records {
    by_id: HashMap<SweetId, (u64, Sweet)>,
    next_seq: u64,
}

impl Records {
    fn ordered(&self) -> Vec<&(u64, Sweet)> {
        let mut rows: Vec<_> = self.by_id.values().collect();
        rows.sort_by_key(|(seq, _)| *seq);
        rows
    }
}

/// Thread-safe in-memory catalog store.
///
/// Clones share the same underlying records.
///
/// # Example
///
/// ```
/// use sweet_shop_testing::InMemoryCatalogStore;
///
/// let store = InMemoryCatalogStore::new();
/// assert!(store.is_empty());
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalogStore {
    records: Arc<Mutex<Records>>,
}

impl InMemoryCatalogStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().map_or(0, |r| r.by_id.len())
    }

    /// Whether the store holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> Result<MutexGuard<'_, Records>, StoreError> {
        self.records
            .lock()
            .map_err(|_| StoreError::DatabaseError("in-memory store lock poisoned".to_string()))
    }

    fn with_record<T>(
        &self,
        id: SweetId,
        f: impl FnOnce(&mut Sweet) -> Result<T, StoreError>,
    ) -> Result<Option<T>, StoreError> {
        let mut records = self.lock()?;
        match records.by_id.get_mut(&id) {
            Some((_, sweet)) => f(sweet).map(Some),
            None => Ok(None),
        }
    }
}

impl CatalogStore for InMemoryCatalogStore {
    fn insert(&self, sweet: Sweet) -> StoreFuture<'_, Sweet> {
        Box::pin(async move {
            let mut records = self.lock()?;
            let seq = records.next_seq;
            records.next_seq += 1;
            records.by_id.insert(sweet.id, (seq, sweet.clone()));
            Ok(sweet)
        })
    }

    fn get(&self, id: SweetId) -> StoreFuture<'_, Option<Sweet>> {
        Box::pin(async move { Ok(self.lock()?.by_id.get(&id).map(|(_, s)| s.clone())) })
    }

    fn list(&self) -> StoreFuture<'_, Vec<Sweet>> {
        Box::pin(async move {
            let records = self.lock()?;
            let sweets = records.ordered().into_iter().map(|(_, s)| s.clone()).collect();
            Ok(sweets)
        })
    }

    fn replace(
        &self,
        id: SweetId,
        fields: SweetFields,
        updated_at: DateTime<Utc>,
    ) -> StoreFuture<'_, Option<Sweet>> {
        Box::pin(async move {
            self.with_record(id, |sweet| {
                sweet.apply(fields, updated_at);
                Ok(sweet.clone())
            })
        })
    }

    fn remove(&self, id: SweetId) -> StoreFuture<'_, bool> {
        Box::pin(async move { Ok(self.lock()?.by_id.remove(&id).is_some()) })
    }

    fn decrement_if_available(
        &self,
        id: SweetId,
        amount: u32,
        updated_at: DateTime<Utc>,
    ) -> StoreFuture<'_, Option<Sweet>> {
        Box::pin(async move {
            let outcome = self.with_record(id, |sweet| {
                if sweet.quantity < amount {
                    return Ok(None);
                }
                sweet.quantity -= amount;
                sweet.updated_at = updated_at;
                Ok(Some(sweet.clone()))
            })?;
            Ok(outcome.flatten())
        })
    }

    fn increment(
        &self,
        id: SweetId,
        amount: u32,
        updated_at: DateTime<Utc>,
    ) -> StoreFuture<'_, Option<Sweet>> {
        Box::pin(async move {
            self.with_record(id, |sweet| {
                let next = sweet
                    .quantity
                    .checked_add(amount)
                    .filter(|q| *q <= MAX_QUANTITY)
                    .ok_or_else(|| {
                        StoreError::Constraint(format!("stock would exceed {MAX_QUANTITY}"))
                    })?;
                sweet.quantity = next;
                sweet.updated_at = updated_at;
                Ok(sweet.clone())
            })
        })
    }

    fn find(&self, predicate: SearchPredicate) -> StoreFuture<'_, Vec<Sweet>> {
        Box::pin(async move {
            let records = self.lock()?;
            let mut rows: Vec<_> = records
                .ordered()
                .into_iter()
                .filter(|(_, s)| predicate.matches(s))
                .collect();
            rows.sort_by(|(seq_a, a), (seq_b, b)| {
                b.created_at.cmp(&a.created_at).then(seq_b.cmp(seq_a))
            });
            tracing::trace!(matches = rows.len(), "In-memory search");
            Ok(rows.into_iter().map(|(_, s)| s.clone()).collect())
        })
    }

    fn ping(&self) -> StoreFuture<'_, ()> {
        Box::pin(async move { self.lock().map(|_| ()) })
    }
}
