//! Catalog service: CRUD over the store.
//!
//! Inventory operations live in [`crate::inventory`] and search in
//! [`crate::search`]; both extend [`Catalog`] with further `impl` blocks.

use crate::environment::Clock;
use crate::error::{CatalogError, Result};
use crate::identity::Identity;
use crate::store::{CatalogStore, StoreError};
use crate::sweet::{Sweet, SweetDraft, SweetId};
use std::sync::Arc;

/// Entry point for every catalog operation.
///
/// Cheap to share: wrap in an `Arc` and hand it to request handlers.
#[derive(Clone)]
pub struct Catalog {
    pub(crate) store: Arc<dyn CatalogStore>,
    pub(crate) clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for Catalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Catalog").finish_non_exhaustive()
    }
}

impl Catalog {
    /// Create a catalog over a store and a clock.
    #[must_use]
    pub fn new(store: Arc<dyn CatalogStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Add a new item (admin only).
    ///
    /// # Errors
    ///
    /// - [`CatalogError::Forbidden`] for non-admin callers
    /// - [`CatalogError::Validation`] naming every missing or invalid field
    /// - [`CatalogError::Store`] on store failure
    #[tracing::instrument(skip(self, draft), fields(user_id = %caller.user_id))]
    pub async fn create(&self, caller: &Identity, draft: SweetDraft) -> Result<Sweet> {
        caller.require_admin()?;
        let fields = draft.validate()?;

        let sweet = self.store.insert(Sweet::new(fields, self.clock.now())).await?;
        tracing::info!(sweet_id = %sweet.id, name = %sweet.name, "Sweet created");
        Ok(sweet)
    }

    /// All items in creation order.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Store`] on store failure.
    pub async fn list(&self) -> Result<Vec<Sweet>> {
        Ok(self.store.list().await?)
    }

    /// Fetch one item.
    ///
    /// # Errors
    ///
    /// - [`CatalogError::NotFound`] when no such item exists
    /// - [`CatalogError::Store`] on store failure
    pub async fn get(&self, id: SweetId) -> Result<Sweet> {
        self.store
            .get(id)
            .await?
            .ok_or(CatalogError::NotFound(id))
    }

    /// Replace all mutable fields of an item (admin only).
    ///
    /// # Errors
    ///
    /// - [`CatalogError::Forbidden`] for non-admin callers
    /// - [`CatalogError::Validation`] for invalid fields
    /// - [`CatalogError::NotFound`] when no such item exists
    /// - [`CatalogError::Store`] on store failure
    #[tracing::instrument(skip(self, draft), fields(user_id = %caller.user_id))]
    pub async fn update(&self, caller: &Identity, id: SweetId, draft: SweetDraft) -> Result<Sweet> {
        caller.require_admin()?;
        let fields = draft.validate()?;

        let sweet = self
            .store
            .replace(id, fields, self.clock.now())
            .await?
            .ok_or(CatalogError::NotFound(id))?;
        tracing::info!(sweet_id = %id, "Sweet updated");
        Ok(sweet)
    }

    /// Remove an item (admin only).
    ///
    /// # Errors
    ///
    /// - [`CatalogError::Forbidden`] for non-admin callers
    /// - [`CatalogError::NotFound`] when no such item exists
    /// - [`CatalogError::Store`] on store failure
    #[tracing::instrument(skip(self), fields(user_id = %caller.user_id))]
    pub async fn delete(&self, caller: &Identity, id: SweetId) -> Result<()> {
        caller.require_admin()?;

        if self.store.remove(id).await? {
            tracing::info!(sweet_id = %id, "Sweet deleted");
            Ok(())
        } else {
            Err(CatalogError::NotFound(id))
        }
    }

    /// Check that the backing store is reachable.
    ///
    /// # Errors
    ///
    /// Returns the underlying [`StoreError`] when the store is unreachable.
    pub async fn ping(&self) -> std::result::Result<(), StoreError> {
        self.store.ping().await
    }
}
