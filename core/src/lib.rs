//! # Sweet Shop Core
//!
//! Catalog, inventory and search logic for the Sweet Shop backend.
//!
//! This crate owns the rules that matter when many shoppers hit the same
//! record at once:
//!
//! - **Inventory**: purchase and restock are single atomic conditional
//!   operations delegated to the [`store::CatalogStore`]. Stock never goes
//!   negative and concurrent updates are never lost.
//! - **Search**: query parameters compile into a conjunction of typed
//!   [`search::Clause`]s that any store can evaluate.
//! - **Catalog**: admin-gated create/update/delete plus public listing.
//!
//! The core never authenticates. Callers pass an already verified
//! [`identity::Identity`] into every operation that needs one.
//!
//! ## Example
//!
//! ```ignore
//! use sweet_shop_core::{Catalog, identity::Identity};
//!
//! let catalog = Catalog::new(store, clock);
//! let sweet = catalog.purchase(&shopper, sweet_id, None).await?;
//! assert_eq!(sweet.quantity, 99);
//! ```

pub mod catalog;
pub mod error;
pub mod identity;
pub mod inventory;
pub mod search;
pub mod store;
pub mod sweet;

pub use catalog::Catalog;
pub use error::CatalogError;
pub use identity::{Identity, Role, UserId};
pub use inventory::Quantity;
pub use search::{Clause, SearchParams, SearchPredicate, SearchResults};
pub use store::{CatalogStore, StoreError, StoreFuture};
pub use sweet::{Sweet, SweetDraft, SweetFields, SweetId};

// Re-export commonly used types
pub use chrono::{DateTime, Utc};

/// Environment traits injected into the catalog.
pub mod environment {
    use chrono::{DateTime, Utc};

    /// Clock trait - abstracts time operations for testability
    ///
    /// # Examples
    ///
    /// ```ignore
    /// // Test - fixed time for deterministic tests
    /// struct FixedClock { time: DateTime<Utc> }
    /// impl Clock for FixedClock {
    ///     fn now(&self) -> DateTime<Utc> {
    ///         self.time
    ///     }
    /// }
    /// ```
    pub trait Clock: Send + Sync {
        /// Get the current time
        fn now(&self) -> DateTime<Utc>;
    }

    /// Production clock backed by the system time.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct SystemClock;

    impl Clock for SystemClock {
        fn now(&self) -> DateTime<Utc> {
            Utc::now()
        }
    }
}
