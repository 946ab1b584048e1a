//! # Sweet Shop Testing
//!
//! In-memory infrastructure for the Sweet Shop backend.
//!
//! This crate provides:
//! - [`InMemoryCatalogStore`]: a [`sweet_shop_core::CatalogStore`] backed by a mutex-held map,
//!   also used by the server's `memory` storage backend
//! - Deterministic clocks ([`mocks::FixedClock`], [`mocks::SteppingClock`])
//! - Fixtures for drafts and identities
//!
//! ## Example
//!
//! ```ignore
//! use sweet_shop_testing::{InMemoryCatalogStore, fixtures, mocks::test_clock};
//!
//! #[tokio::test]
//! async fn test_purchase() {
//!     let catalog = Catalog::new(Arc::new(InMemoryCatalogStore::new()), Arc::new(test_clock()));
//!     let sweet = catalog.create(&fixtures::admin(), fixtures::draft("Fudge", 10)).await?;
//!     let sweet = catalog.purchase(&fixtures::shopper(), sweet.id, None).await?;
//!     assert_eq!(sweet.quantity, 9);
//! }
//! ```

mod catalog_store;

pub use catalog_store::InMemoryCatalogStore;

use chrono::{DateTime, Utc};
use sweet_shop_core::environment::Clock;

/// Mock implementations of environment traits.
pub mod mocks {
    use super::{Clock, DateTime, Utc};
    use std::sync::Mutex;

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use sweet_shop_testing::mocks::FixedClock;
    /// use sweet_shop_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// assert_eq!(clock.now(), clock.now());
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Clock that advances by a fixed step on every read.
    ///
    /// Gives each created record a distinct, increasing `created_at`.
    #[derive(Debug)]
    pub struct SteppingClock {
        next: Mutex<DateTime<Utc>>,
        step: chrono::Duration,
    }

    impl SteppingClock {
        /// Start at `start`, advancing by `step` per call.
        #[must_use]
        pub const fn new(start: DateTime<Utc>, step: chrono::Duration) -> Self {
            Self {
                next: Mutex::new(start),
                step,
            }
        }
    }

    impl Clock for SteppingClock {
        fn now(&self) -> DateTime<Utc> {
            let mut next = self
                .next
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            let now = *next;
            *next = now + self.step;
            now
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    #[must_use]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(epoch())
    }

    /// Stepping clock starting at 2025-01-01 00:00:00 UTC, one second per call.
    #[must_use]
    pub fn stepping_clock() -> SteppingClock {
        SteppingClock::new(epoch(), chrono::Duration::seconds(1))
    }

    fn epoch() -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp(1_735_689_600, 0).unwrap_or_default()
    }
}

/// Ready-made drafts and identities.
pub mod fixtures {
    use sweet_shop_core::{Identity, Role, SweetDraft, UserId};

    /// A fresh admin identity.
    #[must_use]
    pub fn admin() -> Identity {
        Identity::new(UserId::new(), Role::Admin)
    }

    /// A fresh non-admin identity.
    #[must_use]
    pub fn shopper() -> Identity {
        Identity::new(UserId::new(), Role::User)
    }

    /// A valid draft with the given name and stock, category `candy`, price 2.50.
    #[must_use]
    pub fn draft(name: &str, quantity: i64) -> SweetDraft {
        priced(name, "candy", 2.5, quantity)
    }

    /// A valid draft with explicit category and price.
    #[must_use]
    pub fn priced(name: &str, category: &str, price: f64, quantity: i64) -> SweetDraft {
        SweetDraft {
            name: Some(name.to_string()),
            description: Some(format!("Freshly made {name}")),
            price: Some(price),
            category: Some(category.to_string()),
            image_url: Some(format!(
                "https://img.example/{}.png",
                name.to_lowercase().replace(' ', "-")
            )),
            quantity: Some(quantity),
        }
    }
}
