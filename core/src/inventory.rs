//! Inventory operations: purchase and restock.
//!
//! Both delegate to a single atomic store operation. Purchase uses the
//! store's conditional decrement, so concurrent purchases whose total exceeds
//! the available stock cannot all succeed and stock never goes negative.

use crate::catalog::Catalog;
use crate::error::{CatalogError, Result};
use crate::identity::Identity;
use crate::sweet::{MAX_QUANTITY, Sweet, SweetId};
use serde_json::Value;

const INVALID_QUANTITY: &str = "quantity must be a positive integer";

/// A validated, positive unit count for purchase or restock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Quantity(u32);

impl Quantity {
    /// A single unit; the purchase default.
    pub const ONE: Self = Self(1);

    /// Validate an integer count.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Validation`] unless `1 <= n <= MAX_QUANTITY`.
    pub fn new(n: i64) -> Result<Self> {
        match u32::try_from(n) {
            Ok(q) if (1..=MAX_QUANTITY).contains(&q) => Ok(Self(q)),
            _ => Err(invalid()),
        }
    }

    /// The unit count.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }

    /// Parse a JSON value.
    ///
    /// Accepts integers, floats with no fractional part and numeric strings.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Validation`] for anything else, including
    /// booleans, `null`, zero and negative numbers.
    pub fn from_json(value: &Value) -> Result<Self> {
        match value {
            Value::Number(n) => match n.as_i64() {
                Some(i) => Self::new(i),
                None => n.as_f64().map_or_else(|| Err(invalid()), Self::from_f64),
            },
            Value::String(s) => s
                .trim()
                .parse::<f64>()
                .map_err(|_| invalid())
                .and_then(Self::from_f64),
            _ => Err(invalid()),
        }
    }

    /// Parse an optional JSON value where absence and `null` mean "not given".
    ///
    /// # Errors
    ///
    /// Same as [`Quantity::from_json`] for present values.
    pub fn from_optional_json(value: Option<&Value>) -> Result<Option<Self>> {
        match value {
            None | Some(Value::Null) => Ok(None),
            Some(v) => Self::from_json(v).map(Some),
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    fn from_f64(f: f64) -> Result<Self> {
        if f.is_finite() && f.fract() == 0.0 && f >= 1.0 && f <= f64::from(MAX_QUANTITY) {
            Self::new(f as i64)
        } else {
            Err(invalid())
        }
    }
}

fn invalid() -> CatalogError {
    CatalogError::Validation(INVALID_QUANTITY.to_string())
}

impl Catalog {
    /// Buy `quantity` units (default one) of an item.
    ///
    /// Any authenticated caller may purchase.
    ///
    /// # Errors
    ///
    /// - [`CatalogError::InsufficientStockOrNotFound`] when the item is
    ///   missing or has fewer than `quantity` units; nothing is changed
    /// - [`CatalogError::Store`] on store failure
    #[tracing::instrument(skip(self), fields(user_id = %caller.user_id))]
    pub async fn purchase(
        &self,
        caller: &Identity,
        id: SweetId,
        quantity: Option<Quantity>,
    ) -> Result<Sweet> {
        let amount = quantity.unwrap_or(Quantity::ONE).get();

        match self
            .store
            .decrement_if_available(id, amount, self.clock.now())
            .await
        {
            Ok(Some(sweet)) => {
                metrics::counter!("sweets_purchases_total", "outcome" => "ok").increment(1);
                metrics::counter!("sweets_units_sold_total").increment(u64::from(amount));
                tracing::info!(sweet_id = %id, amount, remaining = sweet.quantity, "Purchase applied");
                Ok(sweet)
            }
            Ok(None) => {
                metrics::counter!("sweets_purchases_total", "outcome" => "rejected").increment(1);
                tracing::debug!(sweet_id = %id, amount, "Purchase rejected");
                Err(CatalogError::InsufficientStockOrNotFound)
            }
            Err(e) => {
                metrics::counter!("sweets_purchases_total", "outcome" => "error").increment(1);
                Err(e.into())
            }
        }
    }

    /// Add `quantity` units to an item (admin only).
    ///
    /// # Errors
    ///
    /// - [`CatalogError::Forbidden`] for non-admin callers
    /// - [`CatalogError::NotFound`] when the item is missing
    /// - [`CatalogError::Validation`] when stock would exceed the maximum
    /// - [`CatalogError::Store`] on store failure
    #[tracing::instrument(skip(self), fields(user_id = %caller.user_id))]
    pub async fn restock(&self, caller: &Identity, id: SweetId, quantity: Quantity) -> Result<Sweet> {
        caller.require_admin()?;
        let amount = quantity.get();

        let outcome = self.store.increment(id, amount, self.clock.now()).await;
        let label = match &outcome {
            Ok(Some(_)) => "ok",
            Ok(None) => "not_found",
            Err(_) => "error",
        };
        metrics::counter!("sweets_restocks_total", "outcome" => label).increment(1);

        let sweet = outcome?.ok_or(CatalogError::NotFound(id))?;
        tracing::info!(sweet_id = %id, amount, stock = sweet.quantity, "Restock applied");
        Ok(sweet)
    }
}
