//! Catalog item types.
//!
//! [`Sweet`] is the stored record. [`SweetDraft`] is what an admin submits
//! on create or update; it is validated into [`SweetFields`] before any store
//! is touched.

use crate::error::CatalogError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Largest stock level any backend is required to represent.
pub const MAX_QUANTITY: u32 = i32::MAX as u32;

/// Unique identifier for a catalog item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SweetId(Uuid);

impl SweetId {
    /// Generate a new random identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for SweetId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SweetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SweetId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(Self)
    }
}

/// A confectionery item in the catalog.
///
/// `quantity` is the only stock field. It is mutated exclusively through the
/// store's conditional operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sweet {
    /// Server-generated identifier.
    pub id: SweetId,
    /// Display name.
    pub name: String,
    /// Free-form description.
    pub description: String,
    /// Unit price, finite and non-negative.
    pub price: f64,
    /// Category label, e.g. "candy" or "cake".
    pub category: String,
    /// Product image location.
    pub image_url: String,
    /// Units in stock.
    pub quantity: u32,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
    /// When the record was last mutated.
    pub updated_at: DateTime<Utc>,
}

impl Sweet {
    /// Build a brand new record from validated fields.
    #[must_use]
    pub fn new(fields: SweetFields, now: DateTime<Utc>) -> Self {
        Self {
            id: SweetId::new(),
            name: fields.name,
            description: fields.description,
            price: fields.price,
            category: fields.category,
            image_url: fields.image_url,
            quantity: fields.quantity,
            created_at: now,
            updated_at: now,
        }
    }

    /// Replace every mutable field, keeping identity and creation time.
    pub fn apply(&mut self, fields: SweetFields, now: DateTime<Utc>) {
        self.name = fields.name;
        self.description = fields.description;
        self.price = fields.price;
        self.category = fields.category;
        self.image_url = fields.image_url;
        self.quantity = fields.quantity;
        self.updated_at = now;
    }

    /// Whether at least one unit is available.
    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.quantity > 0
    }
}

/// Unvalidated create/update payload.
///
/// Deserialization never fails on a field's JSON type. Numeric strings are
/// read as numbers and numbers as text; any other mismatch leaves the field
/// `None` so [`SweetDraft::validate`] names it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SweetDraft {
    /// Display name.
    #[serde(default, deserialize_with = "lenient_text")]
    pub name: Option<String>,
    /// Free-form description.
    #[serde(default, deserialize_with = "lenient_text")]
    pub description: Option<String>,
    /// Unit price.
    #[serde(default, deserialize_with = "lenient_price")]
    pub price: Option<f64>,
    /// Category label.
    #[serde(default, deserialize_with = "lenient_text")]
    pub category: Option<String>,
    /// Product image location.
    #[serde(default, alias = "image_url", deserialize_with = "lenient_text")]
    pub image_url: Option<String>,
    /// Initial or replacement stock level.
    #[serde(default, deserialize_with = "lenient_quantity")]
    pub quantity: Option<i64>,
}

fn lenient_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn lenient_price<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

fn lenient_quantity<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

/// Validated create/update payload.
#[derive(Debug, Clone, PartialEq)]
pub struct SweetFields {
    /// Display name, trimmed and non-empty.
    pub name: String,
    /// Description, trimmed and non-empty.
    pub description: String,
    /// Finite, non-negative price.
    pub price: f64,
    /// Category, trimmed and non-empty.
    pub category: String,
    /// Image location, trimmed and non-empty.
    pub image_url: String,
    /// Stock level within `0..=MAX_QUANTITY`.
    pub quantity: u32,
}

impl SweetDraft {
    /// Validate every field, reporting all offending fields at once.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Validation`] naming each missing or invalid field.
    pub fn validate(self) -> Result<SweetFields, CatalogError> {
        let mut invalid = Vec::new();

        let name = required_text(self.name, "name", &mut invalid);
        let description = required_text(self.description, "description", &mut invalid);
        let category = required_text(self.category, "category", &mut invalid);
        let image_url = required_text(self.image_url, "imageUrl", &mut invalid);

        let price = match self.price {
            Some(p) if p.is_finite() && p >= 0.0 => p,
            _ => {
                invalid.push("price");
                0.0
            }
        };

        let quantity = match self.quantity.map(u32::try_from) {
            Some(Ok(q)) if q <= MAX_QUANTITY => q,
            _ => {
                invalid.push("quantity");
                0
            }
        };

        if !invalid.is_empty() {
            return Err(CatalogError::Validation(format!(
                "required fields missing or invalid: {}",
                invalid.join(", ")
            )));
        }

        Ok(SweetFields {
            name,
            description,
            price,
            category,
            image_url,
            quantity,
        })
    }
}

fn required_text(value: Option<String>, field: &'static str, invalid: &mut Vec<&'static str>) -> String {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() => v,
        _ => {
            invalid.push(field);
            String::new()
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn draft() -> SweetDraft {
        SweetDraft {
            name: Some("Strawberry Candy".to_string()),
            description: Some("Chewy and bright".to_string()),
            price: Some(2.5),
            category: Some("candy".to_string()),
            image_url: Some("https://img.example/strawberry.png".to_string()),
            quantity: Some(0),
        }
    }

    #[test]
    fn test_valid_draft_allows_zero_quantity() {
        let fields = draft().validate().unwrap();
        assert_eq!(fields.quantity, 0);
        assert_eq!(fields.name, "Strawberry Candy");
    }

    #[test]
    fn test_text_fields_are_trimmed() {
        let mut d = draft();
        d.category = Some("  candy ".to_string());
        assert_eq!(d.validate().unwrap().category, "candy");
    }

    #[test]
    fn test_reports_every_invalid_field() {
        let d = SweetDraft {
            name: Some("   ".to_string()),
            price: Some(-1.0),
            quantity: None,
            ..draft()
        };
        let err = d.validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "required fields missing or invalid: name, price, quantity"
        );
    }

    #[test]
    fn test_numeric_strings_are_read_as_numbers() {
        let d: SweetDraft = serde_json::from_value(serde_json::json!({
            "name": "Fudge",
            "description": "Dense",
            "price": "2.5",
            "category": "candy",
            "imageUrl": "https://img.example/fudge.png",
            "quantity": " 5 ",
        }))
        .unwrap();
        let fields = d.validate().unwrap();
        assert!((fields.price - 2.5).abs() < f64::EPSILON);
        assert_eq!(fields.quantity, 5);
    }

    #[test]
    fn test_wrongly_typed_fields_are_named_in_validation_error() {
        let d: SweetDraft = serde_json::from_value(serde_json::json!({
            "name": ["Fudge"],
            "description": "Dense",
            "price": "cheap",
            "category": "candy",
            "imageUrl": "https://img.example/fudge.png",
            "quantity": 2.5,
        }))
        .unwrap();
        assert_eq!(
            d.validate().unwrap_err().to_string(),
            "required fields missing or invalid: name, price, quantity"
        );
    }

    #[test]
    fn test_rejects_non_finite_price() {
        let d = SweetDraft {
            price: Some(f64::INFINITY),
            ..draft()
        };
        assert!(matches!(d.validate(), Err(CatalogError::Validation(_))));
    }

    #[test]
    fn test_rejects_negative_and_oversized_quantity() {
        for q in [-1, i64::from(MAX_QUANTITY) + 1] {
            let d = SweetDraft {
                quantity: Some(q),
                ..draft()
            };
            assert!(d.validate().is_err(), "quantity {q} should be rejected");
        }
    }

    #[test]
    fn test_sweet_id_parse() {
        let id = SweetId::new();
        assert_eq!(id.to_string().parse::<SweetId>().unwrap(), id);
        assert!("not-a-uuid".parse::<SweetId>().is_err());
    }

    #[test]
    fn test_camel_case_json() {
        let now = Utc::now();
        let sweet = Sweet::new(draft().validate().unwrap(), now);
        let json = serde_json::to_value(&sweet).unwrap();
        assert!(json.get("imageUrl").is_some());
        assert!(json.get("createdAt").is_some());
        assert!(json.get("image_url").is_none());
    }
}
