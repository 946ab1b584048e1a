//! Search/filter compiler.
//!
//! Raw query parameters compile into a [`SearchPredicate`]: a conjunction of
//! typed [`Clause`]s. Compilation validates everything up front, so a store
//! only ever sees a well-formed predicate.
//!
//! | parameter                        | clause                                   |
//! |----------------------------------|------------------------------------------|
//! | `q` / `keywords`                 | one [`Clause::Keyword`] per comma token   |
//! | `category`                       | [`Clause::Category`]                      |
//! | `minprice` / `maxprice`          | [`Clause::PriceRange`]                    |
//! | `instock=1` / `instock=true`     | [`Clause::InStock`]                       |

use crate::catalog::Catalog;
use crate::error::{CatalogError, Result};
use crate::sweet::Sweet;
use serde::{Deserialize, Serialize};

/// Raw search query parameters as received over HTTP.
///
/// Lowercase spellings win over their camelCase aliases, and `q` wins over
/// `keywords`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchParams {
    /// Comma-separated keywords.
    pub q: Option<String>,
    /// Alias for `q`.
    pub keywords: Option<String>,
    /// Category substring.
    pub category: Option<String>,
    /// Inclusive lower price bound.
    pub minprice: Option<String>,
    /// Alias for `minprice`.
    #[serde(rename = "minPrice")]
    pub min_price: Option<String>,
    /// Inclusive upper price bound.
    pub maxprice: Option<String>,
    /// Alias for `maxprice`.
    #[serde(rename = "maxPrice")]
    pub max_price: Option<String>,
    /// `"1"` or `"true"` restricts results to in-stock items.
    pub instock: Option<String>,
}

/// A single filter condition.
#[derive(Debug, Clone, PartialEq)]
pub enum Clause {
    /// Lowercased token that must appear in the name, description or category.
    Keyword(String),
    /// Lowercased substring that must appear in the category.
    Category(String),
    /// Inclusive price bounds; at least one side is set.
    PriceRange {
        /// Lower bound.
        min: Option<f64>,
        /// Upper bound.
        max: Option<f64>,
    },
    /// Stock must be greater than zero.
    InStock,
}

impl Clause {
    /// Evaluate this clause against a record.
    #[must_use]
    pub fn matches(&self, sweet: &Sweet) -> bool {
        match self {
            Self::Keyword(token) => {
                contains_ci(&sweet.name, token)
                    || contains_ci(&sweet.description, token)
                    || contains_ci(&sweet.category, token)
            }
            Self::Category(needle) => contains_ci(&sweet.category, needle),
            Self::PriceRange { min, max } => {
                min.is_none_or(|m| sweet.price >= m) && max.is_none_or(|m| sweet.price <= m)
            }
            Self::InStock => sweet.in_stock(),
        }
    }
}

fn contains_ci(haystack: &str, lowered_needle: &str) -> bool {
    haystack.to_lowercase().contains(lowered_needle)
}

/// A compiled, validated conjunction of clauses. Never empty.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchPredicate {
    clauses: Vec<Clause>,
}

impl SearchPredicate {
    /// Start building a predicate.
    #[must_use]
    pub fn builder() -> PredicateBuilder {
        PredicateBuilder::default()
    }

    /// The clauses, in the order they were added.
    #[must_use]
    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    /// Whether every clause holds for the record.
    #[must_use]
    pub fn matches(&self, sweet: &Sweet) -> bool {
        self.clauses.iter().all(|clause| clause.matches(sweet))
    }
}

/// Accumulates clauses; [`build`](Self::build) refuses an empty predicate.
#[derive(Debug, Default)]
pub struct PredicateBuilder {
    clauses: Vec<Clause>,
}

impl PredicateBuilder {
    /// Add one keyword clause per non-empty comma-separated token.
    #[must_use]
    pub fn keywords(mut self, raw: &str) -> Self {
        self.clauses.extend(
            raw.split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(|t| Clause::Keyword(t.to_lowercase())),
        );
        self
    }

    /// Add a category clause unless the trimmed value is empty.
    #[must_use]
    pub fn category(mut self, raw: &str) -> Self {
        let trimmed = raw.trim();
        if !trimmed.is_empty() {
            self.clauses.push(Clause::Category(trimmed.to_lowercase()));
        }
        self
    }

    /// Add a price range clause when either bound is set.
    #[must_use]
    pub fn price_range(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        if min.is_some() || max.is_some() {
            self.clauses.push(Clause::PriceRange { min, max });
        }
        self
    }

    /// Add the in-stock clause when requested.
    #[must_use]
    pub fn in_stock(mut self, only_in_stock: bool) -> Self {
        if only_in_stock {
            self.clauses.push(Clause::InStock);
        }
        self
    }

    /// Finish the predicate.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Validation`] when no clause was added.
    pub fn build(self) -> Result<SearchPredicate> {
        if self.clauses.is_empty() {
            return Err(CatalogError::Validation(
                "provide at least one of: keyword/category/price-range/in-stock".to_string(),
            ));
        }
        Ok(SearchPredicate {
            clauses: self.clauses,
        })
    }
}

impl SearchParams {
    /// Collect parameters from decoded query-string pairs.
    ///
    /// Repeated `q` or `keywords` values are joined with commas, so every
    /// value contributes keyword clauses. Other repeated parameters keep
    /// their first value. Unknown keys are ignored.
    #[must_use]
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut params = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "q" => {
                    join_token(&mut params.q, value);
                    continue;
                }
                "keywords" => {
                    join_token(&mut params.keywords, value);
                    continue;
                }
                "category" => &mut params.category,
                "minprice" => &mut params.minprice,
                "minPrice" => &mut params.min_price,
                "maxprice" => &mut params.maxprice,
                "maxPrice" => &mut params.max_price,
                "instock" => &mut params.instock,
                _ => continue,
            };
            slot.get_or_insert(value);
        }
        params
    }

    /// Validate and compile the parameters.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Validation`] when a price bound is not a finite
    /// number ≥ 0, when `minprice > maxprice`, or when no filter is supplied.
    pub fn compile(&self) -> Result<SearchPredicate> {
        let min = parse_price(self.minprice.as_ref().or(self.min_price.as_ref()), "minprice")?;
        let max = parse_price(self.maxprice.as_ref().or(self.max_price.as_ref()), "maxprice")?;

        if let (Some(lo), Some(hi)) = (min, max) {
            if lo > hi {
                return Err(CatalogError::Validation(
                    "minprice cannot be greater than maxprice".to_string(),
                ));
            }
        }

        let keywords = self.q.as_deref().or(self.keywords.as_deref()).unwrap_or("");
        let in_stock = matches!(self.instock.as_deref(), Some("1" | "true"));

        SearchPredicate::builder()
            .keywords(keywords)
            .category(self.category.as_deref().unwrap_or(""))
            .price_range(min, max)
            .in_stock(in_stock)
            .build()
    }
}

fn join_token(slot: &mut Option<String>, value: String) {
    match slot {
        Some(joined) => {
            joined.push(',');
            joined.push_str(&value);
        }
        None => *slot = Some(value),
    }
}

fn parse_price(raw: Option<&String>, name: &str) -> Result<Option<f64>> {
    let Some(raw) = raw.map(|s| s.trim()).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };
    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() && value >= 0.0 => Ok(Some(value)),
        _ => Err(CatalogError::Validation(format!(
            "{name} must be a number ≥ 0"
        ))),
    }
}

/// Search response payload.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResults {
    /// Matching records, most recently created first.
    pub sweets: Vec<Sweet>,
    /// Number of matching records.
    pub total: usize,
}

impl Catalog {
    /// Compile the parameters and return every matching record.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Validation`] for malformed parameters (before
    /// the store is queried) or [`CatalogError::Store`] on store failure.
    #[tracing::instrument(skip(self), level = "debug")]
    pub async fn search(&self, params: &SearchParams) -> Result<SearchResults> {
        let predicate = match params.compile() {
            Ok(p) => p,
            Err(e) => {
                metrics::counter!("sweets_searches_total", "outcome" => "rejected").increment(1);
                return Err(e);
            }
        };

        let sweets = self.store.find(predicate).await?;
        metrics::counter!("sweets_searches_total", "outcome" => "ok").increment(1);

        Ok(SearchResults {
            total: sweets.len(),
            sweets,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::sweet::SweetFields;
    use chrono::Utc;

    fn params(pairs: &[(&str, &str)]) -> SearchParams {
        let object = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), serde_json::Value::String((*v).to_string())))
            .collect();
        serde_json::from_value(serde_json::Value::Object(object)).unwrap()
    }

    fn sweet(name: &str, category: &str, price: f64, quantity: u32) -> Sweet {
        Sweet::new(
            SweetFields {
                name: name.to_string(),
                description: format!("A lovely {name}"),
                price,
                category: category.to_string(),
                image_url: "https://img.example/x.png".to_string(),
                quantity,
            },
            Utc::now(),
        )
    }

    fn validation_message(params: &SearchParams) -> String {
        match params.compile() {
            Err(CatalogError::Validation(m)) => m,
            other => unreachable!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_keywords_split_and_trimmed() {
        let predicate = params(&[("q", " Strawberry , ,candy ")]).compile().unwrap();
        assert_eq!(
            predicate.clauses(),
            &[
                Clause::Keyword("strawberry".to_string()),
                Clause::Keyword("candy".to_string())
            ]
        );
    }

    #[test]
    fn test_q_wins_over_keywords_alias() {
        let predicate = params(&[("q", "mint"), ("keywords", "lemon")]).compile().unwrap();
        assert_eq!(predicate.clauses(), &[Clause::Keyword("mint".to_string())]);

        let predicate = params(&[("keywords", "lemon")]).compile().unwrap();
        assert_eq!(predicate.clauses(), &[Clause::Keyword("lemon".to_string())]);
    }

    #[test]
    fn test_repeated_keyword_params_are_joined() {
        let pairs = [
            ("q", "strawberry"),
            ("q", "candy"),
            ("category", "candy"),
            ("category", "cake"),
        ]
        .map(|(k, v)| (k.to_string(), v.to_string()));
        let params = SearchParams::from_pairs(pairs);
        assert_eq!(params.q.as_deref(), Some("strawberry,candy"));
        assert_eq!(params.category.as_deref(), Some("candy"));
        assert_eq!(
            params.compile().unwrap().clauses(),
            &[
                Clause::Keyword("strawberry".to_string()),
                Clause::Keyword("candy".to_string()),
                Clause::Category("candy".to_string()),
            ]
        );
    }

    #[test]
    fn test_pairs_keep_alias_precedence() {
        let pairs = [
            ("keywords", "lemon"),
            ("q", "mint"),
            ("minPrice", "3"),
            ("minprice", "1"),
            ("page", "2"),
        ]
        .map(|(k, v)| (k.to_string(), v.to_string()));
        let predicate = SearchParams::from_pairs(pairs).compile().unwrap();
        assert_eq!(
            predicate.clauses(),
            &[
                Clause::Keyword("mint".to_string()),
                Clause::PriceRange {
                    min: Some(1.0),
                    max: None
                },
            ]
        );
    }

    #[test]
    fn test_keyword_tokens_are_anded() {
        let predicate = params(&[("q", "strawberry,candy")]).compile().unwrap();
        assert!(predicate.matches(&sweet("Strawberry Candy", "candy", 1.0, 1)));
        assert!(!predicate.matches(&sweet("Strawberry Cake", "cake", 1.0, 1)));
    }

    #[test]
    fn test_keyword_matches_any_field() {
        let predicate = params(&[("q", "lovely")]).compile().unwrap();
        assert!(predicate.matches(&sweet("Toffee", "chewy", 1.0, 0)));
        let predicate = params(&[("q", "CHEWY")]).compile().unwrap();
        assert!(predicate.matches(&sweet("Toffee", "chewy", 1.0, 0)));
    }

    #[test]
    fn test_category_and_in_stock() {
        let predicate = params(&[("category", "candy"), ("instock", "true")])
            .compile()
            .unwrap();
        assert!(predicate.matches(&sweet("Gummy", "Candy", 1.0, 3)));
        assert!(!predicate.matches(&sweet("Gummy", "Candy", 1.0, 0)));
        assert!(!predicate.matches(&sweet("Eclair", "pastry", 1.0, 3)));
    }

    #[test]
    fn test_instock_only_accepts_one_or_true() {
        assert!(params(&[("instock", "1")]).compile().is_ok());
        assert!(params(&[("instock", "true")]).compile().is_ok());
        let message = validation_message(&params(&[("instock", "yes")]));
        assert!(message.starts_with("provide at least one of"));
    }

    #[test]
    fn test_price_range_inclusive() {
        let predicate = params(&[("minprice", "5"), ("maxprice", "15")]).compile().unwrap();
        let matched: Vec<f64> = [3.0, 5.0, 8.0, 15.0, 20.0]
            .into_iter()
            .filter(|p| predicate.matches(&sweet("x", "y", *p, 1)))
            .collect();
        assert_eq!(matched, vec![5.0, 8.0, 15.0]);
    }

    #[test]
    fn test_camel_case_price_aliases() {
        let predicate = params(&[("minPrice", "2"), ("maxPrice", "4")]).compile().unwrap();
        assert_eq!(
            predicate.clauses(),
            &[Clause::PriceRange {
                min: Some(2.0),
                max: Some(4.0)
            }]
        );
        let predicate = params(&[("minprice", "1"), ("minPrice", "3")]).compile().unwrap();
        assert_eq!(
            predicate.clauses(),
            &[Clause::PriceRange {
                min: Some(1.0),
                max: None
            }]
        );
    }

    #[test]
    fn test_price_validation_messages() {
        assert_eq!(
            validation_message(&params(&[("minprice", "abc")])),
            "minprice must be a number ≥ 0"
        );
        assert_eq!(
            validation_message(&params(&[("maxprice", "-1")])),
            "maxprice must be a number ≥ 0"
        );
        assert_eq!(
            validation_message(&params(&[("maxprice", "NaN")])),
            "maxprice must be a number ≥ 0"
        );
        assert_eq!(
            validation_message(&params(&[("minprice", "20"), ("maxprice", "10")])),
            "minprice cannot be greater than maxprice"
        );
    }

    #[test]
    fn test_blank_price_counts_as_absent() {
        let message = validation_message(&params(&[("minprice", "  ")]));
        assert!(message.starts_with("provide at least one of"));
    }

    #[test]
    fn test_empty_query_rejected() {
        let message = validation_message(&SearchParams::default());
        assert_eq!(
            message,
            "provide at least one of: keyword/category/price-range/in-stock"
        );
        let message = validation_message(&params(&[("q", " , ,"), ("category", "  ")]));
        assert!(message.starts_with("provide at least one of"));
    }

    #[test]
    fn test_price_checked_before_emptiness() {
        let message = validation_message(&params(&[("minprice", "x"), ("maxprice", "y")]));
        assert_eq!(message, "minprice must be a number ≥ 0");
    }
}
