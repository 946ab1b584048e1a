//! `PostgreSQL` catalog store.

use chrono::{DateTime, Utc};
use sqlx::postgres::PgPool;
use sqlx::{Postgres, QueryBuilder};
use sweet_shop_core::search::{Clause, SearchPredicate};
use sweet_shop_core::store::{CatalogStore, StoreError, StoreFuture};
use sweet_shop_core::sweet::{MAX_QUANTITY, Sweet, SweetFields, SweetId};
use uuid::Uuid;

const COLUMNS: &str =
    "id, name, description, price, category, image_url, quantity, created_at, updated_at";

/// SQLSTATE for `numeric_value_out_of_range`.
const OUT_OF_RANGE: &str = "22003";

#[derive(sqlx::FromRow)]
struct SweetRow {
    id: Uuid,
    name: String,
    description: String,
    price: f64,
    category: String,
    image_url: String,
    quantity: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<SweetRow> for Sweet {
    type Error = StoreError;

    fn try_from(row: SweetRow) -> Result<Self, Self::Error> {
        let quantity = u32::try_from(row.quantity)
            .map_err(|_| StoreError::Corrupt(format!("sweet {} has quantity {}", row.id, row.quantity)))?;
        Ok(Self {
            id: SweetId::from_uuid(row.id),
            name: row.name,
            description: row.description,
            price: row.price,
            category: row.category,
            image_url: row.image_url,
            quantity,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn decode(row: Option<SweetRow>) -> Result<Option<Sweet>, StoreError> {
    row.map(Sweet::try_from).transpose()
}

fn decode_all(rows: Vec<SweetRow>) -> Result<Vec<Sweet>, StoreError> {
    rows.into_iter().map(Sweet::try_from).collect()
}

fn db_error(context: &str, err: &sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db) = err {
        if db.code().as_deref() == Some(OUT_OF_RANGE) {
            return StoreError::Constraint(format!("stock would exceed {MAX_QUANTITY}"));
        }
    }
    StoreError::DatabaseError(format!("{context}: {err}"))
}

/// Escape `LIKE` metacharacters and wrap in `%…%` for substring matching.
fn like_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for c in needle.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Append the `WHERE` conjunction for a predicate.
fn push_predicate(query: &mut QueryBuilder<'_, Postgres>, predicate: &SearchPredicate) {
    query.push(" WHERE ");
    for (i, clause) in predicate.clauses().iter().enumerate() {
        if i > 0 {
            query.push(" AND ");
        }
        match clause {
            Clause::Keyword(token) => {
                let pattern = like_pattern(token);
                query
                    .push("(name ILIKE ")
                    .push_bind(pattern.clone())
                    .push(" OR description ILIKE ")
                    .push_bind(pattern.clone())
                    .push(" OR category ILIKE ")
                    .push_bind(pattern)
                    .push(")");
            }
            Clause::Category(category) => {
                query.push("category ILIKE ").push_bind(like_pattern(category));
            }
            Clause::PriceRange { min, max } => match (min, max) {
                (Some(lo), Some(hi)) => {
                    query
                        .push("price BETWEEN ")
                        .push_bind(*lo)
                        .push(" AND ")
                        .push_bind(*hi);
                }
                (Some(lo), None) => {
                    query.push("price >= ").push_bind(*lo);
                }
                (None, Some(hi)) => {
                    query.push("price <= ").push_bind(*hi);
                }
                (None, None) => {
                    query.push("TRUE");
                }
            },
            Clause::InStock => {
                query.push("quantity > 0");
            }
        }
    }
}

/// Catalog store backed by a `sweets` table.
#[derive(Debug, Clone)]
pub struct PostgresCatalogStore {
    pool: PgPool,
}

impl PostgresCatalogStore {
    /// Wrap an existing pool. Run [`crate::migrate`] first.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl CatalogStore for PostgresCatalogStore {
    fn insert(&self, sweet: Sweet) -> StoreFuture<'_, Sweet> {
        Box::pin(async move {
            let row: SweetRow = sqlx::query_as(&format!(
                "INSERT INTO sweets ({COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
                 RETURNING {COLUMNS}"
            ))
            .bind(sweet.id.as_uuid())
            .bind(&sweet.name)
            .bind(&sweet.description)
            .bind(sweet.price)
            .bind(&sweet.category)
            .bind(&sweet.image_url)
            .bind(i64::from(sweet.quantity))
            .bind(sweet.created_at)
            .bind(sweet.updated_at)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| db_error("Failed to insert sweet", &e))?;
            Sweet::try_from(row)
        })
    }

    fn get(&self, id: SweetId) -> StoreFuture<'_, Option<Sweet>> {
        Box::pin(async move {
            let row: Option<SweetRow> =
                sqlx::query_as(&format!("SELECT {COLUMNS} FROM sweets WHERE id = $1"))
                    .bind(id.as_uuid())
                    .fetch_optional(&self.pool)
                    .await
                    .map_err(|e| db_error("Failed to load sweet", &e))?;
            decode(row)
        })
    }

    fn list(&self) -> StoreFuture<'_, Vec<Sweet>> {
        Box::pin(async move {
            let rows: Vec<SweetRow> =
                sqlx::query_as(&format!("SELECT {COLUMNS} FROM sweets ORDER BY seq"))
                    .fetch_all(&self.pool)
                    .await
                    .map_err(|e| db_error("Failed to list sweets", &e))?;
            decode_all(rows)
        })
    }

    fn replace(
        &self,
        id: SweetId,
        fields: SweetFields,
        updated_at: DateTime<Utc>,
    ) -> StoreFuture<'_, Option<Sweet>> {
        Box::pin(async move {
            let row: Option<SweetRow> = sqlx::query_as(&format!(
                "UPDATE sweets SET name = $2, description = $3, price = $4, category = $5, \
                 image_url = $6, quantity = $7, updated_at = $8 \
                 WHERE id = $1 RETURNING {COLUMNS}"
            ))
            .bind(id.as_uuid())
            .bind(fields.name)
            .bind(fields.description)
            .bind(fields.price)
            .bind(fields.category)
            .bind(fields.image_url)
            .bind(i64::from(fields.quantity))
            .bind(updated_at)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("Failed to update sweet", &e))?;
            decode(row)
        })
    }

    fn remove(&self, id: SweetId) -> StoreFuture<'_, bool> {
        Box::pin(async move {
            let result = sqlx::query("DELETE FROM sweets WHERE id = $1")
                .bind(id.as_uuid())
                .execute(&self.pool)
                .await
                .map_err(|e| db_error("Failed to delete sweet", &e))?;
            Ok(result.rows_affected() > 0)
        })
    }

    fn decrement_if_available(
        &self,
        id: SweetId,
        amount: u32,
        updated_at: DateTime<Utc>,
    ) -> StoreFuture<'_, Option<Sweet>> {
        Box::pin(async move {
            let row: Option<SweetRow> = sqlx::query_as(&format!(
                "UPDATE sweets SET quantity = quantity - $2, updated_at = $3 \
                 WHERE id = $1 AND quantity >= $2 RETURNING {COLUMNS}"
            ))
            .bind(id.as_uuid())
            .bind(i64::from(amount))
            .bind(updated_at)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("Failed to decrement stock", &e))?;
            decode(row)
        })
    }

    fn increment(
        &self,
        id: SweetId,
        amount: u32,
        updated_at: DateTime<Utc>,
    ) -> StoreFuture<'_, Option<Sweet>> {
        Box::pin(async move {
            let row: Option<SweetRow> = sqlx::query_as(&format!(
                "UPDATE sweets SET quantity = quantity + $2, updated_at = $3 \
                 WHERE id = $1 RETURNING {COLUMNS}"
            ))
            .bind(id.as_uuid())
            .bind(i64::from(amount))
            .bind(updated_at)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("Failed to increment stock", &e))?;
            decode(row)
        })
    }

    fn find(&self, predicate: SearchPredicate) -> StoreFuture<'_, Vec<Sweet>> {
        Box::pin(async move {
            let mut query = QueryBuilder::<Postgres>::new(format!("SELECT {COLUMNS} FROM sweets"));
            push_predicate(&mut query, &predicate);
            query.push(" ORDER BY created_at DESC, seq DESC");

            let rows: Vec<SweetRow> = query
                .build_query_as()
                .fetch_all(&self.pool)
                .await
                .map_err(|e| db_error("Failed to search sweets", &e))?;
            tracing::debug!(matches = rows.len(), "Catalog search");
            decode_all(rows)
        })
    }

    fn ping(&self) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            sqlx::query("SELECT 1")
                .execute(&self.pool)
                .await
                .map_err(|e| db_error("Ping failed", &e))?;
            Ok(())
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use sweet_shop_core::SearchParams;

    #[test]
    fn test_like_pattern_escapes_metacharacters() {
        assert_eq!(like_pattern("mint"), "%mint%");
        assert_eq!(like_pattern("50%_off\\"), "%50\\%\\_off\\\\%");
    }

    #[test]
    fn test_predicate_sql_uses_bind_parameters() {
        let params = SearchParams {
            q: Some("strawberry,candy".to_string()),
            minprice: Some("1".to_string()),
            instock: Some("1".to_string()),
            ..SearchParams::default()
        };
        let predicate = params.compile().unwrap();

        let mut query = QueryBuilder::<Postgres>::new("SELECT id FROM sweets");
        push_predicate(&mut query, &predicate);

        assert_eq!(
            query.sql(),
            "SELECT id FROM sweets WHERE \
             (name ILIKE $1 OR description ILIKE $2 OR category ILIKE $3) AND \
             (name ILIKE $4 OR description ILIKE $5 OR category ILIKE $6) AND \
             price >= $7 AND quantity > 0"
        );
    }
}
