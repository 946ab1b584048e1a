//! `PostgreSQL` user store.

use chrono::{DateTime, Utc};
use sqlx::postgres::PgPool;
use sweet_shop_auth::error::AuthError;
use sweet_shop_auth::providers::{UserFuture, UserStore};
use sweet_shop_auth::user::User;
use sweet_shop_core::{Role, UserId};
use uuid::Uuid;

const COLUMNS: &str = "id, username, email, password_hash, role, created_at";

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    username: String,
    email: String,
    password_hash: String,
    role: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = AuthError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role = row
            .role
            .parse::<Role>()
            .map_err(AuthError::DatabaseError)?;
        Ok(Self {
            id: UserId::from_uuid(row.id),
            username: row.username,
            email: row.email,
            password_hash: row.password_hash,
            role,
            created_at: row.created_at,
        })
    }
}

fn db_error(context: &str, err: &sqlx::Error) -> AuthError {
    AuthError::DatabaseError(format!("{context}: {err}"))
}

/// User store backed by a `users` table.
#[derive(Debug, Clone)]
pub struct PostgresUserStore {
    pool: PgPool,
}

impl PostgresUserStore {
    /// Wrap an existing pool. Run [`crate::migrate`] first.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl UserStore for PostgresUserStore {
    fn create(&self, user: User) -> UserFuture<'_, User> {
        Box::pin(async move {
            let row: UserRow = sqlx::query_as(&format!(
                "INSERT INTO users ({COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6) RETURNING {COLUMNS}"
            ))
            .bind(user.id.as_uuid())
            .bind(&user.username)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(user.role.as_str())
            .bind(user.created_at)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match &e {
                sqlx::Error::Database(db) if db.is_unique_violation() => {
                    AuthError::UserAlreadyExists
                }
                _ => db_error("Failed to create user", &e),
            })?;
            User::try_from(row)
        })
    }

    fn find_by_email<'a>(&'a self, email: &'a str) -> UserFuture<'a, Option<User>> {
        Box::pin(async move {
            let row: Option<UserRow> =
                sqlx::query_as(&format!("SELECT {COLUMNS} FROM users WHERE email = $1"))
                    .bind(email)
                    .fetch_optional(&self.pool)
                    .await
                    .map_err(|e| db_error("Failed to get user", &e))?;
            row.map(User::try_from).transpose()
        })
    }

    fn find_by_id(&self, id: UserId) -> UserFuture<'_, Option<User>> {
        Box::pin(async move {
            let row: Option<UserRow> =
                sqlx::query_as(&format!("SELECT {COLUMNS} FROM users WHERE id = $1"))
                    .bind(id.as_uuid())
                    .fetch_optional(&self.pool)
                    .await
                    .map_err(|e| db_error("Failed to get user", &e))?;
            row.map(User::try_from).transpose()
        })
    }

    fn upsert(&self, user: User) -> UserFuture<'_, User> {
        Box::pin(async move {
            let row: UserRow = sqlx::query_as(&format!(
                "INSERT INTO users ({COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6) \
                 ON CONFLICT (email) DO UPDATE SET username = EXCLUDED.username, \
                 password_hash = EXCLUDED.password_hash, role = EXCLUDED.role \
                 RETURNING {COLUMNS}"
            ))
            .bind(user.id.as_uuid())
            .bind(&user.username)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(user.role.as_str())
            .bind(user.created_at)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| db_error("Failed to upsert user", &e))?;
            User::try_from(row)
        })
    }
}
