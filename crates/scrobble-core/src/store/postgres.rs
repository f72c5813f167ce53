use async_trait::async_trait;
use chrono::{DateTime, Utc};
use scrobble_models::Identity;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;
use std::time::Duration;
use tracing::info;
use crate::error::StoreError;
use crate::store::CredentialStore;

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS users (
    id VARCHAR(255) NOT NULL,
    username VARCHAR(255) NOT NULL,
    access VARCHAR(255) NOT NULL,
    refresh VARCHAR(255) NOT NULL,
    expires_at TIMESTAMPTZ NOT NULL,
    PRIMARY KEY (id)
)";

const SELECT: &str = "SELECT username, access, refresh, expires_at FROM users WHERE id = $1";

const UPSERT: &str = "INSERT INTO users (id, username, access, refresh, expires_at)
VALUES ($1, $2, $3, $4, $5)
ON CONFLICT (id) DO UPDATE SET
    username = EXCLUDED.username,
    access = EXCLUDED.access,
    refresh = EXCLUDED.refresh,
    expires_at = EXCLUDED.expires_at";

/// Column values of one `users` row
#[derive(Debug, Clone, PartialEq, Eq)]
struct UserRow {
    username: String,
    access: String,
    refresh: String,
    expires_at: DateTime<Utc>,
}

impl UserRow {
    fn from_identity(identity: &Identity) -> Self {
        let identity = identity.clone().normalized();
        Self {
            username: identity.username,
            access: identity.access_token,
            refresh: identity.refresh_token,
            expires_at: identity.token_expires_at,
        }
    }

    fn decode(id: &str, row: &PgRow) -> Result<Self, StoreError> {
        let decode = |e: sqlx::Error| StoreError::Serialization {
            id: id.to_string(),
            message: e.to_string(),
        };
        Ok(Self {
            username: row.try_get("username").map_err(decode)?,
            access: row.try_get("access").map_err(decode)?,
            refresh: row.try_get("refresh").map_err(decode)?,
            expires_at: row.try_get("expires_at").map_err(decode)?,
        })
    }

    fn into_identity(self, id: &str) -> Identity {
        Identity::new(id, &self.username, self.access, self.refresh, self.expires_at)
    }
}

/// `users` table, created on connect. The schema is shared with existing
/// goplaxt databases.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        info!("Connecting to PostgreSQL credential store");

        let pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(10))
            .connect(url)
            .await
            .map_err(|e| StoreError::backend("postgres", e))?;

        sqlx::query(CREATE_TABLE)
            .execute(&pool)
            .await
            .map_err(|e| StoreError::backend("postgres", e))?;

        Ok(Self { pool })
    }
}

#[async_trait]
impl CredentialStore for PostgresStore {
    fn backend_name(&self) -> &'static str {
        "postgres"
    }

    async fn get(&self, id: &str) -> Result<Option<Identity>, StoreError> {
        let row = sqlx::query(SELECT)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::backend("postgres", e))?;

        match row {
            Some(row) => Ok(Some(UserRow::decode(id, &row)?.into_identity(id))),
            None => Ok(None),
        }
    }

    async fn put(&self, identity: &Identity) -> Result<(), StoreError> {
        let row = UserRow::from_identity(identity);
        sqlx::query(UPSERT)
            .bind(&identity.id)
            .bind(&row.username)
            .bind(&row.access)
            .bind(&row.refresh)
            .bind(row.expires_at)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::backend("postgres", e))?;
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::backend("postgres", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::backend("postgres", e))?;
        Ok(())
    }
}
