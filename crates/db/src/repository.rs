//! Repository trait and the Postgres implementation
//!
//! All queries are sqlx runtime-checked (not compile-time checked) so the
//! crate builds without a live database.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;

use crate::error::{DbError, DbResult};
use crate::model::KeyMetadata;

/// Durable key-metadata operations.
#[async_trait]
pub trait KeyMetadataRepository: Send + Sync {
    /// Insert a new row; both timestamps are set to now (UTC).
    /// Fails with [`DbError::AlreadyExists`] on a primary-key conflict.
    async fn create(&self, metadata: &KeyMetadata) -> DbResult<()>;

    /// Fetch a single row or [`DbError::KeyNotFound`].
    async fn get(&self, public_key_g1: &str) -> DbResult<KeyMetadata>;

    /// Replace the API-key hash and bump `updated_at`.
    async fn update_api_key_hash(&self, public_key_g1: &str, api_key_hash: &str) -> DbResult<()>;

    /// Set the lock flag and bump `updated_at`.
    async fn update_lock_status(&self, public_key_g1: &str, locked: bool) -> DbResult<()>;

    /// Bump `updated_at` without changing anything else. Internal
    /// bookkeeping only; not exposed over RPC.
    async fn touch(&self, public_key_g1: &str) -> DbResult<()>;

    /// Delete the row or fail with [`DbError::KeyNotFound`].
    async fn delete(&self, public_key_g1: &str) -> DbResult<()>;

    /// All rows, newest first.
    async fn list(&self) -> DbResult<Vec<KeyMetadata>>;
}

/// Postgres-backed repository over a shared connection pool.
pub struct PostgresKeyMetadataRepository {
    pool: PgPool,
}

impl PostgresKeyMetadataRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl KeyMetadataRepository for PostgresKeyMetadataRepository {
    async fn create(&self, metadata: &KeyMetadata) -> DbResult<()> {
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO keys_metadata (
                public_key_g1, public_key_g2, api_key_hash, created_at, updated_at, locked
            ) VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(&metadata.public_key_g1)
        .bind(&metadata.public_key_g2)
        .bind(&metadata.api_key_hash)
        .bind(now)
        .bind(now)
        .bind(metadata.locked)
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                DbError::AlreadyExists(metadata.public_key_g1.clone())
            }
            other => DbError::Database(other),
        })?;

        Ok(())
    }

    async fn get(&self, public_key_g1: &str) -> DbResult<KeyMetadata> {
        sqlx::query_as::<_, KeyMetadata>(
            "SELECT * FROM keys_metadata WHERE public_key_g1 = $1",
        )
        .bind(public_key_g1)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::KeyNotFound(public_key_g1.to_string()))
    }

    async fn update_api_key_hash(&self, public_key_g1: &str, api_key_hash: &str) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE keys_metadata SET api_key_hash = $2, updated_at = $3 WHERE public_key_g1 = $1",
        )
        .bind(public_key_g1)
        .bind(api_key_hash)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::KeyNotFound(public_key_g1.to_string()));
        }
        Ok(())
    }

    async fn update_lock_status(&self, public_key_g1: &str, locked: bool) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE keys_metadata SET locked = $2, updated_at = $3 WHERE public_key_g1 = $1",
        )
        .bind(public_key_g1)
        .bind(locked)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::KeyNotFound(public_key_g1.to_string()));
        }
        Ok(())
    }

    async fn touch(&self, public_key_g1: &str) -> DbResult<()> {
        let result =
            sqlx::query("UPDATE keys_metadata SET updated_at = $2 WHERE public_key_g1 = $1")
                .bind(public_key_g1)
                .bind(Utc::now())
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::KeyNotFound(public_key_g1.to_string()));
        }
        Ok(())
    }

    async fn delete(&self, public_key_g1: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM keys_metadata WHERE public_key_g1 = $1")
            .bind(public_key_g1)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::KeyNotFound(public_key_g1.to_string()));
        }
        Ok(())
    }

    async fn list(&self) -> DbResult<Vec<KeyMetadata>> {
        let rows = sqlx::query_as::<_, KeyMetadata>(
            "SELECT * FROM keys_metadata ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
