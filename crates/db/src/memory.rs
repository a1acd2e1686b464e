//! In-memory implementation of the key-metadata repository
//!
//! Used by service-level tests and local development; not for production.
//! Semantics mirror the Postgres implementation, including timestamp
//! bumping and the not-found behavior of mutations.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;

use crate::error::{DbError, DbResult};
use crate::model::KeyMetadata;
use crate::repository::KeyMetadataRepository;

/// Thread-safe in-memory repository.
#[derive(Default)]
pub struct InMemoryKeyMetadataRepository {
    rows: RwLock<HashMap<String, KeyMetadata>>,
}

impl InMemoryKeyMetadataRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyMetadataRepository for InMemoryKeyMetadataRepository {
    async fn create(&self, metadata: &KeyMetadata) -> DbResult<()> {
        let mut rows = self.rows.write();
        if rows.contains_key(&metadata.public_key_g1) {
            return Err(DbError::AlreadyExists(metadata.public_key_g1.clone()));
        }

        let now = Utc::now();
        let mut row = metadata.clone();
        row.created_at = now;
        row.updated_at = now;
        rows.insert(row.public_key_g1.clone(), row);
        Ok(())
    }

    async fn get(&self, public_key_g1: &str) -> DbResult<KeyMetadata> {
        self.rows
            .read()
            .get(public_key_g1)
            .cloned()
            .ok_or_else(|| DbError::KeyNotFound(public_key_g1.to_string()))
    }

    async fn update_api_key_hash(&self, public_key_g1: &str, api_key_hash: &str) -> DbResult<()> {
        let mut rows = self.rows.write();
        let row = rows
            .get_mut(public_key_g1)
            .ok_or_else(|| DbError::KeyNotFound(public_key_g1.to_string()))?;
        row.api_key_hash = api_key_hash.to_string();
        row.updated_at = Utc::now();
        Ok(())
    }

    async fn update_lock_status(&self, public_key_g1: &str, locked: bool) -> DbResult<()> {
        let mut rows = self.rows.write();
        let row = rows
            .get_mut(public_key_g1)
            .ok_or_else(|| DbError::KeyNotFound(public_key_g1.to_string()))?;
        row.locked = locked;
        row.updated_at = Utc::now();
        Ok(())
    }

    async fn touch(&self, public_key_g1: &str) -> DbResult<()> {
        let mut rows = self.rows.write();
        let row = rows
            .get_mut(public_key_g1)
            .ok_or_else(|| DbError::KeyNotFound(public_key_g1.to_string()))?;
        row.updated_at = Utc::now();
        Ok(())
    }

    async fn delete(&self, public_key_g1: &str) -> DbResult<()> {
        self.rows
            .write()
            .remove(public_key_g1)
            .map(|_| ())
            .ok_or_else(|| DbError::KeyNotFound(public_key_g1.to_string()))
    }

    async fn list(&self) -> DbResult<Vec<KeyMetadata>> {
        let mut rows: Vec<KeyMetadata> = self.rows.read().values().cloned().collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }
}
