//! Key-metadata row model

use chrono::{DateTime, Utc};

/// One row of the `keys_metadata` table, keyed by the compressed G1 public
/// key hex.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct KeyMetadata {
    pub public_key_g1: String,
    pub public_key_g2: String,
    /// SHA-256 hex of the issued API key; the key itself is never stored.
    pub api_key_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub locked: bool,
}

impl KeyMetadata {
    /// A fresh, unlocked row. Timestamps are set by the repository on
    /// insert.
    pub fn new(public_key_g1: &str, public_key_g2: &str, api_key_hash: &str) -> Self {
        let now = Utc::now();
        Self {
            public_key_g1: public_key_g1.to_string(),
            public_key_g2: public_key_g2.to_string(),
            api_key_hash: api_key_hash.to_string(),
            created_at: now,
            updated_at: now,
            locked: false,
        }
    }
}
