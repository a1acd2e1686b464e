//! Admin service: API-key rotation, key locking, full listing
//!
//! Served on its own port so deployments can firewall it independently of
//! the signer and key-manager surface.

use std::sync::Arc;

use cerberus_db::KeyMetadataRepository;
use tracing::info;

use crate::api::{
    GenerateNewApiKeyRequest, GenerateNewApiKeyResponse, KeyMetadataEntry, ListAllKeysResponse,
    LockKeyRequest, LockKeyResponse, UnlockKeyRequest, UnlockKeyResponse,
};
use crate::common::{generate_api_key, normalize_pub_key};
use crate::error::SignerResult;

/// Admin service state.
pub struct AdminService {
    repo: Arc<dyn KeyMetadataRepository>,
}

impl AdminService {
    pub fn new(repo: Arc<dyn KeyMetadataRepository>) -> Self {
        Self { repo }
    }

    /// Mint a replacement API key. The previous key is invalid the moment
    /// the hash is swapped; the lock flag is untouched.
    pub async fn generate_new_api_key(
        &self,
        req: GenerateNewApiKeyRequest,
    ) -> SignerResult<GenerateNewApiKeyResponse> {
        let pub_key = normalize_pub_key(&req.public_key_g1);
        let metadata = self.repo.get(&pub_key).await?;

        let (api_key, api_key_hash) = generate_api_key();
        self.repo
            .update_api_key_hash(&metadata.public_key_g1, &api_key_hash)
            .await?;

        info!(pub_key = %metadata.public_key_g1, "rotated API key");
        Ok(GenerateNewApiKeyResponse {
            public_key_g1: metadata.public_key_g1,
            api_key,
        })
    }

    /// Lock a key: all signing attempts fail `FailedPrecondition` until it
    /// is unlocked.
    pub async fn lock_key(&self, req: LockKeyRequest) -> SignerResult<LockKeyResponse> {
        let pub_key = normalize_pub_key(&req.public_key_g1);
        self.repo.update_lock_status(&pub_key, true).await?;

        info!(pub_key = %pub_key, "locked key");
        Ok(LockKeyResponse {})
    }

    /// Clear the lock flag.
    pub async fn unlock_key(&self, req: UnlockKeyRequest) -> SignerResult<UnlockKeyResponse> {
        let pub_key = normalize_pub_key(&req.public_key_g1);
        self.repo.update_lock_status(&pub_key, false).await?;

        info!(pub_key = %pub_key, "unlocked key");
        Ok(UnlockKeyResponse {})
    }

    /// Full metadata for every key, newest first.
    pub async fn list_all_keys(&self) -> SignerResult<ListAllKeysResponse> {
        let rows = self.repo.list().await?;

        Ok(ListAllKeysResponse {
            keys: rows
                .into_iter()
                .map(|row| KeyMetadataEntry {
                    public_key_g1: row.public_key_g1,
                    public_key_g2: row.public_key_g2,
                    created_at: row.created_at.to_rfc3339(),
                    updated_at: row.updated_at.to_rfc3339(),
                    locked: row.locked,
                })
                .collect(),
        })
    }
}
