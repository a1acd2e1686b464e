//! Key-management service: generate, import, list, metadata
//!
//! Key creation is a paired write: the encrypted secret goes into the
//! secret store and the metadata row into the repository. If the metadata
//! insert fails, the stored secret is deleted (best effort) before the
//! error surfaces, so the two stay coherent.

use std::sync::Arc;

use cerberus_crypto::mnemonic::derive_private_key;
use cerberus_crypto::{KeyPair, Mnemonic};
use cerberus_db::{DbError, KeyMetadata, KeyMetadataRepository};
use cerberus_store::SecretStore;
use tracing::{error, info, warn};

use crate::api::{
    GenerateKeyPairRequest, GenerateKeyPairResponse, GetKeyMetadataRequest,
    GetKeyMetadataResponse, ImportKeyRequest, ImportKeyResponse, ListKeysResponse, PublicKey,
};
use crate::common::{generate_api_key, normalize_pub_key};
use crate::error::{SignerError, SignerResult};

/// Key-management service state.
pub struct KmsService {
    store: Arc<dyn SecretStore>,
    repo: Arc<dyn KeyMetadataRepository>,
}

impl KmsService {
    pub fn new(store: Arc<dyn SecretStore>, repo: Arc<dyn KeyMetadataRepository>) -> Self {
        Self { store, repo }
    }

    /// Generate a fresh key pair behind a new mnemonic, persist it, and
    /// mint its API key. The private key, mnemonic and API key are returned
    /// exactly once and never retrievable again.
    pub async fn generate_key_pair(
        &self,
        req: GenerateKeyPairRequest,
    ) -> SignerResult<GenerateKeyPairResponse> {
        let mnemonic = Mnemonic::generate()
            .map_err(|e| SignerError::Internal(format!("mnemonic generation: {e}")))?;
        let private_key = derive_private_key(&mnemonic, None)
            .map_err(|e| SignerError::Internal(format!("key derivation: {e}")))?;
        let private_key_hex = hex::encode(private_key.to_be_bytes());
        let key_pair = KeyPair::new(private_key);

        let response = self
            .persist_new_key(&key_pair, &req.password)
            .await
            .map(|(pub_g1, pub_g2, api_key)| GenerateKeyPairResponse {
                public_key_g1: pub_g1,
                public_key_g2: pub_g2,
                private_key: private_key_hex,
                mnemonic: mnemonic.phrase().to_string(),
                api_key,
            })?;

        info!(pub_key = %response.public_key_g1, "generated new key pair");
        Ok(response)
    }

    /// Import an existing key from a decimal string, a hex string, or a
    /// BIP-39 mnemonic. Fails `AlreadyExists` if the derived public key is
    /// already registered.
    pub async fn import_key(&self, req: ImportKeyRequest) -> SignerResult<ImportKeyResponse> {
        let key_pair = parse_import_key(&req)?;
        let pub_key = key_pair.pub_key_hex();

        match self.repo.get(&pub_key).await {
            Ok(_) => return Err(SignerError::AlreadyExists("key already exists".to_string())),
            Err(DbError::KeyNotFound(_)) => {}
            Err(e) => {
                error!(pub_key = %pub_key, error = %e, "metadata lookup failed");
                return Err(e.into());
            }
        }

        let (pub_g1, pub_g2, api_key) = self.persist_new_key(&key_pair, &req.password).await?;

        info!(pub_key = %pub_g1, "imported key");
        Ok(ImportKeyResponse {
            public_key_g1: pub_g1,
            public_key_g2: pub_g2,
            api_key,
        })
    }

    /// List {pubG1, pubG2} for every registered key. The metadata
    /// repository is authoritative, not the secret store.
    pub async fn list_keys(&self) -> SignerResult<ListKeysResponse> {
        let rows = self.repo.list().await?;
        Ok(ListKeysResponse {
            public_keys: rows
                .into_iter()
                .map(|row| PublicKey {
                    public_key_g1: row.public_key_g1,
                    public_key_g2: row.public_key_g2,
                })
                .collect(),
        })
    }

    /// Public keys and timestamps for one registered key.
    pub async fn get_key_metadata(
        &self,
        req: GetKeyMetadataRequest,
    ) -> SignerResult<GetKeyMetadataResponse> {
        let pub_key = normalize_pub_key(&req.public_key_g1);
        let row = self.repo.get(&pub_key).await?;

        Ok(GetKeyMetadataResponse {
            public_key_g1: row.public_key_g1,
            public_key_g2: row.public_key_g2,
            created_at: row.created_at.timestamp(),
            updated_at: row.updated_at.timestamp(),
        })
    }

    /// Store the encrypted key and its metadata row as a pair; on a failed
    /// metadata insert the stored secret is rolled back best-effort.
    async fn persist_new_key(
        &self,
        key_pair: &KeyPair,
        password: &str,
    ) -> SignerResult<(String, String, String)> {
        let pub_g2 = key_pair.public_key_g2().to_hex();
        let pub_g1 = self.store.store_key(key_pair, password).await?;

        let (api_key, api_key_hash) = generate_api_key();

        if let Err(e) = self
            .repo
            .create(&KeyMetadata::new(&pub_g1, &pub_g2, &api_key_hash))
            .await
        {
            error!(pub_key = %pub_g1, error = %e, "failed to save key metadata, rolling back stored secret");
            if let Err(rollback) = self.store.delete_key(&pub_g1).await {
                warn!(pub_key = %pub_g1, error = %rollback, "rollback of stored secret failed");
            }
            return Err(e.into());
        }

        Ok((pub_g1, pub_g2, api_key))
    }
}

/// Decode the import input: mnemonic wins if present, otherwise the private
/// key is tried as decimal first and hex second, matching what clients have
/// historically sent.
fn parse_import_key(req: &ImportKeyRequest) -> SignerResult<KeyPair> {
    if let Some(phrase) = req.mnemonic.as_deref().filter(|p| !p.is_empty()) {
        let mnemonic = Mnemonic::from_phrase(phrase)
            .map_err(|e| SignerError::InvalidArgument(e.to_string()))?;
        let private_key = derive_private_key(&mnemonic, None)
            .map_err(|e| SignerError::InvalidArgument(e.to_string()))?;
        return Ok(KeyPair::new(private_key));
    }

    let pk = req
        .private_key
        .as_deref()
        .filter(|p| !p.is_empty())
        .ok_or_else(|| {
            SignerError::InvalidArgument("either privateKey or mnemonic is required".to_string())
        })?;

    KeyPair::from_decimal_str(pk)
        .or_else(|_| KeyPair::from_hex_str(pk))
        .map_err(|e| SignerError::InvalidArgument(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_import_key_forms() {
        let hex_req = ImportKeyRequest {
            private_key: Some(
                "0x040ad69253b921aca71dd714cccc3095576fbe1a21f86c9b10cb5b119b1c6899".into(),
            ),
            mnemonic: None,
            password: "pw".into(),
        };
        let decimal_req = ImportKeyRequest {
            private_key: Some(
                "1828400783668354888414048188282769214701810628628956872636287381381672888473"
                    .into(),
            ),
            mnemonic: None,
            password: "pw".into(),
        };

        let from_hex = parse_import_key(&hex_req).unwrap();
        let from_decimal = parse_import_key(&decimal_req).unwrap();
        assert_eq!(from_hex.pub_key_hex(), from_decimal.pub_key_hex());
    }

    #[test]
    fn test_parse_import_key_requires_input() {
        let req = ImportKeyRequest {
            private_key: None,
            mnemonic: None,
            password: "pw".into(),
        };
        assert!(matches!(
            parse_import_key(&req),
            Err(SignerError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_parse_import_key_bad_mnemonic() {
        let req = ImportKeyRequest {
            private_key: None,
            mnemonic: Some("not a valid phrase".into()),
            password: "pw".into(),
        };
        assert!(matches!(
            parse_import_key(&req),
            Err(SignerError::InvalidArgument(_))
        ));
    }
}
