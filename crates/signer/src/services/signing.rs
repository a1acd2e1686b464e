//! The hot signing path: SignGeneric and SignG1
//!
//! Both operations resolve the live key pair through the decrypt-on-first-
//! use cache; on a miss the encrypted material is fetched from the secret
//! store with the caller-supplied password, single-flight per key.

use std::sync::Arc;

use cerberus_crypto::G1Point;
use cerberus_store::SecretStore;
use jsonrpsee::Extensions;
use tracing::info;

use crate::api::{SignG1Request, SignG1Response, SignGenericRequest, SignGenericResponse};
use crate::auth::AuthInterceptor;
use crate::common::normalize_pub_key;
use crate::error::{SignerError, SignerResult};
use crate::key_cache::KeyCache;

/// Signing service state shared by all in-flight requests.
pub struct SigningService {
    store: Arc<dyn SecretStore>,
    auth: AuthInterceptor,
    key_cache: KeyCache,
    /// When false, credential checks are skipped; for deployments that gate
    /// the signer surface at the network layer instead.
    auth_required: bool,
}

impl SigningService {
    pub fn new(store: Arc<dyn SecretStore>, auth: AuthInterceptor, auth_required: bool) -> Self {
        Self {
            store,
            auth,
            key_cache: KeyCache::new(),
            auth_required,
        }
    }

    /// Sign an arbitrary payload of at most 32 bytes.
    ///
    /// Shorter payloads are right-padded with zero bytes to a full 32-byte
    /// block before hash-to-curve; callers that care should pre-hash. The
    /// padding is observable: `sign(b"x")` equals `sign(b"x\0\0...")`.
    pub async fn sign_generic(
        &self,
        ext: &Extensions,
        req: SignGenericRequest,
    ) -> SignerResult<SignGenericResponse> {
        let pub_key = normalize_pub_key(&req.public_key_g1);
        if self.auth_required {
            self.auth.authorize(ext, &pub_key).await?;
        }

        let data = decode_data_hex(&req.data)?;
        if data.len() > 32 {
            return Err(SignerError::InvalidArgument(
                "data is too long, must be at most 32 bytes".to_string(),
            ));
        }

        let key_pair = self.key_pair(&pub_key, &req.password).await?;

        let mut block = [0u8; 32];
        block[..data.len()].copy_from_slice(&data);
        let signature = key_pair.sign_message(&block);

        info!(pub_key = %pub_key, "signed message");
        Ok(SignGenericResponse {
            signature: hex::encode(signature.serialize()),
        })
    }

    /// Sign a caller-provided serialized G1 point.
    ///
    /// The payload is parsed without curve validation and multiplied as-is,
    /// so any 64-byte encoding produces a deterministic signature; callers
    /// that hash-to-curve themselves get sk · P.
    pub async fn sign_g1(
        &self,
        ext: &Extensions,
        req: SignG1Request,
    ) -> SignerResult<SignG1Response> {
        let pub_key = normalize_pub_key(&req.public_key_g1);
        if self.auth_required {
            self.auth.authorize(ext, &pub_key).await?;
        }

        let data = decode_data_hex(&req.data)?;
        if data.is_empty() {
            return Err(SignerError::InvalidArgument(
                "data must not be empty".to_string(),
            ));
        }
        let point = G1Point::deserialize_unchecked(&data)
            .map_err(|e| SignerError::InvalidArgument(e.to_string()))?;

        let key_pair = self.key_pair(&pub_key, &req.password).await?;
        let signature = key_pair.sign_hashed_point(&point);

        info!(pub_key = %pub_key, "signed G1 point");
        Ok(SignG1Response {
            signature: hex::encode(signature.serialize()),
        })
    }

    /// Resolve the live key pair: cache hit, or single-flight retrieve.
    async fn key_pair(
        &self,
        pub_key: &str,
        password: &str,
    ) -> SignerResult<Arc<cerberus_crypto::KeyPair>> {
        if let Some(key_pair) = self.key_cache.get(pub_key) {
            return Ok(key_pair);
        }

        info!(pub_key = %pub_key, "in-memory cache miss, retrieving key");
        self.key_cache
            .get_or_retrieve(pub_key, || self.store.retrieve_key(pub_key, password))
            .await
    }
}

fn decode_data_hex(data: &str) -> SignerResult<Vec<u8>> {
    hex::decode(data).map_err(|e| SignerError::InvalidArgument(format!("invalid data hex: {e}")))
}
