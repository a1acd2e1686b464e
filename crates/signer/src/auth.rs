//! Per-request API-key authentication for the signer surface
//!
//! A tower HTTP layer lifts the `authorization` header into request
//! extensions, where the RPC handlers can reach it. [`AuthInterceptor`]
//! then validates the credential against the key's metadata row before any
//! signer method body runs: absent row and bad token both fail
//! `Unauthenticated`, a locked key fails `FailedPrecondition`.
//!
//! The token comparison is constant-time across matching-length inputs so
//! response timing does not leak the stored hash.

use std::sync::Arc;
use std::task::{Context, Poll};

use cerberus_crypto::constant_time_eq;
use cerberus_db::{DbError, KeyMetadataRepository};
use jsonrpsee::Extensions;
use tower::{Layer, Service};
use tracing::warn;

use crate::common::sha256_hex;
use crate::error::{SignerError, SignerResult};

/// Bearer credential extracted from the `authorization` header.
#[derive(Debug, Clone)]
pub struct BearerToken(pub String);

/// Tower layer that copies the `authorization` header value into the
/// request extensions as a [`BearerToken`]. An optional `Bearer ` prefix is
/// stripped.
#[derive(Debug, Clone, Copy, Default)]
pub struct BearerLayer;

impl<S> Layer<S> for BearerLayer {
    type Service = BearerService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        BearerService { inner }
    }
}

/// Service produced by [`BearerLayer`].
#[derive(Debug, Clone)]
pub struct BearerService<S> {
    inner: S,
}

impl<S, B> Service<http::Request<B>> for BearerService<S>
where
    S: Service<http::Request<B>>,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: http::Request<B>) -> Self::Future {
        let token = req
            .headers()
            .get(http::header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .map(|raw| raw.strip_prefix("Bearer ").unwrap_or(raw).to_string());
        if let Some(token) = token {
            req.extensions_mut().insert(BearerToken(token));
        }
        self.inner.call(req)
    }
}

/// Validates signer-surface credentials against the metadata repository.
pub struct AuthInterceptor {
    repo: Arc<dyn KeyMetadataRepository>,
}

impl AuthInterceptor {
    pub fn new(repo: Arc<dyn KeyMetadataRepository>) -> Self {
        Self { repo }
    }

    /// Authorize one signing request for the (already normalized) public
    /// key. Returns only when the caller holds the current API key for an
    /// unlocked key.
    pub async fn authorize(&self, ext: &Extensions, pub_key_g1: &str) -> SignerResult<()> {
        let token = ext
            .get::<BearerToken>()
            .ok_or_else(|| SignerError::Unauthenticated("missing authorization header".into()))?;

        let metadata = match self.repo.get(pub_key_g1).await {
            Ok(metadata) => metadata,
            Err(DbError::KeyNotFound(_)) => {
                return Err(SignerError::Unauthenticated("invalid token".into()));
            }
            Err(e) => {
                warn!(pub_key = %pub_key_g1, error = %e, "metadata lookup failed during auth");
                return Err(SignerError::Internal(e.to_string()));
            }
        };

        let presented_hash = sha256_hex(&token.0);
        if !constant_time_eq(presented_hash.as_bytes(), metadata.api_key_hash.as_bytes()) {
            return Err(SignerError::Unauthenticated("invalid token".into()));
        }

        if metadata.locked {
            return Err(SignerError::Locked(pub_key_g1.to_string()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cerberus_db::{InMemoryKeyMetadataRepository, KeyMetadata};

    async fn interceptor_with_key(api_key: &str, locked: bool) -> AuthInterceptor {
        let repo = Arc::new(InMemoryKeyMetadataRepository::new());
        repo.create(&KeyMetadata::new("a1b2", "g2pub", &sha256_hex(api_key)))
            .await
            .unwrap();
        if locked {
            repo.update_lock_status("a1b2", true).await.unwrap();
        }
        AuthInterceptor::new(repo)
    }

    fn ext_with_token(token: &str) -> Extensions {
        let mut ext = Extensions::new();
        ext.insert(BearerToken(token.to_string()));
        ext
    }

    #[tokio::test]
    async fn test_valid_token_authorized() {
        let auth = interceptor_with_key("api-key-1", false).await;
        let ext = ext_with_token("api-key-1");
        assert!(auth.authorize(&ext, "a1b2").await.is_ok());
    }

    #[tokio::test]
    async fn test_missing_header_unauthenticated() {
        let auth = interceptor_with_key("api-key-1", false).await;
        let result = auth.authorize(&Extensions::new(), "a1b2").await;
        assert!(matches!(result, Err(SignerError::Unauthenticated(_))));
    }

    #[tokio::test]
    async fn test_wrong_token_unauthenticated() {
        let auth = interceptor_with_key("api-key-1", false).await;
        let ext = ext_with_token("some-other-key");
        let result = auth.authorize(&ext, "a1b2").await;
        assert!(matches!(result, Err(SignerError::Unauthenticated(_))));
    }

    #[tokio::test]
    async fn test_unknown_key_unauthenticated() {
        let auth = interceptor_with_key("api-key-1", false).await;
        let ext = ext_with_token("api-key-1");
        let result = auth.authorize(&ext, "ffff").await;
        assert!(matches!(result, Err(SignerError::Unauthenticated(_))));
    }

    #[tokio::test]
    async fn test_locked_key_failed_precondition() {
        let auth = interceptor_with_key("api-key-1", true).await;
        let ext = ext_with_token("api-key-1");
        let result = auth.authorize(&ext, "a1b2").await;
        assert!(matches!(result, Err(SignerError::Locked(_))));
    }
}
