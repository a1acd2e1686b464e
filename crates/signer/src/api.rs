//! RPC request/response types and module registration
//!
//! Three namespaces mirror the service split: `signer_*` (auth required),
//! `keyManager_*`, and `admin_*` on its own listener. Byte fields travel as
//! hex strings. Every method records a per-method request counter and
//! duration metric labeled with the final status code.

use cerberus_metrics::MethodRecorder;
use jsonrpsee::types::ErrorObjectOwned;
use jsonrpsee::RpcModule;
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::error::{SignerError, SignerResult};
use crate::services::admin::AdminService;
use crate::services::kms::KmsService;
use crate::services::signing::SigningService;

// ---- Signer ----

#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignGenericRequest {
    /// Compressed G1 public key hex, optional `0x` prefix
    pub public_key_g1: String,
    /// Payload to sign, hex, at most 32 bytes decoded
    pub data: String,
    /// Keystore password for the first (cache-filling) request
    pub password: String,
}

impl std::fmt::Debug for SignGenericRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignGenericRequest")
            .field("public_key_g1", &self.public_key_g1)
            .field("data", &self.data)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignGenericResponse {
    /// 64-byte G1 signature, hex
    pub signature: String,
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignG1Request {
    pub public_key_g1: String,
    /// Serialized G1 point (64 bytes), hex
    pub data: String,
    pub password: String,
}

impl std::fmt::Debug for SignG1Request {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignG1Request")
            .field("public_key_g1", &self.public_key_g1)
            .field("data", &self.data)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignG1Response {
    pub signature: String,
}

// ---- KeyManager ----

#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateKeyPairRequest {
    pub password: String,
}

impl std::fmt::Debug for GenerateKeyPairRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerateKeyPairRequest")
            .field("password", &"[REDACTED]")
            .finish()
    }
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateKeyPairResponse {
    pub public_key_g1: String,
    pub public_key_g2: String,
    /// Returned exactly once; never retrievable again
    pub private_key: String,
    /// BIP-39 backup phrase for the generated key
    pub mnemonic: String,
    /// Bearer credential for the signer surface; only its hash is stored
    pub api_key: String,
}

impl std::fmt::Debug for GenerateKeyPairResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerateKeyPairResponse")
            .field("public_key_g1", &self.public_key_g1)
            .field("public_key_g2", &self.public_key_g2)
            .field("private_key", &"[REDACTED]")
            .field("mnemonic", &"[REDACTED]")
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportKeyRequest {
    /// Decimal or hex (optional `0x`) scalar
    #[serde(default)]
    pub private_key: Option<String>,
    /// BIP-39 phrase; takes precedence over `privateKey` when present
    #[serde(default)]
    pub mnemonic: Option<String>,
    pub password: String,
}

impl std::fmt::Debug for ImportKeyRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImportKeyRequest")
            .field("private_key", &"[REDACTED]")
            .field("mnemonic", &"[REDACTED]")
            .field("password", &"[REDACTED]")
            .finish()
    }
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportKeyResponse {
    pub public_key_g1: String,
    pub public_key_g2: String,
    pub api_key: String,
}

impl std::fmt::Debug for ImportKeyResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImportKeyResponse")
            .field("public_key_g1", &self.public_key_g1)
            .field("public_key_g2", &self.public_key_g2)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicKey {
    pub public_key_g1: String,
    pub public_key_g2: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListKeysResponse {
    pub public_keys: Vec<PublicKey>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetKeyMetadataRequest {
    pub public_key_g1: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetKeyMetadataResponse {
    pub public_key_g1: String,
    pub public_key_g2: String,
    /// Unix seconds
    pub created_at: i64,
    pub updated_at: i64,
}

// ---- Admin ----

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateNewApiKeyRequest {
    pub public_key_g1: String,
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateNewApiKeyResponse {
    pub public_key_g1: String,
    pub api_key: String,
}

impl std::fmt::Debug for GenerateNewApiKeyResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerateNewApiKeyResponse")
            .field("public_key_g1", &self.public_key_g1)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LockKeyRequest {
    pub public_key_g1: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockKeyResponse {}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnlockKeyRequest {
    pub public_key_g1: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnlockKeyResponse {}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyMetadataEntry {
    pub public_key_g1: String,
    pub public_key_g2: String,
    /// RFC 3339 timestamps
    pub created_at: String,
    pub updated_at: String,
    pub locked: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListAllKeysResponse {
    pub keys: Vec<KeyMetadataEntry>,
}

// ---- Module registration ----

/// Context behind the signer + key-manager listener.
pub struct RpcContext {
    pub signing: SigningService,
    pub kms: KmsService,
}

/// Build the RPC module for the main listener (signer + key manager).
pub fn rpc_module(ctx: RpcContext) -> RpcModule<RpcContext> {
    let mut module = RpcModule::new(ctx);

    module
        .register_async_method("signer_signGeneric", |params, ctx, ext| async move {
            let recorder = MethodRecorder::new("signer_signGeneric");
            let result = match parse_params(params) {
                Ok(req) => ctx.signing.sign_generic(&ext, req).await,
                Err(e) => Err(e),
            };
            finish("signer_signGeneric", recorder, result)
        })
        .expect("unique method name");

    module
        .register_async_method("signer_signG1", |params, ctx, ext| async move {
            let recorder = MethodRecorder::new("signer_signG1");
            let result = match parse_params(params) {
                Ok(req) => ctx.signing.sign_g1(&ext, req).await,
                Err(e) => Err(e),
            };
            finish("signer_signG1", recorder, result)
        })
        .expect("unique method name");

    module
        .register_async_method("keyManager_generateKeyPair", |params, ctx, _| async move {
            let recorder = MethodRecorder::new("keyManager_generateKeyPair");
            let result = match parse_params(params) {
                Ok(req) => ctx.kms.generate_key_pair(req).await,
                Err(e) => Err(e),
            };
            finish("keyManager_generateKeyPair", recorder, result)
        })
        .expect("unique method name");

    module
        .register_async_method("keyManager_importKey", |params, ctx, _| async move {
            let recorder = MethodRecorder::new("keyManager_importKey");
            let result = match parse_params(params) {
                Ok(req) => ctx.kms.import_key(req).await,
                Err(e) => Err(e),
            };
            finish("keyManager_importKey", recorder, result)
        })
        .expect("unique method name");

    module
        .register_async_method("keyManager_listKeys", |_, ctx, _| async move {
            let recorder = MethodRecorder::new("keyManager_listKeys");
            let result = ctx.kms.list_keys().await;
            finish("keyManager_listKeys", recorder, result)
        })
        .expect("unique method name");

    module
        .register_async_method("keyManager_getKeyMetadata", |params, ctx, _| async move {
            let recorder = MethodRecorder::new("keyManager_getKeyMetadata");
            let result = match parse_params(params) {
                Ok(req) => ctx.kms.get_key_metadata(req).await,
                Err(e) => Err(e),
            };
            finish("keyManager_getKeyMetadata", recorder, result)
        })
        .expect("unique method name");

    module
}

/// Build the RPC module for the admin listener.
pub fn admin_rpc_module(admin: AdminService) -> RpcModule<AdminService> {
    let mut module = RpcModule::new(admin);

    module
        .register_async_method("admin_generateNewApiKey", |params, ctx, _| async move {
            let recorder = MethodRecorder::new("admin_generateNewApiKey");
            let result = match parse_params(params) {
                Ok(req) => ctx.generate_new_api_key(req).await,
                Err(e) => Err(e),
            };
            finish("admin_generateNewApiKey", recorder, result)
        })
        .expect("unique method name");

    module
        .register_async_method("admin_lockKey", |params, ctx, _| async move {
            let recorder = MethodRecorder::new("admin_lockKey");
            let result = match parse_params(params) {
                Ok(req) => ctx.lock_key(req).await,
                Err(e) => Err(e),
            };
            finish("admin_lockKey", recorder, result)
        })
        .expect("unique method name");

    module
        .register_async_method("admin_unlockKey", |params, ctx, _| async move {
            let recorder = MethodRecorder::new("admin_unlockKey");
            let result = match parse_params(params) {
                Ok(req) => ctx.unlock_key(req).await,
                Err(e) => Err(e),
            };
            finish("admin_unlockKey", recorder, result)
        })
        .expect("unique method name");

    module
        .register_async_method("admin_listAllKeys", |_, ctx, _| async move {
            let recorder = MethodRecorder::new("admin_listAllKeys");
            let result = ctx.list_all_keys().await;
            finish("admin_listAllKeys", recorder, result)
        })
        .expect("unique method name");

    module
}

fn parse_params<T: serde::de::DeserializeOwned>(
    params: jsonrpsee::types::Params<'static>,
) -> SignerResult<T> {
    params
        .parse()
        .map_err(|e| SignerError::InvalidArgument(e.to_string()))
}

/// Record metrics, log failures (never payloads), and translate the domain
/// error at the boundary.
fn finish<T>(
    method: &'static str,
    recorder: MethodRecorder,
    result: SignerResult<T>,
) -> Result<T, ErrorObjectOwned> {
    match result {
        Ok(value) => {
            recorder.record("OK");
            Ok(value)
        }
        Err(e) => {
            error!(method = %method, code = e.code(), error = %e, "request failed");
            recorder.record(e.code());
            Err(e.into())
        }
    }
}
