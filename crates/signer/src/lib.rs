//! Signing, key-management and admin services for the cerberus signer
//!
//! The crate wires the crypto core, the secret store and the metadata
//! repository into three RPC surfaces:
//!
//! - `signer_*` — the hot signing path behind per-request API-key auth
//! - `keyManager_*` — generate/import/list/metadata, no per-call auth
//! - `admin_*` — key locking and API-key rotation on a separate port
//!
//! Errors stay in one closed domain enum and are translated to JSON-RPC
//! error objects only at the handler boundary.

pub mod api;
pub mod auth;
pub mod common;
pub mod config;
pub mod error;
pub mod key_cache;
pub mod server;
pub mod services;

pub use auth::{AuthInterceptor, BearerLayer, BearerToken};
pub use config::ServerConfig;
pub use error::{SignerError, SignerResult};
pub use key_cache::KeyCache;
pub use server::Server;
pub use services::admin::AdminService;
pub use services::kms::KmsService;
pub use services::signing::SigningService;
