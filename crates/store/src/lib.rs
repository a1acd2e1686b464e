//! Pluggable secret-store backends for the cerberus signer
//!
//! A [`SecretStore`] persists encrypted private keys addressed by their
//! compressed G1 public key hex. Three backends are provided:
//!
//! - **filesystem**: EIP-2335 keystore files in a dedicated directory
//! - **aws-secrets-manager**: one secret per key under the `cerberus/` prefix
//! - **google-secrets-manager**: one secret per key with a `project=cerberus`
//!   label
//!
//! Backends share a namespace prefix so a store can host other tenants, and
//! they never return a partial or unvalidated key pair: every retrieval
//! re-derives the public key and checks it against the requested identifier.

pub mod aws;
pub mod error;
pub mod filesystem;
pub mod gcp;

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use cerberus_crypto::KeyPair;

pub use aws::AwsSecretManagerStore;
pub use error::{StoreError, StoreResult};
pub use filesystem::FileStore;
pub use gcp::GoogleSecretManagerStore;

/// Capability set shared by every secret-store backend.
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Fetch the encrypted material for `pub_key`, decrypt it with
    /// `password`, and return the live key pair.
    async fn retrieve_key(&self, pub_key: &str, password: &str) -> StoreResult<KeyPair>;

    /// Encrypt and persist a key pair; returns the derived public-key hex
    /// under which it was stored.
    async fn store_key(&self, key_pair: &KeyPair, password: &str) -> StoreResult<String>;

    /// Enumerate the public keys owned by this deployment's namespace.
    async fn list_keys(&self) -> StoreResult<Vec<String>>;

    /// Remove the stored material for `pub_key`. Used by the paired-create
    /// rollback when the metadata insert fails.
    async fn delete_key(&self, pub_key: &str) -> StoreResult<()>;
}

/// Which backend a deployment persists its keys in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageKind {
    /// EIP-2335 keystore files on local disk
    #[default]
    Filesystem,
    /// AWS Secrets Manager
    AwsSecretsManager,
    /// Google Secret Manager
    GoogleSecretsManager,
}

impl StorageKind {
    pub fn variants() -> &'static [&'static str] {
        &[
            "filesystem",
            "aws-secrets-manager",
            "google-secrets-manager",
        ]
    }
}

impl fmt::Display for StorageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageKind::Filesystem => write!(f, "filesystem"),
            StorageKind::AwsSecretsManager => write!(f, "aws-secrets-manager"),
            StorageKind::GoogleSecretsManager => write!(f, "google-secrets-manager"),
        }
    }
}

impl FromStr for StorageKind {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "filesystem" => Ok(StorageKind::Filesystem),
            "aws-secrets-manager" => Ok(StorageKind::AwsSecretsManager),
            "google-secrets-manager" => Ok(StorageKind::GoogleSecretsManager),
            other => Err(StoreError::UnsupportedBackend(other.to_string())),
        }
    }
}

/// Validate a retrieved secret against the identifier it was requested
/// under. Backends call this before handing out a key pair.
pub(crate) fn check_identity(key_pair: &KeyPair, requested: &str) -> StoreResult<()> {
    let derived = key_pair.pub_key_hex();
    if derived != requested {
        return Err(StoreError::Corrupt(format!(
            "stored secret derives public key {derived}, expected {requested}"
        )));
    }
    Ok(())
}
