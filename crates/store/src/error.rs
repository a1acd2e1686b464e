//! Secret-store error types
//!
//! Backend-specific failures are mapped into this closed set at the adapter
//! edge; nothing AWS- or GCP-specific crosses the [`crate::SecretStore`]
//! interface.

use thiserror::Error;

/// Result type for secret-store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors surfaced by secret-store backends
#[derive(Debug, Error)]
pub enum StoreError {
    /// No stored secret for the requested public key
    #[error("key not found: {0}")]
    KeyNotFound(String),

    /// A secret already exists under this public key
    #[error("key already exists: {0}")]
    AlreadyExists(String),

    /// Transient backend failure (network, throttling, service outage)
    #[error("secret store unavailable: {0}")]
    StoreUnavailable(String),

    /// The password did not decrypt the stored material
    #[error("invalid password")]
    InvalidPassword,

    /// The stored material does not decode to a valid key for the
    /// requested identifier
    #[error("corrupt stored secret: {0}")]
    Corrupt(String),

    /// Unknown storage backend name in configuration
    #[error("unsupported storage type: {0}")]
    UnsupportedBackend(String),

    /// Local filesystem failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
