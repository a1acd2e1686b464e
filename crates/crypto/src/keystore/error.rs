//! Keystore error types

use thiserror::Error;

/// Errors that can occur during keystore operations
#[derive(Error, Debug)]
pub enum KeystoreError {
    /// Checksum verification failed: wrong passphrase or corrupted keystore.
    /// The two cases are intentionally indistinguishable.
    #[error("invalid password: checksum verification failed")]
    ChecksumMismatch,

    /// Unsupported KDF function name in the keystore JSON
    #[error("unsupported KDF function: {0}")]
    UnsupportedKdf(String),

    /// Unsupported cipher function name in the keystore JSON
    #[error("unsupported cipher function: {0}")]
    UnsupportedCipher(String),

    /// Unsupported checksum function name in the keystore JSON
    #[error("unsupported checksum function: {0}")]
    UnsupportedChecksum(String),

    /// Invalid KDF parameters
    #[error("invalid KDF parameters: {0}")]
    InvalidKdfParams(String),

    /// Invalid cipher parameters
    #[error("invalid cipher parameters: {0}")]
    InvalidCipherParams(String),

    /// Key derivation failed
    #[error("key derivation failed: {0}")]
    KdfError(String),

    /// Encryption/decryption failed
    #[error("cipher operation failed: {0}")]
    CipherError(String),

    /// File I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Malformed keystore JSON
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Secret or passphrase missing from the builder
    #[error("incomplete keystore: {0}")]
    MissingField(&'static str),

    /// Invalid hex encoding inside the keystore JSON
    #[error("invalid hex encoding: {0}")]
    HexError(String),
}

/// Result type for keystore operations
pub type KeystoreResult<T> = Result<T, KeystoreError>;
