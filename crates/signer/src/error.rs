//! The closed set of service errors and their RPC translation
//!
//! Everything a handler can fail with lives in [`SignerError`]; conversion
//! to a JSON-RPC error object happens once, at the handler boundary. The
//! numeric codes mirror the gRPC status taxonomy the service's clients
//! expect.

use cerberus_db::DbError;
use cerberus_store::StoreError;
use jsonrpsee::types::ErrorObjectOwned;
use thiserror::Error;

/// Result type for service operations
pub type SignerResult<T> = Result<T, SignerError>;

/// Domain errors for the signing, KMS and admin services
#[derive(Debug, Error)]
pub enum SignerError {
    /// Malformed request input
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Missing or invalid credential
    #[error("unauthenticated: {0}")]
    Unauthenticated(String),

    /// Key (or its metadata) does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// Key already exists
    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// The key is administratively locked
    #[error("key is locked: {0}")]
    Locked(String),

    /// The secret-store backend is unreachable
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Cryptographic failure on stored material
    #[error("crypto error: {0}")]
    InternalCrypto(String),

    /// Anything else
    #[error("internal error: {0}")]
    Internal(String),
}

impl SignerError {
    /// Status-code label used on metrics and logs.
    pub fn code(&self) -> &'static str {
        match self {
            SignerError::InvalidArgument(_) => "InvalidArgument",
            SignerError::Unauthenticated(_) => "Unauthenticated",
            SignerError::NotFound(_) => "NotFound",
            SignerError::AlreadyExists(_) => "AlreadyExists",
            SignerError::Locked(_) => "FailedPrecondition",
            SignerError::Unavailable(_) => "Unavailable",
            SignerError::InternalCrypto(_) | SignerError::Internal(_) => "Internal",
        }
    }

    fn rpc_code(&self) -> i32 {
        match self {
            SignerError::InvalidArgument(_) => -32602,
            SignerError::Unauthenticated(_) => -32001,
            SignerError::NotFound(_) => -32004,
            SignerError::AlreadyExists(_) => -32005,
            SignerError::Locked(_) => -32006,
            SignerError::Unavailable(_) => -32007,
            SignerError::InternalCrypto(_) | SignerError::Internal(_) => -32603,
        }
    }
}

impl From<StoreError> for SignerError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::KeyNotFound(key) => SignerError::NotFound(key),
            StoreError::AlreadyExists(key) => SignerError::AlreadyExists(key),
            StoreError::StoreUnavailable(msg) => SignerError::Unavailable(msg),
            // A failed decrypt must read like a wrong password, nothing
            // more; decryption only happens on the signing path, where a
            // bad credential is Unauthenticated.
            StoreError::InvalidPassword => {
                SignerError::Unauthenticated("invalid password".to_string())
            }
            StoreError::Corrupt(msg) => SignerError::InternalCrypto(msg),
            StoreError::UnsupportedBackend(msg) => SignerError::Internal(msg),
            StoreError::Io(e) => SignerError::Internal(e.to_string()),
        }
    }
}

impl From<DbError> for SignerError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::KeyNotFound(key) => SignerError::NotFound(key),
            DbError::AlreadyExists(key) => SignerError::AlreadyExists(key),
            DbError::Database(e) => SignerError::Internal(e.to_string()),
            DbError::Migration(e) => SignerError::Internal(e.to_string()),
        }
    }
}

impl From<SignerError> for ErrorObjectOwned {
    fn from(err: SignerError) -> Self {
        ErrorObjectOwned::owned(err.rpc_code(), err.to_string(), None::<()>)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_labels() {
        assert_eq!(SignerError::InvalidArgument("x".into()).code(), "InvalidArgument");
        assert_eq!(SignerError::Locked("x".into()).code(), "FailedPrecondition");
        assert_eq!(SignerError::Internal("x".into()).code(), "Internal");
    }

    #[test]
    fn test_invalid_password_maps_to_unauthenticated() {
        let err: SignerError = StoreError::InvalidPassword.into();
        assert!(matches!(err, SignerError::Unauthenticated(_)));
        // The checksum detail never leaks.
        assert_eq!(err.to_string(), "unauthenticated: invalid password");
    }

    #[test]
    fn test_db_conflict_maps_to_already_exists() {
        let err: SignerError = DbError::AlreadyExists("a1".into()).into();
        assert!(matches!(err, SignerError::AlreadyExists(_)));
    }
}
