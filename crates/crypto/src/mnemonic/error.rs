//! Error types for mnemonic operations

use thiserror::Error;

/// Result type for mnemonic operations
pub type MnemonicResult<T> = Result<T, MnemonicError>;

/// Errors that can occur during mnemonic operations
#[derive(Debug, Error)]
pub enum MnemonicError {
    /// Invalid mnemonic phrase (wrong word count, invalid words, bad checksum)
    #[error("invalid mnemonic phrase: {0}")]
    InvalidPhrase(String),

    /// Invalid derivation path
    #[error("invalid derivation path: {0}")]
    InvalidPath(String),

    /// Derived bytes did not produce a usable scalar
    #[error("key derivation failed: {0}")]
    DerivationFailed(String),
}

impl From<bip39::Error> for MnemonicError {
    fn from(err: bip39::Error) -> Self {
        MnemonicError::InvalidPhrase(err.to_string())
    }
}
