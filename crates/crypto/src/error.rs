//! Cryptographic error types

use thiserror::Error;

/// BN254 cryptographic errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Bn254Error {
    /// Malformed or out-of-range scalar
    #[error("invalid scalar: {0}")]
    InvalidScalar(String),

    /// Bad encoding, off-curve point, or wrong subgroup
    #[error("invalid point: {0}")]
    InvalidPoint(String),
}
