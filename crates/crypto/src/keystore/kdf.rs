//! scrypt key derivation following the EIP-2335 parameter set

use serde::{Deserialize, Serialize};

use super::error::{KeystoreError, KeystoreResult};
use crate::secure::{secret_bytes, SecretBytes};

/// Mandatory scrypt parameters: n = 2^18 per EIP-2335.
pub const SCRYPT_N: u32 = 262144;
pub const SCRYPT_R: u32 = 8;
pub const SCRYPT_P: u32 = 1;
pub const SCRYPT_DKLEN: usize = 32;

/// Salt length in bytes
pub const SALT_LENGTH: usize = 32;

/// KDF section of the keystore JSON
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KdfModule {
    /// KDF function identifier; only "scrypt" is supported
    pub function: String,
    pub params: KdfParams,
    /// Empty message field required by the EIP-2335 schema
    pub message: String,
}

impl KdfModule {
    /// Create a scrypt KDF module with the mandatory parameters and the
    /// given salt.
    pub fn new_scrypt(salt: Vec<u8>) -> Self {
        Self {
            function: "scrypt".to_string(),
            params: KdfParams {
                dklen: SCRYPT_DKLEN as u32,
                n: SCRYPT_N,
                r: SCRYPT_R,
                p: SCRYPT_P,
                salt: hex::encode(&salt),
            },
            message: String::new(),
        }
    }

    /// Reject unknown functions and malformed parameters.
    pub fn validate(&self) -> KeystoreResult<()> {
        if self.function != "scrypt" {
            return Err(KeystoreError::UnsupportedKdf(self.function.clone()));
        }
        self.params.validate()
    }

    /// Derive the 32-byte key from a passphrase.
    pub fn derive_key(&self, passphrase: &str) -> KeystoreResult<SecretBytes> {
        self.validate()?;
        let salt = hex::decode(&self.params.salt)
            .map_err(|e| KeystoreError::HexError(format!("invalid salt hex: {e}")))?;
        scrypt_derive_key(
            passphrase,
            &salt,
            self.params.n,
            self.params.r,
            self.params.p,
            self.params.dklen as usize,
        )
    }
}

/// scrypt parameters as stored in the keystore JSON
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KdfParams {
    /// Derived key length in bytes
    pub dklen: u32,
    /// CPU/memory cost, must be a power of two
    pub n: u32,
    /// Block size
    pub r: u32,
    /// Parallelization
    pub p: u32,
    /// Salt as hex
    pub salt: String,
}

impl KdfParams {
    pub fn validate(&self) -> KeystoreResult<()> {
        if self.dklen < 32 {
            return Err(KeystoreError::InvalidKdfParams(
                "dklen must be at least 32".to_string(),
            ));
        }
        if self.n == 0 || (self.n & (self.n - 1)) != 0 {
            return Err(KeystoreError::InvalidKdfParams(
                "n must be a power of 2".to_string(),
            ));
        }
        if self.r == 0 {
            return Err(KeystoreError::InvalidKdfParams(
                "r must be positive".to_string(),
            ));
        }
        if self.p == 0 {
            return Err(KeystoreError::InvalidKdfParams(
                "p must be positive".to_string(),
            ));
        }
        hex::decode(&self.salt)
            .map_err(|e| KeystoreError::InvalidKdfParams(format!("invalid salt hex: {e}")))?;
        Ok(())
    }
}

/// Run scrypt over the passphrase with the given parameters.
pub fn scrypt_derive_key(
    passphrase: &str,
    salt: &[u8],
    n: u32,
    r: u32,
    p: u32,
    dklen: usize,
) -> KeystoreResult<SecretBytes> {
    let log_n = n.ilog2() as u8;

    let params = scrypt::Params::new(log_n, r, p, dklen)
        .map_err(|e| KeystoreError::InvalidKdfParams(e.to_string()))?;

    let mut output = vec![0u8; dklen];
    scrypt::scrypt(passphrase.as_bytes(), salt, &params, &mut output)
        .map_err(|e| KeystoreError::KdfError(e.to_string()))?;

    Ok(secret_bytes(output))
}

/// Generate a random 32-byte salt.
pub fn generate_salt() -> Vec<u8> {
    use rand::RngCore;
    let mut salt = vec![0u8; SALT_LENGTH];
    rand::thread_rng().fill_bytes(&mut salt);
    salt
}
