//! SHA-256 checksum over dk[16..32] || ciphertext
//!
//! The checksum binds the ciphertext to the derived key, so a wrong
//! passphrase and a tampered blob fail the same way.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::error::{KeystoreError, KeystoreResult};

/// Checksum section of the keystore JSON
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChecksumModule {
    /// Checksum function identifier; only "sha256" is supported
    pub function: String,
    /// Empty params object required by the EIP-2335 schema
    pub params: ChecksumParams,
    /// Checksum value as hex
    pub message: String,
}

impl ChecksumModule {
    pub fn new(checksum: Vec<u8>) -> Self {
        Self {
            function: "sha256".to_string(),
            params: ChecksumParams {},
            message: hex::encode(&checksum),
        }
    }

    pub fn validate(&self) -> KeystoreResult<()> {
        if self.function != "sha256" {
            return Err(KeystoreError::UnsupportedChecksum(self.function.clone()));
        }
        hex::decode(&self.message)
            .map_err(|e| KeystoreError::HexError(format!("invalid checksum hex: {e}")))?;
        Ok(())
    }

    /// Verify the checksum for the given derived key and ciphertext.
    pub fn verify(&self, derived_key: &[u8], ciphertext: &[u8]) -> KeystoreResult<bool> {
        let expected = hex::decode(&self.message)
            .map_err(|e| KeystoreError::HexError(format!("invalid checksum hex: {e}")))?;
        let computed = compute_checksum(derived_key, ciphertext)?;
        Ok(constant_time_eq(&expected, &computed))
    }
}

/// Empty params struct for SHA-256
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ChecksumParams {}

/// Compute SHA-256(dk[16..32] || ciphertext).
pub fn compute_checksum(derived_key: &[u8], ciphertext: &[u8]) -> KeystoreResult<Vec<u8>> {
    if derived_key.len() < 32 {
        return Err(KeystoreError::InvalidKdfParams(format!(
            "derived key must be at least 32 bytes, got {}",
            derived_key.len()
        )));
    }

    let mut hasher = Sha256::new();
    hasher.update(&derived_key[16..32]);
    hasher.update(ciphertext);
    Ok(hasher.finalize().to_vec())
}

/// Constant-time byte comparison for matching-length inputs.
///
/// Also used by the API-key auth path; must not branch on data.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compute_checksum_deterministic() {
        let key = vec![0xAA; 32];
        let ciphertext = vec![0xBB; 32];

        let a = compute_checksum(&key, &ciphertext).unwrap();
        let b = compute_checksum(&key, &ciphertext).unwrap();
        assert_eq!(a.len(), 32);
        assert_eq!(a, b);
    }

    #[test]
    fn test_checksum_uses_second_half_of_key() {
        let ciphertext = vec![0xCC; 32];

        let mut key1 = vec![0xAA; 32];
        let mut key2 = vec![0xBB; 32];
        key1[16..32].copy_from_slice(&[0xFF; 16]);
        key2[16..32].copy_from_slice(&[0xFF; 16]);

        // Only dk[16..32] participates.
        assert_eq!(
            compute_checksum(&key1, &ciphertext).unwrap(),
            compute_checksum(&key2, &ciphertext).unwrap()
        );

        key2[16..32].copy_from_slice(&[0xEE; 16]);
        assert_ne!(
            compute_checksum(&key1, &ciphertext).unwrap(),
            compute_checksum(&key2, &ciphertext).unwrap()
        );
    }

    #[test]
    fn test_module_verify() {
        let key = vec![0x11; 32];
        let ciphertext = vec![0x22; 32];

        let checksum = compute_checksum(&key, &ciphertext).unwrap();
        let module = ChecksumModule::new(checksum);

        assert!(module.verify(&key, &ciphertext).unwrap());
        assert!(!module.verify(&[0x33; 32], &ciphertext).unwrap());
    }

    #[test]
    fn test_module_rejects_unknown_function() {
        let mut module = ChecksumModule::new(vec![0xDD; 32]);
        module.function = "keccak256".to_string();
        assert!(matches!(
            module.validate(),
            Err(KeystoreError::UnsupportedChecksum(_))
        ));
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq(&[1, 2, 3], &[1, 2, 3]));
        assert!(!constant_time_eq(&[1, 2, 3], &[1, 2, 4]));
        assert!(!constant_time_eq(&[1, 2, 3], &[1, 2]));
        assert!(constant_time_eq(&[], &[]));
    }
}
