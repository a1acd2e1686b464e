//! AES-128-CTR encryption of the secret scalar

use aes::Aes128;
use cipher::{KeyIvInit, StreamCipher};
use ctr::Ctr128BE;
use serde::{Deserialize, Serialize};

use super::error::{KeystoreError, KeystoreResult};
use crate::secure::{secret_bytes, SecretBytes};

/// IV length for AES-128-CTR
pub const IV_LENGTH: usize = 16;

/// AES-128 key length; the first half of the derived key
pub const AES_KEY_LENGTH: usize = 16;

type Aes128Ctr = Ctr128BE<Aes128>;

/// Cipher section of the keystore JSON
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CipherModule {
    /// Cipher function identifier; only "aes-128-ctr" is supported
    pub function: String,
    pub params: CipherParams,
    /// Ciphertext as hex
    pub message: String,
}

impl CipherModule {
    pub fn new(iv: Vec<u8>, ciphertext: Vec<u8>) -> Self {
        Self {
            function: "aes-128-ctr".to_string(),
            params: CipherParams {
                iv: hex::encode(&iv),
            },
            message: hex::encode(&ciphertext),
        }
    }

    /// Reject unknown functions and malformed parameters.
    pub fn validate(&self) -> KeystoreResult<()> {
        if self.function != "aes-128-ctr" {
            return Err(KeystoreError::UnsupportedCipher(self.function.clone()));
        }
        self.params.validate()?;
        hex::decode(&self.message)
            .map_err(|e| KeystoreError::HexError(format!("invalid ciphertext hex: {e}")))?;
        Ok(())
    }

    pub fn iv(&self) -> KeystoreResult<Vec<u8>> {
        hex::decode(&self.params.iv)
            .map_err(|e| KeystoreError::HexError(format!("invalid IV hex: {e}")))
    }

    pub fn ciphertext(&self) -> KeystoreResult<Vec<u8>> {
        hex::decode(&self.message)
            .map_err(|e| KeystoreError::HexError(format!("invalid ciphertext hex: {e}")))
    }
}

/// Cipher parameters for AES-128-CTR
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CipherParams {
    /// Initialization vector as hex
    pub iv: String,
}

impl CipherParams {
    pub fn validate(&self) -> KeystoreResult<()> {
        let iv = hex::decode(&self.iv)
            .map_err(|e| KeystoreError::InvalidCipherParams(format!("invalid IV hex: {e}")))?;
        if iv.len() != IV_LENGTH {
            return Err(KeystoreError::InvalidCipherParams(format!(
                "IV must be {IV_LENGTH} bytes, got {}",
                iv.len()
            )));
        }
        Ok(())
    }
}

/// Encrypt with AES-128-CTR keyed by the first 16 bytes of the derived key.
pub fn encrypt_secret(secret: &[u8], derived_key: &[u8], iv: &[u8]) -> KeystoreResult<Vec<u8>> {
    let (key, iv) = check_key_iv(derived_key, iv)?;
    let mut cipher = Aes128Ctr::new(&key.into(), &iv.into());
    let mut ciphertext = secret.to_vec();
    cipher.apply_keystream(&mut ciphertext);
    Ok(ciphertext)
}

/// Decrypt with AES-128-CTR keyed by the first 16 bytes of the derived key.
pub fn decrypt_secret(
    ciphertext: &[u8],
    derived_key: &[u8],
    iv: &[u8],
) -> KeystoreResult<SecretBytes> {
    let (key, iv) = check_key_iv(derived_key, iv)?;
    let mut cipher = Aes128Ctr::new(&key.into(), &iv.into());
    let mut plaintext = ciphertext.to_vec();
    cipher.apply_keystream(&mut plaintext);
    Ok(secret_bytes(plaintext))
}

fn check_key_iv(
    derived_key: &[u8],
    iv: &[u8],
) -> KeystoreResult<([u8; AES_KEY_LENGTH], [u8; IV_LENGTH])> {
    if derived_key.len() < AES_KEY_LENGTH {
        return Err(KeystoreError::InvalidCipherParams(format!(
            "derived key must be at least {AES_KEY_LENGTH} bytes, got {}",
            derived_key.len()
        )));
    }
    if iv.len() != IV_LENGTH {
        return Err(KeystoreError::InvalidCipherParams(format!(
            "IV must be {IV_LENGTH} bytes, got {}",
            iv.len()
        )));
    }
    let mut key_arr = [0u8; AES_KEY_LENGTH];
    key_arr.copy_from_slice(&derived_key[..AES_KEY_LENGTH]);
    let mut iv_arr = [0u8; IV_LENGTH];
    iv_arr.copy_from_slice(iv);
    Ok((key_arr, iv_arr))
}

/// Generate a random 16-byte IV.
pub fn generate_iv() -> Vec<u8> {
    use rand::RngCore;
    let mut iv = vec![0u8; IV_LENGTH];
    rand::thread_rng().fill_bytes(&mut iv);
    iv
}
