//! The EIP-2335 keystore document: encrypt, decrypt, save, load

use std::fs;
use std::path::Path;

use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::checksum::{compute_checksum, ChecksumModule};
use super::cipher::{encrypt_secret, generate_iv, CipherModule};
use super::error::{KeystoreError, KeystoreResult};
use super::kdf::{generate_salt, KdfModule};
use crate::secure::SecretBytes;

/// EIP-2335 schema version
pub const KEYSTORE_VERSION: u32 = 4;

/// An encrypted BN254 private key together with everything needed to
/// decrypt it again.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncryptedKeystore {
    /// KDF + checksum + cipher sections
    pub crypto: CryptoModule,
    /// Optional free-form description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Compressed G1 public key, lowercase hex; redundant with the secret
    /// name but used as an integrity check when loading
    pub pubkey: String,
    /// Derivation path when the key came from a mnemonic
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Random identifier
    pub uuid: String,
    /// Schema version
    pub version: u32,
}

/// Combined crypto parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CryptoModule {
    pub kdf: KdfModule,
    pub checksum: ChecksumModule,
    pub cipher: CipherModule,
}

impl EncryptedKeystore {
    /// Encrypt a secret under a passphrase with the default parameters.
    pub fn encrypt(secret: &[u8], passphrase: &str, pubkey: &str) -> KeystoreResult<Self> {
        KeystoreBuilder::new()
            .secret(secret)
            .passphrase(passphrase)
            .pubkey(pubkey)
            .build()
    }

    /// Reject unknown function names and malformed parameters.
    ///
    /// Called on load and before decryption, so a keystore written by an
    /// incompatible tool fails early instead of producing garbage plaintext.
    pub fn validate(&self) -> KeystoreResult<()> {
        self.crypto.kdf.validate()?;
        self.crypto.checksum.validate()?;
        self.crypto.cipher.validate()
    }

    /// Decrypt the secret. The checksum is verified before any plaintext is
    /// released; a mismatch (wrong passphrase or tampered blob) surfaces as
    /// [`KeystoreError::ChecksumMismatch`].
    pub fn decrypt(&self, passphrase: &str) -> KeystoreResult<SecretBytes> {
        self.validate()?;

        let derived_key = self.crypto.kdf.derive_key(passphrase)?;
        let dk = derived_key.expose_secret();
        let ciphertext = self.crypto.cipher.ciphertext()?;

        if !self.crypto.checksum.verify(dk, &ciphertext)? {
            return Err(KeystoreError::ChecksumMismatch);
        }

        let iv = self.crypto.cipher.iv()?;
        super::cipher::decrypt_secret(&ciphertext, dk, &iv)
    }

    /// Write canonical JSON to `path` with 0600 permissions, creating parent
    /// directories as needed.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> KeystoreResult<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, &json)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
        }

        Ok(())
    }

    /// Load and validate a keystore from disk.
    pub fn load<P: AsRef<Path>>(path: P) -> KeystoreResult<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    /// Parse and validate a keystore from its JSON form.
    pub fn from_json(json: &str) -> KeystoreResult<Self> {
        let keystore: Self = serde_json::from_str(json)?;
        keystore.validate()?;
        Ok(keystore)
    }

    pub fn pubkey(&self) -> &str {
        &self.pubkey
    }

    pub fn uuid(&self) -> &str {
        &self.uuid
    }
}

/// Builder for [`EncryptedKeystore`]
#[derive(Default)]
pub struct KeystoreBuilder {
    secret: Option<Vec<u8>>,
    passphrase: Option<String>,
    pubkey: Option<String>,
    description: Option<String>,
    path: Option<String>,
}

impl KeystoreBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// The secret bytes to encrypt (the 32-byte BN254 scalar).
    pub fn secret(mut self, secret: &[u8]) -> Self {
        self.secret = Some(secret.to_vec());
        self
    }

    pub fn passphrase(mut self, passphrase: &str) -> Self {
        self.passphrase = Some(passphrase.to_string());
        self
    }

    /// Compressed G1 public key hex used as the identifier.
    pub fn pubkey(mut self, pubkey: &str) -> Self {
        self.pubkey = Some(pubkey.to_string());
        self
    }

    pub fn description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    /// Derivation path when the scalar came from a mnemonic.
    pub fn path(mut self, path: &str) -> Self {
        self.path = Some(path.to_string());
        self
    }

    pub fn build(self) -> KeystoreResult<EncryptedKeystore> {
        let secret = self.secret.ok_or(KeystoreError::MissingField("secret"))?;
        let passphrase = self
            .passphrase
            .ok_or(KeystoreError::MissingField("passphrase"))?;
        let pubkey = self.pubkey.unwrap_or_default();

        let salt = generate_salt();
        let iv = generate_iv();

        let kdf = KdfModule::new_scrypt(salt);
        let derived_key = kdf.derive_key(&passphrase)?;
        let dk = derived_key.expose_secret();

        let ciphertext = encrypt_secret(&secret, dk, &iv)?;
        let checksum = compute_checksum(dk, &ciphertext)?;

        Ok(EncryptedKeystore {
            crypto: CryptoModule {
                kdf,
                checksum: ChecksumModule::new(checksum),
                cipher: CipherModule::new(iv, ciphertext),
            },
            description: self.description,
            pubkey,
            path: self.path,
            uuid: Uuid::new_v4().to_string(),
            version: KEYSTORE_VERSION,
        })
    }
}
