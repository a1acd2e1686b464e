//! EIP-2335 compatible encrypted keystore for BN254 private keys
//!
//! The at-rest form of every key managed by the signer:
//!
//! - scrypt KDF (n = 2^18, r = 8, p = 1, dklen = 32, 32-byte salt)
//! - AES-128-CTR over the raw scalar bytes with a random 16-byte IV
//! - SHA-256 checksum over dk[16..32] || ciphertext, verified before any
//!   plaintext is released
//! - JSON serialization with a deterministic field order
//!
//! A wrong passphrase and a tampered ciphertext are indistinguishable: both
//! fail the checksum. The caller-facing error for either is
//! [`KeystoreError::ChecksumMismatch`].

mod checksum;
mod cipher;
mod encrypted;
mod error;
mod kdf;

pub use checksum::{compute_checksum, constant_time_eq, ChecksumModule};
pub use cipher::{decrypt_secret, encrypt_secret, CipherModule};
pub use encrypted::{EncryptedKeystore, KeystoreBuilder, KEYSTORE_VERSION};
pub use error::{KeystoreError, KeystoreResult};
pub use kdf::{scrypt_derive_key, KdfModule, KdfParams};
