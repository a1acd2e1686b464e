//! Cryptographic core of the cerberus remote signer
//!
//! This crate provides:
//! - BN254 BLS primitives: scalar parsing, G1/G2 public keys, hash-to-curve
//!   signing and pairing verification
//! - EIP-2335 encrypted keystores (scrypt + AES-128-CTR + SHA-256 checksum)
//! - BIP-39 mnemonic generation and deterministic scalar derivation
//! - Secure in-memory containers for secret material

pub mod bn254;
pub mod error;
pub mod keystore;
pub mod mnemonic;
pub mod secure;

pub use bn254::{
    g1_g2_dl_equality, hash_to_curve_g1, scalar_to_g1, scalar_to_g2, G1Point, G2Point, KeyPair,
    PrivateKey, Signature, G1_COMPRESSED_SIZE, G1_SERIALIZED_SIZE, G2_COMPRESSED_SIZE,
};
pub use error::Bn254Error;
pub use keystore::{constant_time_eq, EncryptedKeystore, KeystoreBuilder, KeystoreError};
pub use mnemonic::{Mnemonic, MnemonicError};
pub use secure::{secret_bytes, SecretBytes, SecretString};
