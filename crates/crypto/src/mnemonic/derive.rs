//! Deterministic BN254 scalar derivation from a mnemonic seed
//!
//! EIP-2333-style tree derivation: the 64-byte BIP-39 seed is walked down a
//! fixed path, one SHA-256 chaining step per component, and the final node is
//! reduced into F_r. The same phrase always yields the same scalar.

use sha2::{Digest, Sha256};

use super::error::{MnemonicError, MnemonicResult};
use super::generate::Mnemonic;
use crate::bn254::PrivateKey;

/// Derivation path for signer keys: m / curve-id / app-id / account / index.
pub const DEFAULT_DERIVATION_PATH: &str = "m/254/6174/0/0";

const CHAIN_DOMAIN: &[u8] = b"cerberus-bn254-derive";

/// Derive the BN254 private key at [`DEFAULT_DERIVATION_PATH`].
pub fn derive_private_key(
    mnemonic: &Mnemonic,
    passphrase: Option<&str>,
) -> MnemonicResult<PrivateKey> {
    derive_private_key_at(mnemonic, passphrase, DEFAULT_DERIVATION_PATH)
}

/// Derive the BN254 private key at an explicit path.
pub fn derive_private_key_at(
    mnemonic: &Mnemonic,
    passphrase: Option<&str>,
    path: &str,
) -> MnemonicResult<PrivateKey> {
    let seed = mnemonic.to_seed(passphrase);
    let components = parse_derivation_path(path)?;

    let mut node = seed.to_vec();
    for index in components {
        node = derive_child(&node, index);
    }

    // Reduction mod r; 32 uniformly random bytes never land on zero in
    // practice, but a zero scalar would be unusable.
    PrivateKey::from_hex_str(&hex::encode(&node[..32]))
        .map_err(|e| MnemonicError::DerivationFailed(e.to_string()))
}

/// Parse a BIP-32 style path such as "m/254/6174/0/0". Hardened markers are
/// accepted and ignored.
fn parse_derivation_path(path: &str) -> MnemonicResult<Vec<u32>> {
    let path = path.trim();

    if !path.starts_with('m') && !path.starts_with('M') {
        return Err(MnemonicError::InvalidPath(
            "path must start with 'm'".to_string(),
        ));
    }

    let mut components = Vec::new();
    for part in path.split('/').skip(1) {
        if part.is_empty() {
            continue;
        }

        let num_str = part.trim_end_matches(['\'', 'h', 'H']);
        let index: u32 = num_str
            .parse()
            .map_err(|_| MnemonicError::InvalidPath(format!("invalid path component: {part}")))?;
        components.push(index);
    }

    if components.is_empty() {
        return Err(MnemonicError::InvalidPath(
            "path has no components".to_string(),
        ));
    }

    Ok(components)
}

fn derive_child(parent: &[u8], index: u32) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(parent);
    hasher.update(CHAIN_DOMAIN);
    hasher.update(index.to_be_bytes());
    let first = hasher.finalize();

    let mut second = Sha256::new();
    second.update(first);
    second.update(parent);
    second.finalize().to_vec()
}
