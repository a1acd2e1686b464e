//! Small helpers shared across the services

use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Canonicalize a client-supplied G1 public key identifier: strip an
/// optional `0x` prefix and lowercase.
pub fn normalize_pub_key(pub_key: &str) -> String {
    pub_key
        .strip_prefix("0x")
        .unwrap_or(pub_key)
        .to_lowercase()
}

/// SHA-256 of the input, hex encoded.
pub fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}

/// Mint a fresh API key (a UUIDv7 string) and its stored hash. The key
/// itself is returned to the client exactly once.
pub fn generate_api_key() -> (String, String) {
    let api_key = Uuid::now_v7().to_string();
    let hash = sha256_hex(&api_key);
    (api_key, hash)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_pub_key() {
        assert_eq!(normalize_pub_key("0xA3B1"), "a3b1");
        assert_eq!(normalize_pub_key("A3B1"), "a3b1");
        assert_eq!(normalize_pub_key("a3b1"), "a3b1");
        assert_eq!(normalize_pub_key("0x"), "");
    }

    #[test]
    fn test_sha256_hex() {
        // SHA-256 of the empty string.
        assert_eq!(
            sha256_hex(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_generate_api_key() {
        let (key_a, hash_a) = generate_api_key();
        let (key_b, _) = generate_api_key();

        assert_ne!(key_a, key_b);
        assert_eq!(hash_a, sha256_hex(&key_a));
        assert_eq!(hash_a.len(), 64);
    }
}
