//! Secret wrapper aliases built on the `secrecy` crate
//!
//! Passwords, mnemonics and decrypted key bytes travel through these types so
//! that the memory is wiped on drop and `Debug` never prints the value.

use secrecy::SecretBox;

/// A secret byte buffer that is zeroized on drop.
///
/// The inner value can only be reached through `ExposeSecret::expose_secret`.
pub type SecretBytes = SecretBox<Vec<u8>>;

/// A secret string that is zeroized on drop.
pub type SecretString = secrecy::SecretString;

/// Wrap a plain byte vector as [`SecretBytes`].
pub fn secret_bytes(bytes: Vec<u8>) -> SecretBytes {
    SecretBox::new(Box::new(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn test_secret_bytes_roundtrip() {
        let secret = secret_bytes(vec![1, 2, 3, 4]);
        assert_eq!(secret.expose_secret(), &vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_secret_string() {
        let secret: SecretString = "p@$$w0rd".to_string().into();
        assert_eq!(secret.expose_secret(), "p@$$w0rd");
    }

    #[test]
    fn test_debug_does_not_leak() {
        let secret = secret_bytes(vec![0xAB; 4]);
        let debug = format!("{:?}", secret);
        assert!(!debug.contains("171"));
        assert!(!debug.contains("AB"));
    }
}
