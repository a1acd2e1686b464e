//! BIP-39 mnemonic phrase generation and parsing

use bip39::Mnemonic as Bip39Mnemonic;
use rand::RngCore;
use secrecy::ExposeSecret;
use zeroize::{Zeroize, ZeroizeOnDrop};

use super::error::MnemonicResult;
use crate::secure::SecretString;

/// BIP-39 English mnemonic with secure phrase handling
///
/// The phrase is held as a `SecretString` so it is wiped on drop and never
/// appears in `Debug` output.
#[derive(ZeroizeOnDrop)]
pub struct Mnemonic {
    // bip39::Mnemonic has no Zeroize impl; the phrase SecretString carries
    // the sensitive copy and is wiped by secrecy.
    #[zeroize(skip)]
    inner: Bip39Mnemonic,
    phrase: SecretString,
}

impl Mnemonic {
    /// Generate a fresh 24-word (256-bit entropy) mnemonic from the system
    /// CSPRNG.
    pub fn generate() -> MnemonicResult<Self> {
        let mut entropy = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut entropy);

        let mnemonic = Bip39Mnemonic::from_entropy(&entropy)?;
        entropy.zeroize();

        let phrase = mnemonic.to_string();
        Ok(Self {
            inner: mnemonic,
            phrase: phrase.into(),
        })
    }

    /// Import an existing phrase. Words are trimmed and lowercased; the
    /// BIP-39 checksum is validated.
    pub fn from_phrase(phrase: &str) -> MnemonicResult<Self> {
        let normalized = phrase
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();
        let mnemonic = Bip39Mnemonic::parse_normalized(&normalized)?;

        Ok(Self {
            inner: mnemonic,
            phrase: normalized.into(),
        })
    }

    /// The backup phrase. Use immediately, do not store.
    pub fn phrase(&self) -> &str {
        self.phrase.expose_secret()
    }

    pub fn word_count(&self) -> usize {
        self.inner.word_count()
    }

    /// The 64-byte BIP-39 seed (PBKDF2 over the phrase).
    pub fn to_seed(&self, passphrase: Option<&str>) -> [u8; 64] {
        self.inner.to_seed(passphrase.unwrap_or(""))
    }

    /// Validate a phrase without constructing a [`Mnemonic`].
    pub fn validate(phrase: &str) -> MnemonicResult<()> {
        Self::from_phrase(phrase).map(|_| ())
    }
}

impl std::fmt::Debug for Mnemonic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mnemonic")
            .field("word_count", &self.word_count())
            .field("phrase", &"[REDACTED]")
            .finish()
    }
}
