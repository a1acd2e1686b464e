//! BIP-39 mnemonic generation and BN254 scalar derivation
//!
//! Generated keys come with a 24-word English backup phrase. The scalar is
//! derived from the BIP-39 seed through a fixed EIP-2333-style path
//! (`m/254/6174/0/0`), so importing the phrase always reproduces the same
//! key.

mod derive;
mod error;
mod generate;

pub use derive::{derive_private_key, DEFAULT_DERIVATION_PATH};
pub use error::{MnemonicError, MnemonicResult};
pub use generate::Mnemonic;
