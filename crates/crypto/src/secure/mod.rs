//! Secure memory handling for secret material
//!
//! Containers in this module are zeroized on drop and mask their contents in
//! `Debug` output so secrets never reach the log formatter.

mod secret;

pub use secret::{secret_bytes, SecretBytes, SecretString};
