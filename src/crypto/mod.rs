//! Cryptographic primitives for credential hashing.
//!
//! Provides salt generation and scrypt key derivation.

pub mod kdf;
pub mod salt;

pub use kdf::{KdfParams, derive_key};
pub use salt::generate_salt;

/// Default length of a freshly generated salt (16 bytes).
pub const SALT_LEN: usize = 16;
/// Length of the derived key (32 bytes / 256 bits).
pub const KEY_LEN: usize = 32;
