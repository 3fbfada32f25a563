use thiserror::Error;

/// Failure while creating a credential string.
///
/// Verification never surfaces these; it collapses every failure to `false`.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HashError {
    #[error("OS random generator unavailable")]
    Entropy,
    #[error("invalid scrypt parameters: {0}")]
    InvalidParams(&'static str),
    #[error("scrypt memory requirement exceeds limit of {limit} bytes")]
    MemoryLimit { limit: u64 },
    #[error("scrypt key derivation failed")]
    Derivation,
}
