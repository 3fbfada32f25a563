//! Credential string format.
//!
//! ```text
//! $scrypt$ln=<uint>,r=<uint>,p=<uint>$<base64 salt, no padding>$<base64 hash, no padding>
//! ```
//!
//! Decoding is total: any malformed input yields `None` without saying why.

use crate::{KdfParams, error::HashError};

pub mod b64;

/// Identifier in the second segment.
pub const IDENTIFIER: &str = "scrypt";

/// Decoded content of a credential string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialParams {
    kdf: KdfParams,
    salt: Vec<u8>,
    hash: Vec<u8>,
}

impl CredentialParams {
    /// Builds a parameter record, rejecting empty salt or hash.
    pub fn new(kdf: KdfParams, salt: Vec<u8>, hash: Vec<u8>) -> Result<Self, HashError> {
        kdf.validate()?;
        if salt.is_empty() {
            return Err(HashError::InvalidParams("salt must not be empty"));
        }
        if hash.is_empty() {
            return Err(HashError::InvalidParams("hash must not be empty"));
        }
        Ok(Self { kdf, salt, hash })
    }

    /// Returns the scrypt cost parameters.
    pub fn kdf(&self) -> &KdfParams {
        &self.kdf
    }

    /// Returns the raw salt bytes.
    pub fn salt(&self) -> &[u8] {
        &self.salt
    }

    /// Returns the raw derived key bytes.
    pub fn hash(&self) -> &[u8] {
        &self.hash
    }
}

/// Serializes a parameter record to its credential string.
pub fn encode(params: &CredentialParams) -> String {
    format!(
        "${IDENTIFIER}$ln={},r={},p={}${}${}",
        params.kdf.ln(),
        params.kdf.r(),
        params.kdf.p(),
        b64::encode(&params.salt),
        b64::encode(&params.hash),
    )
}

/// Parses a credential string.
///
/// Returns `None` for anything that is not exactly five `$` segments with an
/// empty head, the `scrypt` identifier, positive `ln`, `r`, `p` tokens and
/// non-empty canonical base64 salt and hash.
pub fn decode(text: &str) -> Option<CredentialParams> {
    let segments: Vec<&str> = text.split('$').collect();
    let &[head, identifier, params, salt, hash] = segments.as_slice() else {
        return None;
    };

    if !head.is_empty() || identifier != IDENTIFIER || params.is_empty() {
        return None;
    }

    let kdf = KdfParams::new(
        param(params, "ln")?,
        param(params, "r")?,
        param(params, "p")?,
    )
    .ok()?;

    CredentialParams::new(kdf, segment(salt)?, segment(hash)?).ok()
}

/// Finds the first `key=digits` token in a comma-separated parameter block.
fn param(block: &str, key: &str) -> Option<u32> {
    block.split(',').find_map(|token| {
        let digits = token.strip_prefix(key)?.strip_prefix('=')?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        digits.parse().ok()
    })
}

fn segment(text: &str) -> Option<Vec<u8>> {
    if text.is_empty() || b64::strip(text) != text {
        return None;
    }
    b64::decode(text)
}
