mod config;
mod crypto;
mod error;
pub mod format;
mod storage;

pub use crate::config::{DEFAULT_MAX_MEMORY, HasherConfig};
pub use crate::crypto::kdf::{RECOMMENDED_LN, RECOMMENDED_P, RECOMMENDED_R};
pub use crate::crypto::{KEY_LEN, KdfParams, SALT_LEN, generate_salt};
pub use crate::error::HashError;
pub use crate::format::CredentialParams;
pub use crate::storage::Storage;
use subtle::ConstantTimeEq;
use tracing::{debug, warn};

/// Produces and checks scrypt credential strings under one [`HasherConfig`].
///
/// Every call blocks for the full derivation. Async callers should run it on
/// a blocking pool.
#[derive(Debug, Clone, Default)]
pub struct Hasher {
    config: HasherConfig,
}

impl Hasher {
    pub fn new(config: HasherConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &HasherConfig {
        &self.config
    }

    /// Hashes `password` with a fresh salt and the configured parameters.
    pub fn hash_password(&self, password: &str) -> Result<String, HashError> {
        self.hash_password_with(password, None, None)
    }

    /// Hashes `password`, generating a salt and falling back to the
    /// configured parameters for whatever is not supplied.
    pub fn hash_password_with(
        &self,
        password: &str,
        salt: Option<&[u8]>,
        kdf: Option<KdfParams>,
    ) -> Result<String, HashError> {
        let result = self.encode_hash(password, salt, kdf.unwrap_or(self.config.kdf()));
        if let Err(e) = &result {
            warn!(error = %e, "credential hashing failed");
        }
        result
    }

    /// Checks `password` against a stored credential string.
    ///
    /// Malformed strings, wrong passwords and derivation failures all return
    /// `false`.
    pub fn verify_password(&self, password: &str, stored: &str) -> bool {
        let verified = self
            .recompute(password, stored)
            .is_some_and(|candidate| candidate.as_bytes().ct_eq(stored.as_bytes()).into());

        if !verified {
            debug!("credential verification failed");
        }
        verified
    }

    /// Verifies against an account's stored string, or burns a full hash when
    /// there is no account so both paths take comparable time.
    pub fn verify_account(&self, password: &str, stored: Option<&str>) -> bool {
        match stored {
            Some(stored) => self.verify_password(password, stored),
            None => {
                let _ = self.hash_password(password);
                false
            }
        }
    }

    /// Returns `true` when `stored` is malformed or was produced with
    /// parameters other than the configured ones.
    pub fn needs_rehash(&self, stored: &str) -> bool {
        format::decode(stored).is_none_or(|params| *params.kdf() != self.config.kdf())
    }

    fn encode_hash(
        &self,
        password: &str,
        salt: Option<&[u8]>,
        kdf: KdfParams,
    ) -> Result<String, HashError> {
        let generated;
        let salt = match salt {
            Some(salt) => salt,
            None => {
                generated = crypto::generate_salt(self.config.salt_len())?;
                generated.as_slice()
            }
        };
        if salt.is_empty() {
            return Err(HashError::InvalidParams("salt must not be empty"));
        }

        let hash = crypto::derive_key(password, salt, kdf, self.config.max_memory())?;
        let params = CredentialParams::new(kdf, salt.to_vec(), hash.to_vec())?;
        Ok(format::encode(&params))
    }

    fn recompute(&self, password: &str, stored: &str) -> Option<String> {
        let stored = format::decode(stored)?;
        let kdf = *stored.kdf();
        let hash =
            crypto::derive_key(password, stored.salt(), kdf, self.config.max_memory()).ok()?;
        let candidate =
            CredentialParams::new(kdf, stored.salt().to_vec(), hash.to_vec()).ok()?;
        Some(format::encode(&candidate))
    }
}

/// Hashes `password` under the recommended policy. `salt` and `params`
/// override the generated salt and the recommended cost parameters.
pub fn hash_password(
    password: &str,
    salt: Option<&[u8]>,
    params: Option<KdfParams>,
) -> Result<String, HashError> {
    Hasher::default().hash_password_with(password, salt, params)
}

/// Checks `password` against `stored` using the parameters embedded in it.
pub fn verify_password(password: &str, stored: &str) -> bool {
    Hasher::default().verify_password(password, stored)
}
