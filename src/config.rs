//! Hashing policy handed to a [`Hasher`](crate::Hasher).

use crate::crypto::{KdfParams, SALT_LEN};

/// Default per-derivation memory ceiling (1 GiB).
pub const DEFAULT_MAX_MEMORY: u64 = 1 << 30;

/// Parameters for newly created credentials and the memory ceiling applied
/// to every derivation, including those driven by stored strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HasherConfig {
    kdf: KdfParams,
    salt_len: usize,
    max_memory: u64,
}

impl Default for HasherConfig {
    fn default() -> Self {
        Self {
            kdf: KdfParams::default(),
            salt_len: SALT_LEN,
            max_memory: DEFAULT_MAX_MEMORY,
        }
    }
}

impl HasherConfig {
    pub fn new(kdf: KdfParams) -> Self {
        Self {
            kdf,
            ..Self::default()
        }
    }

    pub fn with_salt_len(mut self, salt_len: usize) -> Self {
        self.salt_len = salt_len;
        self
    }

    pub fn with_max_memory(mut self, max_memory: u64) -> Self {
        self.max_memory = max_memory;
        self
    }

    pub fn kdf(&self) -> KdfParams {
        self.kdf
    }

    pub fn salt_len(&self) -> usize {
        self.salt_len
    }

    pub fn max_memory(&self) -> u64 {
        self.max_memory
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_uses_recommended_policy() {
        let config = HasherConfig::default();
        assert_eq!(config.kdf(), KdfParams::default());
        assert_eq!(config.salt_len(), 16);
        assert_eq!(config.max_memory(), DEFAULT_MAX_MEMORY);
    }

    #[test]
    fn default_ceiling_admits_recommended_params() {
        let required = KdfParams::default().max_memory().unwrap();
        assert!(required <= HasherConfig::default().max_memory());
    }

    #[test]
    fn builder_overrides_fields() {
        let kdf = KdfParams::new(10, 8, 1).unwrap();
        let config = HasherConfig::new(kdf)
            .with_salt_len(32)
            .with_max_memory(4096);

        assert_eq!(config.kdf(), kdf);
        assert_eq!(config.salt_len(), 32);
        assert_eq!(config.max_memory(), 4096);
    }
}
