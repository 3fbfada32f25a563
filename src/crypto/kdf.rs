use scrypt::{Params, scrypt};
use serde::Serialize;
use tracing::debug;

use super::KEY_LEN;
use crate::error::HashError;

/// Recommended log2 of the scrypt cost factor (N = 131072).
pub const RECOMMENDED_LN: u32 = 17;
/// Recommended scrypt block size.
pub const RECOMMENDED_R: u32 = 8;
/// Recommended scrypt parallelization.
pub const RECOMMENDED_P: u32 = 1;

/// Bytes touched per unit of `N * r` by scrypt's ROMix.
const BLOCK_BYTES: u64 = 128;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct KdfParams {
    ln: u32,
    r: u32,
    p: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            ln: RECOMMENDED_LN,
            r: RECOMMENDED_R,
            p: RECOMMENDED_P,
        }
    }
}

impl KdfParams {
    pub fn new(ln: u32, r: u32, p: u32) -> Result<Self, HashError> {
        let params = Self { ln, r, p };
        params.validate()?;
        Ok(params)
    }

    pub fn ln(&self) -> u32 {
        self.ln
    }

    pub fn r(&self) -> u32 {
        self.r
    }

    pub fn p(&self) -> u32 {
        self.p
    }

    /// The cost factor `N = 2^ln`, or `None` if it does not fit in 64 bits.
    pub fn n(&self) -> Option<u64> {
        1u64.checked_shl(self.ln)
    }

    /// Memory ceiling for one derivation: `1.5 * N * r * 128` bytes.
    ///
    /// `None` when the product overflows.
    pub fn max_memory(&self) -> Option<u64> {
        let working_set = self
            .n()?
            .checked_mul(u64::from(self.r))?
            .checked_mul(BLOCK_BYTES)?;
        working_set.checked_add(working_set / 2)
    }

    /// Bytes scrypt actually allocates: `128 * r * (N + 2)` for V plus
    /// `128 * r * p` for B.
    pub fn required_memory(&self) -> Option<u64> {
        let block = BLOCK_BYTES.checked_mul(u64::from(self.r))?;
        let v = block.checked_mul(self.n()?.checked_add(2)?)?;
        let b = block.checked_mul(u64::from(self.p))?;
        v.checked_add(b)
    }

    pub fn validate(&self) -> Result<(), HashError> {
        if self.ln < 1 {
            return Err(HashError::InvalidParams("ln must be >= 1"));
        }
        if self.r < 1 {
            return Err(HashError::InvalidParams("r must be >= 1"));
        }
        if self.p < 1 {
            return Err(HashError::InvalidParams("p must be >= 1"));
        }
        Ok(())
    }
}

/// Runs scrypt over `password` and `salt`, refusing parameter sets whose
/// allocation exceeds either their own `max_memory` or `memory_limit` bytes.
pub fn derive_key(
    password: &str,
    salt: &[u8],
    kdf: KdfParams,
    memory_limit: u64,
) -> Result<[u8; KEY_LEN], HashError> {
    kdf.validate()?;

    let limit = match kdf.max_memory() {
        Some(max_memory) => max_memory.min(memory_limit),
        None => return Err(HashError::MemoryLimit { limit: memory_limit }),
    };
    match kdf.required_memory() {
        Some(required) if required <= limit => {}
        _ => return Err(HashError::MemoryLimit { limit }),
    }

    let log_n = u8::try_from(kdf.ln).map_err(|_| HashError::InvalidParams("ln out of range"))?;
    let params = Params::new(log_n, kdf.r, kdf.p, KEY_LEN)
        .map_err(|_| HashError::InvalidParams("rejected by scrypt"))?;

    debug!(ln = kdf.ln, r = kdf.r, p = kdf.p, "deriving scrypt key");

    let mut key = [0u8; KEY_LEN];
    scrypt(password.as_bytes(), salt, &params, &mut key).map_err(|_| HashError::Derivation)?;

    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    const NO_LIMIT: u64 = u64::MAX;

    fn cheap() -> KdfParams {
        KdfParams::new(4, 8, 1).unwrap()
    }

    #[test]
    fn defaults_are_recommended() {
        let kdf = KdfParams::default();
        assert_eq!(kdf.ln(), 17);
        assert_eq!(kdf.r(), 8);
        assert_eq!(kdf.p(), 1);
        assert_eq!(kdf.n(), Some(131_072));
    }

    #[test]
    fn max_memory_is_one_and_a_half_working_sets() {
        // 1.5 * 131072 * 8 * 128
        assert_eq!(KdfParams::default().max_memory(), Some(201_326_592));
        assert_eq!(KdfParams::new(1, 1, 1).unwrap().max_memory(), Some(384));
    }

    #[test]
    fn max_memory_overflow_is_none() {
        assert_eq!(KdfParams::new(64, 1, 1).unwrap().n(), None);
        assert_eq!(KdfParams::new(60, 1024, 1).unwrap().max_memory(), None);
    }

    #[test]
    fn required_memory_counts_parallelism() {
        // V: 1024 * (131072 + 2), B: 1024 * 1
        assert_eq!(KdfParams::default().required_memory(), Some(134_219_776));
        assert_eq!(
            KdfParams::new(1, 8, 100_000).unwrap().required_memory(),
            Some(102_404_096)
        );
        assert!(
            KdfParams::default().required_memory().unwrap()
                <= KdfParams::default().max_memory().unwrap()
        );
    }

    #[test]
    fn large_parallelism_exceeds_own_max_memory() {
        for p in [100_000, 100_000_000] {
            let kdf = KdfParams::new(1, 8, p).unwrap();
            let err = derive_key("pw", &[1u8; 16], kdf, NO_LIMIT).unwrap_err();
            assert_eq!(err, HashError::MemoryLimit { limit: 3072 });
        }
    }

    #[test]
    fn large_parallelism_exceeds_configured_limit() {
        let kdf = KdfParams::new(1, 8, 100_000).unwrap();
        let err = derive_key("pw", &[1u8; 16], kdf, 4096).unwrap_err();
        assert_eq!(err, HashError::MemoryLimit { limit: 3072 });

        // p = 4 stays within max_memory for ln = 4 but not a 20 KiB ceiling
        let kdf = KdfParams::new(4, 8, 4).unwrap();
        let err = derive_key("pw", &[1u8; 16], kdf, 20 * 1024).unwrap_err();
        assert_eq!(err, HashError::MemoryLimit { limit: 20 * 1024 });
    }

    #[test]
    fn kdf_is_deterministic() {
        let salt = [42u8; 16];

        let k1 = derive_key("password", &salt, cheap(), NO_LIMIT).unwrap();
        let k2 = derive_key("password", &salt, cheap(), NO_LIMIT).unwrap();

        assert_eq!(k1, k2);
    }

    #[test]
    fn kdf_params_affect_output() {
        let salt = [7u8; 16];

        let k1 = derive_key("pw", &salt, KdfParams::new(4, 8, 1).unwrap(), NO_LIMIT).unwrap();
        let k2 = derive_key("pw", &salt, KdfParams::new(5, 8, 1).unwrap(), NO_LIMIT).unwrap();

        assert_ne!(k1, k2);
    }

    #[test]
    fn kdf_matches_rfc7914_vector() {
        // RFC 7914 section 12, second vector, truncated to 32 bytes.
        let kdf = KdfParams::new(10, 8, 16).unwrap();
        let key = derive_key("password", b"NaCl", kdf, NO_LIMIT).unwrap();
        let expected: [u8; 32] = [
            0xfd, 0xba, 0xbe, 0x1c, 0x9d, 0x34, 0x72, 0x00, 0x78, 0x56, 0xe7, 0x19, 0x0d, 0x01,
            0xe9, 0xfe, 0x7c, 0x6a, 0xd7, 0xcb, 0xc8, 0x23, 0x78, 0x30, 0xe7, 0x73, 0x76, 0x63,
            0x4b, 0x37, 0x31, 0x62,
        ];
        assert_eq!(key, expected);
    }

    #[test]
    fn kdf_invalid_params_fail_gracefully() {
        assert!(KdfParams::new(0, 0, 0).is_err());
        assert!(KdfParams::new(17, 0, 1).is_err());
        assert!(KdfParams::new(17, 8, 0).is_err());
    }

    #[test]
    fn memory_limit_is_enforced() {
        let err = derive_key("pw", &[1u8; 16], cheap(), 1024).unwrap_err();
        assert_eq!(err, HashError::MemoryLimit { limit: 1024 });
    }

    #[test]
    fn ln_beyond_primitive_range_fails() {
        // log_n must stay below 16 * r
        let kdf = KdfParams::new(16, 1, 1).unwrap();
        let err = derive_key("pw", &[1u8; 16], kdf, NO_LIMIT).unwrap_err();
        assert!(matches!(err, HashError::InvalidParams(_)));
    }
}
