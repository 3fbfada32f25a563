use getrandom::fill;

use crate::error::HashError;

/// Fill buffer with cryptographically secure random bytes
fn secure_random(buf: &mut [u8]) -> Result<(), HashError> {
    fill(buf).map_err(|_| HashError::Entropy)
}

/// Generate a salt of `len` bytes from the OS entropy source
pub fn generate_salt(len: usize) -> Result<Vec<u8>, HashError> {
    let mut salt = vec![0u8; len];
    secure_random(&mut salt)?;
    Ok(salt)
}
