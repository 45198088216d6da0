use getrandom::fill;
use rand::RngCore;

use crate::error::{Error, Result};

/// Where generated salts come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaltSource {
    /// Thread-local userspace generator.
    Pseudo,
    /// Operating system entropy.
    Secure,
}

impl SaltSource {
    pub fn from_flag(secure: bool) -> Self {
        if secure { Self::Secure } else { Self::Pseudo }
    }
}

/// Fill buffer with cryptographically secure random bytes
fn secure_random(buf: &mut [u8]) -> Result<()> {
    fill(buf).map_err(|e| Error::Entropy(e.to_string()))
}

/// Generate a fresh salt of `len` bytes
pub fn generate_salt(len: usize, source: SaltSource) -> Result<Vec<u8>> {
    let mut salt = vec![0u8; len];
    match source {
        SaltSource::Pseudo => rand::rng().fill_bytes(&mut salt),
        SaltSource::Secure => secure_random(&mut salt)?,
    }
    tracing::debug!(len, ?source, "generated salt");
    Ok(salt)
}
