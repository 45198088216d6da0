use ::pbkdf2::pbkdf2_hmac;

use super::{KdfPlugin, key_buffer};
use crate::crypto::hashes::{HashAlgorithm, with_digest};
use crate::error::Result;
use crate::spec::{self, Algorithm, PartialSpec};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pbkdf2Spec {
    hash: HashAlgorithm,
    iterations: u32,
    derived_key_length: usize,
}

impl Default for Pbkdf2Spec {
    fn default() -> Self {
        Self {
            hash: HashAlgorithm::Sha256,
            iterations: Pbkdf2::DEFAULT_ITERATIONS,
            derived_key_length: HashAlgorithm::Sha256.digest_len(),
        }
    }
}

impl Pbkdf2Spec {
    pub fn hash(&self) -> HashAlgorithm {
        self.hash
    }

    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    pub fn derived_key_length(&self) -> usize {
        self.derived_key_length
    }
}

/// PBKDF2 over HMAC with any catalog digest.
pub struct Pbkdf2;

impl Pbkdf2 {
    pub const DEFAULT_ITERATIONS: u32 = 65_536;
    /// Default of older releases; request it explicitly to reproduce old records.
    pub const LEGACY_ITERATIONS: u32 = 4_096;
}

impl KdfPlugin for Pbkdf2 {
    const ALGORITHM: Algorithm = Algorithm::Pbkdf2;
    type Spec = Pbkdf2Spec;

    fn normalize_spec(partial: &PartialSpec) -> Result<Pbkdf2Spec> {
        spec::check_algorithm(partial, Algorithm::Pbkdf2)?;
        let hash = spec::hash_or(partial, HashAlgorithm::Sha256)?;

        let iterations = spec::integer("Iterations", partial.iterations.as_ref())?;
        let derived_key_length =
            spec::integer("Derived key length", partial.derived_key_length.as_ref())?;

        let iterations = iterations.unwrap_or(i64::from(Self::DEFAULT_ITERATIONS));
        if iterations < 1 {
            return Err(spec::invalid("Iterations must be a number greater than zero"));
        }

        let derived_key_length = match derived_key_length {
            None => hash.digest_len(),
            Some(len) if len < 1 => {
                return Err(spec::invalid("Derived key length must be a number greater than zero"));
            }
            Some(len) => spec::key_length(len)?,
        };

        Ok(Pbkdf2Spec {
            hash,
            iterations: spec::narrow("Iterations", iterations)?,
            derived_key_length,
        })
    }

    fn salt_length(spec: &Pbkdf2Spec) -> usize {
        spec.hash.digest_len()
    }

    fn invoke_primitive(secret: &[u8], salt: &[u8], spec: &Pbkdf2Spec) -> Result<Vec<u8>> {
        let mut key = key_buffer(spec.derived_key_length)?;
        with_digest!(spec.hash, D => pbkdf2_hmac::<D>(secret, salt, spec.iterations, &mut key));
        Ok(key)
    }
}
