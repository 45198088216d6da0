use ::argon2::{Algorithm as Variant, Argon2 as Hasher, Params, Version};

use super::{KdfPlugin, key_buffer};
use crate::crypto::{ARGON2_SALT_LEN, KEY_LEN};
use crate::error::{Error, Result};
use crate::spec::{self, Algorithm, PartialSpec};

/// Argon2 refuses salts shorter than this.
const MIN_SALT_LEN: usize = 8;
/// Argon2 refuses outputs shorter than this.
const MIN_KEY_LEN: i64 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Argon2Spec {
    memory_cost: u32,
    time_cost: u32,
    parallelism: u32,
    derived_key_length: usize,
}

impl Default for Argon2Spec {
    fn default() -> Self {
        Self {
            // 64 MiB
            memory_cost: 64 * 1024,
            time_cost: 3,
            parallelism: 1,
            derived_key_length: KEY_LEN,
        }
    }
}

impl Argon2Spec {
    /// Memory in KiB.
    pub fn memory_cost(&self) -> u32 {
        self.memory_cost
    }

    pub fn time_cost(&self) -> u32 {
        self.time_cost
    }

    pub fn parallelism(&self) -> u32 {
        self.parallelism
    }

    pub fn derived_key_length(&self) -> usize {
        self.derived_key_length
    }
}

/// Argon2id, version 0x13.
pub struct Argon2;

impl KdfPlugin for Argon2 {
    const ALGORITHM: Algorithm = Algorithm::Argon2;
    type Spec = Argon2Spec;

    fn normalize_spec(partial: &PartialSpec) -> Result<Argon2Spec> {
        spec::check_algorithm(partial, Algorithm::Argon2)?;
        let defaults = Argon2Spec::default();

        let memory_cost = spec::integer("Memory cost", partial.memory_cost.as_ref())?;
        let time_cost = spec::integer("Time cost", partial.time_cost.as_ref())?;
        let parallelism = spec::integer("Parallelism", partial.parallelism.as_ref())?;
        let derived_key_length =
            spec::integer("Derived key length", partial.derived_key_length.as_ref())?;

        let memory_cost = memory_cost.unwrap_or(i64::from(defaults.memory_cost));
        if memory_cost < 8 {
            return Err(spec::invalid("Memory cost must be at least 8"));
        }

        let time_cost = time_cost.unwrap_or(i64::from(defaults.time_cost));
        if time_cost < 1 {
            return Err(spec::invalid("Time cost must be a number greater than zero"));
        }

        let parallelism = parallelism.unwrap_or(i64::from(defaults.parallelism));
        if parallelism < 1 {
            return Err(spec::invalid("Parallelism must be a number greater than zero"));
        }

        let derived_key_length = derived_key_length.unwrap_or(defaults.derived_key_length as i64);
        if derived_key_length < MIN_KEY_LEN {
            return Err(spec::invalid(format!(
                "Derived key length must be at least {MIN_KEY_LEN}"
            )));
        }
        // Params::MAX_OUTPUT_LEN
        let derived_key_length = spec::key_length(derived_key_length)?;

        if i128::from(memory_cost) < 8 * i128::from(parallelism) {
            return Err(spec::invalid("Memory cost must be at least 8 * parallelism"));
        }

        Ok(Argon2Spec {
            memory_cost: spec::narrow("Memory cost", memory_cost)?,
            time_cost: spec::narrow("Time cost", time_cost)?,
            parallelism: spec::narrow("Parallelism", parallelism)?,
            derived_key_length,
        })
    }

    fn salt_length(_spec: &Argon2Spec) -> usize {
        ARGON2_SALT_LEN
    }

    fn invoke_primitive(secret: &[u8], salt: &[u8], spec: &Argon2Spec) -> Result<Vec<u8>> {
        if salt.len() < MIN_SALT_LEN {
            return Err(Error::InvalidSalt(format!(
                "Salt must be at least {MIN_SALT_LEN} bytes, got {}",
                salt.len()
            )));
        }

        let params = Params::new(
            spec.memory_cost,
            spec.time_cost,
            spec.parallelism,
            Some(spec.derived_key_length),
        )
        .map_err(|e| Error::Primitive(format!("failed to construct Argon2 params: {e}")))?;

        let hasher = Hasher::new(Variant::Argon2id, Version::V0x13, params);

        let mut key = key_buffer(spec.derived_key_length)?;
        hasher
            .hash_password_into(secret, salt, &mut key)
            .map_err(|e| Error::Primitive(format!("argon2 key derivation failed: {e}")))?;
        Ok(key)
    }
}
