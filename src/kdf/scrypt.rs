use ::scrypt::{Params, scrypt};

use super::{KdfPlugin, key_buffer};
use crate::crypto::KEY_LEN;
use crate::crypto::hashes::HashAlgorithm;
use crate::error::{Error, Result};
use crate::spec::{self, Algorithm, PartialSpec};

pub const DEFAULT_CPU_MEMORY_COST: u64 = 32_768;
pub const DEFAULT_BLOCK_SIZE: u32 = 8;
pub const DEFAULT_PARALLELIZATION: u32 = 1;

// N * r and r * p are both capped at 2^24.
const COST_LIMIT: i128 = 1 << 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScryptSpec {
    hash: HashAlgorithm,
    cpu_memory_cost: u64,
    block_size: u32,
    parallelization: u32,
    derived_key_length: usize,
}

impl Default for ScryptSpec {
    fn default() -> Self {
        Self {
            hash: HashAlgorithm::Sha256,
            cpu_memory_cost: DEFAULT_CPU_MEMORY_COST,
            block_size: DEFAULT_BLOCK_SIZE,
            parallelization: DEFAULT_PARALLELIZATION,
            derived_key_length: KEY_LEN,
        }
    }
}

impl ScryptSpec {
    /// Always SHA256; scrypt's inner PBKDF2 is fixed.
    pub fn hash(&self) -> HashAlgorithm {
        self.hash
    }

    /// `N`, a power of two.
    pub fn cpu_memory_cost(&self) -> u64 {
        self.cpu_memory_cost
    }

    /// `r`
    pub fn block_size(&self) -> u32 {
        self.block_size
    }

    /// `p`
    pub fn parallelization(&self) -> u32 {
        self.parallelization
    }

    pub fn derived_key_length(&self) -> usize {
        self.derived_key_length
    }
}

pub struct Scrypt;

impl KdfPlugin for Scrypt {
    const ALGORITHM: Algorithm = Algorithm::Scrypt;
    type Spec = ScryptSpec;

    fn normalize_spec(partial: &PartialSpec) -> Result<ScryptSpec> {
        spec::check_algorithm(partial, Algorithm::Scrypt)?;

        let hash = spec::hash_or(partial, HashAlgorithm::Sha256)?;
        if hash != HashAlgorithm::Sha256 {
            return Err(spec::invalid(format!("Only SHA256 hashing supported: {hash}")));
        }

        let cost = spec::integer("CPU/Memory cost", partial.cpu_memory_cost.as_ref())?;
        let block_size = spec::integer("Block size", partial.block_size.as_ref())?;
        let parallelization = spec::integer("Parallelization", partial.parallelization.as_ref())?;
        let derived_key_length =
            spec::integer("Derived key length", partial.derived_key_length.as_ref())?;

        let block_size = block_size.unwrap_or(i64::from(DEFAULT_BLOCK_SIZE));
        if block_size < 1 {
            return Err(spec::invalid("Block size must be a number greater than zero"));
        }

        let parallelization = parallelization.unwrap_or(i64::from(DEFAULT_PARALLELIZATION));
        if parallelization < 1 {
            return Err(spec::invalid("Parallelization must be a number greater than zero"));
        }

        let derived_key_length = derived_key_length.unwrap_or(KEY_LEN as i64);
        if derived_key_length < 1 {
            return Err(spec::invalid("Derived key length must be a number greater than zero"));
        }
        let derived_key_length = spec::key_length(derived_key_length)?;

        let cost = cost.unwrap_or(DEFAULT_CPU_MEMORY_COST as i64);
        if cost < 2 || cost & (cost - 1) != 0 {
            return Err(spec::invalid("CPU/Memory cost must be a power of 2 greater than 1"));
        }

        // The primitive also wants log2(N) < 16 * r.
        if i128::from(cost) * i128::from(block_size) > COST_LIMIT
            || i64::from(cost.trailing_zeros()) >= 16 * block_size
        {
            return Err(spec::invalid("CPU/Memory cost is too large for given block size"));
        }
        if i128::from(block_size) * i128::from(parallelization) > COST_LIMIT {
            return Err(spec::invalid("Block size too large for given parallelization"));
        }

        Ok(ScryptSpec {
            hash,
            cpu_memory_cost: spec::narrow("CPU/Memory cost", cost)?,
            block_size: spec::narrow("Block size", block_size)?,
            parallelization: spec::narrow("Parallelization", parallelization)?,
            derived_key_length,
        })
    }

    fn salt_length(spec: &ScryptSpec) -> usize {
        spec.hash.digest_len()
    }

    fn invoke_primitive(secret: &[u8], salt: &[u8], spec: &ScryptSpec) -> Result<Vec<u8>> {
        let log_n = spec.cpu_memory_cost.trailing_zeros() as u8;
        // The length given to `Params` only matters for PHC strings.
        let params = Params::new(log_n, spec.block_size, spec.parallelization, KEY_LEN)
            .map_err(|e| Error::Primitive(format!("scrypt rejected its parameters: {e}")))?;

        let mut key = key_buffer(spec.derived_key_length)?;
        scrypt(secret, salt, &params, &mut key).map_err(|e| {
            tracing::warn!(len = spec.derived_key_length, "scrypt produced no hash");
            Error::InvalidPrimitiveOutput(format!("No hash from scrypt: {e}"))
        })?;
        Ok(key)
    }
}
