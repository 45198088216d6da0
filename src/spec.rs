//! Spec model.
//!
//! A [`PartialSpec`] is what callers hand in: every field optional, numbers
//! possibly spelled as text. Each plugin normalizes it into its own typed,
//! immutable spec; [`KdfSpec`] is the algorithm-tagged union of those and
//! serializes to the canonical JSON shape, e.g.
//!
//! ```json
//! { "algorithm": "PBKDF2", "hash": "SHA256", "iterations": 65536, "derived_key_length": 32 }
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::crypto::MAX_KEY_LEN;
use crate::crypto::hashes::{self, HashAlgorithm};
use crate::error::{Error, Result};
use crate::kdf::{
    Argon2, Argon2Spec, Bcrypt, BcryptSpec, Hmac, HmacSpec, KdfPlugin, Pbkdf2, Pbkdf2Spec, Scrypt,
    ScryptSpec,
};

/// The algorithms a spec can name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Algorithm {
    Bcrypt,
    Pbkdf2,
    Scrypt,
    Hmac,
    Argon2,
}

impl Algorithm {
    pub const ALL: [Algorithm; 5] = [
        Algorithm::Bcrypt,
        Algorithm::Pbkdf2,
        Algorithm::Scrypt,
        Algorithm::Hmac,
        Algorithm::Argon2,
    ];

    /// Upper-cased name, as stored in specs.
    pub fn name(self) -> &'static str {
        match self {
            Algorithm::Bcrypt => "BCRYPT",
            Algorithm::Pbkdf2 => "PBKDF2",
            Algorithm::Scrypt => "SCRYPT",
            Algorithm::Hmac => "HMAC",
            Algorithm::Argon2 => "ARGON2",
        }
    }

    /// Case-insensitive lookup.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedAlgorithm`] with the name as given.
    pub fn from_name(name: &str) -> Result<Self> {
        let upper = name.to_uppercase();
        Self::ALL
            .into_iter()
            .find(|algorithm| algorithm.name() == upper)
            .ok_or_else(|| Error::UnsupportedAlgorithm(name.to_string()))
    }

    /// Normalizes `partial` with this algorithm's rules.
    pub fn normalize(self, partial: &PartialSpec) -> Result<KdfSpec> {
        Ok(match self {
            Algorithm::Bcrypt => Bcrypt::normalize_spec(partial)?.into(),
            Algorithm::Pbkdf2 => Pbkdf2::normalize_spec(partial)?.into(),
            Algorithm::Scrypt => Scrypt::normalize_spec(partial)?.into(),
            Algorithm::Hmac => Hmac::normalize_spec(partial)?.into(),
            Algorithm::Argon2 => Argon2::normalize_spec(partial)?.into(),
        })
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Algorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_name(s)
    }
}

/// A numeric spec field as supplied: a JSON number or its text form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Param {
    Int(i64),
    Float(f64),
    Text(String),
}

impl From<i64> for Param {
    fn from(v: i64) -> Self {
        Param::Int(v)
    }
}

impl From<i32> for Param {
    fn from(v: i32) -> Self {
        Param::Int(v.into())
    }
}

impl From<u32> for Param {
    fn from(v: u32) -> Self {
        Param::Int(v.into())
    }
}

impl From<u64> for Param {
    fn from(v: u64) -> Self {
        i64::try_from(v).map_or(Param::Float(v as f64), Param::Int)
    }
}

impl From<usize> for Param {
    fn from(v: usize) -> Self {
        Param::from(v as u64)
    }
}

impl From<f64> for Param {
    fn from(v: f64) -> Self {
        Param::Float(v)
    }
}

impl From<&str> for Param {
    fn from(v: &str) -> Self {
        Param::Text(v.to_string())
    }
}

impl From<String> for Param {
    fn from(v: String) -> Self {
        Param::Text(v)
    }
}

/// Caller-supplied, not yet validated spec.
///
/// Fields that do not apply to the selected algorithm are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PartialSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub algorithm: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rounds: Option<Param>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iterations: Option<Param>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpu_memory_cost: Option<Param>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_size: Option<Param>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parallelization: Option<Param>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory_cost: Option<Param>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_cost: Option<Param>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parallelism: Option<Param>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub derived_key_length: Option<Param>,
}

impl PartialSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_algorithm(mut self, algorithm: impl Into<String>) -> Self {
        self.algorithm = Some(algorithm.into());
        self
    }

    pub fn with_hash(mut self, hash: impl Into<String>) -> Self {
        self.hash = Some(hash.into());
        self
    }

    pub fn with_rounds(mut self, rounds: impl Into<Param>) -> Self {
        self.rounds = Some(rounds.into());
        self
    }

    pub fn with_iterations(mut self, iterations: impl Into<Param>) -> Self {
        self.iterations = Some(iterations.into());
        self
    }

    pub fn with_cpu_memory_cost(mut self, cost: impl Into<Param>) -> Self {
        self.cpu_memory_cost = Some(cost.into());
        self
    }

    pub fn with_block_size(mut self, block_size: impl Into<Param>) -> Self {
        self.block_size = Some(block_size.into());
        self
    }

    pub fn with_parallelization(mut self, parallelization: impl Into<Param>) -> Self {
        self.parallelization = Some(parallelization.into());
        self
    }

    pub fn with_memory_cost(mut self, kib: impl Into<Param>) -> Self {
        self.memory_cost = Some(kib.into());
        self
    }

    pub fn with_time_cost(mut self, time_cost: impl Into<Param>) -> Self {
        self.time_cost = Some(time_cost.into());
        self
    }

    pub fn with_parallelism(mut self, parallelism: impl Into<Param>) -> Self {
        self.parallelism = Some(parallelism.into());
        self
    }

    pub fn with_derived_key_length(mut self, len: impl Into<Param>) -> Self {
        self.derived_key_length = Some(len.into());
        self
    }
}

/// A normalized, validated spec, tagged by algorithm.
///
/// Serialization goes through [`PartialSpec`], so the JSON carries exactly the
/// algorithm's canonical fields; deserialization re-runs validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "PartialSpec", into = "PartialSpec")]
pub enum KdfSpec {
    Bcrypt(BcryptSpec),
    Pbkdf2(Pbkdf2Spec),
    Scrypt(ScryptSpec),
    Hmac(HmacSpec),
    Argon2(Argon2Spec),
}

impl KdfSpec {
    pub fn algorithm(&self) -> Algorithm {
        match self {
            KdfSpec::Bcrypt(_) => Algorithm::Bcrypt,
            KdfSpec::Pbkdf2(_) => Algorithm::Pbkdf2,
            KdfSpec::Scrypt(_) => Algorithm::Scrypt,
            KdfSpec::Hmac(_) => Algorithm::Hmac,
            KdfSpec::Argon2(_) => Algorithm::Argon2,
        }
    }

    pub fn hash(&self) -> Option<HashAlgorithm> {
        match self {
            KdfSpec::Bcrypt(spec) => spec.hash(),
            KdfSpec::Pbkdf2(spec) => Some(spec.hash()),
            KdfSpec::Scrypt(spec) => Some(spec.hash()),
            KdfSpec::Hmac(spec) => Some(spec.hash()),
            KdfSpec::Argon2(_) => None,
        }
    }

    /// Length of the derived key in bytes.
    pub fn derived_key_length(&self) -> usize {
        match self {
            KdfSpec::Bcrypt(_) => crate::crypto::BCRYPT_HASH_LEN,
            KdfSpec::Pbkdf2(spec) => spec.derived_key_length(),
            KdfSpec::Scrypt(spec) => spec.derived_key_length(),
            KdfSpec::Hmac(spec) => spec.derived_key_length(),
            KdfSpec::Argon2(spec) => spec.derived_key_length(),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::from(self)
    }
}

impl fmt::Display for KdfSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_json().to_string())
    }
}

impl TryFrom<PartialSpec> for KdfSpec {
    type Error = Error;

    fn try_from(partial: PartialSpec) -> Result<Self> {
        let name = partial
            .algorithm
            .as_deref()
            .filter(|name| !name.is_empty())
            .ok_or(Error::MissingAlgorithm)?;
        Algorithm::from_name(name)?.normalize(&partial)
    }
}

impl From<&KdfSpec> for PartialSpec {
    fn from(spec: &KdfSpec) -> Self {
        let base = PartialSpec::new().with_algorithm(spec.algorithm().name());
        match spec {
            KdfSpec::Bcrypt(s) => {
                let base = base.with_rounds(s.rounds());
                match s.hash() {
                    Some(hash) => base.with_hash(hash.name()),
                    None => base,
                }
            }
            KdfSpec::Pbkdf2(s) => base
                .with_hash(s.hash().name())
                .with_iterations(s.iterations())
                .with_derived_key_length(s.derived_key_length()),
            KdfSpec::Scrypt(s) => base
                .with_hash(s.hash().name())
                .with_cpu_memory_cost(s.cpu_memory_cost())
                .with_block_size(s.block_size())
                .with_parallelization(s.parallelization())
                .with_derived_key_length(s.derived_key_length()),
            KdfSpec::Hmac(s) => base
                .with_hash(s.hash().name())
                .with_derived_key_length(s.derived_key_length()),
            KdfSpec::Argon2(s) => base
                .with_memory_cost(s.memory_cost())
                .with_time_cost(s.time_cost())
                .with_parallelism(s.parallelism())
                .with_derived_key_length(s.derived_key_length()),
        }
    }
}

impl From<KdfSpec> for PartialSpec {
    fn from(spec: KdfSpec) -> Self {
        PartialSpec::from(&spec)
    }
}

impl From<&KdfSpec> for serde_json::Value {
    fn from(spec: &KdfSpec) -> Self {
        serde_json::to_value(PartialSpec::from(spec)).unwrap_or(serde_json::Value::Null)
    }
}

impl From<BcryptSpec> for KdfSpec {
    fn from(spec: BcryptSpec) -> Self {
        KdfSpec::Bcrypt(spec)
    }
}

impl From<Pbkdf2Spec> for KdfSpec {
    fn from(spec: Pbkdf2Spec) -> Self {
        KdfSpec::Pbkdf2(spec)
    }
}

impl From<ScryptSpec> for KdfSpec {
    fn from(spec: ScryptSpec) -> Self {
        KdfSpec::Scrypt(spec)
    }
}

impl From<HmacSpec> for KdfSpec {
    fn from(spec: HmacSpec) -> Self {
        KdfSpec::Hmac(spec)
    }
}

impl From<Argon2Spec> for KdfSpec {
    fn from(spec: Argon2Spec) -> Self {
        KdfSpec::Argon2(spec)
    }
}

pub(crate) fn invalid(reason: impl Into<String>) -> Error {
    Error::InvalidSpec(reason.into())
}

/// Fails unless `partial` names `expected` (or names nothing).
pub(crate) fn check_algorithm(partial: &PartialSpec, expected: Algorithm) -> Result<()> {
    match partial.algorithm.as_deref().filter(|name| !name.is_empty()) {
        Some(name) if name.to_uppercase() != expected.name() => {
            Err(invalid(format!("Algorithm must be {expected}")))
        }
        _ => Ok(()),
    }
}

/// The named hash, or `default` when none is given.
pub(crate) fn hash_or(partial: &PartialSpec, default: HashAlgorithm) -> Result<HashAlgorithm> {
    match partial.hash.as_deref().filter(|name| !name.is_empty()) {
        Some(name) => hashes::validate(name),
        None => Ok(default),
    }
}

/// Coerces a numeric field.
///
/// `None` means "use the default": the field was absent, zero, or blank text.
pub(crate) fn integer(field: &str, param: Option<&Param>) -> Result<Option<i64>> {
    let value = match param {
        None | Some(Param::Int(0)) => return Ok(None),
        Some(Param::Int(v)) => return Ok(Some(*v)),
        Some(Param::Float(v)) => *v,
        Some(Param::Text(text)) => {
            let text = text.trim();
            if text.is_empty() {
                return Ok(None);
            }
            text.parse::<f64>()
                .map_err(|_| invalid(format!("{field} is not a number")))?
        }
    };

    if !value.is_finite() {
        return Err(invalid(format!("{field} is not a number")));
    }
    if value.fract() != 0.0 {
        return Err(invalid(format!("{field} is not an integer")));
    }
    if value == 0.0 {
        return Ok(None);
    }
    Ok(Some(value as i64))
}

/// Narrows an already range-checked value.
pub(crate) fn narrow<T: TryFrom<i64>>(field: &str, value: i64) -> Result<T> {
    T::try_from(value).map_err(|_| invalid(format!("{field} is too large")))
}

/// Caps a derived key length already known to be positive.
pub(crate) fn key_length(len: i64) -> Result<usize> {
    if len > MAX_KEY_LEN as i64 {
        return Err(invalid(format!("Derived key length must be at most {MAX_KEY_LEN}")));
    }
    narrow("Derived key length", len)
}
