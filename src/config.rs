//! Derivator configuration from the environment or a JSON file.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use crate::spec::PartialSpec;

pub const ALGORITHM_VAR: &str = "KDF_ALGORITHM";
pub const SPEC_VAR: &str = "KDF_SPEC";
pub const SECURE_RANDOM_VAR: &str = "KDF_SECURE_RANDOM";

/// Which derivator to build and how it draws salts.
///
/// When both are set, `spec` wins over `algorithm`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub algorithm: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spec: Option<PartialSpec>,
    pub secure_random: bool,
}

impl Config {
    /// Reads `KDF_ALGORITHM`, `KDF_SPEC` and `KDF_SECURE_RANDOM`, loading a
    /// `.env` file first when there is one.
    pub fn from_env() -> Result<Self> {
        // a missing .env is fine
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) over an arbitrary lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let algorithm = lookup(ALGORITHM_VAR).filter(|name| !name.trim().is_empty());

        let spec = match lookup(SPEC_VAR).filter(|text| !text.trim().is_empty()) {
            Some(text) => Some(
                serde_json::from_str::<PartialSpec>(&text)
                    .with_context(|| format!("{SPEC_VAR} is not a JSON spec object"))?,
            ),
            None => None,
        };

        let secure_random = match lookup(SECURE_RANDOM_VAR) {
            Some(value) => {
                parse_flag(&value).with_context(|| format!("invalid {SECURE_RANDOM_VAR}"))?
            }
            None => false,
        };

        Ok(Self {
            algorithm,
            spec,
            secure_random,
        })
    }

    /// Reads a JSON document shaped like [`Config`].
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("failed to parse config {}", path.display()))
    }
}

fn parse_flag(value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "" | "0" | "false" | "no" | "off" => Ok(false),
        "1" | "true" | "yes" | "on" => Ok(true),
        other => bail!("expected a boolean flag, got {other:?}"),
    }
}
