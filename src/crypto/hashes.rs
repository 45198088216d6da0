//! Digest catalog.
//!
//! Validates hash names (case-insensitively) against the digests this crate
//! links in and reports each digest's native output length. The table is
//! built once, on first use, and is read-only afterwards.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use digest::Digest;
use once_cell::sync::Lazy;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Error, Result};

/// A digest algorithm usable by the HMAC based plugins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HashAlgorithm {
    Sha1,
    Sha224,
    Sha256,
    Sha384,
    Sha512,
    Sha512_224,
    Sha512_256,
    Sha3_224,
    Sha3_256,
    Sha3_384,
    Sha3_512,
}

/// Runs `$body` with the type alias `$d` bound to the digest behind `$hash`.
macro_rules! with_digest {
    ($hash:expr, $d:ident => $body:expr) => {{
        use $crate::crypto::hashes::HashAlgorithm as H;
        match $hash {
            H::Sha1 => {
                type $d = ::sha1::Sha1;
                $body
            }
            H::Sha224 => {
                type $d = ::sha2::Sha224;
                $body
            }
            H::Sha256 => {
                type $d = ::sha2::Sha256;
                $body
            }
            H::Sha384 => {
                type $d = ::sha2::Sha384;
                $body
            }
            H::Sha512 => {
                type $d = ::sha2::Sha512;
                $body
            }
            H::Sha512_224 => {
                type $d = ::sha2::Sha512_224;
                $body
            }
            H::Sha512_256 => {
                type $d = ::sha2::Sha512_256;
                $body
            }
            H::Sha3_224 => {
                type $d = ::sha3::Sha3_224;
                $body
            }
            H::Sha3_256 => {
                type $d = ::sha3::Sha3_256;
                $body
            }
            H::Sha3_384 => {
                type $d = ::sha3::Sha3_384;
                $body
            }
            H::Sha3_512 => {
                type $d = ::sha3::Sha3_512;
                $body
            }
        }
    }};
}
pub(crate) use with_digest;

const ALL: [HashAlgorithm; 11] = [
    HashAlgorithm::Sha1,
    HashAlgorithm::Sha224,
    HashAlgorithm::Sha256,
    HashAlgorithm::Sha384,
    HashAlgorithm::Sha512,
    HashAlgorithm::Sha512_224,
    HashAlgorithm::Sha512_256,
    HashAlgorithm::Sha3_224,
    HashAlgorithm::Sha3_256,
    HashAlgorithm::Sha3_384,
    HashAlgorithm::Sha3_512,
];

// canonical name -> (hash, digest length)
static CATALOG: Lazy<HashMap<&'static str, (HashAlgorithm, usize)>> = Lazy::new(|| {
    ALL.iter()
        .map(|&hash| {
            let len = with_digest!(hash, D => <D as Digest>::output_size());
            (hash.name(), (hash, len))
        })
        .collect()
});

impl HashAlgorithm {
    /// Canonical, upper-cased name.
    pub fn name(self) -> &'static str {
        match self {
            HashAlgorithm::Sha1 => "SHA1",
            HashAlgorithm::Sha224 => "SHA224",
            HashAlgorithm::Sha256 => "SHA256",
            HashAlgorithm::Sha384 => "SHA384",
            HashAlgorithm::Sha512 => "SHA512",
            HashAlgorithm::Sha512_224 => "SHA512-224",
            HashAlgorithm::Sha512_256 => "SHA512-256",
            HashAlgorithm::Sha3_224 => "SHA3-224",
            HashAlgorithm::Sha3_256 => "SHA3-256",
            HashAlgorithm::Sha3_384 => "SHA3-384",
            HashAlgorithm::Sha3_512 => "SHA3-512",
        }
    }

    /// Native digest length in bytes.
    pub fn digest_len(self) -> usize {
        CATALOG.get(self.name()).map_or(0, |&(_, len)| len)
    }
}

/// Resolves `name` (any case) to a supported digest.
///
/// # Errors
///
/// Returns [`Error::UnknownHash`] carrying the name as given.
pub fn validate(name: &str) -> Result<HashAlgorithm> {
    CATALOG
        .get(name.to_uppercase().as_str())
        .map(|&(hash, _)| hash)
        .ok_or_else(|| Error::UnknownHash(name.to_string()))
}

/// Digest length for a hash given by name.
pub fn digest_length(name: &str) -> Result<usize> {
    validate(name).map(HashAlgorithm::digest_len)
}

impl FromStr for HashAlgorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        validate(s)
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for HashAlgorithm {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for HashAlgorithm {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        validate(&name).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_is_case_insensitive() {
        assert_eq!(validate("sha256").unwrap(), HashAlgorithm::Sha256);
        assert_eq!(validate("Sha3-512").unwrap(), HashAlgorithm::Sha3_512);
        assert_eq!(validate("SHA512-224").unwrap().name(), "SHA512-224");
    }

    #[test]
    fn unknown_hash_keeps_name_as_given() {
        let err = validate("silly-hash").unwrap_err();
        assert!(matches!(err, Error::UnknownHash(ref n) if n == "silly-hash"));
        assert_eq!(err.to_string(), "Unknown hash silly-hash");
    }

    #[test]
    fn digest_lengths_match_native_output() {
        assert_eq!(digest_length("sha1").unwrap(), 20);
        assert_eq!(digest_length("SHA224").unwrap(), 28);
        assert_eq!(digest_length("SHA256").unwrap(), 32);
        assert_eq!(digest_length("SHA384").unwrap(), 48);
        assert_eq!(digest_length("SHA512").unwrap(), 64);
        assert_eq!(digest_length("SHA512-256").unwrap(), 32);
        assert_eq!(digest_length("SHA3-384").unwrap(), 48);
        assert!(digest_length("MD4").is_err());
    }

    #[test]
    fn serde_uses_canonical_names() {
        let json = serde_json::to_string(&HashAlgorithm::Sha3_256).unwrap();
        assert_eq!(json, "\"SHA3-256\"");
        let parsed: HashAlgorithm = serde_json::from_str("\"sha512\"").unwrap();
        assert_eq!(parsed, HashAlgorithm::Sha512);
        assert!(serde_json::from_str::<HashAlgorithm>("\"whirlpool\"").is_err());
    }
}
