//! Bcrypt as a key derivation function.
//!
//! The primitive only speaks the `$2a$NN$<salt><hash>` text format, so the
//! salt goes in through bcrypt's base64 dialect and the 23 cipher bytes come
//! back out the same way.

use ::bcrypt::{Version, hash_with_salt};

use super::{DerivedKey, KdfPlugin};
use crate::crypto::hashes::HashAlgorithm;
use crate::crypto::{BCRYPT_HASH_LEN, BCRYPT_SALT_LEN, alphabet};
use crate::error::{Error, Result};
use crate::spec::{self, Algorithm, KdfSpec, PartialSpec};

pub const DEFAULT_ROUNDS: u32 = 10;
pub const MIN_ROUNDS: u32 = 4;
pub const MAX_ROUNDS: u32 = 31;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BcryptSpec {
    rounds: u32,
    hash: Option<HashAlgorithm>,
}

impl Default for BcryptSpec {
    fn default() -> Self {
        Self {
            rounds: DEFAULT_ROUNDS,
            hash: None,
        }
    }
}

impl BcryptSpec {
    /// Cost factor; the cipher runs `2^rounds` key expansions.
    pub fn rounds(&self) -> u32 {
        self.rounds
    }

    /// Informational only, bcrypt does not use it.
    pub fn hash(&self) -> Option<HashAlgorithm> {
        self.hash
    }
}

pub struct Bcrypt;

impl KdfPlugin for Bcrypt {
    const ALGORITHM: Algorithm = Algorithm::Bcrypt;
    type Spec = BcryptSpec;

    fn normalize_spec(partial: &PartialSpec) -> Result<BcryptSpec> {
        spec::check_algorithm(partial, Algorithm::Bcrypt)?;

        let hash = match partial.hash.as_deref().filter(|name| !name.is_empty()) {
            Some(name) => Some(crate::crypto::hashes::validate(name)?),
            None => None,
        };

        let rounds = spec::integer("Rounds", partial.rounds.as_ref())?
            .unwrap_or(i64::from(DEFAULT_ROUNDS));
        if rounds < i64::from(MIN_ROUNDS) || rounds > i64::from(MAX_ROUNDS) {
            return Err(spec::invalid(format!(
                "Rounds must be a number between {MIN_ROUNDS} and {MAX_ROUNDS}"
            )));
        }

        Ok(BcryptSpec {
            rounds: spec::narrow("Rounds", rounds)?,
            hash,
        })
    }

    fn salt_length(_spec: &BcryptSpec) -> usize {
        BCRYPT_SALT_LEN
    }

    fn invoke_primitive(secret: &[u8], salt: &[u8], spec: &BcryptSpec) -> Result<Vec<u8>> {
        let salt: [u8; BCRYPT_SALT_LEN] = salt.try_into().map_err(|_| {
            Error::InvalidSalt(format!(
                "Salt must be precisely {BCRYPT_SALT_LEN} bytes, got {}",
                salt.len()
            ))
        })?;

        let prefix = prefix(spec.rounds, &salt);
        let hashed = hash_with_salt(secret, spec.rounds, salt)?.format_for_version(Version::TwoA);

        let Some(cipher) = hashed.strip_prefix(prefix.as_str()) else {
            tracing::warn!(
                rounds = spec.rounds,
                "bcrypt output does not carry the requested prefix"
            );
            return Err(Error::PrimitiveMismatch("bcrypt: no prefix match".into()));
        };

        let key = alphabet::decode(cipher)?;
        if key.len() != BCRYPT_HASH_LEN {
            tracing::warn!(len = key.len(), "bcrypt output has the wrong size");
            return Err(Error::InvalidPrimitiveOutput(format!(
                "bcrypt: invalid derived key size {}",
                key.len()
            )));
        }
        Ok(key)
    }
}

/// `$2a$NN$` followed by the encoded salt.
fn prefix(rounds: u32, salt: &[u8]) -> String {
    format!("$2a${rounds:02}${}", alphabet::encode(salt))
}

/// Reassembles the bcrypt hash string a bcrypt derivation stands for.
///
/// Returns `None` for results of other algorithms.
pub fn format_hash(result: &DerivedKey) -> Option<String> {
    match result.kdf_spec() {
        KdfSpec::Bcrypt(spec) => Some(format!(
            "{}{}",
            prefix(spec.rounds(), result.salt()),
            alphabet::encode(result.derived_key())
        )),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kdf::BaseKdf;
    use futures::executor::block_on;

    fn normalize(partial: PartialSpec) -> Result<BcryptSpec> {
        Bcrypt::normalize_spec(&partial)
    }

    fn reason(err: Error) -> String {
        match err {
            Error::InvalidSpec(reason) => reason,
            other => panic!("expected InvalidSpec, got {other:?}"),
        }
    }

    #[test]
    fn default_spec() {
        let spec = BaseKdf::<Bcrypt>::default_spec();
        assert_eq!(spec.rounds(), 10);
        assert_eq!(spec.hash(), None);
        assert_eq!(
            KdfSpec::from(spec).to_json(),
            serde_json::json!({ "algorithm": "BCRYPT", "rounds": 10 })
        );
    }

    #[test]
    fn custom_spec() {
        let spec = normalize(PartialSpec::new().with_hash("sha512").with_rounds(31)).unwrap();
        assert_eq!(
            KdfSpec::from(spec).to_json(),
            serde_json::json!({ "algorithm": "BCRYPT", "hash": "SHA512", "rounds": 31 })
        );
    }

    #[test]
    fn wrong_algorithm() {
        let err = normalize(PartialSpec::new().with_algorithm("BCRYP")).unwrap_err();
        assert_eq!(reason(err), "Algorithm must be BCRYPT");
    }

    #[test]
    fn wrong_hash() {
        let err = normalize(PartialSpec::new().with_hash("silly-hash")).unwrap_err();
        assert!(matches!(err, Error::UnknownHash(ref h) if h == "silly-hash"));
    }

    #[test]
    fn rounds_boundaries() {
        for rounds in [3, 32, -1] {
            let err = normalize(PartialSpec::new().with_rounds(rounds)).unwrap_err();
            assert_eq!(reason(err), "Rounds must be a number between 4 and 31");
        }
        assert_eq!(normalize(PartialSpec::new().with_rounds(4)).unwrap().rounds(), 4);
        assert_eq!(normalize(PartialSpec::new().with_rounds(31)).unwrap().rounds(), 31);
    }

    #[test]
    fn rounds_type_error_comes_first() {
        let err = normalize(PartialSpec::new().with_rounds("lots")).unwrap_err();
        assert_eq!(reason(err), "Rounds is not a number");
        let err = normalize(PartialSpec::new().with_rounds(f64::NAN)).unwrap_err();
        assert_eq!(reason(err), "Rounds is not a number");
    }

    #[test]
    fn salt_must_be_sixteen_bytes() {
        let spec = normalize(PartialSpec::new().with_rounds(4)).unwrap();
        for len in [0, 15, 17, 32] {
            let err = Bcrypt::invoke_primitive(b"password", &vec![0u8; len], &spec).unwrap_err();
            assert!(matches!(err, Error::InvalidSalt(_)), "length {len}");
        }
    }

    #[test]
    fn prefix_pads_cost() {
        assert!(prefix(5, &[0u8; 16]).starts_with("$2a$05$"));
        assert!(prefix(12, &[0u8; 16]).starts_with("$2a$12$"));
        assert_eq!(prefix(4, &[0u8; 16]).len(), 7 + 22);
    }

    #[test]
    fn hash_and_verify() {
        let partial = PartialSpec::new().with_algorithm("BCRYPT").with_rounds(5);
        let kdf = BaseKdf::<Bcrypt>::new(&partial).unwrap();
        let first = block_on(kdf.derive_key("password")).unwrap();
        assert_eq!(first.salt().len(), 16);
        assert_eq!(first.derived_key().len(), 23);

        let again = BaseKdf::<Bcrypt>::new(&PartialSpec::from(first.kdf_spec())).unwrap();
        let second = block_on(again.derive_key_with_salt("password", first.salt())).unwrap();
        assert_eq!(second, first);
    }

    #[test]
    fn format_hash_rebuilds_the_bcrypt_string() {
        let kdf = BaseKdf::<Bcrypt>::new(&PartialSpec::new().with_rounds(4)).unwrap();
        let result = block_on(kdf.derive_key("pw")).unwrap();
        let text = format_hash(&result).unwrap();
        assert_eq!(text.len(), 60);
        assert!(::bcrypt::verify("pw", &text).unwrap());
    }
}
