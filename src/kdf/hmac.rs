use ::hmac::{Hmac as Keyed, Mac};

use super::KdfPlugin;
use crate::crypto::hashes::{HashAlgorithm, with_digest};
use crate::error::{Error, Result};
use crate::spec::{self, Algorithm, PartialSpec};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HmacSpec {
    hash: HashAlgorithm,
    derived_key_length: usize,
}

impl Default for HmacSpec {
    fn default() -> Self {
        Self {
            hash: HashAlgorithm::Sha256,
            derived_key_length: HashAlgorithm::Sha256.digest_len(),
        }
    }
}

impl HmacSpec {
    pub fn hash(&self) -> HashAlgorithm {
        self.hash
    }

    /// At most the digest length; longer digests are truncated to it.
    pub fn derived_key_length(&self) -> usize {
        self.derived_key_length
    }
}

/// A single keyed hash: the salt is the key, the secret the message.
pub struct Hmac;

impl KdfPlugin for Hmac {
    const ALGORITHM: Algorithm = Algorithm::Hmac;
    type Spec = HmacSpec;

    fn normalize_spec(partial: &PartialSpec) -> Result<HmacSpec> {
        spec::check_algorithm(partial, Algorithm::Hmac)?;
        let hash = spec::hash_or(partial, HashAlgorithm::Sha256)?;
        let digest_len = hash.digest_len();

        let derived_key_length =
            match spec::integer("Derived key length", partial.derived_key_length.as_ref())? {
                None => digest_len,
                Some(len) if len < 1 => {
                    return Err(spec::invalid(
                        "Derived key length must be a number greater than zero",
                    ));
                }
                Some(len) if len > digest_len as i64 => {
                    return Err(spec::invalid(format!(
                        "Derived key length must be a number greater less than {digest_len}"
                    )));
                }
                Some(len) => spec::narrow("Derived key length", len)?,
            };

        Ok(HmacSpec {
            hash,
            derived_key_length,
        })
    }

    fn salt_length(spec: &HmacSpec) -> usize {
        spec.hash.digest_len()
    }

    fn invoke_primitive(secret: &[u8], salt: &[u8], spec: &HmacSpec) -> Result<Vec<u8>> {
        let mut key = with_digest!(spec.hash, D => {
            let mut mac = <Keyed<D> as Mac>::new_from_slice(salt)
                .map_err(|e| Error::Primitive(format!("hmac rejected its key: {e}")))?;
            mac.update(secret);
            mac.finalize().into_bytes().to_vec()
        });
        key.truncate(spec.derived_key_length);
        Ok(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kdf::BaseKdf;
    use futures::executor::block_on;

    fn reason(partial: PartialSpec) -> String {
        match Hmac::normalize_spec(&partial) {
            Err(Error::InvalidSpec(reason)) => reason,
            other => panic!("expected InvalidSpec, got {other:?}"),
        }
    }

    #[test]
    fn default_spec() {
        let spec = BaseKdf::<Hmac>::default_spec();
        assert_eq!(spec.hash(), HashAlgorithm::Sha256);
        assert_eq!(spec.derived_key_length(), 32);
    }

    #[test]
    fn derived_key_length_bounds() {
        assert_eq!(
            reason(PartialSpec::new().with_derived_key_length(-1)),
            "Derived key length must be a number greater than zero"
        );
        assert_eq!(
            reason(PartialSpec::new().with_derived_key_length(33)),
            "Derived key length must be a number greater less than 32"
        );
        assert_eq!(
            reason(PartialSpec::new().with_hash("SHA1").with_derived_key_length(21)),
            "Derived key length must be a number greater less than 20"
        );
        assert_eq!(reason(PartialSpec::new().with_algorithm("HMAX")), "Algorithm must be HMAC");
        let full = Hmac::normalize_spec(&PartialSpec::new().with_derived_key_length(32)).unwrap();
        assert_eq!(full.derived_key_length(), 32);
    }

    #[test]
    fn known_digest() {
        let kdf = BaseKdf::<Hmac>::default();
        let result = block_on(kdf.derive_key_with_salt("password", "salt")).unwrap();
        assert_eq!(
            hex::encode(result.derived_key()),
            "84ec44c7d6fc41917953a1dafca3c7d7856f7a9d0328b991b76f0d36be1224b9"
        );
    }

    #[test]
    fn truncates_to_requested_length() {
        let full = Hmac::invoke_primitive(b"password", b"salt", &HmacSpec::default()).unwrap();
        let spec = Hmac::normalize_spec(&PartialSpec::new().with_derived_key_length(16)).unwrap();
        let short = Hmac::invoke_primitive(b"password", b"salt", &spec).unwrap();
        assert_eq!(short, full[..16]);
    }

    #[test]
    fn every_catalog_hash_works() {
        for name in ["SHA1", "SHA224", "SHA384", "SHA512-256", "SHA3-256", "SHA3-512"] {
            let spec = Hmac::normalize_spec(&PartialSpec::new().with_hash(name)).unwrap();
            let key = Hmac::invoke_primitive(b"password", b"salt", &spec).unwrap();
            assert_eq!(key.len(), spec.hash().digest_len(), "{name}");
        }
    }
}
