use futures::executor::block_on;
use kdfspec::{KdfSpec, KeyDerivator, PartialSpec};
use proptest::prelude::*;

fn renormalized(spec: &KdfSpec) -> KdfSpec {
    KdfSpec::try_from(PartialSpec::from(spec)).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn bcrypt_specs_are_stable(
        rounds in 4i64..=31,
        hash in prop::sample::select(vec!["", "sha1", "Sha512"]),
    ) {
        let spec = KdfSpec::try_from(
            PartialSpec::new().with_algorithm("bcrypt").with_rounds(rounds).with_hash(hash),
        )
        .unwrap();
        prop_assert_eq!(renormalized(&spec), spec);
    }

    #[test]
    fn pbkdf2_specs_are_stable(
        iterations in 1i64..10_000_000,
        len in 1i64..512,
        hash in prop::sample::select(vec!["sha1", "SHA256", "sha512", "sha3-256", "SHA512-224"]),
    ) {
        let spec = KdfSpec::try_from(
            PartialSpec::new()
                .with_algorithm("PBKDF2")
                .with_hash(hash)
                .with_iterations(iterations)
                .with_derived_key_length(len),
        )
        .unwrap();
        prop_assert_eq!(renormalized(&spec), spec);
        prop_assert_eq!(spec.derived_key_length(), len as usize);
    }

    #[test]
    fn scrypt_specs_are_stable(log_n in 1u32..16, r in 1i64..64, p in 1i64..64, len in 1i64..128) {
        let spec = KdfSpec::try_from(
            PartialSpec::new()
                .with_algorithm("scrypt")
                .with_cpu_memory_cost(1i64 << log_n)
                .with_block_size(r)
                .with_parallelization(p)
                .with_derived_key_length(len),
        )
        .unwrap();
        prop_assert_eq!(renormalized(&spec), spec);
    }

    #[test]
    fn hmac_specs_are_stable(len in 1i64..=64) {
        let spec = KdfSpec::try_from(
            PartialSpec::new()
                .with_algorithm("hmac")
                .with_hash("SHA512")
                .with_derived_key_length(len),
        )
        .unwrap();
        prop_assert_eq!(renormalized(&spec), spec);
    }

    #[test]
    fn numbers_as_text_normalize_like_numbers(iterations in 1i64..1_000_000) {
        let as_number = KdfSpec::try_from(
            PartialSpec::new().with_algorithm("pbkdf2").with_iterations(iterations),
        )
        .unwrap();
        let as_text = KdfSpec::try_from(
            PartialSpec::new().with_algorithm("pbkdf2").with_iterations(iterations.to_string()),
        )
        .unwrap();
        prop_assert_eq!(as_text, as_number);
    }
}

#[test]
fn every_algorithm_is_deterministic() {
    let specs = [
        PartialSpec::new().with_algorithm("bcrypt").with_rounds(4),
        PartialSpec::new().with_algorithm("pbkdf2").with_iterations(10),
        PartialSpec::new().with_algorithm("scrypt").with_cpu_memory_cost(16).with_block_size(1),
        PartialSpec::new().with_algorithm("hmac"),
        PartialSpec::new()
            .with_algorithm("argon2")
            .with_memory_cost(64)
            .with_time_cost(1),
    ];
    for partial in specs {
        let kdf = KeyDerivator::new(partial).unwrap();
        let salt = vec![9u8; kdf.salt_length()];
        let a = block_on(kdf.derive_key_with_salt("secret", &salt)).unwrap();
        let b = block_on(kdf.derive_key_with_salt("secret", &salt)).unwrap();
        assert_eq!(a, b, "{}", kdf.algorithm());
        assert_eq!(a.derived_key().len(), a.kdf_spec().derived_key_length());
    }
}
