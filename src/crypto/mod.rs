//! Cryptographic helpers shared by every plugin.
//!
//! Provides the digest catalog, bcrypt's base64 dialect and salt generation.

pub mod alphabet;
pub mod hashes;
pub mod random;

pub use hashes::HashAlgorithm;
pub use random::{SaltSource, generate_salt};

/// Length of a bcrypt salt (16 bytes).
pub const BCRYPT_SALT_LEN: usize = 16;
/// Length of the cipher text bcrypt emits after its salt (23 bytes).
pub const BCRYPT_HASH_LEN: usize = 23;
/// Length of an Argon2 salt (16 bytes).
pub const ARGON2_SALT_LEN: usize = 16;
/// Default derived key length for scrypt and Argon2 (32 bytes / 256 bits).
pub const KEY_LEN: usize = 32;
/// Longest derived key any plugin produces (2^32 - 1 bytes).
pub const MAX_KEY_LEN: usize = u32::MAX as usize;
