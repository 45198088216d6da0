//! Algorithm plugins and the scaffolding they share.
//!
//! Each algorithm is a zero-sized [`KdfPlugin`] that knows how to normalize a
//! spec, how long its salts are and how to call its primitive. [`BaseKdf`]
//! wraps one plugin with an immutable spec and handles everything else: salt
//! acquisition, offloading the primitive and shaping the result.

use std::fmt;
use std::marker::PhantomData;

use futures::executor::block_on;
use tokio::runtime::Handle;
use zeroize::{Zeroize, Zeroizing};

use crate::crypto::{SaltSource, generate_salt};
use crate::error::{Error, Result};
use crate::spec::{Algorithm, KdfSpec, PartialSpec};

pub mod argon2;
pub mod bcrypt;
pub mod hmac;
pub mod pbkdf2;
pub mod scrypt;

pub use self::argon2::{Argon2, Argon2Spec};
pub use self::bcrypt::{Bcrypt, BcryptSpec};
pub use self::hmac::{Hmac, HmacSpec};
pub use self::pbkdf2::{Pbkdf2, Pbkdf2Spec};
pub use self::scrypt::{Scrypt, ScryptSpec};

/// What every algorithm contributes to [`BaseKdf`].
pub trait KdfPlugin: Send + Sync + 'static {
    const ALGORITHM: Algorithm;

    type Spec: Copy + fmt::Debug + PartialEq + Default + Send + Sync + Into<KdfSpec> + 'static;

    /// Applies defaults and validates, failing on the first violated constraint.
    fn normalize_spec(partial: &PartialSpec) -> Result<Self::Spec>;

    /// Length of generated salts.
    fn salt_length(spec: &Self::Spec) -> usize;

    /// Calls the primitive. May run for a long time.
    fn invoke_primitive(secret: &[u8], salt: &[u8], spec: &Self::Spec) -> Result<Vec<u8>>;
}

/// One derivation policy: a plugin bound to a normalized spec.
///
/// The secure-random flag is the only mutable state; it is not part of the spec.
pub struct BaseKdf<P: KdfPlugin> {
    spec: P::Spec,
    salt_length: usize,
    secure_random: bool,
    _plugin: PhantomData<P>,
}

impl<P: KdfPlugin> BaseKdf<P> {
    /// Builds an instance from a partial spec.
    ///
    /// # Errors
    ///
    /// Returns the first validation error of the plugin's normalizer.
    pub fn new(partial: &PartialSpec) -> Result<Self> {
        let spec = P::normalize_spec(partial)?;
        Ok(Self::from_spec(spec))
    }

    /// Builds an instance around an already normalized spec.
    pub fn from_spec(spec: P::Spec) -> Self {
        let salt_length = P::salt_length(&spec);
        tracing::debug!(algorithm = %P::ALGORITHM, salt_length, "kdf ready");
        Self {
            spec,
            salt_length,
            secure_random: false,
            _plugin: PhantomData,
        }
    }

    /// The plugin's defaults, freshly built on every call.
    pub fn default_spec() -> P::Spec {
        P::Spec::default()
    }

    pub fn spec(&self) -> P::Spec {
        self.spec
    }

    pub fn kdf_spec(&self) -> KdfSpec {
        self.spec.into()
    }

    pub fn salt_length(&self) -> usize {
        self.salt_length
    }

    pub fn secure_random(&self) -> bool {
        self.secure_random
    }

    /// Selects OS entropy (`true`) or the userspace generator for new salts.
    pub fn set_secure_random(&mut self, secure: bool) {
        self.secure_random = secure;
    }

    pub fn with_secure_random(mut self, secure: bool) -> Self {
        self.secure_random = secure;
        self
    }

    /// Derives a key, generating a salt when none is given.
    pub async fn derive(&self, secret: &[u8], salt: Option<&[u8]>) -> Result<DerivedKey> {
        let salt = match salt {
            Some(salt) => salt.to_vec(),
            None => self.fresh_salt().await?,
        };

        let secret = Zeroizing::new(secret.to_vec());
        let spec = self.spec;
        let (salt, derived_key) = offload(move || {
            let key = P::invoke_primitive(&secret, &salt, &spec)?;
            Ok((salt, key))
        })
        .await?;

        tracing::debug!(algorithm = %P::ALGORITHM, key_len = derived_key.len(), "derived key");
        Ok(DerivedKey {
            salt,
            derived_key,
            kdf_spec: self.kdf_spec(),
        })
    }

    /// Derives a key under a freshly generated salt.
    pub async fn derive_key(&self, secret: impl AsRef<[u8]>) -> Result<DerivedKey> {
        self.derive(secret.as_ref(), None).await
    }

    /// Derives a key under the caller's salt, e.g. to verify a stored result.
    pub async fn derive_key_with_salt(
        &self,
        secret: impl AsRef<[u8]>,
        salt: impl AsRef<[u8]>,
    ) -> Result<DerivedKey> {
        self.derive(secret.as_ref(), Some(salt.as_ref())).await
    }

    /// Callback form of [`derive`](Self::derive).
    ///
    /// Blocks the calling thread; do not call it from inside an async task.
    pub fn derive_key_with<F>(&self, secret: &[u8], salt: Option<&[u8]>, callback: F)
    where
        F: FnOnce(Result<DerivedKey>),
    {
        callback(block_on(self.derive(secret, salt)));
    }

    async fn fresh_salt(&self) -> Result<Vec<u8>> {
        let len = self.salt_length;
        match SaltSource::from_flag(self.secure_random) {
            SaltSource::Pseudo => generate_salt(len, SaltSource::Pseudo),
            SaltSource::Secure => offload(move || generate_salt(len, SaltSource::Secure)).await,
        }
    }
}

impl<P: KdfPlugin> Default for BaseKdf<P> {
    fn default() -> Self {
        Self::from_spec(P::Spec::default())
    }
}

impl<P: KdfPlugin> Clone for BaseKdf<P> {
    fn clone(&self) -> Self {
        Self {
            spec: self.spec,
            salt_length: self.salt_length,
            secure_random: self.secure_random,
            _plugin: PhantomData,
        }
    }
}

impl<P: KdfPlugin> fmt::Debug for BaseKdf<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BaseKdf")
            .field("spec", &self.spec)
            .field("salt_length", &self.salt_length)
            .field("secure_random", &self.secure_random)
            .finish()
    }
}

/// Runs blocking work on tokio's blocking pool when a runtime is around,
/// inline otherwise.
async fn offload<T, F>(task: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    match Handle::try_current() {
        Ok(handle) => handle
            .spawn_blocking(task)
            .await
            .map_err(|e| Error::Task(e.to_string()))?,
        Err(_) => task(),
    }
}

/// Zeroed output buffer; running out of memory is an error, not an abort.
pub(crate) fn key_buffer(len: usize) -> Result<Vec<u8>> {
    let mut key = Vec::new();
    key.try_reserve_exact(len)
        .map_err(|e| Error::Primitive(format!("cannot allocate a {len} byte key: {e}")))?;
    key.resize(len, 0);
    Ok(key)
}

/// Outcome of one derivation: enough to repeat it later.
#[derive(Clone, PartialEq, Eq)]
pub struct DerivedKey {
    salt: Vec<u8>,
    derived_key: Vec<u8>,
    kdf_spec: KdfSpec,
}

impl DerivedKey {
    pub fn salt(&self) -> &[u8] {
        &self.salt
    }

    pub fn derived_key(&self) -> &[u8] {
        &self.derived_key
    }

    pub fn kdf_spec(&self) -> &KdfSpec {
        &self.kdf_spec
    }

    /// Splits the result into salt, key and spec.
    pub fn into_parts(mut self) -> (Vec<u8>, Zeroizing<Vec<u8>>, KdfSpec) {
        let salt = std::mem::take(&mut self.salt);
        let key = Zeroizing::new(std::mem::take(&mut self.derived_key));
        (salt, key, self.kdf_spec)
    }
}

impl fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DerivedKey")
            .field("salt_len", &self.salt.len())
            .field("derived_key_len", &self.derived_key.len())
            .field("kdf_spec", &self.kdf_spec)
            .finish()
    }
}

impl Drop for DerivedKey {
    fn drop(&mut self) {
        self.derived_key.zeroize();
    }
}

/// Secret or salt bytes taken from a JSON value.
///
/// Strings are used as UTF-8, arrays must hold byte values.
#[derive(Clone, PartialEq, Eq)]
pub struct Material(Zeroizing<Vec<u8>>);

impl Material {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for Material {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Material({} bytes)", self.0.len())
    }
}

impl TryFrom<&serde_json::Value> for Material {
    type Error = Error;

    fn try_from(value: &serde_json::Value) -> Result<Self> {
        use serde_json::Value;

        match value {
            Value::String(text) => Ok(Material(Zeroizing::new(text.as_bytes().to_vec()))),
            Value::Array(items) => items
                .iter()
                .map(|item| {
                    item.as_u64()
                        .and_then(|b| u8::try_from(b).ok())
                        .ok_or_else(|| Error::InvalidArgument(format!("{item} is not a byte")))
                })
                .collect::<Result<Vec<u8>>>()
                .map(|bytes| Material(Zeroizing::new(bytes))),
            other => Err(Error::InvalidArgument(format!(
                "expected a string or byte array, got {}",
                json_type(other)
            ))),
        }
    }
}

pub(crate) fn json_type(value: &serde_json::Value) -> &'static str {
    use serde_json::Value;

    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
