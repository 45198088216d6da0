//! Uniform key derivation over bcrypt, PBKDF2, scrypt, HMAC and Argon2.
//!
//! Every derivation returns the salt and a self-describing spec next to the
//! key, so the same key can be derived again later:
//!
//! ```no_run
//! # async fn run() -> kdfspec::Result<()> {
//! use kdfspec::KeyDerivator;
//!
//! let kdf = KeyDerivator::new("pbkdf2")?.with_secure_random(true);
//! let stored = kdf.derive_key("password").await?;
//!
//! let again = KeyDerivator::new(kdfspec::PartialSpec::from(stored.kdf_spec()))?;
//! let check = again.derive_key_with_salt("password", stored.salt()).await?;
//! assert_eq!(check.derived_key(), stored.derived_key());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod crypto;
mod error;
pub mod kdf;
pub mod spec;

use futures::executor::block_on;
use serde_json::Value;

pub use crate::config::Config;
pub use crate::crypto::HashAlgorithm;
pub use crate::error::{Error, Result};
pub use crate::kdf::{
    Argon2, Argon2Spec, BaseKdf, Bcrypt, BcryptSpec, DerivedKey, Hmac, HmacSpec, KdfPlugin,
    Material, Pbkdf2, Pbkdf2Spec, Scrypt, ScryptSpec,
};
pub use crate::spec::{Algorithm, KdfSpec, Param, PartialSpec};

/// What a [`KeyDerivator`] is built from.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Selector {
    /// The default algorithm with its default spec.
    #[default]
    Default,
    /// An algorithm name, case-insensitive. Empty means default.
    ByName(String),
    /// A spec that must name its algorithm.
    BySpec(PartialSpec),
}

impl From<&str> for Selector {
    fn from(name: &str) -> Self {
        Selector::ByName(name.to_owned())
    }
}

impl From<String> for Selector {
    fn from(name: String) -> Self {
        Selector::ByName(name)
    }
}

impl From<Algorithm> for Selector {
    fn from(algorithm: Algorithm) -> Self {
        Selector::ByName(algorithm.name().to_owned())
    }
}

impl From<PartialSpec> for Selector {
    fn from(spec: PartialSpec) -> Self {
        Selector::BySpec(spec)
    }
}

impl From<KdfSpec> for Selector {
    fn from(spec: KdfSpec) -> Self {
        Selector::BySpec(spec.into())
    }
}

impl From<&KdfSpec> for Selector {
    fn from(spec: &KdfSpec) -> Self {
        Selector::BySpec(spec.into())
    }
}

#[derive(Debug, Clone)]
enum Plugin {
    Bcrypt(BaseKdf<Bcrypt>),
    Pbkdf2(BaseKdf<Pbkdf2>),
    Scrypt(BaseKdf<Scrypt>),
    Hmac(BaseKdf<Hmac>),
    Argon2(BaseKdf<Argon2>),
}

macro_rules! dispatch {
    ($plugin:expr, $kdf:ident => $body:expr) => {
        match $plugin {
            Plugin::Bcrypt($kdf) => $body,
            Plugin::Pbkdf2($kdf) => $body,
            Plugin::Scrypt($kdf) => $body,
            Plugin::Hmac($kdf) => $body,
            Plugin::Argon2($kdf) => $body,
        }
    };
}

impl Plugin {
    fn from_spec(spec: KdfSpec) -> Self {
        match spec {
            KdfSpec::Bcrypt(s) => Plugin::Bcrypt(BaseKdf::from_spec(s)),
            KdfSpec::Pbkdf2(s) => Plugin::Pbkdf2(BaseKdf::from_spec(s)),
            KdfSpec::Scrypt(s) => Plugin::Scrypt(BaseKdf::from_spec(s)),
            KdfSpec::Hmac(s) => Plugin::Hmac(BaseKdf::from_spec(s)),
            KdfSpec::Argon2(s) => Plugin::Argon2(BaseKdf::from_spec(s)),
        }
    }
}

/// Facade that picks a plugin and forwards to it.
#[derive(Debug, Clone)]
pub struct KeyDerivator {
    plugin: Plugin,
}

impl KeyDerivator {
    pub const DEFAULT_ALGORITHM: Algorithm = Algorithm::Scrypt;

    /// Resolves `selector` to a plugin instance.
    ///
    /// # Errors
    ///
    /// `UnsupportedAlgorithm` for unknown names, `MissingAlgorithm` for specs
    /// that name none, and any validation error of the selected plugin.
    pub fn new(selector: impl Into<Selector>) -> Result<Self> {
        let spec = match selector.into() {
            Selector::Default => Self::default_spec(),
            Selector::ByName(name) if name.is_empty() => Self::default_spec(),
            Selector::ByName(name) => Algorithm::from_name(&name)?.normalize(&PartialSpec::new())?,
            Selector::BySpec(partial) => KdfSpec::try_from(partial)?,
        };
        Ok(Self {
            plugin: Plugin::from_spec(spec),
        })
    }

    /// Builds from loosely typed JSON input.
    ///
    /// `null`, `false`, `0` and `""` select the default; other strings are
    /// names and objects are specs.
    pub fn from_json(value: &Value) -> Result<Self> {
        match value {
            Value::Null | Value::Bool(false) => Self::new(Selector::Default),
            Value::Number(n) if n.as_f64() == Some(0.0) => Self::new(Selector::Default),
            Value::String(name) => Self::new(name.as_str()),
            Value::Object(_) => {
                let partial: PartialSpec = serde_json::from_value(value.clone())
                    .map_err(|e| Error::InvalidSpec(e.to_string()))?;
                Self::new(partial)
            }
            other => Err(Error::InvalidConstructorArgument(
                kdf::json_type(other).to_owned(),
            )),
        }
    }

    /// Builds from loaded configuration; a spec wins over a bare name.
    pub fn from_config(config: &Config) -> Result<Self> {
        let selector = match (&config.spec, &config.algorithm) {
            (Some(spec), _) => Selector::BySpec(spec.clone()),
            (None, Some(name)) => Selector::ByName(name.clone()),
            (None, None) => Selector::Default,
        };
        Ok(Self::new(selector)?.with_secure_random(config.secure_random))
    }

    /// The default algorithm's default spec, a fresh copy on every call.
    pub fn default_spec() -> KdfSpec {
        BaseKdf::<Scrypt>::default_spec().into()
    }

    pub fn algorithm(&self) -> Algorithm {
        self.kdf_spec().algorithm()
    }

    pub fn kdf_spec(&self) -> KdfSpec {
        dispatch!(&self.plugin, kdf => kdf.kdf_spec())
    }

    pub fn salt_length(&self) -> usize {
        dispatch!(&self.plugin, kdf => kdf.salt_length())
    }

    pub fn secure_random(&self) -> bool {
        dispatch!(&self.plugin, kdf => kdf.secure_random())
    }

    pub fn set_secure_random(&mut self, secure: bool) {
        dispatch!(&mut self.plugin, kdf => kdf.set_secure_random(secure))
    }

    pub fn with_secure_random(mut self, secure: bool) -> Self {
        self.set_secure_random(secure);
        self
    }

    pub async fn derive(&self, secret: &[u8], salt: Option<&[u8]>) -> Result<DerivedKey> {
        dispatch!(&self.plugin, kdf => kdf.derive(secret, salt).await)
    }

    pub async fn derive_key(&self, secret: impl AsRef<[u8]>) -> Result<DerivedKey> {
        self.derive(secret.as_ref(), None).await
    }

    pub async fn derive_key_with_salt(
        &self,
        secret: impl AsRef<[u8]>,
        salt: impl AsRef<[u8]>,
    ) -> Result<DerivedKey> {
        self.derive(secret.as_ref(), Some(salt.as_ref())).await
    }

    /// Derives from JSON secret and salt values; a `null` or `""` salt is generated.
    pub async fn derive_json(&self, secret: &Value, salt: &Value) -> Result<DerivedKey> {
        let secret = Material::try_from(secret)?;
        let salt = match salt {
            Value::Null => None,
            Value::String(text) if text.is_empty() => None,
            salt => Some(Material::try_from(salt)?),
        };
        self.derive(secret.as_bytes(), salt.as_ref().map(Material::as_bytes))
            .await
    }

    /// Callback form; blocks the calling thread.
    pub fn derive_key_with<F>(&self, secret: &[u8], salt: Option<&[u8]>, callback: F)
    where
        F: FnOnce(Result<DerivedKey>),
    {
        callback(block_on(self.derive(secret, salt)));
    }

    /// Constructs and derives in one future; construction errors come back
    /// as the future's error.
    pub async fn derive_once(
        selector: impl Into<Selector>,
        secret: impl AsRef<[u8]>,
        salt: Option<&[u8]>,
    ) -> Result<DerivedKey> {
        Self::new(selector)?.derive(secret.as_ref(), salt).await
    }
}

impl Default for KeyDerivator {
    fn default() -> Self {
        Self {
            plugin: Plugin::from_spec(Self::default_spec()),
        }
    }
}
