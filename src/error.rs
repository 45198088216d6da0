use thiserror::Error;

/// Errors raised while validating specs or deriving keys.
#[derive(Debug, Error)]
pub enum Error {
    /// A spec field failed normalization or validation.
    #[error("invalid KDF spec: {0}")]
    InvalidSpec(String),

    #[error("Unknown hash {0}")]
    UnknownHash(String),

    #[error("Unsupported algorithm {0}")]
    UnsupportedAlgorithm(String),

    #[error("KDF spec does not define the algorithm")]
    MissingAlgorithm,

    #[error("Can not construct with {0}")]
    InvalidConstructorArgument(String),

    /// A secret or salt had a shape that is neither bytes nor text.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("invalid salt: {0}")]
    InvalidSalt(String),

    /// The primitive answered with something that does not belong to this request.
    #[error("primitive mismatch: {0}")]
    PrimitiveMismatch(String),

    #[error("invalid primitive output: {0}")]
    InvalidPrimitiveOutput(String),

    #[error("invalid bcrypt base64: {0}")]
    InvalidEncoding(String),

    #[error(transparent)]
    Bcrypt(#[from] bcrypt::BcryptError),

    #[error("OS random generator unavailable: {0}")]
    Entropy(String),

    /// Rejection raised by an underlying primitive library.
    #[error("{0}")]
    Primitive(String),

    #[error("derivation task failed: {0}")]
    Task(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
