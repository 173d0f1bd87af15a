use thiserror::Error;

/// Failure to verify a detached signature.
///
/// Kept separate from [`CryptoError`] so callers can map a bad signature to a
/// user-facing rejection without matching on unrelated failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SignatureError {
    #[error("invalid signature")]
    InvalidSignature,

    #[error("malformed public key")]
    MalformedPublicKey,

    #[error("malformed signature: {0}")]
    MalformedSignature(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CryptoError {
    #[error("invalid signing key: {0}")]
    InvalidSigningKey(String),

    #[error("invalid bech32 address: {0}")]
    Bech32(String),

    #[error("unexpected address prefix {found:?}, expected {expected:?}")]
    WrongPrefix { expected: String, found: String },

    #[error(transparent)]
    Types(#[from] oracle_types::OracleError),
}
