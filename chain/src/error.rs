use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChainError {
    #[error("indexer request failed: {0}")]
    Http(String),

    #[error("indexer returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid indexer response: {0}")]
    InvalidResponse(String),

    #[error("protocol parameter {0} missing from indexer response")]
    MissingParameter(&'static str),

    #[error("script evaluation failed: {0}")]
    Evaluation(String),

    #[error("transaction rejected: {0}")]
    Submit(String),

    #[error(transparent)]
    Types(#[from] oracle_types::OracleError),

    #[error(transparent)]
    Crypto(#[from] oracle_crypto::CryptoError),
}

impl From<reqwest::Error> for ChainError {
    fn from(e: reqwest::Error) -> Self {
        Self::Http(e.to_string())
    }
}
