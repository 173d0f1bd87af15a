use oracle_types::OracleError;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DatumError {
    #[error("CBOR decode failed: {0}")]
    Decode(String),

    #[error("CBOR encode failed: {0}")]
    Encode(String),

    #[error("{0} trailing bytes after plutus data")]
    TrailingBytes(usize),

    #[error("expected {expected} for {field}, found {found}")]
    Shape {
        field: &'static str,
        expected: &'static str,
        found: String,
    },

    #[error("expected {expected} fields in {record}, found {found}")]
    FieldCount {
        record: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("unexpected constructor {alternative} for {field}")]
    Constructor { field: &'static str, alternative: u64 },

    #[error("invalid vote tally: {0}")]
    InvalidVotes(String),

    #[error(transparent)]
    Types(#[from] OracleError),

    #[error("address encoding: {0}")]
    Address(String),
}

impl From<minicbor::decode::Error> for DatumError {
    fn from(e: minicbor::decode::Error) -> Self {
        Self::Decode(e.to_string())
    }
}
