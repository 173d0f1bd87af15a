use oracle_types::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TxBuildError {
    #[error("insufficient funds: need {needed}, have {available}")]
    InsufficientFunds { needed: Value, available: Value },

    #[error("change of {change} lovelace is below the minimum of {minimum}")]
    ChangeBelowMinimum { change: u64, minimum: u64 },

    #[error("output {index} holds {coin} lovelace, below the minimum of {minimum}")]
    OutputBelowMinimum { index: usize, coin: u64, minimum: u64 },

    #[error("fee did not settle; last estimate {0} lovelace")]
    FeeDidNotConverge(u64),

    #[error("script inputs need at least one collateral input")]
    MissingCollateral,

    #[error("collateral of {available} lovelace does not cover the required {required}")]
    InsufficientCollateral { required: u64, available: u64 },

    #[error("transaction of {size} bytes exceeds the maximum of {max}")]
    TooLarge { size: usize, max: u64 },

    #[error("evaluation returned no budget for redeemer {0}")]
    MissingExUnits(String),

    #[error("invalid script: {0}")]
    InvalidScript(String),

    #[error("utxo {0} carries no inline datum")]
    MissingDatum(String),

    #[error("quorum not reached: {valid} valid signatures, {required} required")]
    QuorumNotReached { valid: usize, required: u64 },

    #[error("CBOR encode failed: {0}")]
    Encode(String),

    #[error(transparent)]
    Datum(#[from] oracle_datum::DatumError),

    #[error(transparent)]
    Chain(#[from] oracle_chain::ChainError),

    #[error(transparent)]
    Crypto(#[from] oracle_crypto::CryptoError),

    #[error(transparent)]
    Types(#[from] oracle_types::OracleError),
}

impl<E: std::fmt::Display> From<minicbor::encode::Error<E>> for TxBuildError {
    fn from(e: minicbor::encode::Error<E>) -> Self {
        Self::Encode(e.to_string())
    }
}
