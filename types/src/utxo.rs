//! Unspent transaction outputs and their references.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{Address, DatumHash, OracleError, TxHash, Value};

/// A reference to a transaction output, written `txhash#index`.
///
/// Ordering is by transaction id then index, which is the canonical order
/// of a transaction's input set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TransactionInput {
    pub tx_hash: TxHash,
    pub index: u32,
}

impl TransactionInput {
    pub fn new(tx_hash: TxHash, index: u32) -> Self {
        Self { tx_hash, index }
    }
}

impl fmt::Display for TransactionInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.tx_hash, self.index)
    }
}

impl FromStr for TransactionInput {
    type Err = OracleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (hash, index) = s
            .split_once('#')
            .ok_or_else(|| OracleError::InvalidInputRef(format!("missing '#' in {s:?}")))?;
        let tx_hash = TxHash::from_hex(hash)
            .map_err(|e| OracleError::InvalidInputRef(format!("{s:?}: {e}")))?;
        let index = index
            .parse::<u32>()
            .map_err(|e| OracleError::InvalidInputRef(format!("{s:?}: {e}")))?;
        Ok(Self { tx_hash, index })
    }
}

/// Datum attached to an output.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DatumOption {
    /// Only the hash is on chain; the datum must be supplied by the spender.
    Hash(DatumHash),
    /// The datum itself, as raw Plutus data CBOR.
    Inline(Vec<u8>),
}

/// A transaction output.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionOutput {
    pub address: Address,
    pub amount: Value,
    pub datum: Option<DatumOption>,
    /// Serialized reference script, if the output carries one.
    pub script_ref: Option<Vec<u8>>,
}

impl TransactionOutput {
    pub fn new(address: Address, amount: Value) -> Self {
        Self {
            address,
            amount,
            datum: None,
            script_ref: None,
        }
    }

    pub fn with_inline_datum(mut self, datum_cbor: Vec<u8>) -> Self {
        self.datum = Some(DatumOption::Inline(datum_cbor));
        self
    }

    /// Inline datum bytes, if present.
    pub fn inline_datum(&self) -> Option<&[u8]> {
        match &self.datum {
            Some(DatumOption::Inline(bytes)) => Some(bytes),
            _ => None,
        }
    }
}

/// An unspent output together with its reference.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Utxo {
    pub input: TransactionInput,
    pub output: TransactionOutput,
}

impl Utxo {
    pub fn new(input: TransactionInput, output: TransactionOutput) -> Self {
        Self { input, output }
    }

    pub fn amount(&self) -> &Value {
        &self.output.amount
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HASH: &str = "5e0cba9e817823ce82c32ded0b22f6790f075cd39ae9e0ab9af7ad1cc81edf17";

    #[test]
    fn parse_input_ref() {
        let input: TransactionInput = format!("{HASH}#3").parse().unwrap();
        assert_eq!(input.index, 3);
        assert_eq!(input.to_string(), format!("{HASH}#3"));
    }

    #[test]
    fn reject_malformed_input_ref() {
        assert!("nohash".parse::<TransactionInput>().is_err());
        assert!(format!("{HASH}#x").parse::<TransactionInput>().is_err());
        assert!("abcd#0".parse::<TransactionInput>().is_err());
    }

    #[test]
    fn inputs_order_by_hash_then_index() {
        let a = TransactionInput::new(TxHash::new([1; 32]), 5);
        let b = TransactionInput::new(TxHash::new([1; 32]), 6);
        let c = TransactionInput::new(TxHash::new([2; 32]), 0);
        let mut v = vec![c, b, a];
        v.sort();
        assert_eq!(v, vec![a, b, c]);
    }
}
