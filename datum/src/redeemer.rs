//! Redeemer for posting results to an oracle output.

use crate::plutus::{expect_bytes, expect_fields, expect_list};
use crate::{DatumError, PlutusData};

/// `[results, [signature, ...]]`
///
/// Signatures are positional: slot `i` belongs to the `i`th oracle key in the
/// datum being spent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OracleRedeemer {
    pub results: Vec<u8>,
    pub signatures: Vec<Vec<u8>>,
}

impl OracleRedeemer {
    pub fn new(results: impl Into<Vec<u8>>, signatures: Vec<Vec<u8>>) -> Self {
        Self {
            results: results.into(),
            signatures,
        }
    }

    pub fn to_plutus(&self) -> PlutusData {
        PlutusData::list(vec![
            PlutusData::bytes(self.results.clone()),
            PlutusData::list(
                self.signatures
                    .iter()
                    .map(|sig| PlutusData::bytes(sig.clone()))
                    .collect(),
            ),
        ])
    }

    pub fn from_plutus(data: &PlutusData) -> Result<Self, DatumError> {
        let fields = expect_fields(expect_list(data, "oracle redeemer")?, "oracle redeemer", 2)?;
        let signatures = expect_list(&fields[1], "signatures")?
            .iter()
            .map(|sig| expect_bytes(sig, "signatures").map(<[u8]>::to_vec))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            results: expect_bytes(&fields[0], "results")?.to_vec(),
            signatures,
        })
    }

    pub fn encode(&self) -> Result<Vec<u8>, DatumError> {
        self.to_plutus().to_cbor()
    }
}
