//! The oracle proposal datum.
//!
//! On chain this is a plain positional list:
//!
//! ```text
//! [ proposal_id, policy_id, creator, deadline, [oracle keys], min_signatures,
//!   Constr 0 [payment key hash], Constr 0 [results] | Constr 1 [] ]
//! ```

use oracle_types::{Address, Credential, KeyHash, NetworkId, PublicKey, ScriptHash};
use serde::Serialize;

use crate::plutus::{
    expect_bytes, expect_constr, expect_fields, expect_list, expect_uint, plutus_address,
    read_plutus_address,
};
use crate::{DatumError, PlutusData};

const RESULTS_SOME: u64 = 0;
const RESULTS_NONE: u64 = 1;

/// A data request registered with a fixed set of trusted oracle signers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OracleDatum {
    pub proposal_id: String,
    /// Minting policy the proposal belongs to.
    pub policy_id: ScriptHash,
    pub creator: KeyHash,
    pub deadline: u64,
    /// Keys allowed to attest results, in the order signatures are laid out.
    pub oracles: Vec<PublicKey>,
    pub min_signatures: u64,
    /// Payment key hash of the address that receives change when results are posted.
    pub payment: KeyHash,
    /// Absent until quorum-verified results are submitted.
    pub results: Option<Vec<u8>>,
}

impl OracleDatum {
    pub fn to_plutus(&self) -> PlutusData {
        let results = match &self.results {
            Some(bytes) => PlutusData::constr(RESULTS_SOME, vec![PlutusData::bytes(bytes.clone())]),
            None => PlutusData::constr(RESULTS_NONE, vec![]),
        };
        PlutusData::list(vec![
            PlutusData::bytes(self.proposal_id.as_bytes().to_vec()),
            PlutusData::bytes(self.policy_id.as_bytes().to_vec()),
            PlutusData::bytes(self.creator.as_bytes().to_vec()),
            PlutusData::int(self.deadline),
            PlutusData::list(
                self.oracles
                    .iter()
                    .map(|key| PlutusData::bytes(key.as_bytes().to_vec()))
                    .collect(),
            ),
            PlutusData::int(self.min_signatures),
            plutus_address(&self.payment),
            results,
        ])
    }

    pub fn from_plutus(data: &PlutusData) -> Result<Self, DatumError> {
        let fields = expect_fields(expect_list(data, "oracle datum")?, "oracle datum", 8)?;

        let proposal_id = String::from_utf8(expect_bytes(&fields[0], "proposal_id")?.to_vec())
            .map_err(|e| DatumError::Shape {
                field: "proposal_id",
                expected: "UTF-8 text",
                found: e.to_string(),
            })?;
        let oracles = expect_list(&fields[4], "oracles")?
            .iter()
            .map(|key| Ok(PublicKey::from_slice(expect_bytes(key, "oracles")?)?))
            .collect::<Result<Vec<_>, DatumError>>()?;

        Ok(Self {
            proposal_id,
            policy_id: ScriptHash::from_slice(expect_bytes(&fields[1], "policy_id")?)?,
            creator: KeyHash::from_slice(expect_bytes(&fields[2], "creator")?)?,
            deadline: expect_uint(&fields[3], "deadline")?,
            oracles,
            min_signatures: expect_uint(&fields[5], "min_signatures")?,
            payment: read_plutus_address(&fields[6], "payment_address")?,
            results: read_results(&fields[7])?,
        })
    }

    pub fn encode(&self) -> Result<Vec<u8>, DatumError> {
        self.to_plutus().to_cbor()
    }

    pub fn decode(cbor: &[u8]) -> Result<Self, DatumError> {
        Self::from_plutus(&PlutusData::from_cbor(cbor)?)
    }

    /// A copy with the results slot filled. Every other field is preserved.
    pub fn with_results(&self, results: impl Into<Vec<u8>>) -> Self {
        Self {
            results: Some(results.into()),
            ..self.clone()
        }
    }

    pub fn oracle_index(&self, key: &PublicKey) -> Option<usize> {
        self.oracles.iter().position(|k| k == key)
    }

    pub fn is_oracle(&self, key: &PublicKey) -> bool {
        self.oracle_index(key).is_some()
    }

    /// Enterprise address built from the payment key hash.
    pub fn payment_address(&self, network: NetworkId) -> Address {
        Address::enterprise(network, Credential::Key(self.payment))
    }

    /// Human-readable rendering for inspection.
    pub fn to_view(&self, network: NetworkId) -> Result<OracleDatumView, DatumError> {
        let payment_address = oracle_crypto::encode_address(&self.payment_address(network))
            .map_err(|e| DatumError::Address(e.to_string()))?;
        Ok(OracleDatumView {
            proposal_id: self.proposal_id.clone(),
            minting_policy_identifier: self.policy_id.to_hex(),
            creator: self.creator.to_hex(),
            deadline: self.deadline,
            oracles: self.oracles.iter().map(PublicKey::to_hex).collect(),
            min_signatures: self.min_signatures,
            payment_address,
            results: self.results.as_deref().map(|bytes| {
                std::str::from_utf8(bytes)
                    .map(str::to_owned)
                    .unwrap_or_else(|_| hex::encode(bytes))
            }),
        })
    }
}

/// The results slot is chosen by its constructor tag alone.
fn read_results(data: &PlutusData) -> Result<Option<Vec<u8>>, DatumError> {
    match expect_constr(data, "results")? {
        (RESULTS_SOME, fields) => {
            let fields = expect_fields(fields, "results", 1)?;
            Ok(Some(expect_bytes(&fields[0], "results")?.to_vec()))
        }
        (RESULTS_NONE, fields) => {
            expect_fields(fields, "results", 0)?;
            Ok(None)
        }
        (alternative, _) => Err(DatumError::Constructor {
            field: "results",
            alternative,
        }),
    }
}

/// JSON shape printed by `datum inspect`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct OracleDatumView {
    pub proposal_id: String,
    pub minting_policy_identifier: String,
    pub creator: String,
    pub deadline: u64,
    pub oracles: Vec<String>,
    pub min_signatures: u64,
    pub payment_address: String,
    pub results: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = "9f50746573745f70726f706f73616c5f6964581c02aa7e9d83f43ad54ab2585900292db7280ec43410e7563dac934d17581c6c29e3e756a5f7794792340b94b1426bab9ad61d87061a8c369f2009009f582014889cdb4b72ad10d4d4243c4f50141eea1d10a3482cd20a7da6245d05ea01f15820f36f9a66f3916127e1ef303eef6cdde224c83da1fc46c3d948d2a68af62dced85820c3e991c8919b4e2ff03cf2a795afe98c14b3d3ebe2e380598e8b8b46ddac28c4ff02d8799f581ce1b6ffd66d966a4ba1b5de07189f0784cbceda9574c87e62c2382f63ffd8799f4474657374ffff";

    fn fixture_datum() -> OracleDatum {
        OracleDatum {
            proposal_id: "test_proposal_id".into(),
            policy_id: ScriptHash::from_hex(
                "02aa7e9d83f43ad54ab2585900292db7280ec43410e7563dac934d17",
            )
            .unwrap(),
            creator: KeyHash::from_hex("6c29e3e756a5f7794792340b94b1426bab9ad61d87061a8c369f2009")
                .unwrap(),
            deadline: 0,
            oracles: vec![
                PublicKey::from_hex(
                    "14889cdb4b72ad10d4d4243c4f50141eea1d10a3482cd20a7da6245d05ea01f1",
                )
                .unwrap(),
                PublicKey::from_hex(
                    "f36f9a66f3916127e1ef303eef6cdde224c83da1fc46c3d948d2a68af62dced8",
                )
                .unwrap(),
                PublicKey::from_hex(
                    "c3e991c8919b4e2ff03cf2a795afe98c14b3d3ebe2e380598e8b8b46ddac28c4",
                )
                .unwrap(),
            ],
            min_signatures: 2,
            payment: KeyHash::from_hex("e1b6ffd66d966a4ba1b5de07189f0784cbceda9574c87e62c2382f63")
                .unwrap(),
            results: Some(b"test".to_vec()),
        }
    }

    #[test]
    fn decodes_fixture() {
        let datum = OracleDatum::decode(&hex::decode(FIXTURE).unwrap()).unwrap();
        assert_eq!(datum, fixture_datum());
    }

    #[test]
    fn encodes_fixture_byte_for_byte() {
        assert_eq!(hex::encode(fixture_datum().encode().unwrap()), FIXTURE);
    }

    #[test]
    fn roundtrip_without_results() {
        let datum = OracleDatum {
            results: None,
            ..fixture_datum()
        };
        let cbor = datum.encode().unwrap();
        assert!(hex::encode(&cbor).ends_with("d87a80ff"));
        assert_eq!(OracleDatum::decode(&cbor).unwrap(), datum);
    }

    #[test]
    fn with_results_changes_only_results() {
        let pending = OracleDatum {
            results: None,
            ..fixture_datum()
        };
        let resolved = pending.with_results(b"1,2,3|4,5".to_vec());

        assert_eq!(resolved.results.as_deref(), Some(&b"1,2,3|4,5"[..]));
        assert_eq!(
            OracleDatum {
                results: None,
                ..resolved.clone()
            },
            pending
        );
        assert!(pending.results.is_none());

        let before = pending.to_plutus();
        let after = resolved.to_plutus();
        let (before, after) = (before.as_list().unwrap(), after.as_list().unwrap());
        assert_eq!(before[..7], after[..7]);
        assert_ne!(before[7], after[7]);
    }

    #[test]
    fn unknown_results_constructor_rejected() {
        let mut data = fixture_datum().to_plutus();
        if let PlutusData::List(fields) = &mut data {
            fields[7] = PlutusData::constr(2, vec![]);
        }
        assert_eq!(
            OracleDatum::from_plutus(&data),
            Err(DatumError::Constructor {
                field: "results",
                alternative: 2
            })
        );
    }

    #[test]
    fn some_results_with_wrong_arity_rejected() {
        let mut data = fixture_datum().to_plutus();
        if let PlutusData::List(fields) = &mut data {
            fields[7] = PlutusData::constr(0, vec![]);
        }
        assert!(matches!(
            OracleDatum::from_plutus(&data),
            Err(DatumError::FieldCount { .. })
        ));
    }

    #[test]
    fn short_datum_rejected() {
        let data = PlutusData::list(vec![PlutusData::bytes(b"x".to_vec())]);
        assert!(matches!(
            OracleDatum::from_plutus(&data),
            Err(DatumError::FieldCount { found: 1, .. })
        ));
    }

    #[test]
    fn oracle_membership() {
        let datum = fixture_datum();
        assert_eq!(datum.oracle_index(&datum.oracles[2]), Some(2));
        assert!(!datum.is_oracle(&PublicKey([0xEE; 32])));
    }

    #[test]
    fn view_renders_hex_and_address() {
        let view = fixture_datum().to_view(NetworkId::Testnet).unwrap();
        assert_eq!(view.proposal_id, "test_proposal_id");
        assert_eq!(view.oracles.len(), 3);
        assert!(view.payment_address.starts_with("addr_test1"));
        assert_eq!(view.results.as_deref(), Some("test"));
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["min_signatures"], 2);
    }
}
