//! Escrow datum and redeemer.

use oracle_types::{KeyHash, ScriptHash};
use serde::{Deserialize, Serialize};

use crate::plutus::{
    expect_bytes, expect_constr, expect_fields, expect_list, expect_uint, plutus_address,
    read_plutus_address,
};
use crate::{DatumError, PlutusData, VoteTally};

/// How the escrow validator aggregates the resolved votes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum VoteUse {
    ByCount,
    ByWeight,
}

impl VoteUse {
    fn alternative(&self) -> u64 {
        match self {
            Self::ByCount => 0,
            Self::ByWeight => 1,
        }
    }
}

/// Funds locked until an oracle resolves the question they depend on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EscrowDatum {
    pub policy_id: ScriptHash,
    pub creator: KeyHash,
    pub deadline: u64,
    /// Which question of the resolved tally decides the payout.
    pub question_index: u64,
    pub vote_use: VoteUse,
    /// Payee payment key hashes, one per answer.
    pub payees: Vec<KeyHash>,
}

impl EscrowDatum {
    pub fn to_plutus(&self) -> PlutusData {
        PlutusData::list(vec![
            PlutusData::bytes(self.policy_id.as_bytes().to_vec()),
            PlutusData::bytes(self.creator.as_bytes().to_vec()),
            PlutusData::int(self.deadline),
            PlutusData::int(self.question_index),
            PlutusData::constr(self.vote_use.alternative(), vec![]),
            PlutusData::list(self.payees.iter().map(plutus_address).collect()),
        ])
    }

    pub fn from_plutus(data: &PlutusData) -> Result<Self, DatumError> {
        let fields = expect_fields(expect_list(data, "escrow datum")?, "escrow datum", 6)?;

        let vote_use = match expect_constr(&fields[4], "vote_use")? {
            (0, []) => VoteUse::ByCount,
            (1, []) => VoteUse::ByWeight,
            (alternative, _) => {
                return Err(DatumError::Constructor {
                    field: "vote_use",
                    alternative,
                })
            }
        };
        let payees = expect_list(&fields[5], "payees")?
            .iter()
            .map(|payee| read_plutus_address(payee, "payees"))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            policy_id: ScriptHash::from_slice(expect_bytes(&fields[0], "policy_id")?)?,
            creator: KeyHash::from_slice(expect_bytes(&fields[1], "creator")?)?,
            deadline: expect_uint(&fields[2], "deadline")?,
            question_index: expect_uint(&fields[3], "question_index")?,
            vote_use,
            payees,
        })
    }

    pub fn encode(&self) -> Result<Vec<u8>, DatumError> {
        self.to_plutus().to_cbor()
    }

    pub fn decode(cbor: &[u8]) -> Result<Self, DatumError> {
        Self::from_plutus(&PlutusData::from_cbor(cbor)?)
    }
}

/// Spending actions on an escrow output.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EscrowRedeemer {
    /// The creator takes the funds back after the deadline.
    CreatorRetrieval,
    /// Pay out according to the tally posted in the referenced oracle output.
    EscrowExecution {
        /// Position of the oracle output among the reference inputs.
        oracle_index: u64,
        results: VoteTally,
    },
}

impl EscrowRedeemer {
    pub fn to_plutus(&self) -> PlutusData {
        match self {
            Self::CreatorRetrieval => PlutusData::constr(0, vec![]),
            Self::EscrowExecution {
                oracle_index,
                results,
            } => PlutusData::constr(
                1,
                vec![PlutusData::int(*oracle_index), results.to_plutus()],
            ),
        }
    }

    pub fn from_plutus(data: &PlutusData) -> Result<Self, DatumError> {
        match expect_constr(data, "escrow redeemer")? {
            (0, []) => Ok(Self::CreatorRetrieval),
            (1, fields) => {
                let fields = expect_fields(fields, "escrow execution", 2)?;
                Ok(Self::EscrowExecution {
                    oracle_index: expect_uint(&fields[0], "oracle_index")?,
                    results: VoteTally::from_plutus(&fields[1])?,
                })
            }
            (alternative, _) => Err(DatumError::Constructor {
                field: "escrow redeemer",
                alternative,
            }),
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>, DatumError> {
        self.to_plutus().to_cbor()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn datum() -> EscrowDatum {
        EscrowDatum {
            policy_id: ScriptHash::new([0x11; 28]),
            creator: KeyHash::new([0x22; 28]),
            deadline: 1_700_000_000_000,
            question_index: 1,
            vote_use: VoteUse::ByWeight,
            payees: vec![KeyHash::new([0x33; 28]), KeyHash::new([0x44; 28])],
        }
    }

    #[test]
    fn escrow_datum_roundtrip() {
        let d = datum();
        let cbor = d.encode().unwrap();
        assert_eq!(cbor[0], 0x9f);
        assert_eq!(EscrowDatum::decode(&cbor).unwrap(), d);
    }

    #[test]
    fn vote_use_constructors() {
        let mut d = datum();
        d.vote_use = VoteUse::ByCount;
        let data = d.to_plutus();
        assert_eq!(data.as_list().unwrap()[4], PlutusData::constr(0, vec![]));
        assert_eq!(EscrowDatum::from_plutus(&data).unwrap().vote_use, VoteUse::ByCount);
    }

    #[test]
    fn unknown_vote_use_rejected() {
        let mut data = datum().to_plutus();
        if let PlutusData::List(fields) = &mut data {
            fields[4] = PlutusData::constr(3, vec![]);
        }
        assert!(matches!(
            EscrowDatum::from_plutus(&data),
            Err(DatumError::Constructor { alternative: 3, .. })
        ));
    }

    #[test]
    fn creator_retrieval_is_empty_constructor_zero() {
        let cbor = EscrowRedeemer::CreatorRetrieval.encode().unwrap();
        assert_eq!(hex::encode(cbor), "d87980");
    }

    #[test]
    fn escrow_execution_encoding() {
        let redeemer = EscrowRedeemer::EscrowExecution {
            oracle_index: 0,
            results: "1:2".parse().unwrap(),
        };
        assert_eq!(
            hex::encode(redeemer.encode().unwrap()),
            "d87a9f009f9f9f0102ffffffff"
        );
        assert_eq!(
            EscrowRedeemer::from_plutus(&redeemer.to_plutus()).unwrap(),
            redeemer
        );
    }
}
