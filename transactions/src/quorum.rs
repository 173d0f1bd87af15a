//! Turning stored signature submissions into a redeemer's signature list.

use oracle_datum::OracleDatum;
use oracle_store::SignatureRecord;
use oracle_types::{PublicKey, Signature};
use tracing::{debug, warn};

use crate::TxBuildError;

/// Filler for oracles that did not sign. It is never a valid signature, so
/// the validator counts the slot as unsigned.
pub const MISSING_SIGNATURE: u8 = 0xAA;

/// Lay out the signatures over `results` in oracle-set order.
///
/// Each record is checked again: its results must match, its key must belong
/// to the datum's oracle set and its signature must verify. When an oracle
/// submitted more than once, the record with the highest id wins. Slots of
/// oracles without a valid record hold a one-byte [`MISSING_SIGNATURE`].
pub fn collect_signatures(
    datum: &OracleDatum,
    results: &str,
    records: &[SignatureRecord],
) -> Result<Vec<Vec<u8>>, TxBuildError> {
    let mut ordered: Vec<&SignatureRecord> = records
        .iter()
        .filter(|r| r.proposal_id == datum.proposal_id && r.results == results)
        .collect();
    ordered.sort_by_key(|r| r.id);

    let mut slots: Vec<Option<Signature>> = vec![None; datum.oracles.len()];
    for record in ordered {
        let Some((public_key, signature)) = parse_record(record) else {
            warn!(id = record.id, "skipping record with malformed key material");
            continue;
        };
        let Some(slot) = datum.oracle_index(&public_key) else {
            debug!(id = record.id, "skipping record from a key outside the oracle set");
            continue;
        };
        if oracle_crypto::verify_signature(results.as_bytes(), &signature, &public_key).is_err() {
            warn!(id = record.id, "skipping record whose signature does not verify");
            continue;
        }
        slots[slot] = Some(signature);
    }

    let valid = slots.iter().flatten().count();
    if (valid as u64) < datum.min_signatures {
        return Err(TxBuildError::QuorumNotReached {
            valid,
            required: datum.min_signatures,
        });
    }
    debug!(valid, oracles = slots.len(), "quorum reached");

    Ok(slots
        .into_iter()
        .map(|slot| match slot {
            Some(signature) => signature.0.to_vec(),
            None => vec![MISSING_SIGNATURE],
        })
        .collect())
}

fn parse_record(record: &SignatureRecord) -> Option<(PublicKey, Signature)> {
    let public_key = PublicKey::from_hex(&record.pubkey).ok()?;
    let signature = Signature::from_hex(&record.signature).ok()?;
    Some((public_key, signature))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;
    use oracle_types::{Timestamp, TransactionInput, TxHash};

    const RESULTS: &str = "1,2,3|4,5,6";

    fn record(id: u64, signer: u8, results: &str) -> SignatureRecord {
        let signature = oracle_crypto::sign_message(results.as_bytes(), &testing::key(signer));
        SignatureRecord {
            id,
            proposal_id: "prop-1".into(),
            pubkey: testing::public(signer).to_hex(),
            signature: signature.to_hex(),
            results: results.into(),
            script_input: TransactionInput::new(TxHash::new([1; 32]), 0),
            created_at: Timestamp::new(id),
        }
    }

    #[test]
    fn orders_by_oracle_set_and_fills_gaps() {
        let datum = testing::datum(2);
        let records = vec![record(1, 12, RESULTS), record(2, 10, RESULTS)];
        let signatures = collect_signatures(&datum, RESULTS, &records).unwrap();

        assert_eq!(signatures.len(), 3);
        assert_eq!(signatures[0].len(), 64);
        assert_eq!(signatures[1], vec![MISSING_SIGNATURE]);
        assert_eq!(signatures[2].len(), 64);
        let expected =
            oracle_crypto::sign_message(RESULTS.as_bytes(), &testing::key(12));
        assert_eq!(signatures[2], expected.0.to_vec());
    }

    #[test]
    fn quorum_counts_distinct_valid_oracles() {
        let datum = testing::datum(2);
        let mut forged = record(3, 11, RESULTS);
        forged.signature = record(3, 10, RESULTS).signature;
        let records = vec![
            record(1, 10, RESULTS),
            record(2, 10, RESULTS),
            forged,
            record(4, 11, "9,9"),
            record(5, 99, RESULTS),
        ];
        let err = collect_signatures(&datum, RESULTS, &records).unwrap_err();
        assert!(matches!(
            err,
            TxBuildError::QuorumNotReached { valid: 1, required: 2 }
        ));
    }

    #[test]
    fn invalid_duplicate_does_not_displace_valid_one() {
        let datum = testing::datum(1);
        let mut older = record(1, 10, RESULTS);
        older.signature = "00".repeat(64);
        let newer = record(2, 10, RESULTS);
        let signatures =
            collect_signatures(&datum, RESULTS, &[newer.clone(), older]).unwrap();
        assert_eq!(hex::encode(&signatures[0]), newer.signature);
    }

    #[test]
    fn other_proposals_are_ignored() {
        let datum = testing::datum(1);
        let mut elsewhere = record(1, 10, RESULTS);
        elsewhere.proposal_id = "prop-2".into();
        assert!(collect_signatures(&datum, RESULTS, &[elsewhere]).is_err());
    }
}
