//! Signature submission storage trait.

use crate::StoreError;
use oracle_types::{Timestamp, TransactionInput};
use serde::{Deserialize, Serialize};

/// An accepted signature submission.
///
/// Records are append-only: they are never updated and the store does not
/// deduplicate repeated submissions from the same oracle.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureRecord {
    /// Assigned by the store, increasing in insertion order.
    pub id: u64,
    pub proposal_id: String,
    /// Signer public key, hex.
    pub pubkey: String,
    /// Detached signature over the UTF-8 bytes of `results`, hex.
    pub signature: String,
    pub results: String,
    /// The oracle script output the signer was checked against.
    pub script_input: TransactionInput,
    /// Server-side time of insertion.
    pub created_at: Timestamp,
}

/// The caller-supplied part of a [`SignatureRecord`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewSignatureRecord {
    pub proposal_id: String,
    pub pubkey: String,
    pub signature: String,
    pub results: String,
    pub script_input: TransactionInput,
}

impl NewSignatureRecord {
    pub fn into_record(self, id: u64, created_at: Timestamp) -> SignatureRecord {
        SignatureRecord {
            id,
            proposal_id: self.proposal_id,
            pubkey: self.pubkey,
            signature: self.signature,
            results: self.results,
            script_input: self.script_input,
            created_at,
        }
    }
}

/// Append-only table of signature submissions.
pub trait SignatureStore: Send + Sync {
    /// Append a record, assigning its id and creation time.
    fn insert_signature(&self, record: NewSignatureRecord) -> Result<SignatureRecord, StoreError>;

    fn get_signature(&self, id: u64) -> Result<SignatureRecord, StoreError>;

    /// All records for a proposal, oldest first.
    fn signatures_for_proposal(&self, proposal_id: &str)
        -> Result<Vec<SignatureRecord>, StoreError>;

    /// Records for a proposal that were checked against one script output.
    fn signatures_for_input(
        &self,
        proposal_id: &str,
        script_input: &TransactionInput,
    ) -> Result<Vec<SignatureRecord>, StoreError> {
        Ok(self
            .signatures_for_proposal(proposal_id)?
            .into_iter()
            .filter(|r| r.script_input == *script_input)
            .collect())
    }

    /// Up to `limit` records for a proposal with ids greater than `after`.
    fn list_signatures(
        &self,
        proposal_id: &str,
        after: Option<u64>,
        limit: usize,
    ) -> Result<Vec<SignatureRecord>, StoreError> {
        Ok(self
            .signatures_for_proposal(proposal_id)?
            .into_iter()
            .filter(|r| after.map_or(true, |a| r.id > a))
            .take(limit)
            .collect())
    }

    fn signature_count(&self) -> Result<u64, StoreError>;
}
