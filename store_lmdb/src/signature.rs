//! LMDB implementation of SignatureStore.
//!
//! Records live in `signatures` keyed by their id as 8 big-endian bytes, so
//! key order is insertion order. The `proposal_signatures` index maps
//! `blake2b_256(proposal_id) ++ id_be` to nothing; a prefix scan over it
//! yields a proposal's ids in insertion order. Hashing keeps index keys at 40
//! bytes whatever the proposal id length, well under the LMDB key limit.

use std::ops::Bound;
use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env, RoTxn};

use oracle_crypto::blake2b_256;
use oracle_store::signature::{NewSignatureRecord, SignatureRecord, SignatureStore};
use oracle_store::StoreError;
use oracle_types::Timestamp;

use crate::{increment_prefix, LmdbError};

pub struct LmdbSignatureStore {
    pub(crate) env: Arc<Env>,
    pub(crate) signatures_db: Database<Bytes, Bytes>,
    pub(crate) proposal_index_db: Database<Bytes, Bytes>,
}

fn proposal_prefix(proposal_id: &str) -> [u8; 32] {
    blake2b_256(proposal_id.as_bytes())
}

fn index_key(proposal_id: &str, id: u64) -> [u8; 40] {
    let mut key = [0u8; 40];
    key[..32].copy_from_slice(&proposal_prefix(proposal_id));
    key[32..].copy_from_slice(&id.to_be_bytes());
    key
}

fn decode_id(bytes: &[u8]) -> Result<u64, LmdbError> {
    let arr: [u8; 8] = bytes
        .try_into()
        .map_err(|_| LmdbError::Serialization(format!("bad record key length {}", bytes.len())))?;
    Ok(u64::from_be_bytes(arr))
}

impl LmdbSignatureStore {
    fn read_record(&self, rtxn: &RoTxn, id: u64) -> Result<SignatureRecord, LmdbError> {
        let val = self
            .signatures_db
            .get(rtxn, &id.to_be_bytes())?
            .ok_or_else(|| LmdbError::NotFound(format!("signature record {}", id)))?;
        Ok(bincode::deserialize(val)?)
    }

    /// Ids indexed under `proposal_id`, ascending.
    fn proposal_ids(&self, rtxn: &RoTxn, proposal_id: &str) -> Result<Vec<u64>, LmdbError> {
        let prefix = proposal_prefix(proposal_id);
        let mut upper = prefix.to_vec();
        increment_prefix(&mut upper);

        let bounds = (
            Bound::Included(prefix.as_slice()),
            if upper.is_empty() {
                Bound::Unbounded
            } else {
                Bound::Excluded(upper.as_slice())
            },
        );
        let mut ids = Vec::new();
        for result in self.proposal_index_db.range(rtxn, &bounds)? {
            let (key, _) = result?;
            ids.push(decode_id(&key[prefix.len()..])?);
        }
        Ok(ids)
    }
}

impl SignatureStore for LmdbSignatureStore {
    fn insert_signature(&self, record: NewSignatureRecord) -> Result<SignatureRecord, StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        let next_id = match self.signatures_db.last(&wtxn).map_err(LmdbError::from)? {
            Some((key, _)) => decode_id(key)? + 1,
            None => 1,
        };
        let record = record.into_record(next_id, Timestamp::now());
        let bytes = bincode::serialize(&record).map_err(LmdbError::from)?;

        self.signatures_db
            .put(&mut wtxn, &next_id.to_be_bytes(), &bytes)
            .map_err(LmdbError::from)?;
        self.proposal_index_db
            .put(&mut wtxn, &index_key(&record.proposal_id, next_id), &[])
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;

        tracing::debug!(
            id = next_id,
            proposal_id = %record.proposal_id,
            "stored signature"
        );
        Ok(record)
    }

    fn get_signature(&self, id: u64) -> Result<SignatureRecord, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        Ok(self.read_record(&rtxn, id)?)
    }

    fn signatures_for_proposal(
        &self,
        proposal_id: &str,
    ) -> Result<Vec<SignatureRecord>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let ids = self.proposal_ids(&rtxn, proposal_id)?;
        let mut records = Vec::with_capacity(ids.len());
        for id in ids {
            records.push(self.read_record(&rtxn, id)?);
        }
        Ok(records)
    }

    fn list_signatures(
        &self,
        proposal_id: &str,
        after: Option<u64>,
        limit: usize,
    ) -> Result<Vec<SignatureRecord>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let ids = self.proposal_ids(&rtxn, proposal_id)?;
        let mut records = Vec::new();
        for id in ids
            .into_iter()
            .filter(|id| after.map_or(true, |a| *id > a))
            .take(limit)
        {
            records.push(self.read_record(&rtxn, id)?);
        }
        Ok(records)
    }

    fn signature_count(&self) -> Result<u64, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let count = self.signatures_db.len(&rtxn).map_err(LmdbError::from)?;
        Ok(count)
    }
}
