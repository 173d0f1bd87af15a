//! Nullable store: thread-safe in-memory storage for testing.

use oracle_store::meta::MetaStore;
use oracle_store::signature::{NewSignatureRecord, SignatureRecord, SignatureStore};
use oracle_store::StoreError;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::NullClock;

/// An in-memory signature table.
///
/// Ids start at 1 and creation times come from a [`NullClock`] that ticks
/// one second per insert.
pub struct NullSignatureStore {
    records: Mutex<Vec<SignatureRecord>>,
    clock: NullClock,
    fail_writes: Mutex<bool>,
}

impl NullSignatureStore {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
            clock: NullClock::default(),
            fail_writes: Mutex::new(false),
        }
    }

    /// Make every subsequent insert fail with a backend error.
    pub fn fail_writes(&self) {
        *self.fail_writes.lock().unwrap() = true;
    }

    /// All stored records (for assertions).
    pub fn records(&self) -> Vec<SignatureRecord> {
        self.records.lock().unwrap().clone()
    }
}

impl Default for NullSignatureStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SignatureStore for NullSignatureStore {
    fn insert_signature(&self, record: NewSignatureRecord) -> Result<SignatureRecord, StoreError> {
        if *self.fail_writes.lock().unwrap() {
            return Err(StoreError::Backend("writes disabled".into()));
        }
        let mut records = self.records.lock().unwrap();
        let id = records.last().map_or(1, |r| r.id + 1);
        self.clock.advance(1);
        let record = record.into_record(id, self.clock.now());
        records.push(record.clone());
        Ok(record)
    }

    fn get_signature(&self, id: u64) -> Result<SignatureRecord, StoreError> {
        self.records
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("signature record {id}")))
    }

    fn signatures_for_proposal(
        &self,
        proposal_id: &str,
    ) -> Result<Vec<SignatureRecord>, StoreError> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.proposal_id == proposal_id)
            .cloned()
            .collect())
    }

    fn signature_count(&self) -> Result<u64, StoreError> {
        Ok(self.records.lock().unwrap().len() as u64)
    }
}

/// An in-memory meta store.
#[derive(Default)]
pub struct NullMetaStore {
    entries: Mutex<HashMap<String, Vec<u8>>>,
    schema_version: Mutex<u32>,
}

impl NullMetaStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MetaStore for NullMetaStore {
    fn put_meta(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn get_meta(&self, key: &str) -> Result<Vec<u8>, StoreError> {
        self.entries
            .lock()
            .unwrap()
            .get(key)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("meta key '{key}'")))
    }

    fn get_schema_version(&self) -> Result<u32, StoreError> {
        Ok(*self.schema_version.lock().unwrap())
    }

    fn set_schema_version(&self, version: u32) -> Result<(), StoreError> {
        *self.schema_version.lock().unwrap() = version;
        Ok(())
    }
}
