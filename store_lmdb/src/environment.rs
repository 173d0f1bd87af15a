//! LMDB environment setup.

use std::path::Path;
use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env, EnvOpenOptions};

use crate::{LmdbError, LmdbMetaStore, LmdbSignatureStore};

/// Name of the primary signature table, keyed by big-endian record id.
pub(crate) const SIGNATURES_DB: &str = "signatures";
/// Secondary index `blake2b_256(proposal_id) ++ id_be -> ()`.
pub(crate) const PROPOSAL_INDEX_DB: &str = "proposal_signatures";
pub(crate) const META_DB: &str = "meta";

/// Wraps the LMDB environment and all database handles.
#[derive(Clone)]
pub struct LmdbEnvironment {
    env: Arc<Env>,
    signatures_db: Database<Bytes, Bytes>,
    proposal_index_db: Database<Bytes, Bytes>,
    meta_db: Database<Bytes, Bytes>,
}

impl LmdbEnvironment {
    /// Open or create an LMDB environment at the given directory.
    pub fn open(path: &Path, max_dbs: u32, map_size: usize) -> Result<Self, LmdbError> {
        std::fs::create_dir_all(path)?;

        // SAFETY: the environment is opened once per directory by this
        // process and is never opened with conflicting flags.
        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(map_size)
                .max_dbs(max_dbs)
                .open(path)?
        };

        let mut wtxn = env.write_txn()?;
        let signatures_db = env.create_database(&mut wtxn, Some(SIGNATURES_DB))?;
        let proposal_index_db = env.create_database(&mut wtxn, Some(PROPOSAL_INDEX_DB))?;
        let meta_db = env.create_database(&mut wtxn, Some(META_DB))?;
        wtxn.commit()?;

        tracing::debug!(path = %path.display(), map_size, "opened LMDB environment");

        Ok(Self {
            env: Arc::new(env),
            signatures_db,
            proposal_index_db,
            meta_db,
        })
    }

    pub fn env(&self) -> &Arc<Env> {
        &self.env
    }

    pub fn signature_store(&self) -> LmdbSignatureStore {
        LmdbSignatureStore {
            env: Arc::clone(&self.env),
            signatures_db: self.signatures_db,
            proposal_index_db: self.proposal_index_db,
        }
    }

    pub fn meta_store(&self) -> LmdbMetaStore {
        LmdbMetaStore {
            env: Arc::clone(&self.env),
            meta_db: self.meta_db,
        }
    }
}
