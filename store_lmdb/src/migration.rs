//! Schema versioning for the signature database.
//!
//! The meta store holds the version the files were last written with. Older
//! files are upgraded one step at a time; newer ones are refused.

use oracle_store::MetaStore;
use tracing::info;

use crate::LmdbError;

/// Version 1: bincode signature records keyed by big-endian id, plus the
/// `blake2b_256(proposal) ‖ id` index.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

pub struct Migrator;

impl Migrator {
    /// Bring the database at `meta_store` to [`CURRENT_SCHEMA_VERSION`].
    ///
    /// Version 0 is a database nothing has been written to yet.
    pub fn run(meta_store: &impl MetaStore) -> Result<(), LmdbError> {
        let found = meta_store.get_schema_version()?;
        if found > CURRENT_SCHEMA_VERSION {
            return Err(LmdbError::Schema(format!(
                "files are at version {found}, this build reads up to {CURRENT_SCHEMA_VERSION}"
            )));
        }
        if found == CURRENT_SCHEMA_VERSION {
            info!(version = found, "signature store schema current");
            return Ok(());
        }

        for from in found..CURRENT_SCHEMA_VERSION {
            upgrade(from)?;
            meta_store.set_schema_version(from + 1)?;
            info!(from, to = from + 1, "signature store upgraded");
        }
        Ok(())
    }
}

/// One step from `from` to `from + 1`.
fn upgrade(from: u32) -> Result<(), LmdbError> {
    match from {
        // The databases are created on open; stamping is all there is to do.
        0 => Ok(()),
        other => Err(LmdbError::Schema(format!("no upgrade from version {other}"))),
    }
}
