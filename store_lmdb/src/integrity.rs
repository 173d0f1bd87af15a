//! LMDB database integrity checks.
//!
//! Run on startup to detect corruption before the server accepts
//! submissions.

use std::path::Path;
use std::sync::Arc;

use heed::Env;

use crate::environment::{META_DB, PROPOSAL_INDEX_DB, SIGNATURES_DB};
use crate::LmdbError;

/// Summary of an integrity check run.
#[derive(Debug)]
pub struct IntegrityReport {
    pub databases_checked: u32,
    pub total_entries: u64,
    pub errors: Vec<String>,
}

impl IntegrityReport {
    pub fn is_healthy(&self) -> bool {
        self.errors.is_empty()
    }
}

const EXPECTED_DATABASES: &[&str] = &[SIGNATURES_DB, PROPOSAL_INDEX_DB, META_DB];

/// Open each expected database and count its entries.
///
/// Read failures are collected in the report instead of aborting. The
/// signature table and its proposal index must hold the same number of
/// entries.
pub fn check_integrity(env: &Arc<Env>) -> Result<IntegrityReport, LmdbError> {
    let mut report = IntegrityReport {
        databases_checked: 0,
        total_entries: 0,
        errors: Vec::new(),
    };
    let mut counts = Vec::with_capacity(EXPECTED_DATABASES.len());

    let rtxn = env.read_txn()?;
    for &db_name in EXPECTED_DATABASES {
        match env.open_database::<heed::types::Bytes, heed::types::Bytes>(&rtxn, Some(db_name)) {
            Ok(Some(db)) => {
                report.databases_checked += 1;
                match db.len(&rtxn) {
                    Ok(count) => {
                        report.total_entries += count;
                        counts.push((db_name, count));
                    }
                    Err(e) => report
                        .errors
                        .push(format!("failed to read database '{}': {}", db_name, e)),
                }
            }
            Ok(None) => report
                .errors
                .push(format!("database '{}' is missing", db_name)),
            Err(e) => report
                .errors
                .push(format!("failed to open database '{}': {}", db_name, e)),
        }
    }

    let count_of = |name: &str| counts.iter().find(|(n, _)| *n == name).map(|(_, c)| *c);
    if let (Some(rows), Some(indexed)) = (count_of(SIGNATURES_DB), count_of(PROPOSAL_INDEX_DB)) {
        if rows != indexed {
            report.errors.push(format!(
                "proposal index holds {} entries for {} signatures",
                indexed, rows
            ));
        }
    }

    Ok(report)
}

/// Check that an existing data directory looks like an LMDB environment.
///
/// A nonexistent directory is a fresh start.
pub fn check_data_dir(path: &Path) -> Result<(), String> {
    if !path.exists() {
        return Ok(());
    }
    let data_file = path.join("data.mdb");
    if path.read_dir().map(|mut d| d.next().is_some()).unwrap_or(false) && !data_file.exists() {
        return Err(format!(
            "data directory is not empty but data.mdb is missing at {}",
            path.display()
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LmdbEnvironment;

    #[test]
    fn check_data_dir_fresh_path() {
        let dir = tempfile::tempdir().unwrap();
        assert!(check_data_dir(&dir.path().join("absent")).is_ok());
        assert!(check_data_dir(dir.path()).is_ok());
    }

    #[test]
    fn check_data_dir_foreign_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"x").unwrap();
        assert!(check_data_dir(dir.path()).is_err());
    }

    #[test]
    fn fresh_environment_is_healthy() {
        let dir = tempfile::tempdir().unwrap();
        let env = LmdbEnvironment::open(dir.path(), 8, 1 << 20).unwrap();
        let report = check_integrity(env.env()).unwrap();
        assert!(report.is_healthy(), "{:?}", report.errors);
        assert_eq!(report.databases_checked, 3);
        assert_eq!(report.total_entries, 0);
    }
}
