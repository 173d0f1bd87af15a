//! LMDB storage backend for oracle signature submissions.
//!
//! Implements the traits from `oracle-store` using the `heed` LMDB bindings.
//! All databases live in a single environment opened by [`LmdbEnvironment`].

pub mod environment;
pub mod error;
pub mod integrity;
pub mod meta;
pub mod migration;
pub mod signature;

pub use environment::LmdbEnvironment;
pub use error::LmdbError;
pub use integrity::{check_data_dir, check_integrity, IntegrityReport};
pub use meta::LmdbMetaStore;
pub use migration::{Migrator, CURRENT_SCHEMA_VERSION};
pub use signature::LmdbSignatureStore;

/// Smallest byte string greater than every key starting with `prefix`.
///
/// Trailing `0xFF` bytes carry; an all-`0xFF` prefix becomes empty, which
/// callers treat as "no upper bound".
pub(crate) fn increment_prefix(prefix: &mut Vec<u8>) {
    while let Some(last) = prefix.pop() {
        if last < 0xFF {
            prefix.push(last + 1);
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::increment_prefix;

    #[test]
    fn increment_simple() {
        let mut p = b"abc".to_vec();
        increment_prefix(&mut p);
        assert_eq!(p, b"abd");
    }

    #[test]
    fn increment_carries() {
        let mut p = vec![0x01, 0xFF, 0xFF];
        increment_prefix(&mut p);
        assert_eq!(p, vec![0x02]);

        let mut all = vec![0xFF, 0xFF];
        increment_prefix(&mut all);
        assert!(all.is_empty());
    }
}
