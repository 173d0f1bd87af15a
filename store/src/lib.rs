//! Abstract storage traits for the signature collection service.
//!
//! Backends (LMDB, in-memory for testing) implement these traits. The HTTP
//! layer and the CLI depend only on the traits.

pub mod error;
pub mod meta;
pub mod signature;

pub use error::StoreError;
pub use meta::MetaStore;
pub use signature::{NewSignatureRecord, SignatureRecord, SignatureStore};
