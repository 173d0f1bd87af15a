//! Nullable infrastructure for deterministic testing.
//!
//! The chain indexer, the signature database and the clock are abstracted
//! behind traits. This crate provides in-memory implementations that return
//! deterministic values, can be controlled programmatically and never touch
//! the filesystem or the network.

pub mod chain;
pub mod clock;
pub mod store;

pub use chain::{sample_parameters, NullChainContext};
pub use clock::NullClock;
pub use store::{NullMetaStore, NullSignatureStore};
