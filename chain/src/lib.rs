//! Access to chain state through an indexer.
//!
//! [`ChainContext`] is the seam every transaction flow and the HTTP endpoint
//! depend on. [`BlockfrostClient`] implements it over the Blockfrost REST API;
//! tests use the in-memory context from `oracle-nullables`.

pub mod blockfrost;
pub mod config;
pub mod context;
pub mod error;
pub mod params;

pub use blockfrost::BlockfrostClient;
pub use config::ChainConfig;
pub use context::ChainContext;
pub use error::ChainError;
pub use params::{Evaluation, ExUnits, ProtocolParameters, RedeemerPointer, RedeemerTag};
