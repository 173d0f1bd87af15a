//! On-chain record encoding for the oracle and escrow scripts.
//!
//! Everything the validators read is Plutus data serialized as CBOR. The
//! [`PlutusData`] codec follows the conventions of the off-chain tooling the
//! scripts were written against: constructor tags 121..=127 and 1280..,
//! indefinite-length encoding for non-empty lists and constructor fields, and
//! byte strings chunked at 64 bytes.
//!
//! On top of the codec sit the positional records:
//! - [`OracleDatum`]: a proposal with its oracle set and, once resolved, results
//! - [`EscrowDatum`]: funds released according to a resolved vote tally
//! - [`OracleRedeemer`] and [`EscrowRedeemer`]: the spending actions

pub mod error;
pub mod escrow;
pub mod oracle;
pub mod plutus;
pub mod redeemer;
pub mod votes;

pub use error::DatumError;
pub use escrow::{EscrowDatum, EscrowRedeemer, VoteUse};
pub use oracle::{OracleDatum, OracleDatumView};
pub use plutus::PlutusData;
pub use redeemer::OracleRedeemer;
pub use votes::{Vote, VoteTally};
