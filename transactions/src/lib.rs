//! Transaction assembly for the oracle and escrow scripts.
//!
//! Flows:
//! - **create_data_request**: lock funds and an oracle datum at the oracle script
//! - **submit_oracle_data**: spend the oracle output with quorum signatures and
//!   re-lock it with the results written into the datum
//! - **create_escrow**: lock funds and an escrow datum at the escrow script
//! - **execute_escrow**: pay out an escrow against a resolved oracle output
//! - **reclaim_escrow**: return an escrow to its creator after the deadline
//!
//! Every flow signs with a placeholder key so the fee accounts for one
//! witness; [`assemble`] swaps in the real payer's witness afterwards.

pub mod assemble;
pub mod builder;
pub mod error;
pub mod escrow;
pub mod oracle;
pub mod quorum;
pub mod script;
pub mod transaction;

pub use assemble::{assemble, placeholder_key};
pub use builder::TransactionBuilder;
pub use error::TxBuildError;
pub use escrow::{
    create_escrow, execute_escrow, reclaim_escrow, EscrowDeposit, EscrowPayout, EscrowReclaim,
};
pub use oracle::{
    create_data_request, oracle_datum, submit_oracle_data, DataRequest, OracleSubmission,
    RESULTS_LOCK_LOVELACE,
};
pub use quorum::{collect_signatures, MISSING_SIGNATURE};
pub use script::PlutusScript;
pub use transaction::{Redeemer, Transaction, TransactionBody, VKeyWitness, WitnessSet};
