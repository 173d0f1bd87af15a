//! Fundamental types for the oracle/escrow coordination layer.
//!
//! This crate defines the chain-facing types shared by every other crate in
//! the workspace: key material, hashes, addresses, values, UTXOs, timestamps
//! and the network identifier. Encoding to bech32 or CBOR lives elsewhere;
//! these types only carry bytes.

pub mod address;
pub mod error;
pub mod hash;
pub mod keys;
pub mod network;
pub mod time;
pub mod utxo;
pub mod value;

pub use address::{Address, Credential};
pub use error::OracleError;
pub use hash::{DatumHash, KeyHash, ScriptHash, TxHash};
pub use keys::{KeyPair, PrivateKey, PublicKey, Signature};
pub use network::NetworkId;
pub use time::Timestamp;
pub use utxo::{DatumOption, TransactionInput, TransactionOutput, Utxo};
pub use value::{AssetName, MultiAsset, Value, LOVELACE_PER_ADA};
