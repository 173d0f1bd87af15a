use async_trait::async_trait;
use oracle_types::{Address, NetworkId, TransactionInput, TxHash, Utxo};

use crate::{ChainError, Evaluation, ProtocolParameters};

/// Read and write access to the chain.
///
/// Calls are awaited one at a time by the transaction flows; implementations
/// do not retry.
#[async_trait]
pub trait ChainContext: Send + Sync {
    fn network(&self) -> NetworkId;

    /// Every unspent output at `address`. An address with no history yields
    /// an empty list.
    async fn utxos(&self, address: &Address) -> Result<Vec<Utxo>, ChainError>;

    /// The output referenced by `input`.
    async fn utxo(&self, input: &TransactionInput) -> Result<Utxo, ChainError>;

    async fn protocol_parameters(&self) -> Result<ProtocolParameters, ChainError>;

    /// Execution units for every redeemer of a serialized transaction.
    async fn evaluate(&self, tx_cbor: &[u8]) -> Result<Evaluation, ChainError>;

    async fn submit(&self, tx_cbor: &[u8]) -> Result<TxHash, ChainError>;
}
