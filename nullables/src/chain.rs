//! Nullable chain: an in-memory UTXO set that records what is submitted.

use async_trait::async_trait;
use minicbor::Decoder;
use oracle_chain::{
    ChainContext, ChainError, Evaluation, ExUnits, ProtocolParameters, RedeemerPointer,
};
use oracle_types::{Address, NetworkId, TransactionInput, TxHash, Utxo};
use std::sync::Mutex;

/// Budget reported for every spend redeemer unless overridden.
pub const DEFAULT_EX_UNITS: ExUnits = ExUnits {
    mem: 1_000_000,
    steps: 400_000_000,
};

/// Redeemer indices covered by the default evaluation.
const EVALUATED_INPUTS: u32 = 32;

/// Parameters close to preprod, with a short cost model.
pub fn sample_parameters() -> ProtocolParameters {
    ProtocolParameters {
        min_fee_a: 44,
        min_fee_b: 155_381,
        max_tx_size: 16_384,
        coins_per_utxo_size: 4_310,
        price_mem: 0.0577,
        price_step: 0.0000721,
        max_tx_ex_mem: 14_000_000,
        max_tx_ex_steps: 10_000_000_000,
        collateral_percent: 150,
        max_collateral_inputs: 3,
        plutus_v2_cost_model: vec![205_665, 812, 1, 1, 1000, 571, 0, 1, 1000, 24_177],
    }
}

/// A chain context for tests.
///
/// Queries are answered from the configured UTXO set. Submitted transactions
/// are recorded and get the id the ledger would assign them; the UTXO set is
/// not updated.
pub struct NullChainContext {
    network: NetworkId,
    utxos: Mutex<Vec<Utxo>>,
    params: Mutex<ProtocolParameters>,
    evaluation: Mutex<Option<Evaluation>>,
    evaluated: Mutex<Vec<Vec<u8>>>,
    submitted: Mutex<Vec<Vec<u8>>>,
    reject_submit: Mutex<Option<String>>,
}

impl NullChainContext {
    pub fn new(network: NetworkId) -> Self {
        Self {
            network,
            utxos: Mutex::new(Vec::new()),
            params: Mutex::new(sample_parameters()),
            evaluation: Mutex::new(None),
            evaluated: Mutex::new(Vec::new()),
            submitted: Mutex::new(Vec::new()),
            reject_submit: Mutex::new(None),
        }
    }

    pub fn add_utxo(&self, utxo: Utxo) {
        self.utxos.lock().unwrap().push(utxo);
    }

    pub fn set_parameters(&self, params: ProtocolParameters) {
        *self.params.lock().unwrap() = params;
    }

    /// Replace the default per-redeemer budget with a fixed evaluation.
    pub fn set_evaluation(&self, evaluation: Evaluation) {
        *self.evaluation.lock().unwrap() = Some(evaluation);
    }

    /// Make every subsequent submission fail with `reason`.
    pub fn reject_submissions(&self, reason: &str) {
        *self.reject_submit.lock().unwrap() = Some(reason.to_string());
    }

    /// Transactions passed to `evaluate`, in call order.
    pub fn evaluated(&self) -> Vec<Vec<u8>> {
        self.evaluated.lock().unwrap().clone()
    }

    /// Transactions passed to `submit`, in call order.
    pub fn submitted(&self) -> Vec<Vec<u8>> {
        self.submitted.lock().unwrap().clone()
    }
}

/// Id of a serialized transaction: the hash of its body bytes.
fn transaction_id(tx_cbor: &[u8]) -> Result<TxHash, ChainError> {
    let invalid = |e: minicbor::decode::Error| ChainError::InvalidResponse(e.to_string());
    let mut d = Decoder::new(tx_cbor);
    d.array().map_err(invalid)?;
    let start = d.position();
    d.skip().map_err(invalid)?;
    Ok(oracle_crypto::hash_transaction_body(
        &tx_cbor[start..d.position()],
    ))
}

#[async_trait]
impl ChainContext for NullChainContext {
    fn network(&self) -> NetworkId {
        self.network
    }

    async fn utxos(&self, address: &Address) -> Result<Vec<Utxo>, ChainError> {
        Ok(self
            .utxos
            .lock()
            .unwrap()
            .iter()
            .filter(|u| u.output.address == *address)
            .cloned()
            .collect())
    }

    async fn utxo(&self, input: &TransactionInput) -> Result<Utxo, ChainError> {
        self.utxos
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.input == *input)
            .cloned()
            .ok_or_else(|| ChainError::NotFound(format!("utxo {input}")))
    }

    async fn protocol_parameters(&self) -> Result<ProtocolParameters, ChainError> {
        Ok(self.params.lock().unwrap().clone())
    }

    async fn evaluate(&self, tx_cbor: &[u8]) -> Result<Evaluation, ChainError> {
        self.evaluated.lock().unwrap().push(tx_cbor.to_vec());
        if let Some(evaluation) = self.evaluation.lock().unwrap().clone() {
            return Ok(evaluation);
        }
        Ok((0..EVALUATED_INPUTS)
            .map(|i| (RedeemerPointer::spend(i), DEFAULT_EX_UNITS))
            .collect())
    }

    async fn submit(&self, tx_cbor: &[u8]) -> Result<TxHash, ChainError> {
        if let Some(reason) = self.reject_submit.lock().unwrap().clone() {
            return Err(ChainError::Submit(reason));
        }
        let id = transaction_id(tx_cbor)?;
        self.submitted.lock().unwrap().push(tx_cbor.to_vec());
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oracle_types::{Credential, KeyHash, TransactionOutput, Value};

    fn address(b: u8) -> Address {
        Address::enterprise(NetworkId::Testnet, Credential::Key(KeyHash::new([b; 28])))
    }

    fn utxo(b: u8, addr: Address) -> Utxo {
        Utxo::new(
            TransactionInput::new(TxHash::new([b; 32]), 0),
            TransactionOutput::new(addr, Value::lovelace(5_000_000)),
        )
    }

    #[tokio::test]
    async fn filters_by_address() {
        let chain = NullChainContext::new(NetworkId::Testnet);
        chain.add_utxo(utxo(1, address(1)));
        chain.add_utxo(utxo(2, address(2)));
        assert_eq!(chain.utxos(&address(1)).await.unwrap().len(), 1);
        assert!(chain.utxos(&address(3)).await.unwrap().is_empty());
        assert!(matches!(
            chain
                .utxo(&TransactionInput::new(TxHash::new([9; 32]), 0))
                .await,
            Err(ChainError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn submit_hashes_body() {
        let chain = NullChainContext::new(NetworkId::Testnet);
        // [{}, {}, true, null]
        let tx = [0x84, 0xa0, 0xa0, 0xf5, 0xf6];
        let id = chain.submit(&tx).await.unwrap();
        assert_eq!(id, oracle_crypto::hash_transaction_body(&[0xa0]));
        assert_eq!(chain.submitted(), vec![tx.to_vec()]);

        chain.reject_submissions("bad");
        assert!(matches!(chain.submit(&tx).await, Err(ChainError::Submit(_))));
    }

    #[tokio::test]
    async fn default_evaluation_covers_spends() {
        let chain = NullChainContext::new(NetworkId::Testnet);
        let evaluation = chain.evaluate(&[0x80]).await.unwrap();
        assert_eq!(evaluation[&RedeemerPointer::spend(3)], DEFAULT_EX_UNITS);
        assert_eq!(chain.evaluated().len(), 1);
    }
}
