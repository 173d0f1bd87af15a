//! Blockfrost REST client.

use async_trait::async_trait;
use oracle_types::{
    Address, AssetName, DatumHash, DatumOption, NetworkId, ScriptHash, TransactionInput,
    TransactionOutput, TxHash, Utxo, Value,
};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, warn};

use crate::{
    ChainConfig, ChainContext, ChainError, Evaluation, ExUnits, ProtocolParameters,
    RedeemerPointer,
};

/// Blockfrost pages address UTXO listings at this many entries.
const PAGE_SIZE: usize = 100;

/// HTTP client for the Blockfrost API.
///
/// Every request carries the `project_id` header from the configuration.
#[derive(Clone)]
pub struct BlockfrostClient {
    http: reqwest::Client,
    config: ChainConfig,
}

impl BlockfrostClient {
    pub fn new(config: ChainConfig) -> Result<Self, ChainError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| ChainError::Http(format!("failed to create HTTP client: {e}")))?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &ChainConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url(), path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ChainError> {
        debug!(path, "blockfrost GET");
        let response = self
            .http
            .get(self.url(path))
            .header("project_id", &self.config.project_id)
            .send()
            .await?;
        read_json(response, path).await
    }

    async fn post_cbor<T: DeserializeOwned>(
        &self,
        path: &str,
        body: Vec<u8>,
    ) -> Result<T, ChainError> {
        debug!(path, bytes = body.len(), "blockfrost POST");
        let response = self
            .http
            .post(self.url(path))
            .header("project_id", &self.config.project_id)
            .header(reqwest::header::CONTENT_TYPE, "application/cbor")
            .body(body)
            .send()
            .await?;
        read_json(response, path).await
    }
}

async fn read_json<T: DeserializeOwned>(
    response: reqwest::Response,
    path: &str,
) -> Result<T, ChainError> {
    let status = response.status();
    if status == StatusCode::NOT_FOUND {
        return Err(ChainError::NotFound(path.to_string()));
    }
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ChainError::Status {
            status: status.as_u16(),
            body,
        });
    }
    response
        .json()
        .await
        .map_err(|e| ChainError::InvalidResponse(format!("{path}: {e}")))
}

#[async_trait]
impl ChainContext for BlockfrostClient {
    fn network(&self) -> NetworkId {
        self.config.network
    }

    async fn utxos(&self, address: &Address) -> Result<Vec<Utxo>, ChainError> {
        let bech32 = oracle_crypto::encode_address(address)?;
        let mut utxos = Vec::new();
        for page in 1.. {
            let path = format!("/addresses/{bech32}/utxos?page={page}");
            let entries: Vec<AddressUtxo> = match self.get_json(&path).await {
                Ok(entries) => entries,
                // Addresses that never received funds are unknown to the indexer.
                Err(ChainError::NotFound(_)) => Vec::new(),
                Err(e) => return Err(e),
            };
            let full_page = entries.len() == PAGE_SIZE;
            for entry in entries {
                utxos.push(entry.into_utxo()?);
            }
            if !full_page {
                break;
            }
        }
        debug!(address = %bech32, count = utxos.len(), "fetched address utxos");
        Ok(utxos)
    }

    async fn utxo(&self, input: &TransactionInput) -> Result<Utxo, ChainError> {
        let tx: TxUtxos = self
            .get_json(&format!("/txs/{}/utxos", input.tx_hash))
            .await?;
        let output = tx
            .outputs
            .into_iter()
            .find(|o| o.output_index == input.index && !o.collateral)
            .ok_or_else(|| ChainError::NotFound(input.to_string()))?;
        Ok(Utxo::new(*input, output.into_output()?))
    }

    async fn protocol_parameters(&self) -> Result<ProtocolParameters, ChainError> {
        let raw: RawParameters = self.get_json("/epochs/latest/parameters").await?;
        raw.try_into()
    }

    async fn evaluate(&self, tx_cbor: &[u8]) -> Result<Evaluation, ChainError> {
        let body = hex::encode(tx_cbor).into_bytes();
        let response: serde_json::Value = self.post_cbor("/utils/txs/evaluate", body).await?;
        parse_evaluation(&response)
    }

    async fn submit(&self, tx_cbor: &[u8]) -> Result<TxHash, ChainError> {
        let id: String = self
            .post_cbor("/tx/submit", tx_cbor.to_vec())
            .await
            .map_err(|e| match e {
                ChainError::Status { body, .. } => ChainError::Submit(body),
                other => other,
            })?;
        Ok(TxHash::from_hex(id.trim_matches('"'))?)
    }
}

// Response shapes.

#[derive(Debug, Deserialize)]
struct Amount {
    unit: String,
    quantity: String,
}

#[derive(Debug, Deserialize)]
struct AddressUtxo {
    address: String,
    tx_hash: String,
    output_index: u32,
    amount: Vec<Amount>,
    data_hash: Option<String>,
    inline_datum: Option<String>,
    reference_script_hash: Option<String>,
}

impl AddressUtxo {
    fn into_utxo(self) -> Result<Utxo, ChainError> {
        let input = TransactionInput::new(TxHash::from_hex(&self.tx_hash)?, self.output_index);
        let output = build_output(
            &self.address,
            &self.amount,
            self.data_hash.as_deref(),
            self.inline_datum.as_deref(),
            self.reference_script_hash.as_deref(),
        )?;
        Ok(Utxo::new(input, output))
    }
}

#[derive(Debug, Deserialize)]
struct TxUtxos {
    outputs: Vec<TxOutput>,
}

#[derive(Debug, Deserialize)]
struct TxOutput {
    address: String,
    amount: Vec<Amount>,
    output_index: u32,
    data_hash: Option<String>,
    inline_datum: Option<String>,
    #[serde(default)]
    collateral: bool,
    reference_script_hash: Option<String>,
}

impl TxOutput {
    fn into_output(self) -> Result<TransactionOutput, ChainError> {
        build_output(
            &self.address,
            &self.amount,
            self.data_hash.as_deref(),
            self.inline_datum.as_deref(),
            self.reference_script_hash.as_deref(),
        )
    }
}

fn build_output(
    address: &str,
    amount: &[Amount],
    data_hash: Option<&str>,
    inline_datum: Option<&str>,
    reference_script_hash: Option<&str>,
) -> Result<TransactionOutput, ChainError> {
    let mut output = TransactionOutput::new(
        oracle_crypto::decode_address(address)?,
        parse_amounts(amount)?,
    );
    output.datum = match (inline_datum, data_hash) {
        (Some(cbor), _) => Some(DatumOption::Inline(hex::decode(cbor).map_err(|e| {
            ChainError::InvalidResponse(format!("inline datum is not hex: {e}"))
        })?)),
        (None, Some(hash)) => Some(DatumOption::Hash(DatumHash::from_hex(hash)?)),
        (None, None) => None,
    };
    if let Some(hash) = reference_script_hash {
        // Only the hash is listed; spending flows attach their scripts directly.
        warn!(script_hash = hash, "ignoring reference script on utxo");
    }
    Ok(output)
}

fn parse_amounts(amounts: &[Amount]) -> Result<Value, ChainError> {
    let mut value = Value::ZERO;
    for Amount { unit, quantity } in amounts {
        let quantity: u64 = quantity
            .parse()
            .map_err(|e| ChainError::InvalidResponse(format!("quantity {quantity:?}: {e}")))?;
        if unit == "lovelace" {
            value = value
                .checked_add(&Value::lovelace(quantity))
                .ok_or(oracle_types::OracleError::ValueOverflow)?;
            continue;
        }
        if unit.len() < ScriptHash::LEN * 2 || !unit.is_char_boundary(ScriptHash::LEN * 2) {
            return Err(ChainError::InvalidResponse(format!("asset unit {unit:?}")));
        }
        let (policy, name) = unit.split_at(ScriptHash::LEN * 2);
        let name = hex::decode(name)
            .map_err(|e| ChainError::InvalidResponse(format!("asset name in {unit:?}: {e}")))?;
        value = value.with_asset(ScriptHash::from_hex(policy)?, AssetName(name), quantity);
    }
    Ok(value)
}

#[derive(Debug, Deserialize)]
struct RawParameters {
    min_fee_a: u64,
    min_fee_b: u64,
    max_tx_size: u64,
    coins_per_utxo_size: Option<String>,
    price_mem: Option<f64>,
    price_step: Option<f64>,
    max_tx_ex_mem: Option<String>,
    max_tx_ex_steps: Option<String>,
    collateral_percent: Option<u64>,
    max_collateral_inputs: Option<u64>,
    #[serde(default)]
    cost_models_raw: Option<HashMap<String, Vec<i64>>>,
}

fn numeric(field: &'static str, value: Option<String>) -> Result<u64, ChainError> {
    value
        .ok_or(ChainError::MissingParameter(field))?
        .parse()
        .map_err(|e| ChainError::InvalidResponse(format!("{field}: {e}")))
}

impl TryFrom<RawParameters> for ProtocolParameters {
    type Error = ChainError;

    fn try_from(raw: RawParameters) -> Result<Self, Self::Error> {
        let plutus_v2_cost_model = raw
            .cost_models_raw
            .and_then(|mut models| models.remove("PlutusV2"))
            .ok_or(ChainError::MissingParameter("cost_models_raw.PlutusV2"))?;
        Ok(Self {
            min_fee_a: raw.min_fee_a,
            min_fee_b: raw.min_fee_b,
            max_tx_size: raw.max_tx_size,
            coins_per_utxo_size: numeric("coins_per_utxo_size", raw.coins_per_utxo_size)?,
            price_mem: raw.price_mem.ok_or(ChainError::MissingParameter("price_mem"))?,
            price_step: raw.price_step.ok_or(ChainError::MissingParameter("price_step"))?,
            max_tx_ex_mem: numeric("max_tx_ex_mem", raw.max_tx_ex_mem)?,
            max_tx_ex_steps: numeric("max_tx_ex_steps", raw.max_tx_ex_steps)?,
            collateral_percent: raw
                .collateral_percent
                .ok_or(ChainError::MissingParameter("collateral_percent"))?,
            max_collateral_inputs: raw
                .max_collateral_inputs
                .ok_or(ChainError::MissingParameter("max_collateral_inputs"))?,
            plutus_v2_cost_model,
        })
    }
}

/// Reads `result.EvaluationResult`, or reports `result.EvaluationFailure`.
fn parse_evaluation(response: &serde_json::Value) -> Result<Evaluation, ChainError> {
    let result = response
        .get("result")
        .ok_or_else(|| ChainError::Evaluation(response.to_string()))?;
    if let Some(failure) = result.get("EvaluationFailure") {
        return Err(ChainError::Evaluation(failure.to_string()));
    }
    let units = result
        .get("EvaluationResult")
        .and_then(|r| r.as_object())
        .ok_or_else(|| ChainError::Evaluation(result.to_string()))?;

    let mut evaluation = Evaluation::new();
    for (pointer, budget) in units {
        let mem = budget.get("memory").and_then(|v| v.as_u64());
        let steps = budget.get("steps").and_then(|v| v.as_u64());
        let (Some(mem), Some(steps)) = (mem, steps) else {
            return Err(ChainError::InvalidResponse(format!(
                "budget for {pointer}: {budget}"
            )));
        };
        evaluation.insert(pointer.parse::<RedeemerPointer>()?, ExUnits::new(mem, steps));
    }
    Ok(evaluation)
}
