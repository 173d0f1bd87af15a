//! Balancing and signing of script transactions.

use std::collections::{BTreeMap, BTreeSet};

use oracle_chain::{ChainContext, ExUnits, ProtocolParameters, RedeemerPointer, RedeemerTag};
use oracle_datum::PlutusData;
use oracle_types::{
    Address, KeyHash, OracleError, PrivateKey, TransactionInput, TransactionOutput, Utxo, Value,
};
use tracing::{debug, info};

use crate::script::PlutusScript;
use crate::transaction::{
    output_size, script_data_hash, Redeemer, Transaction, TransactionBody, VKeyWitness, WitnessSet,
};
use crate::TxBuildError;

/// Fee recomputation stops once the fee covers the size it produces.
const MAX_FEE_ITERATIONS: usize = 5;

/// Rough size of a key-address change output, used while selecting inputs.
const CHANGE_OUTPUT_ESTIMATE: usize = 65;

struct ScriptInput {
    utxo: Utxo,
    script: PlutusScript,
    redeemer: PlutusData,
}

/// Collects the pieces of a transaction, then balances and signs it.
///
/// Inputs added explicitly are always spent. When they do not cover the
/// outputs, further UTXOs are taken from the input addresses in the order the
/// indexer lists them. Whatever is left after outputs and fee becomes change.
pub struct TransactionBuilder<'a> {
    context: &'a dyn ChainContext,
    inputs: Vec<Utxo>,
    script_inputs: Vec<ScriptInput>,
    input_addresses: Vec<Address>,
    outputs: Vec<TransactionOutput>,
    collateral: Vec<Utxo>,
    reference_inputs: Vec<TransactionInput>,
    required_signers: Vec<KeyHash>,
    validity_start: Option<u64>,
}

impl<'a> TransactionBuilder<'a> {
    pub fn new(context: &'a dyn ChainContext) -> Self {
        Self {
            context,
            inputs: Vec::new(),
            script_inputs: Vec::new(),
            input_addresses: Vec::new(),
            outputs: Vec::new(),
            collateral: Vec::new(),
            reference_inputs: Vec::new(),
            required_signers: Vec::new(),
            validity_start: None,
        }
    }

    pub fn add_input(&mut self, utxo: Utxo) -> &mut Self {
        self.inputs.push(utxo);
        self
    }

    /// Spend a script-locked output with the given spend redeemer.
    pub fn add_script_input(
        &mut self,
        utxo: Utxo,
        script: PlutusScript,
        redeemer: PlutusData,
    ) -> &mut Self {
        self.script_inputs.push(ScriptInput {
            utxo,
            script,
            redeemer,
        });
        self
    }

    pub fn add_input_address(&mut self, address: Address) -> &mut Self {
        self.input_addresses.push(address);
        self
    }

    pub fn add_output(&mut self, output: TransactionOutput) -> &mut Self {
        self.outputs.push(output);
        self
    }

    pub fn add_collateral(&mut self, utxo: Utxo) -> &mut Self {
        self.collateral.push(utxo);
        self
    }

    pub fn add_reference_input(&mut self, input: TransactionInput) -> &mut Self {
        self.reference_inputs.push(input);
        self
    }

    pub fn add_required_signer(&mut self, key_hash: KeyHash) -> &mut Self {
        self.required_signers.push(key_hash);
        self
    }

    pub fn validity_start(&mut self, slot: u64) -> &mut Self {
        self.validity_start = Some(slot);
        self
    }

    /// Select inputs, evaluate scripts, fix the fee and sign with every key.
    ///
    /// Change goes to `change_address`, merged into an existing plain output
    /// to that address when there is one.
    pub async fn build_and_sign(
        &self,
        signing_keys: &[&PrivateKey],
        change_address: &Address,
    ) -> Result<Transaction, TxBuildError> {
        let params = self.context.protocol_parameters().await?;
        if !self.script_inputs.is_empty() && self.collateral.is_empty() {
            return Err(TxBuildError::MissingCollateral);
        }

        let selected = self.select_inputs(&params).await?;
        let sorted: Vec<TransactionInput> = selected.keys().copied().collect();

        let mut ex_units = placeholder_units(&params, self.script_inputs.len());
        if !self.script_inputs.is_empty() {
            let draft = self.balance(&params, &selected, &ex_units, 0, change_address, signing_keys)?;
            let evaluation = self.context.evaluate(&draft.to_cbor()?).await?;
            ex_units = self
                .script_inputs
                .iter()
                .map(|s| {
                    let pointer = RedeemerPointer::spend(redeemer_index(&sorted, &s.utxo.input)?);
                    evaluation
                        .get(&pointer)
                        .copied()
                        .ok_or_else(|| TxBuildError::MissingExUnits(pointer.to_string()))
                })
                .collect::<Result<Vec<_>, _>>()?;
            debug!(?ex_units, "scripts evaluated");
        }

        let mut fee = 0;
        for _ in 0..MAX_FEE_ITERATIONS {
            let tx = self.balance(&params, &selected, &ex_units, fee, change_address, signing_keys)?;
            let size = tx.size()?;
            let required = params.linear_fee(size) + params.execution_fee(&tx.total_ex_units());
            if required <= tx.body.fee {
                self.check_limits(&params, &tx, size)?;
                info!(
                    inputs = tx.body.inputs.len(),
                    outputs = tx.body.outputs.len(),
                    fee = tx.body.fee,
                    size,
                    "transaction balanced"
                );
                return Ok(tx);
            }
            fee = required;
        }
        Err(TxBuildError::FeeDidNotConverge(fee))
    }

    async fn select_inputs(
        &self,
        params: &ProtocolParameters,
    ) -> Result<BTreeMap<TransactionInput, Utxo>, TxBuildError> {
        let mut selected: BTreeMap<TransactionInput, Utxo> = self
            .inputs
            .iter()
            .chain(self.script_inputs.iter().map(|s| &s.utxo))
            .map(|u| (u.input, u.clone()))
            .collect();
        if self.input_addresses.is_empty() {
            return Ok(selected);
        }

        let mut margin = params.linear_fee(params.max_tx_size as usize)
            + params.min_lovelace(CHANGE_OUTPUT_ESTIMATE);
        if !self.script_inputs.is_empty() {
            margin += params.execution_fee(&params.max_ex_units());
        }
        let target = sum_values(self.outputs.iter().map(|o| &o.amount))?
            .checked_add(&Value::lovelace(margin))
            .ok_or(OracleError::ValueOverflow)?;
        let mut provided = sum_values(selected.values().map(Utxo::amount))?;
        let excluded: BTreeSet<TransactionInput> =
            self.collateral.iter().map(|u| u.input).collect();

        for address in &self.input_addresses {
            if provided.covers(&target) {
                break;
            }
            for utxo in self.context.utxos(address).await? {
                if provided.covers(&target) {
                    break;
                }
                if selected.contains_key(&utxo.input) || excluded.contains(&utxo.input) {
                    continue;
                }
                provided = provided
                    .checked_add(utxo.amount())
                    .ok_or(OracleError::ValueOverflow)?;
                selected.insert(utxo.input, utxo);
            }
        }
        debug!(count = selected.len(), total = %provided, "inputs selected");
        Ok(selected)
    }

    fn balance(
        &self,
        params: &ProtocolParameters,
        selected: &BTreeMap<TransactionInput, Utxo>,
        ex_units: &[ExUnits],
        fee: u64,
        change_address: &Address,
        signing_keys: &[&PrivateKey],
    ) -> Result<Transaction, TxBuildError> {
        let provided = sum_values(selected.values().map(Utxo::amount))?;
        let needed = sum_values(self.outputs.iter().map(|o| &o.amount))?
            .checked_add(&Value::lovelace(fee))
            .ok_or(OracleError::ValueOverflow)?;
        let change = provided
            .checked_sub(&needed)
            .ok_or_else(|| TxBuildError::InsufficientFunds {
                needed: needed.clone(),
                available: provided.clone(),
            })?;

        let mut fee = fee;
        let mut outputs = self.outputs.clone();
        if !change.is_zero() {
            let merge_target = outputs.iter_mut().find(|o| {
                o.address == *change_address && o.datum.is_none() && o.script_ref.is_none()
            });
            match merge_target {
                Some(existing) => {
                    existing.amount = existing
                        .amount
                        .checked_add(&change)
                        .ok_or(OracleError::ValueOverflow)?;
                }
                None => {
                    let output = TransactionOutput::new(*change_address, change.clone());
                    let minimum = params.min_lovelace(output_size(&output)?);
                    if change.coin() >= minimum {
                        outputs.push(output);
                    } else if change.has_assets() {
                        return Err(TxBuildError::ChangeBelowMinimum {
                            change: change.coin(),
                            minimum,
                        });
                    } else {
                        // Dust too small for its own output is paid as fee.
                        fee += change.coin();
                    }
                }
            }
        }
        for (index, output) in outputs.iter().enumerate() {
            let minimum = params.min_lovelace(output_size(output)?);
            if output.amount.coin() < minimum {
                return Err(TxBuildError::OutputBelowMinimum {
                    index,
                    coin: output.amount.coin(),
                    minimum,
                });
            }
        }

        let sorted: Vec<TransactionInput> = selected.keys().copied().collect();
        let redeemers = self
            .script_inputs
            .iter()
            .zip(ex_units)
            .map(|(s, units)| {
                Ok(Redeemer {
                    tag: RedeemerTag::Spend,
                    index: redeemer_index(&sorted, &s.utxo.input)?,
                    data: s.redeemer.clone(),
                    ex_units: *units,
                })
            })
            .collect::<Result<Vec<_>, TxBuildError>>()?;
        let script_data_hash = if redeemers.is_empty() {
            None
        } else {
            Some(script_data_hash(&redeemers, &params.plutus_v2_cost_model)?)
        };

        let body = TransactionBody {
            inputs: sorted,
            outputs,
            fee,
            validity_start: self.validity_start,
            script_data_hash,
            collateral: self.collateral.iter().map(|u| u.input).collect(),
            required_signers: self.required_signers.clone(),
            reference_inputs: self.reference_inputs.clone(),
        };
        let body_hash = body.hash()?;
        let vkey_witnesses = signing_keys
            .iter()
            .map(|key| VKeyWitness {
                vkey: oracle_crypto::public_from_private(key),
                signature: oracle_crypto::sign_message(body_hash.as_bytes(), key),
            })
            .collect();

        let mut plutus_v2_scripts: Vec<PlutusScript> = Vec::new();
        for s in &self.script_inputs {
            if !plutus_v2_scripts.contains(&s.script) {
                plutus_v2_scripts.push(s.script.clone());
            }
        }

        Ok(Transaction {
            body,
            witness_set: WitnessSet {
                vkey_witnesses,
                redeemers,
                plutus_v2_scripts,
            },
        })
    }

    fn check_limits(
        &self,
        params: &ProtocolParameters,
        tx: &Transaction,
        size: usize,
    ) -> Result<(), TxBuildError> {
        if size as u64 > params.max_tx_size {
            return Err(TxBuildError::TooLarge {
                size,
                max: params.max_tx_size,
            });
        }
        if !self.script_inputs.is_empty() {
            let required = params.required_collateral(tx.body.fee);
            let available: u64 = self.collateral.iter().map(|u| u.amount().coin()).sum();
            if available < required {
                return Err(TxBuildError::InsufficientCollateral {
                    required,
                    available,
                });
            }
        }
        Ok(())
    }
}

/// Budget used before evaluation: the per-transaction maximum split evenly.
fn placeholder_units(params: &ProtocolParameters, scripts: usize) -> Vec<ExUnits> {
    let n = scripts.max(1) as u64;
    vec![ExUnits::new(params.max_tx_ex_mem / n, params.max_tx_ex_steps / n); scripts]
}

fn redeemer_index(sorted: &[TransactionInput], input: &TransactionInput) -> Result<u32, TxBuildError> {
    let position = sorted
        .binary_search(input)
        .map_err(|_| TxBuildError::MissingExUnits(format!("script input {input} not selected")))?;
    u32::try_from(position).map_err(|_| OracleError::ValueOverflow.into())
}

fn sum_values<'v>(mut values: impl Iterator<Item = &'v Value>) -> Result<Value, TxBuildError> {
    values.try_fold(Value::ZERO, |acc, v| {
        acc.checked_add(v).ok_or(TxBuildError::Types(OracleError::ValueOverflow))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;
    use oracle_chain::Evaluation;
    use oracle_nullables::NullChainContext;
    use oracle_types::NetworkId;

    #[tokio::test]
    async fn change_merges_into_plain_output() {
        let chain = NullChainContext::new(NetworkId::Testnet);
        let mut builder = TransactionBuilder::new(&chain);
        builder
            .add_input(testing::utxo(1, 0, testing::wallet(1), 10_000_000))
            .add_output(TransactionOutput::new(testing::wallet(1), Value::lovelace(2_000_000)));
        let tx = builder
            .build_and_sign(&[&testing::key(1)], &testing::wallet(1))
            .await
            .unwrap();
        assert_eq!(tx.body.outputs.len(), 1);
        assert_eq!(tx.body.outputs[0].amount.coin() + tx.body.fee, 10_000_000);
    }

    #[tokio::test]
    async fn dust_change_goes_to_fee() {
        let chain = NullChainContext::new(NetworkId::Testnet);
        let mut builder = TransactionBuilder::new(&chain);
        builder
            .add_input(testing::utxo(1, 0, testing::wallet(1), 3_000_000))
            .add_output(TransactionOutput::new(testing::wallet(2), Value::lovelace(2_700_000)));
        let tx = builder
            .build_and_sign(&[&testing::key(1)], &testing::wallet(1))
            .await
            .unwrap();
        assert_eq!(tx.body.outputs.len(), 1);
        assert_eq!(tx.body.fee, 300_000);
    }

    #[tokio::test]
    async fn selects_from_input_address() {
        let chain = NullChainContext::new(NetworkId::Testnet);
        chain.add_utxo(testing::utxo(1, 0, testing::wallet(1), 5_000_000));
        chain.add_utxo(testing::utxo(2, 0, testing::wallet(1), 50_000_000));
        chain.add_utxo(testing::utxo(3, 0, testing::wallet(1), 50_000_000));
        let mut builder = TransactionBuilder::new(&chain);
        builder
            .add_input_address(testing::wallet(1))
            .add_output(TransactionOutput::new(testing::wallet(2), Value::lovelace(20_000_000)));
        let tx = builder
            .build_and_sign(&[&testing::key(1)], &testing::wallet(1))
            .await
            .unwrap();
        assert_eq!(tx.body.inputs.len(), 2);
        let signer = &tx.witness_set.vkey_witnesses[0];
        oracle_crypto::verify_signature(
            tx.id().unwrap().as_bytes(),
            &signer.signature,
            &signer.vkey,
        )
        .unwrap();
    }

    #[tokio::test]
    async fn script_input_needs_collateral() {
        let chain = NullChainContext::new(NetworkId::Testnet);
        let mut builder = TransactionBuilder::new(&chain);
        builder.add_script_input(
            testing::utxo(1, 0, testing::script().address(NetworkId::Testnet), 10_000_000),
            testing::script(),
            PlutusData::constr(0, vec![]),
        );
        let err = builder
            .build_and_sign(&[&testing::key(1)], &testing::wallet(1))
            .await
            .unwrap_err();
        assert!(matches!(err, TxBuildError::MissingCollateral));
    }

    #[tokio::test]
    async fn missing_budget_is_reported() {
        let chain = NullChainContext::new(NetworkId::Testnet);
        chain.set_evaluation(Evaluation::new());
        let mut builder = TransactionBuilder::new(&chain);
        builder
            .add_collateral(testing::utxo(2, 0, testing::wallet(1), 5_000_000))
            .add_script_input(
                testing::utxo(1, 0, testing::script().address(NetworkId::Testnet), 10_000_000),
                testing::script(),
                PlutusData::constr(0, vec![]),
            );
        let err = builder
            .build_and_sign(&[&testing::key(1)], &testing::wallet(1))
            .await
            .unwrap_err();
        assert!(matches!(err, TxBuildError::MissingExUnits(p) if p == "spend:0"));
    }

    #[tokio::test]
    async fn redeemer_index_follows_sorted_inputs() {
        let chain = NullChainContext::new(NetworkId::Testnet);
        let mut builder = TransactionBuilder::new(&chain);
        builder
            .add_input(testing::utxo(1, 0, testing::wallet(1), 5_000_000))
            .add_collateral(testing::utxo(3, 0, testing::wallet(1), 5_000_000))
            .add_script_input(
                testing::utxo(2, 0, testing::script().address(NetworkId::Testnet), 10_000_000),
                testing::script(),
                PlutusData::constr(0, vec![]),
            );
        let tx = builder
            .build_and_sign(&[&testing::key(1)], &testing::wallet(1))
            .await
            .unwrap();
        assert_eq!(tx.witness_set.redeemers[0].index, 1);
    }
}
