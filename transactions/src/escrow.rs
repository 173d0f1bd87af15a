//! Escrow script flows.

use oracle_chain::ChainContext;
use oracle_datum::{EscrowDatum, EscrowRedeemer, VoteTally};
use oracle_types::{Address, KeyHash, TransactionInput, TransactionOutput, Utxo, Value};
use tracing::info;

use crate::builder::TransactionBuilder;
use crate::script::PlutusScript;
use crate::transaction::Transaction;
use crate::{placeholder_key, TxBuildError};

/// Position of the oracle output among the reference inputs. Payouts
/// reference exactly one oracle output.
const ORACLE_REFERENCE_INDEX: u64 = 0;

pub struct EscrowDeposit {
    /// Every one of these is spent.
    pub inputs: Vec<Utxo>,
    pub change_address: Address,
    pub script: PlutusScript,
    pub amount: Value,
    pub datum: EscrowDatum,
}

/// Lock `amount` and the escrow datum at the escrow script.
pub async fn create_escrow(
    context: &dyn ChainContext,
    deposit: EscrowDeposit,
) -> Result<Transaction, TxBuildError> {
    let mut builder = TransactionBuilder::new(context);
    for utxo in deposit.inputs {
        builder.add_input(utxo);
    }
    builder.add_output(
        TransactionOutput::new(deposit.script.address(context.network()), deposit.amount)
            .with_inline_datum(deposit.datum.encode()?),
    );

    let tx = builder
        .build_and_sign(&[&placeholder_key()], &deposit.change_address)
        .await?;
    let tx_id = tx.id()?;
    info!(%tx_id, question = deposit.datum.question_index, "escrow deposit built");
    Ok(tx)
}

pub struct EscrowPayout {
    pub collateral: Utxo,
    pub escrow_utxo: Utxo,
    pub script: PlutusScript,
    /// The resolved oracle output the validator reads the tally from.
    pub oracle_reference: TransactionInput,
    pub receiver: Address,
    pub results: VoteTally,
}

/// Spend an escrow output against a resolved oracle output.
///
/// Extra funding, if any is needed, comes from the collateral's address.
/// Everything left after the fee goes to the receiver.
pub async fn execute_escrow(
    context: &dyn ChainContext,
    payout: EscrowPayout,
) -> Result<Transaction, TxBuildError> {
    let redeemer = EscrowRedeemer::EscrowExecution {
        oracle_index: ORACLE_REFERENCE_INDEX,
        results: payout.results,
    };
    let funding_address = payout.collateral.output.address;

    let mut builder = TransactionBuilder::new(context);
    builder
        .add_collateral(payout.collateral)
        .add_reference_input(payout.oracle_reference)
        .add_input_address(funding_address)
        .add_script_input(payout.escrow_utxo, payout.script, redeemer.to_plutus());

    let tx = builder
        .build_and_sign(&[&placeholder_key()], &payout.receiver)
        .await?;
    let tx_id = tx.id()?;
    info!(%tx_id, oracle = %payout.oracle_reference, "escrow payout built");
    Ok(tx)
}

pub struct EscrowReclaim {
    pub collateral: Utxo,
    pub escrow_utxo: Utxo,
    pub script: PlutusScript,
    /// Key hash recorded as the escrow's creator; the real creator key must
    /// sign the assembled transaction.
    pub creator: KeyHash,
    pub creator_address: Address,
    /// First slot after the escrow deadline.
    pub validity_start: u64,
}

/// Return an escrow to its creator after the deadline.
pub async fn reclaim_escrow(
    context: &dyn ChainContext,
    reclaim: EscrowReclaim,
) -> Result<Transaction, TxBuildError> {
    let mut builder = TransactionBuilder::new(context);
    builder
        .add_collateral(reclaim.collateral)
        .add_script_input(
            reclaim.escrow_utxo,
            reclaim.script,
            EscrowRedeemer::CreatorRetrieval.to_plutus(),
        )
        .add_required_signer(reclaim.creator)
        .validity_start(reclaim.validity_start);

    let tx = builder
        .build_and_sign(&[&placeholder_key()], &reclaim.creator_address)
        .await?;
    let tx_id = tx.id()?;
    info!(%tx_id, slot = reclaim.validity_start, "escrow reclaim built");
    Ok(tx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;
    use oracle_datum::{Vote, VoteUse};
    use oracle_nullables::NullChainContext;
    use oracle_types::{NetworkId, ScriptHash, TxHash};

    fn escrow_datum() -> EscrowDatum {
        EscrowDatum {
            policy_id: ScriptHash::new([0x02; 28]),
            creator: oracle_crypto::key_hash(&testing::public(1)),
            deadline: 1_700_000_000_000,
            question_index: 0,
            vote_use: VoteUse::ByCount,
            payees: vec![
                oracle_crypto::key_hash(&testing::public(4)),
                oracle_crypto::key_hash(&testing::public(5)),
            ],
        }
    }

    fn escrow_utxo() -> Utxo {
        Utxo::new(
            TransactionInput::new(TxHash::new([9; 32]), 1),
            TransactionOutput::new(
                testing::script().address(NetworkId::Testnet),
                Value::lovelace(20_000_000),
            )
            .with_inline_datum(escrow_datum().encode().unwrap()),
        )
    }

    #[tokio::test]
    async fn deposit_spends_every_input() {
        let chain = NullChainContext::new(NetworkId::Testnet);
        let deposit = EscrowDeposit {
            inputs: vec![
                testing::utxo(1, 0, testing::wallet(1), 30_000_000),
                testing::utxo(2, 0, testing::wallet(1), 4_000_000),
            ],
            change_address: testing::wallet(1),
            script: testing::script(),
            amount: Value::lovelace(20_000_000),
            datum: escrow_datum(),
        };
        let tx = create_escrow(&chain, deposit).await.unwrap();

        assert_eq!(tx.body.inputs.len(), 2);
        let locked = &tx.body.outputs[0];
        assert_eq!(locked.amount, Value::lovelace(20_000_000));
        assert_eq!(
            EscrowDatum::decode(locked.inline_datum().unwrap()).unwrap(),
            escrow_datum()
        );
        assert!(tx.witness_set.redeemers.is_empty());
        assert!(tx.body.script_data_hash.is_none());
    }

    #[tokio::test]
    async fn payout_references_oracle_and_pays_receiver() {
        let chain = NullChainContext::new(NetworkId::Testnet);
        let collateral = testing::utxo(3, 0, testing::wallet(6), 5_000_000);
        chain.add_utxo(collateral.clone());
        let oracle_ref = TransactionInput::new(TxHash::new([8; 32]), 0);
        let tally = VoteTally::new(vec![vec![Vote::new(3, 30), Vote::new(1, 10)]]);

        let payout = EscrowPayout {
            collateral: collateral.clone(),
            escrow_utxo: escrow_utxo(),
            script: testing::script(),
            oracle_reference: oracle_ref,
            receiver: testing::wallet(4),
            results: tally.clone(),
        };
        let tx = execute_escrow(&chain, payout).await.unwrap();

        assert_eq!(tx.body.reference_inputs, vec![oracle_ref]);
        assert_eq!(tx.body.collateral, vec![collateral.input]);
        // The escrow alone covers the fee; the collateral stays unspent.
        assert_eq!(tx.body.inputs, vec![escrow_utxo().input]);
        assert_eq!(tx.body.outputs.len(), 1);
        assert_eq!(tx.body.outputs[0].address, testing::wallet(4));
        assert_eq!(tx.body.outputs[0].amount.coin() + tx.body.fee, 20_000_000);

        let redeemer = EscrowRedeemer::from_plutus(&tx.witness_set.redeemers[0].data).unwrap();
        assert_eq!(
            redeemer,
            EscrowRedeemer::EscrowExecution {
                oracle_index: 0,
                results: tally,
            }
        );
    }

    #[tokio::test]
    async fn payout_without_collateral_address_funds_still_builds() {
        let chain = NullChainContext::new(NetworkId::Testnet);
        let payout = EscrowPayout {
            collateral: testing::utxo(3, 0, testing::wallet(6), 5_000_000),
            escrow_utxo: escrow_utxo(),
            script: testing::script(),
            oracle_reference: TransactionInput::new(TxHash::new([8; 32]), 0),
            receiver: testing::wallet(4),
            results: VoteTally::new(vec![vec![Vote::new(1, 1)]]),
        };
        assert!(execute_escrow(&chain, payout).await.is_ok());
    }

    #[tokio::test]
    async fn reclaim_requires_creator_and_start_slot() {
        let chain = NullChainContext::new(NetworkId::Testnet);
        let creator = oracle_crypto::key_hash(&testing::public(1));
        let reclaim = EscrowReclaim {
            collateral: testing::utxo(3, 0, testing::wallet(1), 5_000_000),
            escrow_utxo: escrow_utxo(),
            script: testing::script(),
            creator,
            creator_address: testing::wallet(1),
            validity_start: 42_000,
        };
        let tx = reclaim_escrow(&chain, reclaim).await.unwrap();

        assert_eq!(tx.body.required_signers, vec![creator]);
        assert_eq!(tx.body.validity_start, Some(42_000));
        assert_eq!(tx.body.outputs[0].address, testing::wallet(1));
        assert_eq!(
            EscrowRedeemer::from_plutus(&tx.witness_set.redeemers[0].data).unwrap(),
            EscrowRedeemer::CreatorRetrieval
        );
    }
}
