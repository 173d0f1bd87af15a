//! Oracle script flows: register a data request, post quorum results.

use oracle_chain::ChainContext;
use oracle_datum::{OracleDatum, OracleRedeemer};
use oracle_types::{Address, OracleError, TransactionOutput, Utxo, Value, LOVELACE_PER_ADA};
use tracing::info;

use crate::builder::TransactionBuilder;
use crate::script::PlutusScript;
use crate::transaction::Transaction;
use crate::{placeholder_key, TxBuildError};

/// Lovelace kept at the script once results are posted.
pub const RESULTS_LOCK_LOVELACE: u64 = 2_000_000;

/// Input selection for a data request stops once the inputs cover the locked
/// amount plus this margin.
const REQUEST_FEE_MARGIN: u64 = 2 * LOVELACE_PER_ADA;

/// Everything needed to register a data request.
pub struct DataRequest {
    /// Candidate funding UTXOs, used in this order.
    pub inputs: Vec<Utxo>,
    pub change_address: Address,
    pub script: PlutusScript,
    /// Value locked at the oracle script together with the datum.
    pub amount: Value,
    pub datum: OracleDatum,
}

/// Lock `amount` and the proposal datum at the oracle script.
///
/// Inputs are taken in the given order until they cover the amount plus two
/// ADA. Change returns to the sender.
pub async fn create_data_request(
    context: &dyn ChainContext,
    request: DataRequest,
) -> Result<Transaction, TxBuildError> {
    let target = request
        .amount
        .checked_add(&Value::lovelace(REQUEST_FEE_MARGIN))
        .ok_or(OracleError::ValueOverflow)?;

    let mut builder = TransactionBuilder::new(context);
    let mut total = Value::ZERO;
    for utxo in request.inputs {
        total = total
            .checked_add(utxo.amount())
            .ok_or(OracleError::ValueOverflow)?;
        builder.add_input(utxo);
        if total.covers(&target) {
            break;
        }
    }

    let script_address = request.script.address(context.network());
    builder.add_output(
        TransactionOutput::new(script_address, request.amount)
            .with_inline_datum(request.datum.encode()?),
    );

    let tx = builder
        .build_and_sign(&[&placeholder_key()], &request.change_address)
        .await?;
    let tx_id = tx.id()?;
    info!(
        proposal_id = %request.datum.proposal_id,
        %tx_id,
        "data request built"
    );
    Ok(tx)
}

/// Everything needed to post quorum results to an oracle output.
pub struct OracleSubmission {
    pub collateral: Utxo,
    /// The oracle output holding the unresolved proposal.
    pub script_utxo: Utxo,
    pub script: PlutusScript,
    /// The datum currently at `script_utxo`.
    pub datum: OracleDatum,
    pub results: Vec<u8>,
    /// One entry per oracle, in oracle-set order.
    pub signatures: Vec<Vec<u8>>,
}

/// Spend the oracle output with the signed results and re-lock it with the
/// results written into its datum.
///
/// Change goes to the payment address named in the datum.
pub async fn submit_oracle_data(
    context: &dyn ChainContext,
    submission: OracleSubmission,
) -> Result<Transaction, TxBuildError> {
    let network = context.network();
    let redeemer = OracleRedeemer::new(submission.results.clone(), submission.signatures);
    let resolved = submission.datum.with_results(submission.results);

    let mut builder = TransactionBuilder::new(context);
    builder
        .add_collateral(submission.collateral)
        .add_script_input(
            submission.script_utxo,
            submission.script.clone(),
            redeemer.to_plutus(),
        )
        .add_output(
            TransactionOutput::new(
                submission.script.address(network),
                Value::lovelace(RESULTS_LOCK_LOVELACE),
            )
            .with_inline_datum(resolved.encode()?),
        );

    let payment_address = submission.datum.payment_address(network);
    let tx = builder
        .build_and_sign(&[&placeholder_key()], &payment_address)
        .await?;
    let tx_id = tx.id()?;
    info!(
        proposal_id = %submission.datum.proposal_id,
        %tx_id,
        "oracle results built"
    );
    Ok(tx)
}

/// The proposal datum carried inline by an oracle output.
pub fn oracle_datum(utxo: &Utxo) -> Result<OracleDatum, TxBuildError> {
    let cbor = utxo
        .output
        .inline_datum()
        .ok_or_else(|| TxBuildError::MissingDatum(utxo.input.to_string()))?;
    Ok(OracleDatum::decode(cbor)?)
}
