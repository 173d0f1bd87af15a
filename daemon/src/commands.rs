//! Transaction flows behind the CLI subcommands.
//!
//! Every flow builds against the chain context with the placeholder witness,
//! re-signs with the payer's key and submits.

use std::path::Path;

use anyhow::{bail, Context};
use oracle_chain::ChainContext;
use oracle_datum::{EscrowDatum, OracleDatum, OracleDatumView, VoteTally, VoteUse};
use oracle_store::SignatureStore;
use oracle_transactions::{
    assemble, collect_signatures, create_data_request, create_escrow, execute_escrow,
    oracle_datum, reclaim_escrow, submit_oracle_data, DataRequest, EscrowDeposit, EscrowPayout,
    EscrowReclaim, OracleSubmission, PlutusScript, Transaction,
};
use oracle_types::{
    Address, KeyHash, NetworkId, PrivateKey, PublicKey, ScriptHash, TransactionInput, TxHash,
    Utxo, Value,
};
use serde::Serialize;
use tracing::{debug, info};

/// Minting policy recorded in datums when the caller names none.
pub const DEFAULT_POLICY_ID: &str = "02aa7e9d83f43ad54ab2585900292db7280ec43410e7563dac934d17";

/// The wallet paying for and signing a transaction.
pub struct Payer {
    key: PrivateKey,
    public: PublicKey,
    address: Address,
}

impl Payer {
    pub fn parse(text: &str, network: NetworkId) -> anyhow::Result<Self> {
        let key = oracle_crypto::parse_signing_key(text).context(
            "signing key could not be parsed, expected CBOR hex (5820...) or a 32-byte hex seed",
        )?;
        let public = oracle_crypto::public_from_private(&key);
        let address = oracle_crypto::enterprise_address(network, &public);
        Ok(Self {
            key,
            public,
            address,
        })
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn key_hash(&self) -> KeyHash {
        oracle_crypto::key_hash(&self.public)
    }

    async fn utxos(&self, chain: &dyn ChainContext) -> anyhow::Result<Vec<Utxo>> {
        let utxos = chain.utxos(&self.address).await?;
        if utxos.is_empty() {
            bail!(
                "address {} has no UTxOs",
                oracle_crypto::encode_address(&self.address)?
            );
        }
        debug!(count = utxos.len(), "payer utxos");
        Ok(utxos)
    }

    async fn collateral(&self, chain: &dyn ChainContext) -> anyhow::Result<Utxo> {
        let mut utxos = self.utxos(chain).await?;
        Ok(utxos.swap_remove(0))
    }

    /// Replace the placeholder witness with ours and submit.
    async fn sign_and_submit(
        &self,
        chain: &dyn ChainContext,
        tx: Transaction,
    ) -> anyhow::Result<TxHash> {
        let signed = assemble(tx, &self.key)?;
        let cbor = signed.to_cbor()?;
        let tx_id = chain.submit(&cbor).await?;
        info!(%tx_id, size = cbor.len(), "transaction submitted");
        Ok(tx_id)
    }
}

pub fn load_script(path: &Path) -> anyhow::Result<PlutusScript> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read script {}", path.display()))?;
    PlutusScript::from_hex(&text).with_context(|| format!("invalid script {}", path.display()))
}

/// Payment key hash of a bech32 key address.
pub fn payment_key_hash(bech32: &str) -> anyhow::Result<KeyHash> {
    let address = oracle_crypto::decode_address(bech32)?;
    match address.payment_key_hash() {
        Some(hash) => Ok(*hash),
        None => bail!("{bech32} is not a key address"),
    }
}

// ── Oracle ───────────────────────────────────────────────────────────────

pub struct RequestArgs {
    pub proposal_id: String,
    pub policy_id: ScriptHash,
    pub deadline: u64,
    pub oracles: Vec<PublicKey>,
    pub min_signatures: u64,
    pub payment: KeyHash,
    pub amount: u64,
}

pub async fn oracle_request(
    chain: &dyn ChainContext,
    payer: &Payer,
    script: PlutusScript,
    args: RequestArgs,
) -> anyhow::Result<TxHash> {
    if args.min_signatures as usize > args.oracles.len() {
        bail!(
            "threshold of {} exceeds the {} oracles",
            args.min_signatures,
            args.oracles.len()
        );
    }
    let inputs = payer.utxos(chain).await?;
    let datum = OracleDatum {
        proposal_id: args.proposal_id,
        policy_id: args.policy_id,
        creator: payer.key_hash(),
        deadline: args.deadline,
        oracles: args.oracles,
        min_signatures: args.min_signatures,
        payment: args.payment,
        results: None,
    };
    let tx = create_data_request(
        chain,
        DataRequest {
            inputs,
            change_address: payer.address(),
            script,
            amount: Value::lovelace(args.amount),
            datum,
        },
    )
    .await?;
    payer.sign_and_submit(chain, tx).await
}

/// Where `oracle respond` takes signatures from.
pub enum SignatureSource<'a> {
    /// Hex signatures in oracle-set order.
    Given(Vec<String>),
    /// Submissions collected by the HTTP server.
    Store(&'a dyn SignatureStore),
}

pub async fn oracle_respond(
    chain: &dyn ChainContext,
    payer: &Payer,
    script: PlutusScript,
    input: TransactionInput,
    results: &str,
    source: SignatureSource<'_>,
) -> anyhow::Result<TxHash> {
    if !oracle_crypto::enforce_format(results) {
        bail!("results {results:?} don't follow the standard");
    }
    let collateral = payer.collateral(chain).await?;
    let script_utxo = chain.utxo(&input).await?;
    let datum = oracle_datum(&script_utxo)?;
    if datum.results.is_some() {
        bail!("proposal {} is already resolved", datum.proposal_id);
    }

    let signatures = match source {
        SignatureSource::Given(hex_signatures) => hex_signatures
            .iter()
            .map(|s| hex::decode(s).with_context(|| format!("signature {s:?} is not hex")))
            .collect::<anyhow::Result<Vec<_>>>()?,
        SignatureSource::Store(store) => {
            let records = store.signatures_for_input(&datum.proposal_id, &input)?;
            collect_signatures(&datum, results, &records)?
        }
    };

    let tx = submit_oracle_data(
        chain,
        OracleSubmission {
            collateral,
            script_utxo,
            script,
            datum,
            results: results.as_bytes().to_vec(),
            signatures,
        },
    )
    .await?;
    payer.sign_and_submit(chain, tx).await
}

#[derive(Debug, Serialize)]
pub struct SignedResults {
    pub pubkey: String,
    pub signature: String,
    pub results: String,
}

/// Sign a results string as an oracle.
pub fn oracle_sign(key_text: &str, results: &str) -> anyhow::Result<SignedResults> {
    let key = oracle_crypto::parse_signing_key(key_text).context(
        "signing key could not be parsed, expected CBOR hex (5820...) or a 32-byte hex seed",
    )?;
    if !oracle_crypto::enforce_format(results) {
        bail!("results {results:?} don't follow the standard");
    }
    let signature = oracle_crypto::sign_message(results.as_bytes(), &key);
    Ok(SignedResults {
        pubkey: oracle_crypto::public_from_private(&key).to_hex(),
        signature: signature.to_hex(),
        results: results.to_string(),
    })
}

pub async fn datum_inspect(
    chain: &dyn ChainContext,
    input: TransactionInput,
) -> anyhow::Result<OracleDatumView> {
    let utxo = chain.utxo(&input).await?;
    Ok(oracle_datum(&utxo)?.to_view(chain.network())?)
}

// ── Escrow ───────────────────────────────────────────────────────────────

pub struct EscrowArgs {
    pub policy_id: ScriptHash,
    pub deadline: u64,
    pub question_index: u64,
    pub vote_use: VoteUse,
    pub payees: Vec<KeyHash>,
    pub amount: u64,
}

pub async fn escrow_create(
    chain: &dyn ChainContext,
    payer: &Payer,
    script: PlutusScript,
    args: EscrowArgs,
) -> anyhow::Result<TxHash> {
    let inputs = payer.utxos(chain).await?;
    let datum = EscrowDatum {
        policy_id: args.policy_id,
        creator: payer.key_hash(),
        deadline: args.deadline,
        question_index: args.question_index,
        vote_use: args.vote_use,
        payees: args.payees,
    };
    let tx = create_escrow(
        chain,
        EscrowDeposit {
            inputs,
            change_address: payer.address(),
            script,
            amount: Value::lovelace(args.amount),
            datum,
        },
    )
    .await?;
    payer.sign_and_submit(chain, tx).await
}

pub async fn escrow_claim(
    chain: &dyn ChainContext,
    payer: &Payer,
    script: PlutusScript,
    escrow_input: TransactionInput,
    oracle_input: TransactionInput,
    receiver: Address,
    results: VoteTally,
) -> anyhow::Result<TxHash> {
    let oracle_utxo = chain.utxo(&oracle_input).await?;
    if oracle_datum(&oracle_utxo)?.results.is_none() {
        bail!("oracle output {oracle_input} has no results yet");
    }
    let collateral = payer.collateral(chain).await?;
    let escrow_utxo = chain.utxo(&escrow_input).await?;

    let tx = execute_escrow(
        chain,
        EscrowPayout {
            collateral,
            escrow_utxo,
            script,
            oracle_reference: oracle_input,
            receiver,
            results,
        },
    )
    .await?;
    payer.sign_and_submit(chain, tx).await
}

pub async fn escrow_reclaim(
    chain: &dyn ChainContext,
    payer: &Payer,
    script: PlutusScript,
    escrow_input: TransactionInput,
    validity_start: u64,
) -> anyhow::Result<TxHash> {
    let collateral = payer.collateral(chain).await?;
    let escrow_utxo = chain.utxo(&escrow_input).await?;
    let cbor = escrow_utxo
        .output
        .inline_datum()
        .with_context(|| format!("escrow output {escrow_input} carries no inline datum"))?;
    let datum = EscrowDatum::decode(cbor)?;
    if datum.creator != payer.key_hash() {
        bail!("escrow {escrow_input} was created by another key");
    }

    let tx = reclaim_escrow(
        chain,
        EscrowReclaim {
            collateral,
            escrow_utxo,
            script,
            creator: payer.key_hash(),
            creator_address: payer.address(),
            validity_start,
        },
    )
    .await?;
    payer.sign_and_submit(chain, tx).await
}
