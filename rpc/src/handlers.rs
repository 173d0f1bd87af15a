//! HTTP request handlers.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::header::CONTENT_TYPE;
use axum::response::IntoResponse;
use axum::Json;
use oracle_chain::ChainError;
use oracle_crypto::SignatureError;
use oracle_datum::OracleDatum;
use oracle_store::{NewSignatureRecord, SignatureRecord};
use oracle_types::{PublicKey, TransactionInput, TxHash};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::pagination::{next_cursor, PaginationMeta, PaginationParams};
use crate::{AppState, RpcError};

pub const MSG_BAD_FORMAT: &str = "Results don't follow the standard";
pub const MSG_INVALID_SIGNATURE: &str = "Invalid signature";
pub const MSG_MALFORMED_KEY: &str = "Malformed public key or signature";
pub const MSG_BAD_INPUT: &str = "Malformed transaction hash";
pub const MSG_INPUT_NOT_FOUND: &str = "Script input not found";
pub const MSG_NO_DATUM: &str = "Script input does not hold an oracle datum";
pub const MSG_NOT_ORACLE: &str = "PubKey not within valid oracles";

// ── Submission ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitSignatureRequest {
    /// Transaction holding the oracle script output.
    pub transaction_hash: String,
    pub index: u32,
    /// Oracle public key, hex.
    pub pubkey: String,
    /// Signature over the UTF-8 bytes of `results`, hex.
    pub signature: String,
    pub results: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl SubmitResponse {
    pub fn accepted() -> Self {
        Self {
            success: true,
            message: None,
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
        }
    }
}

fn reject(state: &AppState, reason: &str, message: &str) -> Json<SubmitResponse> {
    state.metrics.record_rejection(reason);
    Json(SubmitResponse::rejected(message))
}

/// `POST /oracle/{proposal_id}/submit`
///
/// Checks run cheapest first and nothing is written unless all pass: the
/// results grammar, the signature, then membership of the key in the oracle
/// set of the referenced script output.
pub async fn submit_signature(
    State(state): State<AppState>,
    Path(proposal_id): Path<String>,
    body: Result<Json<SubmitSignatureRequest>, JsonRejection>,
) -> Result<Json<SubmitResponse>, RpcError> {
    let Json(req) = body.map_err(|e| RpcError::InvalidRequest(e.body_text()))?;
    if !oracle_crypto::enforce_format(&req.results) {
        return Ok(reject(&state, "bad_format", MSG_BAD_FORMAT));
    }

    match oracle_crypto::verify_hex(&req.pubkey, req.results.as_bytes(), &req.signature) {
        Ok(()) => {}
        Err(SignatureError::InvalidSignature) => {
            return Ok(reject(&state, "invalid_signature", MSG_INVALID_SIGNATURE));
        }
        Err(SignatureError::MalformedPublicKey | SignatureError::MalformedSignature(_)) => {
            return Ok(reject(&state, "malformed_key", MSG_MALFORMED_KEY));
        }
    }
    let Ok(public_key) = PublicKey::from_hex(&req.pubkey) else {
        return Ok(reject(&state, "malformed_key", MSG_MALFORMED_KEY));
    };

    let Ok(tx_hash) = TxHash::from_hex(&req.transaction_hash) else {
        return Ok(reject(&state, "bad_input", MSG_BAD_INPUT));
    };
    let script_input = TransactionInput::new(tx_hash, req.index);

    let utxo = match state.chain.utxo(&script_input).await {
        Ok(utxo) => utxo,
        Err(ChainError::NotFound(_)) => {
            return Ok(reject(&state, "input_not_found", MSG_INPUT_NOT_FOUND));
        }
        Err(e) => return Err(e.into()),
    };
    let datum = match utxo.output.inline_datum().map(OracleDatum::decode) {
        Some(Ok(datum)) => datum,
        Some(Err(e)) => {
            warn!(%script_input, error = %e, "script input datum does not decode");
            return Ok(reject(&state, "no_datum", MSG_NO_DATUM));
        }
        None => return Ok(reject(&state, "no_datum", MSG_NO_DATUM)),
    };
    if datum.proposal_id != proposal_id {
        warn!(
            %proposal_id,
            datum_proposal = %datum.proposal_id,
            "submission path does not match the script datum"
        );
    }

    if !datum.is_oracle(&public_key) {
        return Ok(reject(&state, "not_oracle", MSG_NOT_ORACLE));
    }

    let record = state.store.insert_signature(NewSignatureRecord {
        proposal_id,
        pubkey: req.pubkey,
        signature: req.signature,
        results: req.results,
        script_input,
    })?;
    state.metrics.submissions_accepted.inc();
    info!(
        id = record.id,
        proposal_id = %record.proposal_id,
        %script_input,
        "signature accepted"
    );

    Ok(Json(SubmitResponse::accepted()))
}

// ── Listing ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignatureView {
    pub id: u64,
    pub proposal_id: String,
    pub pubkey: String,
    pub signature: String,
    pub results: String,
    /// `txhash#index`
    pub script_input: String,
    /// Unix seconds.
    pub created_at: u64,
}

impl From<SignatureRecord> for SignatureView {
    fn from(r: SignatureRecord) -> Self {
        Self {
            id: r.id,
            proposal_id: r.proposal_id,
            pubkey: r.pubkey,
            signature: r.signature,
            results: r.results,
            script_input: r.script_input.to_string(),
            created_at: r.created_at.as_secs(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SignatureListResponse {
    pub signatures: Vec<SignatureView>,
    #[serde(flatten)]
    pub pagination: PaginationMeta,
}

/// `GET /oracle/{proposal_id}/signatures?cursor=&count=`
pub async fn list_signatures(
    State(state): State<AppState>,
    Path(proposal_id): Path<String>,
    Query(page): Query<PaginationParams>,
) -> Result<Json<SignatureListResponse>, RpcError> {
    let count = page.effective_count();
    let records = state
        .store
        .list_signatures(&proposal_id, page.after()?, count as usize)?;
    let cursor = next_cursor(records.last().map(|r| r.id), records.len(), count);
    Ok(Json(SignatureListResponse {
        signatures: records.into_iter().map(SignatureView::from).collect(),
        pagination: PaginationMeta { cursor },
    }))
}

// ── Operational ──────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub network: String,
    pub signatures: u64,
}

/// `GET /health`
pub async fn health(State(state): State<AppState>) -> Result<Json<HealthResponse>, RpcError> {
    Ok(Json(HealthResponse {
        status: "ok".into(),
        network: state.chain.network().as_str().into(),
        signatures: state.store.signature_count()?,
    }))
}

/// `GET /metrics`
pub async fn metrics(State(state): State<AppState>) -> Result<impl IntoResponse, RpcError> {
    let (content_type, body) = state
        .metrics
        .encode()
        .map_err(|e| RpcError::Server(e.to_string()))?;
    Ok(([(CONTENT_TYPE, content_type)], body))
}
