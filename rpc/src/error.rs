//! RPC error types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use crate::handlers::SubmitResponse;

/// Failures that are not a verdict on the submission itself.
///
/// Rejections of a submission are normal `200` responses; these map to error
/// statuses with the same `{success, message}` body.
#[derive(Debug, Error)]
pub enum RpcError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("chain error: {0}")]
    Chain(#[from] oracle_chain::ChainError),

    #[error("store error: {0}")]
    Store(#[from] oracle_store::StoreError),

    #[error("server error: {0}")]
    Server(String),
}

impl RpcError {
    fn status(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::Chain(_) => StatusCode::BAD_GATEWAY,
            Self::Store(_) | Self::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for RpcError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        (status, Json(SubmitResponse::rejected(self.to_string()))).into_response()
    }
}
