//! HTTP server collecting oracle signature submissions.
//!
//! Endpoints:
//! - `POST /oracle/{proposal_id}/submit`: validate and store a signature
//! - `GET /oracle/{proposal_id}/signatures`: page through stored signatures
//! - `GET /health`: liveness and record count
//! - `GET /metrics`: Prometheus text exposition

pub mod error;
pub mod handlers;
pub mod metrics;
pub mod pagination;
pub mod server;
pub mod state;

pub use error::RpcError;
pub use metrics::RpcMetrics;
pub use server::{router, RpcServer};
pub use state::AppState;
