//! Shared handler state.

use std::sync::Arc;

use oracle_chain::ChainContext;
use oracle_store::SignatureStore;

use crate::RpcMetrics;

/// Collaborators every handler reaches through `State`.
///
/// Cloned per request; everything inside is shared.
#[derive(Clone)]
pub struct AppState {
    pub chain: Arc<dyn ChainContext>,
    pub store: Arc<dyn SignatureStore>,
    pub metrics: Arc<RpcMetrics>,
}

impl AppState {
    pub fn new(
        chain: Arc<dyn ChainContext>,
        store: Arc<dyn SignatureStore>,
        metrics: Arc<RpcMetrics>,
    ) -> Self {
        Self {
            chain,
            store,
            metrics,
        }
    }
}
