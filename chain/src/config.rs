use oracle_types::NetworkId;
use serde::{Deserialize, Serialize};

pub const PREPROD_URL: &str = "https://cardano-preprod.blockfrost.io/api/v0";
pub const MAINNET_URL: &str = "https://cardano-mainnet.blockfrost.io/api/v0";

/// Where and how to reach the indexer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainConfig {
    pub network: NetworkId,
    pub project_id: String,
    /// Overrides the per-network default endpoint.
    #[serde(default)]
    pub base_url: Option<String>,
}

impl ChainConfig {
    pub fn new(network: NetworkId, project_id: impl Into<String>) -> Self {
        Self {
            network,
            project_id: project_id.into(),
            base_url: None,
        }
    }

    pub fn base_url(&self) -> &str {
        match (&self.base_url, self.network) {
            (Some(url), _) => url.trim_end_matches('/'),
            (None, NetworkId::Testnet) => PREPROD_URL,
            (None, NetworkId::Mainnet) => MAINNET_URL,
        }
    }
}
