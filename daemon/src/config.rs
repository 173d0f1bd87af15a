//! Daemon configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use thiserror::Error;

use oracle_chain::ChainConfig;
use oracle_types::NetworkId;
use oracle_utils::LogFormat;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("cannot serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Configuration for the daemon and its CLI flows.
///
/// Loaded from a TOML file via [`DaemonConfig::from_toml_file`]; flags and
/// environment variables are layered on top by the binary.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DaemonConfig {
    #[serde(default)]
    pub network: NetworkId,

    /// Blockfrost project id. Empty means unset.
    #[serde(default)]
    pub blockfrost_project_id: String,

    /// Overrides the per-network Blockfrost endpoint.
    #[serde(default)]
    pub blockfrost_url: Option<String>,

    /// Directory of the LMDB signature store.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default = "default_lmdb_map_size")]
    pub lmdb_map_size: usize,

    #[serde(default = "default_rpc_bind")]
    pub rpc_bind: IpAddr,

    #[serde(default = "default_rpc_port")]
    pub rpc_port: u16,

    #[serde(default)]
    pub log_format: LogFormat,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Compiled oracle validator (CBOR hex).
    #[serde(default = "default_oracle_script")]
    pub oracle_script: PathBuf,

    /// Compiled escrow validator (CBOR hex).
    #[serde(default = "default_escrow_script")]
    pub escrow_script: PathBuf,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_data_dir() -> PathBuf {
    PathBuf::from("./oracle_data")
}

fn default_lmdb_map_size() -> usize {
    1 << 30
}

fn default_rpc_bind() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

fn default_rpc_port() -> u16 {
    8000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_oracle_script() -> PathBuf {
    PathBuf::from("./scripts/script.plutus")
}

fn default_escrow_script() -> PathBuf {
    PathBuf::from("./scripts/escrow.plutus")
}

// ── Impl ───────────────────────────────────────────────────────────────

impl DaemonConfig {
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn chain_config(&self) -> ChainConfig {
        ChainConfig {
            network: self.network,
            project_id: self.blockfrost_project_id.clone(),
            base_url: self.blockfrost_url.clone(),
        }
    }

    pub fn rpc_addr(&self) -> SocketAddr {
        SocketAddr::new(self.rpc_bind, self.rpc_port)
    }
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            network: NetworkId::default(),
            blockfrost_project_id: String::new(),
            blockfrost_url: None,
            data_dir: default_data_dir(),
            lmdb_map_size: default_lmdb_map_size(),
            rpc_bind: default_rpc_bind(),
            rpc_port: default_rpc_port(),
            log_format: LogFormat::default(),
            log_level: default_log_level(),
            oracle_script: default_oracle_script(),
            escrow_script: default_escrow_script(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_round_trips_through_toml() {
        let config = DaemonConfig::default();
        let toml_str = config.to_toml_string().unwrap();
        let parsed = DaemonConfig::from_toml_str(&toml_str).unwrap();
        assert_eq!(parsed.rpc_port, config.rpc_port);
        assert_eq!(parsed.data_dir, config.data_dir);
        assert_eq!(parsed.network, NetworkId::Testnet);
    }

    #[test]
    fn empty_toml_uses_defaults() {
        let config = DaemonConfig::from_toml_str("").unwrap();
        assert_eq!(config.rpc_port, 8000);
        assert_eq!(config.log_format, LogFormat::Human);
        assert_eq!(config.oracle_script, PathBuf::from("./scripts/script.plutus"));
        assert!(config.blockfrost_project_id.is_empty());
    }

    #[test]
    fn partial_toml_overrides() {
        let toml = r#"
            network = "mainnet"
            rpc_port = 9100
            log_format = "json"
            blockfrost_project_id = "mainnetXYZ"
        "#;
        let config = DaemonConfig::from_toml_str(toml).unwrap();
        assert_eq!(config.network, NetworkId::Mainnet);
        assert_eq!(config.rpc_addr().port(), 9100);
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.chain_config().project_id, "mainnetXYZ");
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn unknown_network_is_a_parse_error() {
        let err = DaemonConfig::from_toml_str("network = \"devnet\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn missing_file_returns_read_error() {
        let err = DaemonConfig::from_toml_file(Path::new("/nonexistent/oracle.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
