//! Network identifier.

use serde::{Deserialize, Serialize};

/// Identifies which Cardano network the layer talks to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkId {
    /// The preprod test network.
    Testnet,
    /// The production network.
    Mainnet,
}

impl NetworkId {
    /// Network tag carried in the low nibble of an address header byte.
    pub fn tag(&self) -> u8 {
        match self {
            Self::Testnet => 0,
            Self::Mainnet => 1,
        }
    }

    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(Self::Testnet),
            1 => Some(Self::Mainnet),
            _ => None,
        }
    }

    /// Human-readable part used for bech32 payment addresses.
    pub fn address_hrp(&self) -> &'static str {
        match self {
            Self::Testnet => "addr_test",
            Self::Mainnet => "addr",
        }
    }

    /// Human-readable name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Testnet => "testnet",
            Self::Mainnet => "mainnet",
        }
    }

    /// Parse the `NETWORK_MODE` style name. Anything other than `mainnet`
    /// selects the test network.
    pub fn from_mode(mode: &str) -> Self {
        match mode.to_lowercase().as_str() {
            "mainnet" | "main" | "live" => Self::Mainnet,
            _ => Self::Testnet,
        }
    }
}

impl Default for NetworkId {
    fn default() -> Self {
        Self::Testnet
    }
}
