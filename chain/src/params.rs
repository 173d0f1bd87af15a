//! Protocol parameters and script execution units.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::ChainError;

/// Memory and CPU budget of one script execution.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExUnits {
    pub mem: u64,
    pub steps: u64,
}

impl ExUnits {
    pub fn new(mem: u64, steps: u64) -> Self {
        Self { mem, steps }
    }
}

/// What a redeemer is attached to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RedeemerTag {
    Spend,
    Mint,
    Cert,
    Reward,
}

impl RedeemerTag {
    /// Ledger encoding of the tag.
    pub fn as_u8(&self) -> u8 {
        match self {
            Self::Spend => 0,
            Self::Mint => 1,
            Self::Cert => 2,
            Self::Reward => 3,
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            Self::Spend => "spend",
            Self::Mint => "mint",
            Self::Cert => "certificate",
            Self::Reward => "withdrawal",
        }
    }
}

/// A redeemer's position: its tag and the index of what it is attached to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RedeemerPointer {
    pub tag: RedeemerTag,
    pub index: u32,
}

impl RedeemerPointer {
    pub fn spend(index: u32) -> Self {
        Self {
            tag: RedeemerTag::Spend,
            index,
        }
    }
}

impl fmt::Display for RedeemerPointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.tag.as_str(), self.index)
    }
}

/// Parses the evaluator's `spend:0` keys.
impl FromStr for RedeemerPointer {
    type Err = ChainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (tag, index) = s
            .split_once(':')
            .ok_or_else(|| ChainError::InvalidResponse(format!("bad redeemer pointer {s:?}")))?;
        let tag = match tag {
            "spend" => RedeemerTag::Spend,
            "mint" => RedeemerTag::Mint,
            "certificate" | "publish" => RedeemerTag::Cert,
            "withdrawal" | "withdraw" => RedeemerTag::Reward,
            other => {
                return Err(ChainError::InvalidResponse(format!(
                    "unknown redeemer purpose {other:?}"
                )))
            }
        };
        let index = index
            .parse()
            .map_err(|e| ChainError::InvalidResponse(format!("bad redeemer index in {s:?}: {e}")))?;
        Ok(Self { tag, index })
    }
}

/// Evaluated budgets keyed by redeemer.
pub type Evaluation = BTreeMap<RedeemerPointer, ExUnits>;

/// The parameters transaction balancing depends on.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProtocolParameters {
    /// Lovelace per transaction byte.
    pub min_fee_a: u64,
    /// Constant lovelace per transaction.
    pub min_fee_b: u64,
    pub max_tx_size: u64,
    pub coins_per_utxo_size: u64,
    pub price_mem: f64,
    pub price_step: f64,
    pub max_tx_ex_mem: u64,
    pub max_tx_ex_steps: u64,
    pub collateral_percent: u64,
    pub max_collateral_inputs: u64,
    /// Plutus V2 cost model in ledger order.
    pub plutus_v2_cost_model: Vec<i64>,
}

/// Serialization overhead added to an output's size for the min-UTxO rule.
const UTXO_ENTRY_OVERHEAD: u64 = 160;

impl ProtocolParameters {
    pub fn linear_fee(&self, tx_size: usize) -> u64 {
        self.min_fee_a * tx_size as u64 + self.min_fee_b
    }

    pub fn execution_fee(&self, units: &ExUnits) -> u64 {
        let cost = self.price_mem * units.mem as f64 + self.price_step * units.steps as f64;
        cost.ceil() as u64
    }

    /// Lovelace the collateral inputs must hold for a transaction paying `fee`.
    pub fn required_collateral(&self, fee: u64) -> u64 {
        (fee * self.collateral_percent).div_ceil(100)
    }

    /// Smallest coin an output of `output_size` serialized bytes may carry.
    pub fn min_lovelace(&self, output_size: usize) -> u64 {
        self.coins_per_utxo_size * (UTXO_ENTRY_OVERHEAD + output_size as u64)
    }

    pub fn max_ex_units(&self) -> ExUnits {
        ExUnits::new(self.max_tx_ex_mem, self.max_tx_ex_steps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> ProtocolParameters {
        ProtocolParameters {
            min_fee_a: 44,
            min_fee_b: 155_381,
            max_tx_size: 16_384,
            coins_per_utxo_size: 4_310,
            price_mem: 0.0577,
            price_step: 0.0000721,
            max_tx_ex_mem: 14_000_000,
            max_tx_ex_steps: 10_000_000_000,
            collateral_percent: 150,
            max_collateral_inputs: 3,
            plutus_v2_cost_model: vec![],
        }
    }

    #[test]
    fn linear_fee() {
        assert_eq!(params().linear_fee(300), 44 * 300 + 155_381);
    }

    #[test]
    fn execution_fee_rounds_up() {
        let fee = params().execution_fee(&ExUnits::new(1_000, 1_000_000));
        // 57.7 + 72.1
        assert_eq!(fee, 130);
    }

    #[test]
    fn collateral_rounds_up() {
        assert_eq!(params().required_collateral(200_001), 300_002);
        assert_eq!(params().required_collateral(200_000), 300_000);
    }

    #[test]
    fn min_lovelace_includes_overhead() {
        assert_eq!(params().min_lovelace(65), 4_310 * 225);
    }

    #[test]
    fn redeemer_pointer_parse() {
        let p: RedeemerPointer = "spend:2".parse().unwrap();
        assert_eq!(p, RedeemerPointer::spend(2));
        assert_eq!(p.to_string(), "spend:2");
        assert!("spend".parse::<RedeemerPointer>().is_err());
        assert!("vote:0".parse::<RedeemerPointer>().is_err());
    }
}
