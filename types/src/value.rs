//! Output values: lovelace plus native assets.
//!
//! Amounts are unsigned integers; arithmetic is checked so an over-spend
//! surfaces as `None` rather than wrapping.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::ScriptHash;

/// Lovelace in one ADA.
pub const LOVELACE_PER_ADA: u64 = 1_000_000;

/// A native asset name (0 to 32 bytes).
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AssetName(pub Vec<u8>);

/// Native assets grouped by policy id.
pub type MultiAsset = BTreeMap<ScriptHash, BTreeMap<AssetName, u64>>;

/// Lovelace plus native assets held by an output.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Value {
    coin: u64,
    assets: MultiAsset,
}

impl Value {
    pub const ZERO: Self = Self {
        coin: 0,
        assets: BTreeMap::new(),
    };

    pub fn lovelace(coin: u64) -> Self {
        Self {
            coin,
            assets: BTreeMap::new(),
        }
    }

    pub fn new(coin: u64, assets: MultiAsset) -> Self {
        let mut value = Self { coin, assets };
        value.prune();
        value
    }

    pub fn coin(&self) -> u64 {
        self.coin
    }

    pub fn assets(&self) -> &MultiAsset {
        &self.assets
    }

    pub fn has_assets(&self) -> bool {
        !self.assets.is_empty()
    }

    pub fn is_zero(&self) -> bool {
        self.coin == 0 && self.assets.is_empty()
    }

    /// Add a quantity of one asset.
    pub fn with_asset(mut self, policy: ScriptHash, name: AssetName, quantity: u64) -> Self {
        if quantity > 0 {
            *self
                .assets
                .entry(policy)
                .or_default()
                .entry(name)
                .or_insert(0) += quantity;
        }
        self
    }

    pub fn checked_add(&self, other: &Value) -> Option<Value> {
        let coin = self.coin.checked_add(other.coin)?;
        let mut assets = self.assets.clone();
        for (policy, names) in &other.assets {
            let entry = assets.entry(*policy).or_default();
            for (name, qty) in names {
                let slot = entry.entry(name.clone()).or_insert(0);
                *slot = slot.checked_add(*qty)?;
            }
        }
        Some(Value::new(coin, assets))
    }

    /// Subtract `other`, returning `None` if any component would go negative.
    pub fn checked_sub(&self, other: &Value) -> Option<Value> {
        let coin = self.coin.checked_sub(other.coin)?;
        let mut assets = self.assets.clone();
        for (policy, names) in &other.assets {
            let entry = assets.get_mut(policy)?;
            for (name, qty) in names {
                let slot = entry.get_mut(name)?;
                *slot = slot.checked_sub(*qty)?;
            }
        }
        Some(Value::new(coin, assets))
    }

    /// Whether this value holds at least `other` in every component.
    pub fn covers(&self, other: &Value) -> bool {
        self.checked_sub(other).is_some()
    }

    fn prune(&mut self) {
        for names in self.assets.values_mut() {
            names.retain(|_, qty| *qty > 0);
        }
        self.assets.retain(|_, names| !names.is_empty());
    }
}

impl From<u64> for Value {
    fn from(coin: u64) -> Self {
        Self::lovelace(coin)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} lovelace", self.coin)?;
        let count: usize = self.assets.values().map(|names| names.len()).sum();
        if count > 0 {
            write!(f, " + {count} asset(s)")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> ScriptHash {
        ScriptHash::new([9; 28])
    }

    #[test]
    fn covers_compares_every_component() {
        let have = Value::lovelace(5_000_000).with_asset(policy(), AssetName(b"tok".to_vec()), 3);
        let need = Value::lovelace(4_000_000).with_asset(policy(), AssetName(b"tok".to_vec()), 2);
        assert!(have.covers(&need));
        assert!(!need.covers(&have));
        assert!(!Value::lovelace(10_000_000).covers(&need));
    }

    #[test]
    fn sub_removes_exhausted_assets() {
        let a = Value::lovelace(3).with_asset(policy(), AssetName(vec![1]), 2);
        let b = Value::lovelace(1).with_asset(policy(), AssetName(vec![1]), 2);
        let diff = a.checked_sub(&b).unwrap();
        assert_eq!(diff, Value::lovelace(2));
        assert!(!diff.has_assets());
    }

    #[test]
    fn sub_underflow_is_none() {
        assert!(Value::lovelace(1).checked_sub(&Value::lovelace(2)).is_none());
    }

    #[test]
    fn zero_quantity_assets_are_dropped() {
        let v = Value::lovelace(1).with_asset(policy(), AssetName(vec![]), 0);
        assert!(!v.has_assets());
    }
}
