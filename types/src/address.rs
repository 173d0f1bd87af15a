//! Shelley payment addresses.
//!
//! An address is a header byte followed by a 28-byte payment credential and,
//! for base addresses, a 28-byte stake credential. The header's high nibble
//! selects the credential kinds and the low nibble carries the network tag.
//! Bech32 text encoding lives in `oracle-crypto`.

use serde::{Deserialize, Serialize};

use crate::{KeyHash, NetworkId, OracleError, ScriptHash};

/// A payment or stake credential.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Credential {
    Key(KeyHash),
    Script(ScriptHash),
}

impl Credential {
    pub fn as_bytes(&self) -> &[u8; 28] {
        match self {
            Self::Key(h) => h.as_bytes(),
            Self::Script(h) => h.as_bytes(),
        }
    }

    pub fn is_script(&self) -> bool {
        matches!(self, Self::Script(_))
    }
}

/// A base or enterprise address.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Address {
    network: NetworkId,
    payment: Credential,
    stake: Option<Credential>,
}

const ENTERPRISE_KEY: u8 = 0b0110;
const ENTERPRISE_SCRIPT: u8 = 0b0111;

impl Address {
    pub fn new(network: NetworkId, payment: Credential, stake: Option<Credential>) -> Self {
        Self {
            network,
            payment,
            stake,
        }
    }

    /// An address with no stake part.
    pub fn enterprise(network: NetworkId, payment: Credential) -> Self {
        Self::new(network, payment, None)
    }

    pub fn network(&self) -> NetworkId {
        self.network
    }

    pub fn payment(&self) -> &Credential {
        &self.payment
    }

    pub fn stake(&self) -> Option<&Credential> {
        self.stake.as_ref()
    }

    /// The payment key hash, if the payment part is a key credential.
    pub fn payment_key_hash(&self) -> Option<&KeyHash> {
        match &self.payment {
            Credential::Key(h) => Some(h),
            Credential::Script(_) => None,
        }
    }

    fn header(&self) -> u8 {
        let kind = match (&self.payment, &self.stake) {
            (Credential::Key(_), Some(Credential::Key(_))) => 0b0000,
            (Credential::Script(_), Some(Credential::Key(_))) => 0b0001,
            (Credential::Key(_), Some(Credential::Script(_))) => 0b0010,
            (Credential::Script(_), Some(Credential::Script(_))) => 0b0011,
            (Credential::Key(_), None) => ENTERPRISE_KEY,
            (Credential::Script(_), None) => ENTERPRISE_SCRIPT,
        };
        (kind << 4) | self.network.tag()
    }

    /// Raw address bytes as carried in transaction outputs.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(57);
        out.push(self.header());
        out.extend_from_slice(self.payment.as_bytes());
        if let Some(stake) = &self.stake {
            out.extend_from_slice(stake.as_bytes());
        }
        out
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, OracleError> {
        let (&header, rest) = bytes
            .split_first()
            .ok_or_else(|| OracleError::InvalidAddress("empty address".into()))?;
        let network = NetworkId::from_tag(header & 0x0F).ok_or_else(|| {
            OracleError::InvalidAddress(format!("unknown network tag {}", header & 0x0F))
        })?;
        let kind = header >> 4;

        let key = |b: &[u8]| KeyHash::from_slice(b).map(Credential::Key);
        let script = |b: &[u8]| ScriptHash::from_slice(b).map(Credential::Script);

        let (payment, stake) = match (kind, rest.len()) {
            (0b0000..=0b0011, 56) => {
                let (p, s) = rest.split_at(28);
                let payment = if kind & 0b01 == 0 { key(p)? } else { script(p)? };
                let stake = if kind & 0b10 == 0 { key(s)? } else { script(s)? };
                (payment, Some(stake))
            }
            (ENTERPRISE_KEY, 28) => (key(rest)?, None),
            (ENTERPRISE_SCRIPT, 28) => (script(rest)?, None),
            (kind, len) => {
                return Err(OracleError::InvalidAddress(format!(
                    "unsupported address kind {kind:#06b} with {len} payload bytes"
                )))
            }
        };

        Ok(Self {
            network,
            payment,
            stake,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key_hash(b: u8) -> KeyHash {
        KeyHash::new([b; 28])
    }

    #[test]
    fn enterprise_header() {
        let addr = Address::enterprise(NetworkId::Testnet, Credential::Key(key_hash(1)));
        let bytes = addr.to_bytes();
        assert_eq!(bytes[0], 0x60);
        assert_eq!(bytes.len(), 29);
        assert_eq!(Address::from_bytes(&bytes).unwrap(), addr);
    }

    #[test]
    fn script_enterprise_mainnet_header() {
        let addr = Address::enterprise(
            NetworkId::Mainnet,
            Credential::Script(ScriptHash::new([7; 28])),
        );
        assert_eq!(addr.to_bytes()[0], 0x71);
        assert!(addr.payment_key_hash().is_none());
    }

    #[test]
    fn base_address_roundtrip() {
        let addr = Address::new(
            NetworkId::Testnet,
            Credential::Key(key_hash(2)),
            Some(Credential::Key(key_hash(3))),
        );
        let bytes = addr.to_bytes();
        assert_eq!(bytes[0], 0x00);
        assert_eq!(bytes.len(), 57);
        assert_eq!(Address::from_bytes(&bytes).unwrap(), addr);
    }

    #[test]
    fn truncated_address_rejected() {
        assert!(Address::from_bytes(&[0x60, 1, 2, 3]).is_err());
        assert!(Address::from_bytes(&[]).is_err());
    }
}
