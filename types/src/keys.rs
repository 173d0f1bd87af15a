//! Ed25519 key material for payers and oracle signers.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::OracleError;

fn array_from_slice<const N: usize>(bytes: &[u8]) -> Result<[u8; N], OracleError> {
    bytes.try_into().map_err(|_| OracleError::InvalidLength {
        expected: N,
        actual: bytes.len(),
    })
}

/// Public key material travels as lowercase hex in JSON and in the store.
macro_rules! hex_key {
    ($(#[$doc:meta])* $name:ident, $len:expr) => {
        $(#[$doc])*
        #[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(pub [u8; $len]);

        impl $name {
            pub fn as_bytes(&self) -> &[u8; $len] {
                &self.0
            }

            pub fn from_slice(bytes: &[u8]) -> Result<Self, OracleError> {
                array_from_slice(bytes).map(Self)
            }

            pub fn from_hex(s: &str) -> Result<Self, OracleError> {
                let bytes = hex::decode(s).map_err(|e| OracleError::InvalidHex(e.to_string()))?;
                Self::from_slice(&bytes)
            }

            pub fn to_hex(&self) -> String {
                hex::encode(self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.to_hex())
            }
        }

        impl FromStr for $name {
            type Err = OracleError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::from_hex(s)
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.to_hex())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let text = String::deserialize(deserializer)?;
                Self::from_hex(&text).map_err(serde::de::Error::custom)
            }
        }
    };
}

hex_key!(
    /// A 32-byte Ed25519 verification key.
    ///
    /// Oracle sets in the on-chain datum are lists of these.
    PublicKey,
    32
);

hex_key!(
    /// A detached 64-byte Ed25519 signature.
    Signature,
    64
);

/// A 32-byte Ed25519 signing key seed.
///
/// No `Debug`, `Serialize` or `Clone`; the bytes are wiped on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct PrivateKey(pub [u8; 32]);

impl PrivateKey {
    pub fn from_slice(bytes: &[u8]) -> Result<Self, OracleError> {
        array_from_slice(bytes).map(Self)
    }
}

pub struct KeyPair {
    pub public: PublicKey,
    pub private: PrivateKey,
}
