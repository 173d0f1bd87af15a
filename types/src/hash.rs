//! Fixed-size hash types: transaction ids, datum hashes, script and key hashes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::OracleError;

macro_rules! fixed_hash {
    ($(#[$doc:meta])* $name:ident, $len:expr) => {
        $(#[$doc])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name([u8; $len]);

        impl $name {
            pub const LEN: usize = $len;

            pub fn new(bytes: [u8; $len]) -> Self {
                Self(bytes)
            }

            pub fn as_bytes(&self) -> &[u8; $len] {
                &self.0
            }

            pub fn from_slice(bytes: &[u8]) -> Result<Self, OracleError> {
                let arr: [u8; $len] = bytes.try_into().map_err(|_| OracleError::InvalidLength {
                    expected: $len,
                    actual: bytes.len(),
                })?;
                Ok(Self(arr))
            }

            pub fn from_hex(s: &str) -> Result<Self, OracleError> {
                let bytes = hex::decode(s).map_err(|e| OracleError::InvalidHex(e.to_string()))?;
                Self::from_slice(&bytes)
            }

            pub fn to_hex(&self) -> String {
                hex::encode(self.0)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), hex::encode(&self.0[..4]))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", hex::encode(self.0))
            }
        }

        impl FromStr for $name {
            type Err = OracleError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::from_hex(s)
            }
        }
    };
}

fixed_hash!(
    /// A 32-byte transaction id (blake2b-256 of the transaction body).
    TxHash,
    32
);

fixed_hash!(
    /// A 32-byte datum hash (blake2b-256 of the datum CBOR).
    DatumHash,
    32
);

fixed_hash!(
    /// A 28-byte script hash; also used as a minting policy id.
    ScriptHash,
    28
);

fixed_hash!(
    /// A 28-byte verification key hash (blake2b-224 of the public key).
    KeyHash,
    28
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_roundtrip() {
        let s = "02aa7e9d83f43ad54ab2585900292db7280ec43410e7563dac934d17";
        let h = ScriptHash::from_hex(s).unwrap();
        assert_eq!(h.to_hex(), s);
        assert_eq!(h.to_string(), s);
    }

    #[test]
    fn wrong_length_rejected() {
        let err = KeyHash::from_slice(&[0u8; 32]).unwrap_err();
        assert_eq!(
            err,
            OracleError::InvalidLength {
                expected: 28,
                actual: 32
            }
        );
    }

    #[test]
    fn bad_hex_rejected() {
        assert!(matches!(
            TxHash::from_hex("zz"),
            Err(OracleError::InvalidHex(_))
        ));
    }
}
