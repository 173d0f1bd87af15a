//! Bech32 encoding of Shelley addresses and key-hash derivation.
//!
//! Payment addresses use the `addr` prefix on mainnet and `addr_test` on the
//! test networks. The network tag inside the header byte must agree with the
//! prefix.

use bech32::{FromBase32, ToBase32, Variant};
use oracle_types::{Address, Credential, KeyHash, NetworkId, PublicKey};

use crate::{blake2b_224, CryptoError};

/// Hash a verification key into its 28-byte key hash.
pub fn key_hash(public_key: &PublicKey) -> KeyHash {
    KeyHash::new(blake2b_224(public_key.as_bytes()))
}

/// The enterprise (no stake part) address controlled by `public_key`.
pub fn enterprise_address(network: NetworkId, public_key: &PublicKey) -> Address {
    Address::enterprise(network, Credential::Key(key_hash(public_key)))
}

/// Encode an address as bech32 text.
pub fn encode_address(address: &Address) -> Result<String, CryptoError> {
    let hrp = address.network().address_hrp();
    bech32::encode(hrp, address.to_bytes().to_base32(), Variant::Bech32)
        .map_err(|e| CryptoError::Bech32(e.to_string()))
}

/// Decode bech32 address text.
pub fn decode_address(text: &str) -> Result<Address, CryptoError> {
    let (hrp, data, variant) =
        bech32::decode(text.trim()).map_err(|e| CryptoError::Bech32(e.to_string()))?;
    if variant != Variant::Bech32 {
        return Err(CryptoError::Bech32("bech32m is not used for addresses".into()));
    }
    let bytes = Vec::<u8>::from_base32(&data).map_err(|e| CryptoError::Bech32(e.to_string()))?;
    let address = Address::from_bytes(&bytes)?;

    let expected = address.network().address_hrp();
    if hrp != expected {
        return Err(CryptoError::WrongPrefix {
            expected: expected.to_string(),
            found: hrp,
        });
    }
    Ok(address)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::keypair_from_seed;

    const ENTERPRISE: &str = "addr_test1vpacm899akkpck3u0zmjndfsppapqrxstqq38nwvm0xv7wcjxzzqy";
    const BASE: &str = "addr_test1qp8slek78gxr6wqh004ynlnuex6vnftc70qhxzgh6v8kztlh3032tu7a8vmyr9m74e9cxjj9aty4yuy5radreqc7vuws3gv2t3";

    #[test]
    fn decode_enterprise_testnet_address() {
        let addr = decode_address(ENTERPRISE).unwrap();
        assert_eq!(addr.network(), NetworkId::Testnet);
        assert!(addr.payment_key_hash().is_some());
        assert!(addr.stake().is_none());
        assert_eq!(encode_address(&addr).unwrap(), ENTERPRISE);
    }

    #[test]
    fn decode_base_address() {
        let addr = decode_address(BASE).unwrap();
        assert_eq!(addr.network(), NetworkId::Testnet);
        assert!(addr.stake().is_some());
        assert_eq!(encode_address(&addr).unwrap(), BASE);
    }

    #[test]
    fn derived_address_roundtrips() {
        let kp = keypair_from_seed(&[7u8; 32]);
        let addr = enterprise_address(NetworkId::Mainnet, &kp.public);
        let text = encode_address(&addr).unwrap();
        assert!(text.starts_with("addr1"));
        assert_eq!(decode_address(&text).unwrap(), addr);
        assert_eq!(addr.payment_key_hash(), Some(&key_hash(&kp.public)));
    }

    #[test]
    fn corrupted_checksum_rejected() {
        let mut text = ENTERPRISE.to_string();
        text.pop();
        text.push('q');
        assert!(decode_address(&text).is_err());
    }

    #[test]
    fn mismatched_prefix_rejected() {
        let kp = keypair_from_seed(&[8u8; 32]);
        let addr = enterprise_address(NetworkId::Testnet, &kp.public);
        let bytes = addr.to_bytes();
        let text = bech32::encode("addr", bytes.to_base32(), Variant::Bech32).unwrap();
        assert!(matches!(
            decode_address(&text),
            Err(CryptoError::WrongPrefix { .. })
        ));
    }
}
