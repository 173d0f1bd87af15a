//! Ed25519 key generation and signing-key parsing.

use ed25519_dalek::SigningKey;
use oracle_types::{KeyPair, PrivateKey, PublicKey};
use rand::rngs::OsRng;

use crate::CryptoError;

/// CBOR header of a 32-byte bytestring, the envelope `cardano-cli` uses for
/// `.skey` payloads.
const CBOR_BYTES32_PREFIX: &str = "5820";

/// Generate a new Ed25519 key pair from a secure random source.
pub fn generate_keypair() -> KeyPair {
    let signing_key = SigningKey::generate(&mut OsRng);
    let verifying_key = signing_key.verifying_key();
    KeyPair {
        public: PublicKey(verifying_key.to_bytes()),
        private: PrivateKey(signing_key.to_bytes()),
    }
}

/// Derive the public key from a private key.
pub fn public_from_private(private: &PrivateKey) -> PublicKey {
    let signing_key = SigningKey::from_bytes(&private.0);
    PublicKey(signing_key.verifying_key().to_bytes())
}

/// Reconstruct a full key pair from a private key.
pub fn keypair_from_private(private: PrivateKey) -> KeyPair {
    let public = public_from_private(&private);
    KeyPair { public, private }
}

/// Derive a key pair from a 32-byte seed (deterministic).
pub fn keypair_from_seed(seed: &[u8; 32]) -> KeyPair {
    keypair_from_private(PrivateKey(*seed))
}

/// Parse a signing key given as hex text.
///
/// Accepts the CBOR-wrapped form (`5820` followed by 64 hex chars) or a bare
/// 64-char hex seed. Surrounding whitespace is ignored.
pub fn parse_signing_key(text: &str) -> Result<PrivateKey, CryptoError> {
    let text = text.trim();
    let seed_hex = match text.len() {
        68 if text.to_ascii_lowercase().starts_with(CBOR_BYTES32_PREFIX) => &text[4..],
        64 => text,
        n => {
            return Err(CryptoError::InvalidSigningKey(format!(
                "expected 64 hex chars or a 5820-prefixed CBOR key, got {n} chars"
            )))
        }
    };
    let bytes =
        hex::decode(seed_hex).map_err(|e| CryptoError::InvalidSigningKey(e.to_string()))?;
    Ok(PrivateKey::from_slice(&bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_produces_valid_keypair() {
        let kp = generate_keypair();
        assert_ne!(kp.public.0, [0u8; 32]);
        assert_ne!(kp.private.0, [0u8; 32]);
    }

    #[test]
    fn public_from_private_is_deterministic() {
        let kp = generate_keypair();
        let pub2 = public_from_private(&kp.private);
        assert_eq!(kp.public.0, pub2.0);
    }

    #[test]
    fn keypair_from_seed_deterministic() {
        let kp1 = keypair_from_seed(&[42u8; 32]);
        let kp2 = keypair_from_seed(&[42u8; 32]);
        assert_eq!(kp1.public.0, kp2.public.0);
        assert_eq!(kp1.private.0, kp2.private.0);
    }

    #[test]
    fn parse_cbor_wrapped_key() {
        let key = parse_signing_key(
            "5820ac29084c8ceca56b02c4118e76c1845c40b5eb810444a069e8edf2f5280ee875",
        )
        .unwrap();
        assert_eq!(key.0[0], 0xac);
        assert_eq!(key.0[31], 0x75);
    }

    #[test]
    fn parse_raw_seed() {
        let hex_seed = "11".repeat(32);
        let key = parse_signing_key(&hex_seed).unwrap();
        assert_eq!(key.0, [0x11; 32]);
    }

    #[test]
    fn reject_malformed_keys() {
        assert!(parse_signing_key("5820abcd").is_err());
        assert!(parse_signing_key(&"zz".repeat(32)).is_err());
        assert!(parse_signing_key(&format!("5821{}", "00".repeat(32))).is_err());
        assert!(parse_signing_key("").is_err());
    }
}
