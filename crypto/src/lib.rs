//! Cryptographic primitives for the oracle/escrow layer.
//!
//! - **Ed25519** for payer witnesses and oracle result signatures
//! - **Blake2b** (224 and 256 bit) for key hashes, script hashes and body hashes
//! - **Bech32** text encoding of Shelley addresses
//! - The results grammar oracles sign over

pub mod address;
pub mod error;
pub mod hash;
pub mod keys;
pub mod sign;
pub mod standard;

pub use address::{decode_address, encode_address, enterprise_address, key_hash};
pub use error::{CryptoError, SignatureError};
pub use hash::{blake2b_224, blake2b_256, blake2b_256_multi, hash_transaction_body};
pub use keys::{
    generate_keypair, keypair_from_private, keypair_from_seed, parse_signing_key,
    public_from_private,
};
pub use sign::{sign_message, verify_hex, verify_signature};
pub use standard::enforce_format;
