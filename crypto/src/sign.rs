//! Ed25519 message signing and verification.

use ed25519_dalek::{Signer, SigningKey, VerifyingKey};
use oracle_types::{PrivateKey, PublicKey, Signature};

use crate::SignatureError;

/// Sign a message with a private key, returning the detached signature.
pub fn sign_message(message: &[u8], private_key: &PrivateKey) -> Signature {
    let signing_key = SigningKey::from_bytes(&private_key.0);
    Signature(signing_key.sign(message).to_bytes())
}

/// Verify a detached signature against a message and public key.
///
/// Uses strict verification: weak public keys and non-canonical signatures
/// are rejected.
pub fn verify_signature(
    message: &[u8],
    signature: &Signature,
    public_key: &PublicKey,
) -> Result<(), SignatureError> {
    let verifying_key =
        VerifyingKey::from_bytes(&public_key.0).map_err(|_| SignatureError::MalformedPublicKey)?;
    let dalek_sig = ed25519_dalek::Signature::from_bytes(&signature.0);
    verifying_key
        .verify_strict(message, &dalek_sig)
        .map_err(|_| SignatureError::InvalidSignature)
}

/// Verify hex-encoded key material against a message.
pub fn verify_hex(
    public_key_hex: &str,
    message: &[u8],
    signature_hex: &str,
) -> Result<(), SignatureError> {
    let public_key =
        PublicKey::from_hex(public_key_hex).map_err(|_| SignatureError::MalformedPublicKey)?;
    let signature = Signature::from_hex(signature_hex)
        .map_err(|e| SignatureError::MalformedSignature(e.to_string()))?;
    verify_signature(message, &signature, &public_key)
}
