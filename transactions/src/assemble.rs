//! Payer witness replacement.

use oracle_types::PrivateKey;

use crate::transaction::{Transaction, VKeyWitness};
use crate::TxBuildError;

/// Seed of the well-known key every flow signs with while balancing.
///
/// A witness is the same size whatever key produced it, so a transaction
/// balanced with this key keeps a valid fee once the real payer's witness
/// replaces the placeholder.
const PLACEHOLDER_SEED: [u8; 32] = [
    0xac, 0x29, 0x08, 0x4c, 0x8c, 0xec, 0xa5, 0x6b, 0x02, 0xc4, 0x11, 0x8e, 0x76, 0xc1, 0x84, 0x5c,
    0x40, 0xb5, 0xeb, 0x81, 0x04, 0x44, 0xa0, 0x69, 0xe8, 0xed, 0xf2, 0xf5, 0x28, 0x0e, 0xe8, 0x75,
];

pub fn placeholder_key() -> PrivateKey {
    PrivateKey(PLACEHOLDER_SEED)
}

/// Replace every key witness with a single witness of `payer` over the body hash.
///
/// Redeemers and scripts are kept as they are.
pub fn assemble(mut tx: Transaction, payer: &PrivateKey) -> Result<Transaction, TxBuildError> {
    let body_hash = tx.id()?;
    tx.witness_set.vkey_witnesses = vec![VKeyWitness {
        vkey: oracle_crypto::public_from_private(payer),
        signature: oracle_crypto::sign_message(body_hash.as_bytes(), payer),
    }];
    tracing::debug!(tx_id = %body_hash, "payer witness attached");
    Ok(tx)
}
