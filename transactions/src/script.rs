//! Plutus V2 validators.

use minicbor::Decoder;
use oracle_types::{Address, Credential, NetworkId, ScriptHash};

use crate::TxBuildError;

/// Language prefix hashed in front of a Plutus V2 script.
const PLUTUS_V2_PREFIX: u8 = 0x02;

/// A compiled Plutus V2 script.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlutusScript(Vec<u8>);

impl PlutusScript {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Parse the hex text of a compiled script file.
    ///
    /// The file holds CBOR hex of a byte string wrapping the script; one layer
    /// is removed here. The remaining bytes are what the witness set carries.
    pub fn from_hex(text: &str) -> Result<Self, TxBuildError> {
        let cbor = hex::decode(text.trim())
            .map_err(|e| TxBuildError::InvalidScript(format!("not hex: {e}")))?;
        let mut d = Decoder::new(&cbor);
        let inner = d
            .bytes()
            .map_err(|e| TxBuildError::InvalidScript(format!("not a CBOR byte string: {e}")))?;
        if d.position() != cbor.len() {
            return Err(TxBuildError::InvalidScript(
                "trailing bytes after script".into(),
            ));
        }
        Ok(Self(inner.to_vec()))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn hash(&self) -> ScriptHash {
        let mut preimage = Vec::with_capacity(self.0.len() + 1);
        preimage.push(PLUTUS_V2_PREFIX);
        preimage.extend_from_slice(&self.0);
        ScriptHash::new(oracle_crypto::blake2b_224(&preimage))
    }

    /// The enterprise address locking funds under this script.
    pub fn address(&self, network: NetworkId) -> Address {
        Address::enterprise(network, Credential::Script(self.hash()))
    }
}
