//! Babbage-era transaction model and its CBOR serialization.
//!
//! The body is serialized once and those exact bytes are hashed, signed and
//! embedded in the transaction.

use minicbor::data::Tag;
use minicbor::encode::{self, Encoder, Write};
use minicbor::Encode;
use oracle_chain::{ExUnits, RedeemerTag};
use oracle_datum::PlutusData;
use oracle_types::{
    DatumOption, KeyHash, PublicKey, Signature, TransactionInput, TransactionOutput, TxHash,
    Value,
};

use crate::script::PlutusScript;
use crate::TxBuildError;

/// Tag wrapping embedded CBOR (inline datums, reference scripts).
const ENCODED_CBOR_TAG: u64 = 24;

/// Language id of Plutus V2 in the language views map.
const PLUTUS_V2_LANGUAGE: u8 = 1;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Redeemer {
    pub tag: RedeemerTag,
    pub index: u32,
    pub data: PlutusData,
    pub ex_units: ExUnits,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VKeyWitness {
    pub vkey: PublicKey,
    pub signature: Signature,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WitnessSet {
    pub vkey_witnesses: Vec<VKeyWitness>,
    pub redeemers: Vec<Redeemer>,
    pub plutus_v2_scripts: Vec<PlutusScript>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TransactionBody {
    /// Sorted; redeemer indices point into this order.
    pub inputs: Vec<TransactionInput>,
    pub outputs: Vec<TransactionOutput>,
    pub fee: u64,
    /// Slot before which the transaction is invalid.
    pub validity_start: Option<u64>,
    pub script_data_hash: Option<[u8; 32]>,
    pub collateral: Vec<TransactionInput>,
    pub required_signers: Vec<KeyHash>,
    pub reference_inputs: Vec<TransactionInput>,
}

impl TransactionBody {
    pub fn to_cbor(&self) -> Result<Vec<u8>, TxBuildError> {
        let mut e = Encoder::new(Vec::new());
        encode_body(self, &mut e)?;
        Ok(e.into_writer())
    }

    pub fn hash(&self) -> Result<TxHash, TxBuildError> {
        Ok(oracle_crypto::hash_transaction_body(&self.to_cbor()?))
    }
}

impl WitnessSet {
    pub fn to_cbor(&self) -> Result<Vec<u8>, TxBuildError> {
        let mut e = Encoder::new(Vec::new());
        encode_witness_set(self, &mut e)?;
        Ok(e.into_writer())
    }
}

/// A complete transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transaction {
    pub body: TransactionBody,
    pub witness_set: WitnessSet,
}

impl Transaction {
    /// `[body, witness_set, true, null]`
    pub fn to_cbor(&self) -> Result<Vec<u8>, TxBuildError> {
        let body = self.body.to_cbor()?;
        let witnesses = self.witness_set.to_cbor()?;
        let mut out = Vec::with_capacity(body.len() + witnesses.len() + 3);
        out.push(0x84);
        out.extend_from_slice(&body);
        out.extend_from_slice(&witnesses);
        out.push(0xf5);
        out.push(0xf6);
        Ok(out)
    }

    /// The transaction id.
    pub fn id(&self) -> Result<TxHash, TxBuildError> {
        self.body.hash()
    }

    pub fn size(&self) -> Result<usize, TxBuildError> {
        Ok(self.to_cbor()?.len())
    }

    /// Sum of the execution budgets of all redeemers.
    pub fn total_ex_units(&self) -> ExUnits {
        self.witness_set
            .redeemers
            .iter()
            .fold(ExUnits::default(), |acc, r| {
                ExUnits::new(acc.mem + r.ex_units.mem, acc.steps + r.ex_units.steps)
            })
    }
}

/// Hash binding the redeemers and the cost model to the body.
///
/// Datums are all inline, so the datum part of the preimage is empty.
pub fn script_data_hash(
    redeemers: &[Redeemer],
    plutus_v2_cost_model: &[i64],
) -> Result<[u8; 32], TxBuildError> {
    let mut e = Encoder::new(Vec::new());
    encode_redeemers(redeemers, &mut e)?;
    let redeemers = e.into_writer();

    let mut e = Encoder::new(Vec::new());
    e.map(1)?.u8(PLUTUS_V2_LANGUAGE)?.array(plutus_v2_cost_model.len() as u64)?;
    for cost in plutus_v2_cost_model {
        e.i64(*cost)?;
    }
    let language_views = e.into_writer();

    Ok(oracle_crypto::blake2b_256_multi(&[
        &redeemers,
        &language_views,
    ]))
}

/// Serialized size of one output.
pub fn output_size(output: &TransactionOutput) -> Result<usize, TxBuildError> {
    let mut e = Encoder::new(Vec::new());
    encode_output(output, &mut e)?;
    Ok(e.into_writer().len())
}

fn encode_inputs<W: Write>(
    inputs: &[TransactionInput],
    e: &mut Encoder<W>,
) -> Result<(), encode::Error<W::Error>> {
    e.array(inputs.len() as u64)?;
    for input in inputs {
        e.array(2)?.bytes(input.tx_hash.as_bytes())?.u32(input.index)?;
    }
    Ok(())
}

fn encode_value<W: Write>(value: &Value, e: &mut Encoder<W>) -> Result<(), encode::Error<W::Error>> {
    if !value.has_assets() {
        e.u64(value.coin())?;
        return Ok(());
    }
    e.array(2)?.u64(value.coin())?;
    e.map(value.assets().len() as u64)?;
    for (policy, names) in value.assets() {
        e.bytes(policy.as_bytes())?.map(names.len() as u64)?;
        for (name, quantity) in names {
            e.bytes(&name.0)?.u64(*quantity)?;
        }
    }
    Ok(())
}

/// Plain outputs use the legacy array form; outputs with a datum or a
/// reference script use the map form.
fn encode_output<W: Write>(
    output: &TransactionOutput,
    e: &mut Encoder<W>,
) -> Result<(), encode::Error<W::Error>> {
    let address = output.address.to_bytes();
    if output.datum.is_none() && output.script_ref.is_none() {
        e.array(2)?.bytes(&address)?;
        return encode_value(&output.amount, e);
    }

    let len = 2 + u64::from(output.datum.is_some()) + u64::from(output.script_ref.is_some());
    e.map(len)?.u8(0)?.bytes(&address)?.u8(1)?;
    encode_value(&output.amount, e)?;
    match &output.datum {
        Some(DatumOption::Hash(hash)) => {
            e.u8(2)?.array(2)?.u8(0)?.bytes(hash.as_bytes())?;
        }
        Some(DatumOption::Inline(cbor)) => {
            e.u8(2)?
                .array(2)?
                .u8(1)?
                .tag(Tag::new(ENCODED_CBOR_TAG))?
                .bytes(cbor)?;
        }
        None => {}
    }
    if let Some(script) = &output.script_ref {
        e.u8(3)?.tag(Tag::new(ENCODED_CBOR_TAG))?.bytes(script)?;
    }
    Ok(())
}

fn encode_body<W: Write>(
    body: &TransactionBody,
    e: &mut Encoder<W>,
) -> Result<(), encode::Error<W::Error>> {
    let len = 3
        + u64::from(body.validity_start.is_some())
        + u64::from(body.script_data_hash.is_some())
        + u64::from(!body.collateral.is_empty())
        + u64::from(!body.required_signers.is_empty())
        + u64::from(!body.reference_inputs.is_empty());
    e.map(len)?;

    e.u8(0)?;
    encode_inputs(&body.inputs, e)?;
    e.u8(1)?.array(body.outputs.len() as u64)?;
    for output in &body.outputs {
        encode_output(output, e)?;
    }
    e.u8(2)?.u64(body.fee)?;
    if let Some(slot) = body.validity_start {
        e.u8(8)?.u64(slot)?;
    }
    if let Some(hash) = &body.script_data_hash {
        e.u8(11)?.bytes(hash)?;
    }
    if !body.collateral.is_empty() {
        e.u8(13)?;
        encode_inputs(&body.collateral, e)?;
    }
    if !body.required_signers.is_empty() {
        e.u8(14)?.array(body.required_signers.len() as u64)?;
        for signer in &body.required_signers {
            e.bytes(signer.as_bytes())?;
        }
    }
    if !body.reference_inputs.is_empty() {
        e.u8(18)?;
        encode_inputs(&body.reference_inputs, e)?;
    }
    Ok(())
}

fn encode_redeemers<W: Write>(
    redeemers: &[Redeemer],
    e: &mut Encoder<W>,
) -> Result<(), encode::Error<W::Error>> {
    e.array(redeemers.len() as u64)?;
    for r in redeemers {
        e.array(4)?.u8(r.tag.as_u8())?.u32(r.index)?;
        r.data.encode(e, &mut ())?;
        e.array(2)?.u64(r.ex_units.mem)?.u64(r.ex_units.steps)?;
    }
    Ok(())
}

fn encode_witness_set<W: Write>(
    witnesses: &WitnessSet,
    e: &mut Encoder<W>,
) -> Result<(), encode::Error<W::Error>> {
    let len = u64::from(!witnesses.vkey_witnesses.is_empty())
        + u64::from(!witnesses.redeemers.is_empty())
        + u64::from(!witnesses.plutus_v2_scripts.is_empty());
    e.map(len)?;
    if !witnesses.vkey_witnesses.is_empty() {
        e.u8(0)?.array(witnesses.vkey_witnesses.len() as u64)?;
        for w in &witnesses.vkey_witnesses {
            e.array(2)?
                .bytes(w.vkey.as_bytes())?
                .bytes(w.signature.as_bytes())?;
        }
    }
    if !witnesses.redeemers.is_empty() {
        e.u8(5)?;
        encode_redeemers(&witnesses.redeemers, e)?;
    }
    if !witnesses.plutus_v2_scripts.is_empty() {
        e.u8(6)?.array(witnesses.plutus_v2_scripts.len() as u64)?;
        for script in &witnesses.plutus_v2_scripts {
            e.bytes(script.as_bytes())?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use oracle_types::{Address, AssetName, Credential, NetworkId, ScriptHash};

    fn key_address() -> Address {
        Address::enterprise(NetworkId::Testnet, Credential::Key(KeyHash::new([1; 28])))
    }

    fn input(b: u8, index: u32) -> TransactionInput {
        TransactionInput::new(TxHash::new([b; 32]), index)
    }

    #[test]
    fn minimal_body_layout() {
        let body = TransactionBody {
            inputs: vec![input(0xAA, 0)],
            outputs: vec![TransactionOutput::new(key_address(), Value::lovelace(1_000_000))],
            fee: 170_000,
            ..Default::default()
        };
        let cbor = hex::encode(body.to_cbor().unwrap());
        let expected = format!(
            "a3\
             0081825820{}00\
             018182581d60{}1a000f4240\
             021a00029810",
            "aa".repeat(32),
            "01".repeat(28),
        );
        assert_eq!(cbor, expected);
    }

    #[test]
    fn inline_datum_output_uses_map_form() {
        let output =
            TransactionOutput::new(key_address(), Value::lovelace(2_000_000)).with_inline_datum(vec![0x80]);
        let mut e = Encoder::new(Vec::new());
        encode_output(&output, &mut e).unwrap();
        let cbor = hex::encode(e.into_writer());
        assert!(cbor.starts_with("a300581d60"));
        assert!(cbor.ends_with("028201d8184180"));
    }

    #[test]
    fn multi_asset_value_layout() {
        let value = Value::lovelace(5).with_asset(ScriptHash::new([2; 28]), AssetName(b"a".to_vec()), 7);
        let mut e = Encoder::new(Vec::new());
        encode_value(&value, &mut e).unwrap();
        assert_eq!(
            hex::encode(e.into_writer()),
            format!("8205a1581c{}a1416107", "02".repeat(28))
        );
    }

    #[test]
    fn transaction_wraps_body_and_witnesses() {
        let tx = Transaction {
            body: TransactionBody {
                inputs: vec![input(1, 0)],
                fee: 1,
                ..Default::default()
            },
            witness_set: WitnessSet::default(),
        };
        let cbor = tx.to_cbor().unwrap();
        assert_eq!(cbor[0], 0x84);
        assert_eq!(&cbor[cbor.len() - 3..], &[0xa0, 0xf5, 0xf6]);
        assert_eq!(
            tx.id().unwrap(),
            oracle_crypto::hash_transaction_body(&tx.body.to_cbor().unwrap())
        );
    }

    #[test]
    fn witness_set_keys() {
        let witnesses = WitnessSet {
            vkey_witnesses: vec![VKeyWitness {
                vkey: PublicKey([3; 32]),
                signature: Signature([4; 64]),
            }],
            redeemers: vec![Redeemer {
                tag: RedeemerTag::Spend,
                index: 1,
                data: PlutusData::constr(0, vec![]),
                ex_units: ExUnits::new(10, 20),
            }],
            plutus_v2_scripts: vec![PlutusScript::new(vec![0x01])],
        };
        let cbor = hex::encode(witnesses.to_cbor().unwrap());
        assert!(cbor.starts_with("a300818258"));
        assert!(cbor.contains("0581840001d87980820a14"));
        assert!(cbor.ends_with("06814101"));
    }

    #[test]
    fn script_data_hash_depends_on_ex_units() {
        let mut redeemer = Redeemer {
            tag: RedeemerTag::Spend,
            index: 0,
            data: PlutusData::int(1),
            ex_units: ExUnits::new(1, 1),
        };
        let a = script_data_hash(std::slice::from_ref(&redeemer), &[1, 2, 3]).unwrap();
        redeemer.ex_units = ExUnits::new(2, 1);
        let b = script_data_hash(std::slice::from_ref(&redeemer), &[1, 2, 3]).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn script_data_hash_preimage() {
        let redeemer = Redeemer {
            tag: RedeemerTag::Spend,
            index: 0,
            data: PlutusData::int(1),
            ex_units: ExUnits::new(1, 2),
        };
        let hash = script_data_hash(&[redeemer], &[5, -1]).unwrap();
        let redeemers = hex::decode("8184000001820102").unwrap();
        let views = hex::decode("a101820520").unwrap();
        assert_eq!(
            hash,
            oracle_crypto::blake2b_256_multi(&[&redeemers, &views])
        );
    }
}
