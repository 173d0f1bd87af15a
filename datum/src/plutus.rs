//! Plutus data and its CBOR encoding.

use minicbor::data::{Int, Tag, Type};
use minicbor::decode::{self, Decoder};
use minicbor::encode::{self, Encoder, Write};
use minicbor::{Decode, Encode};

use crate::DatumError;

/// Byte strings longer than this are written as indefinite chunked strings.
const BYTES_CHUNK: usize = 64;

/// Tag for constructors outside the compact tag ranges: `[alternative, fields]`.
const GENERAL_CONSTR_TAG: u64 = 102;

/// Nesting deeper than this is rejected while decoding.
const MAX_DEPTH: usize = 128;

/// A Plutus data value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PlutusData {
    Constr {
        alternative: u64,
        fields: Vec<PlutusData>,
    },
    Map(Vec<(PlutusData, PlutusData)>),
    List(Vec<PlutusData>),
    Int(i128),
    Bytes(Vec<u8>),
}

impl PlutusData {
    pub fn constr(alternative: u64, fields: Vec<PlutusData>) -> Self {
        Self::Constr {
            alternative,
            fields,
        }
    }

    pub fn bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self::Bytes(bytes.into())
    }

    pub fn int(n: impl Into<i128>) -> Self {
        Self::Int(n.into())
    }

    pub fn list(items: Vec<PlutusData>) -> Self {
        Self::List(items)
    }

    pub fn to_cbor(&self) -> Result<Vec<u8>, DatumError> {
        minicbor::to_vec(self).map_err(|e| DatumError::Encode(e.to_string()))
    }

    /// Decode a complete CBOR item. Trailing bytes are an error.
    pub fn from_cbor(bytes: &[u8]) -> Result<Self, DatumError> {
        let mut d = Decoder::new(bytes);
        let data = decode_data(&mut d, 0)?;
        match bytes.len() - d.position() {
            0 => Ok(data),
            extra => Err(DatumError::TrailingBytes(extra)),
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i128> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[PlutusData]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_constr(&self) -> Option<(u64, &[PlutusData])> {
        match self {
            Self::Constr {
                alternative,
                fields,
            } => Some((*alternative, fields)),
            _ => None,
        }
    }

    pub(crate) fn kind(&self) -> String {
        match self {
            Self::Constr { alternative, .. } => format!("constructor {alternative}"),
            Self::Map(_) => "map".into(),
            Self::List(_) => "list".into(),
            Self::Int(_) => "integer".into(),
            Self::Bytes(_) => "bytes".into(),
        }
    }
}

fn constr_tag(alternative: u64) -> Option<u64> {
    match alternative {
        0..=6 => Some(121 + alternative),
        7..=127 => Some(1280 + alternative - 7),
        _ => None,
    }
}

fn alternative_of(tag: u64) -> Option<u64> {
    match tag {
        121..=127 => Some(tag - 121),
        1280..=1400 => Some(tag - 1280 + 7),
        _ => None,
    }
}

impl<C> Encode<C> for PlutusData {
    fn encode<W: Write>(
        &self,
        e: &mut Encoder<W>,
        ctx: &mut C,
    ) -> Result<(), encode::Error<W::Error>> {
        match self {
            Self::Constr {
                alternative,
                fields,
            } => {
                match constr_tag(*alternative) {
                    Some(tag) => {
                        e.tag(Tag::new(tag))?;
                    }
                    None => {
                        e.tag(Tag::new(GENERAL_CONSTR_TAG))?
                            .array(2)?
                            .u64(*alternative)?;
                    }
                }
                encode_list(fields, e, ctx)
            }
            Self::Map(entries) => {
                e.map(entries.len() as u64)?;
                for (key, value) in entries {
                    key.encode(e, ctx)?;
                    value.encode(e, ctx)?;
                }
                Ok(())
            }
            Self::List(items) => encode_list(items, e, ctx),
            Self::Int(n) => {
                let int = Int::try_from(*n).map_err(|_| {
                    encode::Error::message(format!("integer {n} exceeds the CBOR major type range"))
                })?;
                e.int(int)?;
                Ok(())
            }
            Self::Bytes(bytes) => {
                if bytes.len() <= BYTES_CHUNK {
                    e.bytes(bytes)?;
                } else {
                    e.begin_bytes()?;
                    for chunk in bytes.chunks(BYTES_CHUNK) {
                        e.bytes(chunk)?;
                    }
                    e.end()?;
                }
                Ok(())
            }
        }
    }
}

/// Empty lists are definite (`0x80`); anything else is indefinite.
fn encode_list<C, W: Write>(
    items: &[PlutusData],
    e: &mut Encoder<W>,
    ctx: &mut C,
) -> Result<(), encode::Error<W::Error>> {
    if items.is_empty() {
        e.array(0)?;
        return Ok(());
    }
    e.begin_array()?;
    for item in items {
        item.encode(e, ctx)?;
    }
    e.end()?;
    Ok(())
}

impl<'b, C> Decode<'b, C> for PlutusData {
    fn decode(d: &mut Decoder<'b>, _ctx: &mut C) -> Result<Self, decode::Error> {
        decode_data(d, 0)
    }
}

fn decode_data(d: &mut Decoder<'_>, depth: usize) -> Result<PlutusData, decode::Error> {
    if depth > MAX_DEPTH {
        return Err(decode::Error::message("plutus data nested too deeply"));
    }
    match d.datatype()? {
        Type::Tag => {
            let tag = d.tag()?.as_u64();
            if tag == GENERAL_CONSTR_TAG {
                if d.array()? != Some(2) {
                    return Err(decode::Error::message(
                        "general constructor must be a two-element array",
                    ));
                }
                let alternative = d.u64()?;
                let fields = decode_list(d, depth)?;
                Ok(PlutusData::Constr {
                    alternative,
                    fields,
                })
            } else if let Some(alternative) = alternative_of(tag) {
                let fields = decode_list(d, depth)?;
                Ok(PlutusData::Constr {
                    alternative,
                    fields,
                })
            } else {
                Err(decode::Error::message(format!(
                    "unsupported tag {tag} in plutus data"
                )))
            }
        }
        Type::Map | Type::MapIndef => {
            let mut entries = Vec::new();
            match d.map()? {
                Some(len) => {
                    for _ in 0..len {
                        let key = decode_data(d, depth + 1)?;
                        let value = decode_data(d, depth + 1)?;
                        entries.push((key, value));
                    }
                }
                None => {
                    while d.datatype()? != Type::Break {
                        let key = decode_data(d, depth + 1)?;
                        let value = decode_data(d, depth + 1)?;
                        entries.push((key, value));
                    }
                    skip_break(d);
                }
            }
            Ok(PlutusData::Map(entries))
        }
        Type::Array | Type::ArrayIndef => Ok(PlutusData::List(decode_list(d, depth)?)),
        Type::U8
        | Type::U16
        | Type::U32
        | Type::U64
        | Type::I8
        | Type::I16
        | Type::I32
        | Type::I64
        | Type::Int => Ok(PlutusData::Int(i128::from(d.int()?))),
        Type::Bytes => Ok(PlutusData::Bytes(d.bytes()?.to_vec())),
        Type::BytesIndef => {
            let mut out = Vec::new();
            for chunk in d.bytes_iter()? {
                out.extend_from_slice(chunk?);
            }
            Ok(PlutusData::Bytes(out))
        }
        other => Err(decode::Error::message(format!(
            "{other:?} is not valid plutus data"
        ))),
    }
}

fn decode_list(d: &mut Decoder<'_>, depth: usize) -> Result<Vec<PlutusData>, decode::Error> {
    let mut items = Vec::new();
    match d.array()? {
        Some(len) => {
            for _ in 0..len {
                items.push(decode_data(d, depth + 1)?);
            }
        }
        None => {
            while d.datatype()? != Type::Break {
                items.push(decode_data(d, depth + 1)?);
            }
            skip_break(d);
        }
    }
    Ok(items)
}

fn skip_break(d: &mut Decoder<'_>) {
    d.set_position(d.position() + 1);
}

// Field readers shared by the record types.

pub(crate) fn expect_bytes<'a>(
    data: &'a PlutusData,
    field: &'static str,
) -> Result<&'a [u8], DatumError> {
    data.as_bytes().ok_or_else(|| DatumError::Shape {
        field,
        expected: "bytes",
        found: data.kind(),
    })
}

pub(crate) fn expect_uint(data: &PlutusData, field: &'static str) -> Result<u64, DatumError> {
    data.as_int()
        .and_then(|n| u64::try_from(n).ok())
        .ok_or_else(|| DatumError::Shape {
            field,
            expected: "non-negative integer",
            found: data.kind(),
        })
}

pub(crate) fn expect_list<'a>(
    data: &'a PlutusData,
    field: &'static str,
) -> Result<&'a [PlutusData], DatumError> {
    data.as_list().ok_or_else(|| DatumError::Shape {
        field,
        expected: "list",
        found: data.kind(),
    })
}

pub(crate) fn expect_constr<'a>(
    data: &'a PlutusData,
    field: &'static str,
) -> Result<(u64, &'a [PlutusData]), DatumError> {
    data.as_constr().ok_or_else(|| DatumError::Shape {
        field,
        expected: "constructor",
        found: data.kind(),
    })
}

pub(crate) fn expect_fields<'a>(
    fields: &'a [PlutusData],
    record: &'static str,
    expected: usize,
) -> Result<&'a [PlutusData], DatumError> {
    if fields.len() != expected {
        return Err(DatumError::FieldCount {
            record,
            expected,
            found: fields.len(),
        });
    }
    Ok(fields)
}

/// A payment credential as the validators see an address: `Constr 0 [key hash]`.
pub(crate) fn plutus_address(payment: &oracle_types::KeyHash) -> PlutusData {
    PlutusData::constr(0, vec![PlutusData::bytes(payment.as_bytes().to_vec())])
}

pub(crate) fn read_plutus_address(
    data: &PlutusData,
    field: &'static str,
) -> Result<oracle_types::KeyHash, DatumError> {
    match expect_constr(data, field)? {
        (0, [payment]) => Ok(oracle_types::KeyHash::from_slice(expect_bytes(
            payment, field,
        )?)?),
        (0, fields) => Err(DatumError::FieldCount {
            record: field,
            expected: 1,
            found: fields.len(),
        }),
        (alternative, _) => Err(DatumError::Constructor { field, alternative }),
    }
}
