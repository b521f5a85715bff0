//! CBOR transcoding: render parsed log lines as CBOR data items.
//!
//! Mapping from log values to CBOR:
//!   - Value::Null       -> CBOR null
//!   - Value::Bool       -> CBOR bool
//!   - Value::Integer    -> CBOR integer, or a bignum (tag 2/3) beyond
//!                          CBOR's native range (-2^64 to 2^64-1)
//!   - Value::Float      -> CBOR float
//!   - Value::String     -> CBOR text string
//!   - Value::List       -> CBOR array
//!   - Value::Document   -> CBOR map (text keys, source order, repeats kept)
//!   - Value::Date       -> tag 1 (epoch seconds, fractional when needed)
//!   - Value::Regex      -> tag 35 over `/pattern/flags`
//!   - Value::ObjectId, BinData, Timestamp, NumberLong, MinKey, MaxKey,
//!     Undefined -> single-entry maps in the extended JSON shape
//!     (`{"$oid": ...}`, `{"$minKey": 1}`, ...)
//!
//! Each line is written as one data item, so a whole run forms a CBOR
//! sequence.

use ciborium::value::{Integer, Value as CborValue};
use libmlog::{Document, LogLine, Value};
use num_bigint::{BigInt, Sign};

const TAG_EPOCH: u64 = 1;
const TAG_POS_BIGNUM: u64 = 2;
const TAG_NEG_BIGNUM: u64 = 3;
const TAG_REGEX: u64 = 35;

/// Encode a parsed line as CBOR bytes.
pub fn encode(line: &LogLine) -> Result<Vec<u8>, String> {
    let cbor_value = document_to_cbor(line.fields());
    let mut buf = Vec::new();
    ciborium::ser::into_writer(&cbor_value, &mut buf)
        .map_err(|e| format!("CBOR encode error: {}", e))?;
    Ok(buf)
}

fn text(s: &str) -> CborValue {
    CborValue::Text(s.to_string())
}

fn wrapper(key: &str, value: CborValue) -> CborValue {
    CborValue::Map(vec![(text(key), value)])
}

fn document_to_cbor(doc: &Document) -> CborValue {
    CborValue::Map(doc.iter().map(|(k, v)| (text(k), value_to_cbor(v))).collect())
}

fn value_to_cbor(value: &Value) -> CborValue {
    match value {
        Value::Null => CborValue::Null,
        Value::Bool(b) => CborValue::Bool(*b),
        Value::Integer(n) => integer_to_cbor(n),
        Value::Float(f) => CborValue::Float(*f),
        Value::String(s) => text(s),
        Value::Document(doc) => document_to_cbor(doc),
        Value::List(items) => CborValue::Array(items.iter().map(value_to_cbor).collect()),
        Value::Date(ms) => {
            let epoch = if ms % 1000 == 0 {
                CborValue::Integer(Integer::from(ms / 1000))
            } else {
                CborValue::Float(*ms as f64 / 1000.0)
            };
            CborValue::Tag(TAG_EPOCH, Box::new(epoch))
        }
        Value::Regex { pattern, flags } => {
            CborValue::Tag(TAG_REGEX, Box::new(text(&format!("/{}/{}", pattern, flags))))
        }
        Value::ObjectId(hex) => wrapper("$oid", text(hex)),
        Value::BinData(payload) => wrapper("$binary", text(payload)),
        Value::Timestamp(ts) => wrapper("$timestamp", text(ts.payload())),
        Value::NumberLong(payload) => wrapper("$numberLong", text(payload)),
        Value::MinKey => wrapper("$minKey", CborValue::Integer(Integer::from(1))),
        Value::MaxKey => wrapper("$maxKey", CborValue::Integer(Integer::from(1))),
        Value::Undefined => wrapper("$undefined", CborValue::Bool(true)),
    }
}

/// Native integer when it fits, otherwise a bignum.
///
/// CBOR bignums carry the magnitude for tag 2 and `-1 - n` for tag 3.
fn integer_to_cbor(n: &BigInt) -> CborValue {
    if let Some(native) = i128::try_from(n)
        .ok()
        .and_then(|i| Integer::try_from(i).ok())
    {
        return CborValue::Integer(native);
    }
    match n.sign() {
        Sign::Minus => {
            let (_, magnitude) = (-n - BigInt::from(1)).to_bytes_be();
            CborValue::Tag(TAG_NEG_BIGNUM, Box::new(CborValue::Bytes(magnitude)))
        }
        _ => {
            let (_, magnitude) = n.to_bytes_be();
            CborValue::Tag(TAG_POS_BIGNUM, Box::new(CborValue::Bytes(magnitude)))
        }
    }
}
