//! Log value representation.
//!
//! Values mirror what the server prints inside log lines: plain JSON-like
//! scalars and containers plus the extended type literals (`ObjectId(...)`,
//! `BinData(...)`, `Timestamp(...)` and friends). Extended literals keep their
//! payload text exactly as it appeared so they can be rendered back unchanged.

use num_bigint::BigInt;
use num_traits::ToPrimitive;
use std::fmt;

/// A value found in a log line.
#[derive(Clone, PartialEq)]
pub enum Value {
    /// `null`.
    Null,
    /// `true` or `false`.
    Bool(bool),
    /// Arbitrary-precision integer.
    Integer(BigInt),
    /// 64-bit floating-point number.
    Float(f64),
    /// Quoted string, escapes decoded.
    String(String),
    /// Document with keys in source order.
    Document(Document),
    /// List of values.
    List(Vec<Value>),
    /// `ObjectId('...')`, hex payload.
    ObjectId(String),
    /// `new Date(...)`, milliseconds since the epoch.
    Date(i64),
    /// `BinData(...)`, raw text between the parentheses.
    BinData(String),
    /// `Timestamp(...)` or `Timestamp a|b`.
    Timestamp(Timestamp),
    /// `NumberLong(...)`, raw text between the parentheses.
    NumberLong(String),
    /// `/pattern/flags`.
    Regex { pattern: String, flags: String },
    MinKey,
    MaxKey,
    Undefined,
}

/// The two printed forms of a replication timestamp.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Timestamp {
    /// `Timestamp(1412180887, 1)`; holds `1412180887, 1`.
    Paren(String),
    /// `Timestamp 1412180887000|1`; holds `1412180887000|1`.
    Pipe(String),
}

impl Timestamp {
    /// The payload text, whichever form it was written in.
    pub fn payload(&self) -> &str {
        match self {
            Timestamp::Paren(p) | Timestamp::Pipe(p) => p,
        }
    }
}

impl Value {
    /// Returns `true` if this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns the boolean value if this is a `Bool`.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns a reference to the integer if this is an `Integer`.
    pub fn as_integer(&self) -> Option<&BigInt> {
        match self {
            Value::Integer(n) => Some(n),
            _ => None,
        }
    }

    /// Returns the integer as `i64` if it is an `Integer` that fits.
    pub fn as_i64(&self) -> Option<i64> {
        self.as_integer().and_then(|n| n.to_i64())
    }

    /// Returns the float value if this is a `Float`.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Returns a reference to the string if this is a `String`.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns a reference to the document if this is a `Document`.
    pub fn as_document(&self) -> Option<&Document> {
        match self {
            Value::Document(doc) => Some(doc),
            _ => None,
        }
    }

    /// Returns a reference to the list if this is a `List`.
    pub fn as_list(&self) -> Option<&Vec<Value>> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Integer(n) => write!(f, "{}", n),
            Value::Float(n) => write!(f, "{:?}", n),
            Value::String(s) => write!(f, "{:?}", s),
            Value::Document(doc) => fmt::Debug::fmt(doc, f),
            Value::List(items) => f.debug_list().entries(items).finish(),
            Value::ObjectId(hex) => write!(f, "ObjectId('{}')", hex),
            Value::Date(ms) => write!(f, "new Date({})", ms),
            Value::BinData(raw) => write!(f, "BinData({})", raw),
            Value::Timestamp(Timestamp::Paren(raw)) => write!(f, "Timestamp({})", raw),
            Value::Timestamp(Timestamp::Pipe(raw)) => write!(f, "Timestamp {}", raw),
            Value::NumberLong(raw) => write!(f, "NumberLong({})", raw),
            Value::Regex { pattern, flags } => write!(f, "/{}/{}", pattern, flags),
            Value::MinKey => write!(f, "MinKey"),
            Value::MaxKey => write!(f, "MaxKey"),
            Value::Undefined => write!(f, "undefined"),
        }
    }
}

/// An ordered sequence of key/value pairs.
///
/// Keys may repeat. Insertion order is the order the pairs were read from the
/// source, and every accessor that walks the document preserves it.
#[derive(Clone, Default, PartialEq)]
pub struct Document {
    entries: Vec<(String, Value)>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a pair after all existing entries.
    pub fn push(&mut self, key: impl Into<String>, value: Value) {
        self.entries.push((key.into(), value));
    }

    /// First value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Every value stored under `key`, in source order.
    pub fn get_all<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a Value> + 'a {
        self.entries
            .iter()
            .filter(move |(k, _)| k == key)
            .map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn truncate(&mut self, len: usize) {
        self.entries.truncate(len);
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.entries.iter().map(|(k, v)| (k, v)))
            .finish()
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Document {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

impl IntoIterator for Document {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<BigInt> for Value {
    fn from(n: BigInt) -> Self {
        Value::Integer(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Integer(BigInt::from(n))
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(BigInt::from(n))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

impl From<Document> for Value {
    fn from(doc: Document) -> Self {
        Value::Document(doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_keeps_duplicates_in_order() {
        let mut doc = Document::new();
        doc.push("a", Value::from(1));
        doc.push("b", Value::from(2));
        doc.push("a", Value::from(3));

        assert_eq!(doc.keys().collect::<Vec<_>>(), vec!["a", "b", "a"]);
        assert_eq!(doc.get("a"), Some(&Value::from(1)));
        assert_eq!(
            doc.get_all("a").cloned().collect::<Vec<_>>(),
            vec![Value::from(1), Value::from(3)]
        );
    }

    #[test]
    fn test_as_i64_out_of_range() {
        let big: BigInt = "123456789012345678901234567890".parse().unwrap();
        assert_eq!(Value::Integer(big).as_i64(), None);
        assert_eq!(Value::from(-7).as_i64(), Some(-7));
    }

    #[test]
    fn test_debug_uses_log_literals() {
        let doc: Document = vec![
            ("_id", Value::ObjectId("5f1d".into())),
            ("ts", Value::Timestamp(Timestamp::Pipe("1|2".into()))),
        ]
        .into_iter()
        .collect();
        assert_eq!(
            format!("{:?}", Value::Document(doc)),
            "{\"_id\": ObjectId('5f1d'), \"ts\": Timestamp 1|2}"
        );
    }
}
