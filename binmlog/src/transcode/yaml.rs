//! YAML transcoding: render parsed log lines as YAML documents.
//!
//! Mapping from log values to YAML:
//!   - Value::Null         -> YAML null
//!   - Value::Bool         -> YAML bool
//!   - Value::Integer      -> YAML integer (as string if beyond i64/u64)
//!   - Value::Float        -> YAML float
//!   - Value::String       -> YAML string
//!   - Value::List         -> YAML sequence
//!   - Value::Document     -> YAML mapping
//!   - Value::ObjectId     -> `!oid <hex>`
//!   - Value::Date         -> `!date <epoch millis>`
//!   - Value::BinData      -> `!binData <payload>`
//!   - Value::Timestamp    -> `!timestamp <payload>`
//!   - Value::NumberLong   -> `!numberLong <payload>`
//!   - Value::Regex        -> `!regex /<pattern>/<flags>`
//!   - Value::MinKey       -> `!minKey null`
//!   - Value::MaxKey       -> `!maxKey null`
//!   - Value::Undefined    -> `!undefined null`
//!
//! YAML mappings cannot repeat a key. When a document or line repeats one,
//! all of its values are gathered into a sequence at the position of the
//! first occurrence.

use libmlog::{Document, LogLine, Value};
use num_traits::ToPrimitive;
use std::collections::HashSet;

/// Encode a parsed line as a YAML string.
pub fn encode(line: &LogLine) -> Result<String, String> {
    let yaml_value = document_to_yaml(line.fields())?;
    serde_yaml::to_string(&yaml_value).map_err(|e| format!("YAML encode error: {}", e))
}

fn tagged(tag: &str, value: serde_yaml::Value) -> serde_yaml::Value {
    serde_yaml::Value::Tagged(Box::new(serde_yaml::value::TaggedValue {
        tag: serde_yaml::value::Tag::new(tag),
        value,
    }))
}

fn tagged_str(tag: &str, s: &str) -> serde_yaml::Value {
    tagged(tag, serde_yaml::Value::String(s.to_string()))
}

fn document_to_yaml(doc: &Document) -> Result<serde_yaml::Value, String> {
    let mut map = serde_yaml::Mapping::new();
    let mut gathered: HashSet<&str> = HashSet::new();
    for (k, v) in doc.iter() {
        let key = serde_yaml::Value::String(k.to_string());
        let value = value_to_yaml(v)?;
        match map.get_mut(&key) {
            None => {
                map.insert(key, value);
            }
            Some(serde_yaml::Value::Sequence(seq)) if gathered.contains(k) => seq.push(value),
            Some(existing) => {
                let first = std::mem::replace(existing, serde_yaml::Value::Null);
                *existing = serde_yaml::Value::Sequence(vec![first, value]);
                gathered.insert(k);
            }
        }
    }
    Ok(serde_yaml::Value::Mapping(map))
}

fn value_to_yaml(value: &Value) -> Result<serde_yaml::Value, String> {
    match value {
        Value::Null => Ok(serde_yaml::Value::Null),
        Value::Bool(b) => Ok(serde_yaml::Value::Bool(*b)),
        Value::Integer(n) => {
            // Try to fit in i64 first, then u64
            if let Some(i) = n.to_i64() {
                Ok(serde_yaml::Value::Number(serde_yaml::Number::from(i)))
            } else if let Some(u) = n.to_u64() {
                Ok(serde_yaml::Value::Number(serde_yaml::Number::from(u)))
            } else {
                // YAML doesn't have native arbitrary-precision integers
                Ok(serde_yaml::Value::String(n.to_string()))
            }
        }
        Value::Float(f) => Ok(serde_yaml::Value::Number(serde_yaml::Number::from(*f))),
        Value::String(s) => Ok(serde_yaml::Value::String(s.clone())),
        Value::Document(doc) => document_to_yaml(doc),
        Value::List(items) => {
            let items: Result<Vec<serde_yaml::Value>, String> =
                items.iter().map(value_to_yaml).collect();
            Ok(serde_yaml::Value::Sequence(items?))
        }
        Value::ObjectId(hex) => Ok(tagged_str("!oid", hex)),
        Value::Date(ms) => Ok(tagged(
            "!date",
            serde_yaml::Value::Number(serde_yaml::Number::from(*ms)),
        )),
        Value::BinData(payload) => Ok(tagged_str("!binData", payload)),
        Value::Timestamp(ts) => Ok(tagged_str("!timestamp", ts.payload())),
        Value::NumberLong(payload) => Ok(tagged_str("!numberLong", payload)),
        Value::Regex { pattern, flags } => {
            Ok(tagged_str("!regex", &format!("/{}/{}", pattern, flags)))
        }
        Value::MinKey => Ok(tagged("!minKey", serde_yaml::Value::Null)),
        Value::MaxKey => Ok(tagged("!maxKey", serde_yaml::Value::Null)),
        Value::Undefined => Ok(tagged("!undefined", serde_yaml::Value::Null)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_line() {
        let line = libmlog::parse(
            "Wed Oct 30 15:34:23.128 [conn1] query test.foo query: { a: 1, b: [ true ] } 12ms",
        )
        .unwrap();
        let yaml = encode(&line).unwrap();
        let reparsed: serde_yaml::Value = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(reparsed["op"], serde_yaml::Value::String("query".into()));
        assert_eq!(reparsed["query"]["a"], serde_yaml::Value::from(1));
        assert_eq!(reparsed["query"]["b"][0], serde_yaml::Value::Bool(true));
        assert_eq!(reparsed["duration_ms"], serde_yaml::Value::from(12));
    }

    #[test]
    fn test_repeated_keys_gather() {
        let doc: Document = vec![
            ("n", Value::from(1)),
            ("m", Value::from(2)),
            ("n", Value::from(3)),
            ("n", Value::from(4)),
        ]
        .into_iter()
        .collect();
        let yaml = document_to_yaml(&doc).unwrap();
        let map = yaml.as_mapping().unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(
            yaml["n"],
            serde_yaml::Value::Sequence(vec![1.into(), 3.into(), 4.into()])
        );
        let keys: Vec<&str> = map.keys().filter_map(|k| k.as_str()).collect();
        assert_eq!(keys, ["n", "m"]);
    }

    #[test]
    fn test_extended_types_are_tagged() {
        let yaml = value_to_yaml(&Value::ObjectId("abc123".into())).unwrap();
        match yaml {
            serde_yaml::Value::Tagged(tagged) => {
                assert_eq!(tagged.tag, serde_yaml::value::Tag::new("oid"));
                assert_eq!(tagged.value, serde_yaml::Value::String("abc123".into()));
            }
            other => panic!("expected tagged value, got {:?}", other),
        }
    }
}
