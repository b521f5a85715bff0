//! Render parsed values and lines.
//!
//! Two renderings live here: the log literal syntax the server itself
//! prints, and indented relaxed extended JSON. YAML and CBOR are produced by
//! the CLI tool (binmlog) with dedicated libraries.

use crate::logline::LogLine;
use crate::value::{Document, Timestamp, Value};

/// Output format for encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Log literal syntax on one line.
    Log,
    /// Relaxed extended JSON, indented by two spaces.
    Json,
}

/// Encode a value to a string in the specified format.
pub fn encode(value: &Value, format: Format) -> String {
    match format {
        Format::Log => encode_log(value),
        Format::Json => encode_json(value, 0),
    }
}

/// Encode a whole line in the specified format.
///
/// In log syntax a line renders as `name: value` pairs separated by single
/// spaces; in JSON it renders as one object with the fields in line order.
pub fn encode_line(line: &LogLine, format: Format) -> String {
    match format {
        Format::Log => line
            .iter()
            .map(|(name, value)| format!("{}: {}", name, encode_log(value)))
            .collect::<Vec<_>>()
            .join(" "),
        Format::Json => encode_json_document(line.fields(), 0),
    }
}

// =============================================================================
// Log Encoder
// =============================================================================

fn encode_log(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(true) => "true".to_string(),
        Value::Bool(false) => "false".to_string(),
        Value::Integer(n) => n.to_string(),
        Value::Float(f) => encode_float(*f),
        Value::String(s) => encode_json_string(s),
        Value::Document(doc) => {
            if doc.is_empty() {
                "{}".to_string()
            } else {
                let items: Vec<String> = doc
                    .iter()
                    .map(|(k, v)| format!("{}: {}", encode_log_key(k), encode_log(v)))
                    .collect();
                format!("{{ {} }}", items.join(", "))
            }
        }
        Value::List(items) => {
            if items.is_empty() {
                "[]".to_string()
            } else {
                let items: Vec<String> = items.iter().map(encode_log).collect();
                format!("[ {} ]", items.join(", "))
            }
        }
        Value::ObjectId(hex) => format!("ObjectId('{}')", hex),
        Value::Date(ms) => format!("new Date({})", ms),
        Value::BinData(payload) => format!("BinData({})", payload),
        Value::Timestamp(Timestamp::Paren(payload)) => format!("Timestamp({})", payload),
        Value::Timestamp(Timestamp::Pipe(payload)) => format!("Timestamp {}", payload),
        Value::NumberLong(payload) => format!("NumberLong({})", payload),
        Value::Regex { pattern, flags } => format!("/{}/{}", pattern, flags),
        Value::MinKey => "MinKey".to_string(),
        Value::MaxKey => "MaxKey".to_string(),
        Value::Undefined => "undefined".to_string(),
    }
}

/// Keys print bare when the document grammar can read them back bare.
fn encode_log_key(key: &str) -> String {
    if key
        .bytes()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, b'_' | b'$' | b'.'))
    {
        key.to_string()
    } else {
        encode_json_string(key)
    }
}

/// Floats always keep a fractional part so they read back as floats.
fn encode_float(f: f64) -> String {
    if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e16 {
        format!("{:.1}", f)
    } else {
        format!("{}", f)
    }
}

// =============================================================================
// JSON Encoder
// =============================================================================

fn encode_json(value: &Value, indent: usize) -> String {
    let pad = "  ".repeat(indent);
    let pad1 = "  ".repeat(indent + 1);

    match value {
        Value::Null => "null".to_string(),
        Value::Bool(true) => "true".to_string(),
        Value::Bool(false) => "false".to_string(),
        Value::Integer(n) => n.to_string(),
        Value::Float(f) => {
            if f.is_nan() || f.is_infinite() {
                "null".to_string() // JSON doesn't support NaN/Infinity
            } else {
                encode_float(*f)
            }
        }
        Value::String(s) => encode_json_string(s),
        Value::Document(doc) => encode_json_document(doc, indent),
        Value::List(items) => {
            if items.is_empty() {
                "[]".to_string()
            } else {
                let items: Vec<String> = items.iter().map(|v| encode_json(v, indent + 1)).collect();
                format!(
                    "[\n{}\n{}]",
                    items
                        .iter()
                        .map(|i| format!("{}{}", pad1, i))
                        .collect::<Vec<_>>()
                        .join(",\n"),
                    pad
                )
            }
        }
        Value::ObjectId(hex) => wrapper("$oid", encode_json_string(hex)),
        Value::Date(ms) => wrapper("$date", ms.to_string()),
        Value::BinData(payload) => wrapper("$binary", encode_json_string(payload)),
        Value::Timestamp(ts) => wrapper("$timestamp", encode_json_string(ts.payload())),
        Value::NumberLong(payload) => wrapper("$numberLong", encode_json_string(payload)),
        Value::Regex { pattern, flags } => format!(
            "{{\"$regex\": {}, \"$options\": {}}}",
            encode_json_string(pattern),
            encode_json_string(flags)
        ),
        Value::MinKey => wrapper("$minKey", "1".to_string()),
        Value::MaxKey => wrapper("$maxKey", "1".to_string()),
        Value::Undefined => wrapper("$undefined", "true".to_string()),
    }
}

/// Extended type wrappers stay on one line.
fn wrapper(tag: &str, payload: String) -> String {
    format!("{{\"{}\": {}}}", tag, payload)
}

/// Keys are emitted in document order, repeats included.
fn encode_json_document(doc: &Document, indent: usize) -> String {
    if doc.is_empty() {
        return "{}".to_string();
    }
    let pad = "  ".repeat(indent);
    let pad1 = "  ".repeat(indent + 1);
    let items: Vec<String> = doc
        .iter()
        .map(|(k, v)| format!("{}: {}", encode_json_string(k), encode_json(v, indent + 1)))
        .collect();
    format!(
        "{{\n{}\n{}}}",
        items
            .iter()
            .map(|i| format!("{}{}", pad1, i))
            .collect::<Vec<_>>()
            .join(",\n"),
        pad
    )
}

fn encode_json_string(s: &str) -> String {
    let mut result = String::from("\"");
    for c in s.chars() {
        match c {
            '"' => result.push_str("\\\""),
            '\\' => result.push_str("\\\\"),
            '\n' => result.push_str("\\n"),
            '\r' => result.push_str("\\r"),
            '\t' => result.push_str("\\t"),
            '\x08' => result.push_str("\\b"),
            '\x0c' => result.push_str("\\f"),
            c if c.is_control() => {
                result.push_str(&format!("\\u{:04x}", c as u32));
            }
            c => result.push(c),
        }
    }
    result.push('"');
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(pairs: Vec<(&str, Value)>) -> Value {
        Value::Document(pairs.into_iter().collect::<Document>())
    }

    #[test]
    fn test_encode_log_document() {
        let v = doc(vec![
            ("a", Value::from(1)),
            ("b c", Value::List(vec![Value::from("x"), Value::Float(2.0)])),
            ("_id", Value::ObjectId("5271a53f2f8f5e8b1a000001".into())),
        ]);
        assert_eq!(
            encode(&v, Format::Log),
            "{ a: 1, \"b c\": [ \"x\", 2.0 ], _id: ObjectId('5271a53f2f8f5e8b1a000001') }"
        );
    }

    #[test]
    fn test_encode_log_extended() {
        assert_eq!(encode(&Value::Date(-5), Format::Log), "new Date(-5)");
        assert_eq!(
            encode(&Value::Timestamp(Timestamp::Pipe("1|2".into())), Format::Log),
            "Timestamp 1|2"
        );
        assert_eq!(
            encode(
                &Value::Regex {
                    pattern: "^a".into(),
                    flags: "im".into()
                },
                Format::Log
            ),
            "/^a/im"
        );
        assert_eq!(encode(&doc(vec![]), Format::Log), "{}");
    }

    #[test]
    fn test_parsed_literals_render_back_exactly() {
        let query = "{ a: ObjectId('ab12'), b: BinData(3, 0A0B), c: NumberLong(12), \
                     d: Timestamp 1|2, e: Timestamp(3, 4) }";
        let line = crate::parse(&format!(
            "Wed Oct 30 15:34:23.128 [conn1] query test.foo query: {} 1ms",
            query
        ))
        .unwrap();
        let value = line.get("query").unwrap();
        assert!(value.as_document().is_some());
        assert_eq!(encode(value, Format::Log), query);
    }

    #[test]
    fn test_encode_json_nested() {
        let v = doc(vec![
            ("a", Value::from(1)),
            ("a", doc(vec![("$gt", Value::Float(1.5))])),
            ("l", Value::List(vec![Value::Null, Value::Bool(true)])),
        ]);
        assert_eq!(
            encode(&v, Format::Json),
            "{\n  \"a\": 1,\n  \"a\": {\n    \"$gt\": 1.5\n  },\n  \"l\": [\n    null,\n    true\n  ]\n}"
        );
    }

    #[test]
    fn test_encode_json_extended() {
        assert_eq!(
            encode(&Value::ObjectId("ab".into()), Format::Json),
            "{\"$oid\": \"ab\"}"
        );
        assert_eq!(encode(&Value::Date(12), Format::Json), "{\"$date\": 12}");
        assert_eq!(
            encode(&Value::NumberLong("7".into()), Format::Json),
            "{\"$numberLong\": \"7\"}"
        );
        assert_eq!(encode(&Value::MinKey, Format::Json), "{\"$minKey\": 1}");
        assert_eq!(
            encode(&Value::Undefined, Format::Json),
            "{\"$undefined\": true}"
        );
    }

    #[test]
    fn test_encode_json_string_escapes() {
        assert_eq!(
            encode(&Value::from("a\"b\\c\n\u{1}"), Format::Json),
            "\"a\\\"b\\\\c\\n\\u0001\""
        );
    }
}
