//! Type-literal decoders.
//!
//! Each decoder takes the exact text the grammar matched for one literal and
//! turns it into a [`Value`]. Decoders check only the syntactic shape of the
//! literal; payloads of `BinData`, `NumberLong` and `Timestamp` are opaque and
//! kept verbatim.

use crate::lexical::is_digit;
use crate::value::{Timestamp, Value};
use num_bigint::BigInt;
use thiserror::Error;

/// Reasons a matched literal could not be decoded.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Invalid number \"{0}\"")]
    InvalidNumber(String),

    #[error("Invalid date \"{0}\"")]
    InvalidDate(String),

    #[error("Malformed {kind} literal \"{raw}\"")]
    Malformed { kind: &'static str, raw: String },

    #[error("Unknown keyword \"{0}\"")]
    UnknownKeyword(String),

    #[error("Invalid regular expression flag '{0}'")]
    InvalidRegexFlag(char),
}

fn malformed(kind: &'static str, raw: &str) -> DecodeError {
    DecodeError::Malformed {
        kind,
        raw: raw.to_string(),
    }
}

/// Strip `open` and a closing parenthesis from `raw`.
fn parenthesized<'a>(raw: &'a str, open: &str, kind: &'static str) -> Result<&'a str, DecodeError> {
    raw.strip_prefix(open)
        .and_then(|s| s.strip_suffix(')'))
        .ok_or_else(|| malformed(kind, raw))
}

/// `-?digits(.digits)?`. A `.` selects a float, otherwise an integer.
pub fn numeric(raw: &str) -> Result<Value, DecodeError> {
    let invalid = || DecodeError::InvalidNumber(raw.to_string());
    let unsigned = raw.strip_prefix('-').unwrap_or(raw);
    let (whole, fraction) = match unsigned.split_once('.') {
        Some((w, f)) => (w, Some(f)),
        None => (unsigned, None),
    };
    if whole.is_empty() || !whole.bytes().all(is_digit) {
        return Err(invalid());
    }
    match fraction {
        Some(f) => {
            if f.is_empty() || !f.bytes().all(is_digit) {
                return Err(invalid());
            }
            raw.parse::<f64>().map(Value::Float).map_err(|_| invalid())
        }
        None => raw.parse::<BigInt>().map(Value::Integer).map_err(|_| invalid()),
    }
}

/// Epoch milliseconds, either bare or as `new Date(...)`.
pub fn date(raw: &str) -> Result<Value, DecodeError> {
    let payload = match raw.strip_prefix("new Date(") {
        Some(inner) => inner
            .strip_suffix(')')
            .ok_or_else(|| DecodeError::InvalidDate(raw.to_string()))?,
        None => raw,
    };
    let digits = payload.strip_prefix('-').unwrap_or(payload);
    if digits.is_empty() || !digits.bytes().all(is_digit) {
        return Err(DecodeError::InvalidDate(raw.to_string()));
    }
    payload
        .parse::<i64>()
        .map(Value::Date)
        .map_err(|_| DecodeError::InvalidDate(raw.to_string()))
}

/// `ObjectId('hex')` or `ObjectId("hex")`.
pub fn object_id(raw: &str) -> Result<Value, DecodeError> {
    let quoted = parenthesized(raw, "ObjectId(", "ObjectId")?;
    let hex = quoted
        .strip_prefix('\'')
        .and_then(|s| s.strip_suffix('\''))
        .or_else(|| quoted.strip_prefix('"').and_then(|s| s.strip_suffix('"')))
        .ok_or_else(|| malformed("ObjectId", raw))?;
    Ok(Value::ObjectId(hex.to_string()))
}

/// `BinData(...)`.
pub fn bin_data(raw: &str) -> Result<Value, DecodeError> {
    parenthesized(raw, "BinData(", "BinData").map(|p| Value::BinData(p.to_string()))
}

/// `NumberLong(...)`.
pub fn number_long(raw: &str) -> Result<Value, DecodeError> {
    parenthesized(raw, "NumberLong(", "NumberLong").map(|p| Value::NumberLong(p.to_string()))
}

/// `Timestamp(...)` or `Timestamp secs|inc`.
pub fn timestamp(raw: &str) -> Result<Value, DecodeError> {
    if raw.starts_with("Timestamp(") {
        let payload = parenthesized(raw, "Timestamp(", "Timestamp")?;
        return Ok(Value::Timestamp(Timestamp::Paren(payload.to_string())));
    }
    let payload = raw
        .strip_prefix("Timestamp ")
        .ok_or_else(|| malformed("Timestamp", raw))?;
    match payload.split_once('|') {
        Some((secs, inc))
            if !secs.is_empty()
                && !inc.is_empty()
                && secs.bytes().all(is_digit)
                && inc.bytes().all(is_digit) =>
        {
            Ok(Value::Timestamp(Timestamp::Pipe(payload.to_string())))
        }
        _ => Err(malformed("Timestamp", raw)),
    }
}

/// `/pattern/flags` with flags drawn from `gims`.
pub fn regex(raw: &str) -> Result<Value, DecodeError> {
    let body = raw.strip_prefix('/').ok_or_else(|| malformed("regex", raw))?;
    let close = body.rfind('/').ok_or_else(|| malformed("regex", raw))?;
    let (pattern, flags) = (&body[..close], &body[close + 1..]);
    if let Some(bad) = flags.chars().find(|c| !matches!(c, 'g' | 'i' | 'm' | 's')) {
        return Err(DecodeError::InvalidRegexFlag(bad));
    }
    Ok(Value::Regex {
        pattern: pattern.to_string(),
        flags: flags.to_string(),
    })
}

/// Payload-free literals.
pub fn keyword(raw: &str) -> Result<Value, DecodeError> {
    match raw {
        "true" => Ok(Value::Bool(true)),
        "false" => Ok(Value::Bool(false)),
        "null" => Ok(Value::Null),
        "undefined" => Ok(Value::Undefined),
        "MinKey" => Ok(Value::MinKey),
        "MaxKey" => Ok(Value::MaxKey),
        _ => Err(DecodeError::UnknownKeyword(raw.to_string())),
    }
}

/// A single- or double-quoted string, escapes decoded.
///
/// Unknown escapes are kept as written (backslash included); the server does
/// not escape consistently and the text is more useful intact.
pub fn string(raw: &str) -> Result<Value, DecodeError> {
    let quote = match raw.chars().next() {
        Some(q @ ('"' | '\'')) => q,
        _ => return Err(malformed("string", raw)),
    };
    let inner = raw[1..]
        .strip_suffix(quote)
        .ok_or_else(|| malformed("string", raw))?;

    let mut result = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            result.push(c);
            continue;
        }
        match chars.next() {
            Some('"') => result.push('"'),
            Some('\'') => result.push('\''),
            Some('\\') => result.push('\\'),
            Some('/') => result.push('/'),
            Some('n') => result.push('\n'),
            Some('r') => result.push('\r'),
            Some('t') => result.push('\t'),
            Some('b') => result.push('\x08'),
            Some('f') => result.push('\x0c'),
            Some('u') => {
                let hex: String = chars.clone().take(4).collect();
                match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                    Some(decoded) if hex.len() == 4 => {
                        result.push(decoded);
                        for _ in 0..4 {
                            chars.next();
                        }
                    }
                    _ => result.push_str("\\u"),
                }
            }
            Some(other) => {
                result.push('\\');
                result.push(other);
            }
            None => return Err(malformed("string", raw)),
        }
    }
    Ok(Value::String(result))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric() {
        assert_eq!(numeric("-3.14").unwrap(), Value::Float(-3.14));
        assert_eq!(numeric("42").unwrap(), Value::from(42));
        assert_eq!(numeric("007").unwrap(), Value::from(7));
        assert_eq!(numeric("-0").unwrap(), Value::from(0));
        assert_eq!(
            numeric("123456789012345678901234567890").unwrap(),
            Value::Integer("123456789012345678901234567890".parse().unwrap())
        );
    }

    #[test]
    fn test_numeric_needs_digits() {
        assert!(numeric("").is_err());
        assert!(numeric("-").is_err());
        assert!(numeric(".5").is_err());
        assert!(numeric("1.").is_err());
        assert!(numeric("1a").is_err());
    }

    #[test]
    fn test_date() {
        assert_eq!(date("new Date(1383143663128)").unwrap(), Value::Date(1383143663128));
        assert_eq!(date("-86400000").unwrap(), Value::Date(-86400000));
        assert!(date("new Date(abc)").is_err());
        assert!(date("new Date(12").is_err());
        assert!(date("99999999999999999999").is_err());
    }

    #[test]
    fn test_object_id() {
        assert_eq!(
            object_id("ObjectId('5271a53f2f8f5e8b1a000001')").unwrap(),
            Value::ObjectId("5271a53f2f8f5e8b1a000001".into())
        );
        assert_eq!(
            object_id("ObjectId(\"abc\")").unwrap(),
            Value::ObjectId("abc".into())
        );
        assert!(object_id("ObjectId('abc\")").is_err());
        assert!(object_id("ObjectId(abc)").is_err());
    }

    #[test]
    fn test_opaque_payloads_are_verbatim() {
        assert_eq!(
            bin_data("BinData(0, 6162636465)").unwrap(),
            Value::BinData("0, 6162636465".into())
        );
        assert_eq!(
            number_long("NumberLong(\"9007199254740993\")").unwrap(),
            Value::NumberLong("\"9007199254740993\"".into())
        );
        assert_eq!(
            timestamp("Timestamp(1412180887, 1)").unwrap(),
            Value::Timestamp(Timestamp::Paren("1412180887, 1".into()))
        );
        assert_eq!(
            timestamp("Timestamp 1412180887000|1").unwrap(),
            Value::Timestamp(Timestamp::Pipe("1412180887000|1".into()))
        );
        assert!(timestamp("Timestamp 14|").is_err());
    }

    #[test]
    fn test_regex() {
        assert_eq!(
            regex("/^ab\\/c/im").unwrap(),
            Value::Regex {
                pattern: "^ab\\/c".into(),
                flags: "im".into()
            }
        );
        assert_eq!(regex("/x/q"), Err(DecodeError::InvalidRegexFlag('q')));
    }

    #[test]
    fn test_keyword() {
        assert_eq!(keyword("MinKey").unwrap(), Value::MinKey);
        assert_eq!(keyword("undefined").unwrap(), Value::Undefined);
        assert!(keyword("maybe").is_err());
    }

    #[test]
    fn test_string_escapes() {
        assert_eq!(string("\"a\\\"b\"").unwrap(), Value::from("a\"b"));
        assert_eq!(string("'it\\'s'").unwrap(), Value::from("it's"));
        assert_eq!(string("\"\\u0041\\d\"").unwrap(), Value::from("A\\d"));
        assert!(string("\"open").is_err());
    }
}
