//! Parser for database server log lines.
//!
//! Turns one line of server log output, in any of the historical line
//! formats, into a [`LogLine`]: the envelope fields (timestamp, severity,
//! component, thread context, operation, namespace), every `name: value`
//! field in source order, lock statistics, plan summary, exception text and
//! duration. Nested values use the server's extended literal syntax
//! (`ObjectId(...)`, `Timestamp 1|2`, `/re/i`, ...) and keep their payload
//! text exactly as printed.
//!
//! # Parsing Pipeline
//!
//! A single left-to-right pass with backtracking:
//!
//! 1. **Envelope**: fixed stages read the line header; a required stage that
//!    does not match fails the line with [`ParseError::GrammarMismatch`].
//!
//! 2. **Fields**: each `name: value` field is read with the value grammar.
//!    A document the server truncated or printed malformed is kept verbatim,
//!    through its closing brace and up to the next recovery anchor, instead
//!    of failing the line.
//!
//! 3. **Builder**: every matched value is handed to a stack machine that
//!    assembles the ordered result; backtracking rolls it back together with
//!    the cursor.
//!
//! Parsing holds no global state, so lines may be parsed on any number of
//! threads at once.

mod builder;
mod context;
mod decode;
mod document;
mod encode;
mod error;
mod lexical;
mod line;
mod logline;
mod parser;
mod recover;
mod value;

pub use builder::InvariantViolation;
pub use context::{ParseContext, RECOVERY_ANCHORS};
pub use decode::DecodeError;
pub use encode::{encode, encode_line, Format};
pub use error::{ParseError, Result, Stage};
pub use logline::{field, LogLine};
pub use value::{Document, Timestamp, Value};

/// Parse one log line.
///
/// # Example
///
/// ```
/// use libmlog::parse;
///
/// let line = parse("Wed Oct 30 15:34:23.128 [conn1] query test.foo 12ms").unwrap();
/// assert_eq!(line.ns(), Some("test.foo"));
/// assert_eq!(line.duration_ms(), Some(12));
/// ```
pub fn parse(line: &str) -> Result<LogLine> {
    parse_with_context(line, &ParseContext::default())
}

/// Parse one log line with a context for error locations and options.
///
/// A single trailing `\n` or `\r\n` is ignored; any other line break fails.
pub fn parse_with_context(line: &str, ctx: &ParseContext) -> Result<LogLine> {
    let line = strip_line_ending(line);
    if let Some(column) = line.find(|c| c == '\n' || c == '\r') {
        return Err(ParseError::embedded_newline(column, ctx));
    }

    let mut parser = parser::Parser::new(line, ctx);
    parser.line()?;
    Ok(parser.finish()?)
}

fn strip_line_ending(line: &str) -> &str {
    match line.strip_suffix('\n') {
        Some(line) => line.strip_suffix('\r').unwrap_or(line),
        None => line,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(pairs: Vec<(&str, Value)>) -> Value {
        Value::Document(pairs.into_iter().collect::<Document>())
    }

    fn names(line: &LogLine) -> Vec<&str> {
        line.iter().map(|(name, _)| name).collect()
    }

    #[test]
    fn test_legacy_query_line() {
        let line = parse(
            "Wed Oct 30 15:34:23.128 [conn1] query test.foo query: { a: 1 } ntoreturn:0 123ms",
        )
        .unwrap();
        assert_eq!(line.timestamp(), Some("Wed Oct 30 15:34:23.128"));
        assert_eq!(line.context(), Some("conn1"));
        assert_eq!(line.op(), Some("query"));
        assert_eq!(line.ns(), Some("test.foo"));
        assert_eq!(line.get("query"), Some(&doc(vec![("a", Value::from(1))])));
        assert_eq!(line.get("ntoreturn"), Some(&Value::from(0)));
        assert_eq!(line.duration_ms(), Some(123));
        assert_eq!(line.severity(), None);
        assert_eq!(line.extra(), None);
        assert_eq!(
            names(&line),
            ["timestamp", "context", "op", "ns", "query", "ntoreturn", "duration_ms"]
        );
    }

    #[test]
    fn test_iso_line_with_severity_and_component() {
        let line = parse(
            "2015-01-02T15:34:23.128+0000 I QUERY    [conn1] query test.foo query: { a: 1 } \
             planSummary: IXSCAN { a: 1 }, COLLSCAN ntoreturn:0 nscanned:3 7ms",
        )
        .unwrap();
        assert_eq!(line.timestamp(), Some("2015-01-02T15:34:23.128+0000"));
        assert_eq!(line.severity(), Some("I"));
        assert_eq!(line.component(), Some("QUERY"));
        assert_eq!(line.context(), Some("conn1"));
        assert_eq!(
            line.get(field::PLAN_SUMMARY),
            Some(&Value::List(vec![
                doc(vec![("IXSCAN", doc(vec![("a", Value::from(1))]))]),
                doc(vec![("COLLSCAN", Value::from(1))]),
            ]))
        );
        assert_eq!(line.get("nscanned"), Some(&Value::from(3)));
        assert_eq!(line.duration_ms(), Some(7));
    }

    #[test]
    fn test_truncated_document_recovers() {
        let line = parse(
            "Wed Oct 30 15:34:23.128 [conn1] insert test.foo query: { a: 1, b: 2 ninserted:5 9ms",
        )
        .unwrap();
        assert_eq!(line.get("query"), Some(&Value::from("{ a: 1, b: 2 ")));
        assert_eq!(line.get("ninserted"), Some(&Value::from(5)));
        assert_eq!(line.duration_ms(), Some(9));
    }

    #[test]
    fn test_malformed_closed_document_recovers_through_brace() {
        let line = parse(
            "Wed Oct 30 15:34:23.128 [conn1] query test.foo \
             query: { a: ISODate(\"x\"), ntoreturn: 5 } ntoreturn:0 nscanned:1 5ms",
        )
        .unwrap();
        assert_eq!(
            line.get("query"),
            Some(&Value::from("{ a: ISODate(\"x\"), ntoreturn: 5 } "))
        );
        assert_eq!(line.get("ntoreturn"), Some(&Value::from(0)));
        assert_eq!(line.get("nscanned"), Some(&Value::from(1)));
        assert_eq!(line.get(field::EXTRA), None);
        assert_eq!(line.duration_ms(), Some(5));
    }

    #[test]
    fn test_locks_and_repeated_fields() {
        let line = parse(
            "Wed Oct 30 15:34:23.128 [conn4] update test.foo query: { _id: 1 } nupdated:1 \
             keyUpdates:0 locks(micros) w:105 r:7 nupdated:2 11ms",
        )
        .unwrap();
        assert_eq!(
            names(&line),
            [
                "timestamp", "context", "op", "ns", "query", "nupdated", "keyUpdates", "w", "r",
                "nupdated", "duration_ms"
            ]
        );
        assert_eq!(line.get("w"), Some(&Value::from(105)));
        let nupdated: Vec<&Value> = line.get_all("nupdated").collect();
        assert_eq!(nupdated, [&Value::from(1), &Value::from(2)]);
    }

    #[test]
    fn test_command_and_exception() {
        let line = parse(
            "2014-10-31T13:00:04.123-0400 I COMMAND  [conn9] command admin.$cmd \
             command: isMaster { isMaster: 1 } ntoreturn:1 keyUpdates:0 reslen:178 0ms",
        )
        .unwrap();
        assert_eq!(
            names(&line)[6..],
            [
                "command_type", "command", "ntoreturn", "keyUpdates", "reslen", "duration_ms"
            ][..]
        );
        assert_eq!(line.get(field::COMMAND_TYPE), Some(&Value::from("isMaster")));
        assert_eq!(line.duration_ms(), Some(0));

        let line = parse(
            "Wed Oct 30 15:34:23.128 [conn2] query test.foo query: { a: 1 } \
             exception:  bad hint  code:10113 5ms",
        )
        .unwrap();
        assert_eq!(line.get(field::EXCEPTION), Some(&Value::from("bad hint")));
        assert_eq!(line.get("code"), Some(&Value::from(10113)));
    }

    #[test]
    fn test_trailing_text_goes_to_extra() {
        let line = parse(
            "2015-01-02T15:34:23.128+0000 I NETWORK  [initandlisten] connection accepted \
             from 127.0.0.1:51234 #1 (1 connection now open)",
        )
        .unwrap();
        assert_eq!(line.op(), Some("connection"));
        assert_eq!(line.ns(), Some("accepted"));
        assert_eq!(
            line.extra(),
            Some("from 127.0.0.1:51234 #1 (1 connection now open)")
        );
    }

    #[test]
    fn test_warning_marker() {
        let line = parse(
            "Wed Oct 30 15:34:23.128 [conn1] warning: log line attempted (16k) over max \
             size (10k), printing beginning and end ... query test.foo 3ms",
        )
        .unwrap();
        assert_eq!(
            line.warning(),
            Some(
                "warning: log line attempted (16k) over max size (10k), \
                 printing beginning and end ..."
            )
        );
        assert_eq!(line.op(), Some("query"));
    }

    #[test]
    fn test_metadata_field() {
        let ctx = ParseContext::default().with_metadata_field("host");
        let line =
            parse_with_context("db1  Wed Oct 30 15:34:23.128 [conn1] query test.foo", &ctx)
                .unwrap();
        assert_eq!(line.get("host"), Some(&Value::from("db1")));
        assert_eq!(names(&line)[..2], ["host", "timestamp"][..]);

        let line =
            parse_with_context("Wed Oct 30 15:34:23.128 [conn1] query test.foo", &ctx).unwrap();
        assert_eq!(line.get("host"), None);
    }

    #[test]
    fn test_required_stages() {
        let err = parse("not a log line").unwrap_err();
        assert_eq!(err.stage(), Some(Stage::Timestamp));
        assert_eq!(err.to_string(), "Expected timestamp at column 1");

        let err = parse("Wed Oct 30 15:34:23.128 conn1 query test.foo").unwrap_err();
        assert_eq!(err.stage(), Some(Stage::Context));
        assert_eq!(err.column(), Some(24));

        let err = parse("Wed Oct 30 15:34:23.128 [conn1] Query test.foo").unwrap_err();
        assert_eq!(err.stage(), Some(Stage::Operation));

        let err = parse("Wed Oct 30 15:34:23.128 [conn1] query test/foo").unwrap_err();
        assert_eq!(err.stage(), Some(Stage::Namespace));
    }

    #[test]
    fn test_line_endings() {
        let line = parse("Wed Oct 30 15:34:23.128 [conn1] query test.foo 1ms\r\n").unwrap();
        assert_eq!(line.duration_ms(), Some(1));

        let ctx = ParseContext::new(Some("mongod.log")).with_line(4);
        let err = parse_with_context("Wed Oct 30 15:34:23.128 [conn1]\nquery", &ctx).unwrap_err();
        assert_eq!(err.to_string(), "Unexpected line break at 5:32 of <mongod.log>");
    }

    #[test]
    fn test_empty_namespace() {
        let line = parse("Wed Oct 30 15:34:23.128 [conn1] getmore  cursorid:12 2ms").unwrap();
        assert_eq!(line.ns(), Some(""));
        assert_eq!(line.get("cursorid"), Some(&Value::from(12)));
    }
}
