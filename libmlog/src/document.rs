//! Value, document and list grammar.
//!
//! `value` tries its alternatives in this fixed order, first match wins:
//! document, list, numeric, boolean, string, null, ObjectId, date, BinData,
//! timestamp, regex, NumberLong, undefined, MinKey, MaxKey.

use crate::decode;
use crate::lexical::{is_digit, is_hex_digit, is_key_char, is_stage_char};
use crate::parser::{Decoder, Parser, Step};
use crate::value::Value;

impl<'a> Parser<'a> {
    pub(crate) fn value(&mut self) -> Step {
        Ok(self.attempt(Self::document)?
            || self.attempt(Self::list)?
            || self.attempt(Self::numeric)?
            || self.attempt(Self::boolean)?
            || self.attempt(Self::string)?
            || self.attempt(Self::null)?
            || self.attempt(Self::object_id)?
            || self.attempt(Self::date)?
            || self.attempt(Self::bin_data)?
            || self.attempt(Self::timestamp_literal)?
            || self.attempt(Self::regex)?
            || self.attempt(Self::number_long)?
            || self.attempt(Self::undefined)?
            || self.attempt(Self::min_key)?
            || self.attempt(Self::max_key)?)
    }

    /// `{ key: value, ... }`, possibly empty.
    pub(crate) fn document(&mut self) -> Step {
        if !self.cur.eat_byte(b'{') {
            return Ok(false);
        }
        self.builder.open_map();
        self.cur.skip_spaces();
        if !self.cur.eat_byte(b'}') {
            loop {
                if !self.pair()? {
                    return Ok(false);
                }
                self.cur.skip_spaces();
                if self.cur.eat_byte(b'}') {
                    break;
                }
                if !self.cur.eat_byte(b',') {
                    return Ok(false);
                }
                self.cur.skip_spaces();
            }
        }
        self.builder.close_map()?;
        Ok(true)
    }

    fn pair(&mut self) -> Step {
        let Some(key) = self.key() else {
            return Ok(false);
        };
        self.cur.skip_spaces();
        if !self.cur.eat_byte(b':') {
            return Ok(false);
        }
        self.cur.skip_spaces();
        self.builder.set_field_name(key)?;
        self.value()
    }

    /// A bare key (possibly empty, as in index bounds `{ : 1 }`) or a
    /// double-quoted one.
    fn key(&mut self) -> Option<String> {
        if self.cur.peek() != Some(b'"') {
            return Some(self.cur.eat_while(is_key_char).to_string());
        }
        let start = self.cur.pos();
        if !self.quoted() {
            return None;
        }
        match decode::string(self.cur.since(start)) {
            Ok(Value::String(key)) => Some(key),
            _ => None,
        }
    }

    /// `[ value, ... ]`, possibly empty.
    fn list(&mut self) -> Step {
        if !self.cur.eat_byte(b'[') {
            return Ok(false);
        }
        self.builder.open_list();
        self.cur.skip_spaces();
        if !self.cur.eat_byte(b']') {
            loop {
                if !self.value()? {
                    return Ok(false);
                }
                self.cur.skip_spaces();
                if self.cur.eat_byte(b']') {
                    break;
                }
                if !self.cur.eat_byte(b',') {
                    return Ok(false);
                }
                self.cur.skip_spaces();
            }
        }
        self.builder.close_list()?;
        Ok(true)
    }

    /// Plan summary body: `STAGE [document], STAGE [document], ...`.
    ///
    /// Built as a list of one-entry documents so stage order survives even
    /// when a stage name repeats. A stage without a document maps to `1`.
    pub(crate) fn ordered_document(&mut self) -> Step {
        self.builder.open_list();
        if !self.plan_stage()? {
            return Ok(false);
        }
        while self.attempt(|p| Ok(p.cur.eat(", ") && p.plan_stage()?))? {}
        self.builder.close_list()?;
        Ok(true)
    }

    fn plan_stage(&mut self) -> Step {
        let stage = self.cur.eat_while(is_stage_char);
        if stage.is_empty() {
            return Ok(false);
        }
        self.builder.open_map();
        self.builder.set_field_name(stage)?;
        if !self.attempt(|p| Ok(p.cur.eat_byte(b' ') && p.document()?))? {
            self.builder.attach_value(Value::from(1))?;
        }
        self.builder.close_map()?;
        Ok(true)
    }

    /// `-?digits(.digits)?`
    pub(crate) fn numeric(&mut self) -> Step {
        let start = self.cur.pos();
        self.cur.eat_byte(b'-');
        if self.cur.eat_while(is_digit).is_empty() {
            return Ok(false);
        }
        let before_fraction = self.cur.pos();
        if self.cur.eat_byte(b'.') && self.cur.eat_while(is_digit).is_empty() {
            self.cur.reset(before_fraction);
        }
        self.emit(start, decode::numeric)
    }

    fn keyword(&mut self, words: &[&str]) -> Step {
        let start = self.cur.pos();
        match words.iter().find(|w| self.cur.eat(w)) {
            Some(_) => self.emit(start, decode::keyword),
            None => Ok(false),
        }
    }

    fn boolean(&mut self) -> Step {
        self.keyword(&["true", "false"])
    }

    fn null(&mut self) -> Step {
        self.keyword(&["null"])
    }

    fn undefined(&mut self) -> Step {
        self.keyword(&["undefined"])
    }

    fn min_key(&mut self) -> Step {
        self.keyword(&["MinKey"])
    }

    fn max_key(&mut self) -> Step {
        self.keyword(&["MaxKey"])
    }

    /// Consume a quoted string, escapes included, without decoding it.
    fn quoted(&mut self) -> bool {
        let quote = match self.cur.peek() {
            Some(q @ (b'"' | b'\'')) => q as char,
            _ => return false,
        };
        self.cur.bump_char();
        loop {
            match self.cur.bump_char() {
                None => return false,
                Some('\\') => {
                    if self.cur.bump_char().is_none() {
                        return false;
                    }
                }
                Some(c) if c == quote => return true,
                Some(_) => {}
            }
        }
    }

    fn string(&mut self) -> Step {
        let start = self.cur.pos();
        if !self.quoted() {
            return Ok(false);
        }
        self.emit(start, decode::string)
    }

    /// `ObjectId('hex')` or `ObjectId("hex")`
    fn object_id(&mut self) -> Step {
        let start = self.cur.pos();
        if !self.cur.eat("ObjectId(") {
            return Ok(false);
        }
        let quote = match self.cur.peek() {
            Some(q @ (b'\'' | b'"')) => q,
            _ => return Ok(false),
        };
        self.cur.eat_byte(quote);
        self.cur.eat_while(is_hex_digit);
        if !(self.cur.eat_byte(quote) && self.cur.eat_byte(b')')) {
            return Ok(false);
        }
        self.emit(start, decode::object_id)
    }

    /// `new Date(-?digits)`
    fn date(&mut self) -> Step {
        let start = self.cur.pos();
        if !self.cur.eat("new Date(") {
            return Ok(false);
        }
        self.cur.eat_byte(b'-');
        if self.cur.eat_while(is_digit).is_empty() || !self.cur.eat_byte(b')') {
            return Ok(false);
        }
        self.emit(start, decode::date)
    }

    /// `<prefix>...)` with an opaque payload.
    fn parenthesized(&mut self, prefix: &str, decode: Decoder) -> Step {
        let start = self.cur.pos();
        if !self.cur.eat(prefix) || self.cur.eat_until(")").is_none() {
            return Ok(false);
        }
        self.cur.eat_byte(b')');
        self.emit(start, decode)
    }

    fn bin_data(&mut self) -> Step {
        self.parenthesized("BinData(", decode::bin_data)
    }

    fn number_long(&mut self) -> Step {
        self.parenthesized("NumberLong(", decode::number_long)
    }

    /// `Timestamp(...)` or `Timestamp secs|inc`
    fn timestamp_literal(&mut self) -> Step {
        if self.cur.starts_with("Timestamp(") {
            return self.parenthesized("Timestamp(", decode::timestamp);
        }
        let start = self.cur.pos();
        if !self.cur.eat("Timestamp ")
            || self.cur.eat_while(is_digit).is_empty()
            || !self.cur.eat_byte(b'|')
            || self.cur.eat_while(is_digit).is_empty()
        {
            return Ok(false);
        }
        self.emit(start, decode::timestamp)
    }

    /// `/pattern/flags`
    fn regex(&mut self) -> Step {
        let start = self.cur.pos();
        if !self.cur.eat_byte(b'/') || self.cur.peek() == Some(b'/') {
            return Ok(false);
        }
        loop {
            match self.cur.bump_char() {
                None => return Ok(false),
                Some('\\') => {
                    if self.cur.bump_char().is_none() {
                        return Ok(false);
                    }
                }
                Some('/') => break,
                Some(_) => {}
            }
        }
        self.cur.eat_while(|c| matches!(c, b'g' | b'i' | b'm' | b's'));
        self.emit(start, decode::regex)
    }
}

#[cfg(test)]
mod tests {
    use crate::context::ParseContext;
    use crate::parser::Parser;
    use crate::value::{Document, Timestamp, Value};

    /// Parse `src` as a single value and return it with the unconsumed rest.
    fn parse_value(src: &str) -> Option<(Value, String)> {
        let ctx = ParseContext::default();
        let mut p = Parser::new(src, &ctx);
        p.builder.start_line_field("v").unwrap();
        if !p.value().unwrap() {
            return None;
        }
        p.builder.end_line_field().unwrap();
        let rest = p.cur.rest().to_string();
        let line = p.finish().unwrap();
        Some((line.get("v").unwrap().clone(), rest))
    }

    fn value(src: &str) -> Value {
        let (v, rest) = parse_value(src).expect("value should parse");
        assert_eq!(rest, "", "unconsumed input for {}", src);
        v
    }

    fn doc(pairs: Vec<(&str, Value)>) -> Value {
        Value::Document(pairs.into_iter().collect::<Document>())
    }

    #[test]
    fn test_scalars() {
        assert_eq!(value("42"), Value::from(42));
        assert_eq!(value("-3.14"), Value::Float(-3.14));
        assert_eq!(value("true"), Value::Bool(true));
        assert_eq!(value("null"), Value::Null);
        assert_eq!(value("\"a b\""), Value::from("a b"));
        assert_eq!(value("'x'"), Value::from("x"));
        assert_eq!(value("undefined"), Value::Undefined);
        assert_eq!(value("MinKey"), Value::MinKey);
        assert_eq!(value("MaxKey"), Value::MaxKey);
    }

    #[test]
    fn test_extended_literals() {
        assert_eq!(
            value("ObjectId('5271a53f2f8f5e8b1a000001')"),
            Value::ObjectId("5271a53f2f8f5e8b1a000001".into())
        );
        assert_eq!(value("new Date(1383143663128)"), Value::Date(1383143663128));
        assert_eq!(value("BinData(3, 0A0B)"), Value::BinData("3, 0A0B".into()));
        assert_eq!(
            value("Timestamp(1412180887, 1)"),
            Value::Timestamp(Timestamp::Paren("1412180887, 1".into()))
        );
        assert_eq!(
            value("Timestamp 1412180887000|1"),
            Value::Timestamp(Timestamp::Pipe("1412180887000|1".into()))
        );
        assert_eq!(value("NumberLong(12)"), Value::NumberLong("12".into()));
        assert_eq!(
            value("/^a.c$/i"),
            Value::Regex {
                pattern: "^a.c$".into(),
                flags: "i".into()
            }
        );
    }

    #[test]
    fn test_object_id_rejects_non_hex() {
        assert!(parse_value("ObjectId('xyz')").is_none());
    }

    #[test]
    fn test_nested_document_preserves_order() {
        let v = value("{ b: 1, a: { c: [ 1, \"x\" ] }, b: 2 }");
        assert_eq!(
            v,
            doc(vec![
                ("b", Value::from(1)),
                (
                    "a",
                    doc(vec![(
                        "c",
                        Value::List(vec![Value::from(1), Value::from("x")])
                    )])
                ),
                ("b", Value::from(2)),
            ])
        );
    }

    #[test]
    fn test_empty_containers_and_keys() {
        assert_eq!(value("{}"), doc(vec![]));
        assert_eq!(value("[]"), Value::List(vec![]));
        assert_eq!(value("{ : 1 }"), doc(vec![("", Value::from(1))]));
        assert_eq!(value("{ \"a b\": 1 }"), doc(vec![("a b", Value::from(1))]));
        assert_eq!(
            value("{ $query: { a.b: { $gt: 5 } } }"),
            doc(vec![(
                "$query",
                doc(vec![("a.b", doc(vec![("$gt", Value::from(5))]))])
            )])
        );
    }

    #[test]
    fn test_value_stops_at_first_match() {
        let (v, rest) = parse_value("12 ntoreturn:0").unwrap();
        assert_eq!(v, Value::from(12));
        assert_eq!(rest, " ntoreturn:0");

        let (v, rest) = parse_value("1.x").unwrap();
        assert_eq!(v, Value::from(1));
        assert_eq!(rest, ".x");
    }

    #[test]
    fn test_unterminated_document_fails_cleanly() {
        assert!(parse_value("{ a: 1, b: 2").is_none());
        assert!(parse_value("{ a: }").is_none());
        assert!(parse_value("[ 1, 2").is_none());
    }

    #[test]
    fn test_ordered_document() {
        let ctx = ParseContext::default();
        let mut p = Parser::new("IXSCAN { a: 1 }, COLLSCAN, IXSCAN { b: -1 }", &ctx);
        p.builder.start_line_field("planSummary").unwrap();
        assert!(p.ordered_document().unwrap());
        p.builder.end_line_field().unwrap();
        assert!(p.cur.is_at_end());
        let line = p.finish().unwrap();
        assert_eq!(
            line.get("planSummary").unwrap(),
            &Value::List(vec![
                doc(vec![("IXSCAN", doc(vec![("a", Value::from(1))]))]),
                doc(vec![("COLLSCAN", Value::from(1))]),
                doc(vec![("IXSCAN", doc(vec![("b", Value::from(-1))]))]),
            ])
        );
    }
}
