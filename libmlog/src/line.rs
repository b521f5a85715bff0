//! Line envelope and line fields.
//!
//! A line is read left to right in fixed stages:
//!
//! ```text
//! [metadata] timestamp [severity] [component] [context] [warning] op ns
//!     fields* [locks(micros) ...] fields* [NNNms] [extra]
//! ```
//!
//! Timestamp, context, operation and namespace are required; a miss there
//! fails the line with the stage name. Everything after the namespace is
//! best effort: whatever the field grammar cannot read ends up in `xextra`.

use crate::decode;
use crate::error::{ParseError, Result, Stage};
use crate::lexical::{
    is_component_char, is_digit, is_ident_char, is_lower, is_ns_char, is_space, Cursor,
};
use crate::logline::field;
use crate::parser::{Parser, Step};
use crate::value::Value;

impl<'a> Parser<'a> {
    pub(crate) fn line(&mut self) -> Result<()> {
        self.metadata()?;
        self.require(Stage::Timestamp, Self::timestamp)?;
        self.attempt(Self::severity)?;
        self.attempt(Self::component)?;
        self.require(Stage::Context, Self::context)?;
        self.attempt(Self::warning)?;
        self.require(Stage::Operation, Self::operation)?;
        self.require(Stage::Namespace, Self::namespace)?;
        self.line_fields()?;
        self.attempt(Self::locks)?;
        self.line_fields()?;
        self.attempt(Self::duration)?;
        self.extra()?;
        // `extra` takes whatever is left; this only trips if it stops doing so.
        if !self.cur.is_at_end() {
            return Err(ParseError::mismatch(Stage::EndOfLine, self.cur.pos(), self.ctx));
        }
        Ok(())
    }

    fn require(&mut self, stage: Stage, rule: impl FnOnce(&mut Self) -> Step) -> Result<()> {
        let column = self.cur.pos();
        if self.attempt(rule)? {
            Ok(())
        } else {
            Err(ParseError::mismatch(stage, column, self.ctx))
        }
    }

    /// Leading collector tag, kept only when a timestamp follows it.
    fn metadata(&mut self) -> Step {
        let ctx = self.ctx;
        let Some(name) = ctx.metadata_field.as_deref() else {
            return Ok(false);
        };
        self.attempt(|p| {
            let token = p.cur.eat_while(|c| !is_space(c));
            if token.is_empty() || p.cur.skip_spaces() == 0 {
                return Ok(false);
            }
            let at = p.cur.pos();
            let timestamp_follows = timestamp_text(&mut p.cur);
            p.cur.reset(at);
            if !timestamp_follows {
                return Ok(false);
            }
            p.emit_line_field(name, Value::from(token))
        })
    }

    fn timestamp(&mut self) -> Step {
        let start = self.cur.pos();
        if !timestamp_text(&mut self.cur) {
            return Ok(false);
        }
        let text = self.cur.since(start);
        if self.cur.skip_spaces() == 0 {
            return Ok(false);
        }
        self.emit_line_field(field::TIMESTAMP, Value::from(text))
    }

    /// One of `FEWID`, optionally followed by a debug level digit.
    fn severity(&mut self) -> Step {
        let start = self.cur.pos();
        if !self
            .cur
            .eat_if(|c| matches!(c, b'F' | b'E' | b'W' | b'I' | b'D'))
        {
            return Ok(false);
        }
        self.cur.eat_if(is_digit);
        let code = self.cur.since(start);
        if !self.cur.eat_byte(b' ') {
            return Ok(false);
        }
        self.emit_line_field(field::SEVERITY, Value::from(code))
    }

    /// `QUERY`, `NETWORK`, ... or `-`, padded with spaces.
    fn component(&mut self) -> Step {
        let start = self.cur.pos();
        if !self.cur.eat_byte(b'-') && self.cur.eat_while(is_component_char).is_empty() {
            return Ok(false);
        }
        let name = self.cur.since(start);
        if self.cur.skip_spaces() == 0 {
            return Ok(false);
        }
        self.emit_line_field(field::COMPONENT, Value::from(name))
    }

    /// `[conn1]`, stored without brackets.
    fn context(&mut self) -> Step {
        if !self.cur.eat_byte(b'[') {
            return Ok(false);
        }
        let name = self.cur.eat_while(|c| c != b']');
        if name.is_empty() || !self.cur.eat_byte(b']') || self.cur.skip_spaces() == 0 {
            return Ok(false);
        }
        self.emit_line_field(field::CONTEXT, Value::from(name))
    }

    /// Truncation notice the server inserts before oversized lines.
    fn warning(&mut self) -> Step {
        let start = self.cur.pos();
        if !self.cur.eat("warning: log line attempted (") || self.cur.eat_until("...").is_none() {
            return Ok(false);
        }
        self.cur.eat("...");
        let text = self.cur.since(start);
        if self.cur.skip_spaces() == 0 {
            return Ok(false);
        }
        self.emit_line_field(field::WARNING, Value::from(text))
    }

    /// A lowercase word and a single space; a second space means an empty
    /// namespace follows.
    fn operation(&mut self) -> Step {
        let op = self.cur.eat_while(is_lower);
        if op.is_empty() || !(self.cur.eat_byte(b' ') || self.cur.is_at_end()) {
            return Ok(false);
        }
        self.emit_line_field(field::OP, Value::from(op))
    }

    /// May be empty, but must end at a space or the end of the line.
    fn namespace(&mut self) -> Step {
        let ns = self.cur.eat_while(is_ns_char);
        if !(self.cur.is_at_end() || self.cur.peek().is_some_and(is_space)) {
            return Ok(false);
        }
        self.emit_line_field(field::NS, Value::from(ns))
    }

    fn line_fields(&mut self) -> Step {
        while self.attempt(|p| {
            p.cur.skip_spaces();
            p.line_field()
        })? {}
        Ok(true)
    }

    fn line_field(&mut self) -> Step {
        Ok(self.attempt(Self::exception_field)?
            || self.attempt(Self::command_field)?
            || self.attempt(Self::plan_summary_field)?
            || self.attempt(Self::plain_field)?)
    }

    /// `exception: <text> code:`, the text trimmed. The `code:` counter is
    /// left for the next field.
    fn exception_field(&mut self) -> Step {
        if !self.cur.eat("exception:") {
            return Ok(false);
        }
        match self.cur.eat_until("code:") {
            Some(text) => self.emit_line_field(field::EXCEPTION, Value::from(text.trim())),
            None => Ok(false),
        }
    }

    /// `command: <type> <value>`, recorded as `command_type` then `command`.
    fn command_field(&mut self) -> Step {
        if !self.cur.eat("command: ") {
            return Ok(false);
        }
        let command_type = self.cur.eat_while(is_ident_char);
        if command_type.is_empty() || self.cur.skip_spaces() == 0 {
            return Ok(false);
        }
        self.emit_line_field(field::COMMAND_TYPE, Value::from(command_type))?;
        self.builder.start_line_field(field::COMMAND)?;
        if !self.field_value()? {
            return Ok(false);
        }
        self.builder.end_line_field()?;
        Ok(true)
    }

    fn plan_summary_field(&mut self) -> Step {
        if !self.cur.eat("planSummary: ") {
            return Ok(false);
        }
        self.builder.start_line_field(field::PLAN_SUMMARY)?;
        if !self.ordered_document()? {
            return Ok(false);
        }
        self.builder.end_line_field()?;
        Ok(true)
    }

    /// `name:value` where the value is a document, a number, or a recovered
    /// malformed document.
    fn plain_field(&mut self) -> Step {
        let name = self.cur.eat_while(is_ident_char);
        if name.is_empty() || !self.cur.eat_byte(b':') {
            return Ok(false);
        }
        self.cur.skip_spaces();
        self.builder.start_line_field(name)?;
        if !self.field_value()? {
            return Ok(false);
        }
        self.builder.end_line_field()?;
        Ok(true)
    }

    fn field_value(&mut self) -> Step {
        Ok(self.attempt(Self::document)?
            || self.attempt(Self::numeric)?
            || self.attempt(Self::partial_document)?)
    }

    /// `locks(micros) r:12 w:34`, one line field per counter.
    fn locks(&mut self) -> Step {
        self.cur.skip_spaces();
        if !self.cur.eat("locks(micros)") {
            return Ok(false);
        }
        let mut counters = 0;
        while self.attempt(|p| Ok(p.cur.skip_spaces() > 0 && p.lock_counter()?))? {
            counters += 1;
        }
        Ok(counters > 0)
    }

    fn lock_counter(&mut self) -> Step {
        let start = self.cur.pos();
        if !self.cur.eat_if(|c| matches!(c, b'r' | b'R' | b'w' | b'W')) {
            return Ok(false);
        }
        let name = self.cur.since(start);
        if !self.cur.eat_byte(b':') {
            return Ok(false);
        }
        self.builder.start_line_field(name)?;
        if !self.attempt(Self::numeric)? {
            return Ok(false);
        }
        self.builder.end_line_field()?;
        Ok(true)
    }

    /// `123ms`, stored as an integer.
    fn duration(&mut self) -> Step {
        self.cur.skip_spaces();
        let digits = self.cur.eat_while(is_digit);
        if digits.is_empty() || !self.cur.eat("ms") {
            return Ok(false);
        }
        if !(self.cur.is_at_end() || self.cur.peek().is_some_and(is_space)) {
            return Ok(false);
        }
        match decode::numeric(digits) {
            Ok(ms) => self.emit_line_field(field::DURATION_MS, ms),
            Err(_) => Ok(false),
        }
    }

    /// Whatever is left, if anything.
    fn extra(&mut self) -> Step {
        self.cur.skip_spaces();
        let rest = self.cur.eat_rest();
        if rest.is_empty() {
            return Ok(false);
        }
        self.emit_line_field(field::EXTRA, Value::from(rest))
    }
}

// ============================================================================
// Timestamps
// ============================================================================

/// Consume either timestamp format. Leaves the cursor unmoved on a miss.
fn timestamp_text(cur: &mut Cursor<'_>) -> bool {
    let start = cur.pos();
    if ctime_timestamp(cur) {
        return true;
    }
    cur.reset(start);
    if iso_timestamp(cur) {
        return true;
    }
    cur.reset(start);
    false
}

/// `Wed Oct 30 15:34:23.128`, day of month space padded.
fn ctime_timestamp(cur: &mut Cursor<'_>) -> bool {
    capitalized_word(cur)
        && cur.eat_byte(b' ')
        && capitalized_word(cur)
        && cur.skip_spaces() > 0
        && (1..=2).contains(&cur.eat_while(is_digit).len())
        && cur.eat_byte(b' ')
        && clock(cur)
}

/// `2014-10-31T13:00:04.123+0000`
fn iso_timestamp(cur: &mut Cursor<'_>) -> bool {
    if !(cur.eat_exactly(4, is_digit)
        && cur.eat_byte(b'-')
        && cur.eat_exactly(2, is_digit)
        && cur.eat_byte(b'-')
        && cur.eat_exactly(2, is_digit)
        && cur.eat_byte(b'T')
        && clock(cur))
    {
        return false;
    }
    if cur.eat_byte(b'Z') {
        return true;
    }
    let before_offset = cur.pos();
    let offset = cur.eat_if(|c| c == b'+' || c == b'-')
        && cur.eat_exactly(2, is_digit)
        && {
            cur.eat_byte(b':');
            cur.eat_exactly(2, is_digit)
        };
    if !offset {
        cur.reset(before_offset);
    }
    true
}

fn capitalized_word(cur: &mut Cursor<'_>) -> bool {
    cur.eat_exactly(1, |c| c.is_ascii_uppercase()) && cur.eat_exactly(2, is_lower)
}

/// `HH:MM:SS` with optional fractional seconds.
fn clock(cur: &mut Cursor<'_>) -> bool {
    if !(cur.eat_exactly(2, is_digit)
        && cur.eat_byte(b':')
        && cur.eat_exactly(2, is_digit)
        && cur.eat_byte(b':')
        && cur.eat_exactly(2, is_digit))
    {
        return false;
    }
    let before_fraction = cur.pos();
    if cur.eat_byte(b'.') && cur.eat_while(is_digit).is_empty() {
        cur.reset(before_fraction);
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timestamp_len(src: &str) -> Option<usize> {
        let mut cur = Cursor::new(src);
        timestamp_text(&mut cur).then(|| cur.pos())
    }

    #[test]
    fn test_ctime_timestamps() {
        assert_eq!(timestamp_len("Wed Oct 30 15:34:23.128 [conn1]"), Some(23));
        assert_eq!(timestamp_len("Sat Nov  2 01:02:03 [conn1]"), Some(19));
        assert_eq!(timestamp_len("Sat Nov 2 01:02:03"), Some(18));
        assert_eq!(timestamp_len("wed Oct 30 15:34:23"), None);
        assert_eq!(timestamp_len("Wed Oct 300 15:34:23"), None);
    }

    #[test]
    fn test_iso_timestamps() {
        assert_eq!(timestamp_len("2014-10-31T13:00:04.123+0000 I"), Some(28));
        assert_eq!(timestamp_len("2014-10-31T13:00:04.123-05:00 I"), Some(29));
        assert_eq!(timestamp_len("2014-10-31T13:00:04Z I"), Some(20));
        assert_eq!(timestamp_len("2014-10-31T13:00:04 I"), Some(19));
        assert_eq!(timestamp_len("2014-10-31 13:00:04"), None);
    }

    #[test]
    fn test_fraction_needs_digits() {
        assert_eq!(timestamp_len("2014-10-31T13:00:04.x"), Some(19));
    }

    #[test]
    fn test_partial_offset_is_left_unconsumed() {
        assert_eq!(timestamp_len("2014-10-31T13:00:04+05 I"), Some(19));
    }
}
