//! Rule plumbing shared by the grammar modules.
//!
//! Each grammar rule is a method on [`Parser`] returning a [`Step`]:
//! `Ok(true)` when it matched (cursor advanced, values handed to the
//! builder), `Ok(false)` when it did not, and `Err` only for a builder
//! invariant violation, which ends the parse.
//!
//! A rule that returns `Ok(false)` may leave the cursor and builder anywhere;
//! callers run alternatives through [`Parser::attempt`], which restores both
//! on failure. Ordered choice is a chain of `attempt` calls joined with `||`:
//! the first alternative that matches wins and later ones are never tried, so
//! the order of alternatives in each rule is part of its behavior.

use crate::builder::{Builder, Checkpoint, InvariantViolation};
use crate::context::ParseContext;
use crate::decode::DecodeError;
use crate::lexical::Cursor;
use crate::logline::LogLine;
use crate::value::Value;

pub(crate) type Step = std::result::Result<bool, InvariantViolation>;

/// A decoder for one kind of type literal.
pub(crate) type Decoder = fn(&str) -> std::result::Result<Value, DecodeError>;

/// Parser state for one line. Created and consumed by a single parse call.
pub(crate) struct Parser<'a> {
    pub(crate) cur: Cursor<'a>,
    pub(crate) builder: Builder,
    pub(crate) ctx: &'a ParseContext,
}

struct Mark {
    pos: usize,
    checkpoint: Checkpoint,
}

impl<'a> Parser<'a> {
    pub(crate) fn new(line: &'a str, ctx: &'a ParseContext) -> Self {
        Self {
            cur: Cursor::new(line),
            builder: Builder::new(),
            ctx,
        }
    }

    fn mark(&self) -> Mark {
        Mark {
            pos: self.cur.pos(),
            checkpoint: self.builder.checkpoint(),
        }
    }

    fn reset(&mut self, mark: Mark) {
        self.cur.reset(mark.pos);
        self.builder.rollback(mark.checkpoint);
    }

    /// Run `rule`; on no-match, rewind the cursor and builder.
    pub(crate) fn attempt(&mut self, rule: impl FnOnce(&mut Self) -> Step) -> Step {
        let mark = self.mark();
        let matched = rule(self)?;
        if !matched {
            self.reset(mark);
        }
        Ok(matched)
    }

    /// Decode the text consumed since `start` and attach it as a value.
    ///
    /// A decoder rejecting the text makes the enclosing alternative fail; it
    /// never fails the line.
    pub(crate) fn emit(&mut self, start: usize, decode: Decoder) -> Step {
        let raw = self.cur.since(start);
        match decode(raw) {
            Ok(value) => {
                self.builder.attach_value(value)?;
                Ok(true)
            }
            Err(err) => {
                tracing::trace!(%err, column = start, "decoder rejected literal");
                Ok(false)
            }
        }
    }

    /// Store an envelope value as a line field in one step.
    pub(crate) fn emit_line_field(&mut self, name: &str, value: Value) -> Step {
        self.builder.set_line_field(name, value)?;
        Ok(true)
    }

    pub(crate) fn finish(self) -> std::result::Result<LogLine, InvariantViolation> {
        self.builder.finish()
    }
}
