//! Recovery for documents the server truncated or printed malformed.
//!
//! Large documents get cut mid-way and some values print in forms no
//! grammar can read. Rather than fail the line, a field value starting with
//! `{` that does not parse is kept verbatim through its first closing `}`,
//! if any, and then up to the next recovery anchor (see
//! [`crate::RECOVERY_ANCHORS`]), so the fields after it still parse.

use crate::parser::{Parser, Step};
use crate::value::Value;

impl<'a> Parser<'a> {
    pub(crate) fn partial_document(&mut self) -> Step {
        let start = self.cur.pos();
        if !self.cur.eat_byte(b'{') {
            return Ok(false);
        }
        let len = recovery_offset(self.cur.rest(), &self.ctx.recovery_anchors);
        self.cur.reset(self.cur.pos() + len);
        let raw = self.cur.since(start);
        tracing::debug!(column = start, len = raw.len(), "recovered malformed document");
        self.builder.attach_value(Value::from(raw))?;
        Ok(true)
    }
}

/// Length of the recovered span after the opening brace: through the first
/// `}` when there is one, then on to the next anchor.
pub(crate) fn recovery_offset<S: AsRef<str>>(text: &str, anchors: &[S]) -> usize {
    match text.find('}') {
        Some(close) => close + 1 + anchor_offset(&text[close + 1..], anchors),
        None => anchor_offset(text, anchors),
    }
}

/// Byte offset of the first position in `text` where an anchor begins, or
/// the length of `text` when none does.
pub(crate) fn anchor_offset<S: AsRef<str>>(text: &str, anchors: &[S]) -> usize {
    text.char_indices()
        .map(|(i, _)| i)
        .find(|&i| {
            anchors
                .iter()
                .map(AsRef::as_ref)
                .any(|a| !a.is_empty() && text[i..].starts_with(a))
        })
        .unwrap_or(text.len())
}
