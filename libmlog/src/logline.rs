//! The parsed log line record.

use crate::value::{Document, Value};

/// Names of the fields the line envelope and the well-known line fields use.
pub mod field {
    pub const TIMESTAMP: &str = "timestamp";
    pub const SEVERITY: &str = "severity";
    pub const COMPONENT: &str = "component";
    pub const CONTEXT: &str = "context";
    pub const WARNING: &str = "warning";
    pub const OP: &str = "op";
    pub const NS: &str = "ns";
    pub const DURATION_MS: &str = "duration_ms";
    /// Trailing text no other stage consumed.
    pub const EXTRA: &str = "xextra";
    pub const COMMAND: &str = "command";
    pub const COMMAND_TYPE: &str = "command_type";
    pub const EXCEPTION: &str = "exception";
    pub const PLAN_SUMMARY: &str = "planSummary";
}

/// One parsed line: named fields in the order they appeared in the source.
///
/// Field names may repeat (a counter printed both before and after the lock
/// statistics shows up twice); `get` returns the first occurrence and
/// `get_all` every one of them.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LogLine {
    fields: Document,
}

impl LogLine {
    pub(crate) fn from_document(fields: Document) -> Self {
        Self { fields }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Value> + 'a {
        self.fields.get_all(name)
    }

    pub fn fields(&self) -> &Document {
        &self.fields
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn into_document(self) -> Document {
        self.fields
    }

    fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    /// The timestamp exactly as printed, in whichever format the line used.
    pub fn timestamp(&self) -> Option<&str> {
        self.get_str(field::TIMESTAMP)
    }

    pub fn severity(&self) -> Option<&str> {
        self.get_str(field::SEVERITY)
    }

    pub fn component(&self) -> Option<&str> {
        self.get_str(field::COMPONENT)
    }

    /// The bracketed thread context, without brackets (`conn1`).
    pub fn context(&self) -> Option<&str> {
        self.get_str(field::CONTEXT)
    }

    pub fn warning(&self) -> Option<&str> {
        self.get_str(field::WARNING)
    }

    pub fn op(&self) -> Option<&str> {
        self.get_str(field::OP)
    }

    pub fn ns(&self) -> Option<&str> {
        self.get_str(field::NS)
    }

    pub fn duration_ms(&self) -> Option<i64> {
        self.get(field::DURATION_MS).and_then(Value::as_i64)
    }

    /// Unparsed trailing text, if any.
    pub fn extra(&self) -> Option<&str> {
        self.get_str(field::EXTRA)
    }
}

impl<'a> IntoIterator for &'a LogLine {
    type Item = (&'a str, &'a Value);
    type IntoIter = Box<dyn Iterator<Item = (&'a str, &'a Value)> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.fields.iter())
    }
}
