//! Builder: the stack machine that assembles values as the grammar matches.
//!
//! Every grammar action maps to one builder operation. Containers are pushed
//! as frames when their opening bracket matches and popped when the closing
//! bracket matches; the popped container then becomes the value for whatever
//! was waiting on it (a map key, a list slot or a line field).
//!
//! The grammar backtracks, so the builder can also take a [`Checkpoint`] and
//! roll back to it. A rule only ever closes frames it opened itself, which
//! means rolling back never has to resurrect a popped frame: dropping frames
//! above the checkpoint depth and truncating the frame at that depth restores
//! the exact earlier state.

use crate::logline::LogLine;
use crate::value::{Document, Value};
use thiserror::Error;

/// Which kind of container a frame holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    Map,
    List,
}

/// A grammar/builder contract violation. Never caused by input text alone.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvariantViolation {
    #[error("close with no open container")]
    EmptyStack,

    #[error("expected to close a {expected:?} frame but found {found:?}")]
    FrameMismatch { expected: FrameKind, found: FrameKind },

    #[error("field name set while the current frame is not a map")]
    NotAMap,

    #[error("value attached with no pending field, list or line field")]
    NoPendingTarget,

    #[error("line field \"{0}\" is still open")]
    LineFieldOpen(String),

    #[error("no line field is open")]
    NoLineField,

    #[error("{0} container(s) left open at end of line")]
    UnclosedFrames(usize),
}

type Step<T = ()> = std::result::Result<T, InvariantViolation>;

#[derive(Debug)]
enum Frame {
    Map {
        entries: Document,
        /// Field name that was pending when this map opened.
        parent_key: Option<String>,
    },
    List {
        items: Vec<Value>,
        parent_key: Option<String>,
    },
}

impl Frame {
    fn kind(&self) -> FrameKind {
        match self {
            Frame::Map { .. } => FrameKind::Map,
            Frame::List { .. } => FrameKind::List,
        }
    }

    fn len(&self) -> usize {
        match self {
            Frame::Map { entries, .. } => entries.len(),
            Frame::List { items, .. } => items.len(),
        }
    }

    fn truncate(&mut self, len: usize) {
        match self {
            Frame::Map { entries, .. } => entries.truncate(len),
            Frame::List { items, .. } => items.truncate(len),
        }
    }
}

/// A line field being assembled between `start_line_field` and
/// `end_line_field`.
#[derive(Debug, Clone)]
struct OpenLineField {
    name: String,
    value: Option<Value>,
}

/// Saved builder state for backtracking.
#[derive(Debug, Clone)]
pub struct Checkpoint {
    depth: usize,
    top_len: usize,
    pending: Option<String>,
    line_len: usize,
    line_field: Option<OpenLineField>,
}

/// Per-parse value builder. Owned by exactly one parse invocation.
#[derive(Debug, Default)]
pub struct Builder {
    line: Document,
    stack: Vec<Frame>,
    pending: Option<String>,
    line_field: Option<OpenLineField>,
}

impl Builder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push an empty map frame.
    pub fn open_map(&mut self) {
        let parent_key = self.pending.take();
        self.stack.push(Frame::Map {
            entries: Document::new(),
            parent_key,
        });
    }

    /// Push an empty list frame.
    pub fn open_list(&mut self) {
        let parent_key = self.pending.take();
        self.stack.push(Frame::List {
            items: Vec::new(),
            parent_key,
        });
    }

    /// Pop the current map frame and attach it to its parent.
    pub fn close_map(&mut self) -> Step {
        match self.stack.pop() {
            Some(Frame::Map {
                entries,
                parent_key,
            }) => {
                self.pending = parent_key;
                self.attach_value(Value::Document(entries))
            }
            Some(other) => Err(self.mismatch(FrameKind::Map, other)),
            None => Err(InvariantViolation::EmptyStack),
        }
    }

    /// Pop the current list frame and attach it to its parent.
    pub fn close_list(&mut self) -> Step {
        match self.stack.pop() {
            Some(Frame::List { items, parent_key }) => {
                self.pending = parent_key;
                self.attach_value(Value::List(items))
            }
            Some(other) => Err(self.mismatch(FrameKind::List, other)),
            None => Err(InvariantViolation::EmptyStack),
        }
    }

    /// Put back a frame popped by mistake and describe the mismatch.
    fn mismatch(&mut self, expected: FrameKind, frame: Frame) -> InvariantViolation {
        let found = frame.kind();
        self.stack.push(frame);
        InvariantViolation::FrameMismatch { expected, found }
    }

    /// Record the key the next attached value belongs to.
    pub fn set_field_name(&mut self, name: impl Into<String>) -> Step {
        match self.stack.last() {
            Some(Frame::Map { .. }) => {
                self.pending = Some(name.into());
                Ok(())
            }
            _ => Err(InvariantViolation::NotAMap),
        }
    }

    /// Deliver a finished value to whatever is waiting for it.
    pub fn attach_value(&mut self, value: Value) -> Step {
        match self.stack.last_mut() {
            Some(Frame::Map { entries, .. }) => {
                let key = self
                    .pending
                    .take()
                    .ok_or(InvariantViolation::NoPendingTarget)?;
                entries.push(key, value);
                Ok(())
            }
            Some(Frame::List { items, .. }) => {
                items.push(value);
                Ok(())
            }
            None => match &mut self.line_field {
                Some(field) if field.value.is_none() => {
                    field.value = Some(value);
                    Ok(())
                }
                _ => Err(InvariantViolation::NoPendingTarget),
            },
        }
    }

    /// Begin assembling the value of a top-level line field.
    pub fn start_line_field(&mut self, name: impl Into<String>) -> Step {
        if let Some(open) = &self.line_field {
            return Err(InvariantViolation::LineFieldOpen(open.name.clone()));
        }
        self.line_field = Some(OpenLineField {
            name: name.into(),
            value: None,
        });
        Ok(())
    }

    /// Store the assembled value under the open line field's name.
    pub fn end_line_field(&mut self) -> Step {
        if !self.stack.is_empty() {
            return Err(InvariantViolation::UnclosedFrames(self.stack.len()));
        }
        let field = self.line_field.take().ok_or(InvariantViolation::NoLineField)?;
        let value = field.value.ok_or(InvariantViolation::NoPendingTarget)?;
        self.line.push(field.name, value);
        Ok(())
    }

    /// Store a fully known value directly as a line field.
    pub fn set_line_field(&mut self, name: impl Into<String>, value: Value) -> Step {
        if let Some(open) = &self.line_field {
            return Err(InvariantViolation::LineFieldOpen(open.name.clone()));
        }
        if !self.stack.is_empty() {
            return Err(InvariantViolation::UnclosedFrames(self.stack.len()));
        }
        self.line.push(name, value);
        Ok(())
    }

    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            depth: self.stack.len(),
            top_len: self.stack.last().map_or(0, Frame::len),
            pending: self.pending.clone(),
            line_len: self.line.len(),
            line_field: self.line_field.clone(),
        }
    }

    /// Return to the state captured by `checkpoint`.
    pub fn rollback(&mut self, checkpoint: Checkpoint) {
        self.stack.truncate(checkpoint.depth);
        if let Some(top) = self.stack.last_mut() {
            top.truncate(checkpoint.top_len);
        }
        self.pending = checkpoint.pending;
        self.line.truncate(checkpoint.line_len);
        self.line_field = checkpoint.line_field;
    }

    /// Finish the parse. The stack must be empty and no field left open.
    pub fn finish(self) -> Step<LogLine> {
        if !self.stack.is_empty() {
            return Err(InvariantViolation::UnclosedFrames(self.stack.len()));
        }
        if let Some(open) = self.line_field {
            return Err(InvariantViolation::LineFieldOpen(open.name));
        }
        Ok(LogLine::from_document(self.line))
    }
}
