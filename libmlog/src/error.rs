//! Error types for log line parsing.

use crate::builder::InvariantViolation;
use crate::context::ParseContext;
use std::fmt;
use thiserror::Error;

/// Result type for log line parsing operations.
pub type Result<T> = std::result::Result<T, ParseError>;

/// Required envelope stages a line can fail at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Timestamp,
    Context,
    Operation,
    Namespace,
    EndOfLine,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Timestamp => "timestamp",
            Stage::Context => "thread context",
            Stage::Operation => "operation",
            Stage::Namespace => "namespace",
            Stage::EndOfLine => "end of line",
        };
        f.write_str(name)
    }
}

/// Error type for log line parsing.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// A required envelope stage did not match.
    #[error("Expected {stage}{location}")]
    GrammarMismatch {
        stage: Stage,
        /// Zero-based byte offset where the stage was attempted.
        column: usize,
        location: String,
    },

    /// The input held more than one line.
    #[error("Unexpected line break{location}")]
    EmbeddedNewline { column: usize, location: String },

    /// The grammar drove the builder into an inconsistent state.
    #[error("Internal parser error: {0}")]
    Internal(#[from] InvariantViolation),
}

impl ParseError {
    pub(crate) fn mismatch(stage: Stage, column: usize, ctx: &ParseContext) -> Self {
        tracing::trace!(%stage, column, "line envelope mismatch");
        ParseError::GrammarMismatch {
            stage,
            column,
            location: ctx.loc_suffix(column),
        }
    }

    pub(crate) fn embedded_newline(column: usize, ctx: &ParseContext) -> Self {
        ParseError::EmbeddedNewline {
            column,
            location: ctx.loc_suffix(column),
        }
    }

    /// Zero-based column the error refers to, if it has one.
    pub fn column(&self) -> Option<usize> {
        match self {
            ParseError::GrammarMismatch { column, .. }
            | ParseError::EmbeddedNewline { column, .. } => Some(*column),
            ParseError::Internal(_) => None,
        }
    }

    /// The envelope stage that failed, for grammar mismatches.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            ParseError::GrammarMismatch { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}
