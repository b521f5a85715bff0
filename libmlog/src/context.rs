//! Per-parse configuration.

/// Field names that end a recovered malformed document.
///
/// When a document cannot be parsed, the recovered text runs from its opening
/// brace up to the first position where one of these names begins.
pub const RECOVERY_ANCHORS: &[&str] = &["planSummary", "ninserted", "cursorid", "ntoreturn"];

/// Parse context: where the line came from and how to treat optional stages.
///
/// The context is read-only during a parse, so one context may be shared by
/// any number of concurrent parses.
#[derive(Clone, Debug)]
pub struct ParseContext {
    pub filename: Option<String>,
    /// Zero-based line number within `filename`.
    pub line_num: Option<usize>,
    /// Name to store a leading metadata token under (for lines prefixed by a
    /// collector with a host or file tag). Disabled when `None`.
    pub metadata_field: Option<String>,
    pub recovery_anchors: Vec<String>,
}

impl Default for ParseContext {
    fn default() -> Self {
        Self {
            filename: None,
            line_num: None,
            metadata_field: None,
            recovery_anchors: RECOVERY_ANCHORS.iter().map(|a| a.to_string()).collect(),
        }
    }
}

impl ParseContext {
    /// Create a new parse context.
    pub fn new(filename: Option<&str>) -> Self {
        Self {
            filename: filename.map(String::from),
            ..Self::default()
        }
    }

    pub fn with_line(mut self, line_num: usize) -> Self {
        self.line_num = Some(line_num);
        self
    }

    pub fn with_metadata_field(mut self, name: impl Into<String>) -> Self {
        self.metadata_field = Some(name.into());
        self
    }

    /// Replace the recovery anchor table.
    pub fn with_recovery_anchors<I, S>(mut self, anchors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.recovery_anchors = anchors.into_iter().map(Into::into).collect();
        self
    }

    /// Format a location suffix for error messages. `col` is a zero-based
    /// byte offset into the line.
    pub fn loc_suffix(&self, col: usize) -> String {
        match (&self.filename, self.line_num) {
            (Some(name), Some(line)) => format!(" at {}:{} of <{}>", line + 1, col + 1, name),
            (Some(name), None) => format!(" at column {} of <{}>", col + 1, name),
            (None, Some(line)) => format!(" at {}:{}", line + 1, col + 1),
            (None, None) => format!(" at column {}", col + 1),
        }
    }
}
