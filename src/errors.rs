use thiserror::Error;

/// Maximum number of characters of remaining input quoted in an error.
const SNIPPET_LEN: usize = 40;

/// What went wrong while reading a `.bib` source
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParsingErrorKind {
    /// an expected literal like `{`, `=` or `,` was not found
    #[error("token mismatch, expected '{expected}'")]
    TokenMismatch { expected: &'static str },
    /// a braced or quoted value ran into the end of the input
    #[error("unterminated value {partial:?}")]
    UnterminatedValue { partial: String },
    /// a bare value was neither a string variable nor a number
    #[error("value expected, found '{0}'")]
    ValueExpected(String),
    /// a `key = value` pair lacked its `=`
    #[error("... = value expected, equals sign missing")]
    EqualsSignMissing,
    /// a key ran into the end of the input
    #[error("runaway key")]
    RunawayKey,
}

/// Represents an error that aborted a parse session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} at line {line} col {column}{}, found {snippet:?}", context(.entry))]
pub struct ParsingError {
    pub kind: ParsingErrorKind,
    /// byte offset into the source
    pub offset: usize,
    /// 1-based line number of `offset`
    pub line: usize,
    /// 1-based column (in characters) of `offset`
    pub column: usize,
    /// the remaining input at `offset`, cut at the end of its line
    pub snippet: String,
    /// ID of the entry being read when the error occurred
    pub entry: Option<String>,
}

fn context(entry: &Option<String>) -> String {
    match entry {
        Some(id) => format!(" in entry {}", id),
        None => String::new(),
    }
}

impl ParsingError {
    pub(crate) fn new(kind: ParsingErrorKind, src: &str, offset: usize) -> ParsingError {
        let offset = offset.min(src.len());
        let before = &src[..offset];
        let line = before.matches('\n').count() + 1;
        let line_start = before.rfind('\n').map_or(0, |i| i + 1);
        let column = before[line_start..].chars().count() + 1;
        let snippet = src[offset..]
            .lines()
            .next()
            .unwrap_or("")
            .chars()
            .take(SNIPPET_LEN)
            .collect();
        ParsingError {
            kind,
            offset,
            line,
            column,
            snippet,
            entry: None,
        }
    }

    /// Attach the ID of the entry under construction, unless one is already set.
    pub(crate) fn within(mut self, entry: Option<String>) -> ParsingError {
        if self.entry.is_none() {
            self.entry = entry;
        }
        self
    }
}
