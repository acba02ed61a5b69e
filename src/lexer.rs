use crate::errors::{ParsingError, ParsingErrorKind};

/// A cursor over the source of a `.bib` file.
///
/// The source is never modified; only the scan position moves forward.
/// Insignificant text (whitespace and `%` line comments) is skipped around
/// every literal, so comments may appear between any two tokens:
///
/// ```tex
/// @misc{knuth, % the art of computer programming
///   year = 1968
/// }
/// ```
///
/// All delimiters of the grammar are ASCII, hence every position the cursor
/// stops at is a char boundary of the source.
pub(crate) struct Cursor<'s> {
    src: &'s str,
    pos: usize,
}

impl<'s> Cursor<'s> {
    pub(crate) fn new(src: &'s str) -> Cursor<'s> {
        Cursor { src, pos: 0 }
    }

    pub(crate) fn pos(&self) -> usize {
        self.pos
    }

    pub(crate) fn at_end(&self) -> bool {
        self.pos >= self.src.len()
    }

    /// The byte at `index`, if the source is long enough.
    pub(crate) fn byte_at(&self, index: usize) -> Option<u8> {
        self.src.as_bytes().get(index).copied()
    }

    pub(crate) fn current(&self) -> Option<u8> {
        self.byte_at(self.pos)
    }

    /// Is the byte at `index` preceded by a backslash?
    pub(crate) fn is_escaped(&self, index: usize) -> bool {
        index > 0 && self.byte_at(index - 1) == Some(b'\\')
    }

    pub(crate) fn advance(&mut self) {
        if !self.at_end() {
            self.pos += 1;
        }
    }

    pub(crate) fn slice(&self, start: usize, end: usize) -> &'s str {
        &self.src[start..end]
    }

    /// Skip whitespace and `%` line comments. A comment ends right before
    /// its newline; a comment without newline ends at the end of the input.
    pub(crate) fn skip_insignificant(&mut self) {
        loop {
            while matches!(self.current(), Some(b' ' | b'\t' | b'\r' | b'\n')) {
                self.pos += 1;
            }
            if self.current() != Some(b'%') {
                return;
            }
            while !matches!(self.current(), None | Some(b'\n')) {
                self.pos += 1;
            }
        }
    }

    fn starts_with(&self, literal: &str) -> bool {
        self.src.as_bytes()[self.pos..].starts_with(literal.as_bytes())
    }

    /// Skip insignificant text, then test whether `literal` follows.
    /// The literal itself is not consumed.
    pub(crate) fn peek_matches(&mut self, literal: &str) -> bool {
        self.skip_insignificant();
        self.starts_with(literal)
    }

    /// Skip insignificant text, consume `literal` and skip insignificant text again.
    pub(crate) fn consume(&mut self, literal: &'static str) -> Result<(), ParsingError> {
        self.skip_insignificant();
        if !self.starts_with(literal) {
            return Err(self.error(ParsingErrorKind::TokenMismatch { expected: literal }));
        }
        self.pos += literal.len();
        self.skip_insignificant();
        Ok(())
    }

    /// An error located at the current position.
    pub(crate) fn error(&self, kind: ParsingErrorKind) -> ParsingError {
        self.error_at(kind, self.pos)
    }

    pub(crate) fn error_at(&self, kind: ParsingErrorKind, offset: usize) -> ParsingError {
        ParsingError::new(kind, self.src, offset)
    }
}
