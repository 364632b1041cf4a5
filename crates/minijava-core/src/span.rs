//! Source location tracking for error reporting.
//!
//! Provides [`Span`] to track where tokens, nodes and errors occur in source code.

use std::fmt;

/// A span of source code.
///
/// Carries the byte offsets of the covered text plus the line:column where it
/// starts, which is what diagnostics print.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    /// Byte offset of the first character.
    pub start: u32,
    /// Byte offset one past the last character.
    pub end: u32,
    /// Line number (1-indexed).
    pub line: u32,
    /// Column number (1-indexed, byte-based).
    pub col: u32,
}

impl Span {
    /// Span used for built-in declarations that have no source text.
    pub const BUILTIN: Span = Span {
        start: 0,
        end: 0,
        line: 0,
        col: 0,
    };

    /// Create a new span.
    #[inline]
    pub fn new(start: u32, end: u32, line: u32, col: u32) -> Self {
        Self {
            start,
            end,
            line,
            col,
        }
    }

    /// Create a zero-length span at a position.
    #[inline]
    pub fn point(offset: u32, line: u32, col: u32) -> Self {
        Self::new(offset, offset, line, col)
    }

    /// Whether this span is empty (zero length).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// The length of this span in bytes.
    #[inline]
    pub fn len(&self) -> u32 {
        self.end - self.start
    }

    /// Whether this span belongs to a built-in declaration.
    #[inline]
    pub fn is_builtin(&self) -> bool {
        self.line == 0
    }

    /// Merge two spans into one covering both.
    ///
    /// The position (line:col) is taken from whichever span starts first.
    #[inline]
    pub fn merge(self, other: Span) -> Span {
        let first = if self.start <= other.start { self } else { other };
        Span {
            start: first.start,
            end: self.end.max(other.end),
            line: first.line,
            col: first.col,
        }
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_builtin() {
            write!(f, "<builtin>")
        } else {
            write!(f, "{}:{}", self.line, self.col)
        }
    }
}
