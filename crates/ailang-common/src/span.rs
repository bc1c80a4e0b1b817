//! Source span and location types shared by every pipeline phase.
//!
//! The teacher codebase this was adapted from tracks spans with `rowan::TextRange`
//! over a full concrete syntax tree. This core doesn't build a CST (parsing is an
//! external concern per the spec), so spans here are a plain byte-offset pair.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A half-open byte range `[start, end)` into the original source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start: u32,
    pub end: u32,
}

impl Span {
    pub const fn new(start: u32, end: u32) -> Self {
        Span { start, end }
    }

    /// A zero-width span, useful for synthesized nodes with no source origin.
    pub const fn dummy() -> Self {
        Span { start: 0, end: 0 }
    }

    pub fn len(&self) -> u32 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end == self.start
    }

    /// The smallest span covering both `self` and `other`.
    pub fn merge(&self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// A file + line/column location, derived from a `Span` and the source text
/// it was taken from. Used only for human-facing diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub file: String,
    pub line: u32,
    pub column: u32,
}

impl Location {
    /// Compute a 1-indexed line/column for `span.start` within `source`.
    pub fn from_span(file: impl Into<String>, source: &str, span: Span) -> Self {
        let offset = span.start as usize;
        let mut line = 1u32;
        let mut column = 1u32;
        for (i, ch) in source.char_indices() {
            if i >= offset {
                break;
            }
            if ch == '\n' {
                line += 1;
                column = 1;
            } else {
                column += 1;
            }
        }
        Location {
            file: file.into(),
            line,
            column,
        }
    }
}
