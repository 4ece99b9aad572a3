//! Source location tracking for diagnostics and symbol queries.
//!
//! A [`Position`] is a 1-based line/column pair; a [`Span`] is a pair of
//! positions covering a contiguous region of source text. Every token, AST
//! node, and diagnostic in the DP compiler carries a position, enabling
//! error messages and editor queries that point at the exact location of
//! interest.
//!
//! # Line/Column Convention
//!
//! Both lines and columns are 1-based at this layer. The editor host is
//! responsible for converting to 0-based coordinates at its own protocol
//! boundary; the compiler core never does.
//!
//! # Example
//!
//! ```
//! use dpscript_base::{Position, Span};
//!
//! let start = Position::new(3, 5);
//! let end = Position::new(3, 12);
//! let span = Span::new(start, end);
//!
//! assert_eq!(span.start.line, 3);
//! assert_eq!(span.end.column, 12);
//! ```

use serde::{Deserialize, Serialize};

/// A 1-based line/column location in source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    /// Line number, starting at 1.
    pub line: u32,
    /// Column number, starting at 1.
    pub column: u32,
}

impl Position {
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

impl Default for Position {
    fn default() -> Self {
        Self { line: 1, column: 1 }
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A region of source text, inclusive of `start`, exclusive of `end`.
///
/// Spans are `Copy` and cheap to pass around. Use [`Span::merge`] to combine
/// spans when building compound constructs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

impl Span {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// A zero-width span at a single position.
    pub fn point(at: Position) -> Self {
        Self { start: at, end: at }
    }

    /// A span covering `len` columns on one line.
    pub fn on_line(line: u32, column: u32, len: u32) -> Self {
        Self {
            start: Position::new(line, column),
            end: Position::new(line, column + len),
        }
    }

    /// The span covering from the start of `self` to the end of `other`.
    pub fn merge(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_new_stores_coordinates() {
        let pos = Position::new(4, 9);
        assert_eq!(pos.line, 4);
        assert_eq!(pos.column, 9);
    }

    #[test]
    fn position_default_is_one_one() {
        let pos = Position::default();
        assert_eq!(pos.line, 1);
        assert_eq!(pos.column, 1);
    }

    #[test]
    fn position_ordering_is_line_major() {
        assert!(Position::new(2, 1) > Position::new(1, 80));
        assert!(Position::new(2, 3) < Position::new(2, 4));
    }

    #[test]
    fn span_on_line_covers_len_columns() {
        let span = Span::on_line(7, 5, 3);
        assert_eq!(span.start, Position::new(7, 5));
        assert_eq!(span.end, Position::new(7, 8));
    }

    #[test]
    fn span_merge_combines_ranges() {
        let a = Span::on_line(1, 5, 4);
        let b = Span::on_line(2, 1, 6);
        let merged = a.merge(b);
        assert_eq!(merged.start, Position::new(1, 5));
        assert_eq!(merged.end, Position::new(2, 7));
    }

    #[test]
    fn position_display_is_line_colon_column() {
        assert_eq!(Position::new(12, 3).to_string(), "12:3");
    }
}
