//! Source origins for diagnostics.

use std::fmt;

/// Source position of a token or node.
///
/// `line` is 1-based, `col` is 0-based, `pos` is the byte offset from
/// the start of the source. Origins are carried purely for diagnostics;
/// they never affect evaluation semantics.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Default, Debug)]
pub struct Origin {
    pub line: u32,
    pub col: u32,
    pub pos: u32,
}

impl Origin {
    pub const fn new(line: u32, col: u32, pos: u32) -> Self {
        Origin { line, col, pos }
    }

    /// An origin that only knows its line number.
    ///
    /// Deserialized ASTs carry line numbers but no column/offset, so
    /// positions reconstructed from the wire form use this.
    pub const fn line_only(line: u32) -> Self {
        Origin { line, col: 0, pos: 0 }
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}:{}", self.line, self.col, self.pos)
    }
}
