//! Byte-offset to line/column mapping.

use crema_ir::Origin;

/// Precomputed line starts for a source buffer.
///
/// Lines are 1-based, columns 0-based, both counted in bytes (the
/// tokenizer never splits a token across a newline, so byte columns are
/// stable for diagnostics).
#[derive(Clone, Debug)]
pub struct LineIndex {
    line_starts: Vec<u32>,
}

impl LineIndex {
    pub fn new(source: &str) -> Self {
        let mut line_starts = vec![0];
        for (i, b) in source.bytes().enumerate() {
            if b == b'\n' {
                line_starts.push(i as u32 + 1);
            }
        }
        LineIndex { line_starts }
    }

    /// Map a byte offset to an [`Origin`].
    pub fn origin(&self, pos: u32) -> Origin {
        let line = match self.line_starts.binary_search(&pos) {
            Ok(i) => i,
            Err(i) => i - 1,
        };
        Origin::new(line as u32 + 1, pos - self.line_starts[line], pos)
    }
}
