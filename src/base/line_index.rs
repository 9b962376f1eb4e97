//! Line/column lookup for byte positions.

use super::position::{LineCol, Pos};

/// Start offsets of every line in a buffer.
///
/// Both `\n` and a lone `\r` terminate a line, matching how physical lines are
/// cut when extracting fragments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineIndex {
    line_starts: Vec<usize>,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let bytes = text.as_bytes();
        let mut line_starts = vec![0];
        let mut i = 0;
        while i < bytes.len() {
            match bytes[i] {
                b'\n' => line_starts.push(i + 1),
                b'\r' => {
                    if bytes.get(i + 1) == Some(&b'\n') {
                        i += 1;
                    }
                    line_starts.push(i + 1);
                }
                _ => {}
            }
            i += 1;
        }
        Self { line_starts }
    }

    /// 1-based line and byte column of `pos`; synthesized positions map to 0:0
    pub fn line_col(&self, pos: Pos) -> LineCol {
        let Some(offset) = pos.offset() else {
            return LineCol::new(0, 0);
        };
        let line = match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(next) => next - 1,
        };
        LineCol::new(line + 1, offset - self.line_starts[line] + 1)
    }

    /// 1-based line number of `pos`, 0 for synthesized positions
    pub fn line(&self, pos: Pos) -> usize {
        self.line_col(pos).line
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }
}
