//! Source buffers and fragment extraction.
//!
//! Trace calls quote the program's own text: the signature of a function, the
//! head of a clause, the physical line a statement starts on. Everything here
//! is a pure read of the immutable buffer a tree was parsed from.

use crate::base::{LineCol, LineIndex, Pos, Span};
use crate::error::ParseError;
use crate::parser::parse_file;
use crate::syntax::ast::File;

/// An immutable source buffer with its line index
#[derive(Debug, Clone)]
pub struct SourceText {
    text: String,
    lines: LineIndex,
}

impl SourceText {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let lines = LineIndex::new(&text);
        Self { text, lines }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Bytes `[pos-1, end-1)`; empty for synthesized or out-of-range positions
    pub fn fragment(&self, pos: Pos, end: Pos) -> &str {
        match (pos.offset(), end.offset()) {
            (Some(start), Some(stop)) if start <= stop => self.text.get(start..stop).unwrap_or(""),
            _ => "",
        }
    }

    pub fn span_text(&self, span: Span) -> &str {
        self.fragment(span.pos, span.end)
    }

    /// The whole physical line containing `pos`, without its terminator
    pub fn fragment_line(&self, pos: Pos) -> &str {
        let Some(offset) = pos.offset() else {
            return "";
        };
        let bytes = self.text.as_bytes();
        let offset = offset.min(bytes.len());
        let is_terminator = |b: &u8| *b == b'\n' || *b == b'\r';
        let begin = bytes[..offset]
            .iter()
            .rposition(is_terminator)
            .map(|i| i + 1)
            .unwrap_or(0);
        let end = bytes[offset..]
            .iter()
            .position(is_terminator)
            .map(|i| offset + i)
            .unwrap_or(bytes.len());
        self.text.get(begin..end).unwrap_or("")
    }

    pub fn line_col(&self, pos: Pos) -> LineCol {
        self.lines.line_col(pos)
    }

    pub fn lines(&self) -> &LineIndex {
        &self.lines
    }
}

/// One input file: its buffer, its parsed tree and the name it is reported under
#[derive(Debug, Clone)]
pub struct SourceUnit {
    pub path: String,
    pub source: SourceText,
    pub file: File,
}

impl SourceUnit {
    /// Decode and parse `bytes`; errors name `path`
    pub fn parse(path: impl Into<String>, bytes: &[u8]) -> Result<Self, ParseError> {
        let path = path.into();
        let text = match std::str::from_utf8(bytes) {
            Ok(text) => text,
            Err(e) => {
                return Err(ParseError::new(
                    path,
                    LineCol::new(0, 0),
                    format!("source is not valid UTF-8: {e}"),
                ));
            }
        };
        let source = SourceText::new(text);
        match parse_file(source.as_str()) {
            Ok(file) => Ok(Self { path, source, file }),
            Err(e) => {
                let location = source.line_col(e.pos);
                Err(ParseError::new(path, location, e.message))
            }
        }
    }

    /// Split into the parts the rewriter consumes separately
    pub fn into_parts(self) -> (String, SourceText, File) {
        (self.path, self.source, self.file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(offset: usize) -> Pos {
        Pos::from_offset(offset)
    }

    #[test]
    fn test_fragment_is_half_open() {
        let src = SourceText::new("package main");
        assert_eq!(src.fragment(pos(0), pos(7)), "package");
        assert_eq!(src.fragment(Pos::NONE, pos(3)), "");
    }

    #[test]
    fn test_fragment_line_returns_whole_line() {
        let src = SourceText::new("a\n\tx := f(1,\n\t\t2)\nb");
        let at_f = src.as_str().find('f').unwrap();
        assert_eq!(src.fragment_line(pos(at_f)), "\tx := f(1,");
    }

    #[test]
    fn test_fragment_line_handles_carriage_returns() {
        let src = SourceText::new("one\r\ntwo\rthree");
        assert_eq!(src.fragment_line(pos(5)), "two");
        assert_eq!(src.fragment_line(pos(9)), "three");
        assert_eq!(src.fragment_line(pos(0)), "one");
    }

    #[test]
    fn test_fragment_line_at_buffer_edges() {
        let src = SourceText::new("only");
        assert_eq!(src.fragment_line(pos(0)), "only");
        assert_eq!(src.fragment_line(pos(3)), "only");
    }

    #[test]
    fn test_parse_error_names_file() {
        let err = SourceUnit::parse("dir/bad.go", b"package main\n\nfunc {\n").unwrap_err();
        assert_eq!(err.path, "dir/bad.go");
        assert_eq!(err.location.line, 3);
    }

    #[test]
    fn test_invalid_utf8_is_a_parse_error() {
        let err = SourceUnit::parse("x.go", &[0xff, 0xfe]).unwrap_err();
        assert!(err.message.contains("UTF-8"));
    }
}
