//! Source positions for syntax nodes.
//!
//! Offsets are 1-based byte offsets into the buffer of the file they came
//! from, so that `0` can mean "no position" for nodes the rewriter
//! synthesizes. A span is the pair `(pos, end)` with `end` exclusive.

/// A 1-based byte offset into a source buffer; `Pos::NONE` marks synthesized nodes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Pos(u32);

impl Pos {
    pub const NONE: Pos = Pos(0);

    /// Position of the byte at 0-based `offset`
    pub fn from_offset(offset: usize) -> Self {
        Self(offset as u32 + 1)
    }

    pub fn is_valid(self) -> bool {
        self.0 != 0
    }

    /// The raw 1-based value
    pub fn get(self) -> u32 {
        self.0
    }

    /// 0-based byte offset, `None` for synthesized positions
    pub fn offset(self) -> Option<usize> {
        self.is_valid().then(|| self.0 as usize - 1)
    }

    /// Position `n` bytes further on
    pub fn advance(self, n: usize) -> Self {
        if self.is_valid() {
            Self(self.0 + n as u32)
        } else {
            self
        }
    }
}

/// A `(pos, end)` pair; `end` is exclusive
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Span {
    pub pos: Pos,
    pub end: Pos,
}

impl Span {
    pub const NONE: Span = Span {
        pos: Pos::NONE,
        end: Pos::NONE,
    };

    pub fn new(pos: Pos, end: Pos) -> Self {
        Self { pos, end }
    }

    pub fn is_valid(&self) -> bool {
        self.pos.is_valid() && self.end.is_valid()
    }

    /// Smallest span covering both
    pub fn cover(self, other: Span) -> Span {
        if !self.is_valid() {
            return other;
        }
        if !other.is_valid() {
            return self;
        }
        Span::new(self.pos.min(other.pos), self.end.max(other.end))
    }
}

/// A resolved line/column pair, both 1-based; the column counts bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LineCol {
    pub line: usize,
    pub column: usize,
}

impl LineCol {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl std::fmt::Display for LineCol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}
