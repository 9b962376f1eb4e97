//! Go front end: lexing and parsing
//!
//! ## Architecture
//!
//! ```text
//! Source Text
//!     ↓
//! Lexer (logos) → Tokens with SyntaxKind, semicolons inserted, comments split off
//!     ↓
//! Parser (recursive descent) → typed tree (`syntax::ast`) with NodeIds
//! ```
//!
//! The tree is the only representation the instrumentation passes see; the
//! canonical printer in `syntax::formatter` turns it back into text.

#[allow(clippy::module_inception)]
mod parser;

mod lexer;
mod syntax_kind;

pub use lexer::{Lexer, RawComment, Token, Tokens, tokenize};
pub use parser::{ParseResult, SyntaxError, parse_file};
pub use syntax_kind::SyntaxKind;
