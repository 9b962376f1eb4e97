//! Go syntax: the typed tree, source buffers, traversal and the printer
pub mod ast;
pub mod formatter;
pub mod source;
pub mod visit;

pub use formatter::{format_source, print_file};
pub use source::{SourceText, SourceUnit};
pub use visit::Visitor;
