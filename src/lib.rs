//! # xtrace
//!
//! Source-to-source tracer for Go programs: copies a package to an output
//! directory, rewriting every source file so the program prints what it
//! executes (statements, variable values, calls and returns, branch and
//! case selection) to standard error.
//!
//! ## Module Structure (dependency order)
//!
//! ```text
//! pipeline    → Concurrent rewrite/copy of the resolved file set
//!   ↓
//! project     → go.mod discovery, package listing, file-set resolution
//!   ↓
//! instrument  → Context discovery, trace insertion, support library
//!   ↓
//! syntax      → Go AST, source buffers, visitor, canonical printer
//!   ↓
//! parser      → Logos lexer, recursive-descent Go parser
//!   ↓
//! base        → Primitives (Pos/Span, LineIndex, NodeId, constants)
//! ```

// ============================================================================
// MODULES (dependency order: base → parser → syntax → instrument → project → pipeline)
// ============================================================================

/// Foundation types: positions, line index, node ids, constants
pub mod base;

/// Parser: Logos lexer, recursive-descent parser for Go source files
pub mod parser;

/// Syntax: AST types, source buffers, traversal, printer
pub mod syntax;

/// Instrumentation: the rewrite pass and the generated support library
pub mod instrument;

/// Project resolution: which files make up the traced program
pub mod project;

/// Batch transformation of a resolved file set
pub mod pipeline;

/// Error types for every stage of a run
pub mod error;

// Re-export foundation types
pub use base::{LineCol, LineIndex, Pos, ResolutionMode, Span};

// Re-export the public surface of a run
pub use error::{
    BatchError, ConfigurationError, Error, FileError, ParseError, ResolutionError, Result,
};
pub use instrument::{
    DisplayOptions, InstrumentationConfig, Namespace, SupportLibrarySpec, TraceCategories,
    rewrite_file, rewrite_source,
};
pub use pipeline::{CopyOnlyFilter, TransformSummary, transform_tree, write_support_files};
pub use project::{FsLoader, GoListLoader, PackageLoader, ResolvedPackage, resolve_package};
