//! Instrumentation: turning a parsed Go file into a traced one
//!
//! ## Architecture
//!
//! ```text
//! SourceUnit (buffer + tree)
//!     ↓
//! context::discover → ContextMap (NodeId → ConstructDescriptor)
//!     ↓
//! rewrite::Rewriter → tree mutated in place, Linkage accumulated
//!     ↓
//! syntax::print_file → rewritten source text
//! ```
//!
//! [`hygiene`] names everything generated; [`library`] renders the Go runtime
//! the inserted calls link against; [`builder`] produces the calls themselves.

pub mod builder;
pub mod config;
pub mod context;
pub mod hygiene;
pub mod library;
pub mod normalize;
pub mod rewrite;


pub use builder::{TraceBuilder, TraceCall};
pub use config::{DisplayOptions, InstrumentationConfig, TraceCategories};
pub use context::{ConstructDescriptor, ContextMap, discover};
pub use hygiene::{Namespace, Primitive, clock_seed, generate_token};
pub use library::{SupportLibrarySpec, generate_go_mod, generate_support_library};
pub use rewrite::{Linkage, Rewriter, add_import};

use crate::error::ParseError;
use crate::syntax::{SourceUnit, print_file};

/// Result of rewriting one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewritten {
    pub text: String,
    pub linkage: Linkage,
}

/// Parse, instrument and print one file.
///
/// `filename` is the name traces report and errors carry.
pub fn rewrite_source(
    config: &InstrumentationConfig,
    filename: &str,
    bytes: &[u8],
) -> Result<Rewritten, ParseError> {
    let (path, source, mut file) = SourceUnit::parse(filename, bytes)?.into_parts();
    let contexts = discover(&file, &config.namespace);
    let linkage = Rewriter::new(config, &source, &path, &contexts).rewrite_file(&mut file);
    tracing::debug!(
        file = %path,
        constructs = contexts.len(),
        insertions = linkage.insertions,
        "rewrote file"
    );
    Ok(Rewritten {
        text: print_file(&file),
        linkage,
    })
}

/// [`rewrite_source`] returning only the rewritten bytes
pub fn rewrite_file(
    config: &InstrumentationConfig,
    filename: &str,
    bytes: &[u8],
) -> Result<Vec<u8>, ParseError> {
    rewrite_source(config, filename, bytes).map(|rewritten| rewritten.text.into_bytes())
}
