//! Foundation types for the xtrace toolchain.
//!
//! This module provides fundamental types used throughout the crate:
//! - [`Pos`], [`Span`] - 1-based byte positions of syntax nodes
//! - [`LineCol`], [`LineIndex`] - Line/column conversion
//! - [`NodeId`] - Stable per-node identifiers assigned while parsing
//! - [`ResolutionMode`] - Loose files vs. module directory
//! - Domain constants (file suffixes, generated-name prefix)
//!
//! This module has NO dependencies on other xtrace modules.

pub mod constants;
mod line_index;
mod mode;
mod node_id;
mod position;

pub use line_index::LineIndex;
pub use mode::ResolutionMode;
pub use node_id::{NodeId, NodeIdGen};
pub use position::{LineCol, Pos, Span};
