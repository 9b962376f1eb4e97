//! Project resolution: which files make up the program being traced.
//!
//! - [`manifest`] finds and reads `go.mod`
//! - [`loader`] lists packages, through the host toolchain or the filesystem
//! - [`resolver`] classifies the package argument and builds the file set

pub mod loader;
pub mod manifest;
pub mod resolver;

pub use loader::{FsLoader, GoListLoader, LoadedPackage, PackageLoader};
pub use manifest::{Manifest, find_manifest, parse_module_path};
pub use resolver::{ResolvedPackage, classify, expand_embed, resolve_package};
