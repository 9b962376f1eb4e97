//! Error types for resolution, rewriting and the file batch.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::base::LineCol;

/// A source file that could not be parsed. Aborts that file only.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{path}:{location}: {message}")]
pub struct ParseError {
    pub path: String,
    pub location: LineCol,
    pub message: String,
}

impl ParseError {
    pub fn new(path: impl Into<String>, location: LineCol, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            location,
            message: message.into(),
        }
    }
}

/// The package argument could not be turned into a file set.
#[derive(Debug, Error)]
pub enum ResolutionError {
    /// No package argument was given.
    #[error("no package specified")]
    NoPackage,

    /// A loose-file argument names something other than a regular file.
    #[error("all files must be .go files, got directory {0}")]
    NotAFile(PathBuf),

    /// Loose files spread over more than one directory.
    #[error("all files must be in the same directory")]
    MixedDirectories,

    /// No `main` package among the loaded packages.
    #[error("no entry point: main packages must be exactly one, got 0")]
    NoEntryPoint,

    /// More than one `main` package among the loaded packages.
    #[error("multiple entry points: main packages must be exactly one, got {count}")]
    MultipleEntryPoints { count: usize },

    /// One directory holds files of different packages.
    #[error("found packages {first} and {second} in {dir}")]
    MixedPackages {
        dir: PathBuf,
        first: String,
        second: String,
    },

    /// Module-directory mode needs a manifest somewhere above the target.
    #[error("go.mod not found for {0}")]
    ManifestNotFound(PathBuf),

    /// The manifest has no usable `module` directive.
    #[error("invalid module in {0}")]
    InvalidManifest(PathBuf),

    /// An embedding directive pattern is not a valid glob.
    #[error("invalid embed pattern: {pattern:?}")]
    InvalidEmbedPattern { pattern: String },

    /// The package loader failed.
    #[error("failed to load packages: {0}")]
    Loader(String),

    /// IO error while inspecting the target.
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ResolutionError {
    /// Create an IO error for `path`.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a loader error.
    pub fn loader(message: impl Into<String>) -> Self {
        Self::Loader(message.into())
    }
}

/// Invalid user-supplied settings, detected before any rewriting starts.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("failed to compile regexp '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("invalid namespace token {0:?}")]
    InvalidToken(String),
}

/// Failure while transforming one file of the batch.
#[derive(Debug, Error)]
pub enum FileError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{path} is not under {root}")]
    OutsideRoot { path: PathBuf, root: PathBuf },

    #[error("failed to rewrite file: {0}")]
    Parse(#[from] ParseError),
}

impl FileError {
    pub fn read(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Read {
            path: path.into(),
            source,
        }
    }

    pub fn write(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Write {
            path: path.into(),
            source,
        }
    }
}

/// The first file-level failure of a concurrent batch.
#[derive(Debug, Error)]
#[error("failed to transform {path}: {source}")]
pub struct BatchError {
    pub path: PathBuf,
    #[source]
    pub source: FileError,
}

/// Any failure of a run.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    File(#[from] FileError),

    #[error(transparent)]
    Batch(#[from] BatchError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
