//! How the unit of work was named on the command line.

use std::fmt;

/// Resolution mode of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ResolutionMode {
    /// Explicit `.go` files from one directory; output is a standalone module
    #[default]
    LooseFiles,
    /// A package directory inside a module
    ModuleDirectory,
}

impl ResolutionMode {
    pub fn is_loose(self) -> bool {
        self == Self::LooseFiles
    }
}

impl fmt::Display for ResolutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::LooseFiles => "command-line-arguments",
            Self::ModuleDirectory => "package-directory",
        })
    }
}
