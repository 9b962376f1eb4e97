//! Domain constants shared across the crate.

/// Recognized source suffix
pub const GO_EXT: &str = "go";

/// Suffix of test sources, never part of a program
pub const GO_TEST_SUFFIX: &str = "_test.go";

/// Module manifest file name
pub const GO_MOD: &str = "go.mod";

/// Module checksum file living next to the manifest
pub const GO_SUM: &str = "go.sum";

/// The blank identifier
pub const BLANK: &str = "_";

/// Package name of the program entry point
pub const MAIN_PACKAGE: &str = "main";

/// Package path the toolchain assigns to loose files
pub const LOOSE_PACKAGE_PATH: &str = "command-line-arguments";

/// Prefix of every generated identifier and of the support package
pub const NAMESPACE_PREFIX: &str = "xtrace";

/// Length of the run-unique namespace token
pub const TOKEN_LEN: usize = 8;

/// Alphabet of the namespace token
pub const TOKEN_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz";

/// Default display width of one trace line
pub const DEFAULT_LINE_WIDTH: usize = 80;

/// Columns a tab expands to in statement traces
pub const TAB_WIDTH: usize = 4;
