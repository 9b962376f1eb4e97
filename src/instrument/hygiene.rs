//! Identifier hygiene: the run-unique namespace token and every name derived from it.
//!
//! Generated identifiers (the print primitives, the support package, the
//! synthesized result names) all carry the token so they cannot collide with
//! names in the instrumented program or with another run's output.

use std::time::{SystemTime, UNIX_EPOCH};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use smol_str::{SmolStr, format_smolstr};

use crate::base::ResolutionMode;
use crate::base::constants::{MAIN_PACKAGE, NAMESPACE_PREFIX, TOKEN_ALPHABET, TOKEN_LEN};
use crate::error::ConfigurationError;

/// Generate a token from `seed`; the same seed always yields the same token
pub fn generate_token(seed: u64) -> SmolStr {
    let mut rng = StdRng::seed_from_u64(seed);
    let token: String = (0..TOKEN_LEN)
        .map(|_| char::from(TOKEN_ALPHABET[rng.gen_range(0..TOKEN_ALPHABET.len())]))
        .collect();
    SmolStr::new(token)
}

/// Seed used when none is given: seconds since the epoch
pub fn clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

/// Whether `name` is a valid Go identifier
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first == '_' || unicode_ident::is_xid_start(first) => {
            chars.all(unicode_ident::is_xid_continue)
        }
        _ => false,
    }
}

/// The four runtime entry points of the support library
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    Statement,
    Variable,
    Call,
    Return,
}

impl Primitive {
    fn stem(self) -> &'static str {
        match self {
            Self::Statement => "PrintlnStatement",
            Self::Variable => "PrintlnVariable",
            Self::Call => "PrintlnCall",
            Self::Return => "PrintlnReturn",
        }
    }
}

/// Token plus the resolution facts that decide how generated code is linked
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Namespace {
    token: SmolStr,
    mode: ResolutionMode,
    module: Option<String>,
}

impl Namespace {
    /// Use an explicit token; it must keep every derived name a valid identifier
    pub fn new(token: impl Into<SmolStr>, mode: ResolutionMode) -> Result<Self, ConfigurationError> {
        let token = token.into();
        if token.is_empty() || !is_identifier(&format!("{NAMESPACE_PREFIX}_{token}")) {
            return Err(ConfigurationError::InvalidToken(token.to_string()));
        }
        Ok(Self {
            token,
            mode,
            module: None,
        })
    }

    pub fn from_seed(seed: u64, mode: ResolutionMode) -> Self {
        Self {
            token: generate_token(seed),
            mode,
            module: None,
        }
    }

    pub fn with_module(mut self, module: impl Into<String>) -> Self {
        self.module = Some(module.into());
        self
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn mode(&self) -> ResolutionMode {
        self.mode
    }

    pub fn module(&self) -> Option<&str> {
        self.module.as_deref()
    }

    /// `xtrace_<token>`: support package directory and, in module mode, its package name
    pub fn library_name(&self) -> SmolStr {
        format_smolstr!("{NAMESPACE_PREFIX}_{}", self.token)
    }

    /// Package clause of the generated library
    pub fn library_package(&self) -> SmolStr {
        match self.mode {
            ResolutionMode::LooseFiles => SmolStr::new_static(MAIN_PACKAGE),
            ResolutionMode::ModuleDirectory => self.library_name(),
        }
    }

    pub fn library_file_name(&self) -> String {
        format!("{}.go", self.library_name())
    }

    /// Import path of the library; loose files share its package and need none
    pub fn import_path(&self) -> Option<String> {
        match (self.mode, &self.module) {
            (ResolutionMode::LooseFiles, _) => None,
            (ResolutionMode::ModuleDirectory, Some(module)) => {
                Some(format!("{}/{}", module.trim_end_matches('/'), self.library_name()))
            }
            (ResolutionMode::ModuleDirectory, None) => Some(self.library_name().to_string()),
        }
    }

    /// Package qualifier for primitive calls, if any
    pub fn qualifier(&self) -> Option<SmolStr> {
        match self.mode {
            ResolutionMode::LooseFiles => None,
            ResolutionMode::ModuleDirectory => Some(self.library_name()),
        }
    }

    pub fn primitive_name(&self, primitive: Primitive) -> SmolStr {
        format_smolstr!("{}_{}", primitive.stem(), self.token)
    }

    /// Name given to an unnamed or blank result slot (1-based across all slots)
    pub fn result_name(&self, ordinal: usize) -> SmolStr {
        format_smolstr!("return_{ordinal}_{}", self.token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_is_deterministic_per_seed() {
        assert_eq!(generate_token(42), generate_token(42));
        assert_ne!(generate_token(1), generate_token(2));
    }

    #[test]
    fn test_token_shape() {
        let token = generate_token(7);
        assert_eq!(token.len(), TOKEN_LEN);
        assert!(token.bytes().all(|b| b.is_ascii_lowercase()));
    }

    #[test]
    fn test_is_identifier() {
        assert!(is_identifier("xtrace_abc"));
        assert!(is_identifier("_x1"));
        assert!(is_identifier("π"));
        assert!(!is_identifier("1x"));
        assert!(!is_identifier("a-b"));
        assert!(!is_identifier(""));
    }

    #[test]
    fn test_explicit_token_is_validated() {
        assert!(Namespace::new("abcdefgh", ResolutionMode::LooseFiles).is_ok());
        assert!(Namespace::new("", ResolutionMode::LooseFiles).is_err());
        assert!(Namespace::new("a b", ResolutionMode::LooseFiles).is_err());
    }

    #[test]
    fn test_loose_names() {
        let ns = Namespace::new("abcdefgh", ResolutionMode::LooseFiles).unwrap();
        assert_eq!(ns.library_package(), "main");
        assert_eq!(ns.library_file_name(), "xtrace_abcdefgh.go");
        assert_eq!(ns.import_path(), None);
        assert_eq!(ns.qualifier(), None);
        assert_eq!(ns.primitive_name(Primitive::Variable), "PrintlnVariable_abcdefgh");
        assert_eq!(ns.result_name(2), "return_2_abcdefgh");
    }

    #[test]
    fn test_module_names() {
        let ns = Namespace::new("abcdefgh", ResolutionMode::ModuleDirectory)
            .unwrap()
            .with_module("example.com/app");
        assert_eq!(ns.library_package(), "xtrace_abcdefgh");
        assert_eq!(
            ns.import_path().as_deref(),
            Some("example.com/app/xtrace_abcdefgh")
        );
        assert_eq!(ns.qualifier().as_deref(), Some("xtrace_abcdefgh"));
    }
}
