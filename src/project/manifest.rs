//! Module manifest (`go.mod`) discovery.

use std::path::{Path, PathBuf};

use crate::base::constants::{GO_MOD, GO_SUM};
use crate::error::ResolutionError;

/// A `go.mod` file and the module path it declares
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    pub path: PathBuf,
    pub module: String,
}

impl Manifest {
    /// Read and parse the manifest at `path`
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, ResolutionError> {
        let path = path.into();
        let text = std::fs::read_to_string(&path).map_err(|e| ResolutionError::io(&path, e))?;
        match parse_module_path(&text) {
            Some(module) => Ok(Self { path, module }),
            None => Err(ResolutionError::InvalidManifest(path)),
        }
    }

    /// Directory the module is rooted at
    pub fn dir(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new("."))
    }

    /// The checksum file next to the manifest, if there is one
    pub fn sum_file(&self) -> Option<PathBuf> {
        let sum = self.dir().join(GO_SUM);
        sum.is_file().then_some(sum)
    }
}

/// Module path declared by manifest `text`.
///
/// Accepts `module path`, `module "path"` and the parenthesized block form;
/// `//` comments are ignored.
pub fn parse_module_path(text: &str) -> Option<String> {
    let mut lines = text.lines().map(strip_comment);
    while let Some(line) = lines.next() {
        let Some(rest) = line.strip_prefix("module") else {
            continue;
        };
        if !rest.starts_with(|c: char| c.is_whitespace() || c == '(' || c == '"') {
            continue;
        }
        let rest = rest.trim();
        let path = if rest == "(" {
            lines.by_ref().map(str::trim).find(|l| !l.is_empty())?
        } else {
            rest.strip_prefix('(')
                .map(|inner| inner.trim_end_matches(')').trim())
                .unwrap_or(rest)
        };
        let path = unquote(path);
        return (!path.is_empty() && path != ")").then(|| path.to_string());
    }
    None
}

fn strip_comment(line: &str) -> &str {
    let line = line.trim();
    match line.find("//") {
        Some(i) => line[..i].trim_end(),
        None => line,
    }
}

fn unquote(s: &str) -> &str {
    s.strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .or_else(|| s.strip_prefix('`').and_then(|s| s.strip_suffix('`')))
        .unwrap_or(s)
}

/// Walk from `start` up to the filesystem root looking for a manifest
pub fn find_manifest(start: &Path) -> Result<Option<Manifest>, ResolutionError> {
    for dir in start.ancestors() {
        let candidate = dir.join(GO_MOD);
        match std::fs::metadata(&candidate) {
            Ok(meta) if meta.is_file() => {
                tracing::trace!(manifest = %candidate.display(), "found module manifest");
                return Manifest::load(candidate).map(Some);
            }
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(ResolutionError::io(candidate, e)),
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_module_path_forms() {
        assert_eq!(
            parse_module_path("module example.com/app\n\ngo 1.21\n").as_deref(),
            Some("example.com/app")
        );
        assert_eq!(
            parse_module_path("// header\nmodule \"example.com/q\" // trailing\n").as_deref(),
            Some("example.com/q")
        );
        assert_eq!(
            parse_module_path("module (\n\texample.com/block\n)\n").as_deref(),
            Some("example.com/block")
        );
    }

    #[test]
    fn test_parse_module_path_missing() {
        assert_eq!(parse_module_path("go 1.21\n"), None);
        assert_eq!(parse_module_path("module\n"), None);
        assert_eq!(parse_module_path("modules x\n"), None);
    }

    #[test]
    fn test_find_manifest_walks_up() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(GO_MOD), "module example.com/m\n").unwrap();
        let nested = dir.path().join("cmd").join("tool");
        std::fs::create_dir_all(&nested).unwrap();

        let manifest = find_manifest(&nested).unwrap().unwrap();
        assert_eq!(manifest.module, "example.com/m");
        assert_eq!(manifest.dir(), dir.path());
        assert_eq!(manifest.sum_file(), None);
    }

    #[test]
    fn test_manifest_without_module_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(GO_MOD), "go 1.21\n").unwrap();
        assert!(matches!(
            find_manifest(dir.path()),
            Err(ResolutionError::InvalidManifest(_))
        ));
    }
}
