//! Package loading.
//!
//! Resolution needs, per package reachable from the target: its name, its
//! compiled source files, its `//go:embed` patterns and whether it belongs to
//! the main module. [`GoListLoader`] asks the host toolchain; [`FsLoader`]
//! reads the files directly and follows imports inside the main module.

use std::collections::{BTreeMap, VecDeque};
use std::path::{Component, Path, PathBuf};
use std::process::Command;

use rustc_hash::FxHashSet;
use serde::Deserialize;
use walkdir::WalkDir;

use crate::base::constants::{GO_EXT, GO_TEST_SUFFIX, LOOSE_PACKAGE_PATH};
use crate::error::ResolutionError;
use crate::parser::parse_file;

use super::manifest::find_manifest;

/// One loaded package
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadedPackage {
    pub import_path: String,
    pub name: String,
    pub dir: PathBuf,
    /// Absolute paths of the compiled `.go` files
    pub go_files: Vec<PathBuf>,
    /// Raw `//go:embed` patterns, relative to `dir`
    pub embed_patterns: Vec<String>,
    /// Part of the module being built, as opposed to a dependency
    pub main_module: bool,
}

/// Source of package metadata for resolution
pub trait PackageLoader: Send + Sync {
    /// Load the packages named by `patterns` and everything they import.
    ///
    /// Patterns are `.go` file paths (one synthetic package), directories, or
    /// directories followed by `/...`; relative ones are taken from `dir`.
    fn load(&self, dir: &Path, patterns: &[String]) -> Result<Vec<LoadedPackage>, ResolutionError>;
}

// ============================================================================
// HOST TOOLCHAIN
// ============================================================================

/// Loader backed by `go list -e -json -deps`
#[derive(Debug, Clone)]
pub struct GoListLoader {
    program: PathBuf,
}

impl Default for GoListLoader {
    fn default() -> Self {
        Self {
            program: PathBuf::from("go"),
        }
    }
}

impl GoListLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ListedPackage {
    #[serde(default)]
    dir: PathBuf,
    import_path: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    go_files: Vec<String>,
    #[serde(default)]
    embed_patterns: Vec<String>,
    #[serde(default)]
    module: Option<ListedModule>,
    #[serde(default)]
    error: Option<ListedError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ListedModule {
    #[serde(default)]
    main: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ListedError {
    err: String,
}

/// Decode the concatenated JSON objects `go list -json` prints
fn decode_listing(stdout: &[u8]) -> Result<Vec<LoadedPackage>, ResolutionError> {
    let mut packages = Vec::new();
    for listed in serde_json::Deserializer::from_slice(stdout).into_iter::<ListedPackage>() {
        let listed = listed.map_err(|e| ResolutionError::loader(format!("bad go list output: {e}")))?;
        if let Some(error) = listed.error {
            return Err(ResolutionError::loader(format!(
                "{}: {}",
                listed.import_path, error.err
            )));
        }
        let go_files = listed.go_files.iter().map(|f| listed.dir.join(f)).collect();
        packages.push(LoadedPackage {
            main_module: listed.module.is_some_and(|m| m.main),
            import_path: listed.import_path,
            name: listed.name,
            dir: listed.dir,
            go_files,
            embed_patterns: listed.embed_patterns,
        });
    }
    Ok(packages)
}

impl PackageLoader for GoListLoader {
    fn load(&self, dir: &Path, patterns: &[String]) -> Result<Vec<LoadedPackage>, ResolutionError> {
        tracing::trace!(dir = %dir.display(), ?patterns, "go list");
        let output = Command::new(&self.program)
            .args(["list", "-e", "-json", "-deps", "--"])
            .args(patterns)
            .current_dir(dir)
            .output()
            .map_err(|e| ResolutionError::loader(format!("failed to run {}: {e}", self.program.display())))?;
        if !output.status.success() {
            return Err(ResolutionError::loader(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }
        decode_listing(&output.stdout)
    }
}

// ============================================================================
// FILESYSTEM
// ============================================================================

/// Loader that reads package files directly.
///
/// Test files and files constrained by `//go:build ignore` are skipped.
/// Imports are followed only when they fall inside the module enclosing the
/// target; everything else is treated as an external dependency and left out.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsLoader;

impl FsLoader {
    pub fn new() -> Self {
        Self
    }
}

/// What one source file contributes to its package
#[derive(Debug, Default)]
struct ScannedFile {
    package: String,
    imports: Vec<String>,
    embeds: Vec<String>,
    ignored: bool,
}

fn scan_file(path: &Path) -> Result<ScannedFile, ResolutionError> {
    let text = std::fs::read_to_string(path).map_err(|e| ResolutionError::io(path, e))?;
    let file = parse_file(&text)
        .map_err(|e| ResolutionError::loader(format!("{}: {}", path.display(), e.message)))?;
    let ignored = file
        .doc
        .iter()
        .any(|c| c.text.strip_prefix("//go:build").is_some_and(|expr| expr.trim() == "ignore"));
    let embeds = text
        .lines()
        .filter_map(|line| line.trim_start().strip_prefix("//go:embed"))
        .filter(|rest| rest.starts_with(char::is_whitespace))
        .flat_map(split_embed_patterns)
        .collect();
    Ok(ScannedFile {
        package: file.package.name.to_string(),
        imports: file.imports().map(|i| i.path_value().to_string()).collect(),
        embeds,
        ignored,
    })
}

/// Split the argument of a `//go:embed` line into patterns; quoted patterns may hold spaces
fn split_embed_patterns(args: &str) -> Vec<String> {
    let mut patterns = Vec::new();
    let mut rest = args.trim();
    while !rest.is_empty() {
        let quote = rest.chars().next().filter(|c| *c == '"' || *c == '`');
        let (pattern, tail) = match quote.and_then(|q| rest[1..].find(q)) {
            Some(end) => (&rest[1..end + 1], &rest[end + 2..]),
            None => rest.split_at(rest.find(char::is_whitespace).unwrap_or(rest.len())),
        };
        patterns.push(pattern.to_string());
        rest = tail.trim_start();
    }
    patterns
}

fn is_package_source(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == GO_EXT)
        && !path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.ends_with(GO_TEST_SUFFIX))
}

/// Directories holding `.go` files at or below `root`; hidden, `_`-prefixed and `testdata` trees are skipped
fn package_dirs(root: &Path) -> Vec<PathBuf> {
    let mut dirs: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_entry(|entry| {
            entry.depth() == 0
                || !entry.file_type().is_dir()
                || !entry
                    .file_name()
                    .to_str()
                    .is_some_and(|name| name.starts_with('.') || name.starts_with('_') || name == "testdata")
        })
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file() && is_package_source(entry.path()))
        .filter_map(|entry| entry.path().parent().map(Path::to_path_buf))
        .collect();
    dirs.sort();
    dirs.dedup();
    dirs
}

/// `dir` joined with a relative pattern, dropping `.` components
fn join_pattern(dir: &Path, pattern: &str) -> PathBuf {
    let mut path = dir.to_path_buf();
    for component in Path::new(pattern).components() {
        if component != Component::CurDir {
            path.push(component);
        }
    }
    path
}

struct Walk {
    module: Option<(String, PathBuf)>,
    packages: BTreeMap<PathBuf, LoadedPackage>,
    queue: VecDeque<PathBuf>,
}

impl Walk {
    fn import_path(&self, dir: &Path) -> String {
        match &self.module {
            Some((module, root)) => match dir.strip_prefix(root) {
                Ok(rel) if rel.as_os_str().is_empty() => module.clone(),
                Ok(rel) => format!("{module}/{}", rel.to_string_lossy().replace('\\', "/")),
                Err(_) => dir.to_string_lossy().into_owned(),
            },
            None => dir.to_string_lossy().into_owned(),
        }
    }

    /// Directory of a main-module import, if `path` names one
    fn local_dir(&self, path: &str) -> Option<PathBuf> {
        let (module, root) = self.module.as_ref()?;
        if path == module {
            return Some(root.clone());
        }
        let rel = path.strip_prefix(module.as_str())?.strip_prefix('/')?;
        Some(root.join(rel))
    }

    /// Build the package made of `files`, queueing its main-module imports
    fn package(
        &mut self,
        dir: PathBuf,
        import_path: String,
        files: Vec<PathBuf>,
    ) -> Result<LoadedPackage, ResolutionError> {
        let mut package = LoadedPackage {
            import_path,
            dir: dir.clone(),
            main_module: true,
            ..LoadedPackage::default()
        };
        let mut imports = FxHashSet::default();
        for path in files {
            let scanned = scan_file(&path)?;
            if scanned.ignored {
                continue;
            }
            if package.name.is_empty() {
                package.name = scanned.package;
            } else if package.name != scanned.package {
                return Err(ResolutionError::MixedPackages {
                    dir,
                    first: package.name,
                    second: scanned.package,
                });
            }
            imports.extend(scanned.imports);
            package.embed_patterns.extend(scanned.embeds);
            package.go_files.push(path);
        }
        let mut imports: Vec<String> = imports.into_iter().collect();
        imports.sort();
        for import in imports {
            if let Some(dep) = self.local_dir(&import)
                && !self.packages.contains_key(&dep)
            {
                self.queue.push_back(dep);
            }
        }
        Ok(package)
    }

    fn add_dir(&mut self, dir: PathBuf) -> Result<(), ResolutionError> {
        if self.packages.contains_key(&dir) {
            return Ok(());
        }
        let entries = std::fs::read_dir(&dir).map_err(|e| ResolutionError::io(&dir, e))?;
        let mut files = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| ResolutionError::io(&dir, e))?.path();
            if path.is_file() && is_package_source(&path) {
                files.push(path);
            }
        }
        files.sort();
        let import_path = self.import_path(&dir);
        let package = self.package(dir.clone(), import_path, files)?;
        if !package.go_files.is_empty() {
            self.packages.insert(dir, package);
        }
        Ok(())
    }

    fn drain(&mut self) -> Result<(), ResolutionError> {
        while let Some(next) = self.queue.pop_front() {
            self.add_dir(next)?;
        }
        Ok(())
    }
}

impl PackageLoader for FsLoader {
    fn load(&self, dir: &Path, patterns: &[String]) -> Result<Vec<LoadedPackage>, ResolutionError> {
        let module = find_manifest(dir)?.map(|m| {
            let root = m.dir().to_path_buf();
            (m.module, root)
        });
        let mut walk = Walk {
            module,
            packages: BTreeMap::new(),
            queue: VecDeque::new(),
        };

        let (loose, dirs): (Vec<&String>, Vec<&String>) =
            patterns.iter().partition(|p| p.ends_with(&format!(".{GO_EXT}")));
        if !loose.is_empty() {
            let files: Vec<PathBuf> = loose.iter().map(|p| dir.join(p.as_str())).collect();
            let package_dir = files
                .first()
                .and_then(|f| f.parent())
                .map(Path::to_path_buf)
                .unwrap_or_else(|| dir.to_path_buf());
            let package = walk.package(package_dir, LOOSE_PACKAGE_PATH.to_string(), files)?;
            walk.drain()?;
            return Ok(std::iter::once(package)
                .chain(walk.packages.into_values())
                .collect());
        }
        for pattern in dirs {
            match pattern.strip_suffix("...") {
                Some(prefix) => {
                    for package_dir in package_dirs(&join_pattern(dir, prefix)) {
                        walk.add_dir(package_dir)?;
                    }
                }
                None => walk.add_dir(join_pattern(dir, pattern))?,
            }
        }
        walk.drain()?;
        Ok(walk.packages.into_values().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write(path: &Path, text: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, text).unwrap();
    }

    #[test]
    fn test_split_embed_patterns() {
        assert_eq!(
            split_embed_patterns(" a.txt  \"b c.txt\" `d` static/*"),
            vec!["a.txt", "b c.txt", "d", "static/*"]
        );
        assert!(split_embed_patterns("   ").is_empty());
    }

    #[test]
    fn test_decode_listing() {
        let stdout = br#"{"Dir": "/m/lib", "ImportPath": "example.com/m/lib", "Name": "lib", "GoFiles": ["a.go"], "Module": {"Path": "example.com/m", "Main": true}}
{"Dir": "/go/fmt", "ImportPath": "fmt", "Name": "fmt", "GoFiles": ["print.go"], "Standard": true}"#;
        let packages = decode_listing(stdout).unwrap();
        assert_eq!(packages.len(), 2);
        assert_eq!(packages[0].go_files, vec![PathBuf::from("/m/lib/a.go")]);
        assert!(packages[0].main_module);
        assert!(!packages[1].main_module);
    }

    #[test]
    fn test_decode_listing_reports_package_errors() {
        let stdout = br#"{"ImportPath": "example.com/m/bad", "Error": {"Err": "no Go files"}}"#;
        let err = decode_listing(stdout).unwrap_err();
        assert!(err.to_string().contains("no Go files"));
    }

    #[test]
    fn test_fs_loader_follows_module_imports() {
        let root = tempfile::tempdir().unwrap();
        write(&root.path().join("go.mod"), "module example.com/m\n");
        write(
            &root.path().join("cmd/app/main.go"),
            "package main\n\nimport (\n\t\"fmt\"\n\t\"example.com/m/lib\"\n)\n\nfunc main() { fmt.Println(lib.X) }\n",
        );
        write(&root.path().join("cmd/app/main_test.go"), "package main\n");
        write(
            &root.path().join("lib/lib.go"),
            "package lib\n\nimport _ \"embed\"\n\n//go:embed data.txt\nvar X string\n",
        );
        write(&root.path().join("lib/data.txt"), "hi");
        write(
            &root.path().join("lib/gen.go"),
            "//go:build ignore\n\npackage other\n",
        );

        let packages = FsLoader::new()
            .load(&root.path().join("cmd/app"), &[".".to_string()])
            .unwrap();
        assert_eq!(packages.len(), 2);
        let app = packages.iter().find(|p| p.name == "main").unwrap();
        assert_eq!(app.import_path, "example.com/m/cmd/app");
        assert_eq!(app.go_files.len(), 1);
        let lib = packages.iter().find(|p| p.name == "lib").unwrap();
        assert_eq!(lib.embed_patterns, vec!["data.txt"]);
        assert_eq!(lib.go_files, vec![root.path().join("lib/lib.go")]);
    }

    #[test]
    fn test_fs_loader_rejects_mixed_packages() {
        let root = tempfile::tempdir().unwrap();
        write(&root.path().join("a.go"), "package a\n");
        write(&root.path().join("b.go"), "package b\n");
        let err = FsLoader::new()
            .load(root.path(), &[".".to_string()])
            .unwrap_err();
        assert!(matches!(err, ResolutionError::MixedPackages { .. }));
    }

    #[test]
    fn test_fs_loader_recursive_pattern() {
        let root = tempfile::tempdir().unwrap();
        write(&root.path().join("one/main.go"), "package main\n");
        write(&root.path().join("two/main.go"), "package main\n");
        write(&root.path().join("testdata/x.go"), "package broken\n");
        let packages = FsLoader::new()
            .load(root.path(), &["./...".to_string()])
            .unwrap();
        assert_eq!(packages.len(), 2);
        assert!(packages.iter().all(|p| p.name == "main"));
    }
}
