//! Package resolution: from the command-line package argument to the set of
//! files a run transforms.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use rustc_hash::FxHashSet;
use walkdir::WalkDir;

use crate::base::ResolutionMode;
use crate::base::constants::{GO_EXT, LOOSE_PACKAGE_PATH, MAIN_PACKAGE};
use crate::error::ResolutionError;

use super::loader::{LoadedPackage, PackageLoader};
use super::manifest::{Manifest, find_manifest};

/// Everything a run needs to know about its input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPackage {
    pub mode: ResolutionMode,
    /// Sorted, deduplicated absolute paths
    pub files: Vec<PathBuf>,
    /// Output paths are computed relative to this directory
    pub root: PathBuf,
    /// Directory of the loose files or the named package
    pub package_dir: PathBuf,
    pub manifest: Option<Manifest>,
}

impl ResolvedPackage {
    /// Declared module path, if a manifest was found
    pub fn module(&self) -> Option<&str> {
        self.manifest.as_ref().map(|m| m.module.as_str())
    }
}

/// Split a package argument and decide its resolution mode.
///
/// The argument is split on `,`; it names loose files when every part ends in
/// `.go`, otherwise a package directory (only the first part is used).
pub fn classify(arg: &str) -> (ResolutionMode, Vec<String>) {
    let parts: Vec<String> = arg
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(String::from)
        .collect();
    let suffix = format!(".{GO_EXT}");
    if !parts.is_empty() && parts.iter().all(|p| p.ends_with(&suffix)) {
        (ResolutionMode::LooseFiles, parts)
    } else {
        (ResolutionMode::ModuleDirectory, parts.into_iter().take(1).collect())
    }
}

/// Resolve `arg` into the files of exactly one program
pub fn resolve_package(
    arg: &str,
    loader: &dyn PackageLoader,
) -> Result<ResolvedPackage, ResolutionError> {
    let (mode, parts) = classify(arg);
    if parts.is_empty() {
        return Err(ResolutionError::NoPackage);
    }
    let resolved = match mode {
        ResolutionMode::LooseFiles => resolve_loose(&parts, loader)?,
        ResolutionMode::ModuleDirectory => resolve_directory(&parts[0], loader)?,
    };
    tracing::info!(
        mode = %resolved.mode,
        files = resolved.files.len(),
        root = %resolved.root.display(),
        "resolved package"
    );
    Ok(resolved)
}

fn absolute(path: &Path) -> Result<PathBuf, ResolutionError> {
    std::path::absolute(path).map_err(|e| ResolutionError::io(path, e))
}

fn resolve_loose(
    parts: &[String],
    loader: &dyn PackageLoader,
) -> Result<ResolvedPackage, ResolutionError> {
    let mut files = Vec::with_capacity(parts.len());
    let mut dirs = FxHashSet::default();
    for part in parts {
        let file = absolute(Path::new(part))?;
        let meta = std::fs::metadata(&file).map_err(|e| ResolutionError::io(&file, e))?;
        if !meta.is_file() {
            return Err(ResolutionError::NotAFile(file));
        }
        if let Some(dir) = file.parent() {
            dirs.insert(dir.to_path_buf());
        }
        files.push(file);
    }
    if dirs.len() != 1 {
        return Err(ResolutionError::MixedDirectories);
    }
    let package_dir = dirs.into_iter().next().ok_or(ResolutionError::NoPackage)?;
    let manifest = find_manifest(&package_dir)?;
    let patterns: Vec<String> = files
        .iter()
        .map(|f| f.to_string_lossy().into_owned())
        .collect();
    let packages = loader.load(&package_dir, &patterns)?;
    let files = collect_files(&packages)?;
    Ok(ResolvedPackage {
        mode: ResolutionMode::LooseFiles,
        files,
        root: package_dir.clone(),
        package_dir,
        manifest,
    })
}

fn resolve_directory(
    part: &str,
    loader: &dyn PackageLoader,
) -> Result<ResolvedPackage, ResolutionError> {
    let (dir, recursive) = match part.strip_suffix("...") {
        Some(prefix) => (prefix.trim_end_matches('/'), true),
        None => (part, false),
    };
    let dir = if dir.is_empty() { "." } else { dir };
    let package_dir = absolute(Path::new(dir))?;
    if !package_dir.is_dir() {
        return Err(ResolutionError::io(
            &package_dir,
            std::io::Error::new(std::io::ErrorKind::NotFound, "not a directory"),
        ));
    }
    let manifest = find_manifest(&package_dir)?
        .ok_or_else(|| ResolutionError::ManifestNotFound(package_dir.clone()))?;
    let pattern = if recursive { "./..." } else { "." };
    let packages = loader.load(&package_dir, &[pattern.to_string()])?;
    let mut files = collect_files(&packages)?;
    files.push(manifest.path.clone());
    files.extend(manifest.sum_file());
    files.sort();
    files.dedup();
    Ok(ResolvedPackage {
        mode: ResolutionMode::ModuleDirectory,
        files,
        root: manifest.dir().to_path_buf(),
        package_dir,
        manifest: Some(manifest),
    })
}

/// Source and embedded files of the main module; fails unless exactly one package is `main`
fn collect_files(packages: &[LoadedPackage]) -> Result<Vec<PathBuf>, ResolutionError> {
    let mut files = BTreeSet::new();
    let mut entry_points = BTreeSet::new();
    for package in packages {
        if package.name == MAIN_PACKAGE {
            entry_points.insert(package.import_path.as_str());
        }
        if package.import_path != LOOSE_PACKAGE_PATH && !package.main_module {
            continue;
        }
        tracing::trace!(package = %package.import_path, files = package.go_files.len(), "collecting");
        files.extend(package.go_files.iter().cloned());
        for pattern in &package.embed_patterns {
            files.extend(expand_embed(&package.dir, pattern)?);
        }
    }
    match entry_points.len() {
        0 => Err(ResolutionError::NoEntryPoint),
        1 => Ok(files.into_iter().collect()),
        count => Err(ResolutionError::MultipleEntryPoints { count }),
    }
}

/// Files matched by an embed pattern; a matched directory contributes every file beneath it
pub fn expand_embed(dir: &Path, pattern: &str) -> Result<Vec<PathBuf>, ResolutionError> {
    let pattern_str = pattern.strip_prefix("all:").unwrap_or(pattern);
    let full = format!(
        "{}/{}",
        glob::Pattern::escape(&dir.to_string_lossy()),
        pattern_str
    );
    let matches = glob::glob(&full).map_err(|_| ResolutionError::InvalidEmbedPattern {
        pattern: pattern.to_string(),
    })?;
    let mut files = Vec::new();
    for entry in matches {
        let path = entry.map_err(|e| {
            let path = e.path().to_path_buf();
            ResolutionError::io(path, std::io::Error::other(e))
        })?;
        if path.is_dir() {
            for entry in WalkDir::new(&path).sort_by_file_name() {
                let entry = entry.map_err(|e| {
                    let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| path.clone());
                    ResolutionError::io(path, std::io::Error::other(e))
                })?;
                if entry.file_type().is_file() {
                    files.push(entry.into_path());
                }
            }
        } else {
            files.push(path);
        }
    }
    Ok(files)
}
