//! File transformation pipeline.
//!
//! Every resolved file is either rewritten or copied verbatim into the output
//! tree, one rayon task per file. The batch is fail-fast: the first file error
//! stops the remaining work and is returned; whatever was already written
//! stays on disk.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use rayon::prelude::*;
use regex::Regex;

use crate::base::constants::GO_EXT;
use crate::error::{BatchError, ConfigurationError, FileError};
use crate::instrument::{InstrumentationConfig, SupportLibrarySpec, rewrite_file};

/// Decides which `.go` files are copied instead of rewritten
#[derive(Debug, Clone, Default)]
pub struct CopyOnlyFilter {
    copy_only: Vec<Regex>,
    copy_only_not: Option<Regex>,
}

impl CopyOnlyFilter {
    /// `copy_only`: copy files matching any of these; `copy_only_not`: copy files not matching it
    pub fn new(copy_only: &[String], copy_only_not: Option<&str>) -> Result<Self, ConfigurationError> {
        let compile = |pattern: &str| {
            Regex::new(pattern).map_err(|source| ConfigurationError::InvalidPattern {
                pattern: pattern.to_string(),
                source,
            })
        };
        Ok(Self {
            copy_only: copy_only
                .iter()
                .map(|p| compile(p))
                .collect::<Result<_, _>>()?,
            copy_only_not: copy_only_not.map(compile).transpose()?,
        })
    }

    pub fn is_copy_only(&self, path: &str) -> bool {
        self.copy_only_not.as_ref().is_some_and(|re| !re.is_match(path))
            || self.copy_only.iter().any(|re| re.is_match(path))
    }
}

/// Counts of a finished batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransformSummary {
    pub rewritten: usize,
    pub copied: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Rewritten,
    Copied,
}

/// Rewrite or copy every file of `files` from under `root` to the same relative place under `output_root`
pub fn transform_tree(
    config: &InstrumentationConfig,
    root: &Path,
    files: &[PathBuf],
    output_root: &Path,
    filter: &CopyOnlyFilter,
) -> Result<TransformSummary, BatchError> {
    let rewritten = AtomicUsize::new(0);
    let copied = AtomicUsize::new(0);
    files.par_iter().try_for_each(|file| {
        let outcome = transform_file(config, root, file, output_root, filter).map_err(|source| {
            BatchError {
                path: file.clone(),
                source,
            }
        })?;
        let counter = match outcome {
            Outcome::Rewritten => &rewritten,
            Outcome::Copied => &copied,
        };
        counter.fetch_add(1, Ordering::Relaxed);
        Ok(())
    })?;
    let summary = TransformSummary {
        rewritten: rewritten.into_inner(),
        copied: copied.into_inner(),
    };
    tracing::info!(
        rewritten = summary.rewritten,
        copied = summary.copied,
        output = %output_root.display(),
        "transformed files"
    );
    Ok(summary)
}

fn transform_file(
    config: &InstrumentationConfig,
    root: &Path,
    file: &Path,
    output_root: &Path,
    filter: &CopyOnlyFilter,
) -> Result<Outcome, FileError> {
    let relative = file.strip_prefix(root).map_err(|_| FileError::OutsideRoot {
        path: file.to_path_buf(),
        root: root.to_path_buf(),
    })?;
    let destination = output_root.join(relative);
    let permissions = fs::metadata(file)
        .map_err(|e| FileError::read(file, e))?
        .permissions();
    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent).map_err(|e| FileError::write(parent, e))?;
    }

    let is_source = file.extension().is_some_and(|ext| ext == GO_EXT);
    let outcome = if is_source && !filter.is_copy_only(&file.to_string_lossy()) {
        let bytes = fs::read(file).map_err(|e| FileError::read(file, e))?;
        let name = relative.to_string_lossy().replace('\\', "/");
        let output = rewrite_file(config, &name, &bytes)?;
        fs::write(&destination, output).map_err(|e| FileError::write(&destination, e))?;
        tracing::debug!(from = %file.display(), to = %destination.display(), "rewrite");
        Outcome::Rewritten
    } else {
        fs::copy(file, &destination).map_err(|e| FileError::write(&destination, e))?;
        tracing::debug!(from = %file.display(), to = %destination.display(), "copy");
        Outcome::Copied
    };
    fs::set_permissions(&destination, permissions)
        .map_err(|e| FileError::write(&destination, e))?;
    Ok(outcome)
}

/// Write the support library, plus a module manifest for loose-file runs; returns the written paths
pub fn write_support_files(
    config: &InstrumentationConfig,
    output_root: &Path,
) -> Result<Vec<PathBuf>, FileError> {
    let library = SupportLibrarySpec::new(&config.namespace);
    let mut outputs = vec![(output_root.join(&library.path), library.render())];
    if let Some((path, text)) = SupportLibrarySpec::manifest(&config.namespace) {
        outputs.push((output_root.join(path), text));
    }
    let mut written = Vec::with_capacity(outputs.len());
    for (path, text) in outputs {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| FileError::write(parent, e))?;
        }
        fs::write(&path, text).map_err(|e| FileError::write(&path, e))?;
        tracing::debug!(path = %path.display(), "add");
        written.push(path);
    }
    Ok(written)
}
