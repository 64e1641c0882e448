//! Filesystem utilities.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use glob::glob;

/// Ensure a directory exists, creating it if necessary.
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)
            .with_context(|| format!("failed to create directory: {}", path.display()))?;
    }
    Ok(())
}

/// Read a file to string, with nice error messages.
pub fn read_to_string(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read file: {}", path.display()))
}

/// Write a string to a file, creating parent directories if needed.
pub fn write_string(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    fs::write(path, contents).with_context(|| format!("failed to write file: {}", path.display()))
}

/// Match a glob pattern under each of the given directories.
///
/// Relative directories are joined onto `root`; absolute directories are
/// used as-is. Matches under a relative directory are returned relative to
/// `base` when one is given; matches under an absolute directory keep their
/// absolute path.
pub fn match_files(
    root: &Path,
    dirs: &[PathBuf],
    pattern: &str,
    base: Option<&Path>,
) -> Result<BTreeSet<PathBuf>> {
    let mut result = BTreeSet::new();

    for dir in dirs {
        let search_dir = if dir.is_absolute() {
            dir.clone()
        } else {
            root.join(dir)
        };

        let full_pattern = search_dir.join(pattern);
        let pattern_str = full_pattern.to_string_lossy();

        for entry in
            glob(&pattern_str).with_context(|| format!("invalid glob pattern: {}", pattern))?
        {
            match entry {
                Ok(path) => {
                    if !path.is_file() {
                        continue;
                    }
                    let path = match base {
                        Some(base) if !dir.is_absolute() => relative_path(base, &path),
                        _ => path,
                    };
                    result.insert(path);
                }
                Err(e) => {
                    tracing::warn!("glob error: {}", e);
                }
            }
        }
    }

    Ok(result)
}

/// Get the relative path from `base` to `path`.
pub fn relative_path(base: &Path, path: &Path) -> PathBuf {
    pathdiff::diff_paths(path, base).unwrap_or_else(|| path.to_path_buf())
}

/// Split a path into its components as strings.
pub fn split_path(path: &Path) -> Vec<String> {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect()
}

/// Join path components with underscores, for use as an identifier.
pub fn path_key(path: &Path) -> String {
    split_path(path).join("_")
}

/// Render a path with forward slashes regardless of host separator.
pub fn forward_slashes(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// Check whether a directory contains at least one regular file (direct
/// children only).
pub fn has_files(dir: &Path) -> bool {
    fs::read_dir(dir)
        .map(|entries| {
            entries
                .flatten()
                .any(|e| e.file_type().map(|t| t.is_file()).unwrap_or(false))
        })
        .unwrap_or(false)
}

/// Copy files into a destination directory, by file name. Existing files
/// are kept unless `overwrite` is set.
pub fn copy_files(files: &[PathBuf], dest_dir: &Path, overwrite: bool) -> Result<()> {
    ensure_dir(dest_dir)?;
    for file in files {
        let name = file
            .file_name()
            .with_context(|| format!("path has no file name: {}", file.display()))?;
        let dest = dest_dir.join(name);
        if overwrite || !dest.exists() {
            tracing::info!("copy file {} -> {}", file.display(), dest.display());
            fs::copy(file, &dest).with_context(|| {
                format!("failed to copy {} to {}", file.display(), dest.display())
            })?;
        }
    }
    Ok(())
}
