//! Workspace layout and component scanning.
//!
//! A workspace root contains a `sources/` directory (one subdirectory per
//! module) and a `third_parties/` directory (one subdirectory per third
//! party). A `build.toml` descriptor file in a subdirectory marks the
//! component explicit; a third-party subdirectory without one becomes a
//! candidate for default discovery.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Name of the per-component descriptor file.
pub const DESCRIPTOR_FILE: &str = "build.toml";

/// Paths of a slipway workspace.
#[derive(Debug, Clone)]
pub struct Layout {
    workspace: PathBuf,
}

impl Layout {
    pub fn new(workspace: impl Into<PathBuf>) -> Self {
        Layout {
            workspace: workspace.into(),
        }
    }

    /// The workspace root.
    pub fn workspace(&self) -> &Path {
        &self.workspace
    }

    /// Directory holding one subdirectory per module.
    pub fn sources_dir(&self) -> PathBuf {
        self.workspace.join("sources")
    }

    /// Directory holding one subdirectory per third party.
    pub fn third_parties_dir(&self) -> PathBuf {
        self.workspace.join("third_parties")
    }

    /// Root directory of a single module.
    pub fn module_dir(&self, name: &str) -> PathBuf {
        self.sources_dir().join(name)
    }

    /// Root directory of a single third party.
    pub fn third_party_dir(&self, name: &str) -> PathBuf {
        self.third_parties_dir().join(name)
    }

    /// Project name, taken from the workspace directory name.
    pub fn project_name(&self) -> String {
        let absolute = self
            .workspace
            .canonicalize()
            .unwrap_or_else(|_| self.workspace.clone());
        absolute
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "project".to_string())
    }

    /// Where generated build files are written.
    pub fn project_files_dir(&self) -> PathBuf {
        self.workspace.clone()
    }

    /// Runtime output directory (third-party binaries are copied here, into
    /// one subdirectory per configuration).
    pub fn binary_dir(&self) -> PathBuf {
        self.workspace.join("bin")
    }

    /// Library output directory.
    pub fn library_dir(&self) -> PathBuf {
        self.workspace.join("lib")
    }

    /// Scan the workspace for components.
    ///
    /// Only direct children of `sources/` and `third_parties/` are
    /// considered; grandchild directories are not components. A missing
    /// `sources/` or `third_parties/` directory is a warning, not an error.
    pub fn scan(&self) -> Result<ComponentScan> {
        let mut scan = ComponentScan::default();

        match scan_children(&self.sources_dir())? {
            Some(children) => {
                for (name, dir, descriptor) in children {
                    match descriptor {
                        Some(file) => {
                            scan.modules.insert(name, file);
                        }
                        None => {
                            tracing::warn!(
                                "source directory `{}` has no {}, skipping it",
                                dir.display(),
                                DESCRIPTOR_FILE
                            );
                        }
                    }
                }
            }
            None => {
                tracing::warn!(
                    "sources directory does not exist: {}",
                    self.sources_dir().display()
                );
            }
        }

        match scan_children(&self.third_parties_dir())? {
            Some(children) => {
                for (name, dir, descriptor) in children {
                    match descriptor {
                        Some(file) => {
                            scan.third_parties.insert(name, file);
                        }
                        None => {
                            scan.default_third_parties.insert(name, dir);
                        }
                    }
                }
            }
            None => {
                tracing::debug!(
                    "third-parties directory does not exist: {}",
                    self.third_parties_dir().display()
                );
            }
        }

        Ok(scan)
    }
}

/// Result of scanning a workspace: explicit components mapped to their
/// descriptor files, plus third-party directories eligible for default
/// discovery.
#[derive(Debug, Clone, Default)]
pub struct ComponentScan {
    /// module name -> descriptor file path
    pub modules: BTreeMap<String, PathBuf>,

    /// third-party name -> descriptor file path
    pub third_parties: BTreeMap<String, PathBuf>,

    /// third-party name -> component directory (no descriptor file)
    pub default_third_parties: BTreeMap<String, PathBuf>,
}

/// List direct child directories of `dir` with their descriptor file, if
/// present. Returns `None` when `dir` itself does not exist.
#[allow(clippy::type_complexity)]
fn scan_children(dir: &Path) -> Result<Option<Vec<(String, PathBuf, Option<PathBuf>)>>> {
    if !dir.exists() {
        return Ok(None);
    }

    let mut children = Vec::new();
    for entry in
        fs::read_dir(dir).with_context(|| format!("failed to read directory: {}", dir.display()))?
    {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        let child = entry.path();
        let descriptor = child.join(DESCRIPTOR_FILE);
        let descriptor = descriptor.is_file().then_some(descriptor);
        children.push((name, child, descriptor));
    }

    children.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(Some(children))
}
