//! Third-party resolution.
//!
//! Turns a third-party descriptor (explicit or discovered) into resolved
//! path sets for one axis: include directories plus the library and binary
//! files matched on disk. All relative results are expressed relative to
//! the workspace root so emission can prefix them uniformly.

use std::collections::BTreeSet;
use std::path::PathBuf;

use anyhow::Result;

use crate::core::descriptor::ThirdPartyDescriptor;
use crate::core::layout::Layout;
use crate::util::fs::match_files;

/// Resolved third-party data for one axis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThirdPartyInfo {
    pub name: String,

    /// Workspace-relative (or absolute) header directories
    pub include_dirs: BTreeSet<PathBuf>,

    /// Library files matched on disk, workspace-relative
    pub matched_libs: BTreeSet<PathBuf>,

    /// Runtime binaries matched on disk, workspace-relative
    pub matched_bins: BTreeSet<PathBuf>,

    pub system_libs: BTreeSet<String>,
}

/// Resolve one descriptor against the filesystem.
///
/// A lib/bin pattern matching nothing is a warning, not an error; the
/// affected set stays empty.
pub fn resolve_third_party(
    layout: &Layout,
    descriptor: &ThirdPartyDescriptor,
) -> Result<ThirdPartyInfo> {
    let root = layout.third_party_dir(&descriptor.name);
    let workspace = layout.workspace();

    let mut include_dirs = BTreeSet::new();
    for dir in &descriptor.include_dirs {
        if dir.is_absolute() {
            include_dirs.insert(dir.clone());
        } else {
            include_dirs.insert(
                PathBuf::from("third_parties")
                    .join(&descriptor.name)
                    .join(dir),
            );
        }
    }

    let mut matched_libs = BTreeSet::new();
    for pattern in &descriptor.libs {
        let matches = match_files(&root, &descriptor.lib_dirs, pattern, Some(workspace))?;
        if matches.is_empty() {
            tracing::warn!(
                "third party `{}`: lib pattern `{}` matched nothing",
                descriptor.name,
                pattern
            );
        }
        matched_libs.extend(matches);
    }

    let mut matched_bins = BTreeSet::new();
    for pattern in &descriptor.bins {
        let matches = match_files(&root, &descriptor.bin_dirs, pattern, Some(workspace))?;
        if matches.is_empty() {
            tracing::warn!(
                "third party `{}`: bin pattern `{}` matched nothing",
                descriptor.name,
                pattern
            );
        }
        matched_bins.extend(matches);
    }

    Ok(ThirdPartyInfo {
        name: descriptor.name.clone(),
        include_dirs,
        matched_libs,
        matched_bins,
        system_libs: descriptor.system_libs.iter().cloned().collect(),
    })
}
