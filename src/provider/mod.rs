//! Descriptor providers.
//!
//! A provider turns a component name plus a configuration axis into a
//! structured descriptor. Providers may have side effects, so the contract
//! is strict: `describe_module` and `describe_third_party` are called at
//! most once per (name, axis) per run. [`MemoProvider`] enforces that
//! contract when axes are resolved in parallel.
//!
//! Default third-party discovery is filesystem-driven and never invokes
//! provider logic.

pub mod manifest;
pub mod memo;

use std::path::Path;

use anyhow::Result;

use crate::core::axis::Axis;
use crate::core::descriptor::{ModuleDescriptor, ThirdPartyDescriptor};
use crate::util::fs::has_files;

pub use manifest::ManifestProvider;
pub use memo::MemoProvider;

/// Source of module and third-party descriptors.
pub trait DescriptorProvider: Send + Sync {
    /// Describe a module for one axis. Fails with
    /// [`GenerateError::MissingDescriptor`](crate::GenerateError) when the
    /// module has no descriptor.
    fn describe_module(&self, name: &str, axis: Axis) -> Result<ModuleDescriptor>;

    /// Describe an explicitly declared third party for one axis.
    fn describe_third_party(&self, name: &str, axis: Axis) -> Result<ThirdPartyDescriptor>;
}

/// Default-discovery heuristic for a third-party directory without a
/// descriptor file.
///
/// A root without an `include` subdirectory is skipped entirely (warning,
/// absent from results). Otherwise `include` is registered; a `lib`
/// subdirectory containing at least one file adds the match-everything lib
/// default, and symmetrically for `bin`.
pub fn discover_default_third_party(name: &str, root_dir: &Path) -> Option<ThirdPartyDescriptor> {
    if !root_dir.join("include").is_dir() {
        tracing::warn!(
            "default third party `{}` has no include dir, skipping it",
            name
        );
        return None;
    }

    let mut descriptor = ThirdPartyDescriptor::discovered(name);

    let lib_dir = root_dir.join("lib");
    if lib_dir.is_dir() && has_files(&lib_dir) {
        tracing::info!("default third party `{}` provides libraries", name);
        descriptor = descriptor.with_default_libs();
    }

    let bin_dir = root_dir.join("bin");
    if bin_dir.is_dir() && has_files(&bin_dir) {
        tracing::info!("default third party `{}` provides binaries", name);
        descriptor = descriptor.with_default_bins();
    }

    tracing::info!("add default third party `{}`", name);
    Some(descriptor)
}
