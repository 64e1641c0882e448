//! TOML descriptor provider.
//!
//! Each component directory carries a `build.toml`: a base `[module]` or
//! `[third-party]` table plus optional additive overlay tables keyed by
//! axis value. Overlays may only extend the list-valued fields; output
//! kind, main file and hooks live in the base table, so one module cannot
//! change shape between axes.
//!
//! ```toml
//! [module]
//! output = "binary"
//! main-file = "main.cc"
//! dependencies = ["core_lib"]
//!
//! [configuration.release]
//! third-parties = ["profiler"]
//!
//! [system.windows]
//! system-libs = ["ws2_32"]
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use crate::core::axis::Axis;
use crate::core::descriptor::{
    HookCommand, ModuleDescriptor, OutputKind, ThirdPartyDescriptor,
};
use crate::core::layout::ComponentScan;
use crate::util::diagnostic::GenerateError;
use crate::util::fs::read_to_string;

use super::DescriptorProvider;

/// Descriptor provider backed by per-directory `build.toml` files.
pub struct ManifestProvider {
    scan: ComponentScan,
}

impl ManifestProvider {
    pub fn new(scan: ComponentScan) -> Self {
        ManifestProvider { scan }
    }

    pub fn scan(&self) -> &ComponentScan {
        &self.scan
    }
}

impl DescriptorProvider for ManifestProvider {
    fn describe_module(&self, name: &str, axis: Axis) -> Result<ModuleDescriptor> {
        let path = self
            .scan
            .modules
            .get(name)
            .ok_or_else(|| GenerateError::missing_module(name))?;

        let raw = parse_descriptor_file(path)?;
        let base = match raw.module {
            Some(ref module) => module,
            None => bail!(
                "descriptor {} does not define a [module] table",
                path.display()
            ),
        };

        let mut descriptor = ModuleDescriptor {
            name: name.to_string(),
            output: base.output,
            dependencies: base.dependencies.clone(),
            third_parties: base.third_parties.clone(),
            system_libs: base.system_libs.clone(),
            main_file: base.main_file.clone(),
            pre_build: base.pre_build.clone(),
            post_build: base.post_build.clone(),
        };

        for overlay in raw.overlays_for(axis, path)? {
            descriptor
                .dependencies
                .extend(overlay.dependencies.iter().cloned());
            descriptor
                .third_parties
                .extend(overlay.third_parties.iter().cloned());
            descriptor
                .system_libs
                .extend(overlay.system_libs.iter().cloned());
        }

        Ok(descriptor)
    }

    fn describe_third_party(&self, name: &str, axis: Axis) -> Result<ThirdPartyDescriptor> {
        let path = self
            .scan
            .third_parties
            .get(name)
            .ok_or_else(|| GenerateError::missing_third_party(name))?;

        let raw = parse_descriptor_file(path)?;
        let base = match raw.third_party {
            Some(ref tp) => tp,
            None => bail!(
                "descriptor {} does not define a [third-party] table",
                path.display()
            ),
        };

        let mut descriptor = ThirdPartyDescriptor {
            name: name.to_string(),
            include_dirs: base.include_dirs.clone(),
            lib_dirs: base.lib_dirs.clone(),
            libs: base.libs.clone(),
            bin_dirs: base.bin_dirs.clone(),
            bins: base.bins.clone(),
            system_libs: base.system_libs.clone(),
        };

        for overlay in raw.overlays_for(axis, path)? {
            descriptor
                .include_dirs
                .extend(overlay.include_dirs.iter().cloned());
            descriptor.lib_dirs.extend(overlay.lib_dirs.iter().cloned());
            descriptor.libs.extend(overlay.libs.iter().cloned());
            descriptor.bin_dirs.extend(overlay.bin_dirs.iter().cloned());
            descriptor.bins.extend(overlay.bins.iter().cloned());
            descriptor
                .system_libs
                .extend(overlay.system_libs.iter().cloned());
        }

        Ok(descriptor)
    }
}

fn parse_descriptor_file(path: &Path) -> Result<RawDescriptorFile> {
    let contents = read_to_string(path)?;
    toml::from_str(&contents)
        .with_context(|| format!("failed to parse descriptor: {}", path.display()))
}

/// Raw schema of a `build.toml` file.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawDescriptorFile {
    module: Option<RawModule>,

    #[serde(rename = "third-party")]
    third_party: Option<RawThirdParty>,

    /// Overlays keyed by configuration (`debug` / `release`)
    #[serde(default)]
    configuration: BTreeMap<String, RawOverlay>,

    /// Overlays keyed by platform (`win32` / `x64` / `arm` / `arm64`)
    #[serde(default)]
    platform: BTreeMap<String, RawOverlay>,

    /// Overlays keyed by system (`windows` / `linux`)
    #[serde(default)]
    system: BTreeMap<String, RawOverlay>,
}

impl RawDescriptorFile {
    /// The overlays applying to one axis, in configuration, platform,
    /// system order. Unknown overlay keys are an error rather than a
    /// silent no-op.
    fn overlays_for(&self, axis: Axis, path: &Path) -> Result<Vec<&RawOverlay>> {
        for key in self.configuration.keys() {
            if !matches!(key.as_str(), "debug" | "release") {
                bail!(
                    "unknown configuration overlay `{}` in {}\n\
                     expected one of: debug, release",
                    key,
                    path.display()
                );
            }
        }
        for key in self.platform.keys() {
            if !matches!(key.as_str(), "win32" | "x64" | "arm" | "arm64") {
                bail!(
                    "unknown platform overlay `{}` in {}\n\
                     expected one of: win32, x64, arm, arm64",
                    key,
                    path.display()
                );
            }
        }
        for key in self.system.keys() {
            if !matches!(key.as_str(), "windows" | "linux") {
                bail!(
                    "unknown system overlay `{}` in {}\n\
                     expected one of: windows, linux",
                    key,
                    path.display()
                );
            }
        }

        let mut overlays = Vec::new();
        if let Some(overlay) = self.configuration.get(axis.configuration.overlay_key()) {
            overlays.push(overlay);
        }
        if let Some(overlay) = self.platform.get(axis.platform.overlay_key()) {
            overlays.push(overlay);
        }
        if let Some(overlay) = self.system.get(axis.system.overlay_key()) {
            overlays.push(overlay);
        }
        Ok(overlays)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct RawModule {
    output: OutputKind,

    #[serde(default)]
    dependencies: Vec<String>,

    #[serde(default)]
    third_parties: Vec<String>,

    #[serde(default)]
    system_libs: Vec<String>,

    #[serde(default)]
    main_file: Option<PathBuf>,

    #[serde(default)]
    pre_build: Option<HookCommand>,

    #[serde(default)]
    post_build: Option<HookCommand>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct RawThirdParty {
    #[serde(default)]
    include_dirs: Vec<PathBuf>,

    #[serde(default)]
    lib_dirs: Vec<PathBuf>,

    #[serde(default)]
    libs: Vec<String>,

    #[serde(default)]
    bin_dirs: Vec<PathBuf>,

    #[serde(default)]
    bins: Vec<String>,

    #[serde(default)]
    system_libs: Vec<String>,
}

/// Additive per-axis overlay. List fields extend the base table's lists.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct RawOverlay {
    #[serde(default)]
    dependencies: Vec<String>,

    #[serde(default)]
    third_parties: Vec<String>,

    #[serde(default)]
    system_libs: Vec<String>,

    #[serde(default)]
    include_dirs: Vec<PathBuf>,

    #[serde(default)]
    lib_dirs: Vec<PathBuf>,

    #[serde(default)]
    libs: Vec<String>,

    #[serde(default)]
    bin_dirs: Vec<PathBuf>,

    #[serde(default)]
    bins: Vec<String>,
}
