//! Implementation of the generation pipeline.
//!
//! scan -> per-axis graph + third-party resolution (parallel) ->
//! cross-configuration merge -> target projection -> emission ->
//! optional cmake run and third-party binary copy.
//!
//! Every fatal error surfaces before the build file is written; there is
//! no partial output to clean up.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use anyhow::Result;
use rayon::prelude::*;

use crate::core::axis::{Axis, Configuration, Platform, SystemKind};
use crate::core::layout::Layout;
use crate::emit::{write_cmake_file, EmitContext};
use crate::graph::{check_shape_consistency, BuildGraph};
use crate::merge::{merge_model, MergedModel};
use crate::project::{discover, project_module, SourceFilters, SourceSet, TargetDescriptor};
use crate::provider::{
    discover_default_third_party, DescriptorProvider, ManifestProvider, MemoProvider,
};
use crate::resolve::{resolve_third_party, ThirdPartyInfo};
use crate::util::fs::{copy_files, forward_slashes};
use crate::util::process::ProcessBuilder;

/// Options for a generation run.
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    /// Requested configurations, in CLI order
    pub configurations: Vec<Configuration>,

    /// Requested platforms, in CLI order
    pub platforms: Vec<Platform>,

    /// Host system
    pub system: SystemKind,

    /// C++ standard (`17` for c++17)
    pub cxx_std: u32,

    /// Generate unit-test targets
    pub enable_unittest: bool,

    /// Write the build file but do not invoke cmake
    pub only_generate: bool,

    /// Dump resolved target descriptors as JSON instead of emitting
    pub emit_plan: bool,

    /// Extra `add_compile_options` payload
    pub compile_options: Option<String>,

    /// Source classification rules
    pub filters: SourceFilters,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        GenerateOptions {
            configurations: vec![Configuration::Debug, Configuration::Release],
            platforms: vec![Platform::X64],
            system: SystemKind::host(),
            cxx_std: 11,
            enable_unittest: true,
            only_generate: false,
            emit_plan: false,
            compile_options: None,
            filters: SourceFilters::default(),
        }
    }
}

/// What a generation run produced.
#[derive(Debug, Default)]
pub struct GenerateSummary {
    /// Path of the written build file, when one was written
    pub cmake_file: Option<PathBuf>,

    /// Number of projected targets
    pub target_count: usize,
}

/// Run the full generation pipeline for one workspace.
pub fn generate(layout: &Layout, opts: &GenerateOptions) -> Result<GenerateSummary> {
    let scan = layout.scan()?;
    if scan.modules.is_empty() {
        tracing::warn!("workspace has no modules, nothing to generate");
        return Ok(GenerateSummary::default());
    }

    let module_names: Vec<String> = scan.modules.keys().cloned().collect();
    let explicit_third_parties: Vec<String> = scan.third_parties.keys().cloned().collect();

    // Default discovery is pure filesystem inspection; do it once, not per
    // axis.
    let mut default_descriptors = Vec::new();
    for (name, dir) in &scan.default_third_parties {
        if let Some(descriptor) = discover_default_third_party(name, dir) {
            default_descriptors.push(descriptor);
        }
    }

    let provider = MemoProvider::new(ManifestProvider::new(scan));
    let axes = Axis::matrix(&opts.configurations, &opts.platforms, opts.system);
    anyhow::ensure!(
        !axes.is_empty(),
        "at least one configuration and one platform are required"
    );

    // Each axis resolves independently; the memo guard keeps the provider
    // contract intact under parallel queries.
    let per_axis: Vec<(BuildGraph, BTreeMap<String, ThirdPartyInfo>)> = axes
        .par_iter()
        .map(|&axis| {
            let graph = BuildGraph::build(axis, &module_names, &provider)?;

            let mut resolved = BTreeMap::new();
            for name in &explicit_third_parties {
                let descriptor = provider.describe_third_party(name, axis)?;
                resolved.insert(name.clone(), resolve_third_party(layout, &descriptor)?);
            }
            for descriptor in &default_descriptors {
                resolved.insert(
                    descriptor.name.clone(),
                    resolve_third_party(layout, descriptor)?,
                );
            }

            Ok((graph, resolved))
        })
        .collect::<Result<Vec<_>>>()?;

    let (graphs, third_parties): (Vec<_>, Vec<_>) = per_axis.into_iter().unzip();
    check_shape_consistency(&graphs)?;

    // Source discovery is axis-independent; the shape check above
    // guarantees the first axis's output/main-file are authoritative.
    let mut source_sets: BTreeMap<String, SourceSet> = BTreeMap::new();
    let mut head_only: BTreeSet<String> = BTreeSet::new();
    for (name, node) in &graphs[0].modules {
        let sources = discover(
            layout,
            name,
            node.output,
            node.main_file.as_deref(),
            &opts.filters,
        );
        if sources.head_only {
            head_only.insert(name.clone());
        }
        source_sets.insert(name.clone(), sources);
    }

    let model = merge_model(&graphs, &third_parties, &head_only)?;

    let mut targets: Vec<TargetDescriptor> = Vec::new();
    for name in &model.emission_order {
        let module = &model.modules[name];
        targets.extend(project_module(
            module,
            &source_sets[name],
            &opts.filters,
            opts.enable_unittest,
        ));
    }

    if opts.emit_plan {
        println!("{}", serde_json::to_string_pretty(&targets)?);
        return Ok(GenerateSummary {
            cmake_file: None,
            target_count: targets.len(),
        });
    }

    let ctx = EmitContext {
        project_name: layout.project_name(),
        configurations: opts.configurations.clone(),
        platforms: opts.platforms.clone(),
        cxx_std: opts.cxx_std,
        compile_options: opts.compile_options.clone(),
        tool_command: tool_command(layout),
    };
    let cmake_file = write_cmake_file(layout, &ctx, &targets)?;

    copy_third_party_binaries(layout, &model, &opts.configurations)?;

    if !opts.only_generate {
        let dir = layout.project_files_dir();
        ProcessBuilder::new("cmake")
            .arg("-S")
            .arg(&dir)
            .arg("-B")
            .arg(&dir)
            .status_checked()?;
    }

    Ok(GenerateSummary {
        cmake_file: Some(cmake_file),
        target_count: targets.len(),
    })
}

/// The command prefix emitted into pre/post-build custom commands; the
/// build tool appends nothing, we append `--module` and the phase flag at
/// emission time.
fn tool_command(layout: &Layout) -> String {
    let exe = std::env::current_exe()
        .map(|path| forward_slashes(&path))
        .unwrap_or_else(|_| "slipway".to_string());
    let workspace = layout
        .workspace()
        .canonicalize()
        .unwrap_or_else(|_| layout.workspace().to_path_buf());
    format!("{} --workspace {}", exe, forward_slashes(&workspace))
}

/// Copy matched third-party binaries next to the build outputs, one
/// subdirectory per configuration.
fn copy_third_party_binaries(
    layout: &Layout,
    model: &MergedModel,
    configurations: &[Configuration],
) -> Result<()> {
    for &configuration in configurations {
        let mut files: Vec<PathBuf> = Vec::new();
        for tp in model.third_parties.values() {
            files.extend(
                tp.bins
                    .raw_for(configuration)
                    .into_iter()
                    .map(|path| layout.workspace().join(path)),
            );
        }
        if !files.is_empty() {
            let dest = layout.binary_dir().join(configuration.cmake_name());
            copy_files(&files, &dest, false)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn write_file(root: &Path, rel: &str, contents: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    fn options() -> GenerateOptions {
        GenerateOptions {
            system: SystemKind::Linux,
            only_generate: true,
            ..Default::default()
        }
    }

    /// A workspace with a binary app depending on a static lib, a
    /// release-only third party and a default-discovered third party.
    fn demo_workspace() -> TempDir {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();

        write_file(
            root,
            "sources/app/build.toml",
            r#"
[module]
output = "binary"
main-file = "main.cc"
dependencies = ["core"]

[configuration.release]
third-parties = ["profiler"]
"#,
        );
        write_file(root, "sources/app/main.cc", "int main() { return 0; }");
        write_file(root, "sources/app/app.cc", "");
        write_file(root, "sources/app/app_test.cc", "");

        write_file(
            root,
            "sources/core/build.toml",
            r#"
[module]
output = "static-lib"
third-parties = ["zlib"]
system-libs = ["pthread"]
"#,
        );
        write_file(root, "sources/core/core.cc", "");
        write_file(root, "sources/core/core.h", "");
        write_file(root, "sources/core/core_test.cc", "");

        write_file(
            root,
            "third_parties/zlib/build.toml",
            r#"
[third-party]
include-dirs = ["include"]
lib-dirs = ["lib"]
libs = ["*.a"]
"#,
        );
        write_file(root, "third_parties/zlib/include/zlib.h", "");
        write_file(root, "third_parties/zlib/lib/libz.a", "");

        // Default-discovered third party (no descriptor file)
        write_file(root, "third_parties/profiler/include/profiler.h", "");
        write_file(root, "third_parties/profiler/lib/libprofiler.a", "");

        tmp
    }

    #[test]
    fn test_generate_demo_workspace() {
        let tmp = demo_workspace();
        let layout = Layout::new(tmp.path());

        let summary = generate(&layout, &options()).unwrap();

        let cmake_file = summary.cmake_file.unwrap();
        assert!(cmake_file.exists());
        // core: primary + 1 test + aggregate; app: primary + 1 test +
        // aggregate
        assert_eq!(summary.target_count, 6);

        let rendered = fs::read_to_string(cmake_file).unwrap();

        // Dependencies before dependents
        let core = rendered.find("# module core").unwrap();
        let app = rendered.find("# module app").unwrap();
        assert!(core < app);

        // core links zlib under both labels -> general clause
        assert!(rendered.contains(" general ${PROJECT_DIR}/third_parties/zlib/lib/libz.a"));
        assert!(rendered.contains(" general pthread"));

        // profiler is release-only for app
        assert!(rendered
            .contains(" optimized ${PROJECT_DIR}/third_parties/profiler/lib/libprofiler.a"));

        // app links core unconditionally
        assert!(rendered.contains(" general core"));

        // main file excluded from the test target's reused groups
        assert!(rendered.contains("add_custom_target(test_app DEPENDS test_app_app"));
        assert!(rendered.contains("add_custom_target(test_core DEPENDS test_core_core"));

        // third-party include dirs propagate
        assert!(rendered.contains("PUBLIC ${PROJECT_DIR}/third_parties/zlib/include"));
        assert!(rendered.contains("PUBLIC ${PROJECT_DIR}/third_parties/profiler/include"));
    }

    #[test]
    fn test_generate_empty_workspace_writes_nothing() {
        let tmp = TempDir::new().unwrap();
        let layout = Layout::new(tmp.path());

        let summary = generate(&layout, &options()).unwrap();
        assert!(summary.cmake_file.is_none());
        assert!(!tmp.path().join("CMakeLists.txt").exists());
    }

    #[test]
    fn test_generate_cycle_aborts_before_output() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        write_file(
            root,
            "sources/x/build.toml",
            "[module]\noutput = \"static-lib\"\ndependencies = [\"y\"]\n",
        );
        write_file(root, "sources/x/x.cc", "");
        write_file(
            root,
            "sources/y/build.toml",
            "[module]\noutput = \"static-lib\"\ndependencies = [\"x\"]\n",
        );
        write_file(root, "sources/y/y.cc", "");

        let layout = Layout::new(root);
        let err = generate(&layout, &options()).unwrap_err();
        assert!(err.to_string().contains("cycle"));
        assert!(!root.join("CMakeLists.txt").exists());
    }

    #[test]
    fn test_generate_missing_third_party_aborts() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        write_file(
            root,
            "sources/app/build.toml",
            "[module]\noutput = \"static-lib\"\nthird-parties = [\"ghost\"]\n",
        );
        write_file(root, "sources/app/app.cc", "");

        let layout = Layout::new(root);
        let err = generate(&layout, &options()).unwrap_err();
        assert!(err.to_string().contains("ghost"));
        assert!(!root.join("CMakeLists.txt").exists());
    }

    #[test]
    fn test_head_only_module_is_not_linked() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        write_file(
            root,
            "sources/app/build.toml",
            "[module]\noutput = \"static-lib\"\ndependencies = [\"headers\"]\n",
        );
        write_file(root, "sources/app/app.cc", "");
        write_file(
            root,
            "sources/headers/build.toml",
            "[module]\noutput = \"static-lib\"\n",
        );
        write_file(root, "sources/headers/api.h", "");

        let layout = Layout::new(root);
        generate(&layout, &options()).unwrap();

        let rendered = fs::read_to_string(root.join("CMakeLists.txt")).unwrap();
        // headers is still emitted as a target and still contributes its
        // include dirs, but app does not link it.
        assert!(rendered.contains("# module headers"));
        assert!(!rendered.contains(" general headers"));
    }

    #[test]
    fn test_third_party_binaries_copied_per_configuration() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        write_file(
            root,
            "sources/app/build.toml",
            "[module]\noutput = \"static-lib\"\nthird-parties = [\"runtime\"]\n",
        );
        write_file(root, "sources/app/app.cc", "");
        write_file(root, "third_parties/runtime/include/rt.h", "");
        write_file(root, "third_parties/runtime/bin/rt.dll", "payload");

        let layout = Layout::new(root);
        generate(&layout, &options()).unwrap();

        assert!(root.join("bin/Debug/rt.dll").exists());
        assert!(root.join("bin/Release/rt.dll").exists());
    }

    #[test]
    fn test_unittest_disabled_projects_primaries_only() {
        let tmp = demo_workspace();
        let layout = Layout::new(tmp.path());

        let mut opts = options();
        opts.enable_unittest = false;
        let summary = generate(&layout, &opts).unwrap();

        assert_eq!(summary.target_count, 2);
        let rendered = fs::read_to_string(tmp.path().join("CMakeLists.txt")).unwrap();
        assert!(!rendered.contains("add_custom_target"));
    }
}
