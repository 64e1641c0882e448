//! CMakeLists.txt emission.
//!
//! Mechanical serialization of target descriptors into CMake syntax.
//! Targets arrive in post order, so every dependency is declared before
//! its dependents. All set iteration is over sorted containers; the output
//! is byte-for-byte reproducible for the same input.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::core::axis::{Configuration, Platform};
use crate::core::layout::Layout;
use crate::merge::{LinkBucket, LinkRef};
use crate::project::{TargetDescriptor, TargetKind};
use crate::util::fs::{forward_slashes, write_string};

/// Everything the emitter needs besides the targets themselves.
#[derive(Debug, Clone)]
pub struct EmitContext {
    pub project_name: String,

    /// Configuration labels present in the run, in CLI order
    pub configurations: Vec<Configuration>,

    /// Distinct platforms present in the run
    pub platforms: Vec<Platform>,

    /// C++ standard (`17` for c++17)
    pub cxx_std: u32,

    /// Extra `add_compile_options` payload
    pub compile_options: Option<String>,

    /// Command prefix that re-invokes this tool, for pre/post-build hooks
    pub tool_command: String,
}

/// The CMake link keyword for each bucket.
fn link_keyword(bucket: LinkBucket) -> &'static str {
    match bucket {
        LinkBucket::General => "general",
        LinkBucket::Debug => "debug",
        LinkBucket::Release => "optimized",
    }
}

fn link_ref_value(reference: &LinkRef) -> String {
    match reference {
        LinkRef::Target(name) => name.clone(),
        LinkRef::File(path) => format!("${{PROJECT_DIR}}/{}", forward_slashes(path)),
    }
}

fn include_dir_value(dir: &Path) -> String {
    if dir.is_absolute() {
        forward_slashes(dir)
    } else {
        format!("${{PROJECT_DIR}}/{}", forward_slashes(dir))
    }
}

/// Render the complete CMakeLists.txt contents.
pub fn render(ctx: &EmitContext, targets: &[TargetDescriptor]) -> String {
    let mut content: Vec<String> = Vec::new();

    content.push("# Generated by slipway".to_string());
    content.push("\n".to_string());
    content.extend(render_header(ctx));
    content.extend(render_project_info(ctx));
    if let Some(ref options) = ctx.compile_options {
        if !options.is_empty() {
            content.push(format!("add_compile_options({})", options));
        }
    }

    for target in targets {
        content.extend(render_target(ctx, target));
    }

    content.join("\n")
}

fn render_header(ctx: &EmitContext) -> Vec<String> {
    let mut lines = vec![
        "cmake_minimum_required(VERSION 3.2)".to_string(),
        "set(CMAKE_SUPPRESS_REGENERATION true)".to_string(),
    ];

    let configurations = ctx
        .configurations
        .iter()
        .map(|c| c.cmake_name())
        .collect::<Vec<_>>()
        .join(";");
    lines.push(format!(
        "set(CMAKE_CONFIGURATION_TYPES \"{}\" CACHE STRING \"\" FORCE)",
        configurations
    ));
    lines.push(format!("set(CMAKE_CXX_STANDARD {})", ctx.cxx_std));

    // The Visual Studio generator accepts a single platform. With more
    // than one distinct platform in the run there is nothing coherent to
    // emit, so the line is skipped.
    if let [platform] = ctx.platforms.as_slice() {
        lines.push("if(\"${CMAKE_GENERATOR}\" MATCHES \"^Visual Studio.*\")".to_string());
        lines.push(format!(
            "  set(CMAKE_GENERATOR_PLATFORM \"{}\" CACHE INTERNAL \"\" FORCE)",
            platform.generator_name()
        ));
        lines.push("endif()".to_string());
    } else {
        tracing::warn!(
            "{} distinct platforms requested, skipping CMAKE_GENERATOR_PLATFORM",
            ctx.platforms.len()
        );
    }

    lines.push("\n".to_string());
    lines
}

fn render_project_info(ctx: &EmitContext) -> Vec<String> {
    vec![
        format!("project({})", ctx.project_name),
        "set (PROJECT_DIR ${CMAKE_CURRENT_SOURCE_DIR})".to_string(),
        "set (SOURCE_DIR ${PROJECT_DIR}/sources)".to_string(),
        "set (CMAKE_ARCHIVE_OUTPUT_DIRECTORY ${PROJECT_DIR}/lib)".to_string(),
        "set (CMAKE_LIBRARY_OUTPUT_DIRECTORY ${PROJECT_DIR}/lib)".to_string(),
        "set (CMAKE_RUNTIME_OUTPUT_DIRECTORY ${PROJECT_DIR}/bin)".to_string(),
        "include_directories(${SOURCE_DIR})".to_string(),
        "\n".to_string(),
    ]
}

fn render_target(ctx: &EmitContext, target: &TargetDescriptor) -> Vec<String> {
    if target.kind == TargetKind::TestAggregate {
        return render_test_aggregate(target);
    }

    let mut content = vec![format!("# module {}", target.name)];

    // File groups, then the IDE source groups that reference them.
    for group in &target.groups {
        let files = group
            .files
            .iter()
            .map(|f| format!("${{SOURCE_DIR}}/{}", forward_slashes(f)))
            .collect::<Vec<_>>()
            .join(" ");
        content.push(format!("FILE(GLOB {} {})", group.key, files));
    }

    let mut labels: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for group in &target.groups {
        if let Some(ref label) = group.label {
            labels.entry(label).or_default().push(&group.key);
        }
    }
    for (label, keys) in labels {
        let refs = keys
            .iter()
            .map(|key| format!("${{{}}}", key))
            .collect::<Vec<_>>()
            .join(" ");
        content.push(format!("source_group(\"{}\" FILES {})", label, refs));
    }

    let sources_part = target
        .groups
        .iter()
        .map(|group| format!("${{{}}} ", group.key))
        .collect::<Vec<_>>()
        .join("");
    match target.kind {
        TargetKind::Executable => {
            content.push(format!("add_executable({} {})", target.name, sources_part));
        }
        TargetKind::StaticLib => {
            content.push(format!(
                "add_library({} STATIC {})",
                target.name, sources_part
            ));
        }
        TargetKind::SharedLib => {
            content.push(format!(
                "add_library({} SHARED {})",
                target.name, sources_part
            ));
        }
        TargetKind::TestAggregate => unreachable!(),
    }

    let mut include_part = Vec::new();
    if !target.include_dirs.is_empty() {
        include_part.push("\n".to_string());
        include_part.extend(
            target
                .include_dirs
                .iter()
                .map(|dir| format!("PUBLIC {}", include_dir_value(dir))),
        );
    }
    content.push(format!(
        "target_include_directories({} {})",
        target.name,
        include_part.join(" ")
    ));

    // Link clauses, release bucket first the way downstream diffs expect.
    let mut link_parts = Vec::new();
    for bucket in [LinkBucket::Release, LinkBucket::Debug, LinkBucket::General] {
        let mut clause = String::new();
        for reference in target.libs.get(bucket) {
            clause.push_str(&format!(
                " {} {}\n",
                link_keyword(bucket),
                link_ref_value(reference)
            ));
        }
        for lib in target.system_libs.get(bucket) {
            clause.push_str(&format!(" {} {}\n", link_keyword(bucket), lib));
        }
        if !clause.is_empty() {
            link_parts.push(clause);
        }
    }
    if !link_parts.is_empty() {
        content.push(format!(
            "target_link_libraries({} {})",
            target.name,
            link_parts.join("")
        ));
    }

    if target.has_pre_build {
        content.push(format!(
            "add_custom_command(TARGET {} PRE_BUILD COMMAND {} --module={} --pre-build)",
            target.name, ctx.tool_command, target.name
        ));
    }
    if target.has_post_build {
        content.push(format!(
            "add_custom_command(TARGET {} POST_BUILD COMMAND {} --module={} --post-build)",
            target.name, ctx.tool_command, target.name
        ));
    }

    content.push(format!(
        "set_target_properties({} PROPERTIES LINKER_LANGUAGE CXX)",
        target.name
    ));
    content.push("\n".to_string());
    content
}

fn render_test_aggregate(target: &TargetDescriptor) -> Vec<String> {
    let module = target.name.strip_prefix("test_").unwrap_or(&target.name);
    let mut content = vec![format!("# run all unit tests under folder {}", module)];

    let depends = target
        .test_targets
        .keys()
        .cloned()
        .collect::<Vec<_>>()
        .join(" ");
    let mut commands = Vec::new();
    for (test_name, source) in &target.test_targets {
        commands.push(format!(
            "COMMAND echo run unittest file {}",
            forward_slashes(source)
        ));
        commands.push(format!("COMMAND $<TARGET_FILE:{}>\n", test_name));
    }
    content.push(format!(
        "add_custom_target({} DEPENDS {} {})",
        target.name,
        depends,
        commands.join(" ")
    ));
    content.push("\n".to_string());
    content
}

/// Render and write CMakeLists.txt into the project files directory.
pub fn write_cmake_file(
    layout: &Layout,
    ctx: &EmitContext,
    targets: &[TargetDescriptor],
) -> Result<PathBuf> {
    let path = layout.project_files_dir().join("CMakeLists.txt");
    tracing::info!("write build file: {}", path.display());
    write_string(&path, &render(ctx, targets))?;
    Ok(path)
}
