//! CLI integration tests for Slipway.
//!
//! These tests drive the full pipeline over fixture workspaces: scan,
//! per-axis resolution, merge, projection and emission.

use std::fs;
use std::path::Path;
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use tempfile::TempDir;

/// Get the slipway binary command.
fn slipway() -> Command {
    Command::cargo_bin("slipway").unwrap()
}

/// Create a temporary directory for test workspaces.
fn temp_dir() -> TempDir {
    TempDir::new().unwrap()
}

fn write_file(root: &Path, rel: &str, contents: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

/// A small workspace: binary app -> static core, one explicit third party,
/// one default-discovered third party, unit tests in both modules.
fn demo_workspace() -> TempDir {
    let tmp = temp_dir();
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
    write_file(root, "sources/core/io/reader.cc", "");
    write_file(root, "sources/core/io/reader_test.cc", "");

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

    write_file(root, "third_parties/profiler/include/profiler.h", "");
    write_file(root, "third_parties/profiler/lib/libprofiler.a", "");

    tmp
}

// ============================================================================
// generation
// ============================================================================

#[test]
fn test_generate_writes_cmake_file() {
    let tmp = demo_workspace();

    slipway()
        .args(["--workspace", tmp.path().to_str().unwrap(), "--only-generate"])
        .assert()
        .success();

    let cmake = fs::read_to_string(tmp.path().join("CMakeLists.txt")).unwrap();

    // Dependencies are declared before dependents.
    let core = cmake.find("# module core").unwrap();
    let app = cmake.find("# module app").unwrap();
    assert!(core < app);

    // Cross-configuration factoring: zlib is linked under both labels,
    // profiler only under release.
    assert!(cmake.contains(" general ${PROJECT_DIR}/third_parties/zlib/lib/libz.a"));
    assert!(cmake.contains(" optimized ${PROJECT_DIR}/third_parties/profiler/lib/libprofiler.a"));

    // Unit-test targets and aggregates.
    assert!(cmake.contains("add_executable(test_core_io_reader"));
    assert!(cmake.contains("add_custom_target(test_core DEPENDS test_core_io_reader"));
    assert!(cmake.contains("add_custom_target(test_app DEPENDS test_app_app"));
}

#[test]
fn test_generate_disable_unittest() {
    let tmp = demo_workspace();

    slipway()
        .args([
            "--workspace",
            tmp.path().to_str().unwrap(),
            "--only-generate",
            "--disable-unittest",
        ])
        .assert()
        .success();

    let cmake = fs::read_to_string(tmp.path().join("CMakeLists.txt")).unwrap();
    assert!(!cmake.contains("add_custom_target"));
    assert!(!cmake.contains("test_core_io_reader"));
}

#[test]
fn test_generate_single_configuration() {
    let tmp = demo_workspace();

    slipway()
        .args([
            "--workspace",
            tmp.path().to_str().unwrap(),
            "--only-generate",
            "--configuration",
            "RELEASE",
            "--std",
            "c++17",
        ])
        .assert()
        .success();

    let cmake = fs::read_to_string(tmp.path().join("CMakeLists.txt")).unwrap();
    assert!(cmake.contains("set(CMAKE_CONFIGURATION_TYPES \"Release\" CACHE STRING \"\" FORCE)"));
    assert!(cmake.contains("set(CMAKE_CXX_STANDARD 17)"));
    // With only one label nothing is common to both, so everything lands
    // in the release bucket.
    assert!(cmake.contains(" optimized ${PROJECT_DIR}/third_parties/zlib/lib/libz.a"));
}

#[test]
fn test_emit_plan_prints_json() {
    let tmp = demo_workspace();

    let output = slipway()
        .args([
            "--workspace",
            tmp.path().to_str().unwrap(),
            "--emit-plan",
        ])
        .output()
        .unwrap();

    assert!(output.status.success());
    let plan: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let names: Vec<&str> = plan
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap())
        .collect();
    assert!(names.contains(&"core"));
    assert!(names.contains(&"app"));
    assert!(names.contains(&"test_core"));

    // Plan mode writes no build file.
    assert!(!tmp.path().join("CMakeLists.txt").exists());
}

// ============================================================================
// fatal errors
// ============================================================================

#[test]
fn test_cycle_fails_without_output() {
    let tmp = temp_dir();
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

    slipway()
        .args(["--workspace", root.to_str().unwrap(), "--only-generate"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cycle"));

    assert!(!root.join("CMakeLists.txt").exists());
}

#[test]
fn test_missing_dependency_fails() {
    let tmp = temp_dir();
    let root = tmp.path();
    write_file(
        root,
        "sources/app/build.toml",
        "[module]\noutput = \"static-lib\"\ndependencies = [\"ghost\"]\n",
    );
    write_file(root, "sources/app/app.cc", "");

    slipway()
        .args(["--workspace", root.to_str().unwrap(), "--only-generate"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("ghost"));
}

#[test]
fn test_invalid_configuration_fails() {
    let tmp = demo_workspace();

    slipway()
        .args([
            "--workspace",
            tmp.path().to_str().unwrap(),
            "--only-generate",
            "--configuration",
            "PROFILE",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown configuration"));
}

#[test]
fn test_invalid_std_fails() {
    let tmp = demo_workspace();

    slipway()
        .args([
            "--workspace",
            tmp.path().to_str().unwrap(),
            "--only-generate",
            "--std",
            "gnu99",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--std"));
}

// ============================================================================
// hook mode
// ============================================================================

#[test]
fn test_pre_build_hook_short_circuits_generation() {
    let tmp = temp_dir();
    let root = tmp.path();
    write_file(
        root,
        "sources/gen/build.toml",
        r#"
[module]
output = "static-lib"

[module.pre-build]
program = "touch"
args = ["hook_ran"]
"#,
    );
    write_file(root, "sources/gen/gen.cc", "");

    slipway()
        .args([
            "--workspace",
            root.to_str().unwrap(),
            "--module",
            "gen",
            "--pre-build",
        ])
        .assert()
        .success();

    // The hook ran in the module directory and no build file was written.
    assert!(root.join("sources/gen/hook_ran").exists());
    assert!(!root.join("CMakeLists.txt").exists());
}

#[test]
fn test_hook_mode_requires_module() {
    slipway().args(["--pre-build"]).assert().failure();
}

#[test]
fn test_hook_mode_unknown_module_fails() {
    let tmp = temp_dir();
    let root = tmp.path();
    write_file(root, "sources/gen/build.toml", "[module]\noutput = \"static-lib\"\n");

    slipway()
        .args([
            "--workspace",
            root.to_str().unwrap(),
            "--module",
            "ghost",
            "--post-build",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no descriptor found"));
}
