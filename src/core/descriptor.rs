//! Module and third-party descriptors.
//!
//! A descriptor is the structured value a provider returns for one
//! (component, axis) pair. Only the dependency-shaped fields may vary
//! between axes; output kind, main file and hooks must be identical across
//! every axis of a run.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// What a module builds into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputKind {
    /// Executable binary
    #[serde(alias = "bin")]
    Binary,

    /// Static library (.a / .lib)
    #[serde(alias = "static")]
    StaticLib,

    /// Shared/dynamic library (.so / .dll)
    #[serde(alias = "shared", alias = "dynamic")]
    DynamicLib,
}

/// A structured hook command (not a shell string).
///
/// Executed with the module's source directory as the working directory
/// when the tool is re-invoked with `--pre-build` / `--post-build`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HookCommand {
    /// Program to execute
    pub program: String,

    /// Arguments to pass
    #[serde(default)]
    pub args: Vec<String>,
}

/// Per-(module, axis) descriptor returned by a provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleDescriptor {
    /// Module name (same as its directory under `sources/`)
    pub name: String,

    /// What this module builds into
    pub output: OutputKind,

    /// Direct dependencies on other modules; may vary per axis
    pub dependencies: Vec<String>,

    /// Third parties referenced directly; may vary per axis
    pub third_parties: Vec<String>,

    /// System libraries to link; may vary per axis
    pub system_libs: Vec<String>,

    /// Entry-point file, relative to the module directory. Only meaningful
    /// for `Binary` output; tracked separately so unit-test builds can omit
    /// it.
    pub main_file: Option<PathBuf>,

    /// Pre-build hook, if any
    pub pre_build: Option<HookCommand>,

    /// Post-build hook, if any
    pub post_build: Option<HookCommand>,
}

/// Per-(third party, axis) descriptor: directory lists plus glob-style file
/// patterns, all relative to the third party's root directory unless
/// absolute.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThirdPartyDescriptor {
    /// Third-party name (same as its directory under `third_parties/`)
    pub name: String,

    /// Header directories to expose to referencing modules
    pub include_dirs: Vec<PathBuf>,

    /// Directories searched for library files
    pub lib_dirs: Vec<PathBuf>,

    /// Glob patterns matched under each lib dir
    pub libs: Vec<String>,

    /// Directories searched for runtime binaries
    pub bin_dirs: Vec<PathBuf>,

    /// Glob patterns matched under each bin dir
    pub bins: Vec<String>,

    /// System libraries the third party requires
    pub system_libs: Vec<String>,
}

impl ThirdPartyDescriptor {
    /// The minimal discovered form: an `include/` directory and nothing
    /// else. Lib/bin defaults are layered on by the discovery heuristic.
    pub fn discovered(name: impl Into<String>) -> Self {
        ThirdPartyDescriptor {
            name: name.into(),
            include_dirs: vec![PathBuf::from("include")],
            ..Default::default()
        }
    }

    /// Add the match-everything lib default (`lib_dirs=["lib"], libs=["*.*"]`).
    pub fn with_default_libs(mut self) -> Self {
        self.lib_dirs = vec![PathBuf::from("lib")];
        self.libs = vec!["*.*".to_string()];
        self
    }

    /// Add the match-everything bin default (`bin_dirs=["bin"], bins=["*.*"]`).
    pub fn with_default_bins(mut self) -> Self {
        self.bin_dirs = vec![PathBuf::from("bin")];
        self.bins = vec!["*.*".to_string()];
        self
    }
}
