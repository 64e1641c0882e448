//! CLI definitions using clap.

use std::path::PathBuf;

use clap::Parser;

/// Slipway - A declarative meta-build generator for C and C++
#[derive(Parser)]
#[command(name = "slipway")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Comma-separated configurations (DEBUG, RELEASE)
    #[arg(long, default_value = "DEBUG,RELEASE")]
    pub configuration: String,

    /// Comma-separated platforms (WIN32, X64, ARM, ARM64)
    #[arg(long, default_value = "X64")]
    pub platform: String,

    /// C++ standard, e.g. c++17
    #[arg(long, default_value = "c++11")]
    pub std: String,

    /// Workspace directory
    #[arg(long, default_value = ".")]
    pub workspace: PathBuf,

    /// Do not generate unit-test targets
    #[arg(long)]
    pub disable_unittest: bool,

    /// Write the build file but do not invoke cmake
    #[arg(long)]
    pub only_generate: bool,

    /// Dump the resolved target descriptors as JSON instead of emitting
    #[arg(long)]
    pub emit_plan: bool,

    /// Extra compile options passed to add_compile_options
    #[arg(long)]
    pub compile_options: Option<String>,

    /// Trigger the module's pre-build hook and exit
    #[arg(long, requires = "module", conflicts_with = "post_build")]
    pub pre_build: bool,

    /// Trigger the module's post-build hook and exit
    #[arg(long, requires = "module")]
    pub post_build: bool,

    /// Module whose hook to trigger
    #[arg(long)]
    pub module: Option<String>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}
