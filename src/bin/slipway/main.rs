//! Slipway CLI - declarative meta-build generation for C and C++

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use slipway::core::axis::{Axis, Configuration, Platform, SystemKind};
use slipway::core::layout::Layout;
use slipway::ops::{generate, run_hook, GenerateOptions, HookKind};
use slipway::project::SourceFilters;

mod cli;

use cli::Cli;

fn main() {
    if let Err(e) = run() {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("slipway=debug")
    } else {
        EnvFilter::new("slipway=info")
    };

    // Logs go to stderr; stdout is reserved for --emit-plan output.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    let configurations = Configuration::parse_list(&cli.configuration)?;
    let platforms = Platform::parse_list(&cli.platform)?;
    let system = SystemKind::host();
    let layout = Layout::new(&cli.workspace);

    // Hook mode short-circuits generation entirely.
    if cli.pre_build || cli.post_build {
        let module = cli.module.context("--module is required for hook mode")?;
        let kind = if cli.pre_build {
            HookKind::PreBuild
        } else {
            HookKind::PostBuild
        };
        let axes = Axis::matrix(&configurations, &platforms, system);
        return run_hook(&layout, &module, kind, &axes);
    }

    let opts = GenerateOptions {
        configurations,
        platforms,
        system,
        cxx_std: parse_std(&cli.std)?,
        enable_unittest: !cli.disable_unittest,
        only_generate: cli.only_generate,
        emit_plan: cli.emit_plan,
        compile_options: cli.compile_options,
        filters: SourceFilters::default(),
    };

    let summary = generate(&layout, &opts)?;
    if let Some(path) = summary.cmake_file {
        tracing::info!(
            "generated {} targets into {}",
            summary.target_count,
            path.display()
        );
    }
    Ok(())
}

/// Parse a `c++NN` standard string.
fn parse_std(value: &str) -> Result<u32> {
    let Some(version) = value.strip_prefix("c++") else {
        bail!("invalid --std `{}`, expected the form c++17", value);
    };
    version
        .parse()
        .with_context(|| format!("invalid --std `{}`, expected the form c++17", value))
}
