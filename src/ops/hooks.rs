//! Pre/post-build hook mode.
//!
//! When the tool is re-invoked by the downstream build with `--pre-build`
//! or `--post-build`, it looks up the module's descriptor for the first
//! axis, runs the matching hook command (if any) with the module directory
//! as cwd, and does nothing else.

use anyhow::{Context, Result};

use crate::core::axis::Axis;
use crate::core::layout::Layout;
use crate::provider::{DescriptorProvider, ManifestProvider};
use crate::util::process::ProcessBuilder;

/// Which hook to trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookKind {
    PreBuild,
    PostBuild,
}

/// Run one module's hook and return. A module without the requested hook
/// is a no-op, not an error.
pub fn run_hook(layout: &Layout, module: &str, kind: HookKind, axes: &[Axis]) -> Result<()> {
    let axis = *axes.first().context("no configuration axis selected")?;

    let scan = layout.scan()?;
    let provider = ManifestProvider::new(scan);
    let descriptor = provider.describe_module(module, axis)?;

    let hook = match kind {
        HookKind::PreBuild => &descriptor.pre_build,
        HookKind::PostBuild => &descriptor.post_build,
    };

    let Some(command) = hook else {
        tracing::debug!("module `{}` has no {:?} hook", module, kind);
        return Ok(());
    };

    ProcessBuilder::new(&command.program)
        .args(&command.args)
        .cwd(layout.module_dir(module))
        .status_checked()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::axis::{Configuration, Platform, SystemKind};
    use std::fs;
    use tempfile::TempDir;

    fn axes() -> Vec<Axis> {
        vec![Axis::new(
            Configuration::Debug,
            Platform::X64,
            SystemKind::Linux,
        )]
    }

    fn workspace(descriptor: &str) -> (TempDir, Layout) {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("sources/gen");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("build.toml"), descriptor).unwrap();
        let layout = Layout::new(tmp.path());
        (tmp, layout)
    }

    #[test]
    fn test_hook_runs_in_module_dir() {
        let (tmp, layout) = workspace(
            r#"
[module]
output = "static-lib"

[module.pre-build]
program = "touch"
args = ["hook_ran"]
"#,
        );

        run_hook(&layout, "gen", HookKind::PreBuild, &axes()).unwrap();
        assert!(tmp.path().join("sources/gen/hook_ran").exists());
    }

    #[test]
    fn test_absent_hook_is_a_noop() {
        let (_tmp, layout) = workspace("[module]\noutput = \"static-lib\"\n");
        run_hook(&layout, "gen", HookKind::PostBuild, &axes()).unwrap();
    }

    #[test]
    fn test_unknown_module_is_fatal() {
        let (_tmp, layout) = workspace("[module]\noutput = \"static-lib\"\n");
        assert!(run_hook(&layout, "ghost", HookKind::PreBuild, &axes()).is_err());
    }

    #[test]
    fn test_failing_hook_propagates() {
        let (_tmp, layout) = workspace(
            r#"
[module]
output = "static-lib"

[module.post-build]
program = "false"
"#,
        );

        assert!(run_hook(&layout, "gen", HookKind::PostBuild, &axes()).is_err());
    }
}
