//! Configuration axis types.
//!
//! A generation run operates over a fixed list of axes, one per requested
//! (configuration, platform) combination on the host system. Each axis is
//! resolved into its own dependency graph before the cross-configuration
//! merge collapses them.

use std::fmt;

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

/// Build configuration label. This label alone decides the merge bucket a
/// contribution lands in; platform and system variation does not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Configuration {
    Debug,
    Release,
}

impl Configuration {
    /// Parse a single CLI value (`DEBUG` or `RELEASE`, case-insensitive).
    pub fn parse(value: &str) -> Result<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "DEBUG" => Ok(Configuration::Debug),
            "RELEASE" => Ok(Configuration::Release),
            other => bail!(
                "unknown configuration `{}`\n\
                 expected one of: DEBUG, RELEASE",
                other
            ),
        }
    }

    /// Parse a comma-separated CLI list, preserving order and dropping
    /// duplicates.
    pub fn parse_list(values: &str) -> Result<Vec<Self>> {
        parse_axis_list(values, Configuration::parse)
    }

    /// The CMake configuration type name (`Debug` / `Release`).
    pub fn cmake_name(&self) -> &'static str {
        match self {
            Configuration::Debug => "Debug",
            Configuration::Release => "Release",
        }
    }

    /// The CLI flag spelling (`DEBUG` / `RELEASE`).
    pub fn flag_name(&self) -> &'static str {
        match self {
            Configuration::Debug => "DEBUG",
            Configuration::Release => "RELEASE",
        }
    }

    /// The overlay table key in a `build.toml` descriptor.
    pub fn overlay_key(&self) -> &'static str {
        match self {
            Configuration::Debug => "debug",
            Configuration::Release => "release",
        }
    }
}

impl fmt::Display for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.flag_name())
    }
}

/// Target platform. Only meaningful for Visual Studio generators; on other
/// systems it is carried through but does not affect emission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Win32,
    X64,
    Arm,
    Arm64,
}

impl Platform {
    /// Parse a single CLI value (`WIN32`, `X64`, `ARM`, `ARM64`).
    pub fn parse(value: &str) -> Result<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "WIN32" => Ok(Platform::Win32),
            "X64" => Ok(Platform::X64),
            "ARM" => Ok(Platform::Arm),
            "ARM64" => Ok(Platform::Arm64),
            other => bail!(
                "unknown platform `{}`\n\
                 expected one of: WIN32, X64, ARM, ARM64",
                other
            ),
        }
    }

    /// Parse a comma-separated CLI list, preserving order and dropping
    /// duplicates.
    pub fn parse_list(values: &str) -> Result<Vec<Self>> {
        parse_axis_list(values, Platform::parse)
    }

    /// The `CMAKE_GENERATOR_PLATFORM` value.
    pub fn generator_name(&self) -> &'static str {
        match self {
            Platform::Win32 => "Win32",
            Platform::X64 => "x64",
            Platform::Arm => "ARM",
            Platform::Arm64 => "ARM64",
        }
    }

    /// The CLI flag spelling.
    pub fn flag_name(&self) -> &'static str {
        match self {
            Platform::Win32 => "WIN32",
            Platform::X64 => "X64",
            Platform::Arm => "ARM",
            Platform::Arm64 => "ARM64",
        }
    }

    /// The overlay table key in a `build.toml` descriptor.
    pub fn overlay_key(&self) -> &'static str {
        match self {
            Platform::Win32 => "win32",
            Platform::X64 => "x64",
            Platform::Arm => "arm",
            Platform::Arm64 => "arm64",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.flag_name())
    }
}

/// Host system the generation runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SystemKind {
    Windows,
    Linux,
}

impl SystemKind {
    /// Detect the host system. Hosts that are neither Windows nor Linux are
    /// treated as Linux for generation purposes, with a warning.
    pub fn host() -> Self {
        if cfg!(target_os = "windows") {
            SystemKind::Windows
        } else {
            if !cfg!(target_os = "linux") {
                tracing::warn!(
                    "unrecognized host system `{}`, treating it as Linux",
                    std::env::consts::OS
                );
            }
            SystemKind::Linux
        }
    }

    /// The overlay table key in a `build.toml` descriptor.
    pub fn overlay_key(&self) -> &'static str {
        match self {
            SystemKind::Windows => "windows",
            SystemKind::Linux => "linux",
        }
    }
}

impl fmt::Display for SystemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SystemKind::Windows => f.write_str("WINDOWS"),
            SystemKind::Linux => f.write_str("LINUX"),
        }
    }
}

/// One point in (configuration, platform, system) space.
///
/// Immutable once constructed; a run holds an ordered list of these and
/// resolves each independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Axis {
    pub configuration: Configuration,
    pub platform: Platform,
    pub system: SystemKind,
}

impl Axis {
    pub fn new(configuration: Configuration, platform: Platform, system: SystemKind) -> Self {
        Axis {
            configuration,
            platform,
            system,
        }
    }

    /// Build the full axis list for a run: the cross product of requested
    /// configurations and platforms, all on the given host system.
    /// Configuration is the outer loop so `DEBUG,RELEASE × X64,WIN32` yields
    /// `[D/X64, D/WIN32, R/X64, R/WIN32]`.
    pub fn matrix(
        configurations: &[Configuration],
        platforms: &[Platform],
        system: SystemKind,
    ) -> Vec<Axis> {
        let mut axes = Vec::with_capacity(configurations.len() * platforms.len());
        for &configuration in configurations {
            for &platform in platforms {
                axes.push(Axis::new(configuration, platform, system));
            }
        }
        axes
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.configuration, self.platform, self.system)
    }
}

fn parse_axis_list<T, F>(values: &str, parse: F) -> Result<Vec<T>>
where
    T: PartialEq,
    F: Fn(&str) -> Result<T>,
{
    let mut result = Vec::new();
    for value in values.split(',') {
        if value.trim().is_empty() {
            continue;
        }
        let parsed = parse(value)?;
        if !result.contains(&parsed) {
            result.push(parsed);
        }
    }
    if result.is_empty() {
        bail!("expected at least one value in `{}`", values);
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_configuration_list() {
        let configs = Configuration::parse_list("DEBUG,RELEASE").unwrap();
        assert_eq!(configs, vec![Configuration::Debug, Configuration::Release]);

        // Case-insensitive, duplicates dropped
        let configs = Configuration::parse_list("release,Release").unwrap();
        assert_eq!(configs, vec![Configuration::Release]);

        assert!(Configuration::parse_list("PROFILE").is_err());
        assert!(Configuration::parse_list("").is_err());
    }

    #[test]
    fn test_parse_platform_list() {
        let platforms = Platform::parse_list("X64,WIN32").unwrap();
        assert_eq!(platforms, vec![Platform::X64, Platform::Win32]);

        assert!(Platform::parse_list("MIPS").is_err());
    }

    #[test]
    fn test_axis_matrix_cross_product() {
        let axes = Axis::matrix(
            &[Configuration::Debug, Configuration::Release],
            &[Platform::X64, Platform::Win32],
            SystemKind::Linux,
        );

        assert_eq!(axes.len(), 4);
        assert_eq!(axes[0].configuration, Configuration::Debug);
        assert_eq!(axes[0].platform, Platform::X64);
        assert_eq!(axes[1].platform, Platform::Win32);
        assert_eq!(axes[2].configuration, Configuration::Release);
        assert!(axes.iter().all(|a| a.system == SystemKind::Linux));
    }

    #[test]
    fn test_display_round_trip() {
        assert_eq!(Configuration::Debug.to_string(), "DEBUG");
        assert_eq!(Platform::Arm64.generator_name(), "ARM64");
        assert_eq!(
            Axis::new(Configuration::Release, Platform::X64, SystemKind::Windows).to_string(),
            "RELEASE/X64/WINDOWS"
        );
    }
}
