//! Slipway - A declarative meta-build generator for C and C++
//!
//! This crate provides the core library functionality for Slipway:
//! per-configuration dependency graph resolution, cross-configuration
//! merging, target projection and CMake emission.

pub mod core;
pub mod emit;
pub mod graph;
pub mod merge;
pub mod ops;
pub mod project;
pub mod provider;
pub mod resolve;
pub mod util;

pub use self::core::axis::{Axis, Configuration, Platform, SystemKind};
pub use self::core::descriptor::{ModuleDescriptor, OutputKind, ThirdPartyDescriptor};
pub use self::core::layout::Layout;

pub use provider::DescriptorProvider;
pub use util::diagnostic::GenerateError;
