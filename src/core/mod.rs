//! Core data structures for Slipway.
//!
//! This module contains the foundational types used throughout Slipway:
//! - Configuration axes (build configuration × platform × host system)
//! - Module and third-party descriptors
//! - Workspace layout

pub mod axis;
pub mod descriptor;
pub mod layout;

pub use axis::{Axis, Configuration, Platform, SystemKind};
pub use descriptor::{HookCommand, ModuleDescriptor, OutputKind, ThirdPartyDescriptor};
pub use layout::{ComponentScan, Layout, DESCRIPTOR_FILE};
