//! Shared utilities

pub mod diagnostic;
pub mod fs;
pub mod process;

pub use diagnostic::{ComponentKind, GenerateError};
pub use process::ProcessBuilder;
