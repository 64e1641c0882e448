//! Build-file emission.

pub mod cmake;

pub use cmake::{render, write_cmake_file, EmitContext};
