//! pbxgen - Generate Xcode projects from a resolved build graph
//!
//! This crate provides the library behind the `pbxgen` binary: loading the
//! build graph, choosing and classifying targets, building the Xcode object
//! tree and serializing it. Builds inside Xcode are delegated to ninja.

pub mod core;
pub mod ops;
pub mod util;
pub mod xcode;

/// Test utilities for pbxgen unit tests.
///
/// This module is only available when compiling with `--cfg test` or
/// running tests. It provides builders for in-memory build graphs.
#[cfg(test)]
pub mod test_support;

pub use crate::core::{BuildGraph, Label, LabelPattern, Target};
pub use util::config::Config;
pub use xcode::{generate, run_and_write_files, BuildSystem, GeneratedFiles, Options, XcodeError};
