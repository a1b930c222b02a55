//! High-level operations.
//!
//! This module contains the implementation of pbxgen commands.

pub mod generate;

pub use generate::{
    generate_project, list_targets, ninja_available, resolve_options, GenerateOptions,
    GenerateResult, TargetListing,
};
