//! Core data structures for pbxgen.
//!
//! This module contains the input side of the generator:
//! - The resolved build graph loaded from JSON
//! - Labels and the label patterns used as target filters

pub mod graph;
pub mod label;

pub use graph::{BuildGraph, BuildSettings, OutputType, SourceFile, Target, TargetId, TargetOs};
pub use label::{Label, LabelPattern};
