//! Command implementations

pub mod completions;
pub mod gen;
pub mod targets;
