//! Shared utilities

pub mod config;
pub mod diagnostic;
pub mod fs;
pub mod paths;

pub use config::Config;
pub use diagnostic::Diagnostic;
