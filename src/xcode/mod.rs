//! Xcode project model and generator.
//!
//! The pipeline is: [`classify`] picks the targets, [`writer`] builds a
//! [`project::PbxProject`] from them (with [`xctest`] wiring test modules to
//! their host), [`ids`] names every object and [`print`] renders the
//! `project.pbxproj` text. [`workspace`] produces the companion workspace
//! files.

pub mod classify;
pub mod errors;
pub mod file_type;
pub mod ids;
pub mod object;
pub mod print;
pub mod project;
pub mod script;
pub mod workspace;
pub mod writer;
pub mod xctest;

pub use errors::XcodeError;
pub use project::PbxProject;
pub use workspace::BuildSystem;
pub use writer::{generate, run_and_write_files, GeneratedFiles, Options};
