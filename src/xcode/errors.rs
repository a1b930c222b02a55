//! Project generation error types and diagnostics.

use std::path::PathBuf;

use miette::Diagnostic as MietteDiagnostic;
use thiserror::Error;

use crate::util::diagnostic::{suggestions, Diagnostic};

/// Broad category of a generation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Invalid user-supplied options (filters, project name, ...).
    Configuration,
    /// The build graph is inconsistent with what the generator expects.
    GraphConsistency,
    /// A computed path cannot be resolved against the build root.
    PathResolution,
    /// Reading the input or writing an output failed.
    Io,
}

/// Error during project generation.
#[derive(Debug, Error, MietteDiagnostic)]
pub enum XcodeError {
    #[error("invalid label pattern `{pattern}`")]
    #[diagnostic(code(pbxgen::config::invalid_pattern))]
    InvalidPattern { pattern: String },

    #[error("invalid label `{label}`")]
    #[diagnostic(code(pbxgen::config::invalid_label))]
    InvalidLabel { label: String },

    #[error("invalid project name `{name}`")]
    #[diagnostic(code(pbxgen::config::invalid_project_name))]
    InvalidProjectName { name: String },

    #[error("cannot find host application bundle `{host}` for `{target}`")]
    #[diagnostic(code(pbxgen::graph::missing_host))]
    MissingHostApplication { target: String, host: String },

    #[error("host application target `{host}` of `{target}` is not an application bundle")]
    #[diagnostic(code(pbxgen::graph::host_not_application))]
    HostNotApplication { target: String, host: String },

    #[error("`{tool}` tool not defined by toolchain `{toolchain}` used by `{target}`")]
    #[diagnostic(code(pbxgen::graph::missing_tool))]
    MissingTool {
        tool: String,
        toolchain: String,
        target: String,
    },

    #[error("`{target}` depends on unknown target `{dependency}`")]
    #[diagnostic(code(pbxgen::graph::unknown_dependency))]
    UnknownDependency { target: String, dependency: String },

    #[error("`{target}` uses unknown toolchain `{toolchain}`")]
    #[diagnostic(code(pbxgen::graph::unknown_toolchain))]
    UnknownToolchain { target: String, toolchain: String },

    #[error("build graph marks {count} toolchains as default, expected exactly one")]
    #[diagnostic(code(pbxgen::graph::default_toolchain))]
    DefaultToolchain { count: usize },

    #[error("target `{label}` is defined more than once")]
    #[diagnostic(code(pbxgen::graph::duplicate_label))]
    DuplicateLabel { label: String },

    #[error("cycle detected in build graph")]
    #[diagnostic(code(pbxgen::graph::cycle))]
    DependencyCycle { targets: Vec<String> },

    #[error("cannot resolve `{path}` against `{base}`")]
    #[diagnostic(code(pbxgen::path::unresolved))]
    PathResolution { path: String, base: String },

    #[error("failed to parse build graph {}: {message}", path.display())]
    #[diagnostic(code(pbxgen::io::parse))]
    Parse { path: PathBuf, message: String },

    #[error("I/O error at {}: {source}", path.display())]
    #[diagnostic(code(pbxgen::io::failed))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl XcodeError {
    /// Create an I/O error for `path`.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        XcodeError::Io {
            path: path.into(),
            source,
        }
    }

    /// Category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            XcodeError::InvalidPattern { .. }
            | XcodeError::InvalidLabel { .. }
            | XcodeError::InvalidProjectName { .. } => ErrorKind::Configuration,
            XcodeError::MissingHostApplication { .. }
            | XcodeError::HostNotApplication { .. }
            | XcodeError::MissingTool { .. }
            | XcodeError::UnknownDependency { .. }
            | XcodeError::UnknownToolchain { .. }
            | XcodeError::DuplicateLabel { .. }
            | XcodeError::DefaultToolchain { .. }
            | XcodeError::DependencyCycle { .. } => ErrorKind::GraphConsistency,
            XcodeError::PathResolution { .. } => ErrorKind::PathResolution,
            XcodeError::Parse { .. } | XcodeError::Io { .. } => ErrorKind::Io,
        }
    }

    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        let mut diag = Diagnostic::error(self.to_string());
        if let Some(code) = MietteDiagnostic::code(self) {
            diag = diag.with_code(code.to_string());
        }

        match self {
            XcodeError::InvalidPattern { .. } => diag
                .with_note("patterns look like `//dir:name`, `//dir:*`, `//dir/*` or `*`")
                .with_suggestion(suggestions::CHECK_FILTERS),

            XcodeError::InvalidLabel { .. } => {
                diag.with_note("labels look like `//dir:name`")
            }

            XcodeError::InvalidProjectName { .. } => diag
                .with_note("the project name becomes a directory name inside the build dir")
                .with_suggestion("Pass a plain name such as `--project all`"),

            XcodeError::MissingHostApplication { target, host } => diag
                .with_note(format!(
                    "`{}` is a test module and needs `{}` to be generated too",
                    target, host
                ))
                .with_suggestion(suggestions::CHECK_FILTERS)
                .with_suggestion(format!(
                    "Check the test application name declared by `{}`",
                    target
                )),

            XcodeError::HostNotApplication { host, .. } => diag.with_suggestion(format!(
                "Make `{}` a bundle with product type `com.apple.product-type.application`",
                host
            )),

            XcodeError::MissingTool {
                tool, toolchain, ..
            } => diag.with_note(format!(
                "the toolchain `{}` doesn't define a \"{}\" tool",
                toolchain, tool
            )),

            XcodeError::UnknownDependency { .. } | XcodeError::UnknownToolchain { .. } => {
                diag.with_suggestion(suggestions::REGENERATE_GRAPH)
            }

            XcodeError::DefaultToolchain { .. } => diag
                .with_note("targets without an explicit toolchain use the default one")
                .with_suggestion(suggestions::REGENERATE_GRAPH),

            XcodeError::DuplicateLabel { .. } => {
                diag.with_suggestion(suggestions::REGENERATE_GRAPH)
            }

            XcodeError::DependencyCycle { targets } => diag
                .with_note(format!("cycle: {}", targets.join(" -> ")))
                .with_suggestion(suggestions::REGENERATE_GRAPH),

            XcodeError::PathResolution { .. } => diag
                .with_note("the build directory must be source-absolute, e.g. `//out/Debug/`"),

            XcodeError::Parse { .. } => diag.with_suggestion(suggestions::REGENERATE_GRAPH),

            XcodeError::Io { path, .. } => diag.with_location(path.clone()),
        }
    }
}
