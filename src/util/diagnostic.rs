//! Error reports printed by the `pbxgen` binary.
//!
//! A report names the failing target or pattern, carries the stable error
//! code of the underlying [`XcodeError`](crate::xcode::XcodeError), and ends
//! with one `help:` line per suggested fix.

use std::fmt::{self, Write};
use std::path::PathBuf;

/// Suggestions shared by several errors.
pub mod suggestions {
    /// A filter pattern or the filtered graph is at fault.
    pub const CHECK_FILTERS: &str = "check the `--filters` patterns (separated by `;`)";

    /// The build graph description looks stale or corrupt.
    pub const REGENERATE_GRAPH: &str =
        "regenerate the build graph description and run `pbxgen gen` again";

    /// ninja cannot be located.
    pub const NINJA_NOT_FOUND: &str =
        "pass `--ninja-executable` or set `ninja_executable` in pbxgen.toml";
}

const RED: &str = "1;31";
const CYAN: &str = "1;36";
const GREEN: &str = "1;32";

fn paint(text: &str, ansi: &str, color: bool) -> String {
    if color {
        format!("\x1b[{}m{}\x1b[0m", ansi, text)
    } else {
        text.to_string()
    }
}

/// An error report with notes and suggested fixes.
#[derive(Debug, Clone, Default)]
pub struct Diagnostic {
    pub message: String,
    /// Stable code such as `pbxgen::graph::missing_host`.
    pub code: Option<String>,
    pub notes: Vec<String>,
    pub suggestions: Vec<String>,
    /// File the error is about.
    pub location: Option<PathBuf>,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>) -> Self {
        Diagnostic {
            message: message.into(),
            ..Default::default()
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    pub fn with_location(mut self, path: impl Into<PathBuf>) -> Self {
        self.location = Some(path.into());
        self
    }

    /// Render the report, rustc style:
    ///
    /// ```text
    /// error[pbxgen::graph::missing_host]: cannot find host application ...
    ///   --> /path/to/file
    ///   = note: ...
    ///   = help: ...
    /// ```
    pub fn format(&self, color: bool) -> String {
        let mut out = String::new();

        let heading = match self.code {
            Some(ref code) => format!("error[{}]", code),
            None => "error".to_string(),
        };
        let _ = writeln!(out, "{}: {}", paint(&heading, RED, color), self.message);

        if let Some(ref path) = self.location {
            let _ = writeln!(out, "  --> {}", path.display());
        }
        for note in &self.notes {
            let _ = writeln!(out, "  = {}: {}", paint("note", CYAN, color), note);
        }
        for suggestion in &self.suggestions {
            let _ = writeln!(out, "  = {}: {}", paint("help", GREEN, color), suggestion);
        }
        out
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format(false))
    }
}

/// Print a diagnostic to stderr.
pub fn emit(diagnostic: &Diagnostic, color: bool) {
    eprint!("{}", diagnostic.format(color));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_report() {
        let diag = Diagnostic::error("cannot find host application bundle `app`")
            .with_code("pbxgen::graph::missing_host")
            .with_note("`app_tests_module` is a test module")
            .with_suggestion(suggestions::CHECK_FILTERS)
            .with_location("/src/out/Debug/graph.json");

        assert_eq!(
            diag.format(false),
            "error[pbxgen::graph::missing_host]: cannot find host application bundle `app`\n\
             \x20 --> /src/out/Debug/graph.json\n\
             \x20 = note: `app_tests_module` is a test module\n\
             \x20 = help: check the `--filters` patterns (separated by `;`)\n"
        );
    }

    #[test]
    fn test_colored_heading() {
        let output = Diagnostic::error("boom").format(true);
        assert!(output.starts_with("\x1b[1;31merror\x1b[0m: boom\n"));
        assert_eq!(Diagnostic::error("boom").to_string(), "error: boom\n");
    }
}
