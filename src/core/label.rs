//! Target labels and label patterns.
//!
//! Labels follow the `//dir:name` convention of the build graph. Patterns
//! are used to restrict which targets end up in the generated project:
//!
//! - `//dir:name` matches exactly one target
//! - `//dir:*` matches every target defined in `dir`
//! - `//dir/*` matches every target defined in `dir` or below
//! - `*` matches everything
//!
//! Every pattern may be followed by a toolchain label in parentheses, e.g.
//! `//base/*(//build/toolchain:host)`.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::xcode::errors::XcodeError;

/// A label identifying a target in the build graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Label {
    dir: String,
    name: String,
}

impl Label {
    /// Create a label from its directory (`//foo/bar`) and name.
    pub fn new(dir: impl Into<String>, name: impl Into<String>) -> Self {
        Label {
            dir: normalize_dir(&dir.into()),
            name: name.into(),
        }
    }

    /// Parse a `//dir:name` label. `//dir` is shorthand for `//dir:<last component>`.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if !s.starts_with("//") || s.contains('(') || s.contains('*') {
            return None;
        }

        let (dir, name) = match s.rsplit_once(':') {
            Some((dir, name)) => (dir, name.to_string()),
            None => {
                let last = s.trim_end_matches('/').rsplit('/').next().unwrap_or_default();
                (s, last.to_string())
            }
        };

        if name.is_empty() || name.contains('/') {
            return None;
        }

        Some(Label::new(dir, name))
    }

    /// Directory part, always starting with `//` and without a trailing slash
    /// (except for the root, `//`).
    pub fn dir(&self) -> &str {
        &self.dir
    }

    /// Name part.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.dir, self.name)
    }
}

impl Ord for Label {
    fn cmp(&self, other: &Self) -> Ordering {
        self.dir
            .cmp(&other.dir)
            .then_with(|| self.name.cmp(&other.name))
    }
}

impl PartialOrd for Label {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl FromStr for Label {
    type Err = XcodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Label::parse(s).ok_or_else(|| XcodeError::InvalidLabel {
            label: s.to_string(),
        })
    }
}

fn normalize_dir(dir: &str) -> String {
    let trimmed = dir.trim_end_matches('/');
    if trimmed.len() <= 1 {
        "//".to_string()
    } else {
        trimmed.to_string()
    }
}

/// How a pattern matches labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternKind {
    /// Exactly one label.
    Match(Label),
    /// All labels whose directory is exactly this one.
    Directory(String),
    /// All labels in this directory or any directory below it.
    RecursiveDirectory(String),
}

/// A parsed label pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelPattern {
    kind: PatternKind,
    toolchain: Option<Label>,
}

impl LabelPattern {
    /// Parse a single pattern. Relative patterns are resolved against `//`.
    pub fn parse(pattern: &str) -> Result<Self, XcodeError> {
        let invalid = || XcodeError::InvalidPattern {
            pattern: pattern.to_string(),
        };

        let text = pattern.trim();
        if text.is_empty() {
            return Err(invalid());
        }

        let (body, toolchain) = match text.find('(') {
            Some(open) => {
                let inner = text[open + 1..].strip_suffix(')').ok_or_else(invalid)?;
                let toolchain = Label::parse(inner).ok_or_else(invalid)?;
                (&text[..open], Some(toolchain))
            }
            None => {
                if text.contains(')') {
                    return Err(invalid());
                }
                (text, None)
            }
        };

        if body.starts_with('/') && !body.starts_with("//") {
            return Err(invalid());
        }
        let body = if body.starts_with("//") {
            body.to_string()
        } else {
            format!("//{}", body)
        };

        let kind = if body == "//*" {
            PatternKind::RecursiveDirectory("//".to_string())
        } else if let Some(dir) = body.strip_suffix("/*") {
            if dir.contains('*') || dir.contains(':') {
                return Err(invalid());
            }
            PatternKind::RecursiveDirectory(normalize_dir(dir))
        } else if let Some(dir) = body.strip_suffix(":*") {
            if dir.contains('*') || dir.contains(':') {
                return Err(invalid());
            }
            PatternKind::Directory(normalize_dir(dir))
        } else {
            PatternKind::Match(Label::parse(&body).ok_or_else(invalid)?)
        };

        Ok(LabelPattern { kind, toolchain })
    }

    /// Parse a `;`-separated list of patterns, ignoring empty entries.
    pub fn parse_list(patterns: &str) -> Result<Vec<Self>, XcodeError> {
        patterns
            .split(';')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(LabelPattern::parse)
            .collect()
    }

    /// Kind of the pattern.
    pub fn kind(&self) -> &PatternKind {
        &self.kind
    }

    /// Whether `label`, built with `toolchain`, matches this pattern.
    pub fn matches(&self, label: &Label, toolchain: &Label) -> bool {
        if let Some(ref expected) = self.toolchain {
            if expected != toolchain {
                return false;
            }
        }

        match &self.kind {
            PatternKind::Match(expected) => expected == label,
            PatternKind::Directory(dir) => label.dir() == dir,
            PatternKind::RecursiveDirectory(dir) => {
                if dir == "//" {
                    return true;
                }
                label.dir() == dir
                    || label
                        .dir()
                        .strip_prefix(dir.as_str())
                        .is_some_and(|rest| rest.starts_with('/'))
            }
        }
    }
}

/// Whether any pattern in `patterns` matches.
pub fn matches_any(patterns: &[LabelPattern], label: &Label, toolchain: &Label) -> bool {
    patterns.iter().any(|p| p.matches(label, toolchain))
}
