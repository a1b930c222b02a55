//! Filesystem utilities.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::xcode::errors::XcodeError;

/// Result of [`write_if_changed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The file did not exist or its content differed, and was rewritten.
    Written,
    /// The file already had the expected content and was left untouched.
    Unchanged,
}

/// Ensure a directory exists, creating it if necessary.
pub fn ensure_dir(path: &Path) -> Result<(), XcodeError> {
    if !path.exists() {
        fs::create_dir_all(path).map_err(|e| XcodeError::io(path, e))?;
    }
    Ok(())
}

/// Read a file to string, with nice error messages.
pub fn read_to_string(path: &Path) -> Result<String, XcodeError> {
    fs::read_to_string(path).map_err(|e| XcodeError::io(path, e))
}

/// Write `contents` to `path` unless the file already holds exactly that
/// content. Parent directories are created as needed and the new content is
/// moved into place atomically, so watchers never observe a partial file.
pub fn write_if_changed(path: &Path, contents: &str) -> Result<WriteOutcome, XcodeError> {
    if let Ok(existing) = fs::read(path) {
        if existing == contents.as_bytes() {
            tracing::debug!("{} is up to date", path.display());
            return Ok(WriteOutcome::Unchanged);
        }
    }

    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    ensure_dir(parent)?;

    let mut tmp = NamedTempFile::new_in(parent).map_err(|e| XcodeError::io(parent, e))?;
    tmp.write_all(contents.as_bytes())
        .map_err(|e| XcodeError::io(tmp.path(), e))?;
    tmp.persist(path)
        .map_err(|e| XcodeError::io(path, e.error))?;

    Ok(WriteOutcome::Written)
}

/// Get the relative path from `base` to `path`.
pub fn relative_path(base: &Path, path: &Path) -> PathBuf {
    pathdiff::diff_paths(path, base).unwrap_or_else(|| path.to_path_buf())
}
