//! Helpers for source-absolute paths (`//foo/bar.cc`).
//!
//! The build graph names files relative to the source root with a leading
//! `//`. Xcode wants paths relative to the build directory or to the source
//! root, so most of the work here is rebasing between the two.

use std::path::{Component, Path};

use crate::util::fs::relative_path;

/// Whether `path` is relative to the source root (`//...`).
pub fn is_source_absolute(path: &str) -> bool {
    path.starts_with("//")
}

/// Whether `path` is an absolute filesystem path (`/...` but not `//...`).
pub fn is_system_absolute(path: &str) -> bool {
    path.starts_with('/') && !path.starts_with("//")
}

/// Final component of `path`.
pub fn file_name(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    match trimmed.rfind('/') {
        Some(i) => &trimmed[i + 1..],
        None => trimmed,
    }
}

/// Extension of the final component of `path`, without the dot.
pub fn extension(path: &str) -> Option<&str> {
    let name = file_name(path);
    name.rfind('.')
        .filter(|&i| i + 1 < name.len())
        .map(|i| &name[i + 1..])
}

/// Final component of `path` without its extension.
pub fn file_stem(path: &str) -> &str {
    let name = file_name(path);
    match extension(name) {
        Some(ext) => &name[..name.len() - ext.len() - 1],
        None => name,
    }
}

fn components(source_absolute: &str) -> Vec<&str> {
    source_absolute
        .trim_start_matches("//")
        .split('/')
        .filter(|c| !c.is_empty() && *c != ".")
        .collect()
}

/// Whether `dir` contains `..` components and thus may escape the source root.
pub fn escapes_root(dir: &str) -> bool {
    components(dir).contains(&"..")
}

/// Rebase the source-absolute `path` to be relative to the source-absolute
/// directory `dir`. System-absolute paths are rebased against
/// `root_path.join(dir)`.
pub fn rebase_path(path: &str, dir: &str, root_path: &Path) -> String {
    if is_system_absolute(path) {
        let base = root_path.join(components(dir).join("/"));
        let rel = relative_path(&base, Path::new(path));
        return to_slash(&rel);
    }

    let target = components(path);
    let base = components(dir);

    let common = target
        .iter()
        .zip(base.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut parts: Vec<&str> = Vec::new();
    parts.extend(std::iter::repeat("..").take(base.len() - common));
    parts.extend(&target[common..]);

    if parts.is_empty() {
        ".".to_string()
    } else {
        parts.join("/")
    }
}

/// Path of the source root relative to the build directory, e.g. `../..`.
pub fn source_root_from(build_dir: &str, root_path: &Path) -> String {
    rebase_path("//", build_dir, root_path)
}

/// Whether `path` lies inside the build directory `build_dir`.
pub fn is_in_output_dir(build_dir: &str, path: &str) -> bool {
    let dir = build_dir.trim_end_matches('/');
    path == dir
        || path
            .strip_prefix(dir)
            .is_some_and(|rest| rest.starts_with('/'))
}

/// Convert an absolute `path` under `root_path` into a source-absolute path.
pub fn to_source_absolute(path: &Path, root_path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root_path).ok()?;
    if rel.components().any(|c| !matches!(c, Component::Normal(_))) {
        return None;
    }
    Some(format!("//{}", to_slash(rel)))
}

fn to_slash(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
