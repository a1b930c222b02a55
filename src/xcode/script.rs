//! The wrapper script Xcode runs to build a target with ninja.

use std::collections::BTreeMap;

/// Source of environment variables.
pub trait Environment {
    fn var(&self, name: &str) -> Option<String>;
}

/// The environment of the current process.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnvironment;

impl Environment for ProcessEnvironment {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

/// A fixed set of variables.
#[derive(Debug, Clone, Default)]
pub struct MapEnvironment {
    vars: BTreeMap<String, String>,
}

impl MapEnvironment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, value: &str) -> Self {
        self.vars.insert(name.to_string(), value.to_string());
        self
    }
}

impl Environment for MapEnvironment {
    fn var(&self, name: &str) -> Option<String> {
        self.vars.get(name).cloned()
    }
}

/// Variables forwarded to ninja, and whether their value is captured when the
/// project is generated (`true`) or read when the script runs (`false`).
const SAFE_ENVIRONMENT_VARIABLES: &[(&str, bool)] = &[
    ("HOME", true),
    ("LANG", true),
    ("PATH", true),
    ("USER", true),
    ("TMPDIR", false),
    ("ICECC_VERSION", true),
    ("ICECC_CLANG_REMOTE_CPP", true),
];

/// Ninja executable to invoke; `ninja` from `PATH` when unset.
pub fn ninja_executable(configured: &str) -> &str {
    if configured.is_empty() {
        "ninja"
    } else {
        configured
    }
}

/// Python statements building the `environ` dictionary passed to ninja.
pub fn compute_script_environ(env: &dyn Environment) -> String {
    let mut buffer = String::from("environ = {}");
    for &(name, capture) in SAFE_ENVIRONMENT_VARIABLES {
        buffer.push_str("\nenviron['");
        buffer.push_str(name);
        buffer.push_str("'] = ");
        if capture {
            let value = env.var(name).unwrap_or_default();
            buffer.push('\'');
            buffer.push_str(&python_escape(&value));
            buffer.push('\'');
        } else {
            buffer.push_str("os.environ.get('");
            buffer.push_str(name);
            buffer.push_str("', '')");
        }
    }
    buffer
}

/// Escape a value for a single-quoted Python string literal.
fn python_escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '\'' => escaped.push_str("\\'"),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            '\t' => escaped.push_str("\\t"),
            c if c.is_control() => escaped.push_str(&format!("\\x{:02x}", c as u32)),
            c => escaped.push(c),
        }
    }
    escaped
}

/// The script building `target_name` (everything when empty) with ninja.
///
/// `root_src_dir` is the source root relative to the build directory; paths
/// in ninja's output starting with it are made absolute so Xcode can link
/// diagnostics back to the files.
pub fn build_script(
    target_name: &str,
    ninja: &str,
    root_src_dir: &str,
    env: &dyn Environment,
) -> String {
    let environ = compute_script_environ(env);
    let ninja = ninja_executable(ninja);
    format!(
        r#"
import re
import os
import subprocess
import sys

rel_root_src = '{root_src_dir}'
abs_root_src = os.path.abspath(rel_root_src) + '/'

build_target = '{target_name}'
ninja_binary = '{ninja}'
ninja_params = [ '-C', '.' ]

{environ}

if build_target:
  ninja_params.append(build_target)
  print('Compile "' + build_target + '" via ninja')
else:
  print('Compile "all" via ninja')

process = subprocess.Popen(
    [ ninja_binary ] + ninja_params,
    stdout=subprocess.PIPE,
    stderr=subprocess.STDOUT,
    universal_newlines=True,
    encoding='utf-8',
    env=environ)

pattern = re.compile('(?<!/)' + re.escape(rel_root_src))

for line in iter(process.stdout.readline, ''):
  while True:
    match = pattern.search(line)
    if not match:
      break
    span = match.span()
    print(line[:span[0]], end='')
    print(abs_root_src, end='')
    line = line[span[1]:]
  print(line, flush=True, end='')

process.wait()

sys.exit(process.returncode)
"#,
        root_src_dir = python_escape(root_src_dir),
        target_name = python_escape(target_name),
        ninja = python_escape(ninja),
        environ = environ,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environ_snippet() {
        let env = MapEnvironment::new()
            .with("HOME", "/Users/me")
            .with("PATH", "/usr/bin:/bin")
            .with("TMPDIR", "/tmp/ignored")
            .with("SECRET", "nope");

        let environ = compute_script_environ(&env);
        let lines: Vec<&str> = environ.lines().collect();
        assert_eq!(
            lines,
            vec![
                "environ = {}",
                "environ['HOME'] = '/Users/me'",
                "environ['LANG'] = ''",
                "environ['PATH'] = '/usr/bin:/bin'",
                "environ['USER'] = ''",
                "environ['TMPDIR'] = os.environ.get('TMPDIR', '')",
                "environ['ICECC_VERSION'] = ''",
                "environ['ICECC_CLANG_REMOTE_CPP'] = ''",
            ]
        );
    }

    #[test]
    fn test_captured_values_are_escaped() {
        let env = MapEnvironment::new().with("USER", "o'brien");
        assert!(compute_script_environ(&env).contains("environ['USER'] = 'o\\'brien'"));
    }

    #[test]
    fn test_captured_control_characters_stay_on_one_line() {
        let env = MapEnvironment::new()
            .with("HOME", "/Users/a\nb")
            .with("LANG", "en\tUS\r")
            .with("PATH", "C:\\bin\u{7}");
        let environ = compute_script_environ(&env);

        assert!(environ.contains("environ['HOME'] = '/Users/a\\nb'\n"));
        assert!(environ.contains("environ['LANG'] = 'en\\tUS\\r'\n"));
        assert!(environ.contains("environ['PATH'] = 'C:\\\\bin\\x07'\n"));
        // One line per statement: the header plus one per variable.
        assert_eq!(environ.lines().count(), 1 + SAFE_ENVIRONMENT_VARIABLES.len());
    }

    #[test]
    fn test_build_script_inputs() {
        let script = build_script("base_unittests", "", "../..", &MapEnvironment::new());
        assert!(script.contains("rel_root_src = '../..'\n"));
        assert!(script.contains("build_target = 'base_unittests'\n"));
        assert!(script.contains("ninja_binary = 'ninja'\n"));
        assert!(script.contains("\nenviron = {}\n"));
        assert!(script.ends_with("sys.exit(process.returncode)\n"));
    }

    #[test]
    fn test_build_script_all() {
        let script = build_script("", "/opt/bin/ninja", "../..", &MapEnvironment::new());
        assert!(script.contains("build_target = ''\n"));
        assert!(script.contains("ninja_binary = '/opt/bin/ninja'\n"));
    }
}
