//! Configuration file support for pbxgen.
//!
//! pbxgen supports two configuration file locations:
//! - Global: `<config dir>/pbxgen/config.toml` - User-wide defaults
//! - Project: `<build dir>/pbxgen.toml` - Per build directory overrides
//!
//! Project config takes precedence over global config, and command line
//! flags take precedence over both.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::xcode::workspace::BuildSystem;
use crate::xcode::writer::Options;

/// Name of the per build directory config file.
pub const PROJECT_CONFIG_NAME: &str = "pbxgen.toml";

/// pbxgen configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Project generation settings
    pub xcode: XcodeConfig,
}

/// Settings of the generated Xcode project.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct XcodeConfig {
    /// Name of the `.xcodeproj` (default: `all`)
    pub project_name: Option<String>,

    /// Target built by the `All` aggregate target (default: everything)
    pub root_target: Option<String>,

    /// Ninja executable used by the build scripts
    pub ninja_executable: Option<String>,

    /// `;`-separated label patterns restricting the generated targets
    pub filters: Option<String>,

    /// Xcode build system (legacy, new)
    pub build_system: Option<BuildSystem>,
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Load configuration with fallback to defaults if file doesn't exist.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config from {}: {:#}", path.display(), e);
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(&mut self, other: Config) {
        if other.xcode.project_name.is_some() {
            self.xcode.project_name = other.xcode.project_name;
        }
        if other.xcode.root_target.is_some() {
            self.xcode.root_target = other.xcode.root_target;
        }
        if other.xcode.ninja_executable.is_some() {
            self.xcode.ninja_executable = other.xcode.ninja_executable;
        }
        if other.xcode.filters.is_some() {
            self.xcode.filters = other.xcode.filters;
        }
        if other.xcode.build_system.is_some() {
            self.xcode.build_system = other.xcode.build_system;
        }
    }

    /// Generation options with unset values defaulted.
    pub fn options(&self) -> Options {
        let defaults = Options::default();
        let xcode = self.xcode.clone();
        Options {
            project_name: xcode.project_name.unwrap_or(defaults.project_name),
            root_target_name: xcode.root_target.unwrap_or(defaults.root_target_name),
            ninja_executable: xcode.ninja_executable.unwrap_or(defaults.ninja_executable),
            dir_filters_string: xcode.filters.unwrap_or(defaults.dir_filters_string),
            build_system: xcode.build_system.unwrap_or(defaults.build_system),
        }
    }
}

/// Load merged configuration from global and project locations.
///
/// Order of precedence (highest to lowest):
/// 1. Project config (<build dir>/pbxgen.toml)
/// 2. Global config (<config dir>/pbxgen/config.toml)
/// 3. Defaults
pub fn load_config(global_path: Option<&Path>, project_path: &Path) -> Config {
    let mut config = Config::default();

    // Load global config first
    if let Some(global_path) = global_path {
        config.merge(Config::load_or_default(global_path));
    }

    // Project config overrides global
    config.merge(Config::load_or_default(project_path));

    config
}

/// Get the global pbxgen config directory.
pub fn global_config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "pbxgen").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the global config path (`<config dir>/pbxgen/config.toml`).
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("config.toml"))
}

/// Get the project config path (`<build dir>/pbxgen.toml`).
pub fn project_config_path(build_dir: &Path) -> PathBuf {
    build_dir.join(PROJECT_CONFIG_NAME)
}
