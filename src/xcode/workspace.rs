//! Files of the workspace embedded in the `.xcodeproj` bundle.

use std::path::{Path, PathBuf};

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Build system Xcode uses for the generated workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BuildSystem {
    /// Xcode's original build system.
    #[default]
    Legacy,
    /// The new build system.
    New,
}

impl std::fmt::Display for BuildSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BuildSystem::Legacy => f.write_str("legacy"),
            BuildSystem::New => f.write_str("new"),
        }
    }
}

/// Content of `project.xcworkspace/contents.xcworkspacedata`.
pub fn workspace_contents() -> String {
    concat!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n",
        "<Workspace\n",
        "   version = \"1.0\">\n",
        "   <FileRef\n",
        "      location = \"self:\">\n",
        "   </FileRef>\n",
        "</Workspace>\n",
    )
    .to_string()
}

/// Content of `project.xcworkspace/xcshareddata/WorkspaceSettings.xcsettings`.
pub fn workspace_settings(build_system: BuildSystem) -> String {
    let mut out = String::from(concat!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n",
        "<!DOCTYPE plist PUBLIC \"-//Apple//DTD PLIST 1.0//EN\" ",
        "\"http://www.apple.com/DTDs/PropertyList-1.0.dtd\">\n",
        "<plist version=\"1.0\">\n",
        "<dict>\n",
    ));
    if build_system == BuildSystem::Legacy {
        out.push_str("\t<key>BuildSystemType</key>\n");
        out.push_str("\t<string>Original</string>\n");
    }
    out.push_str("</dict>\n</plist>\n");
    out
}

/// Paths of the generated files, relative to the build directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectPaths {
    pub project_file: PathBuf,
    pub workspace_contents: PathBuf,
    pub workspace_settings: PathBuf,
}

impl ProjectPaths {
    pub fn new(build_dir: &Path, project_name: &str) -> Self {
        let bundle = build_dir.join(format!("{}.xcodeproj", project_name));
        let workspace = bundle.join("project.xcworkspace");
        ProjectPaths {
            project_file: bundle.join("project.pbxproj"),
            workspace_contents: workspace.join("contents.xcworkspacedata"),
            workspace_settings: workspace
                .join("xcshareddata")
                .join("WorkspaceSettings.xcsettings"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_system_values() {
        assert_eq!(BuildSystem::from_str("legacy", false), Ok(BuildSystem::Legacy));
        assert_eq!(BuildSystem::from_str("new", false), Ok(BuildSystem::New));
        assert!(BuildSystem::from_str("Original", false).is_err());

        // Command line values match the config file spelling.
        for value in BuildSystem::value_variants() {
            let name = value.to_possible_value().map(|v| v.get_name().to_string());
            assert_eq!(name, Some(value.to_string()));
        }
    }

    #[test]
    fn test_settings_per_build_system() {
        let legacy = workspace_settings(BuildSystem::Legacy);
        assert!(legacy.contains("<key>BuildSystemType</key>\n\t<string>Original</string>"));
        assert!(legacy.ends_with("</dict>\n</plist>\n"));

        let new = workspace_settings(BuildSystem::New);
        assert!(!new.contains("BuildSystemType"));
    }

    #[test]
    fn test_workspace_references_self() {
        assert!(workspace_contents().contains("location = \"self:\""));
    }

    #[test]
    fn test_paths() {
        let paths = ProjectPaths::new(Path::new("/src/out/Debug"), "all");
        assert_eq!(
            paths.project_file,
            PathBuf::from("/src/out/Debug/all.xcodeproj/project.pbxproj")
        );
        assert_eq!(
            paths.workspace_settings,
            PathBuf::from(
                "/src/out/Debug/all.xcodeproj/project.xcworkspace/xcshareddata/WorkspaceSettings.xcsettings"
            )
        );
    }
}
