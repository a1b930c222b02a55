//! Generating the Xcode project for a build graph file.

use std::path::{Path, PathBuf};

use crate::core::graph::BuildGraph;
use crate::core::label::LabelPattern;
use crate::util::config::{global_config_path, load_config, project_config_path, Config};
use crate::util::diagnostic::suggestions;
use crate::util::fs::WriteOutcome;
use crate::xcode::classify::{bundle_target_name, classify_targets, Emission};
use crate::xcode::errors::XcodeError;
use crate::xcode::script::{ninja_executable, Environment};
use crate::xcode::writer::{run_and_write_files, Options};

/// Options for [`generate_project`].
#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    /// Path of the JSON build graph.
    pub graph_path: PathBuf,

    /// Directory the project is written to; the graph's build directory when
    /// unset.
    pub out_dir: Option<PathBuf>,

    /// Settings given on the command line, taking precedence over config
    /// files.
    pub overrides: Config,

    /// Skip the global config file.
    pub ignore_global_config: bool,
}

/// Outcome of [`generate_project`].
#[derive(Debug)]
pub struct GenerateResult {
    pub build_dir: PathBuf,
    pub options: Options,
    pub files: Vec<(PathBuf, WriteOutcome)>,
}

impl GenerateResult {
    /// Number of files actually rewritten.
    pub fn written(&self) -> usize {
        self.files
            .iter()
            .filter(|(_, outcome)| *outcome == WriteOutcome::Written)
            .count()
    }
}

/// Resolve the generation options for a build directory: defaults, then
/// the global config, the build directory config and finally `overrides`.
pub fn resolve_options(build_dir: &Path, overrides: &Config, ignore_global: bool) -> Options {
    let global = if ignore_global {
        None
    } else {
        global_config_path()
    };
    let mut config = load_config(global.as_deref(), &project_config_path(build_dir));
    config.merge(overrides.clone());
    config.options()
}

/// Whether the ninja executable used by the build scripts can be found.
pub fn ninja_available(configured: &str) -> bool {
    which::which(ninja_executable(configured)).is_ok()
}

/// Load the graph, generate the project and write it.
pub fn generate_project(
    opts: &GenerateOptions,
    env: &dyn Environment,
) -> Result<GenerateResult, XcodeError> {
    let graph = BuildGraph::load(&opts.graph_path)?;
    tracing::debug!(
        "loaded {} targets from {}",
        graph.len(),
        opts.graph_path.display()
    );

    let build_dir = match opts.out_dir {
        Some(ref dir) => dir.clone(),
        None => graph.settings.full_path(&graph.settings.build_dir),
    };
    let options = resolve_options(&build_dir, &opts.overrides, opts.ignore_global_config);

    if !ninja_available(&options.ninja_executable) {
        tracing::warn!(
            "`{}` not found. {}",
            ninja_executable(&options.ninja_executable),
            suggestions::NINJA_NOT_FOUND
        );
    }

    let files = run_and_write_files(&graph, &options, env, &build_dir)?;
    Ok(GenerateResult {
        build_dir,
        options,
        files,
    })
}

/// A target as the project generator sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetListing {
    pub label: String,
    /// Name of the Xcode target, when one is generated.
    pub xcode_name: Option<String>,
    pub emission: Emission,
}

/// Classify the targets of a graph file without generating anything.
pub fn list_targets(graph_path: &Path, filters: &str) -> Result<Vec<TargetListing>, XcodeError> {
    let graph = BuildGraph::load(graph_path)?;
    let filters = LabelPattern::parse_list(filters)?;

    Ok(classify_targets(&graph, &filters)
        .into_iter()
        .map(|(id, emission)| {
            let target = graph.target(id);
            let xcode_name = match emission {
                Emission::Tool => Some(target.label.name().to_string()),
                Emission::Bundle => Some(bundle_target_name(target).to_string()),
                Emission::Skipped(_) => None,
            };
            TargetListing {
                label: target.label.to_string(),
                xcode_name,
                emission,
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xcode::script::MapEnvironment;
    use crate::xcode::workspace::BuildSystem;
    use tempfile::TempDir;

    fn write_graph(dir: &Path) -> PathBuf {
        let json = format!(
            r#"{{
                "settings": {{ "root_path": "{}", "build_dir": "//out/Debug/" }},
                "toolchains": [
                    {{ "label": "//build/toolchain:mac", "is_default": true,
                       "tools": {{ "link": {{ "default_output_dir": "{{{{root_out_dir}}}}" }} }} }}
                ],
                "targets": [
                    {{ "label": "//tools:gen", "output_type": "executable", "sources": ["//tools/gen.cc"] }},
                    {{ "label": "//base:base", "output_type": "static_library", "sources": ["//base/a.cc"] }}
                ]
            }}"#,
            dir.display()
        );
        let path = dir.join("graph.json");
        std::fs::write(&path, json).unwrap();
        path
    }

    #[test]
    fn test_generate_into_build_dir() {
        let tmp = TempDir::new().unwrap();
        let graph_path = write_graph(tmp.path());
        let opts = GenerateOptions {
            graph_path,
            ignore_global_config: true,
            ..Default::default()
        };

        let result = generate_project(&opts, &MapEnvironment::new()).unwrap();
        assert_eq!(result.build_dir, tmp.path().join("out/Debug"));
        assert_eq!(result.written(), 3);
        assert!(tmp
            .path()
            .join("out/Debug/all.xcodeproj/project.pbxproj")
            .exists());
    }

    #[test]
    fn test_build_dir_config_and_overrides() {
        let tmp = TempDir::new().unwrap();
        let graph_path = write_graph(tmp.path());
        let build_dir = tmp.path().join("out/Debug");
        std::fs::create_dir_all(&build_dir).unwrap();
        std::fs::write(
            build_dir.join("pbxgen.toml"),
            "[xcode]\nproject_name = \"from_config\"\nbuild_system = \"new\"\n",
        )
        .unwrap();

        let options = resolve_options(&build_dir, &Config::default(), true);
        assert_eq!(options.project_name, "from_config");
        assert_eq!(options.build_system, BuildSystem::New);

        let mut overrides = Config::default();
        overrides.xcode.project_name = Some("cli".to_string());
        let opts = GenerateOptions {
            graph_path,
            overrides,
            ignore_global_config: true,
            ..Default::default()
        };
        let result = generate_project(&opts, &MapEnvironment::new()).unwrap();
        assert_eq!(result.options.project_name, "cli");
        assert_eq!(result.options.build_system, BuildSystem::New);
        assert!(build_dir.join("cli.xcodeproj/project.pbxproj").exists());
    }

    #[test]
    fn test_list_targets() {
        let tmp = TempDir::new().unwrap();
        let graph_path = write_graph(tmp.path());

        let listing = list_targets(&graph_path, "").unwrap();
        assert_eq!(listing.len(), 2);
        assert_eq!(listing[0].label, "//base:base");
        assert_eq!(listing[0].xcode_name, None);
        assert_eq!(listing[1].xcode_name.as_deref(), Some("gen"));

        let err = list_targets(&graph_path, "/bad").unwrap_err();
        assert!(matches!(err, XcodeError::InvalidPattern { .. }));
    }
}
