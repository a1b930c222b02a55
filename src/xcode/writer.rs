//! Generation of the Xcode project for a build graph.
//!
//! [`generate`] runs the whole pipeline in memory: indexed sources, the
//! `All` aggregate target, one native target per executable or bundle, test
//! module wiring, identifiers and serialization. Only once every file content
//! is known does [`run_and_write_files`] touch the disk, so a failing run
//! leaves the previous project untouched.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::core::graph::{BuildGraph, OutputType, TargetId, TargetOs};
use crate::core::label::LabelPattern;
use crate::util::fs::{write_if_changed, WriteOutcome};
use crate::util::paths;
use crate::xcode::classify::{bundle_target_name, classify_targets, Emission};
use crate::xcode::errors::XcodeError;
use crate::xcode::ids::{assign_ids, find_duplicate_ids};
use crate::xcode::object::{CompilerFlags, ObjectId, PbxAttributes};
use crate::xcode::print::serialize;
use crate::xcode::project::{PbxProject, FILE_TYPE_EXECUTABLE, PRODUCT_TYPE_TOOL};
use crate::xcode::script::{build_script, Environment};
use crate::xcode::workspace::{workspace_contents, workspace_settings, BuildSystem, ProjectPaths};
use crate::xcode::xctest;

/// Name of the aggregate target building everything.
pub const AGGREGATE_TARGET_NAME: &str = "All";

/// Options controlling the generated project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    /// Name of the generated project (`<name>.xcodeproj`).
    pub project_name: String,

    /// Target built by the `All` target; everything when empty.
    pub root_target_name: String,

    /// Ninja executable; `ninja` when empty.
    pub ninja_executable: String,

    /// `;`-separated label patterns restricting the generated targets.
    pub dir_filters_string: String,

    pub build_system: BuildSystem,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            project_name: "all".to_string(),
            root_target_name: String::new(),
            ninja_executable: String::new(),
            dir_filters_string: String::new(),
            build_system: BuildSystem::Legacy,
        }
    }
}

/// Contents of every generated file, relative to the build directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFiles {
    pub project_file: String,
    pub workspace_contents: String,
    pub workspace_settings: String,
}

impl GeneratedFiles {
    /// Files to write under `build_dir`, with their content.
    pub fn entries(&self, build_dir: &Path, project_name: &str) -> Vec<(PathBuf, &str)> {
        let paths = ProjectPaths::new(build_dir, project_name);
        vec![
            (paths.project_file, self.project_file.as_str()),
            (paths.workspace_contents, self.workspace_contents.as_str()),
            (paths.workspace_settings, self.workspace_settings.as_str()),
        ]
    }
}

/// Default build settings of the project, per platform.
pub fn project_attributes(os: TargetOs) -> PbxAttributes {
    let mut attributes = PbxAttributes::new();
    match os {
        TargetOs::Ios => {
            attributes.insert("SDKROOT".into(), "iphoneos".into());
            attributes.insert("TARGETED_DEVICE_FAMILY".into(), "1,2".into());
        }
        TargetOs::Tvos => {
            attributes.insert("SDKROOT".into(), "appletvos".into());
            attributes.insert("TARGETED_DEVICE_FAMILY".into(), "3".into());
        }
        TargetOs::Macos => {
            attributes.insert("SDKROOT".into(), "macosx".into());
        }
    }

    // Xcode asks to upgrade the project unless these are set. ninja ignores
    // them, so their values do not matter.
    attributes.insert("ALWAYS_SEARCH_USER_PATHS".into(), "NO".into());
    for key in [
        "CLANG_ANALYZER_LOCALIZABILITY_NONLOCALIZED",
        "CLANG_WARN__DUPLICATE_METHOD_MATCH",
        "CLANG_WARN_BLOCK_CAPTURE_AUTORELEASING",
        "CLANG_WARN_BOOL_CONVERSION",
        "CLANG_WARN_COMMA",
        "CLANG_WARN_CONSTANT_CONVERSION",
        "CLANG_WARN_DEPRECATED_OBJC_IMPLEMENTATIONS",
        "CLANG_WARN_EMPTY_BODY",
        "CLANG_WARN_ENUM_CONVERSION",
        "CLANG_WARN_INFINITE_RECURSION",
        "CLANG_WARN_INT_CONVERSION",
        "CLANG_WARN_NON_LITERAL_NULL_CONVERSION",
        "CLANG_WARN_OBJC_IMPLICIT_RETAIN_SELF",
        "CLANG_WARN_OBJC_LITERAL_CONVERSION",
        "CLANG_WARN_QUOTED_INCLUDE_IN_FRAMEWORK_HEADER",
        "CLANG_WARN_RANGE_LOOP_ANALYSIS",
        "CLANG_WARN_STRICT_PROTOTYPES",
        "CLANG_WARN_SUSPICIOUS_MOVE",
        "CLANG_WARN_UNREACHABLE_CODE",
        "ENABLE_STRICT_OBJC_MSGSEND",
        "ENABLE_TESTABILITY",
        "GCC_NO_COMMON_BLOCKS",
        "GCC_WARN_64_TO_32_BIT_CONVERSION",
        "GCC_WARN_ABOUT_RETURN_TYPE",
        "GCC_WARN_UNDECLARED_SELECTOR",
        "GCC_WARN_UNINITIALIZED_AUTOS",
        "GCC_WARN_UNUSED_FUNCTION",
        "GCC_WARN_UNUSED_VARIABLE",
        "ONLY_ACTIVE_ARCH",
    ] {
        attributes.insert(key.into(), "YES".into());
    }
    attributes
}

fn validate_project_name(name: &str) -> Result<(), XcodeError> {
    if name.is_empty() || name.contains('/') || name == "." || name == ".." {
        return Err(XcodeError::InvalidProjectName {
            name: name.to_string(),
        });
    }
    Ok(())
}

/// Expand the output directory pattern of a linker tool for a target
/// defined in `target_dir`. The result is relative to the build directory.
pub fn apply_output_dir_pattern(pattern: &str, target_dir: &str) -> String {
    let rel_dir = target_dir.trim_start_matches("//");
    let under = |prefix: &str| {
        if rel_dir.is_empty() {
            prefix.to_string()
        } else {
            format!("{}/{}", prefix, rel_dir)
        }
    };
    pattern
        .replace("{{root_out_dir}}", ".")
        .replace("{{target_out_dir}}", &under("obj"))
        .replace("{{target_gen_dir}}", &under("gen"))
}

/// A project being generated for one build graph.
pub struct XcodeProject<'g> {
    graph: &'g BuildGraph,
    options: Options,
    env: &'g dyn Environment,
    project: PbxProject,
}

impl<'g> XcodeProject<'g> {
    pub fn new(
        graph: &'g BuildGraph,
        options: Options,
        env: &'g dyn Environment,
    ) -> Result<Self, XcodeError> {
        validate_project_name(&options.project_name)?;

        let settings = &graph.settings;
        let project = PbxProject::new(
            &options.project_name,
            &settings.config_name(),
            &settings.source_root_from_build_dir(),
            project_attributes(settings.target_os()),
        );
        Ok(XcodeProject {
            graph,
            options,
            env,
            project,
        })
    }

    pub fn project(&self) -> &PbxProject {
        &self.project
    }

    fn should_include_file(&self, path: &str) -> bool {
        !paths::is_in_output_dir(&self.graph.settings.build_dir, path)
            && !paths::is_system_absolute(path)
    }

    /// Add every file the graph knows about to the indexing target, sorted.
    pub fn add_sources_from_graph(&mut self) {
        let graph = self.graph;
        let mut sources: BTreeSet<String> = BTreeSet::new();
        let mut insert = |path: &str| {
            if self.should_include_file(path) {
                sources.insert(path.to_string());
            }
        };

        for (_, target) in graph.targets() {
            let files = target
                .sources
                .iter()
                .chain(&target.inputs)
                .chain(&target.public_headers)
                .chain(&target.imports)
                .chain(&target.build_file);
            for file in files {
                insert(file.value());
            }
            if matches!(
                target.output_type,
                OutputType::Action | OutputType::ActionForeach
            ) {
                if let Some(ref script) = target.action_script {
                    insert(script.value());
                }
            }
        }

        // Files read while resolving the graph (dotfile, imported scripts...).
        for path in &graph.gen_dependencies {
            if let Some(source) = paths::to_source_absolute(path, &graph.settings.root_path) {
                insert(&source);
            }
        }

        for source in sources {
            let path = graph.settings.rebase_to_root(&source);
            self.project
                .add_source_file_to_indexing_target(&path, &path, CompilerFlags::None);
        }
    }

    fn script_for(&self, target_name: &str) -> String {
        build_script(
            target_name,
            &self.options.ninja_executable,
            &self.graph.settings.source_root_from_build_dir(),
            self.env,
        )
    }

    /// Add the `All` target and one target per emitted executable or bundle,
    /// then wire test modules to their host application.
    pub fn add_targets_from_graph(&mut self) -> Result<(), XcodeError> {
        let script = self.script_for(&self.options.root_target_name);
        self.project
            .add_aggregate_target(AGGREGATE_TARGET_NAME, &script);

        let filters = LabelPattern::parse_list(&self.options.dir_filters_string)?;
        let mut bundle_targets: Vec<(TargetId, ObjectId)> = Vec::new();

        for (id, emission) in classify_targets(self.graph, &filters) {
            match emission {
                Emission::Tool => {
                    self.add_binary_target(id)?;
                }
                Emission::Bundle => {
                    let native = self.add_bundle_target(id);
                    bundle_targets.push((id, native));
                }
                Emission::Skipped(reason) => {
                    tracing::debug!("skipping {}: {}", self.graph.target(id).label, reason);
                }
            }
        }

        xctest::add_xctest_files_to_test_modules(
            &mut self.project,
            self.graph,
            &bundle_targets,
            self.options.build_system,
        )?;
        xctest::add_dependencies_for_test_modules(&mut self.project, self.graph, &bundle_targets)
    }

    fn add_binary_target(&mut self, id: TargetId) -> Result<ObjectId, XcodeError> {
        let graph = self.graph;
        let target = graph.target(id);

        let output_dir = if target.output_dir.is_empty() {
            let toolchain = graph.toolchain_of(id);
            let tool = toolchain.linker().ok_or_else(|| XcodeError::MissingTool {
                tool: "link".to_string(),
                toolchain: toolchain.label.to_string(),
                target: target.label.to_string(),
            })?;
            apply_output_dir_pattern(&tool.default_output_dir, target.label.dir())
        } else {
            graph.settings.rebase_to_build_dir(&target.output_dir)
        };

        tracing::debug!("adding tool target {}", target.label);
        let name = target.label.name();
        let script = self.script_for(name);
        Ok(self.project.add_native_target(
            name,
            FILE_TYPE_EXECUTABLE,
            target.output_name(),
            PRODUCT_TYPE_TOOL,
            &output_dir,
            &script,
            PbxAttributes::new(),
        ))
    }

    fn add_bundle_target(&mut self, id: TargetId) -> ObjectId {
        let graph = self.graph;
        let target = graph.target(id);
        let name = bundle_target_name(target);

        let mut extra_attributes = target.bundle.extra_attributes.clone();
        if self.options.build_system == BuildSystem::Legacy {
            extra_attributes.insert("CODE_SIGN_IDENTITY".into(), "".into());
        }

        let output_name = graph
            .settings
            .rebase_to_build_dir(&target.bundle.bundle_root_dir);
        let output_dir = graph
            .settings
            .rebase_to_build_dir(&target.bundle.bundle_dir());

        tracing::debug!("adding bundle target {} as {}", target.label, name);
        let script = self.script_for(name);
        self.project.add_native_target(
            name,
            "",
            &output_name,
            &target.bundle.product_type,
            &output_dir,
            &script,
            extra_attributes,
        )
    }

    /// Assign identifiers to every object, seeded by the project name.
    pub fn assign_ids(&mut self) {
        let root = self.project.root();
        let seed = self.options.project_name.clone();
        assign_ids(self.project.arena_mut(), root, &seed);

        for id in find_duplicate_ids(self.project.arena(), root) {
            tracing::warn!("object identifier {} is assigned more than once", id);
        }
    }

    /// Render every generated file.
    pub fn files(&self) -> GeneratedFiles {
        GeneratedFiles {
            project_file: serialize(&self.project),
            workspace_contents: workspace_contents(),
            workspace_settings: workspace_settings(self.options.build_system),
        }
    }
}

/// Build the project for `graph` and render its files, without writing.
pub fn generate(
    graph: &BuildGraph,
    options: &Options,
    env: &dyn Environment,
) -> Result<GeneratedFiles, XcodeError> {
    let mut project = XcodeProject::new(graph, options.clone(), env)?;
    project.add_sources_from_graph();
    project.add_targets_from_graph()?;
    project.assign_ids();
    Ok(project.files())
}

/// Generate the project and write its files under `build_dir`, leaving files
/// whose content did not change untouched.
pub fn run_and_write_files(
    graph: &BuildGraph,
    options: &Options,
    env: &dyn Environment,
    build_dir: &Path,
) -> Result<Vec<(PathBuf, WriteOutcome)>, XcodeError> {
    let files = generate(graph, options, env)?;

    let mut outcomes = Vec::new();
    for (path, content) in files.entries(build_dir, &options.project_name) {
        let outcome = write_if_changed(&path, content)?;
        match outcome {
            WriteOutcome::Written => tracing::info!("wrote {}", path.display()),
            WriteOutcome::Unchanged => tracing::info!("{} is unchanged", path.display()),
        }
        outcomes.push((path, outcome));
    }
    Ok(outcomes)
}
