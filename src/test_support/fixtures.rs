//! Builders for small build graphs.

use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::core::graph::{
    BuildGraph, BuildSettings, BundleData, GraphDescription, OutputType, SourceFile,
    TargetDescription, Tool, Toolchain,
};
use crate::core::label::Label;
use crate::xcode::errors::XcodeError;

/// Label of the default toolchain of fixtures.
pub const DEFAULT_TOOLCHAIN: &str = "//build/toolchain:default";

/// A build graph under construction.
///
/// Starts with a source root at `/src`, a build directory at `//out/Debug/`
/// and one default toolchain whose `link` tool writes to the root of the
/// build directory.
#[derive(Debug, Clone)]
pub struct GraphFixture {
    settings: BuildSettings,
    toolchains: Vec<Toolchain>,
    targets: Vec<TargetDescription>,
    gen_dependencies: Vec<PathBuf>,
}

impl Default for GraphFixture {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphFixture {
    pub fn new() -> Self {
        GraphFixture {
            settings: BuildSettings {
                root_path: PathBuf::from("/src"),
                build_dir: "//out/Debug/".to_string(),
                target_os: None,
            },
            toolchains: vec![toolchain(
                DEFAULT_TOOLCHAIN,
                true,
                &[("link", "{{root_out_dir}}")],
            )],
            targets: Vec::new(),
            gen_dependencies: Vec::new(),
        }
    }

    pub fn target_os(mut self, os: &str) -> Self {
        self.settings.target_os = Some(os.to_string());
        self
    }

    pub fn build_dir(mut self, dir: &str) -> Self {
        self.settings.build_dir = dir.to_string();
        self
    }

    /// Add a non-default toolchain defining `tools` as (name, output dir).
    pub fn toolchain(mut self, label: &str, tools: &[(&str, &str)]) -> Self {
        self.toolchains.push(toolchain(label, false, tools));
        self
    }

    /// Replace the tools of the default toolchain.
    pub fn default_tools(mut self, tools: &[(&str, &str)]) -> Self {
        self.toolchains[0] = toolchain(DEFAULT_TOOLCHAIN, true, tools);
        self
    }

    pub fn gen_dependency(mut self, path: &str) -> Self {
        self.gen_dependencies.push(PathBuf::from(path));
        self
    }

    pub fn target(mut self, target: TargetFixture) -> Self {
        self.targets.push(target.0);
        self
    }

    pub fn description(self) -> GraphDescription {
        GraphDescription {
            settings: self.settings,
            toolchains: self.toolchains,
            targets: self.targets,
            gen_dependencies: self.gen_dependencies,
        }
    }

    pub fn try_build(self) -> Result<BuildGraph, XcodeError> {
        BuildGraph::from_description(self.description())
    }

    pub fn build(self) -> BuildGraph {
        self.try_build().expect("fixture graph is valid")
    }
}

fn toolchain(label: &str, is_default: bool, tools: &[(&str, &str)]) -> Toolchain {
    Toolchain {
        label: Label::parse(label).expect("valid toolchain label"),
        is_default,
        tools: tools
            .iter()
            .map(|(name, dir)| {
                (
                    name.to_string(),
                    Tool {
                        default_output_dir: dir.to_string(),
                    },
                )
            })
            .collect(),
    }
}

/// A target under construction.
#[derive(Debug, Clone)]
pub struct TargetFixture(TargetDescription);

impl TargetFixture {
    pub fn new(label: &str, output_type: OutputType) -> Self {
        TargetFixture(TargetDescription {
            label: label.to_string(),
            toolchain: None,
            output_type,
            output_name: String::new(),
            output_dir: String::new(),
            sources: Vec::new(),
            inputs: Vec::new(),
            public_headers: Vec::new(),
            action_script: None,
            build_file: None,
            imports: Vec::new(),
            public_deps: Vec::new(),
            private_deps: Vec::new(),
            bundle: None,
        })
    }

    pub fn executable(label: &str) -> Self {
        Self::new(label, OutputType::Executable)
    }

    pub fn source_set(label: &str) -> Self {
        Self::new(label, OutputType::Other)
    }

    pub fn bundle_data(label: &str) -> Self {
        Self::new(label, OutputType::BundleData)
    }

    pub fn action(label: &str, script: &str) -> Self {
        let mut target = Self::new(label, OutputType::Action);
        target.0.action_script = Some(SourceFile::new(script));
        target
    }

    /// A `create_bundle` target producing `//out/Debug/<bundle_name>`.
    pub fn bundle(label: &str, product_type: &str, bundle_name: &str) -> Self {
        let mut target = Self::new(label, OutputType::CreateBundle);
        target.0.bundle = Some(BundleData {
            product_type: product_type.to_string(),
            bundle_root_dir: format!("//out/Debug/{}", bundle_name),
            bundle_dir: None,
            extra_attributes: BTreeMap::new(),
            test_application_name: String::new(),
        });
        target
    }

    pub fn test_application(mut self, name: &str) -> Self {
        if let Some(ref mut bundle) = self.0.bundle {
            bundle.test_application_name = name.to_string();
        }
        self
    }

    pub fn extra_attribute(mut self, key: &str, value: &str) -> Self {
        if let Some(ref mut bundle) = self.0.bundle {
            bundle
                .extra_attributes
                .insert(key.to_string(), value.into());
        }
        self
    }

    pub fn toolchain(mut self, label: &str) -> Self {
        self.0.toolchain = Some(label.to_string());
        self
    }

    pub fn output_name(mut self, name: &str) -> Self {
        self.0.output_name = name.to_string();
        self
    }

    pub fn output_dir(mut self, dir: &str) -> Self {
        self.0.output_dir = dir.to_string();
        self
    }

    pub fn sources(mut self, sources: &[&str]) -> Self {
        self.0
            .sources
            .extend(sources.iter().map(|s| SourceFile::new(*s)));
        self
    }

    pub fn inputs(mut self, inputs: &[&str]) -> Self {
        self.0.inputs.extend(inputs.iter().map(|s| SourceFile::new(*s)));
        self
    }

    pub fn public_headers(mut self, headers: &[&str]) -> Self {
        self.0
            .public_headers
            .extend(headers.iter().map(|s| SourceFile::new(*s)));
        self
    }

    pub fn build_file(mut self, path: &str) -> Self {
        self.0.build_file = Some(SourceFile::new(path));
        self
    }

    pub fn imports(mut self, imports: &[&str]) -> Self {
        self.0.imports.extend(imports.iter().map(|s| SourceFile::new(*s)));
        self
    }

    pub fn public_deps(mut self, deps: &[&str]) -> Self {
        self.0.public_deps.extend(deps.iter().map(|d| d.to_string()));
        self
    }

    pub fn deps(mut self, deps: &[&str]) -> Self {
        self.0.private_deps.extend(deps.iter().map(|d| d.to_string()));
        self
    }
}
