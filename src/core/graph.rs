//! The resolved build graph consumed by the project generator.
//!
//! The graph is produced by an external resolver and handed to us as JSON.
//! Dependencies are given as labels and resolved to [`TargetId`] handles once
//! at load time, so later passes can walk the graph without string lookups.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::core::label::Label;
use crate::util::fs::read_to_string;
use crate::util::paths;
use crate::xcode::errors::XcodeError;
use crate::xcode::object::AttributeValue;

/// Handle to a target in a [`BuildGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TargetId(pub usize);

/// Kind of output a target produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputType {
    Executable,
    CreateBundle,
    BundleData,
    Action,
    ActionForeach,
    #[serde(other)]
    Other,
}

/// A source-absolute (`//foo/bar.cc`) or system-absolute file path.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(transparent)]
pub struct SourceFile(String);

impl SourceFile {
    pub fn new(value: impl Into<String>) -> Self {
        SourceFile(value.into())
    }

    pub fn value(&self) -> &str {
        &self.0
    }

    /// File name component.
    pub fn name(&self) -> &str {
        paths::file_name(&self.0)
    }
}

/// Bundle metadata attached to `create_bundle` targets.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BundleData {
    /// Xcode product type, e.g. `com.apple.product-type.application`.
    pub product_type: String,

    /// Source-absolute path of the bundle root (`//out/Debug/Foo.app`).
    pub bundle_root_dir: String,

    /// Source-absolute directory containing the bundle. Defaults to the
    /// parent of `bundle_root_dir`.
    pub bundle_dir: Option<String>,

    /// Extra build settings forwarded verbatim to the Xcode target.
    pub extra_attributes: BTreeMap<String, AttributeValue>,

    /// Name of the application target a test bundle runs against.
    pub test_application_name: String,
}

impl BundleData {
    /// Directory the bundle is produced in.
    pub fn bundle_dir(&self) -> String {
        if let Some(ref dir) = self.bundle_dir {
            return dir.clone();
        }
        let root = self.bundle_root_dir.trim_end_matches('/');
        match root.rfind('/') {
            Some(i) if i > 1 => root[..i].to_string(),
            _ => "//".to_string(),
        }
    }
}

/// A tool defined by a toolchain.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Tool {
    /// Pattern for the default output directory, e.g. `{{root_out_dir}}`.
    pub default_output_dir: String,
}

/// A toolchain and the tools it defines.
#[derive(Debug, Clone, Deserialize)]
pub struct Toolchain {
    #[serde(deserialize_with = "deserialize_label")]
    pub label: Label,

    #[serde(default)]
    pub is_default: bool,

    #[serde(default)]
    pub tools: BTreeMap<String, Tool>,
}

impl Toolchain {
    /// Tool used to produce the final output of an executable.
    pub fn linker(&self) -> Option<&Tool> {
        self.tools.get("link")
    }
}

/// Build settings shared by every target.
#[derive(Debug, Clone, Deserialize)]
pub struct BuildSettings {
    /// Absolute path to the source root.
    pub root_path: PathBuf,

    /// Source-absolute build directory, e.g. `//out/Debug/`.
    pub build_dir: String,

    /// Platform override (`ios`, `tvos`; anything else means macOS).
    #[serde(default)]
    pub target_os: Option<String>,
}

/// Target platform of the generated project.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetOs {
    Ios,
    Tvos,
    Macos,
}

impl TargetOs {
    /// Whether standalone executables can be debugged on this platform.
    pub fn supports_executables(self) -> bool {
        matches!(self, TargetOs::Macos)
    }
}

impl BuildSettings {
    pub fn target_os(&self) -> TargetOs {
        match self.target_os.as_deref() {
            Some("ios") => TargetOs::Ios,
            Some("tvos") => TargetOs::Tvos,
            _ => TargetOs::Macos,
        }
    }

    /// Absolute filesystem path of a source-absolute path.
    pub fn full_path(&self, source_absolute: &str) -> PathBuf {
        let rel = source_absolute.trim_start_matches("//");
        if rel.is_empty() {
            self.root_path.clone()
        } else {
            self.root_path.join(rel)
        }
    }

    /// Path of the source root as seen from the build directory.
    pub fn source_root_from_build_dir(&self) -> String {
        paths::source_root_from(&self.build_dir, &self.root_path)
    }

    /// Rebase a source-absolute path to be relative to the build directory.
    pub fn rebase_to_build_dir(&self, path: &str) -> String {
        paths::rebase_path(path, &self.build_dir, &self.root_path)
    }

    /// Rebase a source-absolute path to be relative to the source root.
    pub fn rebase_to_root(&self, path: &str) -> String {
        paths::rebase_path(path, "//", &self.root_path)
    }

    /// Configuration name derived from the build directory, following the
    /// `out/$configuration-$platform` convention (`out/Debug-iphonesimulator`
    /// gives `Debug`).
    pub fn config_name(&self) -> String {
        let base = paths::file_name(&self.build_dir);
        let name = base.split('-').next().unwrap_or(base);
        if name.is_empty() {
            "Default".to_string()
        } else {
            name.to_string()
        }
    }
}

/// A resolved target.
#[derive(Debug, Clone)]
pub struct Target {
    pub label: Label,
    pub toolchain: usize,
    pub output_type: OutputType,
    pub output_name: String,
    pub output_dir: String,
    pub sources: Vec<SourceFile>,
    pub inputs: Vec<SourceFile>,
    pub public_headers: Vec<SourceFile>,
    pub action_script: Option<SourceFile>,
    pub build_file: Option<SourceFile>,
    pub imports: Vec<SourceFile>,
    pub public_deps: Vec<TargetId>,
    pub private_deps: Vec<TargetId>,
    pub bundle: BundleData,
}

impl Target {
    /// Public dependencies followed by private ones.
    pub fn deps(&self) -> impl Iterator<Item = TargetId> + '_ {
        self.public_deps
            .iter()
            .chain(self.private_deps.iter())
            .copied()
    }

    /// Name of the final output, defaulting to the label name.
    pub fn output_name(&self) -> &str {
        if self.output_name.is_empty() {
            self.label.name()
        } else {
            &self.output_name
        }
    }
}

/// The whole resolved build graph.
#[derive(Debug, Clone)]
pub struct BuildGraph {
    pub settings: BuildSettings,
    pub toolchains: Vec<Toolchain>,
    targets: Vec<Target>,

    /// Absolute paths of every file the graph resolution itself read.
    pub gen_dependencies: Vec<PathBuf>,
}

impl BuildGraph {
    /// Load a graph description from a JSON file.
    pub fn load(path: &Path) -> Result<Self, XcodeError> {
        let contents = read_to_string(path)?;
        Self::from_json(&contents).map_err(|e| match e {
            XcodeError::Parse { message, .. } => XcodeError::Parse {
                path: path.to_path_buf(),
                message,
            },
            other => other,
        })
    }

    /// Parse a graph description from JSON text.
    pub fn from_json(json: &str) -> Result<Self, XcodeError> {
        let description: GraphDescription =
            serde_json::from_str(json).map_err(|e| XcodeError::Parse {
                path: PathBuf::from("<input>"),
                message: e.to_string(),
            })?;
        Self::from_description(description)
    }

    /// Resolve labels in a deserialized description.
    pub fn from_description(description: GraphDescription) -> Result<Self, XcodeError> {
        let GraphDescription {
            settings,
            toolchains,
            targets: raw_targets,
            gen_dependencies,
        } = description;

        if !paths::is_source_absolute(&settings.build_dir) || paths::escapes_root(&settings.build_dir)
        {
            return Err(XcodeError::PathResolution {
                path: settings.build_dir.clone(),
                base: settings.root_path.display().to_string(),
            });
        }

        let defaults: Vec<usize> = toolchains
            .iter()
            .enumerate()
            .filter(|(_, t)| t.is_default)
            .map(|(i, _)| i)
            .collect();
        let default_toolchain = match defaults[..] {
            [only] => only,
            _ => {
                return Err(XcodeError::DefaultToolchain {
                    count: defaults.len(),
                })
            }
        };
        let toolchain_index: HashMap<Label, usize> = toolchains
            .iter()
            .enumerate()
            .map(|(i, t)| (t.label.clone(), i))
            .collect();

        // First pass: assign ids.
        let mut index: HashMap<(Label, usize), TargetId> = HashMap::new();
        let mut partial = Vec::with_capacity(raw_targets.len());
        for (i, raw) in raw_targets.into_iter().enumerate() {
            let label: Label = raw.label.parse()?;
            let toolchain = match raw.toolchain {
                Some(ref name) => {
                    let tc: Label = name.parse()?;
                    *toolchain_index
                        .get(&tc)
                        .ok_or_else(|| XcodeError::UnknownToolchain {
                            target: label.to_string(),
                            toolchain: name.clone(),
                        })?
                }
                None if toolchains.is_empty() => {
                    return Err(XcodeError::UnknownToolchain {
                        target: label.to_string(),
                        toolchain: "<default>".to_string(),
                    })
                }
                None => default_toolchain,
            };

            if index.insert((label.clone(), toolchain), TargetId(i)).is_some() {
                return Err(XcodeError::DuplicateLabel {
                    label: label.to_string(),
                });
            }
            partial.push((label, toolchain, raw));
        }

        // Second pass: resolve dependency labels.
        let resolve = |owner: &Label, owner_tc: usize, dep: &str| -> Result<TargetId, XcodeError> {
            let unknown = || XcodeError::UnknownDependency {
                target: owner.to_string(),
                dependency: dep.to_string(),
            };
            let (label, toolchain) = match dep.find('(') {
                Some(open) => {
                    let tc_text = dep[open + 1..].strip_suffix(')').ok_or_else(unknown)?;
                    let tc = Label::parse(tc_text).ok_or_else(unknown)?;
                    let tc = *toolchain_index.get(&tc).ok_or_else(unknown)?;
                    (&dep[..open], tc)
                }
                None => (dep, owner_tc),
            };
            let label = Label::parse(label).ok_or_else(unknown)?;
            index.get(&(label, toolchain)).copied().ok_or_else(unknown)
        };

        let mut targets = Vec::with_capacity(partial.len());
        for (label, toolchain, raw) in partial {
            let public_deps = raw
                .public_deps
                .iter()
                .map(|d| resolve(&label, toolchain, d))
                .collect::<Result<Vec<_>, _>>()?;
            let private_deps = raw
                .private_deps
                .iter()
                .map(|d| resolve(&label, toolchain, d))
                .collect::<Result<Vec<_>, _>>()?;

            targets.push(Target {
                label,
                toolchain,
                output_type: raw.output_type,
                output_name: raw.output_name,
                output_dir: raw.output_dir,
                sources: raw.sources,
                inputs: raw.inputs,
                public_headers: raw.public_headers,
                action_script: raw.action_script,
                build_file: raw.build_file,
                imports: raw.imports,
                public_deps,
                private_deps,
                bundle: raw.bundle.unwrap_or_default(),
            });
        }

        let graph = BuildGraph {
            settings,
            toolchains,
            targets,
            gen_dependencies,
        };
        graph.check_acyclic()?;
        Ok(graph)
    }

    /// All targets, in definition order.
    pub fn targets(&self) -> impl Iterator<Item = (TargetId, &Target)> {
        self.targets.iter().enumerate().map(|(i, t)| (TargetId(i), t))
    }

    pub fn target(&self, id: TargetId) -> &Target {
        &self.targets[id.0]
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Toolchain a target is built with.
    pub fn toolchain_of(&self, id: TargetId) -> &Toolchain {
        &self.toolchains[self.target(id).toolchain]
    }

    /// Whether a target is built with the default toolchain.
    pub fn is_default_toolchain(&self, id: TargetId) -> bool {
        self.toolchain_of(id).is_default
    }

    fn check_acyclic(&self) -> Result<(), XcodeError> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            New,
            Active,
            Done,
        }

        let mut marks = vec![Mark::New; self.targets.len()];
        for start in 0..self.targets.len() {
            if marks[start] != Mark::New {
                continue;
            }

            // Explicit stack of (target, next dependency index).
            let mut stack = vec![(TargetId(start), 0usize)];
            marks[start] = Mark::Active;

            while let Some(top) = stack.last_mut() {
                let (id, next) = *top;
                top.1 += 1;
                match self.targets[id.0].deps().nth(next) {
                    Some(dep) => match marks[dep.0] {
                        Mark::New => {
                            marks[dep.0] = Mark::Active;
                            stack.push((dep, 0));
                        }
                        Mark::Active => {
                            let pos = stack.iter().position(|(t, _)| *t == dep).unwrap_or(0);
                            let mut cycle: Vec<String> = stack[pos..]
                                .iter()
                                .map(|(t, _)| self.targets[t.0].label.to_string())
                                .collect();
                            cycle.push(self.targets[dep.0].label.to_string());
                            return Err(XcodeError::DependencyCycle { targets: cycle });
                        }
                        Mark::Done => {}
                    },
                    None => {
                        marks[id.0] = Mark::Done;
                        stack.pop();
                    }
                }
            }
        }
        Ok(())
    }
}

/// On-disk form of the build graph.
#[derive(Debug, Clone, Deserialize)]
pub struct GraphDescription {
    pub settings: BuildSettings,

    #[serde(default)]
    pub toolchains: Vec<Toolchain>,

    #[serde(default)]
    pub targets: Vec<TargetDescription>,

    #[serde(default)]
    pub gen_dependencies: Vec<PathBuf>,
}

/// On-disk form of a target; dependencies are still labels.
#[derive(Debug, Clone, Deserialize)]
pub struct TargetDescription {
    pub label: String,

    /// Toolchain label; the default toolchain when absent.
    #[serde(default)]
    pub toolchain: Option<String>,

    pub output_type: OutputType,

    #[serde(default)]
    pub output_name: String,

    #[serde(default)]
    pub output_dir: String,

    #[serde(default)]
    pub sources: Vec<SourceFile>,

    #[serde(default)]
    pub inputs: Vec<SourceFile>,

    #[serde(default)]
    pub public_headers: Vec<SourceFile>,

    #[serde(default)]
    pub action_script: Option<SourceFile>,

    /// The build file the target is defined in.
    #[serde(default)]
    pub build_file: Option<SourceFile>,

    /// Files imported while evaluating the build file.
    #[serde(default)]
    pub imports: Vec<SourceFile>,

    #[serde(default)]
    pub public_deps: Vec<String>,

    #[serde(default)]
    pub private_deps: Vec<String>,

    #[serde(default)]
    pub bundle: Option<BundleData>,
}

fn deserialize_label<'de, D>(deserializer: D) -> Result<Label, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    Label::parse(&s).ok_or_else(|| serde::de::Error::custom(format!("invalid label `{}`", s)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const GRAPH: &str = r#"{
        "settings": { "root_path": "/src", "build_dir": "//out/Debug-iphonesimulator/", "target_os": "ios" },
        "toolchains": [
            { "label": "//build/toolchain:ios", "is_default": true, "tools": { "link": { "default_output_dir": "{{root_out_dir}}" } } },
            { "label": "//build/toolchain:host" }
        ],
        "targets": [
            { "label": "//app:app", "output_type": "create_bundle",
              "private_deps": ["//base:base", "//tools:gen(//build/toolchain:host)"],
              "bundle": { "product_type": "com.apple.product-type.application",
                          "bundle_root_dir": "//out/Debug-iphonesimulator/app.app" } },
            { "label": "//base:base", "output_type": "source_set", "sources": ["//base/a.cc"] },
            { "label": "//tools:gen", "toolchain": "//build/toolchain:host", "output_type": "executable" }
        ]
    }"#;

    #[test]
    fn test_load_and_resolve() {
        let graph = BuildGraph::from_json(GRAPH).unwrap();
        assert_eq!(graph.len(), 3);
        assert_eq!(graph.settings.target_os(), TargetOs::Ios);
        assert_eq!(graph.settings.config_name(), "Debug");

        let app = graph.target(TargetId(0));
        assert_eq!(app.output_type, OutputType::CreateBundle);
        assert_eq!(app.private_deps, vec![TargetId(1), TargetId(2)]);
        assert_eq!(app.bundle.bundle_dir(), "//out/Debug-iphonesimulator");

        assert_eq!(graph.target(TargetId(1)).output_type, OutputType::Other);
        assert!(graph.is_default_toolchain(TargetId(1)));
        assert!(!graph.is_default_toolchain(TargetId(2)));
    }

    #[test]
    fn test_unknown_dependency() {
        let json = GRAPH.replace("//base:base\", \"//tools", "//base:nope\", \"//tools");
        let err = BuildGraph::from_json(&json).unwrap_err();
        assert!(matches!(err, XcodeError::UnknownDependency { .. }));
        assert!(err.to_string().contains("//base:nope"));
    }

    #[test]
    fn test_cycle_is_rejected() {
        let json = r#"{
            "settings": { "root_path": "/src", "build_dir": "//out/Debug/" },
            "toolchains": [ { "label": "//tc:default", "is_default": true } ],
            "targets": [
                { "label": "//a:a", "output_type": "group", "public_deps": ["//b:b"] },
                { "label": "//b:b", "output_type": "group", "private_deps": ["//a:a"] }
            ]
        }"#;
        let err = BuildGraph::from_json(json).unwrap_err();
        match err {
            XcodeError::DependencyCycle { targets } => {
                assert_eq!(targets, vec!["//a:a", "//b:b", "//a:a"]);
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_exactly_one_default_toolchain() {
        let none = r#"{
            "settings": { "root_path": "/src", "build_dir": "//out/Debug/" },
            "toolchains": [ { "label": "//tc:mac" } ],
            "targets": [ { "label": "//tools:gen", "output_type": "executable" } ]
        }"#;
        let err = BuildGraph::from_json(none).unwrap_err();
        assert!(matches!(err, XcodeError::DefaultToolchain { count: 0 }));
        assert_eq!(err.kind(), crate::xcode::errors::ErrorKind::GraphConsistency);

        let two = none.replace(
            r#"[ { "label": "//tc:mac" } ]"#,
            r#"[ { "label": "//tc:mac", "is_default": true }, { "label": "//tc:ios", "is_default": true } ]"#,
        );
        let err = BuildGraph::from_json(&two).unwrap_err();
        assert!(matches!(err, XcodeError::DefaultToolchain { count: 2 }));
    }

    #[test]
    fn test_build_dir_must_be_source_absolute() {
        let json = r#"{ "settings": { "root_path": "/src", "build_dir": "out/Debug" } }"#;
        let err = BuildGraph::from_json(json).unwrap_err();
        assert!(matches!(err, XcodeError::PathResolution { .. }));
    }
}
