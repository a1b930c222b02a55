//! Xcode project objects.
//!
//! Every object of a generation run lives in one [`ObjectArena`] and is
//! addressed by an [`ObjectId`]. Objects own their children through id lists
//! (visited in insertion order); cross references such as a dependency's
//! target or a build file's file reference are plain ids that the traversal
//! does not follow.

use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;

/// Build settings attached to a configuration.
pub type PbxAttributes = BTreeMap<String, AttributeValue>;

/// A build setting value: a string or a nested dictionary.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    String(String),
    Map(PbxAttributes),
}

impl From<&str> for AttributeValue {
    fn from(s: &str) -> Self {
        AttributeValue::String(s.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(s: String) -> Self {
        AttributeValue::String(s)
    }
}

/// Class of a project object. Variants are declared in the order sections
/// appear in the project file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ObjectClass {
    AggregateTarget,
    BuildFile,
    ContainerItemProxy,
    FileReference,
    FrameworksBuildPhase,
    Group,
    NativeTarget,
    Project,
    ResourcesBuildPhase,
    ShellScriptBuildPhase,
    SourcesBuildPhase,
    TargetDependency,
    BuildConfiguration,
    ConfigurationList,
}

impl ObjectClass {
    /// The `isa` name used in the project file.
    pub fn as_str(self) -> &'static str {
        match self {
            ObjectClass::AggregateTarget => "PBXAggregateTarget",
            ObjectClass::BuildFile => "PBXBuildFile",
            ObjectClass::ContainerItemProxy => "PBXContainerItemProxy",
            ObjectClass::FileReference => "PBXFileReference",
            ObjectClass::FrameworksBuildPhase => "PBXFrameworksBuildPhase",
            ObjectClass::Group => "PBXGroup",
            ObjectClass::NativeTarget => "PBXNativeTarget",
            ObjectClass::Project => "PBXProject",
            ObjectClass::ResourcesBuildPhase => "PBXResourcesBuildPhase",
            ObjectClass::ShellScriptBuildPhase => "PBXShellScriptBuildPhase",
            ObjectClass::SourcesBuildPhase => "PBXSourcesBuildPhase",
            ObjectClass::TargetDependency => "PBXTargetDependency",
            ObjectClass::BuildConfiguration => "XCBuildConfiguration",
            ObjectClass::ConfigurationList => "XCConfigurationList",
        }
    }
}

impl fmt::Display for ObjectClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Handle to an object in an [`ObjectArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectId(usize);

/// Per-file compiler flag override.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompilerFlags {
    #[default]
    None,
    /// Pass `--help` so Xcode indexes the file without really compiling it.
    Help,
}

/// Fields shared by aggregate and native targets.
#[derive(Debug, Clone)]
pub struct TargetData {
    pub name: String,
    pub configurations: ObjectId,
    pub build_phases: Vec<ObjectId>,
    pub dependencies: Vec<ObjectId>,
}

#[derive(Debug, Clone)]
pub struct NativeTargetData {
    pub target: TargetData,
    pub product_name: String,
    pub product_type: String,
    /// Not owned: the file reference lives in the `Products` group.
    pub product_reference: ObjectId,
    pub sources_phase: ObjectId,
}

#[derive(Debug, Clone)]
pub struct ProjectData {
    pub name: String,
    pub configurations: ObjectId,
    pub main_group: ObjectId,
    pub sources_group: ObjectId,
    pub products_group: ObjectId,
    pub targets: Vec<ObjectId>,
}

/// A project object.
#[derive(Debug, Clone)]
pub enum Object {
    AggregateTarget(TargetData),
    BuildFile {
        file_ref: ObjectId,
        build_phase: ObjectId,
        compiler_flags: CompilerFlags,
    },
    ContainerItemProxy {
        project: ObjectId,
        target: ObjectId,
    },
    FileReference {
        name: String,
        path: String,
        /// Explicit product type; empty for source files.
        file_type: String,
    },
    FrameworksBuildPhase {
        files: Vec<ObjectId>,
    },
    Group {
        name: String,
        path: String,
        children: Vec<ObjectId>,
    },
    NativeTarget(NativeTargetData),
    Project(ProjectData),
    ResourcesBuildPhase {
        files: Vec<ObjectId>,
    },
    ShellScriptBuildPhase {
        name: String,
        script: String,
    },
    SourcesBuildPhase {
        files: Vec<ObjectId>,
    },
    TargetDependency {
        target: ObjectId,
        proxy: ObjectId,
    },
    BuildConfiguration {
        name: String,
        attributes: PbxAttributes,
    },
    ConfigurationList {
        owner: ObjectId,
        configurations: Vec<ObjectId>,
    },
}

impl Object {
    pub fn class(&self) -> ObjectClass {
        match self {
            Object::AggregateTarget(_) => ObjectClass::AggregateTarget,
            Object::BuildFile { .. } => ObjectClass::BuildFile,
            Object::ContainerItemProxy { .. } => ObjectClass::ContainerItemProxy,
            Object::FileReference { .. } => ObjectClass::FileReference,
            Object::FrameworksBuildPhase { .. } => ObjectClass::FrameworksBuildPhase,
            Object::Group { .. } => ObjectClass::Group,
            Object::NativeTarget(_) => ObjectClass::NativeTarget,
            Object::Project(_) => ObjectClass::Project,
            Object::ResourcesBuildPhase { .. } => ObjectClass::ResourcesBuildPhase,
            Object::ShellScriptBuildPhase { .. } => ObjectClass::ShellScriptBuildPhase,
            Object::SourcesBuildPhase { .. } => ObjectClass::SourcesBuildPhase,
            Object::TargetDependency { .. } => ObjectClass::TargetDependency,
            Object::BuildConfiguration { .. } => ObjectClass::BuildConfiguration,
            Object::ConfigurationList { .. } => ObjectClass::ConfigurationList,
        }
    }

    fn target_data(&self) -> Option<&TargetData> {
        match self {
            Object::AggregateTarget(data) => Some(data),
            Object::NativeTarget(native) => Some(&native.target),
            _ => None,
        }
    }

    fn target_data_mut(&mut self) -> Option<&mut TargetData> {
        match self {
            Object::AggregateTarget(data) => Some(data),
            Object::NativeTarget(native) => Some(&mut native.target),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
struct Node {
    id: Option<String>,
    object: Object,
}

/// Storage for every object of one project.
#[derive(Debug, Clone, Default)]
pub struct ObjectArena {
    nodes: Vec<Node>,
}

impl ObjectArena {
    pub fn new() -> Self {
        ObjectArena { nodes: Vec::new() }
    }

    pub fn alloc(&mut self, object: Object) -> ObjectId {
        self.nodes.push(Node { id: None, object });
        ObjectId(self.nodes.len() - 1)
    }

    pub fn get(&self, obj: ObjectId) -> &Object {
        &self.nodes[obj.0].object
    }

    pub fn get_mut(&mut self, obj: ObjectId) -> &mut Object {
        &mut self.nodes[obj.0].object
    }

    pub fn class(&self, obj: ObjectId) -> ObjectClass {
        self.get(obj).class()
    }

    /// Assigned identifier, if any.
    pub fn id(&self, obj: ObjectId) -> Option<&str> {
        self.nodes[obj.0].id.as_deref()
    }

    /// Assign the identifier of `obj`. Identifiers are assigned once.
    pub fn set_id(&mut self, obj: ObjectId, id: String) {
        debug_assert!(self.nodes[obj.0].id.is_none(), "identifier assigned twice");
        self.nodes[obj.0].id = Some(id);
    }

    /// Append a dependency edge to a target.
    pub fn push_dependency(&mut self, target: ObjectId, dependency: ObjectId) {
        if let Some(data) = self.get_mut(target).target_data_mut() {
            data.dependencies.push(dependency);
        }
    }

    /// Name of a target (aggregate or native).
    pub fn target_name(&self, obj: ObjectId) -> Option<&str> {
        self.get(obj).target_data().map(|d| d.name.as_str())
    }

    /// Human readable name, used to derive identifiers.
    pub fn name(&self, obj: ObjectId) -> String {
        match self.get(obj) {
            Object::AggregateTarget(data) => data.name.clone(),
            Object::NativeTarget(native) => native.target.name.clone(),
            Object::BuildFile {
                file_ref,
                build_phase,
                ..
            } => format!("{} in {}", self.name(*file_ref), self.name(*build_phase)),
            Object::ContainerItemProxy { .. } | Object::TargetDependency { .. } => {
                self.class(obj).as_str().to_string()
            }
            Object::FileReference { name, path, .. } | Object::Group { name, path, .. } => {
                if name.is_empty() {
                    path.clone()
                } else {
                    name.clone()
                }
            }
            Object::FrameworksBuildPhase { .. } => "Frameworks".to_string(),
            Object::ResourcesBuildPhase { .. } => "Resources".to_string(),
            Object::SourcesBuildPhase { .. } => "Sources".to_string(),
            Object::Project(project) => project.name.clone(),
            Object::ShellScriptBuildPhase { name, .. } => name.clone(),
            Object::BuildConfiguration { name, .. } => name.clone(),
            Object::ConfigurationList { owner, .. } => format!(
                "Build configuration list for {} \"{}\"",
                self.class(*owner),
                self.name(*owner)
            ),
        }
    }

    /// Comment printed next to references to `obj`.
    pub fn comment(&self, obj: ObjectId) -> String {
        match self.get(obj) {
            Object::Project(_) => "Project object".to_string(),
            _ => self.name(obj),
        }
    }

    /// `ID /* comment */`, or just the id when there is no comment.
    pub fn reference(&self, obj: ObjectId) -> String {
        let id = self.id(obj).unwrap_or_default();
        let comment = self.comment(obj);
        if comment.is_empty() {
            id.to_string()
        } else {
            format!("{} /* {} */", id, comment)
        }
    }

    /// Owned children of `obj`, in traversal order.
    pub fn children(&self, obj: ObjectId) -> Vec<ObjectId> {
        match self.get(obj) {
            Object::Project(project) => {
                let mut children = vec![project.configurations, project.main_group];
                children.extend(&project.targets);
                children
            }
            Object::AggregateTarget(data) => target_children(data),
            Object::NativeTarget(native) => target_children(&native.target),
            Object::Group { children, .. } => children.clone(),
            Object::FrameworksBuildPhase { files }
            | Object::ResourcesBuildPhase { files }
            | Object::SourcesBuildPhase { files } => files.clone(),
            Object::TargetDependency { proxy, .. } => vec![*proxy],
            Object::ConfigurationList { configurations, .. } => configurations.clone(),
            Object::BuildFile { .. }
            | Object::ContainerItemProxy { .. }
            | Object::FileReference { .. }
            | Object::ShellScriptBuildPhase { .. }
            | Object::BuildConfiguration { .. } => Vec::new(),
        }
    }

    /// Depth-first pre-order walk of the ownership tree rooted at `root`.
    pub fn visit(&self, root: ObjectId, mut f: impl FnMut(ObjectId)) {
        let mut stack = vec![root];
        while let Some(obj) = stack.pop() {
            f(obj);
            stack.extend(self.children(obj).into_iter().rev());
        }
    }

    /// Ids of every object reachable from `root`, in traversal order.
    pub fn walk(&self, root: ObjectId) -> Vec<ObjectId> {
        let mut objects = Vec::with_capacity(self.nodes.len());
        self.visit(root, |obj| objects.push(obj));
        objects
    }
}

fn target_children(data: &TargetData) -> Vec<ObjectId> {
    let mut children = vec![data.configurations];
    children.extend(&data.dependencies);
    children.extend(&data.build_phases);
    children
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_order_matches_section_order() {
        let mut classes = vec![
            ObjectClass::ConfigurationList,
            ObjectClass::Project,
            ObjectClass::AggregateTarget,
            ObjectClass::BuildConfiguration,
        ];
        classes.sort();
        let names: Vec<_> = classes.iter().map(|c| c.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "PBXAggregateTarget",
                "PBXProject",
                "XCBuildConfiguration",
                "XCConfigurationList"
            ]
        );
    }

    #[test]
    fn test_visit_is_preorder_in_insertion_order() {
        let mut arena = ObjectArena::new();
        let a = arena.alloc(Object::FileReference {
            name: String::new(),
            path: "a.cc".to_string(),
            file_type: String::new(),
        });
        let b = arena.alloc(Object::FileReference {
            name: String::new(),
            path: "b.cc".to_string(),
            file_type: String::new(),
        });
        let inner = arena.alloc(Object::Group {
            name: "inner".to_string(),
            path: "inner".to_string(),
            children: vec![b],
        });
        let root = arena.alloc(Object::Group {
            name: String::new(),
            path: String::new(),
            children: vec![inner, a],
        });

        assert_eq!(arena.walk(root), vec![root, inner, b, a]);
    }

    #[test]
    fn test_configuration_list_name() {
        let mut arena = ObjectArena::new();
        let config = arena.alloc(Object::BuildConfiguration {
            name: "Debug".to_string(),
            attributes: PbxAttributes::new(),
        });
        let placeholder = arena.alloc(Object::ConfigurationList {
            owner: config,
            configurations: vec![config],
        });
        let phase = arena.alloc(Object::SourcesBuildPhase { files: Vec::new() });
        let target = arena.alloc(Object::AggregateTarget(TargetData {
            name: "All".to_string(),
            configurations: placeholder,
            build_phases: vec![phase],
            dependencies: Vec::new(),
        }));
        if let Object::ConfigurationList { owner, .. } = arena.get_mut(placeholder) {
            *owner = target;
        }

        assert_eq!(
            arena.name(placeholder),
            "Build configuration list for PBXAggregateTarget \"All\""
        );
        arena.set_id(phase, "0123456789ABCDEF01234567".to_string());
        assert_eq!(arena.reference(phase), "0123456789ABCDEF01234567 /* Sources */");
    }
}
