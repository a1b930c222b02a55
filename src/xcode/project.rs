//! Building the object tree of an Xcode project.

use crate::util::paths;
use crate::xcode::file_type;
use crate::xcode::object::{
    AttributeValue, CompilerFlags, NativeTargetData, Object, ObjectArena, ObjectClass, ObjectId,
    PbxAttributes, ProjectData, TargetData,
};

/// Product type of command line tools.
pub const PRODUCT_TYPE_TOOL: &str = "com.apple.product-type.tool";

/// File type of the products of command line tools.
pub const FILE_TYPE_EXECUTABLE: &str = "compiled.mach-o.executable";

/// Name of the synthetic target that indexes every source file.
pub const INDEXING_TARGET_NAME: &str = "sources";

/// An Xcode project under construction.
///
/// Owns the arena holding every object. The root `PBXProject` owns a
/// configuration list, the main group (with `Source` and `Products`
/// sub-groups) and all targets.
#[derive(Debug, Clone)]
pub struct PbxProject {
    arena: ObjectArena,
    root: ObjectId,
    config_name: String,
    target_for_indexing: Option<ObjectId>,
}

impl PbxProject {
    /// Create an empty project.
    ///
    /// `source_path` is the path of the source root relative to the directory
    /// holding the `.xcodeproj`.
    pub fn new(
        name: &str,
        config_name: &str,
        source_path: &str,
        attributes: PbxAttributes,
    ) -> Self {
        let mut arena = ObjectArena::new();

        let sources_group = arena.alloc(Object::Group {
            name: "Source".to_string(),
            path: source_path.to_string(),
            children: Vec::new(),
        });
        let products_group = arena.alloc(Object::Group {
            name: "Products".to_string(),
            path: String::new(),
            children: Vec::new(),
        });
        let main_group = arena.alloc(Object::Group {
            name: String::new(),
            path: String::new(),
            children: vec![sources_group, products_group],
        });

        let (configurations, fixup) = alloc_configuration_list(&mut arena, config_name, attributes);
        let root = arena.alloc(Object::Project(ProjectData {
            name: name.to_string(),
            configurations,
            main_group,
            sources_group,
            products_group,
            targets: Vec::new(),
        }));
        fixup(&mut arena, root);

        PbxProject {
            arena,
            root,
            config_name: config_name.to_string(),
            target_for_indexing: None,
        }
    }

    pub fn arena(&self) -> &ObjectArena {
        &self.arena
    }

    pub fn arena_mut(&mut self) -> &mut ObjectArena {
        &mut self.arena
    }

    /// The `PBXProject` object.
    pub fn root(&self) -> ObjectId {
        self.root
    }

    /// Project name, also the seed of identifier derivation.
    pub fn name(&self) -> &str {
        &self.data().name
    }

    fn data(&self) -> &ProjectData {
        match self.arena.get(self.root) {
            Object::Project(data) => data,
            _ => unreachable!("root is always a PBXProject"),
        }
    }

    fn data_mut(&mut self) -> &mut ProjectData {
        match self.arena.get_mut(self.root) {
            Object::Project(data) => data,
            _ => unreachable!("root is always a PBXProject"),
        }
    }

    pub fn sources_group(&self) -> ObjectId {
        self.data().sources_group
    }

    fn products_group(&self) -> ObjectId {
        self.data().products_group
    }

    /// Targets in insertion order.
    pub fn targets(&self) -> &[ObjectId] {
        &self.data().targets
    }

    /// Add a file to the `Source` group and, if it is compilable, to the
    /// sources of the indexing target.
    pub fn add_source_file_to_indexing_target(
        &mut self,
        navigator_path: &str,
        source_path: &str,
        flags: CompilerFlags,
    ) {
        let target = match self.target_for_indexing {
            Some(target) => target,
            None => self.add_indexing_target(),
        };
        self.add_source_file(navigator_path, source_path, flags, target);
    }

    /// Add a file to the `Source` group and, if it is compilable, to the
    /// sources build phase of `target`.
    pub fn add_source_file(
        &mut self,
        navigator_path: &str,
        source_path: &str,
        flags: CompilerFlags,
        target: ObjectId,
    ) {
        let group = self.sources_group();
        let file_ref = self.add_file_to_group(group, navigator_path, source_path);

        if !file_type::is_source_file_for_indexing(paths::extension(source_path)) {
            return;
        }

        let phase = match self.arena.get(target) {
            Object::NativeTarget(native) => native.sources_phase,
            _ => return,
        };
        let build_file = self.arena.alloc(Object::BuildFile {
            file_ref,
            build_phase: phase,
            compiler_flags: flags,
        });
        if let Object::SourcesBuildPhase { files } = self.arena.get_mut(phase) {
            files.push(build_file);
        }
    }

    /// Insert a file reference under `group`, creating one sub-group per
    /// directory component of `navigator_path`. Adding the same file twice
    /// returns the existing reference.
    pub fn add_file_to_group(
        &mut self,
        group: ObjectId,
        navigator_path: &str,
        source_path: &str,
    ) -> ObjectId {
        let (component, rest) = match navigator_path.split_once('/') {
            Some((component, rest)) => (component, Some(rest)),
            None => (navigator_path, None),
        };

        let children = match self.arena.get(group) {
            Object::Group { children, .. } => children.clone(),
            _ => Vec::new(),
        };

        let Some(rest) = rest else {
            let existing = children.iter().copied().find(|&child| {
                matches!(
                    self.arena.get(child),
                    Object::FileReference { path, .. } if path == component
                )
            });
            if let Some(existing) = existing {
                return existing;
            }
            let file_ref = self.arena.alloc(Object::FileReference {
                name: String::new(),
                path: component.to_string(),
                file_type: String::new(),
            });
            self.push_child(group, file_ref);
            return file_ref;
        };

        let existing = children.iter().copied().find(|&child| {
            matches!(
                self.arena.get(child),
                Object::Group { name, .. } if name == component
            )
        });
        let subgroup = match existing {
            Some(subgroup) => subgroup,
            None => {
                let subgroup = self.arena.alloc(Object::Group {
                    name: component.to_string(),
                    path: component.to_string(),
                    children: Vec::new(),
                });
                self.push_child(group, subgroup);
                subgroup
            }
        };
        self.add_file_to_group(subgroup, rest, source_path)
    }

    fn push_child(&mut self, group: ObjectId, child: ObjectId) {
        if let Object::Group { children, .. } = self.arena.get_mut(group) {
            children.push(child);
        }
    }

    /// Add an aggregate target running `shell_script`.
    pub fn add_aggregate_target(&mut self, name: &str, shell_script: &str) -> ObjectId {
        let mut attributes = PbxAttributes::new();
        attributes.insert("CLANG_ENABLE_OBJC_WEAK".into(), "YES".into());
        attributes.insert("CODE_SIGN_IDENTITY".into(), "".into());
        attributes.insert("CODE_SIGNING_REQUIRED".into(), "NO".into());
        attributes.insert("CONFIGURATION_BUILD_DIR".into(), ".".into());
        attributes.insert("PRODUCT_NAME".into(), name.into());

        let config_name = self.config_name.clone();
        let (configurations, fixup) =
            alloc_configuration_list(&mut self.arena, &config_name, attributes);
        let build_phases = self.alloc_shell_script_phase(name, shell_script);

        let target = self.arena.alloc(Object::AggregateTarget(TargetData {
            name: name.to_string(),
            configurations,
            build_phases,
            dependencies: Vec::new(),
        }));
        fixup(&mut self.arena, target);
        self.data_mut().targets.push(target);
        target
    }

    fn add_indexing_target(&mut self) -> ObjectId {
        let mut attributes = PbxAttributes::new();
        attributes.insert("EXECUTABLE_PREFIX".into(), "".into());
        let source_path = match self.arena.get(self.sources_group()) {
            Object::Group { path, .. } => path.clone(),
            _ => String::new(),
        };
        attributes.insert("HEADER_SEARCH_PATHS".into(), source_path.into());
        attributes.insert("PRODUCT_NAME".into(), INDEXING_TARGET_NAME.into());

        let product = self.alloc_product(INDEXING_TARGET_NAME, FILE_TYPE_EXECUTABLE);
        let target = self.alloc_native_target(
            INDEXING_TARGET_NAME,
            "",
            attributes,
            PRODUCT_TYPE_TOOL,
            INDEXING_TARGET_NAME,
            product,
        );
        self.target_for_indexing = Some(target);
        target
    }

    /// Add a native target whose build is delegated to `shell_script`.
    ///
    /// `file_type` is the type of the product file reference; when empty it is
    /// derived from the extension of `output_name`.
    #[allow(clippy::too_many_arguments)]
    pub fn add_native_target(
        &mut self,
        name: &str,
        file_type: &str,
        output_name: &str,
        product_type: &str,
        output_dir: &str,
        shell_script: &str,
        extra_attributes: PbxAttributes,
    ) -> ObjectId {
        let file_type = if file_type.is_empty() {
            file_type::source_type(paths::extension(output_name))
        } else {
            file_type
        };
        let product = self.alloc_product(output_name, file_type);

        // PRODUCT_NAME is the basename of the product without its extension.
        let product_name = paths::file_stem(output_name).to_string();

        let mut attributes = extra_attributes;
        attributes.insert("CODE_SIGNING_REQUIRED".into(), "NO".into());
        attributes.insert("CONFIGURATION_BUILD_DIR".into(), output_dir.into());
        attributes.insert(
            "PRODUCT_NAME".into(),
            AttributeValue::String(product_name.clone()),
        );

        self.alloc_native_target(
            name,
            shell_script,
            attributes,
            product_type,
            &product_name,
            product,
        )
    }

    /// Make `dependent` depend on `base` so Xcode builds `base` first.
    pub fn add_dependency(&mut self, base: ObjectId, dependent: ObjectId) -> ObjectId {
        let proxy = self.arena.alloc(Object::ContainerItemProxy {
            project: self.root,
            target: base,
        });
        let dependency = self.arena.alloc(Object::TargetDependency {
            target: base,
            proxy,
        });
        self.arena.push_dependency(dependent, dependency);
        dependency
    }

    fn alloc_product(&mut self, output_name: &str, file_type: &str) -> ObjectId {
        let product = self.arena.alloc(Object::FileReference {
            name: String::new(),
            path: output_name.to_string(),
            file_type: file_type.to_string(),
        });
        let products = self.products_group();
        self.push_child(products, product);
        product
    }

    fn alloc_shell_script_phase(&mut self, name: &str, shell_script: &str) -> Vec<ObjectId> {
        if shell_script.is_empty() {
            return Vec::new();
        }
        vec![self.arena.alloc(Object::ShellScriptBuildPhase {
            name: format!("Action \"Compile and copy {} via ninja\"", name),
            script: shell_script.to_string(),
        })]
    }

    fn alloc_native_target(
        &mut self,
        name: &str,
        shell_script: &str,
        attributes: PbxAttributes,
        product_type: &str,
        product_name: &str,
        product_reference: ObjectId,
    ) -> ObjectId {
        let config_name = self.config_name.clone();
        let (configurations, fixup) =
            alloc_configuration_list(&mut self.arena, &config_name, attributes);

        let mut build_phases = self.alloc_shell_script_phase(name, shell_script);
        let sources_phase = self
            .arena
            .alloc(Object::SourcesBuildPhase { files: Vec::new() });
        build_phases.push(sources_phase);
        build_phases.push(
            self.arena
                .alloc(Object::FrameworksBuildPhase { files: Vec::new() }),
        );
        build_phases.push(
            self.arena
                .alloc(Object::ResourcesBuildPhase { files: Vec::new() }),
        );

        let target = self.arena.alloc(Object::NativeTarget(NativeTargetData {
            target: TargetData {
                name: name.to_string(),
                configurations,
                build_phases,
                dependencies: Vec::new(),
            },
            product_name: product_name.to_string(),
            product_type: product_type.to_string(),
            product_reference,
            sources_phase,
        }));
        fixup(&mut self.arena, target);
        self.data_mut().targets.push(target);
        target
    }

    /// Number of objects of `class` reachable from the root.
    pub fn count(&self, class: ObjectClass) -> usize {
        self.arena
            .walk(self.root)
            .into_iter()
            .filter(|&obj| self.arena.class(obj) == class)
            .count()
    }
}

/// Allocate a configuration list holding one configuration. The owner is not
/// known yet; the returned closure patches it in once the owner exists.
fn alloc_configuration_list(
    arena: &mut ObjectArena,
    config_name: &str,
    attributes: PbxAttributes,
) -> (ObjectId, impl FnOnce(&mut ObjectArena, ObjectId)) {
    let configuration = arena.alloc(Object::BuildConfiguration {
        name: config_name.to_string(),
        attributes,
    });
    let list = arena.alloc(Object::ConfigurationList {
        owner: configuration,
        configurations: vec![configuration],
    });
    let fixup = move |arena: &mut ObjectArena, owner: ObjectId| {
        if let Object::ConfigurationList { owner: slot, .. } = arena.get_mut(list) {
            *slot = owner;
        }
    };
    (list, fixup)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project() -> PbxProject {
        PbxProject::new("all", "Debug", "../..", PbxAttributes::new())
    }

    #[test]
    fn test_source_files_create_groups_once() {
        let mut project = project();
        project.add_source_file_to_indexing_target("base/a.cc", "base/a.cc", CompilerFlags::None);
        project.add_source_file_to_indexing_target("base/a.h", "base/a.h", CompilerFlags::None);
        project.add_source_file_to_indexing_target("base/a.cc", "base/a.cc", CompilerFlags::None);

        assert_eq!(project.count(ObjectClass::FileReference), 3); // 2 sources + product
        // Source, Products, main group and `base`.
        assert_eq!(project.count(ObjectClass::Group), 4);
        // Headers are not compiled, so only the .cc files get build files.
        assert_eq!(project.count(ObjectClass::BuildFile), 2);
        assert_eq!(project.arena().target_name(project.targets()[0]), Some("sources"));
    }

    #[test]
    fn test_native_target_layout() {
        let mut project = project();
        let target = project.add_native_target(
            "app",
            "",
            "app.app",
            "com.apple.product-type.application",
            ".",
            "print('hi')",
            PbxAttributes::new(),
        );

        let Object::NativeTarget(native) = project.arena().get(target) else {
            panic!("expected a native target");
        };
        assert_eq!(native.product_name, "app");
        assert_eq!(native.target.build_phases.len(), 4);
        assert_eq!(
            project.arena().class(native.target.build_phases[0]),
            ObjectClass::ShellScriptBuildPhase
        );
        match project.arena().get(native.product_reference) {
            Object::FileReference { file_type, .. } => {
                assert_eq!(file_type, "wrapper.application")
            }
            _ => panic!("expected a file reference"),
        }
        assert_eq!(
            project.arena().name(native.target.configurations),
            "Build configuration list for PBXNativeTarget \"app\""
        );
    }

    #[test]
    fn test_add_dependency() {
        let mut project = project();
        let app = project.add_native_target(
            "app", "", "app.app", "com.apple.product-type.application", ".", "", PbxAttributes::new(),
        );
        let tests = project.add_native_target(
            "app_tests_module",
            "",
            "app_tests_module.xctest",
            "com.apple.product-type.bundle.unit-test",
            ".",
            "",
            PbxAttributes::new(),
        );
        project.add_dependency(app, tests);

        assert_eq!(project.count(ObjectClass::TargetDependency), 1);
        assert_eq!(project.count(ObjectClass::ContainerItemProxy), 1);
        assert_eq!(project.targets(), &[app, tests]);
    }
}
