//! Wiring of XCTest and XCUITest modules to their host application.
//!
//! Test modules are bundles whose label ends in `_module`. Xcode must build
//! the host application before the module, and needs to see the test sources
//! to discover the test methods, even though ninja does the compilation.

use std::collections::{BTreeSet, HashMap};

use crate::core::graph::{BuildGraph, SourceFile, TargetId};
use crate::xcode::classify::{
    is_application_target, is_test_module_target, is_xctest_module_target,
};
use crate::xcode::errors::XcodeError;
use crate::xcode::object::{CompilerFlags, ObjectId};
use crate::xcode::project::PbxProject;
use crate::xcode::workspace::BuildSystem;

/// File name suffixes of test sources.
const XCTEST_FILE_SUFFIXES: &[&str] = &["egtest.m", "egtest.mm", "xctest.m", "xctest.mm"];

pub fn is_xctest_file(file: &SourceFile) -> bool {
    let name = file.name();
    XCTEST_FILE_SUFFIXES.iter().any(|suffix| name.ends_with(suffix))
}

/// Finds the test sources in the dependency closure of a target.
///
/// Results are cached per target, so one resolver should be reused for all
/// the test modules of a project: shared dependencies are searched once.
#[derive(Debug)]
pub struct XcTestFilesResolver<'g> {
    graph: &'g BuildGraph,
    cache: HashMap<TargetId, BTreeSet<SourceFile>>,
    visits: HashMap<TargetId, usize>,
}

impl<'g> XcTestFilesResolver<'g> {
    pub fn new(graph: &'g BuildGraph) -> Self {
        XcTestFilesResolver {
            graph,
            cache: HashMap::new(),
            visits: HashMap::new(),
        }
    }

    /// Test sources of `id` and of its public and private dependencies.
    pub fn search_files_for_target(&mut self, id: TargetId) -> &BTreeSet<SourceFile> {
        if !self.cache.contains_key(&id) {
            let files = self.search_uncached(id);
            self.cache.insert(id, files);
        }
        &self.cache[&id]
    }

    fn search_uncached(&mut self, id: TargetId) -> BTreeSet<SourceFile> {
        *self.visits.entry(id).or_default() += 1;

        let graph = self.graph;
        let target = graph.target(id);
        tracing::debug!("searching test files of {}", target.label);

        let mut files: BTreeSet<SourceFile> = target
            .sources
            .iter()
            .filter(|file| is_xctest_file(file))
            .cloned()
            .collect();
        for dep in target.deps() {
            files.extend(self.search_files_for_target(dep).iter().cloned());
        }
        files
    }

    /// Number of times the sources of `id` were scanned.
    pub fn visits(&self, id: TargetId) -> usize {
        self.visits.get(&id).copied().unwrap_or(0)
    }
}

/// Find the emitted application bundle named `host` for the test module
/// `module`.
pub fn find_application_target(
    graph: &BuildGraph,
    module: TargetId,
    bundle_targets: &[(TargetId, ObjectId)],
) -> Result<(TargetId, ObjectId), XcodeError> {
    let module_target = graph.target(module);
    let host = &module_target.bundle.test_application_name;

    let found = bundle_targets
        .iter()
        .copied()
        .find(|&(id, _)| graph.target(id).label.name() == host);

    match found {
        Some((id, _)) if !is_application_target(graph.target(id)) => {
            Err(XcodeError::HostNotApplication {
                target: module_target.label.name().to_string(),
                host: host.clone(),
            })
        }
        Some(pair) => Ok(pair),
        None => Err(XcodeError::MissingHostApplication {
            target: module_target.label.name().to_string(),
            host: host.clone(),
        }),
    }
}

/// Add the test sources of every test module to its sources build phase,
/// flagged so that Xcode indexes them without compiling.
///
/// Unit tests are compiled into the host application, so its closure is
/// searched; UI tests live in the module itself. The new build system no
/// longer honours the flag, so nothing is added there.
pub fn add_xctest_files_to_test_modules(
    project: &mut PbxProject,
    graph: &BuildGraph,
    bundle_targets: &[(TargetId, ObjectId)],
    build_system: BuildSystem,
) -> Result<(), XcodeError> {
    if build_system == BuildSystem::New {
        return Ok(());
    }

    let mut resolver = XcTestFilesResolver::new(graph);
    for &(id, native_target) in bundle_targets {
        let target = graph.target(id);
        if !is_test_module_target(target) {
            continue;
        }

        let searched = if is_xctest_module_target(target) {
            find_application_target(graph, id, bundle_targets)?.0
        } else {
            id
        };

        for file in resolver.search_files_for_target(searched) {
            let path = graph.settings.rebase_to_root(file.value());
            project.add_source_file(&path, &path, CompilerFlags::Help, native_target);
        }
    }
    Ok(())
}

/// Make every test module depend on its host application.
pub fn add_dependencies_for_test_modules(
    project: &mut PbxProject,
    graph: &BuildGraph,
    bundle_targets: &[(TargetId, ObjectId)],
) -> Result<(), XcodeError> {
    for &(id, native_target) in bundle_targets {
        if !is_test_module_target(graph.target(id)) {
            continue;
        }
        let (_, host) = find_application_target(graph, id, bundle_targets)?;
        project.add_dependency(host, native_target);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{GraphFixture, TargetFixture, APPLICATION, UNIT_TEST};
    use crate::xcode::object::{ObjectClass, PbxAttributes};

    #[test]
    fn test_xctest_suffixes() {
        assert!(is_xctest_file(&SourceFile::new("//a/thing_egtest.m")));
        assert!(is_xctest_file(&SourceFile::new("//a/foo_xctest.mm")));
        assert!(!is_xctest_file(&SourceFile::new("//a/foo_unittest.mm")));
        assert!(!is_xctest_file(&SourceFile::new("//a/xctest.mm/foo.h")));
    }

    #[test]
    fn test_diamond_visits_shared_dependency_once() {
        let graph = GraphFixture::new()
            .target(TargetFixture::source_set("//a:a").deps(&["//b:b", "//c:c"]))
            .target(TargetFixture::source_set("//b:b").deps(&["//d:d"]))
            .target(TargetFixture::source_set("//c:c").public_deps(&["//d:d"]))
            .target(TargetFixture::source_set("//d:d").sources(&["//d/thing_egtest.m", "//d/d.cc"]))
            .build();

        let mut resolver = XcTestFilesResolver::new(&graph);
        let files: Vec<_> = resolver
            .search_files_for_target(TargetId(0))
            .iter()
            .map(|f| f.value().to_string())
            .collect();

        assert_eq!(files, vec!["//d/thing_egtest.m"]);
        assert_eq!(resolver.visits(TargetId(3)), 1);
        for id in 0..4 {
            assert_eq!(resolver.visits(TargetId(id)), 1);
        }
    }

    fn project_with_bundles(graph: &BuildGraph) -> (PbxProject, Vec<(TargetId, ObjectId)>) {
        let mut project = PbxProject::new("all", "Debug", "../..", PbxAttributes::new());
        let bundles = graph
            .targets()
            .map(|(id, target)| {
                let native = project.add_native_target(
                    target.label.name(),
                    "",
                    &format!("{}.app", target.label.name()),
                    &target.bundle.product_type,
                    ".",
                    "",
                    PbxAttributes::new(),
                );
                (id, native)
            })
            .collect();
        (project, bundles)
    }

    #[test]
    fn test_missing_host_application() {
        let graph = GraphFixture::new()
            .target(TargetFixture::bundle("//app:app", APPLICATION, "app.app"))
            .target(
                TargetFixture::bundle("//app:foo_module", UNIT_TEST, "foo_module.xctest")
                    .test_application("bar"),
            )
            .build();
        let (mut project, bundles) = project_with_bundles(&graph);

        let err = add_dependencies_for_test_modules(&mut project, &graph, &bundles).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("foo_module"), "{}", message);
        assert!(message.contains("bar"), "{}", message);
        assert!(matches!(err, XcodeError::MissingHostApplication { .. }));
    }

    #[test]
    fn test_host_must_be_application() {
        let graph = GraphFixture::new()
            .target(TargetFixture::bundle("//fw:fw", "com.apple.product-type.framework", "fw.framework"))
            .target(
                TargetFixture::bundle("//fw:fw_tests_module", UNIT_TEST, "fw_tests_module.xctest")
                    .test_application("fw"),
            )
            .build();
        let (mut project, bundles) = project_with_bundles(&graph);

        let err = add_dependencies_for_test_modules(&mut project, &graph, &bundles).unwrap_err();
        assert!(matches!(err, XcodeError::HostNotApplication { .. }));
    }

    #[test]
    fn test_unit_tests_index_host_sources() {
        let graph = GraphFixture::new()
            .target(TargetFixture::bundle("//app:app", APPLICATION, "app.app").deps(&["//app:tests"]))
            .target(TargetFixture::source_set("//app:tests").sources(&["//app/app_xctest.mm"]))
            .target(
                TargetFixture::bundle("//app:app_tests_module", UNIT_TEST, "app_tests_module.xctest")
                    .test_application("app"),
            )
            .build();
        let (mut project, bundles) = project_with_bundles(&graph);
        let bundles: Vec<_> = bundles
            .into_iter()
            .filter(|&(id, _)| id != TargetId(1))
            .collect();

        add_xctest_files_to_test_modules(&mut project, &graph, &bundles, BuildSystem::Legacy)
            .unwrap();
        add_dependencies_for_test_modules(&mut project, &graph, &bundles).unwrap();

        assert_eq!(project.count(ObjectClass::BuildFile), 1);
        assert_eq!(project.count(ObjectClass::TargetDependency), 1);
    }

    #[test]
    fn test_new_build_system_skips_indexing() {
        let graph = GraphFixture::new()
            .target(TargetFixture::bundle("//app:app", APPLICATION, "app.app").sources(&["//app/a_egtest.mm"]))
            .target(
                TargetFixture::bundle("//app:app_tests_module", UNIT_TEST, "t.xctest")
                    .test_application("app"),
            )
            .build();
        let (mut project, bundles) = project_with_bundles(&graph);

        add_xctest_files_to_test_modules(&mut project, &graph, &bundles, BuildSystem::New).unwrap();
        assert_eq!(project.count(ObjectClass::BuildFile), 0);
    }
}
