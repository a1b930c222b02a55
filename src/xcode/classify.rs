//! Choosing which build graph targets become Xcode targets.

use std::collections::BTreeSet;
use std::fmt;

use crate::core::graph::{BuildGraph, OutputType, Target, TargetId, TargetOs};
use crate::core::label::{matches_any, LabelPattern};

pub const PRODUCT_TYPE_APPLICATION: &str = "com.apple.product-type.application";
pub const PRODUCT_TYPE_UNIT_TEST: &str = "com.apple.product-type.bundle.unit-test";
pub const PRODUCT_TYPE_UI_TESTING: &str = "com.apple.product-type.bundle.ui-testing";

/// Suffix of the bundle holding the tests of an XCTest or XCUITest target.
pub const XCTEST_MODULE_SUFFIX: &str = "_module";

/// Suffix of the application bundle that drives an XCUITest target.
pub const XCUITEST_RUNNER_SUFFIX: &str = "_runner";

pub fn is_application_target(target: &Target) -> bool {
    target.output_type == OutputType::CreateBundle
        && target.bundle.product_type == PRODUCT_TYPE_APPLICATION
}

pub fn is_xcuitest_runner_target(target: &Target) -> bool {
    is_application_target(target) && target.label.name().ends_with(XCUITEST_RUNNER_SUFFIX)
}

pub fn is_xctest_module_target(target: &Target) -> bool {
    target.output_type == OutputType::CreateBundle
        && target.bundle.product_type == PRODUCT_TYPE_UNIT_TEST
        && target.label.name().ends_with(XCTEST_MODULE_SUFFIX)
}

pub fn is_xcuitest_module_target(target: &Target) -> bool {
    target.output_type == OutputType::CreateBundle
        && target.bundle.product_type == PRODUCT_TYPE_UI_TESTING
        && target.label.name().ends_with(XCTEST_MODULE_SUFFIX)
}

/// Whether `target` is a unit-test or UI-test module.
pub fn is_test_module_target(target: &Target) -> bool {
    is_xctest_module_target(target) || is_xcuitest_module_target(target)
}

/// Name of the Xcode target generated for a bundle. UI-test modules drop
/// their `_module` suffix since Xcode wants a single target per UI test.
pub fn bundle_target_name(target: &Target) -> &str {
    let name = target.label.name();
    if is_xcuitest_module_target(target) {
        name.strip_suffix(XCTEST_MODULE_SUFFIX).unwrap_or(name)
    } else {
        name
    }
}

/// Targets to consider for the project, sorted by label.
///
/// Applies the filter patterns (all targets when empty), keeps only the
/// default toolchain and drops executables linked into a bundle by a
/// `bundle_data` target.
pub fn select_targets(graph: &BuildGraph, filters: &[LabelPattern]) -> Vec<TargetId> {
    let selected: Vec<TargetId> = graph
        .targets()
        .filter(|&(id, target)| {
            filters.is_empty()
                || matches_any(filters, &target.label, &graph.toolchain_of(id).label)
        })
        .map(|(id, _)| id)
        .collect();

    let mut targets: BTreeSet<TargetId> = selected
        .iter()
        .copied()
        .filter(|&id| {
            let keep = graph.is_default_toolchain(id);
            if !keep {
                tracing::debug!(
                    "skipping {} ({})",
                    graph.target(id).label,
                    graph.toolchain_of(id).label
                );
            }
            keep
        })
        .collect();

    for &id in &selected {
        let target = graph.target(id);
        if !graph.is_default_toolchain(id) || target.output_type != OutputType::BundleData {
            continue;
        }
        for dep in target.deps() {
            if graph.target(dep).output_type == OutputType::Executable && targets.remove(&dep) {
                tracing::debug!(
                    "skipping {}: embedded by {}",
                    graph.target(dep).label,
                    target.label
                );
            }
        }
    }

    let mut sorted: Vec<TargetId> = targets.into_iter().collect();
    sorted.sort_by(|&a, &b| {
        graph
            .target(a)
            .label
            .cmp(&graph.target(b).label)
            .then(a.cmp(&b))
    });
    sorted
}

/// Why a selected target has no Xcode counterpart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Executables cannot be debugged standalone on iOS and tvOS.
    UnsupportedExecutable,
    /// The bundle declares no product type.
    NoProductType,
    /// The UI-test runner is represented by its `_module` target.
    UiTestRunner,
    /// Neither an executable nor a bundle.
    NotBuildable,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            SkipReason::UnsupportedExecutable => "executables are not supported on this platform",
            SkipReason::NoProductType => "bundle has no product type",
            SkipReason::UiTestRunner => "UI test runner",
            SkipReason::NotBuildable => "not an executable or bundle",
        };
        f.write_str(reason)
    }
}

/// How a selected target appears in the project.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Emission {
    /// A command line tool target.
    Tool,
    /// A bundle target (application, test module, ...).
    Bundle,
    Skipped(SkipReason),
}

/// Decide how `target` is emitted on `os`.
pub fn emission(target: &Target, os: TargetOs) -> Emission {
    match target.output_type {
        OutputType::Executable if !os.supports_executables() => {
            Emission::Skipped(SkipReason::UnsupportedExecutable)
        }
        OutputType::Executable => Emission::Tool,
        OutputType::CreateBundle if target.bundle.product_type.is_empty() => {
            Emission::Skipped(SkipReason::NoProductType)
        }
        OutputType::CreateBundle if is_xcuitest_runner_target(target) => {
            Emission::Skipped(SkipReason::UiTestRunner)
        }
        OutputType::CreateBundle => Emission::Bundle,
        _ => Emission::Skipped(SkipReason::NotBuildable),
    }
}

/// Select the targets of `graph` and decide how each one is emitted.
pub fn classify_targets(graph: &BuildGraph, filters: &[LabelPattern]) -> Vec<(TargetId, Emission)> {
    let os = graph.settings.target_os();
    select_targets(graph, filters)
        .into_iter()
        .map(|id| (id, emission(graph.target(id), os)))
        .collect()
}
