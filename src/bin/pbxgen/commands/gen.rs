//! `pbxgen gen` command

use anyhow::Result;

use crate::cli::GenArgs;
use pbxgen::ops::generate::{generate_project, GenerateOptions};
use pbxgen::util::config::{Config, XcodeConfig};
use pbxgen::util::fs::WriteOutcome;
use pbxgen::xcode::script::ProcessEnvironment;

pub fn execute(args: GenArgs) -> Result<()> {
    // Command line flags override both config files
    let overrides = Config {
        xcode: XcodeConfig {
            project_name: args.project,
            root_target: args.root_target,
            ninja_executable: args.ninja_executable,
            filters: args.filters,
            build_system: args.build_system,
        },
    };

    let opts = GenerateOptions {
        graph_path: args.graph,
        out_dir: args.out,
        overrides,
        ignore_global_config: args.no_global_config,
    };

    let result = generate_project(&opts, &ProcessEnvironment)?;

    let project_dir = result
        .build_dir
        .join(format!("{}.xcodeproj", result.options.project_name));
    let unchanged = result
        .files
        .iter()
        .filter(|(_, outcome)| *outcome == WriteOutcome::Unchanged)
        .count();

    eprintln!(
        "    Generated {} ({} written, {} unchanged)",
        project_dir.display(),
        result.written(),
        unchanged
    );

    Ok(())
}
