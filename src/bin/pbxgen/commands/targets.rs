//! `pbxgen targets` command
//!
//! Shows how each target of the graph appears in the generated project.

use anyhow::Result;

use crate::cli::TargetsArgs;
use pbxgen::ops::generate::list_targets;
use pbxgen::xcode::classify::Emission;

pub fn execute(args: TargetsArgs) -> Result<()> {
    let listing = list_targets(&args.graph, &args.filters)?;

    for target in &listing {
        let kind = match target.emission {
            Emission::Tool => "tool".to_string(),
            Emission::Bundle => "bundle".to_string(),
            Emission::Skipped(reason) if !args.emitted => format!("skipped: {}", reason),
            Emission::Skipped(_) => continue,
        };

        match target.xcode_name {
            Some(ref name) => println!("{} -> {} ({})", target.label, name, kind),
            None => println!("{} ({})", target.label, kind),
        }
    }

    Ok(())
}
