//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use pbxgen::xcode::BuildSystem;

/// pbxgen - Generate Xcode projects from a resolved build graph
#[derive(Parser)]
#[command(name = "pbxgen")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate the Xcode project for a build graph
    Gen(GenArgs),

    /// List the targets the project would contain
    Targets(TargetsArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args)]
pub struct GenArgs {
    /// Path to the JSON build graph
    pub graph: PathBuf,

    /// Name of the generated project (default: all)
    #[arg(long)]
    pub project: Option<String>,

    /// Target built by the "All" target (default: everything)
    #[arg(long)]
    pub root_target: Option<String>,

    /// Ninja executable used by the build scripts
    #[arg(long, env = "PBXGEN_NINJA")]
    pub ninja_executable: Option<String>,

    /// Label patterns restricting the targets, separated by ';'
    #[arg(long)]
    pub filters: Option<String>,

    /// Xcode build system
    #[arg(long, value_enum)]
    pub build_system: Option<BuildSystem>,

    /// Directory to write the project to (default: the graph's build directory)
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// Ignore the global config file
    #[arg(long)]
    pub no_global_config: bool,
}

#[derive(Args)]
pub struct TargetsArgs {
    /// Path to the JSON build graph
    pub graph: PathBuf,

    /// Label patterns restricting the targets, separated by ';'
    #[arg(long, default_value = "")]
    pub filters: String,

    /// Only list targets that get an Xcode target
    #[arg(long)]
    pub emitted: bool,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}
