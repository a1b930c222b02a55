//! pbxgen CLI - Generate Xcode projects from a resolved build graph

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use pbxgen::util::diagnostic;
use pbxgen::XcodeError;

mod cli;
mod commands;

use cli::{Cli, Commands};

fn main() {
    // Parse CLI
    let cli = Cli::parse();
    let color = !cli.no_color;

    if let Err(e) = run(cli) {
        match e.downcast_ref::<XcodeError>() {
            Some(err) => diagnostic::emit(&err.to_diagnostic(), color),
            None => eprintln!("error: {:#}", e),
        }
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    // Set up logging
    let filter = if cli.verbose {
        EnvFilter::new("pbxgen=debug")
    } else {
        EnvFilter::new("pbxgen=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_ansi(!cli.no_color)
        .with_writer(std::io::stderr)
        .init();

    // Execute command
    match cli.command {
        Commands::Gen(args) => commands::gen::execute(args),
        Commands::Targets(args) => commands::targets::execute(args),
        Commands::Completions(args) => commands::completions::execute(args),
    }
}
