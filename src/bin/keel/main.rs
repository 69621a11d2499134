//! Keel CLI - build extensions for C toolchains

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use keel::util::diagnostic;
use keel::ExtError;

mod cli;
mod commands;

use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();
    let color = !cli.no_color;

    if let Err(e) = run(cli) {
        match e.downcast_ref::<ExtError>() {
            Some(ext) => diagnostic::emit(&ext.to_diagnostic(), color),
            None => eprintln!("error: {:#}", e),
        }
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    // Set up logging
    let filter = if cli.verbose {
        EnvFilter::new("keel=debug")
    } else {
        EnvFilter::new("keel=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    let host = cli.host;
    let color = !cli.no_color;

    // Execute command
    match cli.command {
        Commands::Which(args) => commands::which::execute(args, host),
        Commands::Subst(args) => commands::subst::execute(args, host),
        Commands::Tu(args) => commands::tu::execute(args, host, color),
        Commands::Tools => commands::tools::execute(host),
        Commands::Env(args) => commands::env::execute(args, host),
        Commands::Completions(args) => commands::completions::execute(args),
    }
}
