//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

/// Keel - build extensions for C toolchains
#[derive(Parser)]
#[command(name = "keel")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Cross-compilation prefix (overrides `env.host` in config files)
    #[arg(long, global = true, env = "KEEL_HOST")]
    pub host: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Resolve a tool, honouring the cross prefix
    Which(WhichArgs),

    /// Expand @KEY@ placeholders in a template file
    Subst(SubstArgs),

    /// Compile sources and collect their translation-unit dumps
    Tu(TuArgs),

    /// Show which extensions are usable in the current environment
    Tools,

    /// Print the resolved build environment
    Env(EnvArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args)]
pub struct WhichArgs {
    /// Acceptable names, primary first (e.g. `gcc cc`)
    #[arg(required = true)]
    pub names: Vec<String>,
}

#[derive(Args)]
pub struct SubstArgs {
    /// Template file
    pub template: PathBuf,

    /// Output file
    #[arg(short, long)]
    pub output: PathBuf,

    /// Define a substitution (KEY=VALUE)
    #[arg(short = 'D', long = "define", value_name = "KEY=VALUE")]
    pub defines: Vec<String>,

    /// TOML file of substitutions; `-D` values take precedence
    #[arg(long, value_name = "FILE")]
    pub params: Option<PathBuf>,
}

#[derive(Args)]
pub struct TuArgs {
    /// C sources to compile
    #[arg(required = true)]
    pub sources: Vec<PathBuf>,

    /// Directory for objects and dumps
    #[arg(long, default_value = ".")]
    pub out_dir: PathBuf,

    /// Number of parallel jobs
    #[arg(short, long)]
    pub jobs: Option<usize>,
}

#[derive(Args)]
pub struct EnvArgs {
    /// Output as JSON instead of TOML
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}
