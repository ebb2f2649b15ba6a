mod commands;
mod summary;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "imgbench", about = "Config-driven image algorithm workbench")]
#[command(version)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Algorithm config file (defaults to data/algorithms.toml next to the binary)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse and self-test every algorithm in the config
    Check(commands::check::CheckArgs),
    /// List the algorithms that passed validation
    List(commands::list::ListArgs),
    /// Show the built-in modules and their methods
    Modules,
    /// Print an example config declaring every built-in algorithm
    Config(commands::config::ConfigArgs),
    /// Process an image with one algorithm
    Run(commands::run::RunArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = cli.config.as_deref();
    match &cli.command {
        Commands::Check(args) => commands::check::run(config, args),
        Commands::List(args) => commands::list::run(config, args),
        Commands::Modules => commands::modules::run(),
        Commands::Config(args) => commands::config::run(args),
        Commands::Run(args) => commands::run::run(config, args),
    }
}
