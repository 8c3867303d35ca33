//! qracer CLI - train, evaluate, race and inspect tabular racing agents

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "qracer")]
#[command(version, about = "Tabular Q-learning for racing cars", long_about = None)]
struct Cli {
    /// Log debug events (value updates, saturated features, decay steps)
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Train an agent on the scripted track
    Train(Box<qracer::cli::commands::train::TrainArgs>),

    /// Evaluate a trained table without updating it
    Evaluate(Box<qracer::cli::commands::evaluate::EvaluateArgs>),

    /// Race two trained tables over a set of tracks
    Compete(Box<qracer::cli::commands::compete::CompeteArgs>),

    /// Print a summary of a saved table
    Inspect(qracer::cli::commands::inspect::InspectArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Train(args) => qracer::cli::commands::train::execute(*args),
        Commands::Evaluate(args) => qracer::cli::commands::evaluate::execute(*args),
        Commands::Compete(args) => qracer::cli::commands::compete::execute(*args),
        Commands::Inspect(args) => qracer::cli::commands::inspect::execute(args),
    }
}
