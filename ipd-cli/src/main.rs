//! IPD CLI - Command-line interface
//!
//! Commands:
//! - tournament: Play a round robin over a population
//! - match: Play a single match between two strategies

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod match_cmd;
mod players;
mod tournament_cmd;

#[derive(Parser)]
#[command(name = "ipd")]
#[command(about = "Iterated prisoner's dilemma tournament engine")]
struct Cli {
    /// Random seed for reproducible runs
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a round robin tournament
    Tournament(tournament_cmd::TournamentArgs),
    /// Play a single match
    Match(match_cmd::MatchArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Tournament(args) => tournament_cmd::run(args, cli.seed),
        Commands::Match(args) => match_cmd::run(args, cli.seed),
    }
}

/// Log to stderr; RUST_LOG wins unless --verbose is given
fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
