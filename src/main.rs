//! Debrisfall CLI - run, replay and inspect lane-defense matches.

// Allow print in the CLI binary
#![allow(clippy::print_stdout, clippy::print_stderr)]

mod cli;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

/// Debrisfall - a deterministic two-sided lane-defense simulator
#[derive(Parser, Debug)]
#[command(name = "debrisfall")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Log every tick (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a single match between two strategies
    Run {
        #[command(flatten)]
        setup: cli::SetupArgs,

        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: cli::OutputFormat,

        /// Save the replay to a JSON file
        #[arg(long)]
        save: Option<PathBuf>,
    },

    /// Run many matches in parallel and aggregate the results
    Series {
        #[command(flatten)]
        setup: cli::SetupArgs,

        /// Number of matches (seeds increment from --seed)
        #[arg(short, long, default_value = "100")]
        games: u32,

        /// Parallel threads (default: CPU count)
        #[arg(short = 'j', long)]
        threads: Option<usize>,

        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: cli::OutputFormat,

        /// Show progress bar
        #[arg(short, long)]
        progress: bool,
    },

    /// Print a saved replay
    Replay {
        /// Replay file written by `run --save`
        #[arg(required = true)]
        replay: PathBuf,

        /// Only print this turn
        #[arg(short, long)]
        turn: Option<u32>,

        /// Draw both boards under each summary
        #[arg(short, long)]
        board: bool,
    },

    /// Check that a map file loads and has a valid lane
    Validate {
        /// Map file to validate
        #[arg(required = true)]
        map: PathBuf,
    },

    /// List the built-in strategies
    Bots,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debrisfall=debug" } else { "debrisfall=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);

    let result = match args.command {
        Commands::Run {
            setup,
            format,
            save,
        } => cli::run::execute(setup, format, save),

        Commands::Series {
            setup,
            games,
            threads,
            format,
            progress,
        } => cli::series::execute(setup, games, threads, format, progress),

        Commands::Replay {
            replay,
            turn,
            board,
        } => cli::replay::execute(&replay, turn, board),

        Commands::Validate { map } => cli::validate::execute(&map),

        Commands::Bots => {
            cli::bots::execute();
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
