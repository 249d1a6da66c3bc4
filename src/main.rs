//! Symgraph CLI - generate, mutate and cross command graphs from the shell.

// Allow print in the CLI binary
#![allow(clippy::print_stdout, clippy::print_stderr)]

mod cli;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

/// Symgraph - acyclic command graphs for symbolic regression
#[derive(Parser, Debug)]
#[command(name = "symgraph")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate a random population of graphs
    Generate {
        /// Rows per graph
        #[arg(short, long, default_value = "16")]
        rows: usize,

        /// Number of graphs (default: 1)
        #[arg(short, long, default_value = "1")]
        count: usize,

        /// Random seed
        #[arg(short, long, default_value = "0")]
        seed: u64,

        /// Component generator config (JSON)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Write a checkpoint file instead of printing formulas
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Mutate every graph of a saved population
    Mutate {
        /// Population checkpoint to mutate
        #[arg(short, long)]
        input: PathBuf,

        /// Random seed
        #[arg(short, long, default_value = "0")]
        seed: u64,

        /// Mutation weights (JSON)
        #[arg(short, long)]
        mutation: Option<PathBuf>,

        /// Component generator config (JSON)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Write a checkpoint file instead of printing formulas
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Cross two saved populations pairwise
    Crossover {
        /// First parent population
        #[arg(long)]
        first: PathBuf,

        /// Second parent population
        #[arg(long)]
        second: PathBuf,

        /// Random seed
        #[arg(short, long, default_value = "0")]
        seed: u64,

        /// Component generator config (JSON)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Write a checkpoint file instead of printing formulas
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Run many mutations in parallel and report per-strategy statistics
    Sample {
        /// Rows per graph
        #[arg(short, long, default_value = "16")]
        rows: usize,

        /// Number of trials (default: 10000)
        #[arg(short, long, default_value = "10000")]
        count: u64,

        /// Starting seed (increments for each trial)
        #[arg(short, long, default_value = "0")]
        seed: u64,

        /// Component generator config (JSON)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Mutation weights (JSON)
        #[arg(short, long)]
        mutation: Option<PathBuf>,

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
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    let result = match args.command {
        Commands::Generate {
            rows,
            count,
            seed,
            config,
            output,
        } => cli::generate::execute(rows, count, seed, config, output),

        Commands::Mutate {
            input,
            seed,
            mutation,
            config,
            output,
        } => cli::mutate::execute(input, seed, mutation, config, output),

        Commands::Crossover {
            first,
            second,
            seed,
            config,
            output,
        } => cli::crossover::execute(first, second, seed, config, output),

        Commands::Sample {
            rows,
            count,
            seed,
            config,
            mutation,
            threads,
            format,
            progress,
        } => cli::sample::execute(rows, count, seed, config, mutation, threads, format, progress),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
