//! Headless skirmish runner.
//!
//! Plays matches without a game layer. Reports go to stdout, logs to
//! stderr.
//!
//! # Usage
//!
//! ```bash
//! # One match with a text report
//! cargo run -p skirmish_headless -- run --seed 7
//!
//! # Same match as JSON, with a custom config
//! cargo run -p skirmish_headless -- run --seed 7 --config match.ron --json
//!
//! # Batch of 1000 seeds, results saved for later analysis
//! cargo run -p skirmish_headless -- batch --count 1000 --output results/batch.json
//!
//! # Determinism check for CI
//! cargo run -p skirmish_headless -- verify --seed 12345 --runs 5
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use skirmish_headless::{
    batch::{run_batch, BatchConfig},
    runner::{load_config, run_match, verify_determinism},
    RunnerError,
};

#[derive(Parser)]
#[command(name = "skirmish_headless")]
#[command(about = "Headless skirmish runner for AI testing and CI")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a single match
    Run {
        /// Match seed
        #[arg(long, default_value = "0")]
        seed: u64,

        /// Tick budget before the match is abandoned
        #[arg(long, default_value = "20000")]
        max_ticks: u64,

        /// RON config file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Play many seeds in parallel and tally outcomes
    Batch {
        /// Number of matches
        #[arg(short, long, default_value = "100")]
        count: u32,

        /// First seed
        #[arg(long, default_value = "0")]
        seed: u64,

        /// Tick budget per match
        #[arg(long, default_value = "20000")]
        max_ticks: u64,

        /// Maximum parallel matches (0 = auto)
        #[arg(short, long, default_value = "0")]
        parallel: u32,

        /// RON config file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Save full results as JSON
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Verify determinism by running the same seed several times
    Verify {
        /// Seed to verify
        #[arg(long, default_value = "12345")]
        seed: u64,

        /// Number of verification runs
        #[arg(short, long, default_value = "5")]
        runs: u32,

        /// Tick budget per run
        #[arg(long, default_value = "20000")]
        max_ticks: u64,

        /// RON config file
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true),
        )
        .with(filter)
        .init();

    let result = match cli.command {
        Commands::Run {
            seed,
            max_ticks,
            config,
            json,
        } => cmd_run(seed, max_ticks, config, json),
        Commands::Batch {
            count,
            seed,
            max_ticks,
            parallel,
            config,
            output,
        } => cmd_batch(count, seed, max_ticks, parallel, config, output),
        Commands::Verify {
            seed,
            runs,
            max_ticks,
            config,
        } => cmd_verify(seed, runs, max_ticks, config),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            eprintln!("FAIL: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Play one match and print its report
fn cmd_run(seed: u64, max_ticks: u64, config: Option<PathBuf>, json: bool) -> Result<(), RunnerError> {
    let game = load_config(config.as_deref(), seed)?;
    let report = run_match(&game, max_ticks);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", report.headline());
        println!("  State hash: {:016x}", report.state_hash);
    }
    Ok(())
}

/// Run a batch of matches and print the tallies
fn cmd_batch(
    count: u32,
    seed: u64,
    max_ticks: u64,
    parallel: u32,
    config: Option<PathBuf>,
    output: Option<PathBuf>,
) -> Result<(), RunnerError> {
    let game = load_config(config.as_deref(), seed)?;
    let batch = BatchConfig {
        count,
        seed_start: seed,
        max_ticks,
        parallel,
        game,
    };

    let results = run_batch(batch);
    let summary = &results.summary;
    println!("Games:       {}", summary.total_games);
    println!("Player wins: {}", summary.player_wins);
    println!("AI wins:     {}", summary.ai_wins);
    println!("Draws:       {}", summary.draws);
    println!("Unfinished:  {}", summary.unfinished);
    println!("Avg ticks:   {:.0}", summary.average_ticks);
    println!("Player win rate: {:.1}%", summary.player_win_rate() * 100.0);

    if let Some(path) = output {
        results.save(&path)?;
        eprintln!("Results saved to {}", path.display());
    }
    Ok(())
}

/// Replay one seed and compare final hashes
fn cmd_verify(seed: u64, runs: u32, max_ticks: u64, config: Option<PathBuf>) -> Result<(), RunnerError> {
    tracing::info!(seed, runs, "Verifying determinism");
    let game = load_config(config.as_deref(), seed)?;
    let hash = verify_determinism(&game, runs, max_ticks)?;
    println!("PASS: All {runs} runs produced identical results");
    println!("  Final hash: {hash:016x}");
    Ok(())
}
