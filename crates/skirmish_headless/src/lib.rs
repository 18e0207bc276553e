//! Headless match runner for AI testing and CI verification.
//!
//! Plays skirmishes without a game layer: both sides run their autonomous
//! behaviour until the match ends or a tick budget runs out. This enables:
//!
//! - **Balance checks**: win/draw tallies across many seeds
//! - **CI verification**: the same seed must always replay to the same
//!   state hash
//!
//! # Example
//!
//! ```bash
//! # One match, JSON report on stdout
//! cargo run -p skirmish_headless -- run --seed 7 --json
//!
//! # 500 seeds in parallel
//! cargo run -p skirmish_headless -- batch --count 500
//!
//! # Determinism check
//! cargo run -p skirmish_headless -- verify --seed 7 --runs 5
//! ```

pub mod batch;
pub mod error;
pub mod runner;

pub use batch::{run_batch, BatchConfig, BatchResults, BatchSummary};
pub use error::RunnerError;
pub use runner::{load_config, run_match, verify_determinism, MatchReport};
