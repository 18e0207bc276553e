//! Errors surfaced by the headless runner.

use std::path::PathBuf;

use thiserror::Error;

/// Anything that stops a headless command from completing.
#[derive(Debug, Error)]
pub enum RunnerError {
    /// The match configuration could not be loaded or is invalid.
    #[error(transparent)]
    Config(#[from] skirmish_core::error::GameError),

    /// Reading or writing a results file failed.
    #[error("I/O error on '{path}': {source}")]
    Io {
        /// File involved.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A report could not be encoded or decoded.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Replaying a seed produced different final states.
    #[error("Seed {seed} is non-deterministic: {unique} distinct hashes over {runs} runs")]
    Nondeterministic {
        /// Seed replayed.
        seed: u64,
        /// Number of runs.
        runs: u32,
        /// Distinct final hashes seen.
        unique: usize,
    },
}
