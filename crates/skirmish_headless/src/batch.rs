//! Batch runner for balance testing.
//!
//! Plays many consecutive seeds in parallel using rayon and tallies the
//! outcomes.

use std::path::Path;
use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use skirmish_core::components::Side;
use skirmish_core::config::GameConfig;
use skirmish_core::victory::Outcome;
use tracing::{debug, info, warn};

use crate::error::RunnerError;
use crate::runner::{run_match, MatchReport};

/// Configuration for a batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Number of matches.
    pub count: u32,
    /// Seed of the first match; match `i` uses `seed_start + i`.
    pub seed_start: u64,
    /// Tick budget per match.
    pub max_ticks: u64,
    /// Worker threads (0 = rayon default).
    pub parallel: u32,
    /// Base config; its seed is replaced per match.
    pub game: GameConfig,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            count: 100,
            seed_start: 0,
            max_ticks: 20_000,
            parallel: 0,
            game: GameConfig::default(),
        }
    }
}

impl BatchConfig {
    /// Default config for `count` matches.
    pub fn new(count: u32) -> Self {
        Self {
            count,
            ..Default::default()
        }
    }

    /// Set the first seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed_start = seed;
        self
    }

    /// Set the per-match tick budget.
    pub fn with_max_ticks(mut self, max_ticks: u64) -> Self {
        self.max_ticks = max_ticks;
        self
    }
}

/// Outcome tallies over a batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Matches played.
    pub total_games: u32,
    /// Player victories.
    pub player_wins: u32,
    /// AI victories.
    pub ai_wins: u32,
    /// Draws.
    pub draws: u32,
    /// Matches that hit the tick budget.
    pub unfinished: u32,
    /// Mean match length in ticks.
    pub average_ticks: f64,
}

impl BatchSummary {
    /// Tally a set of reports.
    pub fn from_reports(reports: &[MatchReport]) -> Self {
        let mut summary = Self::default();
        let mut total_ticks = 0u64;
        for report in reports {
            summary.total_games += 1;
            total_ticks += report.ticks;
            match report.outcome {
                Some(Outcome::Winner(Side::Player)) => summary.player_wins += 1,
                Some(Outcome::Winner(_)) => summary.ai_wins += 1,
                Some(Outcome::Draw) => summary.draws += 1,
                None => summary.unfinished += 1,
            }
        }
        if summary.total_games > 0 {
            summary.average_ticks = total_ticks as f64 / f64::from(summary.total_games);
        }
        summary
    }

    /// Share of finished matches the player won, 0.0-1.0.
    pub fn player_win_rate(&self) -> f64 {
        let finished = self.total_games - self.unfinished;
        if finished == 0 {
            0.0
        } else {
            f64::from(self.player_wins) / f64::from(finished)
        }
    }
}

/// Results of a batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResults {
    /// Configuration used.
    pub config: BatchConfig,
    /// One report per match, in seed order.
    pub reports: Vec<MatchReport>,
    /// Aggregate tallies.
    pub summary: BatchSummary,
    /// Wall-clock runtime.
    pub duration_seconds: f64,
}

impl BatchResults {
    /// Save results to a JSON file.
    pub fn save(&self, path: &Path) -> Result<(), RunnerError> {
        let io_error = |source| RunnerError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(io_error)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).map_err(io_error)
    }

    /// Load results from a JSON file.
    pub fn load(path: &Path) -> Result<Self, RunnerError> {
        let json = std::fs::read_to_string(path).map_err(|source| RunnerError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&json)?)
    }
}

/// Run a batch of matches in parallel.
pub fn run_batch(config: BatchConfig) -> BatchResults {
    let start = Instant::now();
    info!(
        count = config.count,
        seed_start = config.seed_start,
        max_ticks = config.max_ticks,
        "Starting batch"
    );

    if config.parallel > 0 {
        if let Err(e) = rayon::ThreadPoolBuilder::new()
            .num_threads(config.parallel as usize)
            .build_global()
        {
            warn!("Thread pool already configured: {e}");
        }
    }

    let reports: Vec<MatchReport> = (0..config.count)
        .into_par_iter()
        .map(|i| {
            let game = GameConfig {
                seed: config.seed_start.wrapping_add(u64::from(i)),
                ..config.game.clone()
            };
            let report = run_match(&game, config.max_ticks);
            debug!("{}", report.headline());
            report
        })
        .collect();

    let summary = BatchSummary::from_reports(&reports);
    let duration_seconds = start.elapsed().as_secs_f64();
    info!(
        "Batch complete: {} games in {:.1}s ({:.1} games/sec)",
        reports.len(),
        duration_seconds,
        reports.len() as f64 / duration_seconds.max(f64::EPSILON)
    );

    BatchResults {
        config,
        reports,
        summary,
        duration_seconds,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_config_builder() {
        let config = BatchConfig::new(50).with_seed(12345).with_max_ticks(300);
        assert_eq!(config.count, 50);
        assert_eq!(config.seed_start, 12345);
        assert_eq!(config.max_ticks, 300);
    }

    #[test]
    fn test_summary_tallies() {
        let base = run_batch(BatchConfig::new(1).with_max_ticks(5)).reports[0].clone();
        let reports: Vec<MatchReport> = [
            Some(Outcome::Winner(Side::Player)),
            Some(Outcome::Winner(Side::Ai)),
            Some(Outcome::Draw),
            None,
        ]
        .into_iter()
        .map(|outcome| MatchReport {
            outcome,
            ..base.clone()
        })
        .collect();

        let summary = BatchSummary::from_reports(&reports);
        assert_eq!(summary.total_games, 4);
        assert_eq!(summary.player_wins, 1);
        assert_eq!(summary.ai_wins, 1);
        assert_eq!(summary.draws, 1);
        assert_eq!(summary.unfinished, 1);
        assert!((summary.player_win_rate() - 1.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_run_batch_in_seed_order() {
        let results = run_batch(BatchConfig::new(6).with_seed(40).with_max_ticks(400));
        assert_eq!(results.reports.len(), 6);
        let seeds: Vec<u64> = results.reports.iter().map(|r| r.seed).collect();
        assert_eq!(seeds, vec![40, 41, 42, 43, 44, 45]);
        assert_eq!(results.summary.total_games, 6);
    }

    #[test]
    fn test_batch_results_save_load() {
        let results = run_batch(BatchConfig::new(3).with_max_ticks(200));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("results.json");
        results.save(&path).unwrap();

        let loaded = BatchResults::load(&path).unwrap();
        assert_eq!(loaded.reports, results.reports);
        assert_eq!(loaded.config.count, 3);
    }
}
