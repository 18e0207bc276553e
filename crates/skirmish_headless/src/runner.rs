//! Single-match runner.

use std::path::Path;

use serde::{Deserialize, Serialize};
use skirmish_core::components::Side;
use skirmish_core::config::GameConfig;
use skirmish_core::simulation::Simulation;
use skirmish_core::victory::Outcome;
use tracing::{debug, info};

use crate::error::RunnerError;

/// Summary of one finished (or abandoned) match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchReport {
    /// Seed the match was played with.
    pub seed: u64,
    /// How the match ended; `None` if the tick budget ran out first.
    pub outcome: Option<Outcome>,
    /// Ticks played.
    pub ticks: u64,
    /// Simulated time in milliseconds.
    pub time_ms: u64,
    /// Final player wood.
    pub player_wood: u32,
    /// Final AI wood.
    pub ai_wood: u32,
    /// Player spearmen alive at the end.
    pub player_spearmen: usize,
    /// AI spearmen alive at the end.
    pub ai_spearmen: usize,
    /// Share of the map the player has seen, in percent.
    pub player_fog_coverage: u32,
    /// Share of the map the AI has seen, in percent.
    pub ai_fog_coverage: u32,
    /// Final state hash.
    pub state_hash: u64,
}

impl MatchReport {
    fn from_simulation(sim: &Simulation) -> Self {
        Self {
            seed: sim.config().seed,
            outcome: sim.outcome(),
            ticks: sim.get_tick(),
            time_ms: sim.time_ms(),
            player_wood: sim.wood(Side::Player),
            ai_wood: sim.wood(Side::Ai),
            player_spearmen: sim.spearman_count(Side::Player),
            ai_spearmen: sim.spearman_count(Side::Ai),
            player_fog_coverage: sim.visibility().coverage_percent(Side::Player),
            ai_fog_coverage: sim.visibility().coverage_percent(Side::Ai),
            state_hash: sim.state_hash(),
        }
    }

    /// One-line human readable result.
    pub fn headline(&self) -> String {
        let result = match self.outcome {
            Some(Outcome::Winner(side)) => format!("{side} wins"),
            Some(Outcome::Draw) => "Draw".to_string(),
            None => "Unfinished".to_string(),
        };
        format!(
            "seed {}: {} after {} ticks (wood {}/{}, spearmen {}/{}, fog {}%/{}%)",
            self.seed,
            result,
            self.ticks,
            self.player_wood,
            self.ai_wood,
            self.player_spearmen,
            self.ai_spearmen,
            self.player_fog_coverage,
            self.ai_fog_coverage
        )
    }
}

/// Build the config for a match: the RON file if given, else the
/// defaults, with the seed overridden.
pub fn load_config(path: Option<&Path>, seed: u64) -> Result<GameConfig, RunnerError> {
    let base = match path {
        Some(path) => GameConfig::load(path)?,
        None => GameConfig::default(),
    };
    Ok(GameConfig { seed, ..base })
}

/// Play a standard skirmish until it ends or `max_ticks` fixed ticks have
/// passed.
pub fn run_match(config: &GameConfig, max_ticks: u64) -> MatchReport {
    let mut sim = Simulation::new_skirmish(config.clone());
    debug!(seed = config.seed, max_ticks, "Match started");

    while !sim.is_over() && sim.get_tick() < max_ticks {
        sim.tick();
    }

    let report = MatchReport::from_simulation(&sim);
    info!(
        seed = report.seed,
        outcome = ?report.outcome,
        ticks = report.ticks,
        "Match finished"
    );
    report
}

/// Replay one seed `runs` times and return its final hash if every run
/// agrees.
pub fn verify_determinism(config: &GameConfig, runs: u32, max_ticks: u64) -> Result<u64, RunnerError> {
    let mut hashes: Vec<u64> = (0..runs.max(1))
        .map(|_| run_match(config, max_ticks).state_hash)
        .collect();
    let first = hashes[0];
    hashes.sort_unstable();
    hashes.dedup();

    if hashes.len() == 1 {
        Ok(first)
    } else {
        Err(RunnerError::Nondeterministic {
            seed: config.seed,
            runs,
            unique: hashes.len(),
        })
    }
}
