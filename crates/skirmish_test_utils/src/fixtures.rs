//! Test fixtures and helpers.
//!
//! Pre-built worlds and entity placements for consistent testing. Fixture
//! worlds have no town centres and no trees unless a test adds them, so
//! they never end on their own.

use fixed::types::I32F32;
use skirmish_core::components::{EntityId, Side, SpearmanGoal};
use skirmish_core::config::GameConfig;
use skirmish_core::math::Vec2Fixed;
use skirmish_core::simulation::Simulation;

/// Create a fixed-point number from an integer.
#[must_use]
pub fn fixed(n: i32) -> I32F32 {
    I32F32::from_num(n)
}

/// Create a fixed-point point from integer coordinates.
#[must_use]
pub fn point(x: i32, y: i32) -> Vec2Fixed {
    Vec2Fixed::from_ints(x, y)
}

/// Empty world with the default config, fully fogged.
#[must_use]
pub fn empty_world() -> Simulation {
    Simulation::empty(GameConfig::default())
}

/// Empty world with the fog lifted for both sides.
#[must_use]
pub fn revealed_world() -> Simulation {
    let mut sim = empty_world();
    sim.reveal_all(Side::Player);
    sim.reveal_all(Side::Ai);
    sim
}

/// Standard skirmish for a seed.
#[must_use]
pub fn skirmish(seed: u64) -> Simulation {
    Simulation::new_skirmish(GameConfig::with_seed(seed))
}

/// Ids of a small battle placed by [`battle_world`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Battle {
    /// Player town centre.
    pub player_town_center: EntityId,
    /// AI town centre.
    pub ai_town_center: EntityId,
    /// Player spearmen.
    pub player_spearmen: Vec<EntityId>,
    /// AI spearmen.
    pub ai_spearmen: Vec<EntityId>,
}

/// Revealed world with a town centre per side and `per_side` spearmen
/// each, player spearmen attacking and AI spearmen defending.
#[must_use]
pub fn battle_world(per_side: u32) -> (Simulation, Battle) {
    let mut sim = revealed_world();
    let player_town_center = sim.spawn_town_center(Side::Player, point(100, 300));
    let ai_town_center = sim.spawn_town_center(Side::Ai, point(700, 300));

    let mut player_spearmen = Vec::new();
    let mut ai_spearmen = Vec::new();
    for i in 0..per_side.min(5) as i32 {
        let y = 200 + i * 50;
        player_spearmen.push(sim.spawn_spearman(Side::Player, point(250, y), SpearmanGoal::Attack));
        ai_spearmen.push(sim.spawn_spearman(Side::Ai, point(550, y), SpearmanGoal::Defend));
    }

    let battle = Battle {
        player_town_center,
        ai_town_center,
        player_spearmen,
        ai_spearmen,
    };
    (sim, battle)
}

/// Step `sim` `count` times by `elapsed_ms`.
pub fn run_steps(sim: &mut Simulation, count: u32, elapsed_ms: u64) {
    for _ in 0..count {
        sim.step(elapsed_ms);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_revealed_world_is_fully_visible() {
        let sim = revealed_world();
        assert!(sim.visibility().all_revealed(Side::Player));
        assert!(sim.visibility().all_revealed(Side::Ai));
        assert!(sim.entities().is_empty());
    }

    #[test]
    fn test_battle_world_caps_spearmen() {
        let (sim, battle) = battle_world(8);
        assert_eq!(battle.player_spearmen.len(), 5);
        assert_eq!(sim.spearman_count(Side::Ai), 5);
    }
}
