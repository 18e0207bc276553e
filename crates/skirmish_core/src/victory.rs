//! End-of-match evaluation.
//!
//! A match ends when a town centre falls, when a side stockpiles enough
//! wood, or in a draw once the forest is gone and everything has gone
//! quiet. The check runs after every death and wood change and once at
//! the end of each step.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::components::{EntityBody, Side};
use crate::events::SimEvent;
use crate::simulation::Simulation;

/// How a match ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    /// One side won.
    Winner(Side),
    /// Nobody can win any more.
    Draw,
}

impl Outcome {
    /// The winning side, if any.
    #[must_use]
    pub const fn winner(self) -> Option<Side> {
        match self {
            Outcome::Winner(side) => Some(side),
            Outcome::Draw => None,
        }
    }
}

/// Facts the end condition depends on that cannot be read back from the
/// entity storage once the entities involved are purged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct VictoryTracker {
    /// The player's town centre has been destroyed.
    pub player_town_center_lost: bool,
    /// The AI's town centre has been destroyed.
    pub ai_town_center_lost: bool,
    /// Trees placed on the map.
    pub trees_planted: u32,
    /// Trees chopped down.
    pub trees_felled: u32,
}

impl VictoryTracker {
    /// Record the destruction of a side's town centre.
    pub fn town_center_lost(&mut self, side: Side) {
        match side {
            Side::Player => self.player_town_center_lost = true,
            Side::Ai => self.ai_town_center_lost = true,
            Side::Neutral => {}
        }
    }

    /// Whether the forest has been cleared.
    #[must_use]
    pub const fn forest_cleared(&self) -> bool {
        self.trees_planted > 0 && self.trees_felled >= self.trees_planted
    }
}

impl Simulation {
    /// End the match if its outcome is decided.
    pub(crate) fn check_end_condition(&mut self) {
        if self.is_over() {
            return;
        }
        if let Some(outcome) = self.decided_outcome() {
            self.end_game(outcome);
        }
    }

    fn decided_outcome(&self) -> Option<Outcome> {
        if self.victory.player_town_center_lost {
            return Some(Outcome::Winner(Side::Ai));
        }
        if self.victory.ai_town_center_lost {
            return Some(Outcome::Winner(Side::Player));
        }
        let win_wood = self.config.economy.win_wood;
        if let Some(side) = Side::COMBATANTS.into_iter().find(|&s| self.wood(s) >= win_wood) {
            return Some(Outcome::Winner(side));
        }
        if self.victory.forest_cleared() && self.is_quiescent() {
            return Some(Outcome::Draw);
        }
        None
    }

    /// No unit is travelling or working and no barracks is busy.
    fn is_quiescent(&self) -> bool {
        self.entities.iter_active().all(|e| match &e.body {
            EntityBody::Worker(w) => !w.activity.is_busy(),
            EntityBody::Spearman(s) => !s.state.is_moving() && e.motion.is_none() && s.attack_target.is_none(),
            EntityBody::Barracks(b) => !b.under_construction && b.training.is_none(),
            EntityBody::TownCenter | EntityBody::Tree => true,
        })
    }

    fn end_game(&mut self, outcome: Outcome) {
        self.outcome = Some(outcome);
        let now = self.time_ms;

        let ids = self.entities.sorted_ids();
        for &id in &ids {
            if let Some(entity) = self.entities.get_mut(id) {
                if let Some(motion) = entity.motion.take() {
                    entity.position = motion.position_at(now);
                }
                entity.timers.clear();
                if let Some(barracks) = entity.barracks_mut() {
                    barracks.training = None;
                }
            }
        }
        for id in ids {
            if self.entities.is_active(id) {
                self.set_idle(id);
            }
        }
        self.selection = None;

        self.silence_sound_loops();
        self.emit(SimEvent::GameOver(outcome));
        info!(
            tick = self.tick,
            ?outcome,
            player_wood = self.wood(Side::Player),
            ai_wood = self.wood(Side::Ai),
            "Game over"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{SpearmanGoal, SpearmanState, WorkerActivity};
    use crate::config::GameConfig;
    use crate::math::Vec2Fixed;
    use crate::movement::{MoveOrder, Travel};

    fn sim() -> Simulation {
        let mut sim = Simulation::empty(GameConfig::default());
        sim.reveal_all(Side::Player);
        sim.reveal_all(Side::Ai);
        sim
    }

    #[test]
    fn test_losing_town_center_loses_match() {
        let mut sim = sim();
        let tc = sim.spawn_town_center(Side::Ai, Vec2Fixed::from_ints(700, 300));
        sim.apply_damage(tc, 10_000, None);

        assert_eq!(sim.outcome(), Some(Outcome::Winner(Side::Player)));
    }

    #[test]
    fn test_wood_threshold_wins() {
        let mut sim = sim();
        sim.set_wood(Side::Ai, 100);
        assert_eq!(sim.outcome(), Some(Outcome::Winner(Side::Ai)));
    }

    #[test]
    fn test_player_checked_first_on_wood_tie() {
        let mut sim = Simulation::empty(GameConfig {
            economy: crate::config::EconomyConfig {
                starting_wood: 100,
                ..Default::default()
            },
            ..GameConfig::default()
        });
        sim.tick();
        assert_eq!(sim.outcome(), Some(Outcome::Winner(Side::Player)));
    }

    #[test]
    fn test_fixture_world_never_ends() {
        let mut sim = sim();
        sim.spawn_worker(Side::Player, Vec2Fixed::from_ints(100, 100));
        for _ in 0..100 {
            sim.tick();
        }
        assert!(!sim.is_over());
    }

    #[test]
    fn test_cleared_forest_draws_when_quiet() {
        let mut sim = sim();
        let tree = sim.spawn_tree(Vec2Fixed::from_ints(400, 300));
        sim.apply_damage(tree, 100, None);
        assert_eq!(sim.outcome(), Some(Outcome::Draw));
    }

    #[test]
    fn test_draw_waits_for_busy_units() {
        let mut sim = sim();
        let tree = sim.spawn_tree(Vec2Fixed::from_ints(400, 300));
        let spear = sim.spawn_spearman(Side::Player, Vec2Fixed::from_ints(100, 300), SpearmanGoal::Idle);
        sim.move_unit(spear, MoveOrder::new(Vec2Fixed::from_ints(300, 300), Travel::ToIdle, None));

        sim.apply_damage(tree, 100, None);
        assert!(!sim.is_over());

        sim.step(3000);
        assert_eq!(sim.outcome(), Some(Outcome::Draw));
    }

    #[test]
    fn test_game_over_stops_everything() {
        let mut sim = sim();
        let worker = sim.spawn_worker(Side::Player, Vec2Fixed::from_ints(100, 300));
        sim.move_unit(worker, MoveOrder::new(Vec2Fixed::from_ints(600, 300), Travel::ToExplore, None));
        let spear = sim.spawn_spearman(Side::Ai, Vec2Fixed::from_ints(600, 100), SpearmanGoal::Idle);
        sim.move_unit(spear, MoveOrder::new(Vec2Fixed::from_ints(100, 100), Travel::ToIdle, None));
        sim.step(500);

        sim.set_wood(Side::Player, 500);
        let events = sim.step(50);
        assert_eq!(events.game_over(), Some(Outcome::Winner(Side::Player)));

        let w = sim.entity(worker).unwrap();
        assert!(w.motion.is_none());
        assert_eq!(w.worker().unwrap().activity, WorkerActivity::Idle);
        let s = sim.entity(spear).unwrap();
        assert_eq!(s.spearman().unwrap().state, SpearmanState::Idle);

        let position = sim.entity(worker).unwrap().position;
        let later = sim.step(5000);
        assert!(later.is_empty());
        assert_eq!(sim.entity(worker).unwrap().position, position);
    }
}
