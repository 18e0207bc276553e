//! Player commands.
//!
//! These are the only fallible entry points into the simulation. Every
//! command interrupts whatever the unit was doing and clears the
//! selection; a rejected command changes nothing.

use tracing::debug;

use crate::components::{EntityId, EntityKind, Side, SpearmanGoal};
use crate::entities::Entity;
use crate::error::{GameError, Result};
use crate::events::SimEvent;
use crate::math::{Fixed, Vec2Fixed};
use crate::movement::{MoveOrder, Travel};
use crate::simulation::Simulation;
use crate::spatial;

impl Simulation {
    /// Toggle selection of a player unit. Returns whether the unit is
    /// selected afterwards.
    pub fn select_unit(&mut self, id: EntityId) -> Result<bool> {
        self.ensure_running()?;
        self.player_unit(id)?;

        let selected = if self.selection == Some(id) {
            None
        } else {
            Some(id)
        };
        self.selection = selected;
        self.emit(SimEvent::SelectionChanged { selected });
        debug!(?selected, "Selection changed");
        Ok(selected.is_some())
    }

    /// The selected unit, if any.
    #[must_use]
    pub const fn selected(&self) -> Option<EntityId> {
        self.selection
    }

    /// Walk a player unit to `point`. A spearman drops its goal and waits
    /// there.
    pub fn command_move(&mut self, unit: EntityId, point: Vec2Fixed) -> Result<()> {
        self.ensure_running()?;
        let kind = self.player_unit(unit)?.kind();

        self.clear_selection();
        if kind == EntityKind::Spearman {
            self.set_goal(unit, SpearmanGoal::Idle);
            self.set_reason(unit, "player order");
        }
        self.issue(unit, MoveOrder::new(point, Travel::ToIdle, None))
    }

    /// Send a player spearman against an AI entity.
    pub fn command_attack(&mut self, spearman: EntityId, target: EntityId) -> Result<()> {
        self.ensure_running()?;
        if self.player_unit(spearman)?.kind() != EntityKind::Spearman {
            return Err(GameError::InvalidTarget {
                unit: spearman,
                target,
            });
        }
        let valid = self
            .entities
            .get_active(target)
            .is_some_and(|t| t.side == Side::Ai);
        if !valid {
            return Err(GameError::InvalidTarget {
                unit: spearman,
                target,
            });
        }

        self.clear_selection();
        self.set_goal(spearman, SpearmanGoal::Attack);
        self.set_reason(spearman, "player order");
        self.halt(spearman);
        if self.engage(spearman, target) {
            Ok(())
        } else {
            Err(GameError::InvalidState(format!(
                "Spearman {spearman} could not engage {target}"
            )))
        }
    }

    /// Send a player worker to chop `tree`. Rejected while any other
    /// worker, on either side, holds a claim on it.
    pub fn command_chop(&mut self, worker: EntityId, tree: EntityId) -> Result<()> {
        self.ensure_running()?;
        if self.player_unit(worker)?.kind() != EntityKind::Worker {
            return Err(GameError::InvalidTarget { unit: worker, target: tree });
        }
        let tree_pos = match self.entities.get_active(tree) {
            Some(t) if t.kind() == EntityKind::Tree => t.position,
            _ => return Err(GameError::InvalidTarget { unit: worker, target: tree }),
        };
        if let Some(claimed_by) = spatial::tree_claimant(&self.entities, tree, |w| w.id != worker) {
            return Err(GameError::TargetClaimed { tree, claimed_by });
        }

        self.clear_selection();
        let approach = Fixed::from_num(self.config.worker.tree_approach);
        let me = self.entities.get(worker).map_or(tree_pos, |e| e.position);
        self.issue(
            worker,
            MoveOrder::new(tree_pos.offset_toward(me, approach), Travel::ToChop, Some(tree)),
        )
    }

    fn issue(&mut self, unit: EntityId, order: MoveOrder) -> Result<()> {
        if self.move_unit(unit, order) {
            Ok(())
        } else {
            Err(GameError::InvalidState(format!("Unit {unit} cannot travel")))
        }
    }

    fn ensure_running(&self) -> Result<()> {
        if self.is_over() {
            return Err(GameError::InvalidState("Match is over".to_string()));
        }
        Ok(())
    }

    fn player_unit(&self, id: EntityId) -> Result<&Entity> {
        let entity = self
            .entities
            .get_active(id)
            .ok_or(GameError::EntityNotFound(id))?;
        if entity.side != Side::Player || !entity.kind().is_unit() {
            return Err(GameError::NotPlayerControlled(id));
        }
        Ok(entity)
    }

    fn clear_selection(&mut self) {
        if self.selection.take().is_some() {
            self.emit(SimEvent::SelectionChanged { selected: None });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{SpearmanState, WorkerActivity};
    use crate::config::GameConfig;

    fn sim() -> Simulation {
        let mut sim = Simulation::empty(GameConfig::default());
        sim.reveal_all(Side::Player);
        sim.reveal_all(Side::Ai);
        sim
    }

    #[test]
    fn test_select_toggles() {
        let mut sim = sim();
        let worker = sim.spawn_worker(Side::Player, Vec2Fixed::from_ints(100, 300));
        assert!(sim.select_unit(worker).unwrap());
        assert_eq!(sim.selected(), Some(worker));
        assert!(!sim.select_unit(worker).unwrap());
        assert_eq!(sim.selected(), None);
    }

    #[test]
    fn test_ai_units_cannot_be_selected() {
        let mut sim = sim();
        let worker = sim.spawn_worker(Side::Ai, Vec2Fixed::from_ints(700, 300));
        assert!(matches!(sim.select_unit(worker), Err(GameError::NotPlayerControlled(_))));
        assert!(matches!(sim.select_unit(999), Err(GameError::EntityNotFound(999))));
    }

    #[test]
    fn test_move_command_clears_selection_and_goal() {
        let mut sim = sim();
        let spear = sim.spawn_spearman(Side::Player, Vec2Fixed::from_ints(100, 300), SpearmanGoal::Attack);
        sim.select_unit(spear).unwrap();
        sim.command_move(spear, Vec2Fixed::from_ints(300, 300)).unwrap();

        assert_eq!(sim.selected(), None);
        let s = sim.entity(spear).unwrap().spearman().unwrap();
        assert_eq!(s.goal, SpearmanGoal::Idle);
        assert_eq!(s.state, SpearmanState::MovingToIdle);
    }

    #[test]
    fn test_attack_command_rejects_friendly_target() {
        let mut sim = sim();
        let spear = sim.spawn_spearman(Side::Player, Vec2Fixed::from_ints(100, 300), SpearmanGoal::Idle);
        let friend = sim.spawn_worker(Side::Player, Vec2Fixed::from_ints(200, 300));
        let err = sim.command_attack(spear, friend).unwrap_err();
        assert!(matches!(err, GameError::InvalidTarget { .. }));
    }

    #[test]
    fn test_attack_command_engages() {
        let mut sim = sim();
        let spear = sim.spawn_spearman(Side::Player, Vec2Fixed::from_ints(100, 300), SpearmanGoal::Defend);
        let enemy = sim.spawn_town_center(Side::Ai, Vec2Fixed::from_ints(700, 300));
        sim.command_attack(spear, enemy).unwrap();
        let s = sim.entity(spear).unwrap().spearman().unwrap();
        assert_eq!(s.goal, SpearmanGoal::Attack);
        assert_eq!(s.state, SpearmanState::MovingToAttack);
        assert_eq!(s.attack_target, Some(enemy));
    }

    #[test]
    fn test_chop_command_rejects_claimed_tree() {
        let mut sim = sim();
        let tree = sim.spawn_tree(Vec2Fixed::from_ints(400, 300));
        let mine = sim.spawn_worker(Side::Player, Vec2Fixed::from_ints(100, 300));
        let other = sim.spawn_worker(Side::Player, Vec2Fixed::from_ints(200, 300));
        sim.command_chop(other, tree).unwrap();

        let err = sim.command_chop(mine, tree).unwrap_err();
        assert!(matches!(err, GameError::TargetClaimed { claimed_by, .. } if claimed_by == other));
        assert_eq!(
            sim.entity(mine).unwrap().worker().unwrap().activity,
            WorkerActivity::Idle
        );
    }

    #[test]
    fn test_chop_command_rejects_non_tree() {
        let mut sim = sim();
        let worker = sim.spawn_worker(Side::Player, Vec2Fixed::from_ints(100, 300));
        let tc = sim.spawn_town_center(Side::Player, Vec2Fixed::from_ints(200, 300));
        assert!(sim.command_chop(worker, tc).is_err());
    }

    #[test]
    fn test_commands_rejected_after_game_over() {
        let mut sim = sim();
        let worker = sim.spawn_worker(Side::Player, Vec2Fixed::from_ints(100, 300));
        sim.set_wood(Side::Player, 100);
        let err = sim.command_move(worker, Vec2Fixed::from_ints(200, 300)).unwrap_err();
        assert!(matches!(err, GameError::InvalidState(_)));
    }
}
