//! Worker behaviour: gathering wood, raising a barracks and exploring.
//!
//! An idle worker picks the first applicable action each tick:
//!
//! 1. Commit to a barracks next to its town centre when it can afford one
//!    and its side has none.
//! 2. Walk to the closest visible tree it may claim and chop it.
//! 3. Walk toward the nearest cell its side has not seen.
//! 4. Stay idle.
//!
//! Wood is paid out when chopping stops, measured from the tree's health
//! at the moment chopping began.

use tracing::{debug, info, warn};

use crate::components::{EntityId, EntityKind, WorkerActivity};
use crate::events::{Animation, SimEvent};
use crate::math::{Fixed, Vec2Fixed};
use crate::movement::{MoveOrder, Travel};
use crate::simulation::Simulation;
use crate::spatial;
use crate::timers::TimerKind;

impl Simulation {
    /// Run one decision for a worker.
    pub(crate) fn decide_worker(&mut self, id: EntityId) {
        if self.selection == Some(id) {
            return;
        }
        let Some(entity) = self.entities.get_active(id) else {
            return;
        };
        let Some(worker) = entity.worker() else {
            return;
        };
        let activity = worker.activity;

        let stuck = (activity.is_moving() && entity.motion.is_none())
            || (activity == WorkerActivity::Chopping && !entity.timers.has(TimerKind::Chop))
            || (activity == WorkerActivity::Building && !entity.timers.has(TimerKind::Build));
        if stuck {
            warn!(worker = id, %activity, "Worker stuck, resetting to idle");
            self.stop_chopping(id);
            self.stop_building(id);
            self.set_idle(id);
            return;
        }
        if activity.is_busy() {
            return;
        }

        if self.commit_barracks(id) || self.seek_tree(id) {
            return;
        }
        self.explore(id);
    }

    fn commit_barracks(&mut self, worker: EntityId) -> bool {
        let Some(entity) = self.entities.get_active(worker) else {
            return false;
        };
        let (side, worker_pos) = (entity.side, entity.position);
        if !side.is_combatant() || self.entities.count(side, EntityKind::Barracks) > 0 {
            return false;
        }
        let Some(town_center) = self
            .entities
            .iter_active()
            .find(|e| e.side == side && e.kind() == EntityKind::TownCenter)
            .map(|e| e.position)
        else {
            return false;
        };

        let cost = self.config.economy.barracks_wood_cost;
        if !self.spend_wood(side, cost) {
            return false;
        }

        let offset = Fixed::from_num(side.forward()) * Fixed::from_num(self.config.structures.barracks_offset);
        let site_pos = Vec2Fixed::new(town_center.x + offset, town_center.y)
            .clamp_to(self.config.world_width(), self.config.world_height());
        let site = self.spawn_barracks(side, site_pos, true);
        self.reveal_footprint(site);
        self.emit(SimEvent::ConstructionStarted { barracks: site, side });
        info!(worker, barracks = site, %side, cost, "Barracks construction committed");

        let approach = Fixed::from_num(self.config.worker.build_approach);
        let spot = site_pos.offset_toward(worker_pos, approach);
        if !self.move_unit(worker, MoveOrder::new(spot, Travel::ToBuild, Some(site))) {
            self.abandon_construction(site);
        }
        true
    }

    fn seek_tree(&mut self, worker: EntityId) -> bool {
        let Some(tree) = spatial::closest_visible_tree(&self.entities, &self.visibility, worker) else {
            return false;
        };
        let (Some(tree_pos), Some(worker_pos)) = (
            self.entities.get(tree).map(|e| e.position),
            self.entities.get(worker).map(|e| e.position),
        ) else {
            return false;
        };
        let spot = tree_pos.offset_toward(worker_pos, Fixed::from_num(self.config.worker.tree_approach));
        debug!(worker, tree, "Heading to tree");
        self.move_unit(worker, MoveOrder::new(spot, Travel::ToChop, Some(tree)))
    }

    /// Send a unit toward the nearest cell its side has not revealed.
    pub(crate) fn explore(&mut self, unit: EntityId) -> bool {
        let Some(entity) = self.entities.get_active(unit) else {
            return false;
        };
        let Some(cell) = self.visibility.nearest_hidden(entity.side, entity.position) else {
            return false;
        };
        let destination = self.visibility.cell_center(cell);
        debug!(unit, x = cell.x, y = cell.y, "Exploring");
        self.move_unit(unit, MoveOrder::new(destination, Travel::ToExplore, None))
    }

    /// Start chopping `tree`. Fails when the tree is gone or claimed by a
    /// worker of the other side.
    pub(crate) fn start_chopping(&mut self, worker: EntityId, tree: EntityId) -> bool {
        if self.is_over() {
            return false;
        }
        let Some(target) = self.entities.get_active(tree) else {
            return false;
        };
        if target.kind() != EntityKind::Tree {
            return false;
        }
        let (tree_pos, tree_health) = (target.position, target.health.current);
        let Some(side) = self
            .entities
            .get_active(worker)
            .filter(|e| e.kind() == EntityKind::Worker)
            .map(|e| e.side)
        else {
            return false;
        };
        if spatial::is_tree_claimed_against(&self.entities, tree, side) {
            debug!(worker, tree, "Tree claimed by the other side");
            return false;
        }

        self.stop_chopping(worker);
        self.stop_building(worker);
        if let Some(w) = self.entities.get_mut(worker).and_then(|e| e.worker_mut()) {
            w.cutting_target = Some(tree);
            w.initial_chop_health = tree_health;
        }
        self.set_worker_activity(worker, WorkerActivity::Chopping);
        self.schedule_timer(worker, TimerKind::Chop, self.config.worker.chop_interval_ms, true);
        self.face_toward(worker, tree_pos);
        self.emit(SimEvent::Animation {
            entity: worker,
            animation: Animation::Chop,
        });
        debug!(worker, tree, tree_health, "Chopping started");
        true
    }

    pub(crate) fn fire_chop(&mut self, worker: EntityId) {
        let Some(w) = self.entities.get_active(worker).and_then(|e| e.worker()) else {
            return;
        };
        if w.activity != WorkerActivity::Chopping {
            return;
        }
        let target = w.cutting_target;
        match target {
            Some(tree) if self.entities.is_active(tree) => {
                self.apply_damage(tree, 1, Some(worker));
            }
            _ => {
                self.stop_chopping(worker);
                self.set_idle(worker);
            }
        }
    }

    /// Stop chopping and pay the worker's side for the damage dealt since
    /// chopping began. A felled or vanished tree pays its full remainder.
    /// Safe to call on a worker that is not chopping or has just died.
    pub(crate) fn stop_chopping(&mut self, worker: EntityId) {
        let Some(entity) = self.entities.get_mut(worker) else {
            return;
        };
        let side = entity.side;
        let Some(w) = entity.worker_mut() else {
            return;
        };
        let Some(tree) = w.cutting_target.take() else {
            return;
        };
        let initial = std::mem::take(&mut w.initial_chop_health);
        entity.timers.cancel(TimerKind::Chop);

        let remaining = self
            .entities
            .get(tree)
            .filter(|t| t.active)
            .map_or(0, |t| t.health.current);
        let payout = initial.saturating_sub(remaining);
        debug!(worker, tree, payout, "Chopping stopped");
        self.deposit_wood(side, payout);
    }

    /// Start raising `barracks`. Fails unless it is an active construction
    /// site of the worker's side.
    pub(crate) fn start_building(&mut self, worker: EntityId, barracks: EntityId) -> bool {
        if self.is_over() {
            return false;
        }
        let Some(site) = self.entities.get_active(barracks) else {
            return false;
        };
        if !site.barracks().is_some_and(|b| b.under_construction) {
            return false;
        }
        let (site_side, site_pos) = (site.side, site.position);
        if self.entities.get_active(worker).map(|e| e.side) != Some(site_side) {
            return false;
        }

        self.stop_chopping(worker);
        if let Some(w) = self.entities.get_mut(worker).and_then(|e| e.worker_mut()) {
            w.building_target = Some(barracks);
        }
        self.set_worker_activity(worker, WorkerActivity::Building);
        self.schedule_timer(worker, TimerKind::Build, self.config.worker.build_interval_ms, true);
        self.face_toward(worker, site_pos);
        self.emit(SimEvent::Animation {
            entity: worker,
            animation: Animation::Build,
        });
        debug!(worker, barracks, "Building started");
        true
    }

    pub(crate) fn fire_build(&mut self, worker: EntityId) {
        let Some(w) = self.entities.get_active(worker).and_then(|e| e.worker()) else {
            return;
        };
        if w.activity != WorkerActivity::Building {
            return;
        }
        let Some(barracks) = w.building_target else {
            self.stop_building(worker);
            self.set_idle(worker);
            return;
        };
        let Some(site) = self
            .entities
            .get_mut(barracks)
            .filter(|e| e.active && e.barracks().is_some_and(|b| b.under_construction))
        else {
            self.stop_building(worker);
            self.set_idle(worker);
            return;
        };

        site.health.heal(1);
        let (health, max) = (site.health.current, site.health.max);
        self.emit(SimEvent::ConstructionProgress { barracks, health, max });

        if health >= max {
            self.complete_construction(barracks);
            self.stop_building(worker);
            self.set_idle(worker);
        }
    }

    fn complete_construction(&mut self, barracks: EntityId) {
        let Some(entity) = self.entities.get_mut(barracks) else {
            return;
        };
        let side = entity.side;
        if let Some(b) = entity.barracks_mut() {
            b.under_construction = false;
        }
        self.reveal_footprint(barracks);
        self.emit(SimEvent::ConstructionCompleted { barracks, side });
        info!(barracks, %side, tick = self.tick, "Barracks completed");
    }

    /// Stop raising a barracks. The site itself is left as it is.
    pub(crate) fn stop_building(&mut self, worker: EntityId) {
        let Some(entity) = self.entities.get_mut(worker) else {
            return;
        };
        let cancelled = entity.timers.cancel(TimerKind::Build);
        if let Some(w) = entity.worker_mut() {
            if cancelled || w.activity == WorkerActivity::Building {
                w.building_target = None;
            }
        }
    }

    /// Remove an unfinished barracks and refund its cost. No-op for a
    /// finished or already removed barracks.
    pub(crate) fn abandon_construction(&mut self, barracks: EntityId) {
        let Some(entity) = self.entities.get_mut(barracks) else {
            return;
        };
        if !entity.active || !entity.barracks().is_some_and(|b| b.under_construction) {
            return;
        }
        entity.active = false;
        entity.timers.clear();
        let side = entity.side;
        let refund = self.config.economy.barracks_wood_cost;

        self.emit(SimEvent::ConstructionCancelled { barracks, side, refund });
        info!(barracks, %side, refund, "Barracks construction abandoned");
        self.release_references(barracks);
        self.deposit_wood(side, refund);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::Side;
    use crate::config::GameConfig;

    fn sim() -> Simulation {
        let mut sim = Simulation::empty(GameConfig::default());
        sim.reveal_all(Side::Player);
        sim.reveal_all(Side::Ai);
        sim
    }

    fn activity(sim: &Simulation, id: EntityId) -> WorkerActivity {
        sim.entity(id).unwrap().worker().unwrap().activity
    }

    #[test]
    fn test_idle_worker_heads_for_closest_tree() {
        let mut sim = sim();
        let far = sim.spawn_tree(Vec2Fixed::from_ints(600, 300));
        let near = sim.spawn_tree(Vec2Fixed::from_ints(300, 300));
        let worker = sim.spawn_worker(Side::Player, Vec2Fixed::from_ints(100, 300));

        sim.step(1);
        let motion = sim.entity(worker).unwrap().motion.unwrap();
        assert_eq!(motion.order.target, Some(near));
        assert_ne!(motion.order.target, Some(far));
        assert_eq!(motion.order.destination, Vec2Fixed::from_ints(270, 300));
        assert_eq!(activity(&sim, worker), WorkerActivity::MovingToChop);
    }

    #[test]
    fn test_worker_skips_tree_claimed_by_other_side() {
        let mut sim = sim();
        let contested = sim.spawn_tree(Vec2Fixed::from_ints(300, 300));
        let spare = sim.spawn_tree(Vec2Fixed::from_ints(300, 500));
        let ai = sim.spawn_worker(Side::Ai, Vec2Fixed::from_ints(330, 300));
        assert!(sim.start_chopping(ai, contested));

        let player = sim.spawn_worker(Side::Player, Vec2Fixed::from_ints(250, 300));
        sim.step(1);
        let motion = sim.entity(player).unwrap().motion.unwrap();
        assert_eq!(motion.order.target, Some(spare));
        assert!(!sim.start_chopping(player, contested));
    }

    #[test]
    fn test_worker_explores_hidden_cells() {
        let mut sim = Simulation::empty(GameConfig::default());
        let worker = sim.spawn_worker(Side::Player, Vec2Fixed::from_ints(100, 100));
        sim.step(1);
        assert_eq!(activity(&sim, worker), WorkerActivity::MovingToExplore);
    }

    #[test]
    fn test_worker_idles_with_nothing_to_do() {
        let mut sim = sim();
        let worker = sim.spawn_worker(Side::Player, Vec2Fixed::from_ints(100, 100));
        sim.step(1);
        assert_eq!(activity(&sim, worker), WorkerActivity::Idle);
        assert!(sim.entity(worker).unwrap().motion.is_none());
    }

    #[test]
    fn test_chop_pays_on_interrupt() {
        let mut sim = sim();
        let tree = sim.spawn_tree(Vec2Fixed::from_ints(330, 300));
        let worker = sim.spawn_worker(Side::Player, Vec2Fixed::from_ints(300, 300));
        assert!(sim.start_chopping(worker, tree));
        for _ in 0..4 {
            sim.step(1000);
        }
        assert_eq!(sim.entity(tree).unwrap().health.current, 6);
        assert_eq!(sim.wood(Side::Player), 0);

        sim.move_unit(worker, MoveOrder::new(Vec2Fixed::from_ints(100, 100), Travel::ToIdle, None));
        assert_eq!(sim.wood(Side::Player), 4);
        assert!(!sim.entity(worker).unwrap().timers.has(TimerKind::Chop));
    }

    #[test]
    fn test_commit_places_site_beside_town_center() {
        let mut sim = sim();
        sim.set_wood(Side::Ai, 45);
        sim.spawn_town_center(Side::Ai, Vec2Fixed::from_ints(700, 300));
        let worker = sim.spawn_worker(Side::Ai, Vec2Fixed::from_ints(500, 300));
        sim.step(1);

        assert_eq!(sim.wood(Side::Ai), 5);
        let site = sim.entities().ids_of_kind(EntityKind::Barracks)[0];
        let barracks = sim.entity(site).unwrap();
        assert_eq!(barracks.position, Vec2Fixed::from_ints(620, 300));
        assert_eq!(barracks.health.current, 0);
        assert!(barracks.barracks().unwrap().under_construction);

        let motion = sim.entity(worker).unwrap().motion.unwrap();
        assert_eq!(motion.order.destination, Vec2Fixed::from_ints(580, 300));
        assert_eq!(motion.order.target, Some(site));
    }

    #[test]
    fn test_no_second_barracks() {
        let mut sim = sim();
        sim.set_wood(Side::Player, 80);
        sim.spawn_town_center(Side::Player, Vec2Fixed::from_ints(100, 300));
        sim.spawn_barracks(Side::Player, Vec2Fixed::from_ints(180, 300), false);
        let worker = sim.spawn_worker(Side::Player, Vec2Fixed::from_ints(300, 300));
        sim.step(1);
        assert_eq!(sim.entities().count(Side::Player, EntityKind::Barracks), 1);
        assert_eq!(activity(&sim, worker), WorkerActivity::Idle);
    }

    #[test]
    fn test_stuck_worker_resets() {
        let mut sim = sim();
        let worker = sim.spawn_worker(Side::Player, Vec2Fixed::from_ints(300, 300));
        sim.set_worker_activity(worker, WorkerActivity::Chopping);
        sim.step(1);
        assert_eq!(activity(&sim, worker), WorkerActivity::Idle);
    }

    #[test]
    fn test_building_completes_barracks() {
        let mut sim = sim();
        let site = sim.spawn_barracks(Side::Player, Vec2Fixed::from_ints(400, 300), true);
        let worker = sim.spawn_worker(Side::Player, Vec2Fixed::from_ints(360, 300));
        assert!(sim.start_building(worker, site));
        for _ in 0..100 {
            sim.step(1000);
        }
        let barracks = sim.entity(site).unwrap();
        assert!(!barracks.barracks().unwrap().under_construction);
        assert!(barracks.health.is_full());
        assert_eq!(activity(&sim, worker), WorkerActivity::Idle);
    }
}
