//! Barracks training.
//!
//! A finished barracks trains one spearman at a time. The cost is paid up
//! front when training starts; a barracks that dies mid-training forfeits
//! it.

use tracing::{debug, info};

use crate::components::{EntityId, Side, Training};
use crate::events::SimEvent;
use crate::math::{Fixed, Vec2Fixed};
use crate::simulation::Simulation;
use crate::spatial;
use crate::timers::TimerKind;

impl Simulation {
    /// Start training if the barracks is free, its side is under the
    /// population cap and can pay.
    pub(crate) fn decide_barracks(&mut self, id: EntityId) {
        let Some(entity) = self.entities.get_active(id) else {
            return;
        };
        let Some(barracks) = entity.barracks() else {
            return;
        };
        if barracks.under_construction || barracks.training.is_some() {
            return;
        }
        let side = entity.side;
        if self.population_capped(side) {
            return;
        }
        if !self.spend_wood(side, self.config.economy.spearman_wood_cost) {
            return;
        }
        let duration_ms = self.config.spearman.train_ms;
        let now = self.time_ms;
        if let Some(b) = self.entities.get_mut(id).and_then(|e| e.barracks_mut()) {
            b.training = Some(Training {
                started_at_ms: now,
                duration_ms,
            });
        }
        self.schedule_timer(id, TimerKind::Train, duration_ms, false);
        self.emit(SimEvent::TrainingStarted { barracks: id });
        debug!(barracks = id, %side, duration_ms, "Training started");
    }

    pub(crate) fn fire_train(&mut self, id: EntityId) {
        let Some(entity) = self.entities.get_mut(id) else {
            return;
        };
        if !entity.active {
            return;
        }
        let Some(training) = entity.barracks_mut().and_then(|b| b.training.take()) else {
            return;
        };
        let (side, origin) = (entity.side, entity.position);
        if self.population_capped(side) {
            debug!(barracks = id, %side, ?training, "Population cap reached, training discarded");
            return;
        }

        let offset = Fixed::from_num(side.forward()) * Fixed::from_num(self.config.structures.spawn_offset);
        let mut spot = Vec2Fixed::new(origin.x + offset, origin.y)
            .clamp_to(self.config.world_width(), self.config.world_height());
        let radius = Fixed::from_num(self.config.collision_radius);
        if spatial::is_occupied(&self.entities, spot, radius, None) {
            spot = spatial::find_nearby_free_position(
                &self.entities,
                spot,
                self.config.collision_radius,
                self.config.free_position_radius,
                None,
                &mut self.rng,
            )
            .clamp_to(self.config.world_width(), self.config.world_height());
        }

        let goal = self.random_goal();
        let spearman = self.spawn_spearman(side, spot, goal);
        self.reveal_footprint(spearman);
        self.emit(SimEvent::SpearmanSpawned {
            spearman,
            barracks: id,
            side,
        });
        info!(spearman, barracks = id, %side, %goal, "Spearman trained");
    }

    /// Abort training, forfeiting its cost.
    pub(crate) fn cancel_training(&mut self, id: EntityId) {
        let Some(entity) = self.entities.get_mut(id) else {
            return;
        };
        let cancelled = entity.timers.cancel(TimerKind::Train);
        let had_training = entity
            .barracks_mut()
            .and_then(|b| b.training.take())
            .is_some();
        if cancelled || had_training {
            self.emit(SimEvent::TrainingCancelled { barracks: id });
            debug!(barracks = id, "Training cancelled");
        }
    }

    /// Progress of the spearman in training, 0-100. `None` when the
    /// barracks is idle or gone.
    #[must_use]
    pub fn training_percent(&self, id: EntityId) -> Option<u32> {
        let training = self.entities.get_active(id)?.barracks()?.training?;
        let elapsed = self.time_ms.saturating_sub(training.started_at_ms);
        let percent = elapsed.saturating_mul(100) / training.duration_ms.max(1);
        Some(u32::try_from(percent.min(100)).unwrap_or(100))
    }

    fn population_capped(&self, side: Side) -> bool {
        self.spearman_count(side) >= self.config.spearman.limit as usize
    }
}

#[cfg(test)]
mod tests {
    use crate::components::{EntityKind, Side, SpearmanGoal};
    use crate::config::GameConfig;
    use crate::events::SimEvent;
    use crate::math::Vec2Fixed;
    use crate::simulation::Simulation;

    fn sim() -> Simulation {
        let mut sim = Simulation::empty(GameConfig::default());
        sim.reveal_all(Side::Player);
        sim.reveal_all(Side::Ai);
        sim
    }

    #[test]
    fn test_barracks_trains_spearman() {
        let mut sim = sim();
        sim.set_wood(Side::Player, 30);
        let barracks = sim.spawn_barracks(Side::Player, Vec2Fixed::from_ints(200, 300), false);

        sim.step(1);
        assert_eq!(sim.wood(Side::Player), 10);
        assert_eq!(sim.training_percent(barracks), Some(0));

        sim.step(2500);
        assert_eq!(sim.training_percent(barracks), Some(50));

        let events = sim.step(2500);
        assert_eq!(sim.spearman_count(Side::Player), 1);
        assert!(events
            .events
            .iter()
            .any(|e| matches!(e, SimEvent::SpearmanSpawned { barracks: b, .. } if *b == barracks)));

        let spearman = sim.entities().ids_of_kind(EntityKind::Spearman)[0];
        assert_eq!(sim.entity(spearman).unwrap().position, Vec2Fixed::from_ints(240, 300));
    }

    #[test]
    fn test_training_needs_wood() {
        let mut sim = sim();
        sim.set_wood(Side::Ai, 19);
        let barracks = sim.spawn_barracks(Side::Ai, Vec2Fixed::from_ints(600, 300), false);
        sim.step(1);
        assert_eq!(sim.training_percent(barracks), None);
        assert_eq!(sim.wood(Side::Ai), 19);
    }

    #[test]
    fn test_site_under_construction_does_not_train() {
        let mut sim = sim();
        sim.set_wood(Side::Ai, 50);
        let barracks = sim.spawn_barracks(Side::Ai, Vec2Fixed::from_ints(600, 300), true);
        sim.step(1);
        assert_eq!(sim.training_percent(barracks), None);
    }

    #[test]
    fn test_population_cap_respected() {
        let mut sim = sim();
        sim.set_wood(Side::Ai, 60);
        for i in 0..5 {
            sim.spawn_spearman(Side::Ai, Vec2Fixed::from_ints(700, 100 + i * 50), SpearmanGoal::Defend);
        }
        let barracks = sim.spawn_barracks(Side::Ai, Vec2Fixed::from_ints(600, 300), false);
        sim.step(1);
        assert_eq!(sim.training_percent(barracks), None);
        assert_eq!(sim.wood(Side::Ai), 60);
    }

    #[test]
    fn test_spawn_spot_displaced_when_occupied() {
        let mut sim = sim();
        sim.set_wood(Side::Ai, 20);
        let barracks = sim.spawn_barracks(Side::Ai, Vec2Fixed::from_ints(600, 300), false);
        let blocker = sim.spawn_worker(Side::Ai, Vec2Fixed::from_ints(560, 300));
        sim.step(1);
        sim.step(5000);

        let spearman = sim.entities().ids_of_kind(EntityKind::Spearman)[0];
        let spot = sim.entity(spearman).unwrap().position;
        let blocker_pos = sim.entity(blocker).unwrap().position;
        assert_ne!(spot, blocker_pos);
        assert_eq!(sim.training_percent(barracks), None);
    }

    #[test]
    fn test_destroyed_barracks_forfeits_training() {
        let mut sim = sim();
        sim.set_wood(Side::Player, 20);
        let barracks = sim.spawn_barracks(Side::Player, Vec2Fixed::from_ints(200, 300), false);
        sim.step(1);
        assert!(sim.training_percent(barracks).is_some());

        sim.apply_damage(barracks, 1000, None);
        sim.step(5000);
        assert_eq!(sim.spearman_count(Side::Player), 0);
        assert_eq!(sim.wood(Side::Player), 0);
    }
}
