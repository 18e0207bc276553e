//! Core simulation loop.
//!
//! The simulation owns every piece of match state and advances it in a
//! fixed, documented order. Nothing here blocks; delayed actions are
//! per-entity timers polled by [`Simulation::step`].
//!
//! # Determinism
//!
//! All operations in this module are fully deterministic:
//! - No floating-point math (uses fixed-point via [`Fixed`])
//! - Randomness only from the seeded match RNG
//! - Consistent iteration order (sorted entity IDs)
//! - Same inputs always produce same outputs
//!
//! # Step order
//!
//! 1. Advance movement; process arrivals
//! 2. Fire due timers (chop, build, attack, train)
//! 3. Refresh both visibility grids
//! 4. Decide: workers, then barracks, then spearmen
//! 5. Purge inactive entities
//! 6. Arbitrate sound loops and evaluate the end condition
//!
//! # Example
//!
//! ```
//! use skirmish_core::config::GameConfig;
//! use skirmish_core::simulation::Simulation;
//!
//! let mut sim = Simulation::new_skirmish(GameConfig::with_seed(7));
//! let events = sim.tick();
//! assert_eq!(events.tick, 1);
//! ```

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use crate::components::{
    Barracks, EntityBody, EntityId, EntityKind, Health, Side, Spearman, SpearmanGoal, Worker,
};
use crate::config::GameConfig;
use crate::economy::Economy;
use crate::entities::{Entity, EntityStorage};
use crate::events::{SimEvent, SoundLoops, TickEvents};
use crate::math::{Fixed, Vec2Fixed};
use crate::timers::TimerKind;
use crate::victory::{Outcome, VictoryTracker};
use crate::visibility::{VisibilityGrid, WorldRect};

/// Ticks per second for the simulation.
pub const TICK_RATE: u32 = 20;

/// Duration of one tick in milliseconds.
pub const TICK_DURATION_MS: u32 = 1000 / TICK_RATE;

/// Distance of each side's town centre from its edge of the map.
const TOWN_CENTER_INSET: i32 = 100;

/// Distance of each side's starting worker in front of its town centre.
const WORKER_START_OFFSET: i32 = 60;

/// The core game simulation.
///
/// Owns the entities, both fog grids, both stockpiles, the match RNG and
/// the events produced since the last step.
#[derive(Debug, Clone)]
pub struct Simulation {
    pub(crate) config: GameConfig,
    pub(crate) tick: u64,
    pub(crate) time_ms: u64,
    pub(crate) entities: EntityStorage,
    pub(crate) visibility: VisibilityGrid,
    pub(crate) economy: Economy,
    pub(crate) rng: SmallRng,
    pub(crate) selection: Option<EntityId>,
    pub(crate) next_timer_uid: u64,
    pub(crate) sounds: SoundLoops,
    pub(crate) victory: VictoryTracker,
    pub(crate) outcome: Option<Outcome>,
    pub(crate) pending: Vec<SimEvent>,
}

impl Simulation {
    /// A world with no entities, fully fogged, both sides at the starting
    /// wood. Scripted scenarios build on this.
    #[must_use]
    pub fn empty(config: GameConfig) -> Self {
        Self {
            tick: 0,
            time_ms: 0,
            entities: EntityStorage::new(),
            visibility: VisibilityGrid::new(&config.world),
            economy: Economy::new(config.economy.starting_wood),
            rng: SmallRng::seed_from_u64(config.seed),
            selection: None,
            next_timer_uid: 1,
            sounds: SoundLoops::default(),
            victory: VictoryTracker::default(),
            outcome: None,
            pending: Vec::new(),
            config,
        }
    }

    /// The standard match: a town centre and one worker per side on
    /// opposite edges, and a band of trees scattered between them.
    #[must_use]
    pub fn new_skirmish(config: GameConfig) -> Self {
        let mut sim = Self::empty(config);
        let width = sim.config.world.width as i32;
        let height = sim.config.world.height as i32;
        let mid = height / 2;

        for side in Side::COMBATANTS {
            let x = if side == Side::Player {
                TOWN_CENTER_INSET
            } else {
                width - TOWN_CENTER_INSET
            };
            sim.spawn_town_center(side, Vec2Fixed::from_ints(x, mid));
            let worker_x = x + side.forward() * WORKER_START_OFFSET;
            sim.spawn_worker(side, Vec2Fixed::from_ints(worker_x, mid));
        }

        let margin = sim.config.structures.tree_margin as i32;
        let band = TOWN_CENTER_INSET * 2;
        let (x_min, x_max) = (band, (width - band).max(band));
        let (y_min, y_max) = (margin, (height - margin).max(margin));
        for _ in 0..sim.config.structures.tree_count {
            let x = sim.rng.gen_range(x_min..=x_max);
            let y = sim.rng.gen_range(y_min..=y_max);
            sim.spawn_tree(Vec2Fixed::from_ints(x, y));
        }

        info!(
            seed = sim.config.seed,
            trees = sim.config.structures.tree_count,
            "Skirmish created"
        );
        sim
    }

    /// Get the current tick number.
    #[must_use]
    pub const fn get_tick(&self) -> u64 {
        self.tick
    }

    /// Simulation time in milliseconds.
    #[must_use]
    pub const fn time_ms(&self) -> u64 {
        self.time_ms
    }

    /// Match configuration.
    #[must_use]
    pub const fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Get a reference to the entity storage.
    #[must_use]
    pub fn entities(&self) -> &EntityStorage {
        &self.entities
    }

    /// Get an entity by ID, active or not.
    #[must_use]
    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(id)
    }

    /// Both fog grids.
    #[must_use]
    pub const fn visibility(&self) -> &VisibilityGrid {
        &self.visibility
    }

    /// Match result, once decided.
    #[must_use]
    pub const fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    /// Whether the match has ended.
    #[must_use]
    pub const fn is_over(&self) -> bool {
        self.outcome.is_some()
    }

    /// Advance the simulation by one fixed tick.
    pub fn tick(&mut self) -> TickEvents {
        self.step(u64::from(TICK_DURATION_MS))
    }

    /// Advance the simulation by `elapsed_ms` of game time.
    ///
    /// Returns the events produced since the previous step, including any
    /// produced by input commands in between. Once the match is over this
    /// only drains pending events.
    pub fn step(&mut self, elapsed_ms: u64) -> TickEvents {
        if self.is_over() {
            return self.drain_events();
        }

        self.tick += 1;
        self.time_ms += elapsed_ms;

        // 1. Movement
        self.advance_motions();

        // 2. Timers
        self.run_timers();

        // 3. Visibility
        self.refresh_visibility();

        // 4. Decisions
        self.run_decisions();

        // 5. Purge
        let purged = self.entities.purge_inactive();
        if !purged.is_empty() {
            debug!(tick = self.tick, count = purged.len(), "Purged inactive entities");
        }

        // 6. Sound loops and end condition
        if !self.is_over() {
            self.update_sound_loops();
            self.check_end_condition();
        }

        #[cfg(debug_assertions)]
        {
            let hash = self.state_hash();
            tracing::trace!(tick = self.tick, state_hash = hash, "Simulation state hash");
        }

        self.drain_events()
    }

    fn drain_events(&mut self) -> TickEvents {
        TickEvents {
            tick: self.tick,
            time_ms: self.time_ms,
            events: std::mem::take(&mut self.pending),
        }
    }

    /// Queue an event for the next [`TickEvents`].
    pub(crate) fn emit(&mut self, event: SimEvent) {
        self.pending.push(event);
    }

    fn run_timers(&mut self) {
        let now = self.time_ms;
        let mut due = Vec::new();
        for id in self.entities.sorted_ids() {
            if let Some(entity) = self.entities.get_mut(id) {
                if entity.active {
                    due.extend(entity.timers.take_due(now).into_iter().map(|d| (id, d)));
                }
            }
        }

        for (id, timer) in due {
            for _ in 0..timer.fires {
                if self.is_over() {
                    return;
                }
                let armed = self.entities.get_active(id).is_some_and(|e| {
                    !timer.repeating || e.timers.contains_uid(timer.uid)
                });
                if !armed {
                    break;
                }
                match timer.kind {
                    TimerKind::Chop => self.fire_chop(id),
                    TimerKind::Build => self.fire_build(id),
                    TimerKind::Attack => self.fire_attack(id),
                    TimerKind::Train => self.fire_train(id),
                }
            }
        }
    }

    fn refresh_visibility(&mut self) {
        let footprints = self.config.footprints;
        for (_, entity) in self.entities.iter() {
            if entity.active && entity.side.is_combatant() {
                let rect = WorldRect::from_footprint(entity.position, footprints.for_kind(entity.kind()));
                self.visibility.reveal(entity.side, rect);
            }
        }
    }

    fn run_decisions(&mut self) {
        for id in self.entities.ids_of_kind(EntityKind::Worker) {
            if self.is_over() {
                return;
            }
            self.decide_worker(id);
        }
        for id in self.entities.ids_of_kind(EntityKind::Barracks) {
            if self.is_over() {
                return;
            }
            self.decide_barracks(id);
        }
        for id in self.entities.ids_of_kind(EntityKind::Spearman) {
            if self.is_over() {
                return;
            }
            self.decide_spearman(id);
        }
    }

    /// Arm a timer on `unit`, replacing any of the same kind.
    pub(crate) fn schedule_timer(&mut self, unit: EntityId, kind: TimerKind, period_ms: u64, repeating: bool) {
        let uid = self.next_timer_uid;
        let now = self.time_ms;
        if let Some(entity) = self.entities.get_mut(unit) {
            self.next_timer_uid += 1;
            entity.timers.schedule(uid, kind, period_ms, now, repeating);
        }
    }

    /// Stop everything a unit is doing: its trip and any timed action.
    pub(crate) fn halt(&mut self, unit: EntityId) {
        self.interrupt(unit);
        self.stop_chopping(unit);
        self.stop_building(unit);
        self.stop_attacking(unit);
    }

    /// Reveal the whole map for a side.
    pub fn reveal_all(&mut self, side: Side) {
        let rect = WorldRect::new(
            Vec2Fixed::ZERO,
            Vec2Fixed::new(self.config.world_width(), self.config.world_height()),
        );
        self.visibility.reveal(side, rect);
    }

    /// Reveal a world rectangle for a side.
    pub fn reveal_area(&mut self, side: Side, rect: WorldRect) {
        self.visibility.reveal(side, rect);
    }

    /// Reveal the cells under an entity's footprint for its side.
    pub(crate) fn reveal_footprint(&mut self, id: EntityId) {
        let Some(entity) = self.entities.get(id) else {
            return;
        };
        let rect = WorldRect::from_footprint(entity.position, self.config.footprints.for_kind(entity.kind()));
        let side = entity.side;
        self.visibility.reveal(side, rect);
    }

    fn spawn(&mut self, entity: Entity) -> EntityId {
        let kind = entity.kind();
        let side = entity.side;
        let id = self.entities.insert(entity);
        debug!(id, ?kind, %side, "Entity spawned");
        id
    }

    /// Place a town centre at full health.
    pub fn spawn_town_center(&mut self, side: Side, position: Vec2Fixed) -> EntityId {
        let health = Health::new(self.config.structures.town_center_health);
        self.spawn(Entity::new(side, position, health, EntityBody::TownCenter))
    }

    /// Place a barracks. A site under construction starts with no structure.
    pub fn spawn_barracks(&mut self, side: Side, position: Vec2Fixed, under_construction: bool) -> EntityId {
        let max = self.config.structures.barracks_health;
        let health = if under_construction {
            Health::empty(max)
        } else {
            Health::new(max)
        };
        let body = EntityBody::Barracks(Barracks {
            under_construction,
            training: None,
        });
        self.spawn(Entity::new(side, position, health, body))
    }

    /// Place an idle worker.
    pub fn spawn_worker(&mut self, side: Side, position: Vec2Fixed) -> EntityId {
        let health = Health::new(self.config.worker.health);
        self.spawn(Entity::new(side, position, health, EntityBody::Worker(Worker::default())))
    }

    /// Place an idle spearman with an initial goal.
    pub fn spawn_spearman(&mut self, side: Side, position: Vec2Fixed, goal: SpearmanGoal) -> EntityId {
        let health = Health::new(self.config.spearman.health);
        self.spawn(Entity::new(side, position, health, EntityBody::Spearman(Spearman::new(goal))))
    }

    /// Plant a neutral tree. Planted trees count toward the draw condition.
    pub fn spawn_tree(&mut self, position: Vec2Fixed) -> EntityId {
        let health = Health::new(self.config.structures.tree_health);
        self.victory.trees_planted += 1;
        self.spawn(Entity::new(Side::Neutral, position, health, EntityBody::Tree))
    }

    /// Number of active spearmen a side fields.
    #[must_use]
    pub fn spearman_count(&self, side: Side) -> usize {
        self.entities.count(side, EntityKind::Spearman)
    }

    /// Calculate a hash of the current simulation state.
    ///
    /// Two simulations with identical state produce identical hashes.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();

        self.tick.hash(&mut hasher);
        self.time_ms.hash(&mut hasher);
        self.economy.hash(&mut hasher);
        self.outcome.hash(&mut hasher);
        self.selection.hash(&mut hasher);
        for side in Side::COMBATANTS {
            self.visibility.revealed_count(side).hash(&mut hasher);
        }

        let ids = self.entities.sorted_ids();
        ids.len().hash(&mut hasher);
        for id in ids {
            if let Some(entity) = self.entities.get(id) {
                id.hash(&mut hasher);
                entity.side.hash(&mut hasher);
                entity.position.hash(&mut hasher);
                entity.health.hash(&mut hasher);
                entity.active.hash(&mut hasher);
                entity.facing_left.hash(&mut hasher);
                entity.motion.hash(&mut hasher);
                entity.timers.hash(&mut hasher);
                entity.body.hash(&mut hasher);
            }
        }

        hasher.finish()
    }

    /// Distance at which a spearman may strike, plus an optional slack.
    pub(crate) fn attack_reach(&self, with_buffer: bool) -> Fixed {
        let spear = &self.config.spearman;
        let reach = if with_buffer {
            spear.attack_range + spear.range_buffer
        } else {
            spear.attack_range
        };
        Fixed::from_num(reach)
    }
}
