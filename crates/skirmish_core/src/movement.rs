//! Travel-then-act movement.
//!
//! A [`MoveOrder`] sends a unit in a straight line to a destination and
//! says what the unit should do on arrival ([`Arrival`]) and what it falls
//! back to if the trip is cut short. Travel time follows from distance and
//! the unit kind's speed; the position is interpolated every tick.
//!
//! Only one motion can be in flight per unit: issuing a new order first
//! interrupts the old one.

use tracing::debug;

use crate::components::{EntityBody, EntityId, EntityKind, SpearmanState, WorkerActivity};
use crate::entities::Entity;
use crate::events::{Animation, SimEvent};
use crate::math::{Fixed, Vec2Fixed};
use crate::simulation::Simulation;
use crate::spatial;

/// Why a unit is travelling. Determines its moving state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Travel {
    /// Worker heading to a tree.
    ToChop,
    /// Worker heading to a construction site.
    ToBuild,
    /// Heading into unrevealed territory.
    ToExplore,
    /// Player move order.
    ToIdle,
    /// Spearman closing in on a target.
    ToAttack,
    /// Spearman returning near a friendly building.
    ToDefendPos,
}

impl Travel {
    /// Arrival action normally paired with this travel.
    #[must_use]
    pub const fn default_arrival(self) -> Arrival {
        match self {
            Travel::ToChop => Arrival::Chop,
            Travel::ToBuild => Arrival::Build,
            Travel::ToAttack => Arrival::Attack,
            Travel::ToExplore | Travel::ToIdle | Travel::ToDefendPos => Arrival::Idle,
        }
    }

    /// Worker activity while travelling, `None` if workers never travel so.
    #[must_use]
    pub const fn worker_activity(self) -> Option<WorkerActivity> {
        match self {
            Travel::ToChop => Some(WorkerActivity::MovingToChop),
            Travel::ToBuild => Some(WorkerActivity::MovingToBuild),
            Travel::ToExplore => Some(WorkerActivity::MovingToExplore),
            Travel::ToIdle => Some(WorkerActivity::MovingToIdle),
            Travel::ToAttack | Travel::ToDefendPos => None,
        }
    }

    /// Spearman state while travelling, `None` if spearmen never travel so.
    #[must_use]
    pub const fn spearman_state(self) -> Option<SpearmanState> {
        match self {
            Travel::ToAttack => Some(SpearmanState::MovingToAttack),
            Travel::ToDefendPos => Some(SpearmanState::MovingToDefendPos),
            Travel::ToExplore => Some(SpearmanState::MovingToExplore),
            Travel::ToIdle => Some(SpearmanState::MovingToIdle),
            Travel::ToChop | Travel::ToBuild => None,
        }
    }
}

/// What a unit does when a trip ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arrival {
    /// Become idle and re-evaluate next tick.
    Idle,
    /// Start chopping the order's target tree.
    Chop,
    /// Start building the order's target barracks.
    Build,
    /// Start attacking the order's target.
    Attack,
}

/// A travel request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MoveOrder {
    /// Where to go; clamped to the world when issued.
    pub destination: Vec2Fixed,
    /// Why.
    pub travel: Travel,
    /// Entity the trip is about (tree, barracks, enemy).
    pub target: Option<EntityId>,
    /// Follow-up on natural completion.
    pub on_arrive: Arrival,
    /// Follow-up when cut short.
    pub on_interrupt: Arrival,
}

impl MoveOrder {
    /// Order with the usual arrival for `travel` and Idle on interrupt.
    #[must_use]
    pub const fn new(destination: Vec2Fixed, travel: Travel, target: Option<EntityId>) -> Self {
        Self {
            destination,
            travel,
            target,
            on_arrive: travel.default_arrival(),
            on_interrupt: Arrival::Idle,
        }
    }
}

/// A trip in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Motion {
    /// Position when the trip began.
    pub start: Vec2Fixed,
    /// The order being executed.
    pub order: MoveOrder,
    /// Simulation time the trip began.
    pub started_at_ms: u64,
    /// Trip length; never zero.
    pub duration_ms: u64,
}

impl Motion {
    /// Simulation time of arrival.
    #[must_use]
    pub const fn arrives_at_ms(&self) -> u64 {
        self.started_at_ms + self.duration_ms
    }

    /// Interpolated position at `now_ms`.
    #[must_use]
    pub fn position_at(&self, now_ms: u64) -> Vec2Fixed {
        let elapsed = now_ms.saturating_sub(self.started_at_ms).min(self.duration_ms);
        let t = Fixed::from_num(elapsed) / Fixed::from_num(self.duration_ms.max(1));
        self.start.lerp(self.order.destination, t)
    }
}

/// Travel time for `distance` at `speed` world units per second.
///
/// Rounded to the nearest millisecond; anything at or below one unit of
/// distance still takes 1 ms.
#[must_use]
pub fn travel_duration_ms(distance: Fixed, speed: u32) -> u64 {
    if distance <= Fixed::ONE {
        return 1;
    }
    let ms = distance.saturating_mul(Fixed::from_num(1000)) / Fixed::from_num(speed.max(1));
    ms.round().to_num::<u64>().max(1)
}

fn is_still_travelling(entity: &Entity, travel: Travel) -> bool {
    match &entity.body {
        EntityBody::Worker(w) => travel.worker_activity() == Some(w.activity),
        EntityBody::Spearman(s) => travel.spearman_state() == Some(s.state),
        _ => false,
    }
}

impl Simulation {
    /// Send a unit on a trip. Any trip already in flight is interrupted
    /// and any timed action stopped first. Returns `false` when the unit is
    /// gone or cannot make this kind of trip.
    pub fn move_unit(&mut self, unit: EntityId, order: MoveOrder) -> bool {
        self.halt(unit);
        if self.is_over() {
            return false;
        }

        let now = self.time_ms;
        let (width, height) = (self.config.world_width(), self.config.world_height());
        let Some(entity) = self.entities.get_active(unit) else {
            return false;
        };
        let Some(speed) = self.config.speed_of(entity.kind()) else {
            return false;
        };
        let compatible = match &entity.body {
            EntityBody::Worker(_) => order.travel.worker_activity().is_some(),
            EntityBody::Spearman(_) => order.travel.spearman_state().is_some(),
            _ => false,
        };
        if !compatible {
            return false;
        }

        let start = entity.position;
        let destination = order.destination.clamp_to(width, height);
        let duration_ms = travel_duration_ms(start.distance(destination), speed);
        let order = MoveOrder {
            destination,
            ..order
        };

        if let Some(entity) = self.entities.get_mut(unit) {
            entity.motion = Some(Motion {
                start,
                order,
                started_at_ms: now,
                duration_ms,
            });
        }

        if let Some(activity) = order.travel.worker_activity() {
            self.set_worker_activity(unit, activity);
            if let Some(worker) = self.entities.get_mut(unit).and_then(|e| e.worker_mut()) {
                worker.building_target = match order.travel {
                    Travel::ToBuild => order.target,
                    _ => None,
                };
            }
        }
        if let Some(state) = order.travel.spearman_state() {
            self.set_spearman_state(unit, state);
            if let Some(spearman) = self.entities.get_mut(unit).and_then(|e| e.spearman_mut()) {
                spearman.attack_target = match order.travel {
                    Travel::ToAttack => order.target,
                    _ => None,
                };
            }
        }

        self.face_toward(unit, destination);
        self.emit(SimEvent::Animation {
            entity: unit,
            animation: Animation::Walk,
        });
        debug!(
            unit,
            travel = ?order.travel,
            target = ?order.target,
            duration_ms,
            "Move issued"
        );
        true
    }

    /// Cut a trip short. The unit stops where it is and, if nothing else
    /// has changed its state since the trip began, takes the order's
    /// interrupt action. Interrupting a trip to a construction site
    /// abandons the site. Calling this on a unit that is not travelling is
    /// a no-op.
    pub fn interrupt(&mut self, unit: EntityId) {
        let now = self.time_ms;
        let Some(entity) = self.entities.get_mut(unit) else {
            return;
        };
        let Some(motion) = entity.motion.take() else {
            return;
        };
        entity.position = motion.position_at(now);
        if !is_still_travelling(entity, motion.order.travel) {
            return;
        }

        debug!(unit, travel = ?motion.order.travel, "Move interrupted");
        if motion.order.travel == Travel::ToBuild {
            if let Some(barracks) = motion.order.target {
                self.abandon_construction(barracks);
            }
        }
        self.settle(unit, motion.order.on_interrupt, motion.order.target);
    }

    /// Drop a trip without running any follow-up.
    pub(crate) fn cancel_motion(&mut self, unit: EntityId) {
        let now = self.time_ms;
        if let Some(entity) = self.entities.get_mut(unit) {
            if let Some(motion) = entity.motion.take() {
                entity.position = motion.position_at(now);
            }
        }
    }

    /// Interpolate every trip to the current time and complete the ones
    /// that are due, in entity-id order.
    pub(crate) fn advance_motions(&mut self) {
        let now = self.time_ms;
        let mut arrivals = Vec::new();

        for id in self.entities.sorted_ids() {
            let Some(entity) = self.entities.get_mut(id) else {
                continue;
            };
            if !entity.active {
                continue;
            }
            let Some(motion) = entity.motion else {
                continue;
            };
            if now >= motion.arrives_at_ms() {
                arrivals.push(id);
            } else {
                entity.position = motion.position_at(now);
            }
        }

        for id in arrivals {
            self.arrive(id);
        }
    }

    fn arrive(&mut self, unit: EntityId) {
        let Some(entity) = self.entities.get_mut(unit) else {
            return;
        };
        if !entity.active {
            return;
        }
        let Some(motion) = entity.motion.take() else {
            return;
        };

        let mut destination = motion.order.destination;
        let radius = Fixed::from_num(self.config.collision_radius);
        if spatial::is_occupied(&self.entities, destination, radius, Some(unit)) {
            destination = spatial::find_nearby_free_position(
                &self.entities,
                destination,
                self.config.collision_radius,
                self.config.free_position_radius,
                Some(unit),
                &mut self.rng,
            )
            .clamp_to(self.config.world_width(), self.config.world_height());
        }
        if let Some(entity) = self.entities.get_mut(unit) {
            entity.position = destination;
        }

        debug!(unit, travel = ?motion.order.travel, "Arrived");
        self.settle(unit, motion.order.on_arrive, motion.order.target);
    }

    /// Run the follow-up action of a finished or interrupted trip. Any
    /// follow-up whose target is gone or out of reach falls back to Idle.
    pub(crate) fn settle(&mut self, unit: EntityId, action: Arrival, target: Option<EntityId>) {
        let started = match (action, target) {
            (Arrival::Chop, Some(tree)) => self.start_chopping(unit, tree),
            (Arrival::Build, Some(barracks)) => {
                let started = self.start_building(unit, barracks);
                if !started {
                    self.abandon_construction(barracks);
                }
                started
            }
            (Arrival::Attack, Some(enemy)) => {
                self.in_attack_range(unit, enemy, false) && self.start_attacking(unit, enemy)
            }
            _ => false,
        };
        if !started {
            self.set_idle(unit);
        }
    }

    /// Put a unit in its idle state with no targets.
    pub(crate) fn set_idle(&mut self, unit: EntityId) {
        let kind = self.entities.get(unit).map(|e| e.kind());
        match kind {
            Some(EntityKind::Worker) => {
                if let Some(worker) = self.entities.get_mut(unit).and_then(|e| e.worker_mut()) {
                    worker.cutting_target = None;
                    worker.building_target = None;
                }
                self.set_worker_activity(unit, WorkerActivity::Idle);
            }
            Some(EntityKind::Spearman) => {
                if let Some(spearman) = self.entities.get_mut(unit).and_then(|e| e.spearman_mut()) {
                    spearman.attack_target = None;
                }
                self.set_spearman_state(unit, SpearmanState::Idle);
            }
            _ => {}
        }
    }

    /// Mirror a unit's sprite to face `point`. A point straight above or
    /// below keeps the current facing.
    pub(crate) fn face_toward(&mut self, unit: EntityId, point: Vec2Fixed) {
        let Some(entity) = self.entities.get_mut(unit) else {
            return;
        };
        let dx = point.x - entity.position.x;
        let facing_left = if dx < Fixed::ZERO {
            true
        } else if dx > Fixed::ZERO {
            false
        } else {
            return;
        };
        if entity.facing_left != facing_left {
            entity.facing_left = facing_left;
            self.emit(SimEvent::FacingChanged {
                entity: unit,
                facing_left,
            });
        }
    }

    /// Change a worker's activity, reporting the change.
    pub(crate) fn set_worker_activity(&mut self, unit: EntityId, activity: WorkerActivity) {
        let Some(worker) = self.entities.get_mut(unit).and_then(|e| e.worker_mut()) else {
            return;
        };
        if worker.activity == activity {
            return;
        }
        worker.activity = activity;
        self.emit(SimEvent::WorkerActivityChanged {
            worker: unit,
            activity,
        });
        if activity == WorkerActivity::Idle {
            self.emit(SimEvent::Animation {
                entity: unit,
                animation: Animation::Idle,
            });
        }
    }

    /// Change a spearman's execution state, reporting the change.
    pub(crate) fn set_spearman_state(&mut self, unit: EntityId, state: SpearmanState) {
        let Some(spearman) = self.entities.get_mut(unit).and_then(|e| e.spearman_mut()) else {
            return;
        };
        if spearman.state == state {
            return;
        }
        spearman.state = state;
        self.emit(SimEvent::SpearmanStateChanged {
            spearman: unit,
            state,
        });
        if state == SpearmanState::Idle {
            self.emit(SimEvent::Animation {
                entity: unit,
                animation: Animation::Idle,
            });
        }
    }
}
