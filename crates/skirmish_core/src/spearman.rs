//! Spearman behaviour.
//!
//! A spearman carries two pieces of state: a long-lived [`SpearmanGoal`]
//! (what it wants) and a short-lived [`SpearmanState`] (what it is doing
//! right now). Each tick an idle spearman takes at most one step toward its
//! goal; switching goals counts as that step.

use rand::Rng;
use tracing::debug;

use crate::components::{EntityId, Side, SpearmanGoal, SpearmanState};
use crate::events::{Animation, SimEvent};
use crate::math::{Fixed, Vec2Fixed};
use crate::movement::{MoveOrder, Travel};
use crate::simulation::Simulation;
use crate::spatial;
use crate::timers::TimerKind;

impl Simulation {
    /// Run one decision for a spearman.
    pub(crate) fn decide_spearman(&mut self, id: EntityId) {
        let Some(entity) = self.entities.get_active(id) else {
            return;
        };
        let Some(&spearman) = entity.spearman() else {
            return;
        };
        let (side, has_motion) = (entity.side, entity.motion.is_some());

        if spearman.state.is_moving() && !has_motion {
            debug!(spearman = id, state = %spearman.state, "Spearman stuck, resetting to idle");
            self.set_idle(id);
            self.set_reason(id, "unstuck");
            return;
        }
        if side == Side::Player
            && (self.selection == Some(id) || spearman.state == SpearmanState::MovingToIdle)
        {
            return;
        }

        if spearman.state == SpearmanState::Attacking {
            let holding = spearman.attack_target.is_some_and(|t| {
                self.entities.is_active(t) && self.in_attack_range(id, t, true)
            }) && self
                .entities
                .get(id)
                .is_some_and(|e| e.timers.has(TimerKind::Attack));
            if !holding {
                self.stop_attacking(id);
                self.set_idle(id);
                self.set_reason(id, "target lost");
            }
            return;
        }
        if spearman.state.is_moving() {
            return;
        }

        match spearman.goal {
            SpearmanGoal::Attack => self.pursue_attack(id),
            SpearmanGoal::Defend => self.pursue_defend(id),
            SpearmanGoal::Scout => self.pursue_scout(id, side),
            SpearmanGoal::Idle => {
                let goal = self.random_goal();
                self.set_goal(id, goal);
                self.set_reason(id, "new orders");
            }
        }
    }

    fn pursue_attack(&mut self, id: EntityId) {
        match spatial::closest_visible_enemy(&self.entities, &self.visibility, id) {
            Some(enemy) => {
                self.set_reason(id, "engaging");
                self.engage(id, enemy);
            }
            None => {
                self.set_goal(id, SpearmanGoal::Scout);
                self.set_reason(id, "no targets");
            }
        }
    }

    fn pursue_defend(&mut self, id: EntityId) {
        let radius = Fixed::from_num(self.config.spearman.defense_radius);
        let threat = spatial::closest_visible_enemy(&self.entities, &self.visibility, id)
            .filter(|&enemy| self.distance_squared(id, enemy).is_some_and(|d| d <= radius * radius));
        if let Some(enemy) = threat {
            self.set_reason(id, "defending");
            self.engage(id, enemy);
            return;
        }

        let Some(building) = spatial::closest_friendly_building(&self.entities, id) else {
            self.set_goal(id, SpearmanGoal::Attack);
            self.set_reason(id, "nothing to defend");
            return;
        };
        let half = radius / Fixed::from_num(2);
        if self.distance_squared(id, building).is_some_and(|d| d > half * half) {
            let (Some(post), Some(me)) = (self.position_of(building), self.position_of(id)) else {
                return;
            };
            let standoff = Fixed::from_num(self.config.spearman.defense_standoff);
            self.set_reason(id, "returning to base");
            self.move_unit(
                id,
                MoveOrder::new(post.offset_toward(me, standoff), Travel::ToDefendPos, Some(building)),
            );
        } else {
            self.set_reason(id, "guarding");
        }
    }

    fn pursue_scout(&mut self, id: EntityId, side: Side) {
        if self.visibility.all_revealed(side) {
            let goal = self.random_goal();
            self.set_goal(id, goal);
            self.set_reason(id, "map explored");
        } else if self.explore(id) {
            self.set_reason(id, "scouting");
        } else {
            self.set_goal(id, SpearmanGoal::Attack);
        }
    }

    /// Fight `target`: strike now if it is within reach, otherwise walk to
    /// just inside weapon range and strike on arrival.
    pub fn engage(&mut self, spearman: EntityId, target: EntityId) -> bool {
        if self.is_over() || !self.entities.is_active(target) {
            return false;
        }
        if self.in_attack_range(spearman, target, false) {
            return self.start_attacking(spearman, target);
        }
        let (Some(goal), Some(me)) = (self.position_of(target), self.position_of(spearman)) else {
            return false;
        };
        let spear = &self.config.spearman;
        let approach = Fixed::from_num(spear.attack_range.saturating_sub(spear.approach_slack));
        self.move_unit(
            spearman,
            MoveOrder::new(goal.offset_toward(me, approach), Travel::ToAttack, Some(target)),
        )
    }

    /// Whether `target` is within weapon reach of `unit`, optionally with
    /// the slack allowed for an attack already under way.
    pub(crate) fn in_attack_range(&self, unit: EntityId, target: EntityId, with_buffer: bool) -> bool {
        let reach = self.attack_reach(with_buffer);
        self.entities.is_active(target)
            && self
                .distance_squared(unit, target)
                .is_some_and(|d| d <= reach * reach)
    }

    /// Begin striking `target` on the attack timer.
    pub(crate) fn start_attacking(&mut self, spearman: EntityId, target: EntityId) -> bool {
        if self.is_over() {
            return false;
        }
        let (Some(me), Some(foe)) = (self.entities.get_active(spearman), self.entities.get_active(target)) else {
            return false;
        };
        if me.spearman().is_none() || me.side.opponent() != Some(foe.side) {
            return false;
        }
        let foe_pos = foe.position;

        self.cancel_motion(spearman);
        if let Some(s) = self.entities.get_mut(spearman).and_then(|e| e.spearman_mut()) {
            s.attack_target = Some(target);
        }
        self.set_spearman_state(spearman, SpearmanState::Attacking);
        self.schedule_timer(spearman, TimerKind::Attack, self.config.spearman.attack_interval_ms, true);
        self.face_toward(spearman, foe_pos);
        self.emit(SimEvent::Animation {
            entity: spearman,
            animation: Animation::Attack,
        });
        debug!(spearman, target, "Attack started");
        true
    }

    pub(crate) fn fire_attack(&mut self, spearman: EntityId) {
        let Some(s) = self.entities.get_active(spearman).and_then(|e| e.spearman()) else {
            return;
        };
        if s.state != SpearmanState::Attacking {
            return;
        }
        let target = s
            .attack_target
            .filter(|&t| self.in_attack_range(spearman, t, true));
        let Some(target) = target else {
            debug!(spearman, "Target gone or out of reach");
            self.stop_attacking(spearman);
            self.set_idle(spearman);
            return;
        };
        if let Some(pos) = self.position_of(target) {
            self.face_toward(spearman, pos);
        }
        self.apply_damage(target, self.config.spearman.damage, Some(spearman));
    }

    /// Stop the attack timer. Safe to call on a spearman that is not
    /// attacking or has just died.
    pub(crate) fn stop_attacking(&mut self, spearman: EntityId) {
        let Some(entity) = self.entities.get_mut(spearman) else {
            return;
        };
        entity.timers.cancel(TimerKind::Attack);
        if let Some(s) = entity.spearman_mut() {
            if s.state == SpearmanState::Attacking {
                s.attack_target = None;
            }
        }
    }

    /// Change a spearman's goal, reporting the change.
    pub(crate) fn set_goal(&mut self, spearman: EntityId, goal: SpearmanGoal) {
        let Some(s) = self.entities.get_mut(spearman).and_then(|e| e.spearman_mut()) else {
            return;
        };
        if s.goal == goal {
            return;
        }
        s.goal = goal;
        self.emit(SimEvent::GoalChanged { spearman, goal });
        debug!(spearman, %goal, "Goal changed");
    }

    pub(crate) fn set_reason(&mut self, spearman: EntityId, reason: &'static str) {
        if let Some(s) = self.entities.get_mut(spearman).and_then(|e| e.spearman_mut()) {
            s.reason = reason;
        }
    }

    /// Attack or Defend with equal odds.
    pub(crate) fn random_goal(&mut self) -> SpearmanGoal {
        if self.rng.gen::<bool>() {
            SpearmanGoal::Attack
        } else {
            SpearmanGoal::Defend
        }
    }

    fn position_of(&self, id: EntityId) -> Option<Vec2Fixed> {
        self.entities.get(id).map(|e| e.position)
    }

    fn distance_squared(&self, a: EntityId, b: EntityId) -> Option<Fixed> {
        Some(self.position_of(a)?.distance_squared(self.position_of(b)?))
    }
}
