//! Damage, retaliation and the death cascade.
//!
//! Damage is flat: health saturates at zero and an entity dies the moment
//! it reaches it. Death is resolved immediately and completely within the
//! call that caused it, so by the time [`Simulation::apply_damage`] returns
//! nothing in the world still points at the dead entity.

use tracing::{debug, info};

use crate::components::{EntityBody, EntityId, SpearmanState};
use crate::events::SimEvent;
use crate::simulation::Simulation;

impl Simulation {
    /// Remove up to `amount` health from `target`.
    ///
    /// Inactive entities and entities with no health left (including a
    /// barracks site nobody has started raising) are ignored. Returns the
    /// damage actually dealt.
    pub fn apply_damage(&mut self, target: EntityId, amount: u32, attacker: Option<EntityId>) -> u32 {
        if self.is_over() {
            return 0;
        }
        let Some(entity) = self.entities.get_mut(target) else {
            return 0;
        };
        if !entity.is_damageable() {
            return 0;
        }
        let dealt = entity.health.apply_damage(amount);
        let remaining = entity.health.current;

        self.emit(SimEvent::Damaged {
            target,
            amount: dealt,
            attacker,
            remaining,
        });

        if remaining == 0 {
            self.kill(target);
        } else if let Some(attacker) = attacker {
            self.retaliate(target, attacker);
        }
        dealt
    }

    /// A spearman that was hit turns on its attacker unless it is following
    /// a player order, heading back to defend, or already on that attacker.
    fn retaliate(&mut self, victim: EntityId, attacker: EntityId) {
        let Some(me) = self.entities.get_active(victim) else {
            return;
        };
        let Some(spearman) = me.spearman() else {
            return;
        };
        let Some(foe) = self.entities.get_active(attacker) else {
            return;
        };
        if me.side.opponent() != Some(foe.side) {
            return;
        }
        if matches!(
            spearman.state,
            SpearmanState::MovingToIdle | SpearmanState::MovingToDefendPos
        ) {
            return;
        }
        let engaged = matches!(
            spearman.state,
            SpearmanState::Attacking | SpearmanState::MovingToAttack
        ) && spearman.attack_target == Some(attacker);
        if engaged {
            return;
        }

        debug!(victim, attacker, "Retaliating");
        self.halt(victim);
        self.set_reason(victim, "retaliating");
        self.engage(victim, attacker);
    }

    /// Resolve a death: deactivate, tear down what the entity was doing,
    /// release everything that referenced it and re-check the end
    /// condition.
    pub(crate) fn kill(&mut self, id: EntityId) {
        let now = self.time_ms;
        let Some(entity) = self.entities.get_mut(id) else {
            return;
        };
        if !entity.active {
            return;
        }
        entity.active = false;
        if let Some(motion) = entity.motion.take() {
            entity.position = motion.position_at(now);
        }
        let (kind, side, body) = (entity.kind(), entity.side, entity.body);

        self.emit(SimEvent::Died { entity: id, kind, side });
        info!(id, ?kind, %side, tick = self.tick, "Entity destroyed");

        match body {
            EntityBody::Worker(worker) => {
                self.stop_chopping(id);
                self.stop_building(id);
                if let Some(site) = worker.building_target {
                    self.abandon_construction(site);
                }
            }
            EntityBody::Spearman(_) => self.stop_attacking(id),
            EntityBody::Barracks(_) => self.cancel_training(id),
            EntityBody::TownCenter => self.victory.town_center_lost(side),
            EntityBody::Tree => self.victory.trees_felled += 1,
        }
        if let Some(entity) = self.entities.get_mut(id) {
            entity.timers.clear();
        }

        self.release_references(id);

        if self.selection == Some(id) {
            self.selection = None;
            self.emit(SimEvent::SelectionChanged { selected: None });
        }

        self.check_end_condition();
    }

    /// Reset every unit that was attacking, chopping, building or
    /// travelling to `dead`.
    pub(crate) fn release_references(&mut self, dead: EntityId) {
        for id in self.entities.sorted_ids() {
            let Some(entity) = self.entities.get_active(id) else {
                continue;
            };
            let heading_to_dead = entity.motion.is_some_and(|m| m.order.target == Some(dead));
            let release = match &entity.body {
                EntityBody::Spearman(s) => heading_to_dead || s.attack_target == Some(dead),
                EntityBody::Worker(w) => {
                    heading_to_dead
                        || w.cutting_target == Some(dead)
                        || w.building_target == Some(dead)
                }
                _ => false,
            };
            if !release {
                continue;
            }
            debug!(unit = id, dead, "Target lost");
            self.cancel_motion(id);
            self.stop_chopping(id);
            self.stop_building(id);
            self.stop_attacking(id);
            self.set_idle(id);
        }
    }
}
