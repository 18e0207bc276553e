//! Entity component definitions.
//!
//! Components are plain data. Behaviour lives in the systems that drive
//! them ([`crate::worker`], [`crate::spearman`], [`crate::combat`], ...).

use std::fmt;

use serde::{Deserialize, Serialize};

/// Unique identifier for entities. Never reused within a match.
pub type EntityId = u64;

/// Owner of an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Side {
    /// The human player.
    Player,
    /// The scripted opponent.
    Ai,
    /// Nobody; trees.
    Neutral,
}

impl Side {
    /// Both combatant sides, in evaluation order.
    pub const COMBATANTS: [Side; 2] = [Side::Player, Side::Ai];

    /// The opposing combatant side, `None` for [`Side::Neutral`].
    #[must_use]
    pub const fn opponent(self) -> Option<Side> {
        match self {
            Side::Player => Some(Side::Ai),
            Side::Ai => Some(Side::Player),
            Side::Neutral => None,
        }
    }

    /// Whether this side fights.
    #[must_use]
    pub const fn is_combatant(self) -> bool {
        !matches!(self, Side::Neutral)
    }

    /// Horizontal direction this side's forces face at the start (+1 or -1).
    ///
    /// The player starts on the left edge, the AI on the right.
    #[must_use]
    pub const fn forward(self) -> i32 {
        match self {
            Side::Ai => -1,
            _ => 1,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Side::Player => "Player",
            Side::Ai => "AI",
            Side::Neutral => "Neutral",
        };
        f.write_str(name)
    }
}

/// Entity type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    /// Win-condition anchor building.
    TownCenter,
    /// Training building.
    Barracks,
    /// Gatherer and builder.
    Worker,
    /// Fighting unit.
    Spearman,
    /// Neutral wood source.
    Tree,
}

impl EntityKind {
    /// Workers and spearmen.
    #[must_use]
    pub const fn is_unit(self) -> bool {
        matches!(self, EntityKind::Worker | EntityKind::Spearman)
    }

    /// Town centres and barracks.
    #[must_use]
    pub const fn is_building(self) -> bool {
        matches!(self, EntityKind::TownCenter | EntityKind::Barracks)
    }
}

/// Health component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Health {
    /// Current health points.
    pub current: u32,
    /// Maximum health points.
    pub max: u32,
}

impl Health {
    /// Create new health component at full health.
    #[must_use]
    pub const fn new(max: u32) -> Self {
        Self { current: max, max }
    }

    /// Create a health component with no structure yet.
    #[must_use]
    pub const fn empty(max: u32) -> Self {
        Self { current: 0, max }
    }

    /// Check if health is exhausted.
    #[must_use]
    pub const fn is_dead(&self) -> bool {
        self.current == 0
    }

    /// Check if entity is at full health.
    #[must_use]
    pub const fn is_full(&self) -> bool {
        self.current >= self.max
    }

    /// Apply damage, returning actual damage dealt.
    /// Uses saturating subtraction to prevent underflow.
    pub fn apply_damage(&mut self, amount: u32) -> u32 {
        let actual = amount.min(self.current);
        self.current = self.current.saturating_sub(actual);
        actual
    }

    /// Heal the entity, returning actual amount healed.
    /// Never exceeds `max`.
    pub fn heal(&mut self, amount: u32) -> u32 {
        let headroom = self.max.saturating_sub(self.current);
        let actual = amount.min(headroom);
        self.current = self.current.saturating_add(actual);
        actual
    }

    /// Get health as a percentage (0-100).
    #[must_use]
    pub fn percentage(&self) -> u32 {
        if self.max == 0 {
            0
        } else {
            (self.current * 100) / self.max
        }
    }
}

/// What a worker is doing right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum WorkerActivity {
    /// Waiting for the next decision.
    #[default]
    Idle,
    /// Travelling to a tree.
    MovingToChop,
    /// Chopping a tree on a timer.
    Chopping,
    /// Travelling to a barracks under construction.
    MovingToBuild,
    /// Raising a barracks on a timer.
    Building,
    /// Travelling into unrevealed territory.
    MovingToExplore,
    /// Travelling on a player move order.
    MovingToIdle,
}

impl WorkerActivity {
    /// Travelling variants.
    #[must_use]
    pub const fn is_moving(self) -> bool {
        matches!(
            self,
            WorkerActivity::MovingToChop
                | WorkerActivity::MovingToBuild
                | WorkerActivity::MovingToExplore
                | WorkerActivity::MovingToIdle
        )
    }

    /// Moving, chopping or building.
    #[must_use]
    pub const fn is_busy(self) -> bool {
        !matches!(self, WorkerActivity::Idle)
    }
}

/// Worker payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Worker {
    /// Current activity.
    pub activity: WorkerActivity,
    /// Tree being chopped.
    pub cutting_target: Option<EntityId>,
    /// Barracks being built or travelled to.
    pub building_target: Option<EntityId>,
    /// Tree health when chopping began; wood payout is measured from here.
    pub initial_chop_health: u32,
}

/// Long-lived spearman intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpearmanGoal {
    /// Seek out and fight the closest visible enemy.
    Attack,
    /// Hold near friendly buildings, engaging what comes close.
    Defend,
    /// Uncover hidden territory.
    Scout,
    /// No intent; picked up again on the next decision.
    Idle,
}

/// Short-lived spearman execution mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SpearmanState {
    /// Waiting for the next decision.
    #[default]
    Idle,
    /// Travelling into weapon range of a target.
    MovingToAttack,
    /// Striking a target on a timer.
    Attacking,
    /// Returning near a friendly building.
    MovingToDefendPos,
    /// Travelling into unrevealed territory.
    MovingToExplore,
    /// Travelling on a player move order.
    MovingToIdle,
}

impl SpearmanState {
    /// Travelling variants.
    #[must_use]
    pub const fn is_moving(self) -> bool {
        matches!(
            self,
            SpearmanState::MovingToAttack
                | SpearmanState::MovingToDefendPos
                | SpearmanState::MovingToExplore
                | SpearmanState::MovingToIdle
        )
    }
}

macro_rules! display_as_debug {
    ($($ty:ty),*) => {
        $(impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Debug::fmt(self, f)
            }
        })*
    };
}

display_as_debug!(WorkerActivity, SpearmanGoal, SpearmanState);

/// Spearman payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Spearman {
    /// Persistent intent.
    pub goal: SpearmanGoal,
    /// Current execution mode.
    pub state: SpearmanState,
    /// Enemy being attacked or chased.
    pub attack_target: Option<EntityId>,
    /// Why the last decision was taken; shown in the thought bubble.
    pub reason: &'static str,
}

impl Spearman {
    /// A fresh spearman with the given goal.
    #[must_use]
    pub const fn new(goal: SpearmanGoal) -> Self {
        Self {
            goal,
            state: SpearmanState::Idle,
            attack_target: None,
            reason: "ready",
        }
    }
}

/// In-progress spearman training at a barracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Training {
    /// Simulation time training began.
    pub started_at_ms: u64,
    /// Total training time.
    pub duration_ms: u64,
}

/// Barracks payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Barracks {
    /// Still being raised by a worker.
    pub under_construction: bool,
    /// Spearman currently in training.
    pub training: Option<Training>,
}

/// Per-kind payload of an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityBody {
    /// Town centre; no extra state.
    TownCenter,
    /// Barracks.
    Barracks(Barracks),
    /// Worker.
    Worker(Worker),
    /// Spearman.
    Spearman(Spearman),
    /// Tree; no extra state.
    Tree,
}

impl EntityBody {
    /// Type tag for this payload.
    #[must_use]
    pub const fn kind(&self) -> EntityKind {
        match self {
            EntityBody::TownCenter => EntityKind::TownCenter,
            EntityBody::Barracks(_) => EntityKind::Barracks,
            EntityBody::Worker(_) => EntityKind::Worker,
            EntityBody::Spearman(_) => EntityKind::Spearman,
            EntityBody::Tree => EntityKind::Tree,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_damage_saturates() {
        let mut health = Health::new(10);
        assert_eq!(health.apply_damage(3), 3);
        assert_eq!(health.current, 7);
        assert_eq!(health.apply_damage(50), 7);
        assert!(health.is_dead());
    }

    #[test]
    fn test_health_heal_caps_at_max() {
        let mut health = Health::empty(100);
        assert_eq!(health.heal(1), 1);
        assert_eq!(health.heal(500), 99);
        assert!(health.is_full());
        assert_eq!(health.percentage(), 100);
    }

    #[test]
    fn test_side_opponents() {
        assert_eq!(Side::Player.opponent(), Some(Side::Ai));
        assert_eq!(Side::Ai.opponent(), Some(Side::Player));
        assert_eq!(Side::Neutral.opponent(), None);
        assert!(!Side::Neutral.is_combatant());
    }

    #[test]
    fn test_state_names_display() {
        assert_eq!(SpearmanState::MovingToDefendPos.to_string(), "MovingToDefendPos");
        assert_eq!(SpearmanGoal::Scout.to_string(), "Scout");
    }

    #[test]
    fn test_worker_activity_flags() {
        assert!(WorkerActivity::MovingToExplore.is_moving());
        assert!(!WorkerActivity::Chopping.is_moving());
        assert!(WorkerActivity::Chopping.is_busy());
        assert!(!WorkerActivity::Idle.is_busy());
    }
}
