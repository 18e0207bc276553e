//! Wood stockpiles.
//!
//! Each combatant side keeps one stockpile. Wood comes from chopping trees
//! and is spent on barracks construction (paid at commit, refunded if the
//! site is abandoned) and spearman training.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::components::Side;
use crate::events::SimEvent;
use crate::simulation::Simulation;

/// A side's wood.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Stockpile {
    /// Current wood.
    pub wood: u32,
}

impl Stockpile {
    /// Create a stockpile.
    #[must_use]
    pub const fn new(wood: u32) -> Self {
        Self { wood }
    }

    /// Check if the side can afford a cost.
    #[must_use]
    pub const fn can_afford(&self, cost: u32) -> bool {
        self.wood >= cost
    }

    /// Spend wood if available.
    ///
    /// Returns true if the transaction succeeded.
    pub fn spend(&mut self, cost: u32) -> bool {
        if self.can_afford(cost) {
            self.wood -= cost;
            true
        } else {
            false
        }
    }

    /// Add wood.
    pub fn deposit(&mut self, amount: u32) {
        self.wood = self.wood.saturating_add(amount);
    }
}

/// Stockpiles of both combatant sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Economy {
    player: Stockpile,
    ai: Stockpile,
}

impl Economy {
    /// Both sides start with `wood`.
    #[must_use]
    pub const fn new(wood: u32) -> Self {
        Self {
            player: Stockpile::new(wood),
            ai: Stockpile::new(wood),
        }
    }

    /// Stockpile of a side; neutral has none.
    #[must_use]
    pub const fn get(&self, side: Side) -> Option<&Stockpile> {
        match side {
            Side::Player => Some(&self.player),
            Side::Ai => Some(&self.ai),
            Side::Neutral => None,
        }
    }

    /// Mutable stockpile of a side.
    pub fn get_mut(&mut self, side: Side) -> Option<&mut Stockpile> {
        match side {
            Side::Player => Some(&mut self.player),
            Side::Ai => Some(&mut self.ai),
            Side::Neutral => None,
        }
    }
}

impl Simulation {
    /// Current wood of a side.
    #[must_use]
    pub fn wood(&self, side: Side) -> u32 {
        self.economy.get(side).map_or(0, |s| s.wood)
    }

    /// Overwrite a side's wood, e.g. for scripted scenarios.
    pub fn set_wood(&mut self, side: Side, wood: u32) {
        if let Some(stockpile) = self.economy.get_mut(side) {
            stockpile.wood = wood;
            self.emit(SimEvent::WoodChanged { side, wood });
            self.check_end_condition();
        }
    }

    /// Spend wood; `false` leaves the stockpile untouched.
    pub(crate) fn spend_wood(&mut self, side: Side, cost: u32) -> bool {
        let Some(stockpile) = self.economy.get_mut(side) else {
            return false;
        };
        if !stockpile.spend(cost) {
            return false;
        }
        let wood = stockpile.wood;
        debug!(%side, cost, wood, "Wood spent");
        self.emit(SimEvent::WoodChanged { side, wood });
        true
    }

    /// Add wood and re-check the end condition.
    pub(crate) fn deposit_wood(&mut self, side: Side, amount: u32) {
        if amount == 0 {
            return;
        }
        let Some(stockpile) = self.economy.get_mut(side) else {
            return;
        };
        stockpile.deposit(amount);
        let wood = stockpile.wood;
        debug!(%side, amount, wood, "Wood deposited");
        self.emit(SimEvent::WoodChanged { side, wood });
        self.check_end_condition();
    }
}
