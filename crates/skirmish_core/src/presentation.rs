//! Read-outs for the game layer's widgets.
//!
//! Pure queries over simulation state. Widgets poll these each frame; the
//! core never holds a reference to a widget.

use crate::components::{EntityId, EntityKind, Health};
use crate::simulation::Simulation;

/// Opacity of a barracks still being raised, in percent.
pub const CONSTRUCTION_OPACITY: u32 = 50;

/// Sprite tier for a tree: 0 while above two thirds of its health, 1 down
/// to one third, 2 below that.
#[must_use]
pub const fn tree_tier(health: Health) -> u8 {
    let scaled = health.current as u64 * 3;
    let max = health.max as u64;
    if scaled <= max {
        2
    } else if scaled <= max * 2 {
        1
    } else {
        0
    }
}

impl Simulation {
    /// Health-bar fill, 0-100.
    #[must_use]
    pub fn health_percent(&self, id: EntityId) -> Option<u32> {
        self.entities.get(id).map(|e| e.health.percentage())
    }

    /// Sprite tier of a tree, see [`tree_tier`].
    #[must_use]
    pub fn tree_tier_of(&self, id: EntityId) -> Option<u8> {
        self.entities
            .get(id)
            .filter(|e| e.kind() == EntityKind::Tree)
            .map(|e| tree_tier(e.health))
    }

    /// Barracks opacity in percent: faded while under construction.
    #[must_use]
    pub fn barracks_opacity(&self, id: EntityId) -> Option<u32> {
        let barracks = self.entities.get(id)?.barracks()?;
        Some(if barracks.under_construction {
            CONSTRUCTION_OPACITY
        } else {
            100
        })
    }

    /// Text over a spearman's head.
    #[must_use]
    pub fn thought_bubble(&self, id: EntityId) -> Option<String> {
        let spearman = self.entities.get_active(id)?.spearman()?;
        if self.selection == Some(id) {
            return Some("Selected".to_string());
        }
        Some(format!(
            "G:{} | S:{} ({})",
            spearman.goal, spearman.state, spearman.reason
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{Side, SpearmanGoal};
    use crate::config::GameConfig;
    use crate::math::Vec2Fixed;

    #[test]
    fn test_tree_tier_thresholds() {
        let tier = |current| tree_tier(Health { current, max: 9 });
        assert_eq!(tier(9), 0);
        assert_eq!(tier(7), 0);
        assert_eq!(tier(6), 1);
        assert_eq!(tier(4), 1);
        assert_eq!(tier(3), 2);
        assert_eq!(tier(0), 2);
    }

    #[test]
    fn test_barracks_opacity() {
        let mut sim = Simulation::empty(GameConfig::default());
        let site = sim.spawn_barracks(Side::Ai, Vec2Fixed::from_ints(600, 300), true);
        let built = sim.spawn_barracks(Side::Ai, Vec2Fixed::from_ints(600, 100), false);
        assert_eq!(sim.barracks_opacity(site), Some(50));
        assert_eq!(sim.barracks_opacity(built), Some(100));
        assert_eq!(sim.barracks_opacity(999), None);
    }

    #[test]
    fn test_thought_bubble_text() {
        let mut sim = Simulation::empty(GameConfig::default());
        let spear = sim.spawn_spearman(Side::Player, Vec2Fixed::from_ints(100, 300), SpearmanGoal::Defend);
        assert_eq!(sim.thought_bubble(spear).unwrap(), "G:Defend | S:Idle (ready)");
        sim.select_unit(spear).unwrap();
        assert_eq!(sim.thought_bubble(spear).unwrap(), "Selected");
    }

    #[test]
    fn test_health_percent() {
        let mut sim = Simulation::empty(GameConfig::default());
        let worker = sim.spawn_worker(Side::Player, Vec2Fixed::from_ints(100, 300));
        sim.apply_damage(worker, 15, None);
        assert_eq!(sim.health_percent(worker), Some(50));
    }
}
