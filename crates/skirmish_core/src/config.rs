//! Match configuration.
//!
//! Every tunable number of a skirmish lives here: world and fog grid size,
//! unit stats, costs, timer intervals and radii. Values are whole world
//! units and milliseconds; they are converted to [`Fixed`] at the point of
//! use. Configs are stored as RON, the same format the headless runner uses
//! for scenario files.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::components::EntityKind;
use crate::error::{GameError, Result};
use crate::math::Fixed;

/// Largest accepted world dimension, distance or speed. Squared distances
/// across a world this size still fit in [`Fixed`].
pub const MAX_WORLD_EXTENT: u32 = 10_000;

/// Largest accepted health value.
pub const MAX_HEALTH: u32 = 1_000_000;

/// World dimensions and fog grid resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// World width in world units.
    pub width: u32,
    /// World height in world units.
    pub height: u32,
    /// Edge length of one square fog cell.
    pub fog_cell_size: u32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            fog_cell_size: 40,
        }
    }
}

/// Wood costs and thresholds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EconomyConfig {
    /// Wood each side starts with.
    pub starting_wood: u32,
    /// Stockpile that wins the match outright.
    pub win_wood: u32,
    /// Cost of a barracks, paid when construction is committed.
    pub barracks_wood_cost: u32,
    /// Cost of training one spearman.
    pub spearman_wood_cost: u32,
}

impl Default for EconomyConfig {
    fn default() -> Self {
        Self {
            starting_wood: 0,
            win_wood: 100,
            barracks_wood_cost: 40,
            spearman_wood_cost: 20,
        }
    }
}

/// Worker stats.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Maximum health.
    pub health: u32,
    /// Travel speed in world units per second.
    pub speed: u32,
    /// Milliseconds between chop ticks.
    pub chop_interval_ms: u64,
    /// Milliseconds between construction ticks.
    pub build_interval_ms: u64,
    /// Distance kept from a tree while chopping.
    pub tree_approach: u32,
    /// Distance kept from a barracks while building it.
    pub build_approach: u32,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            health: 30,
            speed: 100,
            chop_interval_ms: 1000,
            build_interval_ms: 1000,
            tree_approach: 30,
            build_approach: 40,
        }
    }
}

/// Spearman stats and behaviour radii.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpearmanConfig {
    /// Maximum health.
    pub health: u32,
    /// Travel speed in world units per second.
    pub speed: u32,
    /// Damage per attack tick.
    pub damage: u32,
    /// Weapon reach.
    pub attack_range: u32,
    /// Slack beyond `attack_range` before an ongoing attack is dropped.
    pub range_buffer: u32,
    /// How far short of weapon reach a chasing spearman stops.
    pub approach_slack: u32,
    /// Milliseconds between attack ticks.
    pub attack_interval_ms: u64,
    /// Radius around the spearman a `Defend` goal reacts to.
    pub defense_radius: u32,
    /// Distance from the defended building a returning spearman stops at.
    pub defense_standoff: u32,
    /// Hard population cap per side.
    pub limit: u32,
    /// Training time at the barracks.
    pub train_ms: u64,
}

impl Default for SpearmanConfig {
    fn default() -> Self {
        Self {
            health: 40,
            speed: 80,
            damage: 2,
            attack_range: 40,
            range_buffer: 5,
            approach_slack: 10,
            attack_interval_ms: 1000,
            defense_radius: 150,
            defense_standoff: 30,
            limit: 5,
            train_ms: 5000,
        }
    }
}

/// Building and tree stats.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StructureConfig {
    /// Town centre maximum health.
    pub town_center_health: u32,
    /// Barracks maximum health once built.
    pub barracks_health: u32,
    /// Horizontal distance from the town centre to a new barracks.
    pub barracks_offset: u32,
    /// Horizontal distance from the barracks to a freshly trained spearman.
    pub spawn_offset: u32,
    /// Number of trees planted on a standard map.
    pub tree_count: u32,
    /// Tree health, which is also the wood it yields.
    pub tree_health: u32,
    /// Trees are kept this far from the map edge and the town centres.
    pub tree_margin: u32,
}

impl Default for StructureConfig {
    fn default() -> Self {
        Self {
            town_center_health: 200,
            barracks_health: 100,
            barracks_offset: 80,
            spawn_offset: 40,
            tree_count: 20,
            tree_health: 10,
            tree_margin: 60,
        }
    }
}

/// Width and height of an entity's sprite box, anchored bottom-centre.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Footprint {
    /// Box width.
    pub width: u32,
    /// Box height.
    pub height: u32,
}

impl Footprint {
    /// Create a footprint.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Footprints per entity kind; these are the areas an entity reveals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FootprintConfig {
    /// Worker sprite box.
    pub worker: Footprint,
    /// Spearman sprite box.
    pub spearman: Footprint,
    /// Tree sprite box.
    pub tree: Footprint,
    /// Town centre sprite box.
    pub town_center: Footprint,
    /// Barracks sprite box.
    pub barracks: Footprint,
}

impl Default for FootprintConfig {
    fn default() -> Self {
        Self {
            worker: Footprint::new(32, 64),
            spearman: Footprint::new(64, 64),
            tree: Footprint::new(64, 64),
            town_center: Footprint::new(96, 96),
            barracks: Footprint::new(96, 96),
        }
    }
}

impl FootprintConfig {
    /// Footprint for an entity kind.
    #[must_use]
    pub const fn for_kind(&self, kind: EntityKind) -> Footprint {
        match kind {
            EntityKind::Worker => self.worker,
            EntityKind::Spearman => self.spearman,
            EntityKind::Tree => self.tree,
            EntityKind::TownCenter => self.town_center,
            EntityKind::Barracks => self.barracks,
        }
    }
}

/// Complete configuration for one skirmish.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Seed for the match RNG.
    pub seed: u64,
    /// World and fog grid.
    pub world: WorldConfig,
    /// Costs and thresholds.
    pub economy: EconomyConfig,
    /// Worker stats.
    pub worker: WorkerConfig,
    /// Spearman stats.
    pub spearman: SpearmanConfig,
    /// Buildings and trees.
    pub structures: StructureConfig,
    /// Sprite boxes.
    pub footprints: FootprintConfig,
    /// Two units closer than this overlap.
    pub collision_radius: u32,
    /// Search radius when displacing a unit off an occupied spot.
    pub free_position_radius: u32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            world: WorldConfig::default(),
            economy: EconomyConfig::default(),
            worker: WorkerConfig::default(),
            spearman: SpearmanConfig::default(),
            structures: StructureConfig::default(),
            footprints: FootprintConfig::default(),
            collision_radius: 20,
            free_position_radius: 50,
        }
    }
}

impl GameConfig {
    /// Default config with a different seed.
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            ..Self::default()
        }
    }

    /// Load a config from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| GameError::ConfigIo {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_ron_str(&contents)
    }

    /// Parse and validate a config from a RON string.
    pub fn from_ron_str(ron: &str) -> Result<Self> {
        let config: GameConfig = ron::from_str(ron)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to pretty RON.
    pub fn to_ron_string(&self) -> Result<String> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| GameError::InvalidState(format!("Failed to serialize config: {e}")))
    }

    /// Reject values the simulation cannot run with.
    pub fn validate(&self) -> Result<()> {
        let checks = [
            (self.world.width == 0, "world.width must be positive"),
            (self.world.height == 0, "world.height must be positive"),
            (self.world.fog_cell_size == 0, "world.fog_cell_size must be positive"),
            (self.worker.speed == 0, "worker.speed must be positive"),
            (self.spearman.speed == 0, "spearman.speed must be positive"),
            (self.worker.chop_interval_ms == 0, "worker.chop_interval_ms must be positive"),
            (self.worker.build_interval_ms == 0, "worker.build_interval_ms must be positive"),
            (self.spearman.attack_interval_ms == 0, "spearman.attack_interval_ms must be positive"),
            (self.spearman.train_ms == 0, "spearman.train_ms must be positive"),
            (self.structures.barracks_health == 0, "structures.barracks_health must be positive"),
            (
                self.free_position_radius < self.collision_radius,
                "free_position_radius must be at least collision_radius",
            ),
        ];

        if let Some((_, message)) = checks.iter().find(|(failed, _)| *failed) {
            return Err(GameError::InvalidConfig((*message).to_string()));
        }

        let lengths = [
            ("world.width", self.world.width),
            ("world.height", self.world.height),
            ("world.fog_cell_size", self.world.fog_cell_size),
            ("worker.speed", self.worker.speed),
            ("worker.tree_approach", self.worker.tree_approach),
            ("worker.build_approach", self.worker.build_approach),
            ("spearman.speed", self.spearman.speed),
            ("spearman.attack_range", self.spearman.attack_range),
            ("spearman.range_buffer", self.spearman.range_buffer),
            ("spearman.approach_slack", self.spearman.approach_slack),
            ("spearman.defense_radius", self.spearman.defense_radius),
            ("spearman.defense_standoff", self.spearman.defense_standoff),
            ("structures.barracks_offset", self.structures.barracks_offset),
            ("structures.spawn_offset", self.structures.spawn_offset),
            ("structures.tree_margin", self.structures.tree_margin),
            ("collision_radius", self.collision_radius),
            ("free_position_radius", self.free_position_radius),
            ("footprints.worker", self.footprints.worker.width.max(self.footprints.worker.height)),
            ("footprints.spearman", self.footprints.spearman.width.max(self.footprints.spearman.height)),
            ("footprints.tree", self.footprints.tree.width.max(self.footprints.tree.height)),
            (
                "footprints.town_center",
                self.footprints.town_center.width.max(self.footprints.town_center.height),
            ),
            ("footprints.barracks", self.footprints.barracks.width.max(self.footprints.barracks.height)),
        ];
        if let Some((name, _)) = lengths.iter().find(|(_, value)| *value > MAX_WORLD_EXTENT) {
            return Err(GameError::InvalidConfig(format!(
                "{name} must not exceed {MAX_WORLD_EXTENT}"
            )));
        }

        let healths = [
            ("worker.health", self.worker.health),
            ("spearman.health", self.spearman.health),
            ("structures.town_center_health", self.structures.town_center_health),
            ("structures.barracks_health", self.structures.barracks_health),
            ("structures.tree_health", self.structures.tree_health),
        ];
        if let Some((name, _)) = healths.iter().find(|(_, value)| *value > MAX_HEALTH) {
            return Err(GameError::InvalidConfig(format!("{name} must not exceed {MAX_HEALTH}")));
        }
        Ok(())
    }

    /// World width as fixed-point.
    #[must_use]
    pub fn world_width(&self) -> Fixed {
        Fixed::from_num(self.world.width)
    }

    /// World height as fixed-point.
    #[must_use]
    pub fn world_height(&self) -> Fixed {
        Fixed::from_num(self.world.height)
    }

    /// Travel speed for a unit kind, `None` for immobile kinds.
    #[must_use]
    pub fn speed_of(&self, kind: EntityKind) -> Option<u32> {
        match kind {
            EntityKind::Worker => Some(self.worker.speed),
            EntityKind::Spearman => Some(self.spearman.speed),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(GameConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_ron_fills_defaults() {
        let config = GameConfig::from_ron_str("(seed: 7, spearman: (limit: 3))").unwrap();
        assert_eq!(config.seed, 7);
        assert_eq!(config.spearman.limit, 3);
        assert_eq!(config.spearman.attack_range, 40);
        assert_eq!(config.world.fog_cell_size, 40);
    }

    #[test]
    fn test_ron_roundtrip() {
        let config = GameConfig::with_seed(99);
        let text = config.to_ron_string().unwrap();
        let parsed = GameConfig::from_ron_str(&text).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_zero_cell_size_rejected() {
        let err = GameConfig::from_ron_str("(world: (fog_cell_size: 0))").unwrap_err();
        assert!(matches!(err, GameError::InvalidConfig(_)));
    }

    #[test]
    fn test_oversized_world_rejected() {
        let err = GameConfig::from_ron_str("(world: (width: 4000000))").unwrap_err();
        assert!(matches!(err, GameError::InvalidConfig(msg) if msg.contains("world.width")));
    }

    #[test]
    fn test_oversized_offsets_and_health_rejected() {
        let mut config = GameConfig::default();
        config.structures.spawn_offset = MAX_WORLD_EXTENT + 1;
        assert!(config.validate().is_err());

        let mut config = GameConfig::default();
        config.structures.tree_health = u32::MAX;
        let err = config.validate().unwrap_err();
        assert!(matches!(err, GameError::InvalidConfig(msg) if msg.contains("tree_health")));

        let mut config = GameConfig::default();
        config.world.width = MAX_WORLD_EXTENT;
        config.worker.health = MAX_HEALTH;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_malformed_ron_is_parse_error() {
        let err = GameConfig::from_ron_str("(seed: )").unwrap_err();
        assert!(matches!(err, GameError::ConfigParse(_)));
    }
}
