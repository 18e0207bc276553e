//! Error types for the skirmish simulation.
//!
//! The tick loop itself never fails: dangling targets and stale timers
//! degrade to Idle. Errors only surface from the player entry points and
//! from configuration loading.

use thiserror::Error;

use crate::components::EntityId;

/// Result type alias using [`GameError`].
pub type Result<T> = std::result::Result<T, GameError>;

/// Top-level error type for all game simulation errors.
#[derive(Debug, Error)]
pub enum GameError {
    /// Invalid entity reference.
    #[error("Entity not found: {0}")]
    EntityNotFound(EntityId),

    /// The entity exists but cannot be commanded by the player.
    #[error("Entity {0} is not a player-controlled unit")]
    NotPlayerControlled(EntityId),

    /// The command target is the wrong kind, side or no longer active.
    #[error("Invalid target {target} for unit {unit}")]
    InvalidTarget {
        /// Unit the command was issued to.
        unit: EntityId,
        /// Rejected target.
        target: EntityId,
    },

    /// Another worker already holds a claim on the tree.
    #[error("Tree {tree} is already claimed by worker {claimed_by}")]
    TargetClaimed {
        /// Tree that was requested.
        tree: EntityId,
        /// Worker currently holding the claim.
        claimed_by: EntityId,
    },

    /// Invalid game state.
    #[error("Invalid game state: {0}")]
    InvalidState(String),

    /// Failed to read a configuration file.
    #[error("Failed to read config file '{path}': {source}")]
    ConfigIo {
        /// Path that failed to load.
        path: String,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse a configuration document.
    #[error("Failed to parse config: {0}")]
    ConfigParse(#[from] ron::error::SpannedError),

    /// Configuration parsed but holds unusable values.
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
}
