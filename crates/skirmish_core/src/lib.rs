//! # Skirmish Core
//!
//! Deterministic simulation core for a two-sided woodland skirmish.
//!
//! This crate contains **only** deterministic logic:
//! - No rendering
//! - No IO beyond loading a config file
//! - No system randomness
//! - No floating-point math (uses fixed-point)
//!
//! A player side and an AI side each start with a town centre and a worker.
//! Workers chop trees for wood and raise a barracks; barracks train
//! spearmen; spearmen attack, defend and scout under their own fog of war.
//! The game layer drives [`simulation::Simulation::step`] every frame,
//! feeds it player [`input`] and renders the [`events`] it returns.
//!
//! ## Crate Structure
//!
//! - [`simulation`] - Match state and the tick driver
//! - [`components`] - Entity component definitions
//! - [`movement`] - Travel-then-act motion
//! - [`worker`], [`spearman`], [`production`] - Unit and building behaviour
//! - [`combat`] - Damage and the death cascade
//! - [`visibility`] - Per-side fog of war
//! - [`victory`] - End-of-match evaluation
//! - [`input`], [`presentation`] - Entry points for the game layer
//! - [`math`] - Fixed-point math utilities

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod combat;
pub mod components;
pub mod config;
pub mod economy;
pub mod entities;
pub mod error;
pub mod events;
pub mod input;
pub mod math;
pub mod movement;
pub mod presentation;
pub mod production;
pub mod simulation;
pub mod spatial;
pub mod spearman;
pub mod timers;
pub mod victory;
pub mod visibility;
pub mod worker;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::components::*;
    pub use crate::config::GameConfig;
    pub use crate::entities::{Entity, EntityStorage};
    pub use crate::error::{GameError, Result};
    pub use crate::events::{Animation, SimEvent, SoundCue, TickEvents};
    pub use crate::math::{Fixed, Vec2Fixed};
    pub use crate::movement::{Arrival, MoveOrder, Travel};
    pub use crate::simulation::{Simulation, TICK_DURATION_MS, TICK_RATE};
    pub use crate::victory::Outcome;
    pub use crate::visibility::{GridPos, VisibilityGrid, WorldRect};
}
