//! Simulation module
//!
//! All gameplay logic lives here, with no rendering or platform dependencies:
//! - Frame-driven ticks (no fixed timestep)
//! - Wall-clock cooldowns, tick-counted spawn timers
//! - Mark-then-compact entity removal

pub mod collision;
pub mod entity;
pub mod spawner;
pub mod state;
pub mod tick;

pub use collision::{circles_overlap, clamp_circle_to_bounds, entities_collide};
pub use entity::{BulletOwner, ColorTag, Entity, EntityKind};
pub use spawner::{Spawner, run_spawner, spawn_enemy};
pub use state::{GameEvent, GamePhase, GameState, PlayerStats};
pub use tick::{Aim, TickInput, tick};
