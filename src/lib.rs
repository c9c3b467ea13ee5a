//! Void Scrapper - A single-screen arcade shooter
//!
//! Core modules:
//! - `sim`: Frame-driven simulation (movement, spawning, collisions, phases)
//! - `platform`: Input aggregation for keyboard, pointer and touch sticks
//! - `anomaly`: Narrative anomaly events and the async oracle contract
//! - `game`: Game-state controller gating the simulation
//! - `settings`: Player-facing configuration

pub mod anomaly;
pub mod game;
pub mod platform;
pub mod settings;
pub mod sim;

pub use anomaly::{AnomalyEffect, AnomalyEvent, AnomalyOption, AnomalyOracle, LocalOracle};
pub use game::{Game, GameError};
pub use settings::{QualityPreset, Settings};

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Player defaults
    pub const PLAYER_RADIUS: f32 = 15.0;
    pub const PLAYER_MAX_HEALTH: f32 = 100.0;
    /// Acceleration applied per tick along the desired direction
    pub const PLAYER_ACCEL: f32 = 0.5;
    /// Velocity damping per tick (drift feel)
    pub const PLAYER_FRICTION: f32 = 0.92;
    /// Minimum time between player shots (ms)
    pub const PLAYER_FIRE_COOLDOWN_MS: f64 = 150.0;
    /// Bullets leave from the ship's nose this far ahead of its center
    pub const PLAYER_NOSE_OFFSET: f32 = 30.0;

    /// Bullets
    pub const BULLET_SPEED: f32 = 10.0;
    pub const BULLET_RADIUS: f32 = 4.0;
    pub const BULLET_LIFE: u32 = 60;
    pub const ENEMY_BULLET_SPEED_FACTOR: f32 = 0.8;
    pub const ENEMY_BULLET_RADIUS: f32 = 5.0;
    pub const ENEMY_BULLET_LIFE: u32 = 80;

    /// Enemies
    pub const ENEMY_RADIUS: f32 = 15.0;
    pub const ENEMY_HEALTH: f32 = 20.0;
    pub const ENEMY_SPEED: f32 = 2.0;
    pub const ENEMY_VALUE: u32 = 10;
    pub const ENEMY_FIRE_COOLDOWN_MS: f64 = 1000.0;
    pub const ENEMY_SPAWN_INTERVAL: u32 = 60;
    /// Enemies appear this far outside the screen edge
    pub const ENEMY_SPAWN_OFFSET: f32 = 30.0;

    /// Damage values
    pub const ENEMY_CONTACT_DAMAGE: f32 = 10.0;
    pub const ENEMY_BULLET_DAMAGE: f32 = 5.0;
    pub const PLAYER_BULLET_DAMAGE: f32 = 10.0;

    /// Particle burst sizes
    pub const CONTACT_PARTICLES: usize = 5;
    pub const BULLET_HIT_PARTICLES: usize = 3;
    pub const EXPLOSION_PARTICLES: usize = 8;
    pub const HEAL_PARTICLES: usize = 10;

    /// Scrap drops
    pub const SCRAP_RADIUS: f32 = 5.0;
    pub const SCRAP_DROP_VALUE: u32 = 5;
    pub const SCRAP_MAGNET_RANGE: f32 = 150.0;
    pub const SCRAP_MAGNET_LERP: f32 = 0.1;
    pub const SCRAP_DRIFT_DAMPING: f32 = 0.95;

    /// Health pickups
    pub const HEALTH_PICKUP_RADIUS: f32 = 12.0;
    pub const HEALTH_PICKUP_VALUE: f32 = 20.0;
    pub const HEALTH_PICKUP_INTERVAL: u32 = 900;
    pub const HEALTH_PICKUP_CHANCE: f64 = 0.7;
    pub const HEALTH_PICKUP_PULSE: f32 = 2.0;

    /// Anomaly cores
    pub const ANOMALY_CORE_RADIUS: f32 = 20.0;
    pub const ANOMALY_CORE_PULSE: f32 = 5.0;
    pub const ANOMALY_SCORE_THRESHOLD: u64 = 500;

    /// Pickups and cores spawn at least this far from the screen edge
    pub const SPAWN_MARGIN: f32 = 50.0;
    /// Angular frequency of pickup pulsing (per ms)
    pub const PULSE_RATE: f64 = 0.005;

    /// Score needed per level
    pub const SCORE_PER_LEVEL: u64 = 1000;
}

/// Euclidean distance between two points
#[inline]
pub fn distance(a: Vec2, b: Vec2) -> f32 {
    (b - a).length()
}

/// Angle (radians) pointing from `from` toward `to`
#[inline]
pub fn angle_to(from: Vec2, to: Vec2) -> f32 {
    let d = to - from;
    d.y.atan2(d.x)
}

/// Unit vector in the direction of `v`, or zero when `v` has no usable length
#[inline]
pub fn unit_or_zero(v: Vec2) -> Vec2 {
    let len = v.length();
    if len <= 1e-6 { Vec2::ZERO } else { v / len }
}

/// Unit vector for an angle in radians
#[inline]
pub fn direction(angle: f32) -> Vec2 {
    Vec2::new(angle.cos(), angle.sin())
}
