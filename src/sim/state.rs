//! Game state and core simulation types
//!
//! `GameState` is the simulation context: it owns the player, the entity
//! collection, the spawner timers and the authoritative score.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::entity::{ColorTag, Entity, EntityKind};
use super::spawner::Spawner;
use crate::consts::*;

/// Current phase of the game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Boot delay before the first wave
    Loading,
    /// Active gameplay
    Playing,
    /// Simulation paused while an anomaly event is resolved
    Anomaly,
    /// Player destroyed, waiting for restart
    GameOver,
}

/// Stats projection shown by the HUD
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlayerStats {
    pub health: f32,
    pub max_health: f32,
    pub scrap: u32,
    pub score: u64,
    pub level: u32,
}

/// Side effects of a tick, drained by the shell (sound cues, HUD flashes, overlays)
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GameEvent {
    PlayerFired,
    EnemyFired,
    PlayerHit { damage: f32 },
    EnemyDestroyed { score: u32 },
    ScrapCollected { value: u32 },
    HealthCollected { healed: f32 },
    AnomalyTriggered,
    PhaseChanged { from: GamePhase, to: GamePhase },
}

/// Complete simulation state
#[derive(Debug, Clone)]
pub struct GameState {
    /// Screen size in world units (origin top-left, y down)
    pub bounds: Vec2,
    pub phase: GamePhase,
    pub player: Entity,
    /// All non-player entities, unordered
    pub entities: Vec<Entity>,
    /// Authoritative score
    pub score: u64,
    /// Score at which the last anomaly core was spawned
    pub last_anomaly_score: u64,
    /// Simulation tick counter
    pub time_ticks: u64,
    pub spawner: Spawner,
    /// Maximum live particles (0 disables particles)
    pub particle_cap: usize,
    /// Events produced by the most recent tick
    pub events: Vec<GameEvent>,
    pub rng: Pcg32,
    next_id: u32,
}

impl GameState {
    /// Create a new game with the player centered in `bounds`
    pub fn new(seed: u64, bounds: Vec2) -> Self {
        let mut state = Self {
            bounds,
            phase: GamePhase::Loading,
            player: Entity::player(0, bounds * 0.5),
            entities: Vec::new(),
            score: 0,
            last_anomaly_score: 0,
            time_ticks: 0,
            spawner: Spawner::default(),
            particle_cap: 500,
            events: Vec::new(),
            rng: Pcg32::seed_from_u64(seed),
            next_id: 1,
        };
        state.player.id = state.next_entity_id();
        state
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);
        id
    }

    /// Player scrap total
    pub fn scrap(&self) -> u32 {
        match self.player.kind {
            EntityKind::Player(data) => data.scrap,
            _ => 0,
        }
    }

    /// Add scrap to the player
    pub fn add_scrap(&mut self, amount: u32) {
        if let EntityKind::Player(ref mut data) = self.player.kind {
            data.scrap = data.scrap.saturating_add(amount);
        }
    }

    /// Current level derived from score
    pub fn level(&self) -> u32 {
        1 + (self.score / SCORE_PER_LEVEL) as u32
    }

    /// Snapshot for the presentation layer
    pub fn stats(&self) -> PlayerStats {
        PlayerStats {
            health: self.player.health,
            max_health: self.player.max_health,
            scrap: self.scrap(),
            score: self.score,
            level: self.level(),
        }
    }

    /// Apply damage to the player. Returns true if the hit was lethal.
    pub fn damage_player(&mut self, amount: f32) -> bool {
        self.player.health -= amount;
        self.events.push(GameEvent::PlayerHit { damage: amount });
        self.player.health <= 0.0
    }

    /// Heal the player up to max health, returning the amount restored
    pub fn heal_player(&mut self, amount: f32) -> f32 {
        let before = self.player.health;
        self.player.health = (self.player.health + amount).min(self.player.max_health);
        self.player.health - before
    }

    /// Switch phase, recording the transition
    pub fn set_phase(&mut self, to: GamePhase) {
        if self.phase != to {
            log::info!("Phase {:?} -> {:?}", self.phase, to);
            self.events.push(GameEvent::PhaseChanged {
                from: self.phase,
                to,
            });
            self.phase = to;
        }
    }

    /// Uniform random point at least `margin` from every edge
    pub fn random_interior_point(&mut self, margin: f32) -> Vec2 {
        let max = (self.bounds - Vec2::splat(margin)).max(Vec2::splat(margin + 1.0));
        Vec2::new(
            self.rng.random_range(margin..max.x),
            self.rng.random_range(margin..max.y),
        )
    }

    /// Radial burst of short-lived particles
    pub fn particle_burst(&mut self, pos: Vec2, count: usize, color: ColorTag) -> Vec<Entity> {
        (0..count)
            .map(|_| {
                let angle = self.rng.random_range(0.0..std::f32::consts::TAU);
                let speed = self.rng.random_range(1.0..4.0);
                let life = self.rng.random_range(20..40);
                let radius = self.rng.random_range(1.5..3.0);
                let id = self.next_entity_id();
                Entity::particle(id, pos, crate::direction(angle) * speed, radius, life, color)
            })
            .collect()
    }

    /// Count of live particles
    pub fn particle_count(&self) -> usize {
        self.entities.iter().filter(|e| e.is_particle()).count()
    }
}
