//! Timer- and score-driven entity creation

use glam::Vec2;
use rand::Rng;

use super::entity::Entity;
use super::state::GameState;
use crate::consts::*;

/// Per-tick spawn counters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Spawner {
    pub enemy_timer: u32,
    pub pickup_timer: u32,
}

/// Screen edge an enemy enters from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Top,
    Right,
    Bottom,
    Left,
}

impl Edge {
    const ALL: [Edge; 4] = [Edge::Top, Edge::Right, Edge::Bottom, Edge::Left];
}

/// Point on `edge`, `t` in [0, 1] along it, pushed `offset` outside the screen
pub fn edge_point(edge: Edge, t: f32, bounds: Vec2, offset: f32) -> Vec2 {
    match edge {
        Edge::Top => Vec2::new(t * bounds.x, -offset),
        Edge::Right => Vec2::new(bounds.x + offset, t * bounds.y),
        Edge::Bottom => Vec2::new(t * bounds.x, bounds.y + offset),
        Edge::Left => Vec2::new(-offset, t * bounds.y),
    }
}

/// Advance spawn counters and add any due entities directly to the collection
pub fn run_spawner(state: &mut GameState, now_ms: f64) {
    state.spawner.enemy_timer += 1;
    if state.spawner.enemy_timer >= ENEMY_SPAWN_INTERVAL {
        state.spawner.enemy_timer = 0;
        spawn_enemy(state, now_ms);
    }

    state.spawner.pickup_timer += 1;
    if state.spawner.pickup_timer >= HEALTH_PICKUP_INTERVAL {
        state.spawner.pickup_timer = 0;
        if state.rng.random_bool(HEALTH_PICKUP_CHANCE) {
            let pos = state.random_interior_point(SPAWN_MARGIN);
            let id = state.next_entity_id();
            log::debug!("Health pickup {} at {:?}", id, pos);
            state.entities.push(Entity::health_pickup(id, pos));
        }
    }

    if state.score.saturating_sub(state.last_anomaly_score) >= ANOMALY_SCORE_THRESHOLD {
        state.last_anomaly_score = state.score;
        let pos = state.random_interior_point(SPAWN_MARGIN);
        let id = state.next_entity_id();
        log::info!("Anomaly core {} at {:?} (score {})", id, pos, state.score);
        state.entities.push(Entity::anomaly_core(id, pos));
    }
}

/// Spawn one enemy just outside a random screen edge
pub fn spawn_enemy(state: &mut GameState, now_ms: f64) {
    let edge = Edge::ALL[state.rng.random_range(0..Edge::ALL.len())];
    let t = state.rng.random::<f32>();
    let pos = edge_point(edge, t, state.bounds, ENEMY_SPAWN_OFFSET);
    // Stagger first volleys so enemies don't fire in lockstep
    let stagger = state.rng.random_range(0.0..ENEMY_FIRE_COOLDOWN_MS);
    let id = state.next_entity_id();
    log::debug!("Enemy {} from {:?} at {:?}", id, edge, pos);
    state.entities.push(Entity::enemy(id, pos, now_ms - stagger));
}
