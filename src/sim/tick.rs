//! Per-frame simulation step
//!
//! Advances the player and every entity by one tick, resolves collisions and
//! records side effects as `GameEvent`s. Ticks are counted per animation frame;
//! cooldowns are measured against wall-clock milliseconds so skipped frames
//! never cause a catch-up burst.

use glam::Vec2;
use rand::Rng;

use super::collision::{clamp_circle_to_bounds, entities_collide};
use super::entity::{BulletOwner, ColorTag, Entity, EntityKind};
use super::spawner::run_spawner;
use super::state::{GameEvent, GamePhase, GameState};
use crate::consts::*;
use crate::{angle_to, direction, distance, unit_or_zero};

/// Aim source for a single tick
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum Aim {
    /// Keep the current rotation
    #[default]
    Hold,
    /// Face a point in screen coordinates
    Pointer(Vec2),
    /// Face along a joystick direction
    Stick(Vec2),
}

/// Input commands for a single tick
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TickInput {
    /// Desired movement direction (unit length or zero)
    pub move_dir: Vec2,
    pub aim: Aim,
    pub fire: bool,
}

/// Entities created during the entity pass; appended after compaction
struct Spawned {
    entities: Vec<Entity>,
    particle_room: usize,
}

impl Spawned {
    fn burst(&mut self, state: &mut GameState, pos: Vec2, count: usize, color: ColorTag) {
        let count = count.min(self.particle_room);
        self.particle_room -= count;
        self.entities.extend(state.particle_burst(pos, count, color));
    }
}

/// Advance the game state by one frame
pub fn tick(state: &mut GameState, input: &TickInput, now_ms: f64) {
    state.events.clear();

    if state.phase != GamePhase::Playing {
        return;
    }

    let player = &state.player;
    if !player.pos.is_finite() || !player.vel.is_finite() || player.radius <= 0.0 {
        log::warn!("Skipping frame: invalid player {:?}", player);
        return;
    }

    state.time_ticks += 1;

    move_player(state, input);
    aim_player(state, input);
    fire_player(state, input, now_ms);
    run_spawner(state, now_ms);

    let particle_room = state.particle_cap.saturating_sub(state.particle_count());
    let mut entities = std::mem::take(&mut state.entities);
    let mut spawned = Spawned {
        entities: Vec::new(),
        particle_room,
    };

    // Bullets move first so hit tests see this tick's positions
    for bullet in entities.iter_mut().filter(|e| e.bullet_owner().is_some()) {
        update_bullet(state, bullet, &mut spawned);
    }

    // Only entities present at the start of the pass are visited; removals are
    // flags, so indices stay stable and nothing is skipped or visited twice.
    let mut touched_core = None;
    for i in 0..entities.len() {
        if entities[i].removed {
            continue;
        }
        let kind = entities[i].kind;
        match kind {
            EntityKind::Bullet(_) => {}
            EntityKind::Enemy(_) => update_enemy(state, &mut entities, i, &mut spawned, now_ms),
            EntityKind::Scrap(_) => update_scrap(state, &mut entities[i]),
            EntityKind::AnomalyCore(_) => {
                if update_anomaly_core(state, &mut entities[i], now_ms) && touched_core.is_none() {
                    touched_core = Some(i);
                }
            }
            EntityKind::HealthPickup(_) => {
                update_health_pickup(state, &mut entities[i], &mut spawned, now_ms)
            }
            EntityKind::Particle(_) => update_particle(&mut entities[i]),
            EntityKind::Player(_) => {
                log::warn!("Stray player entity {} in collection", entities[i].id);
                entities[i].mark_removed();
            }
        }
    }

    // One core per pause, and never once the player died this tick
    if let Some(i) = touched_core {
        if state.phase == GamePhase::Playing {
            entities[i].mark_removed();
            state.events.push(GameEvent::AnomalyTriggered);
            state.set_phase(GamePhase::Anomaly);
        }
    }

    entities.retain(|e| !e.removed);
    entities.append(&mut spawned.entities);
    state.entities = entities;

    let max = state.player.max_health;
    state.player.health = state.player.health.clamp(0.0, max);
}

fn move_player(state: &mut GameState, input: &TickInput) {
    let dir = unit_or_zero(input.move_dir);
    let player = &mut state.player;
    player.vel += dir * PLAYER_ACCEL;
    player.vel *= PLAYER_FRICTION;
    player.pos += player.vel;

    let clamped = clamp_circle_to_bounds(player.pos, player.radius, state.bounds);
    // Kill velocity into a wall so the ship doesn't stick to it
    if clamped.x != player.pos.x {
        player.vel.x = 0.0;
    }
    if clamped.y != player.pos.y {
        player.vel.y = 0.0;
    }
    player.pos = clamped;
}

fn aim_player(state: &mut GameState, input: &TickInput) {
    match input.aim {
        Aim::Pointer(target) => state.player.rotation = angle_to(state.player.pos, target),
        Aim::Stick(dir) if dir != Vec2::ZERO => state.player.rotation = dir.y.atan2(dir.x),
        _ => {}
    }
}

fn fire_player(state: &mut GameState, input: &TickInput, now_ms: f64) {
    if !input.fire {
        return;
    }
    let EntityKind::Player(ref mut data) = state.player.kind else {
        return;
    };
    if now_ms - data.last_shot_ms < PLAYER_FIRE_COOLDOWN_MS {
        return;
    }
    data.last_shot_ms = now_ms;

    let rotation = state.player.rotation;
    let nose = state.player.pos + direction(rotation) * PLAYER_NOSE_OFFSET;
    let id = state.next_entity_id();
    state
        .entities
        .push(Entity::bullet(id, nose, rotation, BulletOwner::Player));
    state.events.push(GameEvent::PlayerFired);
}

fn update_bullet(state: &mut GameState, bullet: &mut Entity, spawned: &mut Spawned) {
    bullet.pos += bullet.vel;

    let EntityKind::Bullet(ref mut data) = bullet.kind else {
        return;
    };
    data.life = data.life.saturating_sub(1);
    if data.life == 0 {
        bullet.mark_removed();
        return;
    }

    if data.owner == BulletOwner::Enemy && entities_collide(bullet, &state.player) {
        bullet.mark_removed();
        spawned.burst(state, bullet.pos, BULLET_HIT_PARTICLES, ColorTag::Damage);
        if state.damage_player(ENEMY_BULLET_DAMAGE) {
            state.set_phase(GamePhase::GameOver);
        }
    }
}

fn update_enemy(
    state: &mut GameState,
    entities: &mut [Entity],
    index: usize,
    spawned: &mut Spawned,
    now_ms: f64,
) {
    let player_pos = state.player.pos;
    {
        let enemy = &mut entities[index];
        enemy.pos += enemy.vel;
        // Continuous homing, not predictive
        enemy.vel = unit_or_zero(player_pos - enemy.pos) * ENEMY_SPEED;
        enemy.rotation = angle_to(enemy.pos, player_pos);

        if let EntityKind::Enemy(ref mut data) = enemy.kind {
            if now_ms - data.last_shot_ms >= ENEMY_FIRE_COOLDOWN_MS {
                data.last_shot_ms = now_ms;
                let id = state.next_entity_id();
                spawned.entities.push(Entity::bullet(
                    id,
                    enemy.pos,
                    enemy.rotation,
                    BulletOwner::Enemy,
                ));
                state.events.push(GameEvent::EnemyFired);
            }
        }

        if entities_collide(enemy, &state.player) {
            enemy.mark_removed();
            spawned.burst(state, enemy.pos, CONTACT_PARTICLES, ColorTag::Damage);
            if state.damage_player(ENEMY_CONTACT_DAMAGE) {
                state.set_phase(GamePhase::GameOver);
            }
        }
    }

    // Player bullets, whether or not the enemy already rammed the player
    let (enemy_pos, enemy_radius) = (entities[index].pos, entities[index].radius);
    let mut damage = 0.0;
    for (j, other) in entities.iter_mut().enumerate() {
        if j == index || other.removed || other.bullet_owner() != Some(BulletOwner::Player) {
            continue;
        }
        if super::collision::circles_overlap(enemy_pos, enemy_radius, other.pos, other.radius) {
            other.mark_removed();
            damage += PLAYER_BULLET_DAMAGE;
        }
    }
    if damage <= 0.0 {
        return;
    }

    let enemy = &mut entities[index];
    let was_alive = enemy.health > 0.0;
    enemy.health -= damage;
    if was_alive && enemy.health <= 0.0 {
        let value = match enemy.kind {
            EntityKind::Enemy(data) => data.value,
            _ => 0,
        };
        spawned.burst(state, enemy.pos, EXPLOSION_PARTICLES, ColorTag::Explosion);
        let drift = Vec2::new(
            state.rng.random_range(-1.0..1.0),
            state.rng.random_range(-1.0..1.0),
        );
        let id = state.next_entity_id();
        spawned
            .entities
            .push(Entity::scrap(id, enemy.pos, drift, SCRAP_DROP_VALUE));
        state.score += u64::from(value);
        state.events.push(GameEvent::EnemyDestroyed { score: value });
        enemy.mark_removed();
    }
}

fn update_scrap(state: &mut GameState, scrap: &mut Entity) {
    let player = &state.player;
    if distance(scrap.pos, player.pos) < SCRAP_MAGNET_RANGE {
        scrap.vel = Vec2::ZERO;
        scrap.pos = scrap.pos.lerp(player.pos, SCRAP_MAGNET_LERP);
    } else {
        scrap.pos += scrap.vel;
        scrap.vel *= SCRAP_DRIFT_DAMPING;
    }

    if entities_collide(scrap, &state.player) {
        let value = match scrap.kind {
            EntityKind::Scrap(data) => data.value,
            _ => 0,
        };
        scrap.mark_removed();
        state.add_scrap(value);
        state.events.push(GameEvent::ScrapCollected { value });
    }
}

fn pulse(base: f32, amplitude: f32, now_ms: f64) -> f32 {
    base + amplitude * (now_ms * PULSE_RATE).sin() as f32
}

/// Returns true when the core touches the player
fn update_anomaly_core(state: &GameState, core: &mut Entity, now_ms: f64) -> bool {
    core.pos += core.vel;
    if let EntityKind::AnomalyCore(data) = core.kind {
        core.radius = pulse(data.base_radius, ANOMALY_CORE_PULSE, now_ms);
    }
    entities_collide(core, &state.player)
}

fn update_health_pickup(
    state: &mut GameState,
    pickup: &mut Entity,
    spawned: &mut Spawned,
    now_ms: f64,
) {
    pickup.pos += pickup.vel;
    let EntityKind::HealthPickup(data) = pickup.kind else {
        return;
    };
    pickup.radius = pulse(data.base_radius, HEALTH_PICKUP_PULSE, now_ms);

    if entities_collide(pickup, &state.player) {
        pickup.mark_removed();
        let healed = state.heal_player(data.value);
        spawned.burst(state, pickup.pos, HEAL_PARTICLES, ColorTag::Heal);
        state.events.push(GameEvent::HealthCollected { healed });
    }
}

fn update_particle(particle: &mut Entity) {
    particle.pos += particle.vel;
    if let EntityKind::Particle(ref mut data) = particle.kind {
        data.life = data.life.saturating_sub(1);
        if data.life == 0 {
            particle.mark_removed();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const DT_MS: f64 = 16.0;

    fn playing_state() -> GameState {
        let mut state = GameState::new(12345, Vec2::new(1000.0, 1000.0));
        state.phase = GamePhase::Playing;
        state.player.pos = Vec2::new(500.0, 500.0);
        state
    }

    fn idle_enemy(state: &mut GameState, pos: Vec2, now_ms: f64) -> u32 {
        let id = state.next_entity_id();
        state.entities.push(Entity::enemy(id, pos, now_ms));
        id
    }

    fn count(state: &GameState, pred: impl Fn(&Entity) -> bool) -> usize {
        state.entities.iter().filter(|&e| pred(e)).count()
    }

    #[test]
    fn test_tick_noop_unless_playing() {
        let mut state = playing_state();
        state.phase = GamePhase::Anomaly;
        let input = TickInput {
            move_dir: Vec2::X,
            fire: true,
            ..Default::default()
        };
        tick(&mut state, &input, 0.0);
        assert_eq!(state.time_ticks, 0);
        assert_eq!(state.player.pos, Vec2::new(500.0, 500.0));
        assert!(state.entities.is_empty());
    }

    #[test]
    fn test_invalid_player_skips_frame() {
        let mut state = playing_state();
        state.player.radius = 0.0;
        tick(&mut state, &TickInput::default(), 0.0);
        assert_eq!(state.time_ticks, 0);
    }

    #[test]
    fn test_player_accelerates_and_drifts() {
        let mut state = playing_state();
        let right = TickInput {
            move_dir: Vec2::X,
            ..Default::default()
        };
        tick(&mut state, &right, 0.0);
        assert!((state.player.vel.x - PLAYER_ACCEL * PLAYER_FRICTION).abs() < 1e-5);
        let after_push = state.player.pos.x;
        assert!(after_push > 500.0);

        // No input: keeps drifting while slowing down
        let speed = state.player.vel.x;
        tick(&mut state, &TickInput::default(), DT_MS);
        assert!(state.player.pos.x > after_push);
        assert!(state.player.vel.x < speed);
    }

    #[test]
    fn test_player_clamped_to_screen() {
        let mut state = playing_state();
        state.player.pos = Vec2::new(16.0, 984.0);
        state.player.vel = Vec2::new(-20.0, 20.0);
        tick(&mut state, &TickInput::default(), 0.0);
        assert_eq!(state.player.pos, Vec2::new(PLAYER_RADIUS, 1000.0 - PLAYER_RADIUS));
    }

    #[test]
    fn test_pointer_and_stick_aim() {
        let mut state = playing_state();
        let input = TickInput {
            aim: Aim::Pointer(Vec2::new(500.0, 100.0)),
            ..Default::default()
        };
        tick(&mut state, &input, 0.0);
        assert!((state.player.rotation + std::f32::consts::FRAC_PI_2).abs() < 1e-5);

        let input = TickInput {
            aim: Aim::Stick(Vec2::new(-1.0, 0.0)),
            ..Default::default()
        };
        tick(&mut state, &input, DT_MS);
        assert!((state.player.rotation.abs() - std::f32::consts::PI).abs() < 1e-5);

        // Hold keeps the last rotation
        let before = state.player.rotation;
        tick(&mut state, &TickInput::default(), 2.0 * DT_MS);
        assert_eq!(state.player.rotation, before);
    }

    #[test]
    fn test_fire_rate_limited() {
        let mut state = playing_state();
        let fire = TickInput {
            aim: Aim::Pointer(Vec2::new(900.0, 500.0)),
            fire: true,
            ..Default::default()
        };
        tick(&mut state, &fire, 1000.0);
        tick(&mut state, &fire, 1100.0);
        assert_eq!(count(&state, |e| e.bullet_owner().is_some()), 1);
        tick(&mut state, &fire, 1150.0);
        assert_eq!(count(&state, |e| e.bullet_owner().is_some()), 2);

        let bullet = &state.entities[0];
        // Spawned at the nose, then advanced once
        let expected = Vec2::new(500.0 + PLAYER_NOSE_OFFSET + BULLET_SPEED * 3.0, 500.0);
        assert!((bullet.pos - expected).length() < 1e-3, "{:?}", bullet.pos);
    }

    #[test]
    fn test_bullet_expires() {
        let mut state = playing_state();
        let id = state.next_entity_id();
        state.entities.push(Entity::bullet(
            id,
            Vec2::new(100.0, 100.0),
            0.0,
            BulletOwner::Player,
        ));
        for t in 0..(BULLET_LIFE - 1) {
            tick(&mut state, &TickInput::default(), f64::from(t) * DT_MS);
            assert_eq!(state.entities[0].life(), Some(BULLET_LIFE - 1 - t));
        }
        tick(&mut state, &TickInput::default(), 1e6);
        assert_eq!(count(&state, |e| e.bullet_owner().is_some()), 0);
    }

    #[test]
    fn test_enemy_homes_and_faces_player() {
        let mut state = playing_state();
        idle_enemy(&mut state, Vec2::new(800.0, 500.0), 0.0);
        tick(&mut state, &TickInput::default(), 10.0);
        let enemy = &state.entities[0];
        assert!((enemy.vel - Vec2::new(-ENEMY_SPEED, 0.0)).length() < 1e-5);
        assert!((enemy.rotation.abs() - std::f32::consts::PI).abs() < 1e-5);

        tick(&mut state, &TickInput::default(), 20.0);
        assert!((state.entities[0].pos.x - (800.0 - ENEMY_SPEED)).abs() < 1e-4);
    }

    #[test]
    fn test_enemy_fires_on_cooldown() {
        let mut state = playing_state();
        idle_enemy(&mut state, Vec2::new(800.0, 500.0), 0.0);
        tick(&mut state, &TickInput::default(), 999.0);
        assert_eq!(count(&state, |e| e.bullet_owner() == Some(BulletOwner::Enemy)), 0);
        tick(&mut state, &TickInput::default(), 1000.0);
        assert_eq!(count(&state, |e| e.bullet_owner() == Some(BulletOwner::Enemy)), 1);
        assert!(state.events.contains(&GameEvent::EnemyFired));
        let bullet = state
            .entities
            .iter()
            .find(|e| e.bullet_owner().is_some())
            .unwrap();
        assert!((bullet.vel.length() - BULLET_SPEED * ENEMY_BULLET_SPEED_FACTOR).abs() < 1e-4);
        assert_eq!(bullet.life(), Some(ENEMY_BULLET_LIFE));
    }

    /// Enemy rams the player, then an enemy bullet hits on the next tick
    #[test]
    fn test_scenario_contact_then_bullet() {
        let mut state = playing_state();
        idle_enemy(&mut state, Vec2::new(510.0, 500.0), 0.0);
        tick(&mut state, &TickInput::default(), 10.0);
        assert_eq!(state.player.health, 90.0);
        assert_eq!(count(&state, Entity::is_enemy), 0);
        assert_eq!(count(&state, Entity::is_particle), 5);

        let id = state.next_entity_id();
        state.entities.push(Entity::bullet(
            id,
            Vec2::new(520.0, 500.0),
            std::f32::consts::PI,
            BulletOwner::Enemy,
        ));
        tick(&mut state, &TickInput::default(), 20.0);
        assert_eq!(state.player.health, 85.0);
        assert_eq!(count(&state, |e| e.bullet_owner().is_some()), 0);
        assert_eq!(count(&state, Entity::is_particle), 8);
        assert_eq!(state.phase, GamePhase::Playing);
    }

    #[test]
    fn test_lethal_contact_ends_game_and_clamps_health() {
        let mut state = playing_state();
        state.player.health = 4.0;
        idle_enemy(&mut state, Vec2::new(505.0, 500.0), 0.0);
        tick(&mut state, &TickInput::default(), 10.0);
        assert_eq!(state.phase, GamePhase::GameOver);
        assert_eq!(state.player.health, 0.0);
        assert!(state.events.contains(&GameEvent::PhaseChanged {
            from: GamePhase::Playing,
            to: GamePhase::GameOver
        }));
    }

    /// Sustained fire from (500,500) at an enemy directly north
    #[test]
    fn test_scenario_shoot_enemy_north() {
        let mut state = playing_state();
        let enemy_id = idle_enemy(&mut state, Vec2::new(500.0, 300.0), 0.0);
        let input = TickInput {
            aim: Aim::Pointer(Vec2::new(500.0, 0.0)),
            fire: true,
            ..Default::default()
        };

        let mut last_enemy_pos = Vec2::ZERO;
        let mut killed = false;
        for frame in 0..50u32 {
            // Keep the enemy from shooting back
            for e in &mut state.entities {
                if let EntityKind::Enemy(ref mut d) = e.kind {
                    d.last_shot_ms = f64::INFINITY;
                }
            }
            if let Some(e) = state.entities.iter().find(|e| e.id == enemy_id) {
                last_enemy_pos = e.pos + e.vel;
            }
            tick(&mut state, &input, f64::from(frame) * DT_MS);
            if !state.entities.iter().any(|e| e.id == enemy_id) {
                killed = true;
                break;
            }
        }

        assert!(killed, "enemy should be destroyed");
        assert_eq!(state.score, 10);
        let scrap: Vec<_> = state.entities.iter().filter(|e| e.is_scrap()).collect();
        assert_eq!(scrap.len(), 1);
        assert!((scrap[0].pos - last_enemy_pos).length() < 1e-3);
        assert!(matches!(scrap[0].kind, EntityKind::Scrap(d) if d.value == 5));
        assert_eq!(count(&state, Entity::is_particle), EXPLOSION_PARTICLES);
        assert!(state.events.contains(&GameEvent::EnemyDestroyed { score: 10 }));
    }

    #[test]
    fn test_rammed_and_shot_enemy_removed_once() {
        let mut state = playing_state();
        let bystander = idle_enemy(&mut state, Vec2::new(100.0, 100.0), 0.0);
        let rammer = idle_enemy(&mut state, Vec2::new(510.0, 500.0), 0.0);
        if let Some(e) = state.entities.iter_mut().find(|e| e.id == rammer) {
            e.health = 10.0;
        }
        let id = state.next_entity_id();
        state.entities.push(Entity::bullet(
            id,
            Vec2::new(498.0, 500.0),
            0.0,
            BulletOwner::Player,
        ));

        tick(&mut state, &TickInput::default(), 10.0);
        assert!(!state.entities.iter().any(|e| e.id == rammer));
        assert!(state.entities.iter().any(|e| e.id == bystander));
        assert_eq!(count(&state, Entity::is_enemy), 1);
        assert_eq!(count(&state, |e| e.bullet_owner().is_some()), 0);
        assert_eq!(state.player.health, 90.0);
    }

    #[test]
    fn test_scrap_magnet_and_collection() {
        let mut state = playing_state();
        let id = state.next_entity_id();
        state
            .entities
            .push(Entity::scrap(id, Vec2::new(600.0, 500.0), Vec2::new(1.0, 0.0), 5));

        let mut last = 100.0;
        let mut frames = 0;
        while state.entities.iter().any(|e| e.is_scrap()) {
            tick(&mut state, &TickInput::default(), f64::from(frames) * DT_MS);
            if let Some(s) = state.entities.iter().find(|e| e.is_scrap()) {
                let d = distance(s.pos, state.player.pos);
                assert!(d < last);
                last = d;
            }
            frames += 1;
            assert!(frames < 100);
        }
        assert_eq!(state.scrap(), 5);
    }

    #[test]
    fn test_far_scrap_drifts() {
        let mut state = playing_state();
        let id = state.next_entity_id();
        state
            .entities
            .push(Entity::scrap(id, Vec2::new(100.0, 100.0), Vec2::new(1.0, 0.0), 5));
        tick(&mut state, &TickInput::default(), 0.0);
        let s = &state.entities[0];
        assert_eq!(s.pos, Vec2::new(101.0, 100.0));
        assert!(s.vel.x < 1.0);
    }

    #[test]
    fn test_health_pickup_heals_capped() {
        let mut state = playing_state();
        state.player.health = 95.0;
        let id = state.next_entity_id();
        state.entities.push(Entity::health_pickup(id, Vec2::new(505.0, 500.0)));
        tick(&mut state, &TickInput::default(), 0.0);
        assert_eq!(state.player.health, 100.0);
        assert!(!state.entities.iter().any(|e| e.id == id));
        assert_eq!(count(&state, Entity::is_particle), HEAL_PARTICLES);
    }

    #[test]
    fn test_pickup_pulses() {
        let mut state = playing_state();
        let id = state.next_entity_id();
        state.entities.push(Entity::health_pickup(id, Vec2::new(100.0, 100.0)));
        let id = state.next_entity_id();
        state.entities.push(Entity::anomaly_core(id, Vec2::new(900.0, 900.0)));
        // sin(pi/2) = 1
        let peak = std::f64::consts::FRAC_PI_2 / PULSE_RATE;
        tick(&mut state, &TickInput::default(), peak);
        assert!((state.entities[0].radius - (HEALTH_PICKUP_RADIUS + 2.0)).abs() < 1e-3);
        assert!((state.entities[1].radius - (ANOMALY_CORE_RADIUS + 5.0)).abs() < 1e-3);
    }

    #[test]
    fn test_anomaly_core_pauses() {
        let mut state = playing_state();
        let id = state.next_entity_id();
        state.entities.push(Entity::anomaly_core(id, Vec2::new(510.0, 500.0)));
        tick(&mut state, &TickInput::default(), 0.0);
        assert_eq!(state.phase, GamePhase::Anomaly);
        assert!(state.entities.is_empty());
        assert!(state.events.contains(&GameEvent::AnomalyTriggered));

        // Paused: nothing advances
        let ticks = state.time_ticks;
        tick(&mut state, &TickInput::default(), 16.0);
        assert_eq!(state.time_ticks, ticks);
    }

    #[test]
    fn test_second_core_waits_for_next_pause() {
        let mut state = playing_state();
        for pos in [Vec2::new(510.0, 500.0), Vec2::new(490.0, 500.0)] {
            let id = state.next_entity_id();
            state.entities.push(Entity::anomaly_core(id, pos));
        }
        tick(&mut state, &TickInput::default(), 0.0);
        assert_eq!(state.phase, GamePhase::Anomaly);
        assert_eq!(count(&state, Entity::is_anomaly_core), 1);
        let triggers = state
            .events
            .iter()
            .filter(|e| **e == GameEvent::AnomalyTriggered)
            .count();
        assert_eq!(triggers, 1);
    }

    #[test]
    fn test_core_ignored_when_player_dies_same_tick() {
        let mut state = playing_state();
        state.player.health = 5.0;
        // Core sits before the enemy in the collection
        let core = state.next_entity_id();
        state.entities.push(Entity::anomaly_core(core, Vec2::new(505.0, 500.0)));
        idle_enemy(&mut state, Vec2::new(510.0, 500.0), 0.0);

        tick(&mut state, &TickInput::default(), 10.0);
        assert_eq!(state.phase, GamePhase::GameOver);
        assert!(state.entities.iter().any(|e| e.id == core));
        assert!(!state.events.contains(&GameEvent::AnomalyTriggered));
        assert_eq!(
            state.events.iter().filter(|e| matches!(e, GameEvent::PhaseChanged { .. })).count(),
            1
        );
        assert!(state.events.contains(&GameEvent::PhaseChanged {
            from: GamePhase::Playing,
            to: GamePhase::GameOver
        }));
    }

    #[test]
    fn test_bullet_hits_after_moving_same_tick() {
        let mut state = playing_state();
        let enemy = idle_enemy(&mut state, Vec2::new(800.0, 500.0), f64::INFINITY);
        let id = state.next_entity_id();
        state.entities.push(Entity::bullet(
            id,
            Vec2::new(772.0, 500.0),
            0.0,
            BulletOwner::Player,
        ));
        // 782 after moving, inside 15 + 4 of the enemy
        tick(&mut state, &TickInput::default(), 10.0);
        assert!(!state.entities.iter().any(|e| e.id == id));
        let health = state.entities.iter().find(|e| e.id == enemy).map(|e| e.health);
        assert_eq!(health, Some(ENEMY_HEALTH - PLAYER_BULLET_DAMAGE));
    }

    #[test]
    fn test_particle_cap_respected() {
        let mut state = playing_state();
        state.particle_cap = 0;
        idle_enemy(&mut state, Vec2::new(510.0, 500.0), 0.0);
        tick(&mut state, &TickInput::default(), 10.0);
        assert_eq!(count(&state, Entity::is_particle), 0);
        assert_eq!(state.player.health, 90.0);
    }

    #[test]
    fn test_particles_expire() {
        let mut state = playing_state();
        let burst = state.particle_burst(Vec2::new(100.0, 100.0), 4, ColorTag::Explosion);
        state.entities.extend(burst);
        for frame in 0..40 {
            tick(&mut state, &TickInput::default(), f64::from(frame) * DT_MS);
        }
        assert_eq!(count(&state, Entity::is_particle), 0);
    }

    proptest! {
        #[test]
        fn prop_health_stays_in_range(
            start in 0.5f32..100.0,
            enemies in prop::collection::vec((400.0f32..600.0, 400.0f32..600.0), 0..6),
            frames in 1u32..30,
        ) {
            let mut state = playing_state();
            state.player.health = start;
            for (x, y) in enemies {
                idle_enemy(&mut state, Vec2::new(x, y), 0.0);
            }
            for frame in 0..frames {
                tick(&mut state, &TickInput::default(), f64::from(frame) * DT_MS);
                prop_assert!(state.player.health >= 0.0);
                prop_assert!(state.player.health <= state.player.max_health);
            }
        }

        #[test]
        fn prop_bullet_life_strictly_decreases(
            angle in 0.0f32..std::f32::consts::TAU,
            frames in 1u32..90,
        ) {
            let mut state = playing_state();
            let id = state.next_entity_id();
            state.entities.push(Entity::bullet(id, Vec2::new(500.0, 500.0), angle, BulletOwner::Player));
            let mut last = BULLET_LIFE;
            for frame in 0..frames {
                // No spawned enemies to intercept the bullet
                state.spawner.enemy_timer = 0;
                tick(&mut state, &TickInput::default(), f64::from(frame) * DT_MS);
                match state.entities.iter().find(|e| e.id == id) {
                    Some(b) => {
                        let life = b.life().unwrap_or(0);
                        prop_assert!(life > 0);
                        prop_assert!(life < last);
                        last = life;
                    }
                    None => {
                        prop_assert_eq!(last, 1);
                        break;
                    }
                }
            }
        }

        #[test]
        fn prop_scrap_magnet_closes_distance(
            angle in 0.0f32..std::f32::consts::TAU,
            dist in 20.0f32..149.0,
            drift in -2.0f32..2.0,
        ) {
            let mut state = playing_state();
            let pos = state.player.pos + direction(angle) * dist;
            let id = state.next_entity_id();
            state.entities.push(Entity::scrap(id, pos, Vec2::splat(drift), 5));
            let before = distance(pos, state.player.pos);
            tick(&mut state, &TickInput::default(), 0.0);
            if let Some(s) = state.entities.iter().find(|e| e.id == id) {
                prop_assert!(distance(s.pos, state.player.pos) < before);
            } else {
                prop_assert_eq!(state.scrap(), 5);
            }
        }
    }
}
