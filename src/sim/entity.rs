//! Entity model
//!
//! Every simulated object shares one record; kind-specific data lives in the
//! `EntityKind` payload so the tick dispatches on the tag.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::direction;

/// Color tag for rendering lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColorTag {
    Player,
    Enemy,
    PlayerBullet,
    EnemyBullet,
    Damage,
    Explosion,
    Heal,
    Scrap,
    Anomaly,
}

impl ColorTag {
    /// CSS color for 2D canvas drawing
    pub fn css(&self) -> &'static str {
        match self {
            ColorTag::Player => "#38bdf8",
            ColorTag::Enemy => "#f43f5e",
            ColorTag::PlayerBullet => "#fde047",
            ColorTag::EnemyBullet => "#fb923c",
            ColorTag::Damage => "#ef4444",
            ColorTag::Explosion => "#f97316",
            ColorTag::Heal => "#4ade80",
            ColorTag::Scrap => "#a3a3a3",
            ColorTag::Anomaly => "#c084fc",
        }
    }
}

/// Who fired a bullet (decides what it can hit)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BulletOwner {
    Player,
    Enemy,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlayerData {
    /// Wall-clock time of the last shot (ms)
    pub last_shot_ms: f64,
    /// Currency collected
    pub scrap: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnemyData {
    pub last_shot_ms: f64,
    /// Score awarded on kill
    pub value: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BulletData {
    /// Ticks until removal
    pub life: u32,
    pub owner: BulletOwner,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParticleData {
    pub life: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScrapData {
    pub value: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PickupData {
    /// Health restored on collection
    pub value: f32,
    /// Radius before pulsing is applied
    pub base_radius: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CoreData {
    pub base_radius: f32,
}

/// Kind tag with per-kind payload
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum EntityKind {
    Player(PlayerData),
    Enemy(EnemyData),
    Bullet(BulletData),
    Particle(ParticleData),
    Scrap(ScrapData),
    HealthPickup(PickupData),
    AnomalyCore(CoreData),
}

/// A simulated object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: u32,
    pub pos: Vec2,
    pub vel: Vec2,
    /// Collision and draw radius
    pub radius: f32,
    pub color: ColorTag,
    pub health: f32,
    pub max_health: f32,
    /// Facing (radians)
    pub rotation: f32,
    pub kind: EntityKind,
    /// Marked for removal at the end of the current tick
    #[serde(skip)]
    pub removed: bool,
}

impl Entity {
    fn base(id: u32, pos: Vec2, radius: f32, color: ColorTag, kind: EntityKind) -> Self {
        Self {
            id,
            pos,
            vel: Vec2::ZERO,
            radius,
            color,
            health: 1.0,
            max_health: 1.0,
            rotation: 0.0,
            kind,
            removed: false,
        }
    }

    pub fn player(id: u32, pos: Vec2) -> Self {
        let mut e = Self::base(
            id,
            pos,
            PLAYER_RADIUS,
            ColorTag::Player,
            EntityKind::Player(PlayerData {
                last_shot_ms: f64::NEG_INFINITY,
                scrap: 0,
            }),
        );
        e.health = PLAYER_MAX_HEALTH;
        e.max_health = PLAYER_MAX_HEALTH;
        // Nose up
        e.rotation = -std::f32::consts::FRAC_PI_2;
        e
    }

    pub fn enemy(id: u32, pos: Vec2, last_shot_ms: f64) -> Self {
        let mut e = Self::base(
            id,
            pos,
            ENEMY_RADIUS,
            ColorTag::Enemy,
            EntityKind::Enemy(EnemyData {
                last_shot_ms,
                value: ENEMY_VALUE,
            }),
        );
        e.health = ENEMY_HEALTH;
        e.max_health = ENEMY_HEALTH;
        e
    }

    /// Bullet travelling along `angle` from `pos`
    pub fn bullet(id: u32, pos: Vec2, angle: f32, owner: BulletOwner) -> Self {
        let (speed, radius, life, color) = match owner {
            BulletOwner::Player => (BULLET_SPEED, BULLET_RADIUS, BULLET_LIFE, ColorTag::PlayerBullet),
            BulletOwner::Enemy => (
                BULLET_SPEED * ENEMY_BULLET_SPEED_FACTOR,
                ENEMY_BULLET_RADIUS,
                ENEMY_BULLET_LIFE,
                ColorTag::EnemyBullet,
            ),
        };
        let mut e = Self::base(
            id,
            pos,
            radius,
            color,
            EntityKind::Bullet(BulletData { life, owner }),
        );
        e.vel = direction(angle) * speed;
        e.rotation = angle;
        e
    }

    pub fn particle(id: u32, pos: Vec2, vel: Vec2, radius: f32, life: u32, color: ColorTag) -> Self {
        let mut e = Self::base(id, pos, radius, color, EntityKind::Particle(ParticleData { life }));
        e.vel = vel;
        e
    }

    pub fn scrap(id: u32, pos: Vec2, vel: Vec2, value: u32) -> Self {
        let mut e = Self::base(id, pos, SCRAP_RADIUS, ColorTag::Scrap, EntityKind::Scrap(ScrapData { value }));
        e.vel = vel;
        e
    }

    pub fn health_pickup(id: u32, pos: Vec2) -> Self {
        Self::base(
            id,
            pos,
            HEALTH_PICKUP_RADIUS,
            ColorTag::Heal,
            EntityKind::HealthPickup(PickupData {
                value: HEALTH_PICKUP_VALUE,
                base_radius: HEALTH_PICKUP_RADIUS,
            }),
        )
    }

    pub fn anomaly_core(id: u32, pos: Vec2) -> Self {
        Self::base(
            id,
            pos,
            ANOMALY_CORE_RADIUS,
            ColorTag::Anomaly,
            EntityKind::AnomalyCore(CoreData {
                base_radius: ANOMALY_CORE_RADIUS,
            }),
        )
    }

    /// Flag for removal. Repeated calls are harmless.
    #[inline]
    pub fn mark_removed(&mut self) {
        self.removed = true;
    }

    pub fn is_enemy(&self) -> bool {
        matches!(self.kind, EntityKind::Enemy(_))
    }

    pub fn is_scrap(&self) -> bool {
        matches!(self.kind, EntityKind::Scrap(_))
    }

    pub fn is_particle(&self) -> bool {
        matches!(self.kind, EntityKind::Particle(_))
    }

    pub fn is_anomaly_core(&self) -> bool {
        matches!(self.kind, EntityKind::AnomalyCore(_))
    }

    /// Bullet owner, if this is a bullet
    pub fn bullet_owner(&self) -> Option<BulletOwner> {
        match self.kind {
            EntityKind::Bullet(b) => Some(b.owner),
            _ => None,
        }
    }

    /// Remaining lifetime for bullets and particles
    pub fn life(&self) -> Option<u32> {
        match self.kind {
            EntityKind::Bullet(b) => Some(b.life),
            EntityKind::Particle(p) => Some(p.life),
            _ => None,
        }
    }
}
