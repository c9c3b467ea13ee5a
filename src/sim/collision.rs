//! Collision detection between circular entities

use glam::Vec2;

use super::entity::Entity;

/// True when two circles overlap (strictly closer than the sum of radii)
#[inline]
pub fn circles_overlap(a_pos: Vec2, a_radius: f32, b_pos: Vec2, b_radius: f32) -> bool {
    let reach = a_radius + b_radius;
    a_pos.distance_squared(b_pos) < reach * reach
}

/// True when two entities overlap
#[inline]
pub fn entities_collide(a: &Entity, b: &Entity) -> bool {
    circles_overlap(a.pos, a.radius, b.pos, b.radius)
}

/// Clamp a circle's center so the whole circle stays inside `[0, bounds]`
pub fn clamp_circle_to_bounds(pos: Vec2, radius: f32, bounds: Vec2) -> Vec2 {
    let min = Vec2::splat(radius);
    let max = (bounds - Vec2::splat(radius)).max(min);
    pos.clamp(min, max)
}
