//! Collision detection and response for circular bodies
//!
//! Everything that moves or blocks in the world is a circle: the player,
//! enemies, projectiles, pickups, obstacles and landmarks. Blocking shapes
//! push overlapping bodies out along the separating axis.

use glam::Vec2;

/// Result of a collision check
#[derive(Debug, Clone)]
pub struct CollisionResult {
    /// Whether a collision occurred
    pub hit: bool,
    /// Contact point on the blocker's surface (if hit)
    pub point: Vec2,
    /// Separating axis, pointing from the blocker toward the body
    pub normal: Vec2,
    /// Penetration depth (for position correction)
    pub penetration: f32,
}

impl CollisionResult {
    pub fn miss() -> Self {
        Self {
            hit: false,
            point: Vec2::ZERO,
            normal: Vec2::ZERO,
            penetration: 0.0,
        }
    }
}

/// Check a moving circle against a static circle
///
/// When the centres coincide the separating axis falls back to +X so the
/// body is still pushed out deterministically.
pub fn circle_collision(
    body_pos: Vec2,
    body_radius: f32,
    center: Vec2,
    radius: f32,
) -> CollisionResult {
    let delta = body_pos - center;
    let dist = delta.length();
    let reach = body_radius + radius;

    if dist >= reach {
        return CollisionResult::miss();
    }

    let normal = crate::safe_normalize(delta, Vec2::X);
    CollisionResult {
        hit: true,
        point: center + normal * radius,
        normal,
        penetration: reach - dist,
    }
}

/// Push a body out of a blocking circle by the exact penetration depth
#[inline]
pub fn push_out(body_pos: Vec2, body_radius: f32, center: Vec2, radius: f32) -> Vec2 {
    let result = circle_collision(body_pos, body_radius, center, radius);
    if result.hit {
        body_pos + result.normal * result.penetration
    } else {
        body_pos
    }
}

/// Strict overlap test between two circles
#[inline]
pub fn circles_overlap(a: Vec2, ra: f32, b: Vec2, rb: f32) -> bool {
    a.distance_squared(b) < (ra + rb) * (ra + rb)
}
