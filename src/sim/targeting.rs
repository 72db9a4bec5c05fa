//! Automatic target selection and projectile steering
//!
//! Only enemies that are alive, inside the combat zone and on screen can be
//! targeted. The combat zone radius is the smaller of the caller's reach and
//! half the shorter viewport side.

use std::collections::HashSet;

use glam::Vec2;
use rand::Rng;

use super::store::{Enemy, EntityId};
use crate::consts::VIEW_MARGIN;
use crate::safe_normalize;

/// Largest fraction of a turn a homing projectile may take per frame
pub const HOMING_STEER_CAP: f32 = 0.22;

/// The rectangle currently visible on screen, in world units
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewRect {
    pub center: Vec2,
    pub size: Vec2,
}

impl ViewRect {
    pub fn new(center: Vec2, size: Vec2) -> Self {
        Self { center, size }
    }

    /// Point inside the rectangle grown by `margin` on every side
    pub fn contains(&self, pos: Vec2, margin: f32) -> bool {
        let half = self.size * 0.5 + Vec2::splat(margin);
        let d = (pos - self.center).abs();
        d.x <= half.x && d.y <= half.y
    }

    /// Half the shorter side
    pub fn half_min_extent(&self) -> f32 {
        self.size.min_element() * 0.5
    }
}

/// Radius within which automatic targeting is allowed
#[inline]
pub fn combat_zone_radius(max_dist: f32, view: &ViewRect) -> f32 {
    max_dist.min(view.half_min_extent())
}

/// Indices of enemies eligible as automatic targets
pub fn eligible_targets<'a>(
    enemies: &'a [Enemy],
    origin: Vec2,
    max_dist: f32,
    view: &'a ViewRect,
) -> impl Iterator<Item = usize> + 'a {
    let zone = combat_zone_radius(max_dist, view);
    enemies.iter().enumerate().filter_map(move |(i, e)| {
        let eligible =
            e.is_alive() && origin.distance(e.pos) <= zone && view.contains(e.pos, VIEW_MARGIN);
        eligible.then_some(i)
    })
}

/// Lowest-HP eligible enemy, ties broken by distance to `origin`
pub fn lowest_hp_target(
    enemies: &[Enemy],
    origin: Vec2,
    max_dist: f32,
    view: &ViewRect,
) -> Option<usize> {
    best_of(enemies, origin, eligible_targets(enemies, origin, max_dist, view))
}

/// Same rule as [`lowest_hp_target`], skipping already-visited enemies
pub fn lowest_hp_target_excluding(
    enemies: &[Enemy],
    origin: Vec2,
    max_dist: f32,
    view: &ViewRect,
    exclude: &HashSet<EntityId>,
) -> Option<usize> {
    let candidates = eligible_targets(enemies, origin, max_dist, view)
        .filter(|&i| !exclude.contains(&enemies[i].id));
    best_of(enemies, origin, candidates)
}

/// Any eligible enemy, uniformly at random
pub fn random_target_in_range<R: Rng + ?Sized>(
    enemies: &[Enemy],
    origin: Vec2,
    max_dist: f32,
    view: &ViewRect,
    rng: &mut R,
) -> Option<usize> {
    let candidates: Vec<usize> = eligible_targets(enemies, origin, max_dist, view).collect();
    pick_random(&candidates, rng).copied()
}

/// Uniform choice from a slice
pub fn pick_random<'a, T, R: Rng + ?Sized>(items: &'a [T], rng: &mut R) -> Option<&'a T> {
    if items.is_empty() {
        None
    } else {
        items.get(rng.random_range(0..items.len()))
    }
}

fn best_of(enemies: &[Enemy], origin: Vec2, candidates: impl Iterator<Item = usize>) -> Option<usize> {
    candidates.min_by(|&a, &b| {
        let (ea, eb) = (&enemies[a], &enemies[b]);
        ea.hp
            .partial_cmp(&eb.hp)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| {
                origin
                    .distance_squared(ea.pos)
                    .partial_cmp(&origin.distance_squared(eb.pos))
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
    })
}

/// Blend a velocity toward `target`, keeping its speed
///
/// The turn fraction is `clamp(strength * dt, 0, HOMING_STEER_CAP)`, so a
/// projectile curves into pursuit instead of snapping onto the target.
pub fn steer_toward(vel: Vec2, pos: Vec2, target: Vec2, strength: f32, dt: f32) -> Vec2 {
    let speed = vel.length();
    if speed <= 0.0 {
        return vel;
    }
    let current = vel / speed;
    let desired = safe_normalize(target - pos, current);
    let steer = (strength * dt).clamp(0.0, HOMING_STEER_CAP);
    let blended = current * (1.0 - steer) + desired * steer;
    safe_normalize(blended, current) * speed
}
