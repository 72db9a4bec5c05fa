//! Survivor Core - simulation core for a top-down arcade survival game
//!
//! Core modules:
//! - `sim`: Frame-stepped simulation (world, entities, combat, weapons, director)
//! - `difficulty`: Difficulty presets and tunable multipliers
//! - `records`: Best-time persistence
//! - `error`: Crate error type

pub mod difficulty;
pub mod error;
pub mod records;
pub mod sim;

pub use difficulty::{DifficultyPreset, DifficultyProfile};
pub use error::{Result, SimError};
pub use records::BestTime;

use glam::Vec2;
use rand::Rng;

/// Game configuration constants
pub mod consts {
    /// Largest frame delta the step will accept (seconds)
    pub const MAX_FRAME_DT: f32 = 1.0 / 20.0;

    /// Default viewport used for on-screen targeting until the host reports one
    pub const DEFAULT_VIEW_WIDTH: f32 = 1280.0;
    pub const DEFAULT_VIEW_HEIGHT: f32 = 720.0;
    /// Extra margin around the visible rectangle for targeting
    pub const VIEW_MARGIN: f32 = 24.0;

    /// Player defaults
    pub const PLAYER_RADIUS: f32 = 14.0;
    pub const PLAYER_HP: f32 = 100.0;
    pub const PLAYER_SPEED: f32 = 220.0;
    pub const PLAYER_CRIT_CHANCE: f32 = 0.05;
    pub const PLAYER_CRIT_MULT: f32 = 1.6;
    /// Invulnerability after taking a hit
    pub const PLAYER_IFRAMES: f32 = 0.45;
    pub const DASH_DURATION: f32 = 0.18;
    pub const DASH_COOLDOWN: f32 = 1.0;
    pub const DASH_SPEED_MULT: f32 = 2.2;
    /// Base pickup attraction radius (scaled by magnet stat)
    pub const MAGNET_RADIUS: f32 = 90.0;

    /// Enemy spawn ring and despawn distance (relative to player)
    pub const SPAWN_RADIUS: f32 = 520.0;
    pub const SPAWN_RADIUS_INNER: f32 = SPAWN_RADIUS * 0.8;
    pub const DESPAWN_RADIUS: f32 = 900.0;

    /// Contact damage cooldown per enemy
    pub const ENEMY_HIT_COOLDOWN: f32 = 0.55;
    /// Maximum slow an enemy can carry
    pub const ENEMY_MAX_SLOW: f32 = 0.6;
    pub const ENEMY_SLOW_DECAY: f32 = 0.8;

    /// Damage pipeline
    pub const MIN_DAMAGE: f32 = 0.1;
    pub const CRIT_CHANCE_CAP: f32 = 0.75;
    pub const HEAL_DROP_CHANCE: f32 = 0.02;
    pub const HEAL_DROP_VALUE: f32 = 18.0;

    /// Experience curve
    pub const XP_BASE: f32 = 10.0;
    pub const XP_GROWTH: f32 = 4.8;
    pub const XP_FLOOR: u32 = 5;

    /// Lifetime of cosmetic effect records
    pub const EFFECT_LIFETIME: f32 = 0.35;
}

/// Normalize a vector, substituting `fallback` when it has no usable length
#[inline]
pub fn safe_normalize(v: Vec2, fallback: Vec2) -> Vec2 {
    let len = v.length();
    if len > 1e-6 && len.is_finite() {
        v / len
    } else {
        fallback
    }
}

/// Direction from `from` toward `to`, pointing +X when the points coincide
#[inline]
pub fn direction_to(from: Vec2, to: Vec2) -> Vec2 {
    safe_normalize(to - from, Vec2::X)
}

/// Unit vector for an angle in radians
#[inline]
pub fn from_angle(theta: f32) -> Vec2 {
    Vec2::new(theta.cos(), theta.sin())
}

/// Uniform float in `[lo, hi)`, tolerating `lo == hi`
#[inline]
pub fn random_in_range<R: Rng + ?Sized>(rng: &mut R, lo: f32, hi: f32) -> f32 {
    if hi > lo {
        rng.random_range(lo..hi)
    } else {
        lo
    }
}
