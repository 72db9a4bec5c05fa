//! Procedural world: chunked obstacle placement and landmarks
//!
//! The plane is split into square chunks. A chunk's obstacles are derived
//! only from its integer coordinate and the world seed, generated on first
//! query and cached for the rest of the session.

use std::collections::HashMap;

use glam::{IVec2, Vec2};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::collision::{circles_overlap, push_out};
use super::targeting::ViewRect;

/// Side length of a world chunk
pub const CHUNK_SIZE: f32 = 512.0;
/// Extra spacing between obstacles placed in the same chunk
pub const OBSTACLE_MARGIN: f32 = 12.0;
/// No obstacle may be generated this close to the world origin
pub const ORIGIN_CLEAR_RADIUS: f32 = 200.0;
/// Speed multiplier while inside slowing terrain
pub const SLOW_TERRAIN_MULT: f32 = 0.55;
/// Landmarks are discovered within radius + this margin
pub const LANDMARK_DISCOVERY_MARGIN: f32 = 60.0;
/// World seed used when the host does not pick one
pub const DEFAULT_WORLD_SEED: u32 = 0x5EED_2024;

const MIN_OBSTACLES_PER_CHUNK: u32 = 3;
const MAX_OBSTACLES_PER_CHUNK: u32 = 8;
const PLACEMENT_ATTEMPTS_PER_OBSTACLE: u32 = 6;

/// Obstacle types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObstacleKind {
    /// Blocking decorative terrain (rocks, trees)
    Rock,
    /// Blocking structural terrain (ruined walls, pillars)
    Wall,
    /// Non-blocking terrain that slows movement
    Mud,
}

impl ObstacleKind {
    /// Whether bodies are pushed out of this obstacle
    pub fn blocks(&self) -> bool {
        !matches!(self, ObstacleKind::Mud)
    }

    fn radius_range(&self) -> (f32, f32) {
        match self {
            ObstacleKind::Rock => (16.0, 34.0),
            ObstacleKind::Wall => (26.0, 46.0),
            ObstacleKind::Mud => (40.0, 72.0),
        }
    }

    /// Weighted roll: ~54% rock, ~28% wall, ~18% mud
    fn roll(roll: u32) -> Self {
        match roll {
            0..54 => ObstacleKind::Rock,
            54..82 => ObstacleKind::Wall,
            _ => ObstacleKind::Mud,
        }
    }
}

/// A generated obstacle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    pub pos: Vec2,
    pub radius: f32,
    pub kind: ObstacleKind,
}

/// A hand-placed point of interest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub name: String,
    pub pos: Vec2,
    pub radius: f32,
    pub discovered: bool,
}

impl Landmark {
    fn new(name: &str, x: f32, y: f32, radius: f32) -> Self {
        Self {
            name: name.to_string(),
            pos: Vec2::new(x, y),
            radius,
            discovered: false,
        }
    }
}

/// The fixed landmark list
pub fn default_landmarks() -> Vec<Landmark> {
    vec![
        Landmark::new("Sunken Obelisk", -1400.0, -900.0, 46.0),
        Landmark::new("Broken Watchtower", 1650.0, 400.0, 52.0),
        Landmark::new("Old Well", 300.0, 2100.0, 36.0),
        Landmark::new("Bone Circle", -2300.0, 1500.0, 60.0),
        Landmark::new("Ember Shrine", 2600.0, -2400.0, 48.0),
    ]
}

/// Chunk coordinate containing a world position
#[inline]
pub fn chunk_of(pos: Vec2) -> IVec2 {
    IVec2::new(
        (pos.x / CHUNK_SIZE).floor() as i32,
        (pos.y / CHUNK_SIZE).floor() as i32,
    )
}

/// Reproducible 32-bit hash of a chunk coordinate
pub fn chunk_hash(coord: IVec2, seed: u32) -> u32 {
    let mut h = (coord.x as u32).wrapping_mul(0x8DA6_B343)
        ^ (coord.y as u32).wrapping_mul(0xD816_3841)
        ^ seed.wrapping_mul(0xCB1A_B31F);
    // Murmur3 finalizer for avalanche
    h ^= h >> 16;
    h = h.wrapping_mul(0x85EB_CA6B);
    h ^= h >> 13;
    h = h.wrapping_mul(0xC2B2_AE35);
    h ^= h >> 16;
    h
}

/// Generate the obstacles of one chunk (pure function of coord + seed)
pub fn generate_chunk(coord: IVec2, seed: u32, landmarks: &[Landmark]) -> Vec<Obstacle> {
    let mut rng = Pcg32::seed_from_u64(chunk_hash(coord, seed) as u64);
    let origin = coord.as_vec2() * CHUNK_SIZE;
    let target = rng.random_range(MIN_OBSTACLES_PER_CHUNK..=MAX_OBSTACLES_PER_CHUNK);

    let mut placed: Vec<Obstacle> = Vec::with_capacity(target as usize);
    let mut attempts = 0;
    while (placed.len() as u32) < target && attempts < target * PLACEMENT_ATTEMPTS_PER_OBSTACLE {
        attempts += 1;

        let kind = ObstacleKind::roll(rng.random_range(0..100));
        let (r_min, r_max) = kind.radius_range();
        let radius = rng.random_range(r_min..r_max);
        let pos = origin
            + Vec2::new(
                rng.random_range(radius..CHUNK_SIZE - radius),
                rng.random_range(radius..CHUNK_SIZE - radius),
            );

        if pos.length() < ORIGIN_CLEAR_RADIUS + radius {
            continue;
        }
        let overlaps = placed
            .iter()
            .any(|o| pos.distance(o.pos) < o.radius + radius + OBSTACLE_MARGIN);
        let on_landmark = landmarks
            .iter()
            .any(|l| pos.distance(l.pos) < l.radius + radius + OBSTACLE_MARGIN);
        if overlaps || on_landmark {
            continue;
        }

        placed.push(Obstacle { pos, radius, kind });
    }

    placed
}

/// Lazily generated, cached world
#[derive(Debug, Clone)]
pub struct World {
    seed: u32,
    chunks: HashMap<IVec2, Vec<Obstacle>>,
    pub landmarks: Vec<Landmark>,
}

impl Default for World {
    fn default() -> Self {
        Self::new(DEFAULT_WORLD_SEED)
    }
}

impl World {
    pub fn new(seed: u32) -> Self {
        Self {
            seed,
            chunks: HashMap::new(),
            landmarks: default_landmarks(),
        }
    }

    /// Number of chunks generated so far
    pub fn generated_chunks(&self) -> usize {
        self.chunks.len()
    }

    /// Obstacles of a chunk, generating it on first access
    pub fn chunk(&mut self, coord: IVec2) -> &[Obstacle] {
        let seed = self.seed;
        let landmarks = &self.landmarks;
        self.chunks.entry(coord).or_insert_with(|| {
            let obstacles = generate_chunk(coord, seed, landmarks);
            log::debug!(
                "Generated chunk ({}, {}) with {} obstacles",
                coord.x,
                coord.y,
                obstacles.len()
            );
            obstacles
        })
    }

    /// All obstacles within `chunk_radius` chunks of `pos`
    pub fn obstacles_near(&mut self, pos: Vec2, chunk_radius: i32) -> Vec<Obstacle> {
        let center = chunk_of(pos);
        let mut out = Vec::new();
        for dy in -chunk_radius..=chunk_radius {
            for dx in -chunk_radius..=chunk_radius {
                out.extend_from_slice(self.chunk(center + IVec2::new(dx, dy)));
            }
        }
        out
    }

    /// Obstacles of already generated chunks that show inside `view`
    pub fn generated_obstacles_in(&self, view: &ViewRect) -> Vec<Obstacle> {
        let half = view.size * 0.5;
        let (lo, hi) = (chunk_of(view.center - half), chunk_of(view.center + half));
        let mut out = Vec::new();
        for y in lo.y..=hi.y {
            for x in lo.x..=hi.x {
                if let Some(chunk) = self.chunks.get(&IVec2::new(x, y)) {
                    out.extend(chunk.iter().filter(|o| view.contains(o.pos, o.radius)));
                }
            }
        }
        out
    }

    /// Whether a circle at `pos` overlaps any blocking obstacle or landmark
    pub fn is_blocked(&mut self, pos: Vec2, radius: f32) -> bool {
        let landmark_hit = self
            .landmarks
            .iter()
            .any(|l| circles_overlap(pos, radius, l.pos, l.radius));
        landmark_hit
            || self
                .obstacles_near(pos, 1)
                .iter()
                .any(|o| o.kind.blocks() && circles_overlap(pos, radius, o.pos, o.radius))
    }

    /// Movement speed multiplier from slowing terrain at `pos`
    pub fn terrain_speed_mul(&mut self, pos: Vec2, radius: f32) -> f32 {
        let in_mud = self
            .obstacles_near(pos, 1)
            .iter()
            .any(|o| !o.kind.blocks() && pos.distance(o.pos) < o.radius + radius * 0.5);
        if in_mud { SLOW_TERRAIN_MULT } else { 1.0 }
    }

    /// Push a circle out of every blocking obstacle and landmark it overlaps
    pub fn resolve_blocking(&mut self, mut pos: Vec2, radius: f32) -> Vec2 {
        for obstacle in self.obstacles_near(pos, 1) {
            if !obstacle.kind.blocks() {
                continue;
            }
            pos = push_out(pos, radius, obstacle.pos, obstacle.radius);
        }
        for landmark in &self.landmarks {
            pos = push_out(pos, radius, landmark.pos, landmark.radius);
        }
        pos
    }

    /// Mark landmarks the player just reached; returns their indices
    pub fn discover_landmarks(&mut self, player_pos: Vec2) -> Vec<usize> {
        let mut found = Vec::new();
        for (i, landmark) in self.landmarks.iter_mut().enumerate() {
            if landmark.discovered {
                continue;
            }
            if player_pos.distance(landmark.pos) <= landmark.radius + LANDMARK_DISCOVERY_MARGIN {
                landmark.discovered = true;
                log::debug!("Landmark discovered: {}", landmark.name);
                found.push(i);
            }
        }
        found
    }
}
