//! Entity store: enemies, projectiles, pickups and cosmetic effects
//!
//! Systems never remove entities mid-frame. Enemies are flagged `dead`,
//! projectiles `expired`, pickups `collected`; `compact` drops them once
//! at the end of the step so every system sees full collections.

use std::collections::{HashSet, VecDeque};

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::difficulty::DifficultyProfile;

/// Stable identity of an entity for the lifetime of a run
pub type EntityId = u32;

/// Maximum cosmetic effect records kept at once
pub const MAX_EFFECTS: usize = 256;

/// Enemy types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnemyKind {
    Walker,
    Runner,
    Tank,
    Swarm,
    Elite,
    Boss,
}

/// Base stats of an enemy kind at time zero
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnemyStats {
    pub radius: f32,
    pub hp: f32,
    pub speed: f32,
    pub damage: f32,
    /// Experience drop range (inclusive)
    pub xp: (f32, f32),
}

/// Seconds of survival per +100% of a stat
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GrowthDenominators {
    pub hp: f32,
    pub speed: f32,
    pub damage: f32,
}

impl EnemyKind {
    pub fn stats(&self) -> EnemyStats {
        let (radius, hp, speed, damage, xp) = match self {
            EnemyKind::Walker => (14.0, 34.0, 78.0, 10.0, (1.0, 3.0)),
            EnemyKind::Runner => (12.0, 24.0, 120.0, 8.0, (1.0, 2.0)),
            EnemyKind::Tank => (20.0, 110.0, 52.0, 16.0, (3.0, 6.0)),
            EnemyKind::Swarm => (9.0, 12.0, 135.0, 5.0, (1.0, 1.0)),
            EnemyKind::Elite => (22.0, 320.0, 82.0, 20.0, (10.0, 16.0)),
            EnemyKind::Boss => (42.0, 4200.0, 64.0, 30.0, (80.0, 120.0)),
        };
        EnemyStats {
            radius,
            hp,
            speed,
            damage,
            xp,
        }
    }

    pub fn growth_denominators(&self) -> GrowthDenominators {
        match self {
            EnemyKind::Elite => GrowthDenominators {
                hp: 120.0,
                speed: 300.0,
                damage: 320.0,
            },
            EnemyKind::Boss => GrowthDenominators {
                hp: 180.0,
                speed: 420.0,
                damage: 480.0,
            },
            _ => GrowthDenominators {
                hp: 70.0,
                speed: 220.0,
                damage: 240.0,
            },
        }
    }

    /// Elites and bosses drop a reward container
    pub fn drops_container(&self) -> bool {
        matches!(self, EnemyKind::Elite | EnemyKind::Boss)
    }

    pub fn is_boss(&self) -> bool {
        matches!(self, EnemyKind::Boss)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EnemyKind::Walker => "walker",
            EnemyKind::Runner => "runner",
            EnemyKind::Tank => "tank",
            EnemyKind::Swarm => "swarm",
            EnemyKind::Elite => "elite",
            EnemyKind::Boss => "boss",
        }
    }
}

/// Linear-in-time stat multipliers `(hp, speed, damage)` for a kind
pub fn growth_multipliers(
    kind: EnemyKind,
    elapsed: f32,
    profile: &DifficultyProfile,
) -> (f32, f32, f32) {
    let t = elapsed.max(0.0);
    let d = kind.growth_denominators();
    (
        1.0 + t / d.hp * profile.enemy_hp_growth_mul,
        1.0 + t / d.speed * profile.enemy_speed_growth_mul,
        1.0 + t / d.damage * profile.enemy_damage_growth_mul,
    )
}

/// Independent attack timers carried only by bosses
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BossTimers {
    pub nova: f32,
    pub meteor: f32,
    pub lance: f32,
    pub summon: f32,
}

/// A hostile creature
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enemy {
    pub id: EntityId,
    pub kind: EnemyKind,
    pub pos: Vec2,
    pub radius: f32,
    pub hp: f32,
    pub hp_max: f32,
    pub speed: f32,
    /// Contact damage
    pub damage: f32,
    /// Time until contact damage may apply again
    pub hit_cooldown: f32,
    /// Transient slow (0 = none, capped when applied to movement)
    pub slow: f32,
    pub dead: bool,
    pub boss: Option<BossTimers>,
}

impl Enemy {
    /// Build an enemy with stats scaled for the current session time
    pub fn new(kind: EnemyKind, pos: Vec2, elapsed: f32, profile: &DifficultyProfile) -> Self {
        let base = kind.stats();
        let (hp_mul, speed_mul, damage_mul) = growth_multipliers(kind, elapsed, profile);
        let hp = base.hp * hp_mul;
        Self {
            id: 0,
            kind,
            pos,
            radius: base.radius,
            hp,
            hp_max: hp,
            speed: base.speed * speed_mul,
            damage: base.damage * damage_mul,
            hit_cooldown: 0.0,
            slow: 0.0,
            dead: false,
            boss: None,
        }
    }

    #[inline]
    pub fn is_alive(&self) -> bool {
        !self.dead
    }

    pub fn health_fraction(&self) -> f32 {
        if self.hp_max > 0.0 {
            (self.hp / self.hp_max).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    /// Raise (never stack) the slow factor
    #[inline]
    pub fn apply_slow(&mut self, slow: f32) {
        self.slow = self.slow.max(slow);
    }
}

/// Projectile behaviour; each variant carries only the state it needs
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ProjectileKind {
    /// Straight flight
    Linear,
    /// Curves toward the best target each frame
    Homing { strength: f32 },
    /// Jumps to a new target after each hit
    Chain { jumps_left: u32, range: f32 },
    /// Stationary; detonates as an area effect when the fuse runs out
    Bomb { fuse: f32, blast_radius: f32, slow: f32 },
    /// Stationary damage-over-time pool
    Zone { dps: f32, slow: f32 },
    /// Boss bullet that hurts the player
    HostileBolt,
    /// Boss impact marker that hurts the player on detonation
    HostileMeteor { fuse: f32, blast_radius: f32 },
}

impl ProjectileKind {
    pub fn is_hostile(&self) -> bool {
        matches!(
            self,
            ProjectileKind::HostileBolt | ProjectileKind::HostileMeteor { .. }
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectileKind::Linear => "linear",
            ProjectileKind::Homing { .. } => "homing",
            ProjectileKind::Chain { .. } => "chain",
            ProjectileKind::Bomb { .. } => "bomb",
            ProjectileKind::Zone { .. } => "zone",
            ProjectileKind::HostileBolt => "hostile_bolt",
            ProjectileKind::HostileMeteor { .. } => "hostile_meteor",
        }
    }
}

/// A projectile or placed effect
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Projectile {
    pub id: EntityId,
    pub kind: ProjectileKind,
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    pub damage: f32,
    /// Remaining enemies this projectile may hit
    pub pierce: u32,
    /// Seconds until expiry
    pub ttl: f32,
    /// Slow applied to enemies on contact
    pub slow_on_hit: f32,
    /// Enemies already damaged (a projectile never hits the same enemy twice)
    pub hit: HashSet<EntityId>,
    pub expired: bool,
}

impl Projectile {
    pub fn new(kind: ProjectileKind, pos: Vec2, vel: Vec2, radius: f32, damage: f32) -> Self {
        Self {
            id: 0,
            kind,
            pos,
            vel,
            radius,
            damage,
            pierce: 1,
            ttl: 1.0,
            slow_on_hit: 0.0,
            hit: HashSet::new(),
            expired: false,
        }
    }

    pub fn with_pierce(mut self, pierce: u32) -> Self {
        self.pierce = pierce;
        self
    }

    pub fn with_ttl(mut self, ttl: f32) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_slow(mut self, slow: f32) -> Self {
        self.slow_on_hit = slow;
        self
    }
}

/// Collectible types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PickupKind {
    Xp,
    Heal,
    /// Reward container (opens a reward selection)
    Chest,
}

/// A collectible on the ground
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pickup {
    pub id: EntityId,
    pub kind: PickupKind,
    pub pos: Vec2,
    pub radius: f32,
    pub value: f32,
    /// Seconds on the ground; zero means dropped this frame
    pub age: f32,
    pub collected: bool,
}

impl Pickup {
    pub fn new(kind: PickupKind, pos: Vec2, value: f32) -> Self {
        let radius = match kind {
            PickupKind::Xp => 6.0,
            PickupKind::Heal => 10.0,
            PickupKind::Chest => 14.0,
        };
        Self {
            id: 0,
            kind,
            pos,
            radius,
            value,
            age: 0.0,
            collected: false,
        }
    }
}

/// Cosmetic effect kinds (no gameplay weight)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum EffectKind {
    Hit,
    Crit,
    Hurt,
    Death,
    Explosion { radius: f32 },
    LevelUp,
}

/// A cosmetic effect record forwarded to the renderer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Effect {
    pub kind: EffectKind,
    pub pos: Vec2,
    pub age: f32,
    pub lifetime: f32,
}

/// All live entities of a run
#[derive(Debug, Clone)]
pub struct EntityStore {
    pub enemies: Vec<Enemy>,
    pub projectiles: Vec<Projectile>,
    pub pickups: Vec<Pickup>,
    pub effects: VecDeque<Effect>,
    next_id: EntityId,
}

impl Default for EntityStore {
    fn default() -> Self {
        Self {
            enemies: Vec::new(),
            projectiles: Vec::new(),
            pickups: Vec::new(),
            effects: VecDeque::new(),
            next_id: 1,
        }
    }
}

impl EntityStore {
    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> EntityId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn add_enemy(&mut self, mut enemy: Enemy) -> EntityId {
        enemy.id = self.next_entity_id();
        let id = enemy.id;
        self.enemies.push(enemy);
        id
    }

    pub fn add_projectile(&mut self, mut projectile: Projectile) -> EntityId {
        projectile.id = self.next_entity_id();
        let id = projectile.id;
        self.projectiles.push(projectile);
        id
    }

    pub fn add_pickup(&mut self, mut pickup: Pickup) -> EntityId {
        pickup.id = self.next_entity_id();
        let id = pickup.id;
        self.pickups.push(pickup);
        id
    }

    /// Add a cosmetic effect, dropping the oldest when full
    pub fn add_effect(&mut self, kind: EffectKind, pos: Vec2, lifetime: f32) {
        if self.effects.len() >= MAX_EFFECTS {
            self.effects.pop_front();
        }
        self.effects.push_back(Effect {
            kind,
            pos,
            age: 0.0,
            lifetime,
        });
    }

    pub fn alive_enemies(&self) -> impl Iterator<Item = &Enemy> {
        self.enemies.iter().filter(|e| e.is_alive())
    }

    pub fn alive_enemy_count(&self) -> usize {
        self.alive_enemies().count()
    }

    pub fn boss_alive(&self) -> bool {
        self.alive_enemies().any(|e| e.kind.is_boss())
    }

    pub fn enemy_index(&self, id: EntityId) -> Option<usize> {
        self.enemies.iter().position(|e| e.id == id)
    }

    /// End-of-frame removal of dead, expired and collected entities
    pub fn compact(&mut self) {
        self.enemies.retain(|e| !e.dead);
        self.projectiles.retain(|p| !p.expired);
        self.pickups.retain(|p| !p.collected);
        self.effects.retain(|f| f.age < f.lifetime);
    }
}
