//! Weapons and passives
//!
//! Weapon kinds are a closed enum; each kind maps to a static descriptor
//! (cooldown curve, fire style, evolution) and a per-level fire profile.
//! Aura and orbit weapons never emit projectiles; the step re-derives
//! their profile from the level every frame.

use std::collections::BTreeMap;
use std::f32::consts::TAU;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::state::{Player, SimulationState};
use super::store::{Projectile, ProjectileKind};
use super::targeting;
use crate::{direction_to, from_angle, random_in_range};

/// Re-arm delay when a targeted weapon finds nothing to shoot
pub const NO_TARGET_GRACE: f32 = 0.15;
/// Effective cooldown never drops below this
pub const MIN_COOLDOWN: f32 = 0.08;

/// How a weapon delivers damage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FireStyle {
    /// Fan of straight projectiles at the target
    Volley,
    /// Homing bolts
    Homing,
    /// Continuous damage ring around the player
    Aura,
    /// Orbiting damage bodies
    Orbit,
    /// Delayed strikes on random enemies in range
    Strike,
    /// Bolt that jumps between targets
    Chain,
    /// Damage pools dropped on enemies
    Zone,
}

impl FireStyle {
    /// Per-frame styles are handled by the step, not by cooldown firing
    pub fn is_continuous(&self) -> bool {
        matches!(self, FireStyle::Aura | FireStyle::Orbit)
    }
}

/// Passive upgrades
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PassiveKind {
    MaxHp,
    Speed,
    Damage,
    Cooldown,
    Area,
    Regen,
    Magnet,
    Armor,
    ProjSpeed,
    Luck,
}

impl PassiveKind {
    pub const ALL: [PassiveKind; 10] = [
        PassiveKind::MaxHp,
        PassiveKind::Speed,
        PassiveKind::Damage,
        PassiveKind::Cooldown,
        PassiveKind::Area,
        PassiveKind::Regen,
        PassiveKind::Magnet,
        PassiveKind::Armor,
        PassiveKind::ProjSpeed,
        PassiveKind::Luck,
    ];

    pub fn max_level(&self) -> u32 {
        match self {
            PassiveKind::Armor => 3,
            _ => 5,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            PassiveKind::MaxHp => "Vitality",
            PassiveKind::Speed => "Swiftness",
            PassiveKind::Damage => "Might",
            PassiveKind::Cooldown => "Haste",
            PassiveKind::Area => "Reach",
            PassiveKind::Regen => "Recovery",
            PassiveKind::Magnet => "Attraction",
            PassiveKind::Armor => "Armor",
            PassiveKind::ProjSpeed => "Velocity",
            PassiveKind::Luck => "Precision",
        }
    }

    pub fn describe(&self) -> &'static str {
        match self {
            PassiveKind::MaxHp => "Max HP +12%.",
            PassiveKind::Speed => "Move speed +10%.",
            PassiveKind::Damage => "Damage +12%.",
            PassiveKind::Cooldown => "Cooldowns -8%.",
            PassiveKind::Area => "Area +12%.",
            PassiveKind::Regen => "Regenerate +0.6 HP per second.",
            PassiveKind::Magnet => "Pickup range +18%.",
            PassiveKind::Armor => "Incoming hits -1 damage.",
            PassiveKind::ProjSpeed => "Projectile speed +12%.",
            PassiveKind::Luck => "Critical chance +3%, critical damage +5%.",
        }
    }

    /// Apply one level of this passive to the player
    pub fn apply(&self, player: &mut Player) {
        match self {
            PassiveKind::MaxHp => {
                let old_max = player.hp_max;
                player.hp_max = (player.hp_max * 1.12).round();
                player.heal(player.hp_max - old_max);
            }
            PassiveKind::Speed => player.speed_mul *= 1.10,
            PassiveKind::Damage => player.damage_mul *= 1.12,
            PassiveKind::Cooldown => player.cooldown_mul *= 0.92,
            PassiveKind::Area => player.area_mul *= 1.12,
            PassiveKind::Regen => player.regen += 0.6,
            PassiveKind::Magnet => player.magnet *= 1.18,
            PassiveKind::Armor => player.armor += 1.0,
            PassiveKind::ProjSpeed => player.proj_speed_mul *= 1.12,
            PassiveKind::Luck => {
                player.crit_chance += 0.03;
                player.crit_mult *= 1.05;
            }
        }
    }
}

/// Weapon types (base weapons followed by their evolutions)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum WeaponKind {
    Knife,
    Wand,
    Garlic,
    Orbit,
    Thunder,
    Chain,
    HolyWater,
    BladeStorm,
    ArcaneBarrage,
    SoulDrain,
    StarRing,
}

/// Static description of a weapon kind
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeaponDescriptor {
    pub name: &'static str,
    pub tag: &'static str,
    pub style: FireStyle,
    pub max_level: u32,
    /// Cooldown at level 1 (seconds)
    pub base_cooldown: f32,
    /// Fractional cooldown reduction per level
    pub cooldown_step: f32,
    /// Targeting reach
    pub range: f32,
    /// Evolved form and the passive it requires
    pub evolution: Option<(WeaponKind, PassiveKind)>,
}

/// Projectile emission parameters for one weapon level, before player stats
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FireProfile {
    pub damage: f32,
    pub count: u32,
    /// Angle between neighbouring projectiles (radians)
    pub spread: f32,
    pub speed: f32,
    pub pierce: u32,
    pub ttl: f32,
    pub radius: f32,
}

/// Continuous aura parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AuraProfile {
    pub radius: f32,
    pub dps: f32,
    pub slow: f32,
    /// Fraction of damage dealt returned to the player as health
    pub lifesteal: f32,
}

/// Orbiting body parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitProfile {
    pub count: u32,
    /// Distance of orbiters from the player
    pub radius: f32,
    /// Radians per second
    pub angular_speed: f32,
    pub dps: f32,
    pub body_radius: f32,
}

impl WeaponKind {
    pub const BASE: [WeaponKind; 7] = [
        WeaponKind::Knife,
        WeaponKind::Wand,
        WeaponKind::Garlic,
        WeaponKind::Orbit,
        WeaponKind::Thunder,
        WeaponKind::Chain,
        WeaponKind::HolyWater,
    ];

    pub fn descriptor(&self) -> WeaponDescriptor {
        use FireStyle::*;
        let (name, tag, style, max_level, base_cooldown, cooldown_step, range, evolution) =
            match self {
                WeaponKind::Knife => (
                    "Knife",
                    "Straight · Single",
                    Volley,
                    8,
                    0.85,
                    0.05,
                    620.0,
                    Some((WeaponKind::BladeStorm, PassiveKind::ProjSpeed)),
                ),
                WeaponKind::Wand => (
                    "Magic Wand",
                    "Auto · Homing",
                    Homing,
                    8,
                    1.05,
                    0.04,
                    620.0,
                    Some((WeaponKind::ArcaneBarrage, PassiveKind::Cooldown)),
                ),
                WeaponKind::Garlic => (
                    "Garlic",
                    "Area · Close",
                    Aura,
                    8,
                    0.0,
                    0.0,
                    0.0,
                    Some((WeaponKind::SoulDrain, PassiveKind::MaxHp)),
                ),
                WeaponKind::Orbit => (
                    "Orbiting Runes",
                    "Orbit · Multi-hit",
                    Orbit,
                    8,
                    0.0,
                    0.0,
                    0.0,
                    Some((WeaponKind::StarRing, PassiveKind::Area)),
                ),
                WeaponKind::Thunder => (
                    "Thunder",
                    "Strike · Area",
                    Strike,
                    8,
                    2.4,
                    0.06,
                    560.0,
                    None,
                ),
                WeaponKind::Chain => (
                    "Chain Lightning",
                    "Bounce · Multi",
                    Chain,
                    6,
                    1.6,
                    0.05,
                    480.0,
                    None,
                ),
                WeaponKind::HolyWater => (
                    "Holy Water",
                    "Zone · Damage over time",
                    Zone,
                    7,
                    3.2,
                    0.05,
                    420.0,
                    None,
                ),
                WeaponKind::BladeStorm => (
                    "Blade Storm",
                    "Evolved · Volley",
                    Volley,
                    1,
                    0.55,
                    0.0,
                    660.0,
                    None,
                ),
                WeaponKind::ArcaneBarrage => (
                    "Arcane Barrage",
                    "Evolved · Homing",
                    Homing,
                    1,
                    0.7,
                    0.0,
                    660.0,
                    None,
                ),
                WeaponKind::SoulDrain => (
                    "Soul Drain",
                    "Evolved · Aura",
                    Aura,
                    1,
                    0.0,
                    0.0,
                    0.0,
                    None,
                ),
                WeaponKind::StarRing => (
                    "Star Ring",
                    "Evolved · Orbit",
                    Orbit,
                    1,
                    0.0,
                    0.0,
                    0.0,
                    None,
                ),
            };
        WeaponDescriptor {
            name,
            tag,
            style,
            max_level,
            base_cooldown,
            cooldown_step,
            range,
            evolution,
        }
    }

    pub fn name(&self) -> &'static str {
        self.descriptor().name
    }

    pub fn max_level(&self) -> u32 {
        self.descriptor().max_level
    }

    pub fn is_evolved(&self) -> bool {
        Self::BASE.iter().all(|base| base != self)
    }

    /// Evolved form and required passive, for base weapons that have one
    pub fn evolution(&self) -> Option<(WeaponKind, PassiveKind)> {
        self.descriptor().evolution
    }

    /// Cooldown at a level before player and rage modifiers
    pub fn base_cooldown_at(&self, level: u32) -> f32 {
        let d = self.descriptor();
        let steps = level.saturating_sub(1) as f32;
        d.base_cooldown * (1.0 - d.cooldown_step * steps).max(0.3)
    }

    /// Emission profile at a level (base damage, before player multipliers)
    pub fn profile(&self, level: u32) -> FireProfile {
        let l = level.max(1);
        let lf = l as f32;
        match self {
            WeaponKind::Knife => FireProfile {
                damage: 14.0 + 5.0 * lf,
                count: 1 + u32::from(l >= 4) + u32::from(l >= 7),
                spread: 0.14,
                speed: 520.0,
                pierce: if l >= 6 { 2 } else { 1 },
                ttl: 1.2,
                radius: 4.0,
            },
            WeaponKind::Wand => FireProfile {
                damage: 18.0 + 6.0 * lf,
                count: 1 + u32::from(l >= 3) + u32::from(l >= 6),
                spread: 0.0,
                speed: 260.0,
                pierce: 1 + u32::from(l >= 7),
                ttl: 2.2,
                radius: 5.0,
            },
            WeaponKind::Thunder => FireProfile {
                damage: 30.0 + 9.0 * lf,
                count: 1 + u32::from(l >= 3) + u32::from(l >= 5) + u32::from(l >= 8),
                spread: 0.0,
                speed: 0.0,
                pierce: 1,
                ttl: 0.35,
                radius: 46.0 + 4.0 * lf,
            },
            WeaponKind::Chain => FireProfile {
                damage: 16.0 + 6.0 * lf,
                count: 1,
                spread: 0.0,
                speed: 700.0,
                pierce: 3 + l / 2,
                ttl: 1.5,
                radius: 5.0,
            },
            WeaponKind::HolyWater => FireProfile {
                damage: 14.0 + 5.0 * lf,
                count: 1 + u32::from(l >= 4) + u32::from(l >= 7),
                spread: 0.0,
                speed: 0.0,
                pierce: 1,
                ttl: 2.0 + 0.15 * lf,
                radius: 40.0 + 4.0 * lf,
            },
            WeaponKind::BladeStorm => FireProfile {
                damage: 60.0,
                count: 7,
                spread: 0.12,
                speed: 640.0,
                pierce: 3,
                ttl: 1.4,
                radius: 5.0,
            },
            WeaponKind::ArcaneBarrage => FireProfile {
                damage: 55.0,
                count: 6,
                spread: 0.0,
                speed: 320.0,
                pierce: 2,
                ttl: 2.6,
                radius: 6.0,
            },
            WeaponKind::Garlic
            | WeaponKind::Orbit
            | WeaponKind::SoulDrain
            | WeaponKind::StarRing => FireProfile {
                damage: 0.0,
                count: 0,
                spread: 0.0,
                speed: 0.0,
                pierce: 0,
                ttl: 0.0,
                radius: 0.0,
            },
        }
    }

    /// Homing strength for homing weapons
    fn homing_strength(&self, level: u32) -> f32 {
        match self {
            WeaponKind::ArcaneBarrage => 2.2,
            _ => 0.9 + level as f32 * 0.08,
        }
    }

    /// Text for reward panels
    pub fn describe(&self, level: u32) -> String {
        match self {
            WeaponKind::Knife => format!("Throws knives at the weakest nearby enemy (level {level})."),
            WeaponKind::Wand => format!("Fires homing bolts (level {level})."),
            WeaponKind::Garlic => format!("Damaging aura around you (level {level})."),
            WeaponKind::Orbit => format!("Runes circle you and strike enemies (level {level})."),
            WeaponKind::Thunder => format!("Calls lightning on random enemies (level {level})."),
            WeaponKind::Chain => format!("A bolt that jumps between enemies (level {level})."),
            WeaponKind::HolyWater => format!("Leaves burning pools under enemies (level {level})."),
            WeaponKind::BladeStorm => "A storm of piercing blades.".to_string(),
            WeaponKind::ArcaneBarrage => "Relentless seeking missiles.".to_string(),
            WeaponKind::SoulDrain => "A vast aura that feeds on the enemies it burns.".to_string(),
            WeaponKind::StarRing => "A wide ring of fast stars.".to_string(),
        }
    }
}

/// Aura profile for a weapon level, if the weapon is an aura
pub fn aura_profile(kind: WeaponKind, level: u32, player: &Player) -> Option<AuraProfile> {
    let lf = level.max(1) as f32;
    match kind {
        WeaponKind::Garlic => Some(AuraProfile {
            radius: (58.0 + 7.0 * lf) * player.area_mul,
            dps: (8.0 + 4.0 * lf) * 4.2 * player.damage_mul,
            slow: 0.25,
            lifesteal: 0.0,
        }),
        WeaponKind::SoulDrain => Some(AuraProfile {
            radius: 130.0 * player.area_mul,
            dps: 100.0 * player.damage_mul,
            slow: 0.35,
            lifesteal: 0.02,
        }),
        _ => None,
    }
}

/// Orbit profile for a weapon level, if the weapon orbits
pub fn orbit_profile(kind: WeaponKind, level: u32, player: &Player) -> Option<OrbitProfile> {
    let l = level.max(1);
    match kind {
        WeaponKind::Orbit => Some(OrbitProfile {
            count: 1 + (l - 1) / 2,
            radius: 42.0 * player.area_mul,
            angular_speed: 1.6 + l as f32 * 0.08,
            dps: (10.0 + 3.0 * l as f32) * 7.0 * player.damage_mul,
            body_radius: 8.0,
        }),
        WeaponKind::StarRing => Some(OrbitProfile {
            count: 6,
            radius: 70.0 * player.area_mul,
            angular_speed: 2.6,
            dps: 150.0 * player.damage_mul,
            body_radius: 11.0,
        }),
        _ => None,
    }
}

/// Orbiter positions at a given session time
pub fn orbiter_positions(profile: &OrbitProfile, center: Vec2, elapsed: f32) -> Vec<Vec2> {
    (0..profile.count)
        .map(|i| {
            let theta = elapsed * profile.angular_speed + (i as f32 / profile.count as f32) * TAU;
            center + from_angle(theta) * profile.radius
        })
        .collect()
}

/// An owned weapon
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeaponSlot {
    pub level: u32,
    /// Seconds until the weapon fires again
    pub timer: f32,
}

/// Owned weapons and passive levels
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Arsenal {
    weapons: BTreeMap<WeaponKind, WeaponSlot>,
    passives: BTreeMap<PassiveKind, u32>,
}

impl Arsenal {
    pub fn weapons(&self) -> impl Iterator<Item = (WeaponKind, WeaponSlot)> + '_ {
        self.weapons.iter().map(|(k, s)| (*k, *s))
    }

    pub fn passives(&self) -> impl Iterator<Item = (PassiveKind, u32)> + '_ {
        self.passives.iter().map(|(k, l)| (*k, *l))
    }

    pub fn owns(&self, kind: WeaponKind) -> bool {
        self.weapons.contains_key(&kind)
    }

    /// Level of a weapon (0 when not owned)
    pub fn weapon_level(&self, kind: WeaponKind) -> u32 {
        self.weapons.get(&kind).map_or(0, |s| s.level)
    }

    pub fn passive_level(&self, kind: PassiveKind) -> u32 {
        self.passives.get(&kind).copied().unwrap_or(0)
    }

    /// Unowned → level 1. Returns false if already owned.
    pub fn add_weapon(&mut self, kind: WeaponKind) -> bool {
        if self.owns(kind) {
            return false;
        }
        self.weapons.insert(kind, WeaponSlot { level: 1, timer: 0.0 });
        true
    }

    /// Level L → L+1, capped at the weapon maximum. Returns false when capped or unowned.
    pub fn upgrade_weapon(&mut self, kind: WeaponKind) -> bool {
        match self.weapons.get_mut(&kind) {
            Some(slot) if slot.level < kind.max_level() => {
                slot.level += 1;
                true
            }
            _ => false,
        }
    }

    pub fn can_upgrade_weapon(&self, kind: WeaponKind) -> bool {
        self.owns(kind) && self.weapon_level(kind) < kind.max_level()
    }

    /// Raise a passive one level and apply it. Returns false at the cap.
    pub fn upgrade_passive(&mut self, kind: PassiveKind, player: &mut Player) -> bool {
        let level = self.passives.entry(kind).or_insert(0);
        if *level >= kind.max_level() {
            return false;
        }
        *level += 1;
        kind.apply(player);
        true
    }

    /// Evolved form available for a base weapon right now
    pub fn evolution_ready(&self, base: WeaponKind) -> Option<WeaponKind> {
        let (evolved, passive) = base.evolution()?;
        let maxed = self.weapon_level(base) >= base.max_level();
        if maxed && self.passive_level(passive) >= 1 && !self.owns(evolved) {
            Some(evolved)
        } else {
            None
        }
    }

    /// All `(base, evolved)` pairs currently eligible
    pub fn ready_evolutions(&self) -> Vec<(WeaponKind, WeaponKind)> {
        self.weapons
            .keys()
            .filter_map(|base| self.evolution_ready(*base).map(|evolved| (*base, evolved)))
            .collect()
    }

    /// Replace a base weapon with its evolution. Returns the evolved kind.
    pub fn evolve(&mut self, base: WeaponKind) -> Option<WeaponKind> {
        let evolved = self.evolution_ready(base)?;
        self.weapons.remove(&base);
        self.weapons.insert(evolved, WeaponSlot { level: 1, timer: 0.0 });
        Some(evolved)
    }

    fn slot_mut(&mut self, kind: WeaponKind) -> Option<&mut WeaponSlot> {
        self.weapons.get_mut(&kind)
    }
}

/// Cooldown after player cooldown stat and rage fire-rate bonus
pub fn effective_cooldown(state: &SimulationState, kind: WeaponKind, level: u32) -> f32 {
    let fire_rate = state.rage.fire_rate_mul(&state.profile);
    (kind.base_cooldown_at(level) * state.player.cooldown_mul / fire_rate).max(MIN_COOLDOWN)
}

/// Tick every owned weapon's cooldown and fire the ones that are ready
pub fn fire_weapons(state: &mut SimulationState, dt: f32) {
    let owned: Vec<(WeaponKind, WeaponSlot)> = state.arsenal.weapons().collect();
    for (kind, slot) in owned {
        if kind.descriptor().style.is_continuous() {
            continue;
        }

        let timer = slot.timer - dt;
        let next_timer = if timer > 0.0 {
            timer
        } else if fire(state, kind, slot.level) {
            effective_cooldown(state, kind, slot.level)
        } else {
            NO_TARGET_GRACE
        };

        if let Some(slot) = state.arsenal.slot_mut(kind) {
            slot.timer = next_timer;
        }
    }
}

/// Emit one volley. Returns false when there was nothing to shoot at.
fn fire(state: &mut SimulationState, kind: WeaponKind, level: u32) -> bool {
    let d = kind.descriptor();
    let p = kind.profile(level);
    let origin = state.player.pos;
    let view = state.view_rect();
    let damage = p.damage * state.player.damage_mul;
    let speed = p.speed * state.player.proj_speed_mul;

    match d.style {
        FireStyle::Volley => {
            let Some(idx) = targeting::lowest_hp_target(&state.store.enemies, origin, d.range, &view)
            else {
                return false;
            };
            let aim = direction_to(origin, state.store.enemies[idx].pos);
            let base_angle = aim.y.atan2(aim.x);
            for i in 0..p.count {
                let offset = (i as f32 - (p.count - 1) as f32 / 2.0) * p.spread;
                let dir = from_angle(base_angle + offset);
                let projectile = Projectile::new(ProjectileKind::Linear, origin, dir * speed, p.radius, damage)
                    .with_pierce(p.pierce)
                    .with_ttl(p.ttl)
                    .with_slow(0.08);
                state.store.add_projectile(projectile);
            }
            true
        }
        FireStyle::Homing => {
            if targeting::lowest_hp_target(&state.store.enemies, origin, d.range, &view).is_none() {
                return false;
            }
            let strength = kind.homing_strength(level);
            for _ in 0..p.count {
                let dir = from_angle(random_in_range(&mut state.rng, 0.0, TAU));
                let projectile = Projectile::new(
                    ProjectileKind::Homing { strength },
                    origin + dir * 6.0,
                    dir * speed,
                    p.radius,
                    damage,
                )
                .with_pierce(p.pierce)
                .with_ttl(p.ttl)
                .with_slow(0.18);
                state.store.add_projectile(projectile);
            }
            true
        }
        FireStyle::Strike => {
            let mut struck = Vec::new();
            for _ in 0..p.count {
                let candidates: Vec<usize> = targeting::eligible_targets(&state.store.enemies, origin, d.range, &view)
                    .filter(|i| !struck.contains(i))
                    .collect();
                let Some(&idx) = targeting::pick_random(&candidates, &mut state.rng) else {
                    break;
                };
                struck.push(idx);
                let at = state.store.enemies[idx].pos;
                let projectile = Projectile::new(
                    ProjectileKind::Bomb {
                        fuse: p.ttl,
                        blast_radius: p.radius * state.player.area_mul,
                        slow: 0.3,
                    },
                    at,
                    Vec2::ZERO,
                    p.radius * state.player.area_mul,
                    damage,
                )
                .with_ttl(p.ttl + 0.1);
                state.store.add_projectile(projectile);
            }
            !struck.is_empty()
        }
        FireStyle::Chain => {
            let Some(idx) = targeting::lowest_hp_target(&state.store.enemies, origin, d.range, &view)
            else {
                return false;
            };
            let dir = direction_to(origin, state.store.enemies[idx].pos);
            let range = 180.0 + 10.0 * level as f32;
            let projectile = Projectile::new(
                ProjectileKind::Chain {
                    jumps_left: p.pierce - 1,
                    range,
                },
                origin,
                dir * speed,
                p.radius,
                damage,
            )
            .with_pierce(p.pierce)
            .with_ttl(p.ttl)
            .with_slow(0.1);
            state.store.add_projectile(projectile);
            true
        }
        FireStyle::Zone => {
            let mut placed = 0;
            for _ in 0..p.count {
                let Some(idx) = targeting::random_target_in_range(
                    &state.store.enemies,
                    origin,
                    d.range,
                    &view,
                    &mut state.rng,
                ) else {
                    break;
                };
                let jitter = from_angle(random_in_range(&mut state.rng, 0.0, TAU))
                    * random_in_range(&mut state.rng, 0.0, 24.0);
                let at = state.store.enemies[idx].pos + jitter;
                let projectile = Projectile::new(
                    ProjectileKind::Zone {
                        dps: damage,
                        slow: 0.2,
                    },
                    at,
                    Vec2::ZERO,
                    p.radius * state.player.area_mul,
                    damage,
                )
                .with_ttl(p.ttl);
                state.store.add_projectile(projectile);
                placed += 1;
            }
            placed > 0
        }
        FireStyle::Aura | FireStyle::Orbit => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::difficulty::DifficultyProfile;
    use crate::sim::store::{Enemy, EnemyKind};
    use proptest::prelude::*;

    fn state() -> SimulationState {
        SimulationState::with_seed(DifficultyProfile::default(), 0.0, 7)
    }

    #[test]
    fn test_add_and_upgrade_capped() {
        let mut arsenal = Arsenal::default();
        assert_eq!(arsenal.weapon_level(WeaponKind::Chain), 0);
        assert!(!arsenal.upgrade_weapon(WeaponKind::Chain));
        assert!(arsenal.add_weapon(WeaponKind::Chain));
        assert!(!arsenal.add_weapon(WeaponKind::Chain));
        for _ in 0..20 {
            arsenal.upgrade_weapon(WeaponKind::Chain);
        }
        assert_eq!(arsenal.weapon_level(WeaponKind::Chain), 6);
        assert!(!arsenal.can_upgrade_weapon(WeaponKind::Chain));
    }

    #[test]
    fn test_evolution_requirements() {
        let mut player = Player::default();
        let mut arsenal = Arsenal::default();
        arsenal.add_weapon(WeaponKind::Knife);
        for _ in 1..8 {
            arsenal.upgrade_weapon(WeaponKind::Knife);
        }
        assert_eq!(arsenal.weapon_level(WeaponKind::Knife), 8);
        // Required passive missing
        assert_eq!(arsenal.evolution_ready(WeaponKind::Knife), None);
        assert_eq!(arsenal.evolve(WeaponKind::Knife), None);

        arsenal.upgrade_passive(PassiveKind::ProjSpeed, &mut player);
        assert_eq!(arsenal.evolution_ready(WeaponKind::Knife), Some(WeaponKind::BladeStorm));
        assert_eq!(arsenal.evolve(WeaponKind::Knife), Some(WeaponKind::BladeStorm));
        assert!(!arsenal.owns(WeaponKind::Knife));
        assert_eq!(arsenal.weapon_level(WeaponKind::BladeStorm), 1);
        // Evolved weapons cannot level further
        assert!(!arsenal.upgrade_weapon(WeaponKind::BladeStorm));
        assert!(arsenal.ready_evolutions().is_empty());
    }

    #[test]
    fn test_passive_cap_and_effect() {
        let mut player = Player::default();
        let mut arsenal = Arsenal::default();
        for _ in 0..3 {
            assert!(arsenal.upgrade_passive(PassiveKind::Armor, &mut player));
        }
        assert!(!arsenal.upgrade_passive(PassiveKind::Armor, &mut player));
        assert_eq!(player.armor, 3.0);

        let hp_before = player.hp_max;
        arsenal.upgrade_passive(PassiveKind::MaxHp, &mut player);
        assert_eq!(player.hp_max, (hp_before * 1.12).round());
        assert!(player.hp <= player.hp_max);
    }

    #[test]
    fn test_evolved_kinds() {
        assert!(!WeaponKind::Knife.is_evolved());
        assert!(WeaponKind::StarRing.is_evolved());
        let evolving = WeaponKind::BASE.iter().filter(|k| k.evolution().is_some()).count();
        assert_eq!(evolving, 4);
    }

    #[test]
    fn test_no_target_uses_grace() {
        let mut s = state();
        s.arsenal = Arsenal::default();
        s.arsenal.add_weapon(WeaponKind::Knife);
        fire_weapons(&mut s, 0.016);
        assert!(s.store.projectiles.is_empty());
        assert_eq!(s.arsenal.weapons().next().map(|(_, slot)| slot.timer), Some(NO_TARGET_GRACE));
    }

    #[test]
    fn test_knife_fires_at_target_and_rearms() {
        let mut s = state();
        s.arsenal = Arsenal::default();
        s.arsenal.add_weapon(WeaponKind::Knife);
        let enemy = Enemy::new(EnemyKind::Walker, Vec2::new(100.0, 0.0), 0.0, &s.profile);
        s.store.add_enemy(enemy);

        fire_weapons(&mut s, 0.016);
        assert_eq!(s.store.projectiles.len(), 1);
        let proj = &s.store.projectiles[0];
        assert!(proj.vel.x > 0.0 && proj.vel.y.abs() < 1e-3);
        let timer = s.arsenal.weapons().next().map(|(_, slot)| slot.timer).unwrap();
        assert!((timer - effective_cooldown(&s, WeaponKind::Knife, 1)).abs() < 1e-6);
    }

    #[test]
    fn test_orbit_positions_evenly_spaced() {
        let player = Player::default();
        let profile = orbit_profile(WeaponKind::Orbit, 5, &player).unwrap();
        assert_eq!(profile.count, 3);
        let positions = orbiter_positions(&profile, Vec2::ZERO, 0.0);
        for p in &positions {
            assert!((p.length() - profile.radius).abs() < 1e-3);
        }
    }

    proptest! {
        #[test]
        fn prop_profiles_monotonic(level in 1u32..8) {
            for kind in WeaponKind::BASE {
                if level >= kind.max_level() {
                    continue;
                }
                let a = kind.profile(level);
                let b = kind.profile(level + 1);
                prop_assert!(b.damage >= a.damage);
                prop_assert!(b.count >= a.count);
                if !kind.descriptor().style.is_continuous() {
                    prop_assert!(kind.base_cooldown_at(level + 1) < kind.base_cooldown_at(level));
                }
                let player = Player::default();
                if let (Some(x), Some(y)) = (aura_profile(kind, level, &player), aura_profile(kind, level + 1, &player)) {
                    prop_assert!(y.dps > x.dps && y.radius > x.radius);
                }
                if let (Some(x), Some(y)) = (orbit_profile(kind, level, &player), orbit_profile(kind, level + 1, &player)) {
                    prop_assert!(y.dps > x.dps && y.count >= x.count);
                }
            }
        }
    }
}
