//! Session director: ambient spawning, waves, boss cadence and boss attacks
//!
//! Everything here escalates with `state.elapsed`. Spawn rate and
//! population cap grow linearly; waves and bosses run on fixed timers.

use std::f32::consts::TAU;

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::state::{GameEvent, SimulationState};
use super::store::{BossTimers, Enemy, EnemyKind, EntityId, Projectile, ProjectileKind};
use crate::consts::*;
use crate::{direction_to, from_angle, random_in_range};

/// Seconds between wave events
pub const WAVE_PERIOD: f32 = 30.0;
/// Seconds between boss attempts
pub const BOSS_PERIOD: f32 = 300.0;
/// Delay before retrying while a boss is still alive
pub const BOSS_RETRY: f32 = 10.0;
pub const BOSS_ESCORTS: u32 = 2;
/// Placement attempts before accepting a blocked spawn position
pub const SPAWN_RETRIES: u32 = 6;

/// Boss attack base periods
pub const NOVA_PERIOD: f32 = 4.5;
pub const METEOR_PERIOD: f32 = 7.0;
pub const LANCE_PERIOD: f32 = 5.5;
pub const SUMMON_PERIOD: f32 = 9.0;
/// Boss attacks need the player this close
pub const BOSS_ATTACK_RANGE: f32 = 900.0;
/// Re-arm delay when the player is out of range
pub const BOSS_ATTACK_GRACE: f32 = 0.5;

const NOVA_BOLTS: u32 = 14;
const NOVA_SPEED: f32 = 190.0;
const METEOR_COUNT: u32 = 4;
const METEOR_FUSE: f32 = 1.2;
const METEOR_RADIUS: f32 = 60.0;
const METEOR_SCATTER: f32 = 140.0;
const LANCE_BOLTS: u32 = 3;
const LANCE_SPEED: f32 = 420.0;
const LANCE_SPREAD: f32 = 0.12;
const SUMMON_COUNT: u32 = 4;

/// Escalation timers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Director {
    /// Fractional spawns carried between frames
    pub spawn_accumulator: f32,
    /// Time until the next wave
    pub wave_timer: f32,
    /// Waves started so far
    pub wave: u32,
    /// Time until the next boss attempt
    pub boss_timer: f32,
    pub bosses_spawned: u32,
}

impl Default for Director {
    fn default() -> Self {
        Self {
            spawn_accumulator: 0.0,
            wave_timer: WAVE_PERIOD,
            wave: 0,
            boss_timer: BOSS_PERIOD,
            bosses_spawned: 0,
        }
    }
}

/// Living-enemy population cap at a session time
pub fn spawn_cap(elapsed: f32) -> usize {
    (40.0 + 0.65 * elapsed.max(0.0)).floor() as usize
}

/// Ambient spawns per second
pub fn spawn_rate(elapsed: f32, spawn_rate_mul: f32) -> f32 {
    (1.6 + elapsed.max(0.0) / 35.0) * spawn_rate_mul
}

/// Boss attack period multiplier; attacks speed up over the session
pub fn boss_period_scale(elapsed: f32) -> f32 {
    (1.0 - elapsed / 3000.0).max(0.6)
}

/// Weighted roll among base kinds; heavier kinds unlock over time
pub fn pick_ambient_kind<R: Rng + ?Sized>(rng: &mut R, elapsed: f32) -> EnemyKind {
    let mut table = vec![
        (EnemyKind::Walker, 1.0),
        (EnemyKind::Runner, 0.28 + elapsed / 240.0),
    ];
    if elapsed > 45.0 {
        table.push((EnemyKind::Swarm, 0.35));
    }
    if elapsed > 60.0 {
        table.push((EnemyKind::Tank, ((elapsed - 60.0) / 400.0).min(0.5)));
    }

    let total: f32 = table.iter().map(|(_, w)| w).sum();
    let mut roll = rng.random::<f32>() * total;
    for (kind, weight) in &table {
        if roll < *weight {
            return *kind;
        }
        roll -= weight;
    }
    EnemyKind::Walker
}

/// Position on the spawn ring, avoiding blocking terrain where possible
pub fn spawn_position(state: &mut SimulationState, radius: f32) -> Vec2 {
    let center = state.player.pos;
    let mut pos = center;
    for _ in 0..SPAWN_RETRIES {
        let angle = random_in_range(&mut state.rng, 0.0, TAU);
        let dist = random_in_range(&mut state.rng, SPAWN_RADIUS_INNER, SPAWN_RADIUS);
        pos = center + from_angle(angle) * dist;
        if !state.world.is_blocked(pos, radius) {
            return pos;
        }
    }
    pos
}

/// Create an enemy scaled to the current session time
pub fn spawn_enemy_at(state: &mut SimulationState, kind: EnemyKind, pos: Vec2) -> EntityId {
    let mut enemy = Enemy::new(kind, pos, state.elapsed, &state.profile);
    if kind.is_boss() {
        let scale = boss_period_scale(state.elapsed);
        enemy.boss = Some(BossTimers {
            nova: NOVA_PERIOD * scale,
            meteor: METEOR_PERIOD * scale,
            lance: LANCE_PERIOD * scale,
            summon: SUMMON_PERIOD * scale,
        });
    }
    state.store.add_enemy(enemy)
}

/// Create an enemy on the spawn ring
pub fn spawn_enemy(state: &mut SimulationState, kind: EnemyKind) -> EntityId {
    let pos = spawn_position(state, kind.stats().radius);
    spawn_enemy_at(state, kind, pos)
}

/// Advance spawn accumulation, wave and boss timers
pub fn update_director(state: &mut SimulationState, dt: f32) {
    state.director.spawn_accumulator += spawn_rate(state.elapsed, state.profile.spawn_rate_mul) * dt;
    while state.director.spawn_accumulator >= 1.0 {
        state.director.spawn_accumulator -= 1.0;
        if state.store.alive_enemy_count() < spawn_cap(state.elapsed) {
            let kind = pick_ambient_kind(&mut state.rng, state.elapsed);
            spawn_enemy(state, kind);
        }
    }

    state.director.wave_timer -= dt;
    if state.director.wave_timer <= 0.0 {
        state.director.wave_timer += WAVE_PERIOD;
        state.director.wave += 1;
        let wave = state.director.wave;
        spawn_wave(state, wave);
    }

    state.director.boss_timer -= dt;
    if state.director.boss_timer <= 0.0 {
        if state.store.boss_alive() {
            log::debug!("Boss still alive, retrying in {BOSS_RETRY}s");
            state.director.boss_timer = BOSS_RETRY;
        } else {
            spawn_boss(state);
            state.director.boss_timer = BOSS_PERIOD;
        }
    }
}

/// Themed burst for wave `wave` (1-based); the theme cycles every 3 waves
pub fn spawn_wave(state: &mut SimulationState, wave: u32) {
    let (label, groups): (&str, Vec<(EnemyKind, u32)>) = match wave.saturating_sub(1) % 3 {
        0 => ("Swarm rush", vec![(EnemyKind::Swarm, 8 + 2 * wave)]),
        1 => (
            "Armored push",
            vec![(EnemyKind::Tank, 2 + wave / 2), (EnemyKind::Walker, 4 + wave)],
        ),
        _ => (
            "Stampede",
            vec![(EnemyKind::Runner, 6 + wave), (EnemyKind::Swarm, 10 + 2 * wave)],
        ),
    };

    let mut spawned = 0;
    for (kind, count) in groups {
        for _ in 0..count {
            spawn_enemy(state, kind);
            spawned += 1;
        }
    }
    let elite = wave % 4 == 0 || (wave >= 6 && state.rng.random_bool(0.3));
    if elite {
        spawn_enemy(state, EnemyKind::Elite);
        spawned += 1;
    }

    log::info!("Wave {wave} ({label}): {spawned} enemies");
    state.emit(GameEvent::WaveStarted { wave });
    state.announce(format!("Wave {wave}: {label}"), 0x7fd4ff);
}

/// Boss plus escort elites
pub fn spawn_boss(state: &mut SimulationState) {
    spawn_enemy(state, EnemyKind::Boss);
    for _ in 0..BOSS_ESCORTS {
        spawn_enemy(state, EnemyKind::Elite);
    }
    state.director.bosses_spawned += 1;
    log::info!("Boss #{} spawned at {:.1}s", state.director.bosses_spawned, state.elapsed);
    state.emit(GameEvent::BossSpawned);
    state.announce("A BOSS APPROACHES", 0xff5050);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BossAttack {
    Nova,
    Meteor,
    Lance,
    Summon,
}

/// Tick every living boss's attack timers and fire the ready ones
pub fn update_bosses(state: &mut SimulationState, dt: f32) {
    let scale = boss_period_scale(state.elapsed);
    let boss_indices: Vec<usize> = state
        .store
        .enemies
        .iter()
        .enumerate()
        .filter(|(_, e)| e.is_alive() && e.boss.is_some())
        .map(|(i, _)| i)
        .collect();

    for idx in boss_indices {
        let boss = &state.store.enemies[idx];
        let Some(mut timers) = boss.boss else {
            continue;
        };
        let in_range = boss.pos.distance(state.player.pos) <= BOSS_ATTACK_RANGE;

        let mut ready = Vec::new();
        for (timer, attack, period) in [
            (&mut timers.nova, BossAttack::Nova, NOVA_PERIOD),
            (&mut timers.meteor, BossAttack::Meteor, METEOR_PERIOD),
            (&mut timers.lance, BossAttack::Lance, LANCE_PERIOD),
            (&mut timers.summon, BossAttack::Summon, SUMMON_PERIOD),
        ] {
            *timer -= dt;
            if *timer > 0.0 {
                continue;
            }
            if in_range {
                ready.push(attack);
                *timer = period * scale;
            } else {
                *timer = BOSS_ATTACK_GRACE;
            }
        }
        state.store.enemies[idx].boss = Some(timers);

        for attack in ready {
            boss_attack(state, idx, attack);
        }
    }
}

fn boss_attack(state: &mut SimulationState, idx: usize, attack: BossAttack) {
    let boss = &state.store.enemies[idx];
    let origin = boss.pos;
    let damage = boss.damage;
    let target = state.player.pos;

    match attack {
        BossAttack::Nova => {
            let offset = random_in_range(&mut state.rng, 0.0, TAU);
            for i in 0..NOVA_BOLTS {
                let dir = from_angle(offset + i as f32 / NOVA_BOLTS as f32 * TAU);
                hostile_bolt(state, origin, dir * NOVA_SPEED, damage * 0.4);
            }
        }
        BossAttack::Meteor => {
            for _ in 0..METEOR_COUNT {
                let scatter = from_angle(random_in_range(&mut state.rng, 0.0, TAU))
                    * random_in_range(&mut state.rng, 0.0, METEOR_SCATTER);
                let marker = Projectile::new(
                    ProjectileKind::HostileMeteor {
                        fuse: METEOR_FUSE,
                        blast_radius: METEOR_RADIUS,
                    },
                    target + scatter,
                    Vec2::ZERO,
                    METEOR_RADIUS,
                    damage * 0.8,
                )
                .with_ttl(METEOR_FUSE + 0.1);
                state.store.add_projectile(marker);
            }
        }
        BossAttack::Lance => {
            let aim = direction_to(origin, target);
            let base = aim.y.atan2(aim.x);
            for i in 0..LANCE_BOLTS {
                let offset = (i as f32 - (LANCE_BOLTS - 1) as f32 / 2.0) * LANCE_SPREAD;
                hostile_bolt(state, origin, from_angle(base + offset) * LANCE_SPEED, damage * 0.55);
            }
        }
        BossAttack::Summon => {
            for i in 0..SUMMON_COUNT {
                let dir = from_angle(i as f32 / SUMMON_COUNT as f32 * TAU);
                spawn_enemy_at(state, EnemyKind::Swarm, origin + dir * 60.0);
            }
        }
    }
}

fn hostile_bolt(state: &mut SimulationState, pos: Vec2, vel: Vec2, damage: f32) {
    let bolt = Projectile::new(ProjectileKind::HostileBolt, pos, vel, 6.0, damage).with_ttl(4.0);
    state.store.add_projectile(bolt);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::difficulty::DifficultyProfile;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn state() -> SimulationState {
        SimulationState::with_seed(DifficultyProfile::default(), 0.0, 21)
    }

    #[test]
    fn test_scaling_formulas() {
        assert_eq!(spawn_cap(0.0), 40);
        assert_eq!(spawn_cap(100.0), 105);
        assert!((spawn_rate(35.0, 1.0) - 2.6).abs() < 1e-5);
        assert!((spawn_rate(0.0, 2.0) - 3.2).abs() < 1e-5);
        assert_eq!(boss_period_scale(0.0), 1.0);
        assert_eq!(boss_period_scale(10_000.0), 0.6);
    }

    #[test]
    fn test_early_kinds_only() {
        let mut rng = Pcg32::seed_from_u64(1);
        for _ in 0..200 {
            let kind = pick_ambient_kind(&mut rng, 10.0);
            assert!(matches!(kind, EnemyKind::Walker | EnemyKind::Runner));
        }
        let late: Vec<_> = (0..500).map(|_| pick_ambient_kind(&mut rng, 400.0)).collect();
        assert!(late.contains(&EnemyKind::Tank));
        assert!(late.contains(&EnemyKind::Swarm));
    }

    #[test]
    fn test_spawn_on_ring() {
        let mut s = state();
        s.player.pos = Vec2::new(3000.0, -2000.0);
        for _ in 0..20 {
            spawn_enemy(&mut s, EnemyKind::Walker);
        }
        for e in &s.store.enemies {
            let d = e.pos.distance(s.player.pos);
            assert!(d >= SPAWN_RADIUS_INNER - 1e-2 && d <= SPAWN_RADIUS + 1e-2);
        }
    }

    #[test]
    fn test_accumulator_emits_whole_spawns() {
        let mut s = state();
        // 1.6 spawns/s: one second yields one spawn with 0.6 carried
        update_director(&mut s, 1.0);
        assert_eq!(s.store.enemies.len(), 1);
        assert!((s.director.spawn_accumulator - 0.6).abs() < 1e-5);
    }

    #[test]
    fn test_population_cap_respected() {
        let mut s = state();
        s.director.spawn_accumulator = 100.0;
        update_director(&mut s, 0.0);
        assert_eq!(s.store.alive_enemy_count(), spawn_cap(0.0));
    }

    #[test]
    fn test_wave_cycle() {
        let mut s = state();
        spawn_wave(&mut s, 1);
        assert_eq!(s.store.enemies.iter().filter(|e| e.kind == EnemyKind::Swarm).count(), 10);
        assert!(s.events.contains(&GameEvent::WaveStarted { wave: 1 }));

        let mut s = state();
        spawn_wave(&mut s, 2);
        assert_eq!(s.store.enemies.iter().filter(|e| e.kind == EnemyKind::Tank).count(), 3);
        assert_eq!(s.store.enemies.iter().filter(|e| e.kind == EnemyKind::Walker).count(), 6);

        let mut s = state();
        spawn_wave(&mut s, 4);
        assert_eq!(s.store.enemies.iter().filter(|e| e.kind == EnemyKind::Elite).count(), 1);
    }

    #[test]
    fn test_wave_timer_fires_every_period() {
        let mut s = state();
        s.profile.spawn_rate_mul = 0.0;
        // 65 simulated seconds: waves at 30 and 60
        for _ in 0..650 {
            update_director(&mut s, 0.1);
        }
        assert_eq!(s.director.wave, 2);
    }

    #[test]
    fn test_boss_deferred_while_alive() {
        let mut s = state();
        s.profile.spawn_rate_mul = 0.0;
        s.director.boss_timer = 0.01;
        update_director(&mut s, 0.02);
        assert_eq!(s.director.bosses_spawned, 1);
        assert_eq!(s.store.enemies.iter().filter(|e| e.kind == EnemyKind::Elite).count(), 2);
        assert!(s.events.contains(&GameEvent::BossSpawned));

        s.director.boss_timer = 0.01;
        update_director(&mut s, 0.02);
        assert_eq!(s.director.bosses_spawned, 1);
        assert_eq!(s.director.boss_timer, BOSS_RETRY);
        assert_eq!(s.store.enemies.iter().filter(|e| e.kind.is_boss()).count(), 1);
    }

    #[test]
    fn test_boss_nova_and_out_of_range_grace() {
        let mut s = state();
        spawn_enemy_at(&mut s, EnemyKind::Boss, Vec2::new(300.0, 0.0));
        if let Some(timers) = s.store.enemies[0].boss.as_mut() {
            timers.nova = 0.01;
        }
        update_bosses(&mut s, 0.02);
        let bolts = s
            .store
            .projectiles
            .iter()
            .filter(|p| p.kind == ProjectileKind::HostileBolt)
            .count();
        assert_eq!(bolts, NOVA_BOLTS as usize);

        // Player far away: the attack re-arms with the short grace
        s.player.pos = Vec2::new(5000.0, 0.0);
        if let Some(timers) = s.store.enemies[0].boss.as_mut() {
            timers.lance = 0.01;
        }
        update_bosses(&mut s, 0.02);
        assert_eq!(s.store.enemies[0].boss.map(|t| t.lance), Some(BOSS_ATTACK_GRACE));
    }
}
