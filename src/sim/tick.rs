//! Per-frame simulation step
//!
//! Order within a step is fixed: timers and director, player movement,
//! weapons and auras, projectiles, enemies, combo bursts, pickups,
//! effects, compaction, and finally the reward drain.

use glam::Vec2;

use super::collision::circles_overlap;
use super::combat::{apply_damage, explode_at, hurt_player, resolve_bursts};
use super::director::{update_bosses, update_director};
use super::rewards::{add_xp, drain_rewards, open_container};
use super::state::{GameEvent, SessionPhase, SimulationState};
use super::store::{EffectKind, Pickup, PickupKind, Projectile, ProjectileKind};
use super::targeting::{self, steer_toward};
use super::weapons::{WeaponKind, WeaponSlot, aura_profile, fire_weapons, orbit_profile, orbiter_positions};
use crate::consts::*;
use crate::direction_to;

/// Reach of homing projectiles when re-targeting
pub const HOMING_RANGE: f32 = 620.0;
/// Contact cooldown recovers at this fraction of real time while not touching
pub const HIT_COOLDOWN_IDLE_RATE: f32 = 0.6;
/// XP granted by discovering a landmark
pub const LANDMARK_XP: f32 = 8.0;

/// Abstract input for one step
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Desired movement; longer vectors are clamped to length 1
    pub movement: Vec2,
    /// Dash trigger
    pub dash: bool,
    /// Pause toggle
    pub pause: bool,
    /// Visible area size, when the host's viewport changed
    pub viewport: Option<Vec2>,
}

/// Advance the session by one frame
///
/// `frame_dt` is clamped to [`MAX_FRAME_DT`]. Nothing moves unless the
/// session is `Running`; the reward drain runs regardless so a queued
/// panel opens on the next frame.
pub fn step(state: &mut SimulationState, input: &TickInput, frame_dt: f32) {
    if let Some(size) = input.viewport
        && size.x > 0.0
        && size.y > 0.0
    {
        state.viewport = size;
    }

    if input.pause {
        match state.phase {
            SessionPhase::Running => state.phase = SessionPhase::Paused,
            SessionPhase::Paused => state.phase = SessionPhase::Running,
            _ => {}
        }
    }

    if state.phase.is_simulating() {
        let dt = if frame_dt.is_finite() {
            frame_dt.clamp(0.0, MAX_FRAME_DT)
        } else {
            0.0
        };
        if dt > 0.0 {
            simulate(state, input, dt);
        }
    }

    drain_rewards(state);
}

fn simulate(state: &mut SimulationState, input: &TickInput, dt: f32) {
    update_timers(state, dt);
    update_director(state, dt);
    update_bosses(state, dt);

    update_player(state, input, dt);
    discover_landmarks(state);

    fire_weapons(state, dt);
    update_continuous_weapons(state, dt);

    update_projectiles(state, dt);
    if !state.is_over() {
        update_enemies(state, dt);
    }
    resolve_bursts(state);

    if !state.is_over() {
        update_pickups(state, dt);
    }
    for effect in &mut state.store.effects {
        effect.age += dt;
    }
    state.store.compact();
}

fn update_timers(state: &mut SimulationState, dt: f32) {
    state.elapsed += dt;

    if let Some(banner) = state.announcement.as_mut() {
        banner.ttl -= dt;
        if banner.ttl <= 0.0 {
            state.announcement = None;
        }
    }

    state.combo.update(dt);
    if state.rage.update(dt) {
        log::info!("Rage ended at {:.1}s", state.elapsed);
        state.emit(GameEvent::RageEnded);
    }

    let player = &mut state.player;
    player.iframes = (player.iframes - dt).max(0.0);
    player.dash.update(dt);
    if player.regen > 0.0 {
        player.heal(player.regen * dt);
    }
}

fn update_player(state: &mut SimulationState, input: &TickInput, dt: f32) {
    let movement = if input.movement.is_finite() {
        input.movement.clamp_length_max(1.0)
    } else {
        Vec2::ZERO
    };
    if movement.length_squared() > 1e-6 {
        state.player.facing = movement.normalize_or(state.player.facing);
    }
    if input.dash {
        state.player.dash.trigger();
    }

    let (pos, radius) = (state.player.pos, state.player.radius);
    let terrain = state.world.terrain_speed_mul(pos, radius);
    let speed = state.player.move_speed() * state.rage.speed_mul(&state.profile) * terrain;
    // A dash with no input carries the player along their facing
    let dir = if state.player.dash.is_active() && movement == Vec2::ZERO {
        state.player.facing
    } else {
        movement
    };

    let moved = pos + dir * speed * dt;
    state.player.pos = state.world.resolve_blocking(moved, radius);
}

fn discover_landmarks(state: &mut SimulationState) {
    let player_pos = state.player.pos;
    for idx in state.world.discover_landmarks(player_pos) {
        let landmark = &state.world.landmarks[idx];
        let name = landmark.name.clone();
        let drop_at = landmark.pos + direction_to(landmark.pos, player_pos) * (landmark.radius + 20.0);
        log::info!("Discovered {name}");
        state.store.add_pickup(Pickup::new(PickupKind::Xp, drop_at, LANDMARK_XP));
        state.announce(format!("Discovered: {name}"), 0x9be7a0);
        state.emit(GameEvent::LandmarkDiscovered { name });
    }
}

/// Aura and orbit damage, re-derived from weapon level every frame
fn update_continuous_weapons(state: &mut SimulationState, dt: f32) {
    let owned: Vec<(WeaponKind, WeaponSlot)> = state.arsenal.weapons().collect();
    for (kind, slot) in owned {
        if let Some(aura) = aura_profile(kind, slot.level, &state.player) {
            let center = state.player.pos;
            let mut dealt = 0.0;
            for idx in 0..state.store.enemies.len() {
                let enemy = &mut state.store.enemies[idx];
                if !enemy.is_alive() || enemy.pos.distance(center) > aura.radius + enemy.radius {
                    continue;
                }
                enemy.apply_slow(aura.slow);
                dealt += apply_damage(state, idx, aura.dps * dt, false).dealt;
            }
            if aura.lifesteal > 0.0 && dealt > 0.0 {
                state.player.heal(dealt * aura.lifesteal);
            }
        }

        if let Some(orbit) = orbit_profile(kind, slot.level, &state.player) {
            let bodies = orbiter_positions(&orbit, state.player.pos, state.elapsed);
            for idx in 0..state.store.enemies.len() {
                let enemy = &state.store.enemies[idx];
                let touching = enemy.is_alive()
                    && bodies
                        .iter()
                        .any(|b| circles_overlap(*b, orbit.body_radius, enemy.pos, enemy.radius));
                if touching {
                    apply_damage(state, idx, orbit.dps * dt, false);
                }
            }
        }
    }
}

fn update_projectiles(state: &mut SimulationState, dt: f32) {
    let mut projectiles = std::mem::take(&mut state.store.projectiles);
    let view = state.view_rect();

    for p in projectiles.iter_mut().filter(|p| !p.expired) {
        p.ttl -= dt;
        match p.kind {
            ProjectileKind::Linear | ProjectileKind::Chain { .. } => {
                p.pos += p.vel * dt;
                hit_enemies(state, p);
            }
            ProjectileKind::Homing { strength } => {
                if let Some(idx) = targeting::lowest_hp_target(&state.store.enemies, p.pos, HOMING_RANGE, &view) {
                    let target = state.store.enemies[idx].pos;
                    p.vel = steer_toward(p.vel, p.pos, target, strength, dt);
                }
                p.pos += p.vel * dt;
                hit_enemies(state, p);
            }
            ProjectileKind::Bomb {
                fuse,
                blast_radius,
                slow,
            } => {
                let fuse = fuse - dt;
                if fuse <= 0.0 {
                    explode_at(state, p.pos, blast_radius, p.damage, slow);
                    p.expired = true;
                } else {
                    p.kind = ProjectileKind::Bomb {
                        fuse,
                        blast_radius,
                        slow,
                    };
                }
            }
            ProjectileKind::Zone { dps, slow } => {
                for idx in 0..state.store.enemies.len() {
                    let enemy = &mut state.store.enemies[idx];
                    if !enemy.is_alive() || !circles_overlap(p.pos, p.radius, enemy.pos, enemy.radius) {
                        continue;
                    }
                    enemy.apply_slow(slow);
                    apply_damage(state, idx, dps * dt, false);
                }
            }
            ProjectileKind::HostileBolt => {
                p.pos += p.vel * dt;
                if circles_overlap(p.pos, p.radius, state.player.pos, state.player.radius) {
                    hurt_player(state, p.damage);
                    p.expired = true;
                }
            }
            ProjectileKind::HostileMeteor { fuse, blast_radius } => {
                let fuse = fuse - dt;
                if fuse <= 0.0 {
                    if p.pos.distance(state.player.pos) <= blast_radius + state.player.radius {
                        hurt_player(state, p.damage);
                    }
                    state
                        .store
                        .add_effect(EffectKind::Explosion { radius: blast_radius }, p.pos, EFFECT_LIFETIME);
                    p.expired = true;
                } else {
                    p.kind = ProjectileKind::HostileMeteor { fuse, blast_radius };
                }
            }
        }
        if p.ttl <= 0.0 {
            p.expired = true;
        }
    }

    projectiles.append(&mut state.store.projectiles);
    state.store.projectiles = projectiles;
}

/// Contact damage for a moving friendly projectile
///
/// Each enemy is hit at most once per projectile; the projectile expires
/// when its pierce runs out. Chain bolts jump to a fresh target per hit.
fn hit_enemies(state: &mut SimulationState, p: &mut Projectile) {
    for idx in 0..state.store.enemies.len() {
        if p.pierce == 0 || p.expired {
            break;
        }
        let enemy = &mut state.store.enemies[idx];
        if !enemy.is_alive()
            || p.hit.contains(&enemy.id)
            || !circles_overlap(p.pos, p.radius, enemy.pos, enemy.radius)
        {
            continue;
        }
        p.hit.insert(enemy.id);
        if p.slow_on_hit > 0.0 {
            enemy.apply_slow(p.slow_on_hit);
        }
        if !apply_damage(state, idx, p.damage, true).crit {
            state.store.add_effect(EffectKind::Hit, p.pos, EFFECT_LIFETIME);
        }
        p.pierce -= 1;

        if let ProjectileKind::Chain { jumps_left, range } = p.kind {
            let view = state.view_rect();
            let next = (jumps_left > 0)
                .then(|| targeting::lowest_hp_target_excluding(&state.store.enemies, p.pos, range, &view, &p.hit))
                .flatten();
            match next {
                Some(target) => {
                    let speed = p.vel.length();
                    p.vel = direction_to(p.pos, state.store.enemies[target].pos) * speed;
                    p.kind = ProjectileKind::Chain {
                        jumps_left: jumps_left - 1,
                        range,
                    };
                }
                None => p.expired = true,
            }
            break;
        }
    }
    if p.pierce == 0 {
        p.expired = true;
    }
}

fn update_enemies(state: &mut SimulationState, dt: f32) {
    let player_pos = state.player.pos;
    let player_radius = state.player.radius;

    for idx in 0..state.store.enemies.len() {
        let enemy = &mut state.store.enemies[idx];
        if !enemy.is_alive() {
            continue;
        }
        if !enemy.kind.is_boss() && enemy.pos.distance(player_pos) > DESPAWN_RADIUS {
            // Left behind: removed without kill credit
            enemy.dead = true;
            continue;
        }

        let slow = enemy.slow.clamp(0.0, ENEMY_MAX_SLOW);
        enemy.slow = (enemy.slow - ENEMY_SLOW_DECAY * dt).max(0.0);
        let (pos, radius) = (enemy.pos, enemy.radius);
        let base_speed = enemy.speed * (1.0 - slow);

        let terrain = state.world.terrain_speed_mul(pos, radius);
        let dir = direction_to(pos, player_pos);
        let moved = pos + dir * base_speed * terrain * dt;
        let resolved = state.world.resolve_blocking(moved, radius);

        let enemy = &mut state.store.enemies[idx];
        enemy.pos = resolved;

        if circles_overlap(resolved, radius, player_pos, player_radius) {
            enemy.hit_cooldown -= dt;
            if enemy.hit_cooldown <= 0.0 {
                let damage = enemy.damage;
                if hurt_player(state, damage) > 0.0 {
                    state.store.enemies[idx].hit_cooldown = ENEMY_HIT_COOLDOWN;
                }
                if state.is_over() {
                    return;
                }
            }
        } else {
            enemy.hit_cooldown = (enemy.hit_cooldown - dt * HIT_COOLDOWN_IDLE_RATE).max(0.0);
        }
    }
}

fn update_pickups(state: &mut SimulationState, dt: f32) {
    let player_pos = state.player.pos;
    let player_radius = state.player.radius;
    let magnet = state.player.magnet_radius();

    for idx in 0..state.store.pickups.len() {
        let pickup = &mut state.store.pickups[idx];
        if pickup.collected {
            continue;
        }
        if pickup.kind != PickupKind::Chest && pickup.pos.distance(player_pos) > DESPAWN_RADIUS {
            // Left behind: removed without granting its value
            pickup.collected = true;
            continue;
        }
        // Dropped this frame: visible, but not collectable yet
        let fresh = pickup.age <= 0.0;
        pickup.age += dt;
        if fresh {
            continue;
        }

        let dist = pickup.pos.distance(player_pos);
        if dist < magnet {
            let pull = (220.0 + (magnet - dist) * 3.2) * dt;
            pickup.pos += direction_to(pickup.pos, player_pos) * pull.min(dist);
        }
        if !circles_overlap(pickup.pos, pickup.radius, player_pos, player_radius) {
            continue;
        }
        pickup.collected = true;
        let (kind, value) = (pickup.kind, pickup.value);
        match kind {
            PickupKind::Xp => add_xp(state, value),
            PickupKind::Heal => {
                state.player.heal(value);
            }
            PickupKind::Chest => open_container(state),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::difficulty::DifficultyProfile;
    use crate::sim::meters::RAGE_MAX;
    use crate::sim::rewards::choose_reward;
    use crate::sim::store::{Enemy, EnemyKind};
    use crate::sim::weapons::Arsenal;

    const DT: f32 = 1.0 / 60.0;

    /// Quiet arena: no spawns, no weapons, no crits
    fn quiet_state() -> SimulationState {
        let profile = DifficultyProfile {
            spawn_rate_mul: 0.0,
            ..Default::default()
        };
        let mut s = SimulationState::with_seed(profile, 0.0, 99);
        s.arsenal = Arsenal::default();
        s.player.crit_chance = 0.0;
        s
    }

    fn spawn(s: &mut SimulationState, kind: EnemyKind, pos: Vec2) -> usize {
        let enemy = Enemy::new(kind, pos, s.elapsed, &s.profile);
        s.store.add_enemy(enemy);
        s.store.enemies.len() - 1
    }

    fn idle() -> TickInput {
        TickInput::default()
    }

    #[test]
    fn test_contact_hit_and_iframes() {
        let mut s = quiet_state();
        spawn(&mut s, EnemyKind::Walker, Vec2::new(5.0, 0.0));
        spawn(&mut s, EnemyKind::Walker, Vec2::new(-5.0, 0.0));

        step(&mut s, &idle(), DT);
        assert_eq!(s.player.hp, PLAYER_HP - 10.0);
        assert_eq!(s.player.iframes, PLAYER_IFRAMES);

        // Both walkers keep touching, but the window absorbs everything
        for _ in 0..20 {
            step(&mut s, &idle(), DT);
        }
        assert_eq!(s.player.hp, PLAYER_HP - 10.0);
    }

    #[test]
    fn test_frame_dt_clamped() {
        let mut s = quiet_state();
        step(&mut s, &idle(), 1.0);
        assert!((s.elapsed - MAX_FRAME_DT).abs() < 1e-6);
        step(&mut s, &idle(), f32::NAN);
        assert!((s.elapsed - MAX_FRAME_DT).abs() < 1e-6);
    }

    #[test]
    fn test_pause_freezes_everything() {
        let mut s = quiet_state();
        let idx = spawn(&mut s, EnemyKind::Walker, Vec2::new(300.0, 0.0));
        let pause = TickInput {
            pause: true,
            ..Default::default()
        };
        step(&mut s, &pause, DT);
        assert_eq!(s.phase, SessionPhase::Paused);
        let frozen_pos = s.store.enemies[idx].pos;
        for _ in 0..10 {
            step(&mut s, &idle(), DT);
        }
        assert_eq!(s.elapsed, 0.0);
        assert_eq!(s.store.enemies[idx].pos, frozen_pos);

        step(&mut s, &pause, DT);
        assert_eq!(s.phase, SessionPhase::Running);
        assert!(s.elapsed > 0.0);
    }

    #[test]
    fn test_player_moves_and_clamps_input() {
        let mut s = quiet_state();
        let input = TickInput {
            movement: Vec2::new(10.0, 0.0),
            ..Default::default()
        };
        step(&mut s, &input, DT);
        assert!((s.player.pos.x - PLAYER_SPEED * DT).abs() < 1e-3);

        let dash = TickInput {
            movement: Vec2::new(0.0, 1.0),
            dash: true,
            ..Default::default()
        };
        let before = s.player.pos;
        step(&mut s, &dash, DT);
        let moved = s.player.pos.distance(before);
        assert!((moved - PLAYER_SPEED * DASH_SPEED_MULT * DT).abs() < 1e-2);
    }

    #[test]
    fn test_level_up_opens_panel_and_freezes() {
        let mut s = quiet_state();
        add_xp(&mut s, 10.0);
        step(&mut s, &idle(), DT);
        assert_eq!(s.phase, SessionPhase::RewardOpen);
        let frozen = s.elapsed;
        step(&mut s, &idle(), DT);
        assert_eq!(s.elapsed, frozen);

        choose_reward(&mut s, 0).expect("valid choice");
        assert_eq!(s.phase, SessionPhase::Running);
        step(&mut s, &idle(), DT);
        assert!(s.elapsed > frozen);
    }

    #[test]
    fn test_pierce_limits_distinct_hits() {
        let mut s = quiet_state();
        for i in 0..3 {
            spawn(&mut s, EnemyKind::Tank, Vec2::new(300.0 + i as f32, 0.0));
        }
        let proj = Projectile::new(ProjectileKind::Linear, Vec2::new(300.0, 0.0), Vec2::ZERO, 30.0, 10.0)
            .with_pierce(2)
            .with_ttl(5.0);
        s.store.add_projectile(proj);

        for _ in 0..5 {
            step(&mut s, &idle(), DT);
        }
        let damaged: Vec<f32> = s
            .store
            .enemies
            .iter()
            .filter(|e| e.hp < e.hp_max)
            .map(|e| e.hp_max - e.hp)
            .collect();
        assert_eq!(damaged.len(), 2);
        for d in damaged {
            assert!((d - 10.0).abs() < 1e-3);
        }
        assert!(s.store.projectiles.is_empty());
    }

    #[test]
    fn test_homing_curves_toward_target() {
        let mut s = quiet_state();
        spawn(&mut s, EnemyKind::Tank, Vec2::new(0.0, 200.0));
        let proj = Projectile::new(
            ProjectileKind::Homing { strength: 3.0 },
            Vec2::ZERO,
            Vec2::new(200.0, 0.0),
            5.0,
            10.0,
        )
        .with_ttl(5.0);
        s.store.add_projectile(proj);
        step(&mut s, &idle(), DT);
        let vel = s.store.projectiles[0].vel;
        assert!(vel.y > 0.0);
        assert!((vel.length() - 200.0).abs() < 1e-2);
    }

    #[test]
    fn test_chain_jumps_to_new_target() {
        let mut s = quiet_state();
        spawn(&mut s, EnemyKind::Tank, Vec2::new(100.0, 0.0));
        spawn(&mut s, EnemyKind::Tank, Vec2::new(100.0, 150.0));
        let proj = Projectile::new(
            ProjectileKind::Chain {
                jumps_left: 2,
                range: 300.0,
            },
            Vec2::new(100.0, 0.0),
            Vec2::new(500.0, 0.0),
            5.0,
            10.0,
        )
        .with_pierce(3)
        .with_ttl(2.0);
        s.store.add_projectile(proj);
        step(&mut s, &idle(), DT);

        let p = &s.store.projectiles[0];
        assert_eq!(p.hit.len(), 1);
        assert!(p.vel.y > p.vel.x.abs());
        assert!((p.vel.length() - 500.0).abs() < 1e-2);
        assert_eq!(p.kind, ProjectileKind::Chain { jumps_left: 1, range: 300.0 });
    }

    #[test]
    fn test_bomb_detonates_after_fuse() {
        let mut s = quiet_state();
        let idx = spawn(&mut s, EnemyKind::Tank, Vec2::new(300.0, 0.0));
        let bomb = Projectile::new(
            ProjectileKind::Bomb {
                fuse: 0.05,
                blast_radius: 50.0,
                slow: 0.3,
            },
            Vec2::new(300.0, 0.0),
            Vec2::ZERO,
            50.0,
            40.0,
        )
        .with_ttl(1.0);
        s.store.add_projectile(bomb);
        step(&mut s, &idle(), DT);
        assert_eq!(s.store.enemies[idx].hp, s.store.enemies[idx].hp_max);
        for _ in 0..3 {
            step(&mut s, &idle(), DT);
        }
        assert!(s.store.enemies[idx].hp < s.store.enemies[idx].hp_max);
        assert!(s.store.projectiles.is_empty());
    }

    #[test]
    fn test_pickup_not_collected_on_drop_frame() {
        let mut s = quiet_state();
        s.store.add_pickup(Pickup::new(PickupKind::Heal, Vec2::ZERO, 18.0));
        s.player.hp = 50.0;
        // Ages the pickup without collecting it
        update_pickups(&mut s, DT);
        assert_eq!(s.player.hp, 50.0);
        assert!(!s.store.pickups[0].collected);
        step(&mut s, &idle(), DT);
        assert_eq!(s.player.hp, 68.0);
        assert!(s.store.pickups.is_empty());
    }

    #[test]
    fn test_kill_drop_collected_next_frame() {
        let mut s = quiet_state();
        let idx = spawn(&mut s, EnemyKind::Swarm, Vec2::new(0.0, 0.0));
        s.store.enemies[idx].hp = 0.5;
        s.player.iframes = 10.0;
        let zone = Projectile::new(
            ProjectileKind::Zone { dps: 600.0, slow: 0.0 },
            Vec2::ZERO,
            Vec2::ZERO,
            20.0,
            0.0,
        )
        .with_ttl(1.0);
        s.store.add_projectile(zone);

        step(&mut s, &idle(), DT);
        assert_eq!(s.kills, 1);
        assert_eq!(s.player.xp, 0.0);
        let value = s
            .store
            .pickups
            .iter()
            .find(|p| p.kind == PickupKind::Xp)
            .map(|p| p.value)
            .expect("xp dropped");

        step(&mut s, &idle(), DT);
        assert_eq!(s.player.xp, value);
    }

    #[test]
    fn test_hostile_bolt_hurts_player() {
        let mut s = quiet_state();
        let bolt = Projectile::new(ProjectileKind::HostileBolt, Vec2::new(10.0, 0.0), Vec2::ZERO, 6.0, 12.0)
            .with_ttl(2.0);
        s.store.add_projectile(bolt);
        step(&mut s, &idle(), DT);
        assert_eq!(s.player.hp, PLAYER_HP - 12.0);
        assert!(s.store.projectiles.is_empty());
    }

    #[test]
    fn test_far_enemies_despawn_but_bosses_stay() {
        let mut s = quiet_state();
        spawn(&mut s, EnemyKind::Walker, Vec2::new(DESPAWN_RADIUS + 100.0, 0.0));
        spawn(&mut s, EnemyKind::Boss, Vec2::new(DESPAWN_RADIUS + 100.0, 300.0));
        step(&mut s, &idle(), DT);
        assert_eq!(s.store.enemies.len(), 1);
        assert!(s.store.enemies[0].kind.is_boss());
        assert_eq!(s.kills, 0);
    }

    #[test]
    fn test_left_behind_pickups_despawn_except_chests() {
        let mut s = quiet_state();
        s.store.add_pickup(Pickup::new(PickupKind::Xp, Vec2::ZERO, 3.0));
        s.store.add_pickup(Pickup::new(PickupKind::Chest, Vec2::new(0.0, 20.0), 0.0));
        s.player.pos = Vec2::new(DESPAWN_RADIUS + 200.0, 0.0);
        step(&mut s, &idle(), DT);
        assert_eq!(s.store.pickups.len(), 1);
        assert_eq!(s.store.pickups[0].kind, PickupKind::Chest);
        assert_eq!(s.player.xp, 0.0);
    }

    #[test]
    fn test_pickups_stay_bounded_while_travelling() {
        let mut s = quiet_state();
        for i in 0..300 {
            s.player.pos = Vec2::new(i as f32 * 100.0, 0.0);
            let drop_at = s.player.pos - Vec2::new(0.0, 200.0);
            s.store.add_pickup(Pickup::new(PickupKind::Xp, drop_at, 1.0));
            step(&mut s, &idle(), DT);
        }
        // Only drops within the despawn distance survive
        assert!(s.store.pickups.len() <= 12, "{} pickups kept", s.store.pickups.len());
    }

    #[test]
    fn test_garlic_aura_damages_and_slows() {
        let mut s = quiet_state();
        s.arsenal.add_weapon(WeaponKind::Garlic);
        let idx = spawn(&mut s, EnemyKind::Tank, Vec2::new(60.0, 0.0));
        s.player.iframes = 10.0;
        step(&mut s, &idle(), DT);
        let tank = &s.store.enemies[idx];
        assert!(tank.hp < tank.hp_max);
        assert!(tank.slow > 0.0);
    }

    #[test]
    fn test_rage_end_emits_event() {
        let mut s = quiet_state();
        s.rage.add(RAGE_MAX, &s.profile);
        s.rage.active_timer = DT / 2.0;
        step(&mut s, &idle(), DT);
        assert!(!s.rage.is_active());
        assert!(s.take_events().contains(&GameEvent::RageEnded));
    }

    #[test]
    fn test_landmark_discovery_grants_bonus() {
        let mut s = quiet_state();
        let landmark = s.world.landmarks[0].clone();
        s.player.pos = landmark.pos + Vec2::new(landmark.radius + 30.0, 0.0);
        discover_landmarks(&mut s);
        assert!(s.world.landmarks[0].discovered);
        assert!(s.events.contains(&GameEvent::LandmarkDiscovered { name: landmark.name.clone() }));
        assert_eq!(s.store.pickups.len(), 1);
        // Discovery fires once
        discover_landmarks(&mut s);
        assert_eq!(s.store.pickups.len(), 1);
    }

    #[test]
    fn test_game_over_halts_and_records_best() {
        let mut s = quiet_state();
        s.best_time = 0.0;
        s.player.hp = 1.0;
        spawn(&mut s, EnemyKind::Walker, Vec2::new(5.0, 0.0));
        step(&mut s, &idle(), DT);
        assert_eq!(s.phase, SessionPhase::GameOver);
        assert!(s.best_time > 0.0);
        let at = s.elapsed;
        step(&mut s, &idle(), DT);
        assert_eq!(s.elapsed, at);
    }

    #[test]
    fn test_long_run_keeps_invariants() {
        let mut s = SimulationState::with_seed(DifficultyProfile::default(), 0.0, 2024);
        // Circle around so the knife always has work
        for frame in 0..3600 {
            let t = frame as f32 * DT;
            let input = TickInput {
                movement: Vec2::new(t.cos(), t.sin()),
                ..Default::default()
            };
            step(&mut s, &input, DT);
            if s.phase == SessionPhase::RewardOpen {
                choose_reward(&mut s, 0).expect("valid choice");
            }
            if s.is_over() {
                break;
            }
            for e in &s.store.enemies {
                assert!(e.hp >= 0.0 && e.hp <= e.hp_max);
                assert!(!e.dead);
            }
            assert!(s.player.hp <= s.player.hp_max);
            assert!(s.rage.value >= 0.0 && s.rage.value <= RAGE_MAX);
        }
        assert!(s.elapsed > 0.0);
    }
}
