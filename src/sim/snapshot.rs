//! Read-only view of a run for renderers, HUDs and audio
//!
//! A `Snapshot` owns copies of everything it shows, so a host can serialize
//! it or hand it to another thread without touching the live state.

use glam::Vec2;
use serde::Serialize;

use super::meters::{RAGE_MAX, RageDisplay};
use super::rewards::{RewardOption, RewardSource};
use super::state::{Announcement, GameEvent, SessionPhase, SimulationState};
use super::store::{EffectKind, EnemyKind, EntityId, PickupKind};
use super::weapons::{PassiveKind, WeaponKind};
use super::world::{Landmark, Obstacle};

#[derive(Debug, Clone, Serialize)]
pub struct PlayerView {
    pub pos: Vec2,
    pub facing: Vec2,
    pub radius: f32,
    pub hp: f32,
    pub hp_max: f32,
    pub level: u32,
    pub xp: f32,
    pub next_xp: u32,
    pub invulnerable: bool,
    pub dashing: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct EnemyView {
    pub id: EntityId,
    pub kind: EnemyKind,
    pub pos: Vec2,
    pub radius: f32,
    pub health: f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjectileView {
    pub id: EntityId,
    pub kind: &'static str,
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    pub hostile: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct PickupView {
    pub id: EntityId,
    pub kind: PickupKind,
    pub pos: Vec2,
    pub radius: f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct EffectView {
    pub kind: EffectKind,
    pub pos: Vec2,
    /// 0 when spawned, 1 when about to vanish
    pub progress: f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct WeaponView {
    pub kind: WeaponKind,
    pub name: &'static str,
    pub level: u32,
    pub description: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PassiveView {
    pub kind: PassiveKind,
    pub name: &'static str,
    pub level: u32,
}

/// Rage gauge as the HUD shows it
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum RageView {
    /// Charge percentage, 0..=100
    Charging { percent: f32 },
    /// Seconds of rage left
    Active { remaining: f32 },
}

#[derive(Debug, Clone, Serialize)]
pub struct RewardChoiceView {
    pub option: RewardOption,
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RewardPanelView {
    pub source: RewardSource,
    pub choices: Vec<RewardChoiceView>,
    pub applications: u32,
}

/// Everything a presentation layer needs for one frame
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub phase: SessionPhase,
    pub elapsed: f32,
    pub best_time: f32,
    pub kills: u32,
    pub wave: u32,
    pub player: PlayerView,
    pub enemies: Vec<EnemyView>,
    pub projectiles: Vec<ProjectileView>,
    pub pickups: Vec<PickupView>,
    pub effects: Vec<EffectView>,
    /// Obstacles of generated chunks inside the view
    pub obstacles: Vec<Obstacle>,
    pub landmarks: Vec<Landmark>,
    pub weapons: Vec<WeaponView>,
    pub passives: Vec<PassiveView>,
    pub combo: u32,
    pub combo_multiplier: f32,
    /// Seconds left on the major-milestone crit buff
    pub combo_crit_buff: f32,
    pub rage: RageView,
    pub crit_chance: f32,
    pub announcement: Option<Announcement>,
    pub reward: Option<RewardPanelView>,
    /// Cues emitted since the host last drained them
    pub events: Vec<GameEvent>,
}

impl Snapshot {
    pub fn capture(state: &SimulationState) -> Self {
        let p = &state.player;
        let player = PlayerView {
            pos: p.pos,
            facing: p.facing,
            radius: p.radius,
            hp: p.hp,
            hp_max: p.hp_max,
            level: p.level,
            xp: p.xp,
            next_xp: p.next_xp,
            invulnerable: p.iframes > 0.0,
            dashing: p.dash.is_active(),
        };

        let enemies = state
            .store
            .alive_enemies()
            .map(|e| EnemyView {
                id: e.id,
                kind: e.kind,
                pos: e.pos,
                radius: e.radius,
                health: e.health_fraction(),
            })
            .collect();

        let projectiles = state
            .store
            .projectiles
            .iter()
            .filter(|pr| !pr.expired)
            .map(|pr| ProjectileView {
                id: pr.id,
                kind: pr.kind.as_str(),
                pos: pr.pos,
                vel: pr.vel,
                radius: pr.radius,
                hostile: pr.kind.is_hostile(),
            })
            .collect();

        let pickups = state
            .store
            .pickups
            .iter()
            .filter(|pk| !pk.collected)
            .map(|pk| PickupView {
                id: pk.id,
                kind: pk.kind,
                pos: pk.pos,
                radius: pk.radius,
            })
            .collect();

        let effects = state
            .store
            .effects
            .iter()
            .map(|f| EffectView {
                kind: f.kind,
                pos: f.pos,
                progress: if f.lifetime > 0.0 {
                    (f.age / f.lifetime).clamp(0.0, 1.0)
                } else {
                    1.0
                },
            })
            .collect();

        let obstacles = state.world.generated_obstacles_in(&state.view_rect());

        let weapons = state
            .arsenal
            .weapons()
            .map(|(kind, slot)| WeaponView {
                kind,
                name: kind.name(),
                level: slot.level,
                description: kind.describe(slot.level),
            })
            .collect();

        let passives = state
            .arsenal
            .passives()
            .map(|(kind, level)| PassiveView {
                kind,
                name: kind.name(),
                level,
            })
            .collect();

        let rage = match state.rage.display() {
            RageDisplay::Charging(value) => RageView::Charging {
                percent: value / RAGE_MAX * 100.0,
            },
            RageDisplay::Active(remaining) => RageView::Active { remaining },
        };

        let reward = state.rewards.open().map(|panel| RewardPanelView {
            source: panel.source,
            applications: panel.applications,
            choices: panel
                .choices
                .iter()
                .map(|option| RewardChoiceView {
                    option: *option,
                    title: option.title(),
                    description: option.describe(option_target_level(state, option)),
                })
                .collect(),
        });

        Self {
            phase: state.phase,
            elapsed: state.elapsed,
            best_time: state.best_time,
            kills: state.kills,
            wave: state.director.wave,
            player,
            enemies,
            projectiles,
            pickups,
            effects,
            obstacles,
            landmarks: state.world.landmarks.clone(),
            weapons,
            passives,
            combo: state.combo.count,
            combo_multiplier: state.combo.multiplier(&state.profile),
            combo_crit_buff: state.combo.crit_buff_remaining(),
            rage,
            crit_chance: state.crit_chance(),
            announcement: state.announcement.clone(),
            reward,
            events: state.events.clone(),
        }
    }

    /// Serialize for hosts that consume JSON
    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Level a reward option leads to, for its description
fn option_target_level(state: &SimulationState, option: &RewardOption) -> u32 {
    match option {
        RewardOption::AddWeapon(_) | RewardOption::EvolveWeapon { .. } => 1,
        RewardOption::UpgradeWeapon(kind) => state.arsenal.weapon_level(*kind) + 1,
        RewardOption::UpgradePassive(kind) => state.arsenal.passive_level(*kind) + 1,
        RewardOption::Recover => 0,
    }
}
