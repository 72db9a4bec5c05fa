//! Session state and core simulation types
//!
//! `SimulationState` owns everything a run mutates. Subsystems receive it
//! by `&mut` and keep no copies, so resetting a run means rebuilding it.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::combat::PendingBurst;
use super::director::Director;
use super::meters::{ComboMeter, RageMeter};
use super::rewards::RewardQueue;
use super::store::{EnemyKind, EntityStore};
use super::targeting::ViewRect;
use super::weapons::{Arsenal, WeaponKind};
use super::world::World;
use crate::consts::*;
use crate::difficulty::DifficultyProfile;

/// Current phase of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionPhase {
    /// Active gameplay
    Running,
    /// Frozen by the pause trigger
    Paused,
    /// A reward is queued and will open at the end of the next step
    RewardPending,
    /// A reward panel is waiting for a choice
    RewardOpen,
    /// Player died; the run is over
    GameOver,
}

impl SessionPhase {
    /// Whether the world advances this step
    pub fn is_simulating(&self) -> bool {
        matches!(self, SessionPhase::Running)
    }
}

/// Dash ability state
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Dash {
    /// Time until the dash can be used again
    pub cooldown: f32,
    /// Remaining dash time (0 when not dashing)
    pub active: f32,
    pub mult: f32,
}

impl Default for Dash {
    fn default() -> Self {
        Self {
            cooldown: 0.0,
            active: 0.0,
            mult: DASH_SPEED_MULT,
        }
    }
}

impl Dash {
    /// Start a dash if off cooldown
    pub fn trigger(&mut self) -> bool {
        if self.cooldown > 0.0 {
            return false;
        }
        self.active = DASH_DURATION;
        self.cooldown = DASH_COOLDOWN;
        true
    }

    pub fn update(&mut self, dt: f32) {
        self.cooldown = (self.cooldown - dt).max(0.0);
        self.active = (self.active - dt).max(0.0);
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.active > 0.0
    }

    pub fn speed_mul(&self) -> f32 {
        if self.is_active() { self.mult } else { 1.0 }
    }
}

/// The player avatar
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub pos: Vec2,
    /// Last non-zero movement direction
    pub facing: Vec2,
    pub radius: f32,
    pub hp: f32,
    pub hp_max: f32,
    pub base_speed: f32,
    pub speed_mul: f32,
    /// Flat reduction of every incoming hit
    pub armor: f32,
    /// HP per second
    pub regen: f32,
    /// Pickup radius multiplier
    pub magnet: f32,
    /// Remaining invulnerability
    pub iframes: f32,
    pub dash: Dash,
    pub xp: f32,
    pub level: u32,
    pub next_xp: u32,
    pub damage_mul: f32,
    pub area_mul: f32,
    pub cooldown_mul: f32,
    pub proj_speed_mul: f32,
    pub crit_chance: f32,
    pub crit_mult: f32,
}

impl Default for Player {
    fn default() -> Self {
        Self {
            pos: Vec2::ZERO,
            facing: Vec2::X,
            radius: PLAYER_RADIUS,
            hp: PLAYER_HP,
            hp_max: PLAYER_HP,
            base_speed: PLAYER_SPEED,
            speed_mul: 1.0,
            armor: 0.0,
            regen: 0.0,
            magnet: 1.0,
            iframes: 0.0,
            dash: Dash::default(),
            xp: 0.0,
            level: 1,
            next_xp: next_xp(1, &DifficultyProfile::default()),
            damage_mul: 1.0,
            area_mul: 1.0,
            cooldown_mul: 1.0,
            proj_speed_mul: 1.0,
            crit_chance: PLAYER_CRIT_CHANCE,
            crit_mult: PLAYER_CRIT_MULT,
        }
    }
}

impl Player {
    /// Restore health up to the maximum; returns the amount actually healed
    pub fn heal(&mut self, amount: f32) -> f32 {
        let before = self.hp;
        self.hp = (self.hp + amount.max(0.0)).min(self.hp_max);
        self.hp - before
    }

    /// Movement speed before terrain and rage modifiers
    pub fn move_speed(&self) -> f32 {
        self.base_speed * self.speed_mul * self.dash.speed_mul()
    }

    pub fn magnet_radius(&self) -> f32 {
        MAGNET_RADIUS * self.magnet
    }

    #[inline]
    pub fn is_dead(&self) -> bool {
        self.hp <= 0.0
    }
}

/// Experience needed to advance from `level` to `level + 1`
///
/// The base is floored at [`XP_FLOOR`] and growth per level is at least 1,
/// so the curve is strictly increasing and never drops below the floor.
pub fn next_xp(level: u32, profile: &DifficultyProfile) -> u32 {
    let base = (XP_BASE * profile.xp_base_mul).max(XP_FLOOR as f32);
    let growth = (XP_GROWTH * profile.xp_growth_mul).max(1.0);
    (base + level.saturating_sub(1) as f32 * growth).floor() as u32
}

/// One-shot cues for audio, screen effects and the HUD
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    Kill { kind: EnemyKind },
    CriticalHit,
    LevelUp { level: u32 },
    ChestOpened,
    RageActivated,
    RageEnded,
    WeaponEvolved { from: WeaponKind, to: WeaponKind },
    BossSpawned,
    WaveStarted { wave: u32 },
    LandmarkDiscovered { name: String },
    PlayerHurt { amount: f32 },
    ComboMilestone { count: u32 },
    GameOver { elapsed: f32 },
    NewBestTime { seconds: f32 },
}

/// Short-lived banner text with a color hint (0xRRGGBB)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Announcement {
    pub text: String,
    pub color: u32,
    pub ttl: f32,
}

/// How long a banner stays up
pub const ANNOUNCEMENT_TTL: f32 = 2.4;

/// Complete state of one run
#[derive(Debug, Clone)]
pub struct SimulationState {
    /// Seed the session RNG was created from
    pub seed: u64,
    pub rng: Pcg32,
    pub profile: DifficultyProfile,
    pub phase: SessionPhase,
    /// Simulated seconds survived
    pub elapsed: f32,
    pub kills: u32,
    /// Best completion time known at boot, updated on game over
    pub best_time: f32,
    pub player: Player,
    pub store: EntityStore,
    pub world: World,
    pub arsenal: Arsenal,
    pub director: Director,
    pub combo: ComboMeter,
    pub rage: RageMeter,
    pub rewards: RewardQueue,
    /// Visible area size in world units
    pub viewport: Vec2,
    /// Cues emitted since the last `take_events`
    pub events: Vec<GameEvent>,
    pub announcement: Option<Announcement>,
    /// Combo explosions waiting to resolve this step
    pub bursts: Vec<PendingBurst>,
}

impl SimulationState {
    /// Start a run with a seed taken from the OS
    pub fn new(profile: DifficultyProfile, best_time: f32) -> Self {
        let seed = rand::random::<u64>();
        Self::with_seed(profile, best_time, seed)
    }

    /// Start a run with an explicit seed (reproducible in tests)
    pub fn with_seed(profile: DifficultyProfile, best_time: f32, seed: u64) -> Self {
        let mut player = Player::default();
        player.next_xp = next_xp(1, &profile);

        let mut arsenal = Arsenal::default();
        arsenal.add_weapon(WeaponKind::Knife);
        for kind in &profile.bonus_weapons {
            arsenal.add_weapon(*kind);
        }

        log::info!(
            "Run started (seed {seed}, {} starting weapons)",
            arsenal.weapons().count()
        );

        Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            profile,
            phase: SessionPhase::Running,
            elapsed: 0.0,
            kills: 0,
            best_time,
            player,
            store: EntityStore::default(),
            world: World::default(),
            arsenal,
            director: Director::default(),
            combo: ComboMeter::default(),
            rage: RageMeter::default(),
            rewards: RewardQueue::default(),
            viewport: Vec2::new(DEFAULT_VIEW_WIDTH, DEFAULT_VIEW_HEIGHT),
            events: Vec::new(),
            announcement: None,
            bursts: Vec::new(),
        }
    }

    /// Rebuild the run with the same profile, keeping the best time and viewport
    pub fn reset(&mut self) {
        let viewport = self.viewport;
        let seed = self.rng.random::<u64>();
        *self = Self::with_seed(self.profile.clone(), self.best_time, seed);
        self.viewport = viewport;
    }

    /// Rectangle visible on screen, centred on the player
    pub fn view_rect(&self) -> ViewRect {
        ViewRect::new(self.player.pos, self.viewport)
    }

    /// Replace the banner text
    pub fn announce(&mut self, text: impl Into<String>, color: u32) {
        self.announcement = Some(Announcement {
            text: text.into(),
            color,
            ttl: ANNOUNCEMENT_TTL,
        });
    }

    #[inline]
    pub fn emit(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    /// Drain the cues collected so far
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Current critical chance including rage and combo bonuses
    pub fn crit_chance(&self) -> f32 {
        (self.player.crit_chance
            + self.profile.crit_bonus
            + self.rage.crit_bonus()
            + self.combo.crit_bonus())
        .clamp(0.0, CRIT_CHANCE_CAP)
    }

    pub fn is_over(&self) -> bool {
        self.phase == SessionPhase::GameOver
    }
}
