//! Frame-stepped simulation module
//!
//! All gameplay logic lives here. This module stays free of rendering,
//! audio and platform code:
//! - One `SimulationState` aggregate, passed by `&mut` into every system
//! - Seeded RNG only (session `Pcg32`, per-chunk `Pcg32` for the world)
//! - Entities are flagged for removal and compacted once per step
//! - Reward panels drain at a single point at the end of `step`

pub mod collision;
pub mod combat;
pub mod director;
pub mod meters;
pub mod rewards;
pub mod snapshot;
pub mod state;
pub mod store;
pub mod targeting;
pub mod tick;
pub mod weapons;
pub mod world;

pub use combat::{DamageOutcome, apply_damage, explode_at, hurt_player};
pub use director::Director;
pub use meters::{ComboMeter, ComboMilestone, RageDisplay, RageMeter};
pub use rewards::{OpenReward, RewardOption, RewardQueue, RewardSource, add_xp, choose_reward};
pub use snapshot::Snapshot;
pub use state::{Announcement, GameEvent, Player, SessionPhase, SimulationState, next_xp};
pub use store::{
    Effect, EffectKind, Enemy, EnemyKind, EntityId, EntityStore, Pickup, PickupKind, Projectile,
    ProjectileKind,
};
pub use tick::{TickInput, step};
pub use weapons::{Arsenal, PassiveKind, WeaponKind};
pub use world::{Landmark, Obstacle, ObstacleKind, World};
