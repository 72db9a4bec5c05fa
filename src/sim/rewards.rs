//! Reward queue, option rolling and application
//!
//! Level-ups and opened containers push a `RewardSource`. The step drains
//! the queue at one point (`drain_rewards`), opening at most one panel;
//! `choose_reward` applies the chosen option and leaves the next source
//! queued for the following step.

use std::collections::VecDeque;

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use super::state::{GameEvent, SessionPhase, SimulationState, next_xp};
use super::store::EffectKind;
use super::weapons::{PassiveKind, WeaponKind};
use crate::consts::EFFECT_LIFETIME;
use crate::error::{Result, SimError};

/// Options offered per panel
pub const CHOICE_COUNT: usize = 3;
/// Health restored by the fallback option
pub const RECOVER_HEAL: f32 = 30.0;

/// What produced a reward panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RewardSource {
    LevelUp,
    Container,
}

/// One selectable upgrade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RewardOption {
    AddWeapon(WeaponKind),
    UpgradeWeapon(WeaponKind),
    UpgradePassive(PassiveKind),
    EvolveWeapon { base: WeaponKind, evolved: WeaponKind },
    /// Fallback when nothing else can be offered
    Recover,
}

impl RewardOption {
    pub fn is_weapon(&self) -> bool {
        matches!(
            self,
            RewardOption::AddWeapon(_) | RewardOption::UpgradeWeapon(_) | RewardOption::EvolveWeapon { .. }
        )
    }

    /// Panel heading
    pub fn title(&self) -> String {
        match self {
            RewardOption::AddWeapon(kind) => format!("New: {}", kind.name()),
            RewardOption::UpgradeWeapon(kind) => format!("{} +1", kind.name()),
            RewardOption::UpgradePassive(kind) => format!("{} +1", kind.name()),
            RewardOption::EvolveWeapon { evolved, .. } => format!("EVOLVE: {}", evolved.name()),
            RewardOption::Recover => "Recover".to_string(),
        }
    }

    /// Panel body text; `level` is the level the option leads to
    pub fn describe(&self, level: u32) -> String {
        match self {
            RewardOption::AddWeapon(kind) | RewardOption::UpgradeWeapon(kind) => kind.describe(level),
            RewardOption::UpgradePassive(kind) => kind.describe().to_string(),
            RewardOption::EvolveWeapon { evolved, .. } => evolved.describe(1),
            RewardOption::Recover => format!("Restore {RECOVER_HEAL} HP."),
        }
    }
}

/// The panel currently waiting for a choice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenReward {
    pub source: RewardSource,
    pub choices: Vec<RewardOption>,
    /// Times the chosen option is applied
    pub applications: u32,
}

/// Pending reward sources and the open panel
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RewardQueue {
    pending: VecDeque<RewardSource>,
    open: Option<OpenReward>,
}

impl RewardQueue {
    pub fn push(&mut self, source: RewardSource) {
        self.pending.push_back(source);
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn open(&self) -> Option<&OpenReward> {
        self.open.as_ref()
    }

    pub fn is_idle(&self) -> bool {
        self.pending.is_empty() && self.open.is_none()
    }

    /// Pop the next source, merging up to `step - 1` further level-ups into it
    fn pop_batch(&mut self, step: u32) -> Option<(RewardSource, u32)> {
        let source = self.pending.pop_front()?;
        let mut applications = 1;
        if source == RewardSource::LevelUp {
            while applications < step.max(1) {
                let Some(pos) = self.pending.iter().position(|s| *s == RewardSource::LevelUp) else {
                    break;
                };
                self.pending.remove(pos);
                applications += 1;
            }
        }
        Some((source, applications))
    }
}

/// Roll the options for a panel
///
/// At most one evolution is offered, always first. Container panels list
/// weapon options before passives. A pool too small to fill the panel
/// gets one [`RewardOption::Recover`].
pub fn roll_choices(state: &mut SimulationState, source: RewardSource) -> Vec<RewardOption> {
    let arsenal = &state.arsenal;
    let mut choices = Vec::with_capacity(CHOICE_COUNT);

    let evolutions = arsenal.ready_evolutions();
    if !evolutions.is_empty() {
        let (base, evolved) = evolutions[state.rng.random_range(0..evolutions.len())];
        choices.push(RewardOption::EvolveWeapon { base, evolved });
    }

    let mut weapons: Vec<RewardOption> = Vec::new();
    for kind in WeaponKind::BASE {
        if arsenal.owns(kind) {
            if arsenal.can_upgrade_weapon(kind) {
                weapons.push(RewardOption::UpgradeWeapon(kind));
            }
        } else if !kind.evolution().is_some_and(|(evolved, _)| arsenal.owns(evolved)) {
            weapons.push(RewardOption::AddWeapon(kind));
        }
    }
    let mut passives: Vec<RewardOption> = PassiveKind::ALL
        .into_iter()
        .filter(|p| arsenal.passive_level(*p) < p.max_level())
        .map(RewardOption::UpgradePassive)
        .collect();

    weapons.shuffle(&mut state.rng);
    passives.shuffle(&mut state.rng);
    let pool = match source {
        RewardSource::Container => {
            weapons.extend(passives);
            weapons
        }
        RewardSource::LevelUp => {
            weapons.extend(passives);
            weapons.shuffle(&mut state.rng);
            weapons
        }
    };

    let room = CHOICE_COUNT - choices.len();
    choices.extend(pool.into_iter().take(room));
    if choices.len() < CHOICE_COUNT {
        choices.push(RewardOption::Recover);
    }
    log::debug!("Rolled {:?} reward: {:?}", source, choices);
    choices
}

/// Open the next queued panel if none is open; returns true when one opened
pub fn open_next(state: &mut SimulationState) -> bool {
    if state.rewards.open.is_some() {
        return false;
    }
    let Some((source, applications)) = state.rewards.pop_batch(state.profile.level_choice_step) else {
        return false;
    };
    let choices = roll_choices(state, source);
    state.rewards.open = Some(OpenReward {
        source,
        choices,
        applications,
    });
    true
}

/// Single drain point, run at the end of every step
pub fn drain_rewards(state: &mut SimulationState) {
    match state.phase {
        SessionPhase::Running | SessionPhase::RewardPending => {
            if open_next(state) {
                state.phase = SessionPhase::RewardOpen;
            } else if state.phase == SessionPhase::RewardPending && state.rewards.is_idle() {
                state.phase = SessionPhase::Running;
            }
        }
        SessionPhase::Paused | SessionPhase::RewardOpen | SessionPhase::GameOver => {}
    }
}

/// Apply the option at `index` of the open panel
pub fn choose_reward(state: &mut SimulationState, index: usize) -> Result<()> {
    if state.phase != SessionPhase::RewardOpen {
        return Err(SimError::NoRewardOpen);
    }
    let Some(open) = state.rewards.open.as_ref() else {
        return Err(SimError::NoRewardOpen);
    };
    let Some(option) = open.choices.get(index).copied() else {
        return Err(SimError::InvalidRewardIndex {
            index,
            available: open.choices.len(),
        });
    };
    let applications = open.applications;
    state.rewards.open = None;

    for _ in 0..applications {
        if !apply_option(state, option) {
            apply_option(state, RewardOption::Recover);
        }
    }

    state.phase = if state.rewards.pending_len() > 0 {
        SessionPhase::RewardPending
    } else {
        SessionPhase::Running
    };
    Ok(())
}

/// Apply one option; returns false when it had no effect
pub fn apply_option(state: &mut SimulationState, option: RewardOption) -> bool {
    match option {
        RewardOption::AddWeapon(kind) => {
            state.arsenal.add_weapon(kind) || state.arsenal.upgrade_weapon(kind)
        }
        RewardOption::UpgradeWeapon(kind) => state.arsenal.upgrade_weapon(kind),
        RewardOption::UpgradePassive(kind) => state.arsenal.upgrade_passive(kind, &mut state.player),
        RewardOption::EvolveWeapon { base, .. } => match state.arsenal.evolve(base) {
            Some(evolved) => {
                log::info!("{} evolved into {}", base.name(), evolved.name());
                state.emit(GameEvent::WeaponEvolved { from: base, to: evolved });
                state.announce(format!("{} EVOLVED!", evolved.name()), 0xd18cff);
                true
            }
            None => false,
        },
        RewardOption::Recover => {
            state.player.heal(RECOVER_HEAL);
            true
        }
    }
}

/// Grant experience; each threshold crossed queues one level-up
pub fn add_xp(state: &mut SimulationState, amount: f32) {
    state.player.xp += amount * state.profile.xp_gain_mul;
    while state.player.xp >= state.player.next_xp as f32 {
        state.player.xp -= state.player.next_xp as f32;
        state.player.level += 1;
        state.player.next_xp = next_xp(state.player.level, &state.profile);
        let level = state.player.level;
        state.rewards.push(RewardSource::LevelUp);
        state.emit(GameEvent::LevelUp { level });
        state.store.add_effect(EffectKind::LevelUp, state.player.pos, EFFECT_LIFETIME * 2.0);
    }
}

/// Queue a container reward
pub fn open_container(state: &mut SimulationState) {
    state.rewards.push(RewardSource::Container);
    state.emit(GameEvent::ChestOpened);
}
