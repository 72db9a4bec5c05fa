//! Combo and rage meters
//!
//! Both meters are plain state machines driven by the step; they never
//! touch entities. Callers react to the values they return (milestone
//! bursts, activation cues).

use serde::{Deserialize, Serialize};

use crate::difficulty::DifficultyProfile;

/// Base combo window (seconds between kills)
pub const COMBO_WINDOW: f32 = 2.5;
/// Combo multiplier growth per kill in the streak
pub const COMBO_STEP: f32 = 0.02;
pub const COMBO_MULTIPLIER_CAP: f32 = 2.0;
/// Every Nth combo kill triggers a small burst
pub const COMBO_MINOR_EVERY: u32 = 5;
/// Every Mth combo kill triggers a large burst
pub const COMBO_MAJOR_EVERY: u32 = 15;
pub const COMBO_CRIT_BUFF: f32 = 0.15;
pub const COMBO_CRIT_BUFF_DURATION: f32 = 5.0;

pub const RAGE_MAX: f32 = 100.0;
pub const RAGE_DURATION: f32 = 8.0;
pub const RAGE_DECAY_PER_SEC: f32 = 1.5;
pub const RAGE_PER_DAMAGE_DEALT: f32 = 0.015;
pub const RAGE_PER_KILL: f32 = 1.0;
pub const RAGE_PER_DAMAGE_TAKEN: f32 = 1.2;
pub const RAGE_DAMAGE_MUL: f32 = 1.35;
pub const RAGE_FIRE_RATE_MUL: f32 = 1.3;
pub const RAGE_SPEED_MUL: f32 = 1.2;
pub const RAGE_CRIT_BONUS: f32 = 0.10;

/// Kill-streak reward tiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComboMilestone {
    Minor,
    Major,
}

impl ComboMilestone {
    pub fn blast_radius(&self) -> f32 {
        match self {
            ComboMilestone::Minor => 70.0,
            ComboMilestone::Major => 130.0,
        }
    }

    pub fn blast_damage(&self) -> f32 {
        match self {
            ComboMilestone::Minor => 20.0,
            ComboMilestone::Major => 45.0,
        }
    }

    pub fn bonus_xp(&self) -> f32 {
        match self {
            ComboMilestone::Minor => 3.0,
            ComboMilestone::Major => 10.0,
        }
    }
}

/// Kill streak counter
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ComboMeter {
    pub count: u32,
    /// Time left before the streak lapses
    pub timer: f32,
    /// Best streak this run
    pub best: u32,
    crit_buff_timer: f32,
}

impl ComboMeter {
    pub fn window(profile: &DifficultyProfile) -> f32 {
        COMBO_WINDOW * profile.combo_window_mul
    }

    /// Register a kill; returns the milestone reached, if any
    pub fn register_kill(&mut self, profile: &DifficultyProfile) -> Option<ComboMilestone> {
        self.count = if self.timer > 0.0 { self.count + 1 } else { 1 };
        self.timer = Self::window(profile);
        self.best = self.best.max(self.count);

        if self.count % COMBO_MAJOR_EVERY == 0 {
            self.crit_buff_timer = COMBO_CRIT_BUFF_DURATION;
            Some(ComboMilestone::Major)
        } else if self.count % COMBO_MINOR_EVERY == 0 {
            Some(ComboMilestone::Minor)
        } else {
            None
        }
    }

    /// Advance timers; returns true when the streak just lapsed
    pub fn update(&mut self, dt: f32) -> bool {
        self.crit_buff_timer = (self.crit_buff_timer - dt).max(0.0);
        if self.timer > 0.0 {
            self.timer -= dt;
            if self.timer <= 0.0 {
                self.timer = 0.0;
                let lapsed = self.count > 0;
                self.count = 0;
                return lapsed;
            }
        }
        false
    }

    /// Experience multiplier from the current streak
    pub fn multiplier(&self, profile: &DifficultyProfile) -> f32 {
        (1.0 + COMBO_STEP * self.count as f32 * profile.combo_reward_mul).clamp(1.0, COMBO_MULTIPLIER_CAP)
    }

    /// Temporary critical chance from a major milestone
    pub fn crit_bonus(&self) -> f32 {
        if self.crit_buff_timer > 0.0 { COMBO_CRIT_BUFF } else { 0.0 }
    }

    pub fn crit_buff_remaining(&self) -> f32 {
        self.crit_buff_timer
    }
}

/// What the HUD should show for the rage bar
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum RageDisplay {
    /// Resource fill, 0..=100
    Charging(f32),
    /// Seconds of rage remaining
    Active(f32),
}

/// Rage resource and timed buff
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RageMeter {
    /// Resource, always within 0..=RAGE_MAX
    pub value: f32,
    /// Remaining rage time (0 when inactive)
    pub active_timer: f32,
    /// Total duration of the current activation
    pub duration: f32,
    /// Activations this run
    pub activations: u32,
}

impl RageMeter {
    pub fn is_active(&self) -> bool {
        self.active_timer > 0.0
    }

    /// Feed the meter; returns true exactly when this gain activates rage
    pub fn add(&mut self, amount: f32, profile: &DifficultyProfile) -> bool {
        if self.is_active() || amount <= 0.0 {
            return false;
        }
        self.value = (self.value + amount * profile.rage_gain_mul).min(RAGE_MAX);
        if self.value >= RAGE_MAX {
            self.duration = RAGE_DURATION * profile.rage_duration_mul;
            self.active_timer = self.duration;
            self.activations += 1;
            return true;
        }
        false
    }

    pub fn add_damage_dealt(&mut self, amount: f32, profile: &DifficultyProfile) -> bool {
        self.add(amount * RAGE_PER_DAMAGE_DEALT, profile)
    }

    pub fn add_kill(&mut self, profile: &DifficultyProfile) -> bool {
        self.add(RAGE_PER_KILL, profile)
    }

    pub fn add_damage_taken(&mut self, amount: f32, profile: &DifficultyProfile) -> bool {
        self.add(amount * RAGE_PER_DAMAGE_TAKEN, profile)
    }

    /// Advance timers; returns true when rage just ended
    pub fn update(&mut self, dt: f32) -> bool {
        if self.is_active() {
            self.active_timer -= dt;
            if self.active_timer <= 0.0 {
                self.active_timer = 0.0;
                self.value = 0.0;
                return true;
            }
        } else {
            self.value = (self.value - RAGE_DECAY_PER_SEC * dt).max(0.0);
        }
        false
    }

    pub fn display(&self) -> RageDisplay {
        if self.is_active() {
            RageDisplay::Active(self.active_timer)
        } else {
            RageDisplay::Charging(self.value)
        }
    }

    pub fn damage_mul(&self, profile: &DifficultyProfile) -> f32 {
        if self.is_active() { RAGE_DAMAGE_MUL * profile.rage_damage_mul } else { 1.0 }
    }

    pub fn fire_rate_mul(&self, profile: &DifficultyProfile) -> f32 {
        if self.is_active() { RAGE_FIRE_RATE_MUL * profile.rage_fire_rate_mul } else { 1.0 }
    }

    pub fn speed_mul(&self, profile: &DifficultyProfile) -> f32 {
        if self.is_active() { RAGE_SPEED_MUL * profile.rage_speed_mul } else { 1.0 }
    }

    pub fn crit_bonus(&self) -> f32 {
        if self.is_active() { RAGE_CRIT_BONUS } else { 0.0 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_two_quick_kills_build_combo() {
        let profile = DifficultyProfile::default();
        let mut combo = ComboMeter::default();
        combo.register_kill(&profile);
        combo.update(0.5);
        combo.register_kill(&profile);
        assert_eq!(combo.count, 2);
        assert!(combo.multiplier(&profile) > 1.0);
    }

    #[test]
    fn test_combo_lapses_to_zero() {
        let profile = DifficultyProfile::default();
        let mut combo = ComboMeter::default();
        combo.register_kill(&profile);
        combo.register_kill(&profile);
        assert!(!combo.update(COMBO_WINDOW - 0.1));
        assert!(combo.update(0.2));
        assert_eq!(combo.count, 0);
        assert_eq!(combo.multiplier(&profile), 1.0);
        // Next kill starts a new streak at 1
        combo.register_kill(&profile);
        assert_eq!(combo.count, 1);
        assert_eq!(combo.best, 2);
    }

    #[test]
    fn test_combo_milestones() {
        let profile = DifficultyProfile::default();
        let mut combo = ComboMeter::default();
        let mut milestones = Vec::new();
        for _ in 0..15 {
            if let Some(m) = combo.register_kill(&profile) {
                milestones.push((combo.count, m));
            }
        }
        assert_eq!(
            milestones,
            vec![
                (5, ComboMilestone::Minor),
                (10, ComboMilestone::Minor),
                (15, ComboMilestone::Major)
            ]
        );
        assert_eq!(combo.crit_bonus(), COMBO_CRIT_BUFF);
        combo.update(COMBO_CRIT_BUFF_DURATION + 0.1);
        assert_eq!(combo.crit_bonus(), 0.0);
    }

    #[test]
    fn test_combo_multiplier_capped() {
        let profile = DifficultyProfile::default();
        let mut combo = ComboMeter::default();
        for _ in 0..500 {
            combo.register_kill(&profile);
        }
        assert_eq!(combo.multiplier(&profile), COMBO_MULTIPLIER_CAP);
    }

    #[test]
    fn test_rage_activates_exactly_once() {
        let profile = DifficultyProfile::default();
        let mut rage = RageMeter::default();
        let mut activations = 0;
        for _ in 0..40 {
            if rage.add_damage_taken(5.0, &profile) {
                activations += 1;
            }
            if rage.add_kill(&profile) {
                activations += 1;
            }
            assert!(rage.value >= 0.0 && rage.value <= RAGE_MAX);
        }
        assert_eq!(activations, 1);
        assert!(rage.is_active());
        assert!(matches!(rage.display(), RageDisplay::Active(t) if t <= RAGE_DURATION));
    }

    #[test]
    fn test_rage_expires_and_decays() {
        let profile = DifficultyProfile::default();
        let mut rage = RageMeter::default();
        assert!(rage.add(RAGE_MAX, &profile));
        assert!(rage.damage_mul(&profile) > 1.0);
        assert!(!rage.update(RAGE_DURATION - 1.0));
        assert!(rage.update(1.5));
        assert!(!rage.is_active());
        assert_eq!(rage.value, 0.0);
        assert_eq!(rage.damage_mul(&profile), 1.0);

        rage.add(40.0, &profile);
        rage.update(2.0);
        assert!((rage.value - (40.0 - 2.0 * RAGE_DECAY_PER_SEC)).abs() < 1e-4);
    }

    #[test]
    fn test_rage_duration_scaled_by_profile() {
        let profile = DifficultyProfile {
            rage_duration_mul: 2.0,
            ..Default::default()
        };
        let mut rage = RageMeter::default();
        rage.add(RAGE_MAX, &profile);
        assert_eq!(rage.active_timer, RAGE_DURATION * 2.0);
    }

    proptest! {
        #[test]
        fn prop_rage_bounded(gains in proptest::collection::vec(0.0f32..500.0, 1..60)) {
            let profile = DifficultyProfile::default();
            let mut rage = RageMeter::default();
            let mut activations = 0;
            for g in gains {
                if rage.add(g, &profile) {
                    activations += 1;
                }
                prop_assert!(rage.value >= 0.0 && rage.value <= RAGE_MAX);
            }
            prop_assert!(activations <= 1);
        }
    }
}
