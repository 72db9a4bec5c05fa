//! Difficulty presets and profiles
//!
//! A profile is chosen before a run starts and stays fixed for the run.
//! Custom profiles can be loaded from JSON; missing fields take the
//! `Normal` values.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SimError};
use crate::sim::weapons::WeaponKind;

/// Built-in difficulty levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum DifficultyPreset {
    Easy,
    #[default]
    Normal,
    Hard,
    Nightmare,
}

impl DifficultyPreset {
    pub const ALL: [DifficultyPreset; 4] = [
        DifficultyPreset::Easy,
        DifficultyPreset::Normal,
        DifficultyPreset::Hard,
        DifficultyPreset::Nightmare,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DifficultyPreset::Easy => "Easy",
            DifficultyPreset::Normal => "Normal",
            DifficultyPreset::Hard => "Hard",
            DifficultyPreset::Nightmare => "Nightmare",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "easy" | "e" => Ok(DifficultyPreset::Easy),
            "normal" | "n" | "med" => Ok(DifficultyPreset::Normal),
            "hard" | "h" => Ok(DifficultyPreset::Hard),
            "nightmare" | "nm" => Ok(DifficultyPreset::Nightmare),
            _ => Err(SimError::UnknownDifficulty(s.to_string())),
        }
    }

    /// Tuning multipliers for this preset
    pub fn profile(&self) -> DifficultyProfile {
        let normal = DifficultyProfile::default();
        match self {
            DifficultyPreset::Normal => normal,
            DifficultyPreset::Easy => DifficultyProfile {
                combo_window_mul: 1.3,
                combo_reward_mul: 1.2,
                rage_gain_mul: 1.3,
                rage_duration_mul: 1.25,
                crit_bonus: 0.05,
                bonus_weapons: vec![WeaponKind::Garlic],
                xp_base_mul: 0.9,
                xp_growth_mul: 0.9,
                xp_gain_mul: 1.2,
                enemy_hp_growth_mul: 0.8,
                enemy_speed_growth_mul: 0.85,
                enemy_damage_growth_mul: 0.75,
                spawn_rate_mul: 0.85,
                level_choice_step: 2,
                ..normal
            },
            DifficultyPreset::Hard => DifficultyProfile {
                combo_window_mul: 0.85,
                rage_gain_mul: 0.9,
                rage_duration_mul: 0.9,
                xp_base_mul: 1.1,
                xp_growth_mul: 1.1,
                xp_gain_mul: 0.95,
                enemy_hp_growth_mul: 1.3,
                enemy_speed_growth_mul: 1.15,
                enemy_damage_growth_mul: 1.25,
                spawn_rate_mul: 1.3,
                ..normal
            },
            DifficultyPreset::Nightmare => DifficultyProfile {
                combo_window_mul: 0.7,
                combo_reward_mul: 1.25,
                rage_gain_mul: 0.8,
                rage_duration_mul: 0.8,
                rage_damage_mul: 1.15,
                crit_bonus: -0.02,
                xp_base_mul: 1.2,
                xp_growth_mul: 1.25,
                enemy_hp_growth_mul: 1.6,
                enemy_speed_growth_mul: 1.3,
                enemy_damage_growth_mul: 1.5,
                spawn_rate_mul: 1.6,
                ..normal
            },
        }
    }
}

/// Multipliers applied across the simulation for one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DifficultyProfile {
    // === Combo ===
    /// Combo window duration
    pub combo_window_mul: f32,
    /// Combo multiplier growth per kill
    pub combo_reward_mul: f32,

    // === Rage ===
    pub rage_gain_mul: f32,
    pub rage_duration_mul: f32,
    pub rage_damage_mul: f32,
    pub rage_fire_rate_mul: f32,
    pub rage_speed_mul: f32,

    /// Flat bonus added to the player's critical chance
    pub crit_bonus: f32,
    /// Weapons granted at run start in addition to the Knife
    pub bonus_weapons: Vec<WeaponKind>,

    // === Experience ===
    pub xp_base_mul: f32,
    pub xp_growth_mul: f32,
    pub xp_gain_mul: f32,

    // === Enemies ===
    pub enemy_hp_growth_mul: f32,
    pub enemy_speed_growth_mul: f32,
    pub enemy_damage_growth_mul: f32,
    pub spawn_rate_mul: f32,

    /// Pending level-ups resolved per reward selection
    pub level_choice_step: u32,
}

impl Default for DifficultyProfile {
    fn default() -> Self {
        Self {
            combo_window_mul: 1.0,
            combo_reward_mul: 1.0,
            rage_gain_mul: 1.0,
            rage_duration_mul: 1.0,
            rage_damage_mul: 1.0,
            rage_fire_rate_mul: 1.0,
            rage_speed_mul: 1.0,
            crit_bonus: 0.0,
            bonus_weapons: Vec::new(),
            xp_base_mul: 1.0,
            xp_growth_mul: 1.0,
            xp_gain_mul: 1.0,
            enemy_hp_growth_mul: 1.0,
            enemy_speed_growth_mul: 1.0,
            enemy_damage_growth_mul: 1.0,
            spawn_rate_mul: 1.0,
            level_choice_step: 1,
        }
    }
}

impl DifficultyProfile {
    /// Parse a profile from JSON (missing fields fall back to `Normal`)
    pub fn from_json_str(json: &str) -> Result<Self> {
        let mut profile: DifficultyProfile = serde_json::from_str(json)?;
        profile.level_choice_step = profile.level_choice_step.max(1);
        Ok(profile)
    }

    /// Load a profile from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path.as_ref())?;
        let profile = Self::from_json_str(&json)?;
        log::info!("Loaded difficulty profile from {}", path.as_ref().display());
        Ok(profile)
    }

    /// Resolve a preset name or a path to a JSON profile
    pub fn resolve(name_or_path: &str) -> Result<Self> {
        match DifficultyPreset::parse(name_or_path) {
            Ok(preset) => Ok(preset.profile()),
            Err(err) => {
                if Path::new(name_or_path).is_file() {
                    Self::load(name_or_path)
                } else {
                    Err(err)
                }
            }
        }
    }
}
