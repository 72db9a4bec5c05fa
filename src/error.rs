//! Error types for the fallible edges of the simulation.
//!
//! The per-frame step never fails; these cover configuration lookup,
//! reward selection and best-time file access.

use thiserror::Error;

/// Main error type for survivor_core operations.
#[derive(Error, Debug)]
pub enum SimError {
    /// Difficulty preset name not recognised
    #[error("Unknown difficulty: {0}")]
    UnknownDifficulty(String),

    /// A reward was chosen while no reward panel is open
    #[error("No reward selection is open")]
    NoRewardOpen,

    /// Reward index outside the offered choices
    #[error("Reward index {index} out of range ({available} choices)")]
    InvalidRewardIndex { index: usize, available: usize },

    /// File system errors
    #[error("File system error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for survivor_core operations.
pub type Result<T> = std::result::Result<T, SimError>;
