//! Best survival time record
//!
//! The only value persisted between runs. Stored as a small JSON document.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Longest survival time achieved so far
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct BestTime {
    /// Seconds survived
    pub seconds: f32,
}

impl BestTime {
    /// Default file name used by the native runner
    pub const FILE_NAME: &'static str = "survivors_save_v1.json";

    pub fn new(seconds: f32) -> Self {
        Self { seconds }
    }

    /// Check if a run time beats the record
    pub fn qualifies(&self, seconds: f32) -> bool {
        seconds > self.seconds
    }

    /// Record a finished run; returns true if it set a new best
    pub fn submit(&mut self, seconds: f32) -> bool {
        if !self.qualifies(seconds) {
            return false;
        }
        self.seconds = seconds;
        true
    }

    /// Submit a run time and persist it when it sets a new best
    pub fn record(&mut self, seconds: f32, path: impl AsRef<Path>) -> Result<bool> {
        if !self.submit(seconds) {
            return Ok(false);
        }
        self.save(path)?;
        Ok(true)
    }

    /// Load the record; a missing file means no record yet
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            log::info!("No best time found, starting fresh");
            return Ok(Self::default());
        }
        let json = std::fs::read_to_string(path)?;
        let record: BestTime = serde_json::from_str(&json)?;
        log::info!("Loaded best time {}", format_time(record.seconds));
        Ok(record)
    }

    /// Load the record, falling back to zero when the file is unreadable
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        match Self::load(path) {
            Ok(record) => record,
            Err(err) => {
                log::warn!("Ignoring unreadable best time: {err}");
                Self::default()
            }
        }
    }

    /// Write the record (temp file + rename so a crash never truncates it)
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let tmp = path.with_extension("tmp");
        std::fs::write(&tmp, serde_json::to_string(self)?)?;
        std::fs::rename(&tmp, path)?;
        log::info!("Best time saved ({})", format_time(self.seconds));
        Ok(())
    }
}

/// Format seconds as `mm:ss`
pub fn format_time(seconds: f32) -> String {
    let total = seconds.max(0.0).floor() as u32;
    format!("{:02}:{:02}", total / 60, total % 60)
}
