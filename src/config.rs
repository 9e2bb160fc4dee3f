use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::BuildError;

/// Process-wide tunables for macro construction and playback.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Notes this close (seconds) to the first note of a group count as one
    /// chord.
    pub chord_window: f64,
    /// Stagger (seconds) applied per note when rolling a chord.
    pub chord_roll_step: f64,
    /// Lowest playable pitch after transposition.
    pub window_min: u8,
    /// Highest playable pitch after transposition.
    pub window_max: u8,
    /// Base pitch of each key row, low to high.
    pub key_rows: [u8; 3],
    /// Silence between playlist entries, seconds.
    pub playlist_gap: f64,
    /// Delay before the first keystroke so the user can focus the target
    /// window, seconds.
    pub lead_in: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            chord_window: 0.020,
            chord_roll_step: 0.005,
            window_min: 48,
            window_max: 83,
            key_rows: [48, 60, 72],
            playlist_gap: 5.0,
            lead_in: 2.0,
        }
    }
}

impl Config {
    pub fn save(&self, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        let ron_string = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())?;
        fs::write(path, ron_string)?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let ron_string = fs::read_to_string(path).map_err(|source| BuildError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config = ron::from_str(&ron_string)?;
        Ok(config)
    }
}
