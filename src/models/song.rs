use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Catalog song as seen by the engine. Read-only for the duration of a call.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
pub struct Song {
    pub id: String,
    pub title: String,
    pub artist: String,
    #[validate(range(min = 1, max = 5))]
    pub vocal_intensity: u8,
    #[validate(range(min = 1, max = 5))]
    pub energy_level: u8,
    #[serde(default)]
    pub play_count: u32,
    #[serde(default)]
    pub last_played_at: Option<DateTime<Utc>>,
}

impl Song {
    pub fn is_high_intensity(&self, threshold: u8) -> bool {
        self.vocal_intensity >= threshold
    }

    pub fn display_name(&self) -> String {
        format!("{} - {}", self.artist, self.title)
    }
}
