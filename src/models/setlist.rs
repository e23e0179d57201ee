use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::{GenerationWarning, Song};

/// Upper bound on `songs_per_set`; keep in step with the range on [`SetConfig`].
pub const MAX_SONGS_PER_SET: usize = 500;

/// Shape of one set within a setlist.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Validate, PartialEq, Eq)]
pub struct SetConfig {
    #[validate(range(min = 1))]
    pub set_index: u32,
    /// Advisory for manual edits, a hard target for generation
    #[validate(range(min = 1, max = 500))]
    pub songs_per_set: usize,
}

/// One song placed in a set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct SetlistItem {
    pub id: Uuid,
    pub song_id: String,
    pub set_index: u32,
    pub position: usize,
    #[serde(default)]
    pub is_pinned: bool,
}

impl SetlistItem {
    pub fn new(song_id: impl Into<String>, set_index: u32, position: usize, is_pinned: bool) -> Self {
        Self {
            id: Uuid::new_v4(),
            song_id: song_id.into(),
            set_index,
            position,
            is_pinned,
        }
    }
}

/// A locked (set, position, song) assignment from a template or the generation form.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PinnedSlot {
    pub set_index: u32,
    pub position: usize,
    pub song_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub songs: Vec<Song>,
    pub sets: Vec<SetConfig>,
    #[serde(default)]
    pub pinned_slots: Vec<PinnedSlot>,
    #[serde(default)]
    pub excluded_song_ids: Vec<String>,
    /// Reference time for freshness; defaults to the current time
    #[serde(default)]
    pub now: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationResult {
    pub items: Vec<SetlistItem>,
    pub warnings: Vec<GenerationWarning>,
}

impl GenerationResult {
    pub fn warning_messages(&self) -> Vec<String> {
        self.warnings.iter().map(|w| w.to_string()).collect()
    }

    pub fn items_in_set(&self, set_index: u32) -> impl Iterator<Item = &SetlistItem> {
        self.items.iter().filter(move |item| item.set_index == set_index)
    }
}

/// One edit in a batch replayed over an item snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum EditOperation {
    Insert {
        song_id: String,
        set_index: u32,
        position: usize,
        #[serde(default)]
        is_pinned: bool,
    },
    Move {
        item_id: Uuid,
        to_set_index: u32,
        to_position: usize,
    },
    Remove {
        item_id: Uuid,
    },
    Swap {
        item_id: Uuid,
        new_song_id: String,
    },
    ClearSet {
        set_index: u32,
        #[serde(default)]
        keep_pinned: bool,
    },
    ClearAll {
        #[serde(default)]
        keep_pinned: bool,
    },
}
