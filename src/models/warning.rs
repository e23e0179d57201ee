//! Warnings returned alongside successful results.
//!
//! None of these are errors: a short song pool, a tiring run of vocals or an
//! overfilled set are all things a person resolves by hand or by regenerating.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Three consecutive demanding vocals within one set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PacingWarning {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub set_index: Option<u32>,
    /// Position of the first song in the run
    pub start_position: usize,
    pub titles: Vec<String>,
}

impl fmt::Display for PacingWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(set_index) = self.set_index {
            write!(f, "Set {}: ", set_index)?;
        }
        write!(
            f,
            "{} high-intensity vocals in a row at positions {} ({})",
            self.titles.len(),
            format_positions(
                &(self.start_position..self.start_position + self.titles.len()).collect::<Vec<_>>()
            ),
            self.titles.join(", ")
        )
    }
}

/// A set holding more songs than its configured target.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CapacityWarning {
    pub set_index: u32,
    pub count: usize,
    pub songs_per_set: usize,
}

impl fmt::Display for CapacityWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Set {} has {} songs but is configured for {} ({} over)",
            self.set_index,
            self.count,
            self.songs_per_set,
            self.count.saturating_sub(self.songs_per_set)
        )
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PinSkipReason {
    OutOfRange,
    PositionTaken,
    Excluded,
    AlreadyPinned,
}

impl fmt::Display for PinSkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            PinSkipReason::OutOfRange => "position is outside the set",
            PinSkipReason::PositionTaken => "position already pinned",
            PinSkipReason::Excluded => "song is excluded",
            PinSkipReason::AlreadyPinned => "song is pinned elsewhere",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GenerationWarning {
    Unfillable {
        set_index: u32,
        positions: Vec<usize>,
    },
    Pacing(PacingWarning),
    PinSkipped {
        set_index: u32,
        position: usize,
        song_id: String,
        reason: PinSkipReason,
    },
}

impl fmt::Display for GenerationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenerationWarning::Unfillable {
                set_index,
                positions,
            } => write!(
                f,
                "Set {}: not enough songs to fill position{} {}",
                set_index,
                if positions.len() == 1 { "" } else { "s" },
                format_positions(positions)
            ),
            GenerationWarning::Pacing(warning) => fmt::Display::fmt(warning, f),
            GenerationWarning::PinSkipped {
                set_index,
                position,
                song_id,
                reason,
            } => write!(
                f,
                "Set {}: pin for song {} at position {} skipped ({})",
                set_index, song_id, position, reason
            ),
        }
    }
}

/// Render sorted positions compactly, e.g. `[0, 2, 3, 4]` as `0, 2-4`.
pub fn format_positions(positions: &[usize]) -> String {
    let mut parts = Vec::new();
    let mut iter = positions.iter().copied().peekable();

    while let Some(start) = iter.next() {
        let mut end = start;
        while iter.peek() == Some(&(end + 1)) {
            end += 1;
            iter.next();
        }
        if start == end {
            parts.push(start.to_string());
        } else {
            parts.push(format!("{}-{}", start, end));
        }
    }

    parts.join(", ")
}
