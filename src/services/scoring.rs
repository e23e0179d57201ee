//! Candidate scoring for setlist generation.
//!
//! A song's score for a slot is how close its energy sits to the set's energy
//! curve at that point, minus a penalty for a third demanding vocal in a row,
//! plus a bonus for songs that have not been played recently or often.

use crate::config::GenerationConfig;
use crate::models::Song;
use chrono::{DateTime, Utc};

/// Freshness given to songs with no recorded performance.
pub const UNPLAYED_FRESHNESS: f64 = 100.0;

/// Relative position of slot `position` in a set of `set_size` slots, in `[0, 1]`.
pub fn position_ratio(position: usize, set_size: usize) -> f64 {
    if set_size <= 1 {
        0.0
    } else {
        position as f64 / (set_size - 1) as f64
    }
}

/// Energy the set should have at `ratio`.
///
/// The opener climbs from 3 to 4, the second set holds at 4, and later sets
/// build from 4 to a peak of 5 at 60% before easing back to 4.
pub fn target_energy(set_index: u32, ratio: f64) -> f64 {
    let ratio = ratio.clamp(0.0, 1.0);
    match set_index {
        0 | 1 => 3.0 + ratio,
        2 => 4.0,
        _ => {
            const PEAK: f64 = 0.6;
            if ratio <= PEAK {
                4.0 + ratio / PEAK
            } else {
                5.0 - (ratio - PEAK) / (1.0 - PEAK)
            }
        }
    }
}

/// Recency minus over-use, capped at 100. Unplayed songs are fully fresh.
pub fn freshness(song: &Song, now: DateTime<Utc>, config: &GenerationConfig) -> f64 {
    let Some(last_played) = song.last_played_at else {
        return UNPLAYED_FRESHNESS;
    };

    let days_since = (now - last_played).num_days().max(0) as f64;
    let overuse = song
        .play_count
        .saturating_mul(config.play_count_weight)
        .min(config.play_count_penalty_cap) as f64;

    (days_since - overuse).min(UNPLAYED_FRESHNESS)
}

pub fn freshness_bonus(song: &Song, now: DateTime<Utc>, config: &GenerationConfig) -> f64 {
    (freshness(song, now, config) * config.freshness_bonus_ratio).min(config.freshness_bonus_cap)
}

/// Score `song` for a slot with the given target energy. `preceding` holds the
/// two songs placed immediately before the slot, nearest first.
pub fn score_candidate(
    song: &Song,
    target: f64,
    preceding: [Option<&Song>; 2],
    now: DateTime<Utc>,
    config: &GenerationConfig,
) -> f64 {
    let mut score = config.base_score;

    score -= config.energy_weight * (song.energy_level as f64 - target).abs();

    let threshold = config.high_vocal_threshold;
    let fatigued = song.is_high_intensity(threshold)
        && preceding
            .iter()
            .all(|prev| prev.is_some_and(|prev| prev.is_high_intensity(threshold)));
    if fatigued {
        score -= config.fatigue_penalty;
    }

    score + freshness_bonus(song, now, config)
}
