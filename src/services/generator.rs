//! Setlist Generator
//!
//! Builds a full setlist from a song pool in one pass.
//!
//! Flow:
//! 1. Pinned slots are placed first and their songs leave the pool
//! 2. Sets are filled in ascending order, each open slot from front to back
//! 3. Every remaining song is scored against the set's energy curve, vocal
//!    fatigue and freshness, and one of the best few is picked at random
//! 4. Short pools and tiring vocal runs come back as warnings, never errors
//!
//! The pool is shared across sets, so a song used in set 1 is gone for set 2.

use crate::config::GenerationConfig;
use crate::error::{EngineError, Result};
use crate::models::{
    GenerationRequest, GenerationResult, GenerationWarning, PinSkipReason, PinnedSlot, SetConfig,
    SetlistItem, Song,
};
use crate::services::item_store::ItemStore;
use crate::services::pacing::{check_pacing_with_threshold, find_violations};
use crate::services::random::RandomSource;
use crate::services::scoring::{position_ratio, score_candidate, target_energy};
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::{debug, info, warn};
use validator::Validate;

#[derive(Debug, Clone, Copy)]
struct Slot<'a> {
    song: &'a Song,
    pinned: bool,
}

#[derive(Debug, Clone, Default)]
pub struct SetlistGenerator {
    config: GenerationConfig,
}

impl SetlistGenerator {
    pub fn new(config: GenerationConfig) -> Self {
        Self { config }
    }

    /// Pacing report for an existing setlist, judged with the same vocal
    /// threshold this generator uses.
    pub fn check_pacing(&self, items: &[SetlistItem], songs: &[Song]) -> BTreeMap<u32, Vec<String>> {
        check_pacing_with_threshold(items, songs, self.config.high_vocal_threshold)
    }

    /// Generate a setlist for `request`, breaking ties with `rng`.
    pub fn generate<R: RandomSource>(
        &self,
        request: &GenerationRequest,
        rng: &mut R,
    ) -> Result<GenerationResult> {
        let now = request.now.unwrap_or_else(Utc::now);
        let sets = validate_request(request)?;

        let catalog: HashMap<&str, &Song> = request
            .songs
            .iter()
            .map(|song| (song.id.as_str(), song))
            .collect();
        let excluded: HashSet<&str> = request.excluded_song_ids.iter().map(String::as_str).collect();

        info!(
            "Generating setlist: {} sets, {} songs in catalog, {} pins, {} excluded",
            sets.len(),
            request.songs.len(),
            request.pinned_slots.len(),
            excluded.len()
        );

        let mut warnings = Vec::new();
        let mut slots_by_set: BTreeMap<u32, Vec<Option<Slot>>> = sets
            .iter()
            .map(|set| (set.set_index, vec![None; set.songs_per_set]))
            .collect();

        let pinned_songs = place_pins(
            &request.pinned_slots,
            &catalog,
            &excluded,
            &mut slots_by_set,
            &mut warnings,
        );

        let mut pool: Vec<&Song> = request
            .songs
            .iter()
            .filter(|song| !excluded.contains(song.id.as_str()))
            .filter(|song| !pinned_songs.contains(song.id.as_str()))
            .collect();

        let mut store = ItemStore::new();

        for (set_index, slots) in slots_by_set.iter_mut() {
            let set_index = *set_index;
            let unfillable = self.fill_set(set_index, slots, &mut pool, now, rng);

            let filled = slots.iter().flatten().count();
            info!(
                "Set {}: {} of {} slots filled, {} songs left in pool",
                set_index,
                filled,
                slots.len(),
                pool.len()
            );

            if !unfillable.is_empty() {
                warn!(
                    "Set {}: pool ran dry, {} positions left open",
                    set_index,
                    unfillable.len()
                );
                warnings.push(GenerationWarning::Unfillable {
                    set_index,
                    positions: unfillable,
                });
            }

            let sequence: Vec<Option<&Song>> =
                slots.iter().flatten().map(|slot| Some(slot.song)).collect();
            warnings.extend(
                find_violations(&sequence, self.config.high_vocal_threshold, Some(set_index))
                    .into_iter()
                    .map(GenerationWarning::Pacing),
            );

            // Open slots are skipped, so later songs close up behind them.
            for (position, slot) in slots.iter().enumerate() {
                if let Some(slot) = slot {
                    store.insert(&slot.song.id, set_index, position, slot.pinned)?;
                }
            }
        }

        info!(
            "Generated {} items with {} warnings",
            store.len(),
            warnings.len()
        );

        Ok(GenerationResult {
            items: store.into_items(),
            warnings,
        })
    }

    /// Fill every open slot of one set from `pool`. Returns the positions that
    /// could not be filled.
    fn fill_set<'a, R: RandomSource>(
        &self,
        set_index: u32,
        slots: &mut [Option<Slot<'a>>],
        pool: &mut Vec<&'a Song>,
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> Vec<usize> {
        let set_size = slots.len();
        let mut unfillable = Vec::new();

        for position in 0..set_size {
            if slots[position].is_some() {
                continue;
            }
            if pool.is_empty() {
                unfillable.push(position);
                continue;
            }

            let target = target_energy(set_index, position_ratio(position, set_size));
            let preceding = [
                preceding_song(slots, position, 1),
                preceding_song(slots, position, 2),
            ];

            let mut ranked: Vec<(usize, f64)> = pool
                .iter()
                .enumerate()
                .map(|(idx, song)| {
                    (idx, score_candidate(song, target, preceding, now, &self.config))
                })
                .collect();
            ranked.sort_by(|a, b| b.1.total_cmp(&a.1));

            let top = self.config.top_k.max(1).min(ranked.len());
            let (pool_idx, score) = ranked[rng.next_index(top)];
            let song = pool.remove(pool_idx);

            debug!(
                "Set {} position {}: picked '{}' (score {:.1}, target energy {:.2}) from top {}",
                set_index,
                position,
                song.display_name(),
                score,
                target,
                top
            );

            slots[position] = Some(Slot {
                song,
                pinned: false,
            });
        }

        unfillable
    }
}

/// Generate with default scoring and the current time.
pub fn generate<R: RandomSource>(
    songs: &[Song],
    sets: &[SetConfig],
    pinned_slots: &[PinnedSlot],
    excluded_song_ids: &[String],
    rng: &mut R,
) -> Result<GenerationResult> {
    let request = GenerationRequest {
        songs: songs.to_vec(),
        sets: sets.to_vec(),
        pinned_slots: pinned_slots.to_vec(),
        excluded_song_ids: excluded_song_ids.to_vec(),
        now: None,
    };
    SetlistGenerator::default().generate(&request, rng)
}

fn preceding_song<'a>(slots: &[Option<Slot<'a>>], position: usize, back: usize) -> Option<&'a Song> {
    position
        .checked_sub(back)
        .and_then(|idx| slots[idx])
        .map(|slot| slot.song)
}

/// Check ratings and set shapes, returning the sets in ascending order.
fn validate_request(request: &GenerationRequest) -> Result<Vec<SetConfig>> {
    let mut song_ids = HashSet::new();
    for song in &request.songs {
        song.validate()
            .map_err(|e| EngineError::Validation(format!("Song {}: {}", song.id, e)))?;
        if !song_ids.insert(song.id.as_str()) {
            return Err(EngineError::Validation(format!(
                "Song {} appears more than once in the catalog",
                song.id
            )));
        }
    }

    let mut sets = request.sets.clone();
    for set in &sets {
        set.validate()?;
    }
    sets.sort_by_key(|set| set.set_index);
    if let Some(pair) = sets.windows(2).find(|pair| pair[0].set_index == pair[1].set_index) {
        return Err(EngineError::Validation(format!(
            "Set {} is configured more than once",
            pair[0].set_index
        )));
    }

    Ok(sets)
}

/// Place pins into their slots. Returns the ids of every song that was pinned.
fn place_pins<'a>(
    pins: &[PinnedSlot],
    catalog: &HashMap<&str, &'a Song>,
    excluded: &HashSet<&str>,
    slots_by_set: &mut BTreeMap<u32, Vec<Option<Slot<'a>>>>,
    warnings: &mut Vec<GenerationWarning>,
) -> HashSet<&'a str> {
    let mut ordered: Vec<&PinnedSlot> = pins.iter().collect();
    ordered.sort_by_key(|pin| (pin.set_index, pin.position));

    let mut pinned = HashSet::new();

    for pin in ordered {
        let Some(song) = catalog.get(pin.song_id.as_str()).copied() else {
            warn!(
                "Skipping pin for unknown song {} at set {} position {}",
                pin.song_id, pin.set_index, pin.position
            );
            continue;
        };

        let mut skip = |reason: PinSkipReason| {
            warnings.push(GenerationWarning::PinSkipped {
                set_index: pin.set_index,
                position: pin.position,
                song_id: pin.song_id.clone(),
                reason,
            });
        };

        if excluded.contains(song.id.as_str()) {
            skip(PinSkipReason::Excluded);
            continue;
        }
        if pinned.contains(song.id.as_str()) {
            skip(PinSkipReason::AlreadyPinned);
            continue;
        }
        let Some(slot) = slots_by_set
            .get_mut(&pin.set_index)
            .and_then(|slots| slots.get_mut(pin.position))
        else {
            skip(PinSkipReason::OutOfRange);
            continue;
        };
        if slot.is_some() {
            skip(PinSkipReason::PositionTaken);
            continue;
        }

        *slot = Some(Slot { song, pinned: true });
        pinned.insert(song.id.as_str());
    }

    pinned
}
