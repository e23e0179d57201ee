//! Vocal pacing checks.
//!
//! Both the generator and read-only setlist views go through
//! [`find_violations`], so a warning shown after generation is the same one a
//! singer sees when opening the setlist later.

use crate::models::{PacingWarning, SetlistItem, Song};
use std::collections::{BTreeMap, HashMap};

pub const PACING_WINDOW: usize = 3;
pub const DEFAULT_HIGH_VOCAL_THRESHOLD: u8 = 4;

/// Scan `sequence` with a sliding window of three and report every window whose
/// songs are all at or above `threshold`. `None` entries (unknown songs) never
/// count as demanding.
pub fn find_violations(
    sequence: &[Option<&Song>],
    threshold: u8,
    set_index: Option<u32>,
) -> Vec<PacingWarning> {
    sequence
        .windows(PACING_WINDOW)
        .enumerate()
        .filter_map(|(start, window)| {
            let titles = window
                .iter()
                .map(|song| {
                    song.filter(|song| song.is_high_intensity(threshold))
                        .map(|song| song.title.clone())
                })
                .collect::<Option<Vec<_>>>()?;
            Some(PacingWarning {
                set_index,
                start_position: start,
                titles,
            })
        })
        .collect()
}

/// Pacing warnings for an existing setlist, keyed by set index.
pub fn check_pacing(items: &[SetlistItem], songs: &[Song]) -> BTreeMap<u32, Vec<String>> {
    check_pacing_with_threshold(items, songs, DEFAULT_HIGH_VOCAL_THRESHOLD)
}

pub fn check_pacing_with_threshold(
    items: &[SetlistItem],
    songs: &[Song],
    threshold: u8,
) -> BTreeMap<u32, Vec<String>> {
    let catalog: HashMap<&str, &Song> = songs.iter().map(|song| (song.id.as_str(), song)).collect();

    let mut by_set: BTreeMap<u32, Vec<&SetlistItem>> = BTreeMap::new();
    for item in items {
        by_set.entry(item.set_index).or_default().push(item);
    }

    by_set
        .into_iter()
        .filter_map(|(set_index, mut set_items)| {
            set_items.sort_by_key(|item| item.position);
            let sequence: Vec<Option<&Song>> = set_items
                .iter()
                .map(|item| catalog.get(item.song_id.as_str()).copied())
                .collect();

            let warnings: Vec<String> = find_violations(&sequence, threshold, Some(set_index))
                .iter()
                .map(|warning| warning.to_string())
                .collect();
            (!warnings.is_empty()).then_some((set_index, warnings))
        })
        .collect()
}
