//! Ordered Item Store
//!
//! Keeps the songs of one setlist in per-set arrays where an item's index is its
//! position. Every edit is a splice on those arrays followed by a renumber of the
//! touched sets, so positions within a set are always `0..n` with no gaps.
//!
//! A song-id index sits next to the arrays so the one-song-per-setlist rule is a
//! map lookup instead of a scan over every set.
//!
//! The store is rebuilt from the caller's snapshot on every call. The record of
//! truth lives with the host, and nothing here remembers earlier calls.

use crate::error::{EngineError, Result};
use crate::models::{CapacityWarning, EditOperation, PinnedSlot, SetConfig, SetlistItem, Song};
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::{debug, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Default)]
pub struct ItemStore {
    sets: BTreeMap<u32, Vec<SetlistItem>>,
    /// song_id -> item id
    song_index: HashMap<String, Uuid>,
    /// item id -> set_index
    item_sets: HashMap<Uuid, u32>,
}

impl ItemStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a host snapshot, rejecting anything that already breaks the
    /// contiguity or de-duplication rules.
    pub fn from_items(items: impl IntoIterator<Item = SetlistItem>) -> Result<Self> {
        let mut store = Self::new();

        for item in items {
            if item.set_index == 0 {
                return Err(EngineError::Validation(format!(
                    "Item {} has set index 0; set indices start at 1",
                    item.id
                )));
            }
            if store.item_sets.insert(item.id, item.set_index).is_some() {
                return Err(EngineError::Validation(format!(
                    "Item {} appears more than once",
                    item.id
                )));
            }
            if store.song_index.insert(item.song_id.clone(), item.id).is_some() {
                return Err(EngineError::Validation(format!(
                    "Song {} appears in more than one item",
                    item.song_id
                )));
            }
            store.sets.entry(item.set_index).or_default().push(item);
        }

        for (set_index, set) in store.sets.iter_mut() {
            set.sort_by_key(|item| item.position);
            for (expected, item) in set.iter().enumerate() {
                if item.position != expected {
                    return Err(EngineError::Validation(format!(
                        "Set {} positions are not contiguous: expected {} but found {}",
                        set_index, expected, item.position
                    )));
                }
            }
        }

        Ok(store)
    }

    pub fn len(&self) -> usize {
        self.item_sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.item_sets.is_empty()
    }

    pub fn set_len(&self, set_index: u32) -> usize {
        self.sets.get(&set_index).map_or(0, Vec::len)
    }

    /// Items of one set in position order.
    pub fn set_items(&self, set_index: u32) -> &[SetlistItem] {
        self.sets.get(&set_index).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains_song(&self, song_id: &str) -> bool {
        self.song_index.contains_key(song_id)
    }

    pub fn get(&self, item_id: Uuid) -> Option<&SetlistItem> {
        let (set_index, position) = self.locate(item_id).ok()?;
        self.sets.get(&set_index)?.get(position)
    }

    /// Insert a song at `position`, shifting later items down one slot. Positions
    /// past the end append.
    pub fn insert(
        &mut self,
        song_id: &str,
        set_index: u32,
        position: usize,
        is_pinned: bool,
    ) -> Result<Uuid> {
        if set_index == 0 {
            return Err(EngineError::Validation(
                "Set indices start at 1".to_string(),
            ));
        }
        if self.contains_song(song_id) {
            return Err(EngineError::duplicate(song_id));
        }

        let set = self.sets.entry(set_index).or_default();
        let position = position.min(set.len());
        let item = SetlistItem::new(song_id, set_index, position, is_pinned);
        let item_id = item.id;

        set.insert(position, item);
        renumber(set);

        self.song_index.insert(song_id.to_string(), item_id);
        self.item_sets.insert(item_id, set_index);

        debug!(
            "Inserted song {} into set {} at position {}",
            song_id, set_index, position
        );
        self.debug_verify();
        Ok(item_id)
    }

    /// Move an item within its set or into another set. No capacity check is
    /// made; overfill is reported separately by [`ItemStore::capacity_warnings`].
    pub fn move_item(&mut self, item_id: Uuid, to_set_index: u32, to_position: usize) -> Result<()> {
        if to_set_index == 0 {
            return Err(EngineError::Validation(
                "Set indices start at 1".to_string(),
            ));
        }
        let (from_set_index, from_position) = self.locate(item_id)?;

        if from_set_index == to_set_index {
            if from_position == to_position {
                return Ok(());
            }
            let set = self
                .sets
                .get_mut(&from_set_index)
                .ok_or_else(|| not_found(item_id))?;
            let item = set.remove(from_position);
            let to_position = to_position.min(set.len());
            set.insert(to_position, item);
            renumber(set);

            debug!(
                "Moved item {} within set {} from {} to {}",
                item_id, from_set_index, from_position, to_position
            );
        } else {
            let mut item = self.take(from_set_index, from_position)?;
            item.set_index = to_set_index;

            let target = self.sets.entry(to_set_index).or_default();
            let to_position = to_position.min(target.len());
            target.insert(to_position, item);
            renumber(target);
            self.item_sets.insert(item_id, to_set_index);

            debug!(
                "Moved item {} from set {}:{} to set {}:{}",
                item_id, from_set_index, from_position, to_set_index, to_position
            );
        }

        self.debug_verify();
        Ok(())
    }

    /// Delete an item and close the gap it leaves.
    pub fn remove(&mut self, item_id: Uuid) -> Result<SetlistItem> {
        let (set_index, position) = self.locate(item_id)?;
        let item = self.take(set_index, position)?;
        self.song_index.remove(&item.song_id);
        self.item_sets.remove(&item_id);

        debug!("Removed item {} from set {}", item_id, set_index);
        self.debug_verify();
        Ok(item)
    }

    /// Replace the song an item points at, keeping its slot.
    pub fn swap(&mut self, item_id: Uuid, new_song_id: &str) -> Result<()> {
        let (set_index, position) = self.locate(item_id)?;

        match self.song_index.get(new_song_id) {
            Some(existing) if *existing == item_id => return Ok(()),
            Some(_) => return Err(EngineError::duplicate(new_song_id)),
            None => {}
        }

        let item = self
            .sets
            .get_mut(&set_index)
            .and_then(|set| set.get_mut(position))
            .ok_or_else(|| not_found(item_id))?;
        let old_song_id = std::mem::replace(&mut item.song_id, new_song_id.to_string());

        self.song_index.remove(&old_song_id);
        self.song_index.insert(new_song_id.to_string(), item_id);

        debug!(
            "Swapped item {} from song {} to {}",
            item_id, old_song_id, new_song_id
        );
        self.debug_verify();
        Ok(())
    }

    /// Clear one set. Returns how many items were deleted.
    pub fn clear_set(&mut self, set_index: u32, keep_pinned: bool) -> usize {
        let Some(mut set) = self.sets.remove(&set_index) else {
            return 0;
        };

        let before = set.len();
        let removed: Vec<SetlistItem> = if keep_pinned {
            let (kept, removed): (Vec<_>, Vec<_>) =
                set.drain(..).partition(|item| item.is_pinned);
            set = kept;
            removed
        } else {
            std::mem::take(&mut set)
        };

        for item in &removed {
            self.song_index.remove(&item.song_id);
            self.item_sets.remove(&item.id);
        }

        if !set.is_empty() {
            renumber(&mut set);
            self.sets.insert(set_index, set);
        }

        debug!(
            "Cleared set {} ({} of {} items removed, keep_pinned={})",
            set_index,
            removed.len(),
            before,
            keep_pinned
        );
        self.debug_verify();
        removed.len()
    }

    /// Clear every set. Returns how many items were deleted.
    pub fn clear_all(&mut self, keep_pinned: bool) -> usize {
        let set_indices: Vec<u32> = self.sets.keys().copied().collect();
        set_indices
            .into_iter()
            .map(|set_index| self.clear_set(set_index, keep_pinned))
            .sum()
    }

    /// All items ordered by `(set_index, position)`.
    pub fn items(&self) -> Vec<SetlistItem> {
        self.sets.values().flatten().cloned().collect()
    }

    pub fn into_items(self) -> Vec<SetlistItem> {
        self.sets.into_values().flatten().collect()
    }

    /// Sets holding more songs than configured.
    pub fn capacity_warnings(&self, sets: &[SetConfig]) -> Vec<CapacityWarning> {
        sets.iter()
            .filter_map(|config| {
                let count = self.set_len(config.set_index);
                (count > config.songs_per_set).then(|| CapacityWarning {
                    set_index: config.set_index,
                    count,
                    songs_per_set: config.songs_per_set,
                })
            })
            .collect()
    }

    /// Check the contiguity and de-duplication rules over the whole store.
    pub fn verify(&self) -> Result<()> {
        let mut seen_songs = HashSet::new();
        let mut total = 0;

        for (set_index, set) in &self.sets {
            for (expected, item) in set.iter().enumerate() {
                if item.position != expected || item.set_index != *set_index {
                    return Err(EngineError::Internal(anyhow::anyhow!(
                        "Item {} recorded at {}:{} but stored at {}:{}",
                        item.id,
                        item.set_index,
                        item.position,
                        set_index,
                        expected
                    )));
                }
                if !seen_songs.insert(item.song_id.as_str()) {
                    return Err(EngineError::Internal(anyhow::anyhow!(
                        "Song {} appears more than once",
                        item.song_id
                    )));
                }
                if self.song_index.get(&item.song_id) != Some(&item.id)
                    || self.item_sets.get(&item.id) != Some(set_index)
                {
                    return Err(EngineError::Internal(anyhow::anyhow!(
                        "Index out of sync for item {}",
                        item.id
                    )));
                }
                total += 1;
            }
        }

        if total != self.song_index.len() || total != self.item_sets.len() {
            return Err(EngineError::Internal(anyhow::anyhow!(
                "Index holds {} songs and {} items but store holds {}",
                self.song_index.len(),
                self.item_sets.len(),
                total
            )));
        }

        Ok(())
    }

    pub fn apply(&mut self, operation: &EditOperation) -> Result<()> {
        match operation {
            EditOperation::Insert {
                song_id,
                set_index,
                position,
                is_pinned,
            } => self.insert(song_id, *set_index, *position, *is_pinned).map(|_| ()),
            EditOperation::Move {
                item_id,
                to_set_index,
                to_position,
            } => self.move_item(*item_id, *to_set_index, *to_position),
            EditOperation::Remove { item_id } => self.remove(*item_id).map(|_| ()),
            EditOperation::Swap {
                item_id,
                new_song_id,
            } => self.swap(*item_id, new_song_id),
            EditOperation::ClearSet {
                set_index,
                keep_pinned,
            } => {
                self.clear_set(*set_index, *keep_pinned);
                Ok(())
            }
            EditOperation::ClearAll { keep_pinned } => {
                self.clear_all(*keep_pinned);
                Ok(())
            }
        }
    }

    fn locate(&self, item_id: Uuid) -> Result<(u32, usize)> {
        let set_index = *self.item_sets.get(&item_id).ok_or_else(|| not_found(item_id))?;
        let position = self
            .set_items(set_index)
            .iter()
            .position(|item| item.id == item_id)
            .ok_or_else(|| not_found(item_id))?;
        Ok((set_index, position))
    }

    /// Splice an item out of its set, dropping the set once empty.
    fn take(&mut self, set_index: u32, position: usize) -> Result<SetlistItem> {
        let set = self.sets.get_mut(&set_index).ok_or_else(|| {
            EngineError::NotFound(format!("Set {} not found", set_index))
        })?;
        let item = set.remove(position);
        if set.is_empty() {
            self.sets.remove(&set_index);
        } else {
            renumber(set);
        }
        Ok(item)
    }

    fn debug_verify(&self) {
        debug_assert!(
            self.verify().is_ok(),
            "item store invariant broken: {:?}",
            self.verify().err()
        );
    }
}

fn renumber(set: &mut [SetlistItem]) {
    for (position, item) in set.iter_mut().enumerate() {
        item.position = position;
    }
}

fn not_found(item_id: Uuid) -> EngineError {
    EngineError::NotFound(format!("Setlist item {} not found", item_id))
}

pub fn insert(
    items: &[SetlistItem],
    song_id: &str,
    set_index: u32,
    position: usize,
    is_pinned: bool,
) -> Result<(Vec<SetlistItem>, Uuid)> {
    let mut store = ItemStore::from_items(items.iter().cloned())?;
    let item_id = store.insert(song_id, set_index, position, is_pinned)?;
    Ok((store.into_items(), item_id))
}

pub fn move_item(
    items: &[SetlistItem],
    item_id: Uuid,
    to_set_index: u32,
    to_position: usize,
) -> Result<Vec<SetlistItem>> {
    let mut store = ItemStore::from_items(items.iter().cloned())?;
    store.move_item(item_id, to_set_index, to_position)?;
    Ok(store.into_items())
}

pub fn remove(items: &[SetlistItem], item_id: Uuid) -> Result<Vec<SetlistItem>> {
    let mut store = ItemStore::from_items(items.iter().cloned())?;
    store.remove(item_id)?;
    Ok(store.into_items())
}

pub fn swap(items: &[SetlistItem], item_id: Uuid, new_song_id: &str) -> Result<Vec<SetlistItem>> {
    let mut store = ItemStore::from_items(items.iter().cloned())?;
    store.swap(item_id, new_song_id)?;
    Ok(store.into_items())
}

pub fn clear_set(items: &[SetlistItem], set_index: u32, keep_pinned: bool) -> Result<Vec<SetlistItem>> {
    let mut store = ItemStore::from_items(items.iter().cloned())?;
    store.clear_set(set_index, keep_pinned);
    Ok(store.into_items())
}

pub fn clear_all(items: &[SetlistItem], keep_pinned: bool) -> Result<Vec<SetlistItem>> {
    let mut store = ItemStore::from_items(items.iter().cloned())?;
    store.clear_all(keep_pinned);
    Ok(store.into_items())
}

/// Replay `operations` in order. The first failure aborts the whole batch.
pub fn apply_operations(
    items: &[SetlistItem],
    operations: &[EditOperation],
) -> Result<Vec<SetlistItem>> {
    let mut store = ItemStore::from_items(items.iter().cloned())?;
    for (index, operation) in operations.iter().enumerate() {
        store.apply(operation).map_err(|e| {
            warn!("Edit {} of {} failed: {}", index + 1, operations.len(), e);
            e
        })?;
    }
    Ok(store.into_items())
}

/// Overfilled sets in a host snapshot.
pub fn check_capacity(items: &[SetlistItem], sets: &[SetConfig]) -> Vec<CapacityWarning> {
    let mut counts: HashMap<u32, usize> = HashMap::new();
    for item in items {
        *counts.entry(item.set_index).or_default() += 1;
    }

    sets.iter()
        .filter_map(|config| {
            let count = counts.get(&config.set_index).copied().unwrap_or(0);
            (count > config.songs_per_set).then(|| CapacityWarning {
                set_index: config.set_index,
                count,
                songs_per_set: config.songs_per_set,
            })
        })
        .collect()
}

/// Build pinned items from template slots.
///
/// Pins whose song is no longer in the catalog, or whose song was already
/// placed by an earlier pin, are skipped. Slots are applied in
/// `(set_index, position)` order through [`ItemStore::insert`], so the result
/// is contiguous even when the template has holes.
pub fn materialize_pins(slots: &[PinnedSlot], songs: &[Song]) -> Vec<SetlistItem> {
    let catalog: HashSet<&str> = songs.iter().map(|song| song.id.as_str()).collect();

    let mut ordered: Vec<&PinnedSlot> = slots.iter().collect();
    ordered.sort_by_key(|slot| (slot.set_index, slot.position));

    let mut store = ItemStore::new();
    for slot in ordered {
        if !catalog.contains(slot.song_id.as_str()) {
            warn!(
                "Skipping pin for missing song {} at set {} position {}",
                slot.song_id, slot.set_index, slot.position
            );
            continue;
        }
        if let Err(e) = store.insert(&slot.song_id, slot.set_index, slot.position, true) {
            warn!(
                "Skipping pin for song {} at set {} position {}: {}",
                slot.song_id, slot.set_index, slot.position, e
            );
        }
    }

    store.into_items()
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    fn layout(store: &ItemStore, set_index: u32) -> Vec<(String, usize)> {
        store
            .set_items(set_index)
            .iter()
            .map(|item| (item.song_id.clone(), item.position))
            .collect()
    }

    fn ids(store: &ItemStore, set_index: u32) -> Vec<String> {
        store
            .set_items(set_index)
            .iter()
            .map(|item| item.song_id.clone())
            .collect()
    }

    fn store_with(set_index: u32, songs: &[&str]) -> ItemStore {
        let mut store = ItemStore::new();
        for (i, song) in songs.iter().enumerate() {
            store.insert(song, set_index, i, false).unwrap();
        }
        store
    }

    fn item_id(store: &ItemStore, song_id: &str) -> Uuid {
        store
            .items()
            .into_iter()
            .find(|item| item.song_id == song_id)
            .map(|item| item.id)
            .unwrap()
    }

    #[test]
    fn test_insert_at_front_shifts_existing() {
        let mut store = ItemStore::new();
        store.insert("X", 1, 0, false).unwrap();
        assert_eq!(layout(&store, 1), vec![("X".to_string(), 0)]);

        store.insert("Y", 1, 0, false).unwrap();
        assert_eq!(
            layout(&store, 1),
            vec![("Y".to_string(), 0), ("X".to_string(), 1)]
        );
    }

    #[test]
    fn test_insert_past_end_appends() {
        let mut store = store_with(1, &["A", "B"]);
        let id = store.insert("C", 1, 40, false).unwrap();
        assert_eq!(store.get(id).unwrap().position, 2);
    }

    #[test]
    fn test_insert_duplicate_song_leaves_store_untouched() {
        let mut store = store_with(1, &["A", "B"]);
        store.insert("C", 2, 0, false).unwrap();
        let before = store.items();

        let err = store.insert("A", 2, 0, false).unwrap_err();
        assert_matches!(err, EngineError::DuplicateSong { ref song_id } if song_id == "A");
        assert_eq!(store.items(), before);
    }

    #[test]
    fn test_insert_rejects_set_zero() {
        let mut store = ItemStore::new();
        assert_matches!(store.insert("A", 0, 0, false), Err(EngineError::Validation(_)));
    }

    #[test]
    fn test_move_forward_within_set() {
        let mut store = store_with(1, &["A", "B", "C"]);
        let b = item_id(&store, "B");
        store.move_item(b, 1, 2).unwrap();
        assert_eq!(ids(&store, 1), vec!["A", "C", "B"]);
        assert_eq!(store.get(b).unwrap().position, 2);
    }

    #[test]
    fn test_move_backward_within_set() {
        let mut store = store_with(1, &["A", "B", "C", "D"]);
        let d = item_id(&store, "D");
        store.move_item(d, 1, 1).unwrap();
        assert_eq!(ids(&store, 1), vec!["A", "D", "B", "C"]);
    }

    #[test]
    fn test_move_to_same_position_is_noop() {
        let mut store = store_with(1, &["A", "B", "C"]);
        let before = store.items();
        let b = item_id(&store, "B");
        store.move_item(b, 1, 1).unwrap();
        assert_eq!(store.items(), before);
    }

    #[test]
    fn test_move_across_sets_closes_and_opens_gaps() {
        let mut store = store_with(1, &["A", "B", "C"]);
        store.insert("X", 2, 0, false).unwrap();
        store.insert("Y", 2, 1, false).unwrap();

        let b = item_id(&store, "B");
        store.move_item(b, 2, 1).unwrap();

        assert_eq!(ids(&store, 1), vec!["A", "C"]);
        assert_eq!(ids(&store, 2), vec!["X", "B", "Y"]);
        let moved = store.get(b).unwrap();
        assert_eq!((moved.set_index, moved.position), (2, 1));
    }

    #[test]
    fn test_move_into_full_set_is_allowed_and_reported() {
        let mut store = store_with(1, &["A", "B"]);
        store.insert("C", 2, 0, false).unwrap();
        let c = item_id(&store, "C");
        store.move_item(c, 1, 0).unwrap();

        let sets = [SetConfig {
            set_index: 1,
            songs_per_set: 2,
        }];
        let warnings = store.capacity_warnings(&sets);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].count, 3);
        assert_eq!(store.set_len(2), 0);
    }

    #[test]
    fn test_move_unknown_item() {
        let mut store = store_with(1, &["A"]);
        assert_matches!(store.move_item(Uuid::new_v4(), 1, 0), Err(EngineError::NotFound(_)));
    }

    #[test]
    fn test_failed_edits_leave_store_untouched() {
        let mut store = store_with(1, &["A", "B", "C"]);
        store.insert("X", 2, 0, true).unwrap();
        let a = item_id(&store, "A");
        let before = store.items();

        assert_matches!(store.swap(a, "X"), Err(EngineError::DuplicateSong { .. }));
        assert_eq!(store.items(), before);
        assert_matches!(store.swap(Uuid::new_v4(), "Z"), Err(EngineError::NotFound(_)));
        assert_eq!(store.items(), before);
        assert!(!store.contains_song("Z"));

        assert_matches!(store.move_item(a, 0, 1), Err(EngineError::Validation(_)));
        assert_eq!(store.items(), before);
        assert_matches!(store.move_item(Uuid::new_v4(), 2, 0), Err(EngineError::NotFound(_)));
        assert_eq!(store.items(), before);
        store.verify().unwrap();
    }

    #[test]
    fn test_remove_closes_gap() {
        let mut store = store_with(1, &["A", "B", "C", "D"]);
        let b = item_id(&store, "B");
        let removed = store.remove(b).unwrap();
        assert_eq!(removed.song_id, "B");
        assert_eq!(
            layout(&store, 1),
            vec![
                ("A".to_string(), 0),
                ("C".to_string(), 1),
                ("D".to_string(), 2)
            ]
        );
        assert!(!store.contains_song("B"));
    }

    #[test]
    fn test_swap_rejects_song_used_elsewhere() {
        let mut store = store_with(1, &["A", "B"]);
        store.insert("C", 2, 0, false).unwrap();
        let a = item_id(&store, "A");

        assert_matches!(store.swap(a, "C"), Err(EngineError::DuplicateSong { .. }));
        store.swap(a, "A").unwrap();
        store.swap(a, "Z").unwrap();

        assert_eq!(ids(&store, 1), vec!["Z", "B"]);
        assert!(!store.contains_song("A"));
        assert!(store.contains_song("Z"));
    }

    #[test]
    fn test_clear_set_keeps_pinned() {
        let mut store = ItemStore::new();
        store.insert("A", 1, 0, true).unwrap();
        store.insert("B", 1, 1, false).unwrap();
        store.insert("C", 1, 2, false).unwrap();

        let removed = store.clear_set(1, true);
        assert_eq!(removed, 2);
        assert_eq!(layout(&store, 1), vec![("A".to_string(), 0)]);
    }

    #[test]
    fn test_clear_renumbers_retained_pins_in_order() {
        let mut store = ItemStore::new();
        store.insert("A", 1, 0, false).unwrap();
        store.insert("B", 1, 1, true).unwrap();
        store.insert("C", 1, 2, false).unwrap();
        store.insert("D", 1, 3, true).unwrap();
        store.insert("E", 2, 0, false).unwrap();
        store.insert("F", 2, 1, true).unwrap();

        store.clear_all(true);
        assert_eq!(
            layout(&store, 1),
            vec![("B".to_string(), 0), ("D".to_string(), 1)]
        );
        assert_eq!(layout(&store, 2), vec![("F".to_string(), 0)]);
        assert!(!store.contains_song("E"));
    }

    #[test]
    fn test_clear_all_without_keep_empties_store() {
        let mut store = store_with(1, &["A", "B"]);
        store.insert("C", 2, 0, true).unwrap();
        assert_eq!(store.clear_all(false), 3);
        assert!(store.is_empty());
        store.insert("A", 1, 0, false).unwrap();
    }

    #[test]
    fn test_from_items_rejects_gaps_and_duplicates() {
        let gap = vec![
            SetlistItem::new("A", 1, 0, false),
            SetlistItem::new("B", 1, 2, false),
        ];
        assert_matches!(ItemStore::from_items(gap), Err(EngineError::Validation(_)));

        let dup = vec![
            SetlistItem::new("A", 1, 0, false),
            SetlistItem::new("A", 2, 0, false),
        ];
        assert_matches!(ItemStore::from_items(dup), Err(EngineError::Validation(_)));
    }

    #[test]
    fn test_from_items_accepts_unordered_snapshot() {
        let items = vec![
            SetlistItem::new("C", 1, 2, false),
            SetlistItem::new("A", 1, 0, false),
            SetlistItem::new("B", 1, 1, false),
        ];
        let store = ItemStore::from_items(items).unwrap();
        assert_eq!(ids(&store, 1), vec!["A", "B", "C"]);
    }

    #[test]
    fn test_snapshot_functions_round_trip_state() {
        let (items, a) = insert(&[], "A", 1, 0, false).unwrap();
        let (items, _) = insert(&items, "B", 1, 0, false).unwrap();
        let (items, _) = insert(&items, "C", 1, 5, true).unwrap();

        let items = move_item(&items, a, 1, 0).unwrap();
        let order: Vec<_> = items.iter().map(|i| i.song_id.as_str()).collect();
        assert_eq!(order, vec!["A", "B", "C"]);

        let items = swap(&items, a, "Z").unwrap();
        assert_matches!(swap(&items, a, "B"), Err(EngineError::DuplicateSong { .. }));

        let items = clear_set(&items, 1, true).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].song_id, "C");
        assert_eq!(items[0].position, 0);

        assert_matches!(remove(&items, a), Err(EngineError::NotFound(_)));
        assert!(clear_all(&items, false).unwrap().is_empty());
    }

    #[test]
    fn test_apply_operations_batch() {
        let start = vec![SetlistItem::new("A", 1, 0, true)];
        let a = start[0].id;
        let ops: Vec<EditOperation> = serde_json::from_str(&format!(
            r#"[
                {{"op": "insert", "song_id": "B", "set_index": 1, "position": 0}},
                {{"op": "insert", "song_id": "C", "set_index": 2, "position": 0}},
                {{"op": "move", "item_id": "{a}", "to_set_index": 2, "to_position": 9}},
                {{"op": "clear_set", "set_index": 1}}
            ]"#
        ))
        .unwrap();

        let items = apply_operations(&start, &ops).unwrap();
        let layout: Vec<_> = items
            .iter()
            .map(|i| (i.song_id.as_str(), i.set_index, i.position))
            .collect();
        assert_eq!(layout, vec![("C", 2, 0), ("A", 2, 1)]);

        let failing = vec![
            EditOperation::Remove { item_id: a },
            EditOperation::Swap { item_id: a, new_song_id: "Z".into() },
        ];
        assert_matches!(apply_operations(&start, &failing), Err(EngineError::NotFound(_)));
    }

    #[test]
    fn test_check_capacity_on_snapshot() {
        let items = vec![
            SetlistItem::new("A", 1, 0, false),
            SetlistItem::new("B", 1, 1, false),
            SetlistItem::new("C", 2, 0, false),
        ];
        let sets = [
            SetConfig { set_index: 1, songs_per_set: 1 },
            SetConfig { set_index: 2, songs_per_set: 4 },
        ];
        let warnings = check_capacity(&items, &sets);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].set_index, 1);
        assert!(warnings[0].to_string().contains("1 over"));
    }

    #[test]
    fn test_materialize_pins_skips_missing_and_repeated_songs() {
        let song = |id: &str| Song {
            id: id.to_string(),
            title: id.to_string(),
            artist: "Band".to_string(),
            vocal_intensity: 3,
            energy_level: 3,
            play_count: 0,
            last_played_at: None,
        };
        let songs = vec![song("A"), song("B")];
        let slots = vec![
            PinnedSlot { set_index: 1, position: 4, song_id: "B".into() },
            PinnedSlot { set_index: 1, position: 1, song_id: "A".into() },
            PinnedSlot { set_index: 1, position: 2, song_id: "deleted".into() },
            PinnedSlot { set_index: 2, position: 0, song_id: "A".into() },
        ];

        let items = materialize_pins(&slots, &songs);
        let layout: Vec<_> = items
            .iter()
            .map(|i| (i.song_id.as_str(), i.set_index, i.position, i.is_pinned))
            .collect();
        assert_eq!(layout, vec![("A", 1, 0, true), ("B", 1, 1, true)]);
    }

    #[test]
    fn test_random_edit_sequences_keep_invariants() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut store = ItemStore::new();

        for step in 0..500 {
            let song = format!("song-{}", rng.gen_range(0..40));
            let set_index = rng.gen_range(1..=3);
            let position = rng.gen_range(0..12);
            let items = store.items();
            let pick = (!items.is_empty()).then(|| items[rng.gen_range(0..items.len())].id);

            let _ = match (rng.gen_range(0..6), pick) {
                (0 | 1, _) => store.insert(&song, set_index, position, rng.gen_bool(0.3)).map(|_| ()),
                (2, Some(id)) => store.move_item(id, set_index, position),
                (3, Some(id)) => store.remove(id).map(|_| ()),
                (4, Some(id)) => store.swap(id, &song),
                (5, _) if step % 25 == 0 => {
                    store.clear_set(set_index, rng.gen_bool(0.5));
                    Ok(())
                }
                _ => Ok(()),
            };

            store.verify().unwrap();
            let rebuilt = ItemStore::from_items(store.items()).unwrap();
            assert_eq!(rebuilt.len(), store.len());
        }
    }
}
