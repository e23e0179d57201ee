//! Setlist ordering and generation engine.
//!
//! Two pieces of work live here:
//! - keeping the songs of each set in a contiguous, duplicate-free order while
//!   they are inserted, moved, swapped, removed and cleared
//! - assembling a new setlist from a song pool against an energy curve, vocal
//!   pacing and freshness, around pinned slots and exclusions
//!
//! Every function takes the full current state and returns the new state. The
//! host persists results and handles authorization; nothing here does I/O.

pub mod config;
pub mod error;
pub mod models;
pub mod services;

pub use config::{Config, GenerationConfig};
pub use error::{EngineError, Result};
pub use models::{
    CapacityWarning, EditOperation, GenerationRequest, GenerationResult, GenerationWarning,
    PacingWarning, PinSkipReason, PinnedSlot, SetConfig, SetlistItem, Song, MAX_SONGS_PER_SET,
};
pub use services::{
    apply_operations, check_capacity, check_pacing, clear_all, clear_set, generate, insert,
    materialize_pins, move_item, remove, swap, ItemStore, RandomSource, SetlistGenerator,
};
