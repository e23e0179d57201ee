pub mod generator;
pub mod item_store;
pub mod pacing;
pub mod random;
pub mod scoring;

pub use generator::{generate, SetlistGenerator};
pub use item_store::{
    apply_operations, check_capacity, clear_all, clear_set, insert, materialize_pins, move_item,
    remove, swap, ItemStore,
};
pub use pacing::{check_pacing, check_pacing_with_threshold, find_violations};
pub use random::RandomSource;
