pub mod setlist;
pub mod song;
pub mod warning;

pub use setlist::{
    EditOperation, GenerationRequest, GenerationResult, PinnedSlot, SetConfig, SetlistItem,
    MAX_SONGS_PER_SET,
};
pub use song::Song;
pub use warning::{CapacityWarning, GenerationWarning, PacingWarning, PinSkipReason};
