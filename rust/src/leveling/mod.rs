//! Resource conflict detection and leveling.
//!
//! - `conflicts`: day-level over-allocation buckets
//! - `candidates`: which task on a conflict gets moved
//! - `engine`: auto-leveling loop and manual shifts

mod candidates;
pub mod conflicts;
pub mod engine;
pub mod types;

pub use conflicts::{preview_conflicts, ALLOCATION_TOLERANCE};
pub use engine::{
    auto_level, auto_level_cancellable, manual_shift, manual_shift_action,
    ResourceLevelingEngine, AUTO_LEVEL_SHIFT_DAYS, DEFAULT_MANUAL_REASON,
};
pub use types::{
    LevelingOutcome, ResourceConflict, ResourceConflictEntry, ResourceLevelingAction,
    ResourceLevelingResult,
};
