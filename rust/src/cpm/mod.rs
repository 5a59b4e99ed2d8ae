//! Critical path method over a working-day calendar.
//!
//! - `graph`: validated dependency graph with a deterministic topological order
//! - `passes`: forward and backward date propagation
//! - `scheduler`: [`CpmScheduler`] and the `recalculate_schedule` entry point

pub mod graph;
mod passes;
pub mod scheduler;
pub mod types;

pub use graph::DependencyGraph;
pub use scheduler::{recalculate_schedule, CpmScheduler};
pub use types::{CpmSchedule, CpmTaskInfo, DateSpan, Relation};
