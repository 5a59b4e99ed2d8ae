//! Result records produced by conflict detection and leveling.

use chrono::NaiveDate;
use pyo3::prelude::*;
use std::collections::HashMap;

use crate::cpm::{CpmSchedule, CpmTaskInfo};

/// One task's share of an over-allocated resource day.
#[pyclass]
#[derive(Clone, Debug, PartialEq)]
pub struct ResourceConflictEntry {
    #[pyo3(get)]
    pub task_id: String,
    #[pyo3(get)]
    pub task_name: String,
    #[pyo3(get)]
    pub allocation_percent: f64,
}

#[pymethods]
impl ResourceConflictEntry {
    fn __repr__(&self) -> String {
        format!(
            "ResourceConflictEntry(task_id={:?}, allocation_percent={})",
            self.task_id, self.allocation_percent
        )
    }
}

/// A resource carrying more than the threshold on one working day.
#[pyclass]
#[derive(Clone, Debug, PartialEq)]
pub struct ResourceConflict {
    #[pyo3(get)]
    pub resource_id: String,
    #[pyo3(get)]
    pub resource_name: String,
    #[pyo3(get)]
    pub date: NaiveDate,
    #[pyo3(get)]
    pub total_allocation_percent: f64,
    /// Sorted by descending allocation, then task name.
    #[pyo3(get)]
    pub entries: Vec<ResourceConflictEntry>,
}

#[pymethods]
impl ResourceConflict {
    fn __repr__(&self) -> String {
        format!(
            "ResourceConflict(resource={:?}, date={}, total={:.1}, tasks={})",
            self.resource_id,
            self.date,
            self.total_allocation_percent,
            self.entries.len()
        )
    }
}

/// A shift applied to one task, automatically or by hand.
#[pyclass]
#[derive(Clone, Debug, PartialEq)]
pub struct ResourceLevelingAction {
    #[pyo3(get)]
    pub task_id: String,
    #[pyo3(get)]
    pub task_name: String,
    /// Resource whose conflict triggered the shift (absent for manual shifts).
    #[pyo3(get)]
    pub resource_id: Option<String>,
    #[pyo3(get)]
    pub resource_name: Option<String>,
    #[pyo3(get)]
    pub conflict_date: Option<NaiveDate>,
    #[pyo3(get)]
    pub shift_working_days: i64,
    #[pyo3(get)]
    pub old_start: Option<NaiveDate>,
    #[pyo3(get)]
    pub old_end: Option<NaiveDate>,
    #[pyo3(get)]
    pub new_start: Option<NaiveDate>,
    #[pyo3(get)]
    pub new_end: Option<NaiveDate>,
    #[pyo3(get)]
    pub reason: String,
}

#[pymethods]
impl ResourceLevelingAction {
    fn __repr__(&self) -> String {
        format!(
            "ResourceLevelingAction(task_id={:?}, shift={}, {:?} -> {:?})",
            self.task_id, self.shift_working_days, self.old_start, self.new_start
        )
    }
}

/// How an auto-leveling run ended.
#[pyclass(eq, eq_int)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LevelingOutcome {
    /// No conflicts remain.
    Resolved,
    /// Conflicts remain after `max_iterations` shifts.
    IterationsExhausted,
    /// Conflicts remain but no task on any of them may be moved.
    NoCandidate,
    /// The caller's cancellation flag was raised between iterations.
    Cancelled,
}

/// Summary of an auto-leveling run.
#[pyclass]
#[derive(Clone, Debug, PartialEq)]
pub struct ResourceLevelingResult {
    #[pyo3(get)]
    pub conflicts_before: Vec<ResourceConflict>,
    #[pyo3(get)]
    pub conflicts_after: Vec<ResourceConflict>,
    /// Number of shifts performed.
    #[pyo3(get)]
    pub iterations: u32,
    #[pyo3(get)]
    pub actions: Vec<ResourceLevelingAction>,
    #[pyo3(get)]
    pub outcome: LevelingOutcome,
    /// Dates after the last shift, keyed by task id.
    #[pyo3(get)]
    pub schedule: HashMap<String, CpmTaskInfo>,
}

impl ResourceLevelingResult {
    pub fn final_schedule(&self) -> CpmSchedule {
        CpmSchedule::from_map(self.schedule.clone())
    }
}

#[pymethods]
impl ResourceLevelingResult {
    /// Whether every conflict was removed.
    pub fn is_resolved(&self) -> bool {
        self.outcome == LevelingOutcome::Resolved
    }

    fn __repr__(&self) -> String {
        format!(
            "ResourceLevelingResult(outcome={:?}, before={}, after={}, iterations={})",
            self.outcome,
            self.conflicts_before.len(),
            self.conflicts_after.len(),
            self.iterations
        )
    }
}
