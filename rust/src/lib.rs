//! Working-calendar CPM scheduling and resource leveling.
//!
//! The crate is usable from Rust directly and is also built as the `rust`
//! Python extension module used by the host application's service layer.

// Allow clippy warning triggered by PyO3 macro expansion
#![allow(clippy::useless_conversion)]

use pyo3::prelude::*;
use std::collections::HashMap;

pub mod calendar;
mod config;
pub mod cpm;
mod error;
mod interner;
pub mod leveling;
pub mod logging;
mod models;

pub use calendar::WorkCalendar;
pub use config::{LevelingConfig, SchedulingConfig};
pub use cpm::{recalculate_schedule, CpmSchedule, CpmScheduler, CpmTaskInfo};
pub use error::SchedulingError;
pub use leveling::{
    auto_level, auto_level_cancellable, manual_shift, manual_shift_action, preview_conflicts,
    LevelingOutcome, ResourceConflict, ResourceConflictEntry, ResourceLevelingAction,
    ResourceLevelingEngine, ResourceLevelingResult,
};
pub use models::{Assignment, Dependency, DependencyKind, Resource, Task, TaskStatus};

impl From<SchedulingError> for PyErr {
    fn from(err: SchedulingError) -> Self {
        pyo3::exceptions::PyValueError::new_err(err.to_string())
    }
}

/// Recalculate dates, float and criticality for every task.
///
/// # Returns
/// * Dict mapping task id to CpmTaskInfo
///
/// # Raises
/// * ValueError on duplicate ids, unknown task references, cycles, or when no
///   task can be scheduled
#[pyfunction]
#[pyo3(name = "recalculate_schedule", signature = (calendar, tasks, dependencies, config=None))]
fn py_recalculate_schedule(
    calendar: WorkCalendar,
    tasks: Vec<Task>,
    dependencies: Vec<Dependency>,
    config: Option<SchedulingConfig>,
) -> PyResult<HashMap<String, CpmTaskInfo>> {
    let config = config.unwrap_or_default();
    let schedule = recalculate_schedule(&calendar, &tasks, &dependencies, &config)?;
    Ok(schedule.into_map())
}

/// List over-allocated (resource, day) pairs for a computed schedule.
///
/// # Arguments
/// * `schedule` - Dict returned by `recalculate_schedule`
/// * `threshold_percent` - Daily allocation a resource may carry (default 100)
///
/// # Raises
/// * ValueError on a non-positive threshold or unknown task/resource ids
#[pyfunction]
#[pyo3(name = "preview_conflicts", signature = (calendar, schedule, resources, assignments, threshold_percent=100.0))]
fn py_preview_conflicts(
    calendar: WorkCalendar,
    schedule: HashMap<String, CpmTaskInfo>,
    resources: Vec<Resource>,
    assignments: Vec<Assignment>,
    threshold_percent: f64,
) -> PyResult<Vec<ResourceConflict>> {
    let schedule = CpmSchedule::from_map(schedule);
    Ok(preview_conflicts(
        &calendar,
        &schedule,
        &resources,
        &assignments,
        threshold_percent,
    )?)
}

/// Shift tasks off over-allocated days until conflicts are gone or the
/// iteration budget runs out.
///
/// # Raises
/// * ValueError on any input error; unresolved conflicts are reported through
///   `ResourceLevelingResult.outcome`
#[pyfunction]
#[pyo3(name = "auto_level", signature = (calendar, tasks, dependencies, resources, assignments, config=None))]
fn py_auto_level(
    py: Python<'_>,
    calendar: WorkCalendar,
    tasks: Vec<Task>,
    dependencies: Vec<Dependency>,
    resources: Vec<Resource>,
    assignments: Vec<Assignment>,
    config: Option<LevelingConfig>,
) -> PyResult<ResourceLevelingResult> {
    let config = config.unwrap_or_default();
    let result = py.allow_threads(|| {
        auto_level(
            &calendar,
            &tasks,
            &dependencies,
            &resources,
            &assignments,
            &config,
        )
    })?;
    Ok(result)
}

/// Move one task by a signed number of working days and recalculate.
///
/// # Returns
/// * Tuple of (dict mapping task id to CpmTaskInfo, ResourceLevelingAction)
///
/// # Raises
/// * ValueError for a zero shift, a task with actual dates, an unknown task,
///   or a task without a computed start
#[pyfunction]
#[pyo3(name = "manual_shift", signature = (calendar, tasks, dependencies, task_id, shift_working_days, reason=None, config=None))]
#[allow(clippy::too_many_arguments)]
fn py_manual_shift(
    calendar: WorkCalendar,
    tasks: Vec<Task>,
    dependencies: Vec<Dependency>,
    task_id: &str,
    shift_working_days: i64,
    reason: Option<&str>,
    config: Option<SchedulingConfig>,
) -> PyResult<(HashMap<String, CpmTaskInfo>, ResourceLevelingAction)> {
    let config = config.unwrap_or_default();
    let (schedule, action) = manual_shift_action(
        &calendar,
        &tasks,
        &dependencies,
        task_id,
        shift_working_days,
        reason.unwrap_or_default(),
        &config,
    )?;
    Ok((schedule.into_map(), action))
}

/// The planner scheduling core Python module.
#[pymodule]
fn rust(m: &Bound<'_, PyModule>) -> PyResult<()> {
    // Input records
    m.add_class::<WorkCalendar>()?;
    m.add_class::<Task>()?;
    m.add_class::<TaskStatus>()?;
    m.add_class::<Dependency>()?;
    m.add_class::<DependencyKind>()?;
    m.add_class::<Resource>()?;
    m.add_class::<Assignment>()?;

    // Config types
    m.add_class::<SchedulingConfig>()?;
    m.add_class::<LevelingConfig>()?;

    // Results
    m.add_class::<CpmTaskInfo>()?;
    m.add_class::<ResourceConflict>()?;
    m.add_class::<ResourceConflictEntry>()?;
    m.add_class::<ResourceLevelingAction>()?;
    m.add_class::<ResourceLevelingResult>()?;
    m.add_class::<LevelingOutcome>()?;

    // Algorithms
    m.add_function(wrap_pyfunction!(py_recalculate_schedule, m)?)?;
    m.add_function(wrap_pyfunction!(py_preview_conflicts, m)?)?;
    m.add_function(wrap_pyfunction!(py_auto_level, m)?)?;
    m.add_function(wrap_pyfunction!(py_manual_shift, m)?)?;

    Ok(())
}
