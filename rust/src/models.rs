//! Input records consumed by the scheduler and the leveling engine.
//!
//! These are plain snapshots handed in by the persistence layer; the core never
//! keeps them between calls.

use chrono::NaiveDate;
use pyo3::prelude::*;

/// Priority used when the host has no better value (lower = more important).
pub const DEFAULT_PRIORITY: i32 = 50;

/// Lifecycle status of a task.
#[pyclass(eq, eq_int)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TaskStatus {
    NotStarted,
    InProgress,
    Done,
    Blocked,
}

impl Default for TaskStatus {
    fn default() -> Self {
        Self::NotStarted
    }
}

/// Date relationship between a predecessor and a successor.
#[pyclass(eq, eq_int)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DependencyKind {
    FinishToStart,
    StartToStart,
    FinishToFinish,
    StartToFinish,
}

impl Default for DependencyKind {
    fn default() -> Self {
        Self::FinishToStart
    }
}

/// A typed dependency between two tasks of one project.
#[pyclass]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Dependency {
    #[pyo3(get, set)]
    pub predecessor_id: String,
    #[pyo3(get, set)]
    pub successor_id: String,
    #[pyo3(get, set)]
    pub kind: DependencyKind,
    /// Offset in working days; negative values are leads.
    #[pyo3(get, set)]
    pub lag_days: i64,
}

impl Dependency {
    pub fn new(
        predecessor_id: impl Into<String>,
        successor_id: impl Into<String>,
        kind: DependencyKind,
        lag_days: i64,
    ) -> Self {
        Self {
            predecessor_id: predecessor_id.into(),
            successor_id: successor_id.into(),
            kind,
            lag_days,
        }
    }
}

#[pymethods]
impl Dependency {
    #[new]
    #[pyo3(signature = (predecessor_id, successor_id, kind=DependencyKind::FinishToStart, lag_days=0))]
    fn py_new(
        predecessor_id: String,
        successor_id: String,
        kind: DependencyKind,
        lag_days: i64,
    ) -> Self {
        Self::new(predecessor_id, successor_id, kind, lag_days)
    }

    fn __repr__(&self) -> String {
        format!(
            "Dependency({:?} -> {:?}, kind={:?}, lag_days={})",
            self.predecessor_id, self.successor_id, self.kind, self.lag_days
        )
    }
}

/// A task to be scheduled.
#[pyclass]
#[derive(Clone, Debug, PartialEq)]
pub struct Task {
    #[pyo3(get, set)]
    pub id: String,
    #[pyo3(get, set)]
    pub name: String,
    #[pyo3(get, set)]
    pub start_date: Option<NaiveDate>,
    /// Duration in working days; 0 marks a milestone, `None` leaves the task unscheduled.
    #[pyo3(get, set)]
    pub duration_days: Option<i64>,
    #[pyo3(get, set)]
    pub percent_complete: f64,
    #[pyo3(get, set)]
    pub priority: i32,
    #[pyo3(get, set)]
    pub deadline: Option<NaiveDate>,
    #[pyo3(get, set)]
    pub actual_start: Option<NaiveDate>,
    #[pyo3(get, set)]
    pub actual_end: Option<NaiveDate>,
    #[pyo3(get, set)]
    pub status: TaskStatus,
}

impl Default for Task {
    fn default() -> Self {
        Self {
            id: String::new(),
            name: String::new(),
            start_date: None,
            duration_days: None,
            percent_complete: 0.0,
            priority: DEFAULT_PRIORITY,
            deadline: None,
            actual_start: None,
            actual_end: None,
            status: TaskStatus::NotStarted,
        }
    }
}

impl Task {
    /// Whether any progress has been recorded against the task.
    pub fn has_started(&self) -> bool {
        self.actual_start.is_some()
            || self.actual_end.is_some()
            || self.percent_complete > 0.0
            || matches!(self.status, TaskStatus::InProgress | TaskStatus::Done)
    }
}

#[pymethods]
impl Task {
    #[new]
    #[pyo3(signature = (
        id,
        name,
        start_date=None,
        duration_days=None,
        percent_complete=0.0,
        priority=DEFAULT_PRIORITY,
        deadline=None,
        actual_start=None,
        actual_end=None,
        status=TaskStatus::NotStarted
    ))]
    #[allow(clippy::too_many_arguments)]
    fn py_new(
        id: String,
        name: String,
        start_date: Option<NaiveDate>,
        duration_days: Option<i64>,
        percent_complete: f64,
        priority: i32,
        deadline: Option<NaiveDate>,
        actual_start: Option<NaiveDate>,
        actual_end: Option<NaiveDate>,
        status: TaskStatus,
    ) -> Self {
        Self {
            id,
            name,
            start_date,
            duration_days,
            percent_complete,
            priority,
            deadline,
            actual_start,
            actual_end,
            status,
        }
    }

    fn __repr__(&self) -> String {
        format!(
            "Task(id={:?}, name={:?}, start={:?}, duration_days={:?})",
            self.id, self.name, self.start_date, self.duration_days
        )
    }
}

/// A resource that tasks can be assigned to.
#[pyclass]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Resource {
    #[pyo3(get, set)]
    pub id: String,
    #[pyo3(get, set)]
    pub name: String,
}

impl Resource {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

#[pymethods]
impl Resource {
    #[new]
    fn py_new(id: String, name: String) -> Self {
        Self::new(id, name)
    }

    fn __repr__(&self) -> String {
        format!("Resource(id={:?}, name={:?})", self.id, self.name)
    }
}

/// Share of a resource's working day consumed by a task.
#[pyclass]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Assignment {
    #[pyo3(get, set)]
    pub task_id: String,
    #[pyo3(get, set)]
    pub resource_id: String,
    #[pyo3(get, set)]
    pub allocation_percent: f64,
}

impl Assignment {
    pub fn new(
        task_id: impl Into<String>,
        resource_id: impl Into<String>,
        allocation_percent: f64,
    ) -> Self {
        Self {
            task_id: task_id.into(),
            resource_id: resource_id.into(),
            allocation_percent,
        }
    }
}

#[pymethods]
impl Assignment {
    #[new]
    #[pyo3(signature = (task_id, resource_id, allocation_percent=100.0))]
    fn py_new(task_id: String, resource_id: String, allocation_percent: f64) -> Self {
        Self::new(task_id, resource_id, allocation_percent)
    }

    fn __repr__(&self) -> String {
        format!(
            "Assignment(task_id={:?}, resource_id={:?}, allocation_percent={})",
            self.task_id, self.resource_id, self.allocation_percent
        )
    }
}
