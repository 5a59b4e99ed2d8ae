//! Types for critical path scheduling.

use chrono::NaiveDate;
use pyo3::prelude::*;
use std::collections::HashMap;

use crate::models::{Dependency, DependencyKind};

/// Constraint carried by one dependency edge, with its lag in working days.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Relation {
    FinishToStart(i64),
    StartToStart(i64),
    FinishToFinish(i64),
    StartToFinish(i64),
}

impl Relation {
    pub fn new(kind: DependencyKind, lag_days: i64) -> Self {
        match kind {
            DependencyKind::FinishToStart => Relation::FinishToStart(lag_days),
            DependencyKind::StartToStart => Relation::StartToStart(lag_days),
            DependencyKind::FinishToFinish => Relation::FinishToFinish(lag_days),
            DependencyKind::StartToFinish => Relation::StartToFinish(lag_days),
        }
    }

    pub fn lag_days(&self) -> i64 {
        match *self {
            Relation::FinishToStart(lag)
            | Relation::StartToStart(lag)
            | Relation::FinishToFinish(lag)
            | Relation::StartToFinish(lag) => lag,
        }
    }
}

impl From<&Dependency> for Relation {
    fn from(dep: &Dependency) -> Self {
        Relation::new(dep.kind, dep.lag_days)
    }
}

/// Start and finish of a task, both inclusive working dates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DateSpan {
    pub start: NaiveDate,
    pub finish: NaiveDate,
}

/// Per-task result of one recalculation.
#[pyclass]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CpmTaskInfo {
    #[pyo3(get)]
    pub task_id: String,
    #[pyo3(get)]
    pub task_name: String,
    #[pyo3(get)]
    pub earliest_start: Option<NaiveDate>,
    #[pyo3(get)]
    pub earliest_finish: Option<NaiveDate>,
    #[pyo3(get)]
    pub latest_start: Option<NaiveDate>,
    #[pyo3(get)]
    pub latest_finish: Option<NaiveDate>,
    /// Working days the task can slip without moving the project end.
    #[pyo3(get)]
    pub total_float_days: Option<i64>,
    #[pyo3(get)]
    pub is_critical: bool,
    #[pyo3(get)]
    pub deadline: Option<NaiveDate>,
    /// Working days past the deadline, when the earliest finish misses it.
    #[pyo3(get)]
    pub late_by_days: Option<i64>,
}

#[pymethods]
impl CpmTaskInfo {
    /// Whether the task received dates in this recalculation.
    pub fn is_scheduled(&self) -> bool {
        self.earliest_start.is_some() && self.earliest_finish.is_some()
    }

    fn __repr__(&self) -> String {
        format!(
            "CpmTaskInfo(task_id={:?}, es={:?}, ef={:?}, float={:?}, critical={})",
            self.task_id,
            self.earliest_start,
            self.earliest_finish,
            self.total_float_days,
            self.is_critical
        )
    }
}

/// Result of a full recalculation: one [`CpmTaskInfo`] per task.
///
/// Always built whole; a failed recalculation produces no schedule at all.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CpmSchedule {
    tasks: HashMap<String, CpmTaskInfo>,
    project_finish: Option<NaiveDate>,
}

impl CpmSchedule {
    pub(crate) fn new(tasks: HashMap<String, CpmTaskInfo>) -> Self {
        let project_finish = tasks.values().filter_map(|t| t.earliest_finish).max();
        Self {
            tasks,
            project_finish,
        }
    }

    /// Wrap a map produced by an earlier recalculation (e.g. handed back by Python).
    pub fn from_map(tasks: HashMap<String, CpmTaskInfo>) -> Self {
        Self::new(tasks)
    }

    pub fn get(&self, task_id: &str) -> Option<&CpmTaskInfo> {
        self.tasks.get(task_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &CpmTaskInfo)> {
        self.tasks.iter()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Latest earliest-finish over all scheduled tasks.
    pub fn project_finish(&self) -> Option<NaiveDate> {
        self.project_finish
    }

    /// Critical task ids ordered by earliest start, then id.
    pub fn critical_path(&self) -> Vec<String> {
        let mut critical: Vec<&CpmTaskInfo> =
            self.tasks.values().filter(|t| t.is_critical).collect();
        critical.sort_by(|a, b| {
            a.earliest_start
                .cmp(&b.earliest_start)
                .then_with(|| a.task_id.cmp(&b.task_id))
        });
        critical.into_iter().map(|t| t.task_id.clone()).collect()
    }

    pub fn as_map(&self) -> &HashMap<String, CpmTaskInfo> {
        &self.tasks
    }

    pub fn into_map(self) -> HashMap<String, CpmTaskInfo> {
        self.tasks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn info(id: &str, start: NaiveDate, finish: NaiveDate, critical: bool) -> CpmTaskInfo {
        CpmTaskInfo {
            task_id: id.to_string(),
            task_name: id.to_uppercase(),
            earliest_start: Some(start),
            earliest_finish: Some(finish),
            total_float_days: Some(if critical { 0 } else { 2 }),
            is_critical: critical,
            ..CpmTaskInfo::default()
        }
    }

    #[test]
    fn test_relation_from_dependency() {
        let dep = Dependency::new("a", "b", DependencyKind::FinishToFinish, -2);
        let relation = Relation::from(&dep);
        assert_eq!(relation, Relation::FinishToFinish(-2));
        assert_eq!(relation.lag_days(), -2);
    }

    #[test]
    fn test_schedule_project_finish_and_critical_path() {
        let mut tasks = HashMap::new();
        tasks.insert("b".to_string(), info("b", d(2024, 5, 8), d(2024, 5, 10), true));
        tasks.insert("a".to_string(), info("a", d(2024, 5, 6), d(2024, 5, 7), true));
        tasks.insert("c".to_string(), info("c", d(2024, 5, 6), d(2024, 5, 6), false));
        tasks.insert("u".to_string(), CpmTaskInfo::default());

        let schedule = CpmSchedule::new(tasks);
        assert_eq!(schedule.project_finish(), Some(d(2024, 5, 10)));
        assert_eq!(schedule.critical_path(), vec!["a".to_string(), "b".to_string()]);
        assert!(!schedule.get("u").unwrap().is_scheduled());
        assert_eq!(schedule.len(), 4);
    }
}
