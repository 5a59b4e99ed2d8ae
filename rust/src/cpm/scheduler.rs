//! Critical path scheduler.
//!
//! A [`CpmScheduler`] is built against one snapshot of tasks and dependencies.
//! Building validates the graph once; [`CpmScheduler::schedule`] can then be run
//! any number of times (the leveling engine re-runs it with shift offsets).
//! When the snapshot changes the scheduler is stale and must be rebuilt.

use std::collections::HashMap;

use super::graph::DependencyGraph;
use super::passes::{backward_pass, forward_pass, total_float};
use super::types::{CpmSchedule, CpmTaskInfo, DateSpan};
use crate::calendar::WorkCalendar;
use crate::config::SchedulingConfig;
use crate::error::SchedulingError;
use crate::log_changes;
use crate::models::{Dependency, Task};

pub struct CpmScheduler<'a> {
    calendar: &'a WorkCalendar,
    tasks: &'a [Task],
    graph: DependencyGraph,
    config: SchedulingConfig,
}

impl<'a> CpmScheduler<'a> {
    /// Validate the dependency graph and fix the topological order.
    pub fn new(
        calendar: &'a WorkCalendar,
        tasks: &'a [Task],
        dependencies: &[Dependency],
        config: &SchedulingConfig,
    ) -> Result<Self, SchedulingError> {
        let graph = DependencyGraph::build(tasks, dependencies)?;
        log_changes!(
            config.verbosity,
            "Dependency graph: {} tasks, {} dependencies",
            tasks.len(),
            dependencies.len()
        );
        Ok(Self {
            calendar,
            tasks,
            graph,
            config: config.clone(),
        })
    }

    pub fn calendar(&self) -> &'a WorkCalendar {
        self.calendar
    }

    pub fn tasks(&self) -> &'a [Task] {
        self.tasks
    }

    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    pub fn config(&self) -> &SchedulingConfig {
        &self.config
    }

    /// Run both passes and build the per-task result map.
    pub fn schedule(&self) -> Result<CpmSchedule, SchedulingError> {
        self.schedule_with_offsets(&[])
    }

    /// Run both passes with per-task leveling offsets (indexed like the task slice).
    pub(crate) fn schedule_with_offsets(
        &self,
        offsets: &[i64],
    ) -> Result<CpmSchedule, SchedulingError> {
        if self.tasks.is_empty() {
            return Ok(CpmSchedule::default());
        }
        let verbosity = self.config.verbosity;

        let early = forward_pass(
            self.calendar,
            self.tasks,
            &self.graph,
            self.config.project_start,
            offsets,
            verbosity,
        );

        let Some(project_end) = early.iter().flatten().map(|span| span.finish).max() else {
            let first = self
                .tasks
                .iter()
                .map(|t| t.id.as_str())
                .min()
                .unwrap_or_default();
            return Err(SchedulingError::UnschedulableTask(first.to_string()));
        };

        let late = backward_pass(self.calendar, self.tasks, &self.graph, &early, project_end);

        let mut infos = HashMap::with_capacity(self.tasks.len());
        for (i, task) in self.tasks.iter().enumerate() {
            let info = task_info(self.calendar, task, early[i], late[i]);
            if info.is_critical {
                log_changes!(
                    verbosity,
                    "  Critical: {} {:?}..{:?}",
                    task.id,
                    info.earliest_start,
                    info.earliest_finish
                );
            }
            infos.insert(task.id.clone(), info);
        }

        log_changes!(verbosity, "Project finish: {}", project_end);
        Ok(CpmSchedule::new(infos))
    }
}

fn task_info(
    calendar: &WorkCalendar,
    task: &Task,
    early: Option<DateSpan>,
    late: Option<DateSpan>,
) -> CpmTaskInfo {
    let total_float_days = match (early, late) {
        (Some(early), Some(late)) => Some(total_float(calendar, early, late)),
        _ => None,
    };
    let earliest_finish = early.map(|span| span.finish);
    let late_by_days = match (task.deadline, earliest_finish) {
        (Some(deadline), Some(finish)) if finish > deadline => {
            Some(calendar.working_days_between(deadline, finish))
        }
        _ => None,
    };

    CpmTaskInfo {
        task_id: task.id.clone(),
        task_name: task.name.clone(),
        earliest_start: early.map(|span| span.start),
        earliest_finish,
        latest_start: late.map(|span| span.start),
        latest_finish: late.map(|span| span.finish),
        total_float_days,
        is_critical: total_float_days == Some(0),
        deadline: task.deadline,
        late_by_days,
    }
}

/// Recalculate every task's dates, float and criticality.
///
/// # Errors
/// * `Configuration` on duplicate task ids
/// * `DanglingReference` when a dependency names an unknown task
/// * `Cycle` when the dependencies are not acyclic
/// * `UnschedulableTask` when no task can be given dates at all
pub fn recalculate_schedule(
    calendar: &WorkCalendar,
    tasks: &[Task],
    dependencies: &[Dependency],
    config: &SchedulingConfig,
) -> Result<CpmSchedule, SchedulingError> {
    CpmScheduler::new(calendar, tasks, dependencies, config)?.schedule()
}
