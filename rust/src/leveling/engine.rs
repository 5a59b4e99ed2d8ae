//! Resource leveling: automatic conflict removal and manual shifts.
//!
//! Shifts never edit the input tasks. They are kept as per-task working-day
//! offsets and fed back into the scheduler, so every step is a full
//! recalculation over the same validated graph.

use std::cmp::Ordering as CmpOrdering;
use std::sync::atomic::{AtomicBool, Ordering};

use super::candidates::choose_candidate;
use super::conflicts::{cmp_f64, preview_conflicts};
use super::types::{LevelingOutcome, ResourceConflict, ResourceLevelingAction, ResourceLevelingResult};
use crate::calendar::WorkCalendar;
use crate::config::{LevelingConfig, SchedulingConfig};
use crate::cpm::{CpmSchedule, CpmScheduler};
use crate::error::SchedulingError;
use crate::interner::TaskIdx;
use crate::models::{Assignment, Dependency, Resource, Task};
use crate::{log_changes, log_checks};

/// Working days an auto-leveling step moves the chosen task.
pub const AUTO_LEVEL_SHIFT_DAYS: i64 = 1;

/// Reason recorded on manual actions when the caller gives none.
pub const DEFAULT_MANUAL_REASON: &str = "Manual shift";

/// Leveling over one validated project snapshot.
pub struct ResourceLevelingEngine<'a> {
    scheduler: CpmScheduler<'a>,
    resources: &'a [Resource],
    assignments: &'a [Assignment],
    config: LevelingConfig,
}

impl<'a> ResourceLevelingEngine<'a> {
    pub fn new(
        scheduler: CpmScheduler<'a>,
        resources: &'a [Resource],
        assignments: &'a [Assignment],
        config: &LevelingConfig,
    ) -> Result<Self, SchedulingError> {
        config.validate()?;
        Ok(Self {
            scheduler,
            resources,
            assignments,
            config: config.clone(),
        })
    }

    pub fn scheduler(&self) -> &CpmScheduler<'a> {
        &self.scheduler
    }

    /// Conflicts in `schedule` at the configured threshold.
    pub fn conflicts(&self, schedule: &CpmSchedule) -> Result<Vec<ResourceConflict>, SchedulingError> {
        preview_conflicts(
            self.scheduler.calendar(),
            schedule,
            self.resources,
            self.assignments,
            self.config.threshold_percent,
        )
    }

    /// Shift tasks one working day at a time until no conflict remains, no
    /// conflict has a movable task, or `max_iterations` shifts were made.
    pub fn auto_level(&self) -> Result<ResourceLevelingResult, SchedulingError> {
        self.auto_level_cancellable(&AtomicBool::new(false))
    }

    /// Like [`Self::auto_level`], stopping early once `cancel` is set.
    ///
    /// The flag is only read between iterations; a recalculation in progress
    /// always completes.
    pub fn auto_level_cancellable(
        &self,
        cancel: &AtomicBool,
    ) -> Result<ResourceLevelingResult, SchedulingError> {
        let verbosity = self.config.verbosity;
        let tasks = self.scheduler.tasks();
        let mut offsets = vec![0i64; tasks.len()];

        let mut schedule = self.scheduler.schedule()?;
        let conflicts_before = self.conflicts(&schedule)?;
        let mut conflicts = conflicts_before.clone();
        let mut actions: Vec<ResourceLevelingAction> = Vec::new();
        let mut iterations: u32 = 0;

        log_changes!(
            verbosity,
            "Auto-leveling: {} conflicts, max {} iterations",
            conflicts.len(),
            self.config.max_iterations
        );

        let outcome = loop {
            if conflicts.is_empty() {
                break LevelingOutcome::Resolved;
            }
            if iterations >= self.config.max_iterations {
                break LevelingOutcome::IterationsExhausted;
            }
            if cancel.load(Ordering::Relaxed) {
                log_changes!(verbosity, "Auto-leveling cancelled after {} iterations", iterations);
                break LevelingOutcome::Cancelled;
            }
            let Some((conflict, idx)) = self.pick_shift(&conflicts, &schedule) else {
                break LevelingOutcome::NoCandidate;
            };

            offsets[idx as usize] += AUTO_LEVEL_SHIFT_DAYS;
            let next = self.scheduler.schedule_with_offsets(&offsets)?;

            let task = &tasks[idx as usize];
            let reason = format!(
                "Auto-leveling: resolved {:.1}% load on {}",
                conflict.total_allocation_percent, conflict.date
            );
            let mut action = shift_action(task, AUTO_LEVEL_SHIFT_DAYS, &schedule, &next, reason);
            action.resource_id = Some(conflict.resource_id.clone());
            action.resource_name = Some(conflict.resource_name.clone());
            action.conflict_date = Some(conflict.date);
            log_changes!(
                verbosity,
                "  Shift {} by {}: {:?} -> {:?} ({} on {})",
                task.id,
                AUTO_LEVEL_SHIFT_DAYS,
                action.old_start,
                action.new_start,
                conflict.resource_name,
                conflict.date
            );
            actions.push(action);

            schedule = next;
            conflicts = self.conflicts(&schedule)?;
            iterations += 1;
        };

        log_changes!(
            verbosity,
            "Auto-leveling finished: {:?}, {} -> {} conflicts",
            outcome,
            conflicts_before.len(),
            conflicts.len()
        );

        Ok(ResourceLevelingResult {
            conflicts_before,
            conflicts_after: conflicts,
            iterations,
            actions,
            outcome,
            schedule: schedule.into_map(),
        })
    }

    /// Worst conflict that has a movable task, with that task.
    ///
    /// Conflicts are tried by descending total, then descending entry count,
    /// then their preview order.
    fn pick_shift<'c>(
        &self,
        conflicts: &'c [ResourceConflict],
        schedule: &CpmSchedule,
    ) -> Option<(&'c ResourceConflict, TaskIdx)> {
        let mut ranked: Vec<&ResourceConflict> = conflicts.iter().collect();
        ranked.sort_by(|a, b| worst_first(a, b));

        let tasks = self.scheduler.tasks();
        let graph = self.scheduler.graph();
        for conflict in ranked {
            match choose_candidate(conflict, tasks, graph, schedule) {
                Some(idx) => return Some((conflict, idx)),
                None => log_checks!(
                    self.config.verbosity,
                    "  No movable task for {} on {}",
                    conflict.resource_id,
                    conflict.date
                ),
            }
        }
        None
    }

    /// Shift one task by hand and recalculate.
    pub fn manual_shift(
        &self,
        task_id: &str,
        shift_working_days: i64,
        reason: &str,
    ) -> Result<(CpmSchedule, ResourceLevelingAction), SchedulingError> {
        shift_task(&self.scheduler, task_id, shift_working_days, reason)
    }
}

/// Stable sort comparator: bigger total first, then more entries.
fn worst_first(a: &ResourceConflict, b: &ResourceConflict) -> CmpOrdering {
    cmp_f64(b.total_allocation_percent, a.total_allocation_percent)
        .then(b.entries.len().cmp(&a.entries.len()))
}

fn shift_action(
    task: &Task,
    shift_working_days: i64,
    before: &CpmSchedule,
    after: &CpmSchedule,
    reason: String,
) -> ResourceLevelingAction {
    let old = before.get(&task.id);
    let new = after.get(&task.id);
    ResourceLevelingAction {
        task_id: task.id.clone(),
        task_name: task.name.clone(),
        resource_id: None,
        resource_name: None,
        conflict_date: None,
        shift_working_days,
        old_start: old.and_then(|info| info.earliest_start),
        old_end: old.and_then(|info| info.earliest_finish),
        new_start: new.and_then(|info| info.earliest_start),
        new_end: new.and_then(|info| info.earliest_finish),
        reason,
    }
}

fn shift_task(
    scheduler: &CpmScheduler<'_>,
    task_id: &str,
    shift_working_days: i64,
    reason: &str,
) -> Result<(CpmSchedule, ResourceLevelingAction), SchedulingError> {
    let idx = scheduler
        .graph()
        .index()
        .get(task_id)
        .ok_or_else(|| SchedulingError::unknown_task(task_id))?;
    let task = &scheduler.tasks()[idx as usize];

    if shift_working_days == 0 {
        return Err(SchedulingError::InvalidShift {
            task_id: task_id.to_string(),
            reason: "shift must be a non-zero number of working days".to_string(),
        });
    }
    if let Some(actual) = task.actual_start.or(task.actual_end) {
        return Err(SchedulingError::InvalidShift {
            task_id: task_id.to_string(),
            reason: format!("task has recorded actual dates (since {})", actual),
        });
    }

    let before = scheduler.schedule()?;
    if before.get(task_id).and_then(|info| info.earliest_start).is_none() {
        return Err(SchedulingError::UnschedulableTask(task_id.to_string()));
    }

    let mut offsets = vec![0i64; scheduler.tasks().len()];
    offsets[idx as usize] = shift_working_days;
    let after = scheduler.schedule_with_offsets(&offsets)?;

    let reason = if reason.is_empty() {
        DEFAULT_MANUAL_REASON
    } else {
        reason
    };
    let action = shift_action(task, shift_working_days, &before, &after, reason.to_string());
    log_changes!(
        scheduler.config().verbosity,
        "Manual shift {} by {}: {:?} -> {:?}",
        task_id,
        shift_working_days,
        action.old_start,
        action.new_start
    );
    Ok((after, action))
}

/// Run auto-leveling over a project snapshot.
///
/// # Errors
/// Any error `recalculate_schedule` or `preview_conflicts` can raise, raised
/// before a single shift is made. Unresolved conflicts are reported through
/// [`LevelingOutcome`], never as an error.
pub fn auto_level(
    calendar: &WorkCalendar,
    tasks: &[Task],
    dependencies: &[Dependency],
    resources: &[Resource],
    assignments: &[Assignment],
    config: &LevelingConfig,
) -> Result<ResourceLevelingResult, SchedulingError> {
    auto_level_cancellable(
        calendar,
        tasks,
        dependencies,
        resources,
        assignments,
        config,
        &AtomicBool::new(false),
    )
}

/// [`auto_level`] with a caller-owned cancellation flag.
pub fn auto_level_cancellable(
    calendar: &WorkCalendar,
    tasks: &[Task],
    dependencies: &[Dependency],
    resources: &[Resource],
    assignments: &[Assignment],
    config: &LevelingConfig,
    cancel: &AtomicBool,
) -> Result<ResourceLevelingResult, SchedulingError> {
    config.validate()?;
    let scheduler = CpmScheduler::new(calendar, tasks, dependencies, &config.scheduling_config())?;
    let engine = ResourceLevelingEngine::new(scheduler, resources, assignments, config)?;
    engine.auto_level_cancellable(cancel)
}

/// Shift one task by a signed number of working days and recalculate.
///
/// # Errors
/// * `InvalidShift` for a zero shift or a task with recorded actual dates
/// * `DanglingReference` for an unknown task
/// * `UnschedulableTask` when the task has no computed start to move
pub fn manual_shift(
    calendar: &WorkCalendar,
    tasks: &[Task],
    dependencies: &[Dependency],
    task_id: &str,
    shift_working_days: i64,
    reason: &str,
    config: &SchedulingConfig,
) -> Result<CpmSchedule, SchedulingError> {
    manual_shift_action(
        calendar,
        tasks,
        dependencies,
        task_id,
        shift_working_days,
        reason,
        config,
    )
    .map(|(schedule, _)| schedule)
}

/// [`manual_shift`], also returning the action record for the shift.
pub fn manual_shift_action(
    calendar: &WorkCalendar,
    tasks: &[Task],
    dependencies: &[Dependency],
    task_id: &str,
    shift_working_days: i64,
    reason: &str,
    config: &SchedulingConfig,
) -> Result<(CpmSchedule, ResourceLevelingAction), SchedulingError> {
    let scheduler = CpmScheduler::new(calendar, tasks, dependencies, config)?;
    shift_task(&scheduler, task_id, shift_working_days, reason)
}
