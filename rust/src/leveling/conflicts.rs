//! Day-level over-allocation detection.

use chrono::NaiveDate;
use rustc_hash::FxHashMap;
use std::cmp::Ordering;

use super::types::{ResourceConflict, ResourceConflictEntry};
use crate::calendar::WorkCalendar;
use crate::config::validate_threshold;
use crate::cpm::CpmSchedule;
use crate::error::SchedulingError;
use crate::models::{Assignment, Resource};

/// Slack allowed above the threshold before a bucket counts as a conflict.
pub const ALLOCATION_TOLERANCE: f64 = 1e-9;

/// Compare f64 values for sorting, treating NaN as equal.
pub(crate) fn cmp_f64(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

/// Check that every assignment names a known task and a known resource.
pub(crate) fn validate_assignments(
    schedule: &CpmSchedule,
    resources: &[Resource],
    assignments: &[Assignment],
) -> Result<(), SchedulingError> {
    for assignment in assignments {
        if schedule.get(&assignment.task_id).is_none() {
            return Err(SchedulingError::unknown_task(&assignment.task_id));
        }
        if !resources.iter().any(|r| r.id == assignment.resource_id) {
            return Err(SchedulingError::unknown_resource(&assignment.resource_id));
        }
    }
    Ok(())
}

/// Find every (resource, working day) whose summed allocation exceeds `threshold_percent`.
///
/// Each assignment contributes its allocation to every working day between the
/// task's earliest start and earliest finish. Tasks without dates contribute
/// nothing; so do non-positive allocations. Several assignments of one task to
/// one resource fold into a single entry.
///
/// Conflicts are ordered by date, then resource name (case-insensitive), then
/// descending total.
pub fn preview_conflicts(
    calendar: &WorkCalendar,
    schedule: &CpmSchedule,
    resources: &[Resource],
    assignments: &[Assignment],
    threshold_percent: f64,
) -> Result<Vec<ResourceConflict>, SchedulingError> {
    validate_threshold(threshold_percent)?;
    validate_assignments(schedule, resources, assignments)?;

    let resource_names: FxHashMap<&str, &str> = resources
        .iter()
        .map(|r| (r.id.as_str(), r.name.as_str()))
        .collect();

    let mut buckets: FxHashMap<(&str, NaiveDate), Vec<(&str, f64)>> = FxHashMap::default();
    for assignment in assignments {
        if assignment.allocation_percent <= 0.0 {
            continue;
        }
        let Some(info) = schedule.get(&assignment.task_id) else {
            continue;
        };
        let (Some(start), Some(finish)) = (info.earliest_start, info.earliest_finish) else {
            continue;
        };
        for day in calendar.working_days_in(start, finish) {
            let entries = buckets
                .entry((assignment.resource_id.as_str(), day))
                .or_default();
            match entries
                .iter()
                .position(|(task_id, _)| *task_id == assignment.task_id)
            {
                Some(pos) => entries[pos].1 += assignment.allocation_percent,
                None => entries.push((assignment.task_id.as_str(), assignment.allocation_percent)),
            }
        }
    }

    let mut conflicts: Vec<ResourceConflict> = Vec::new();
    for ((resource_id, date), shares) in buckets {
        let total: f64 = shares.iter().map(|(_, allocation)| allocation).sum();
        if total <= threshold_percent + ALLOCATION_TOLERANCE {
            continue;
        }

        let mut entries: Vec<ResourceConflictEntry> = shares
            .into_iter()
            .map(|(task_id, allocation_percent)| ResourceConflictEntry {
                task_id: task_id.to_string(),
                task_name: schedule
                    .get(task_id)
                    .map(|info| info.task_name.clone())
                    .unwrap_or_default(),
                allocation_percent,
            })
            .collect();
        entries.sort_by(|a, b| {
            cmp_f64(b.allocation_percent, a.allocation_percent)
                .then_with(|| a.task_name.to_lowercase().cmp(&b.task_name.to_lowercase()))
                .then_with(|| a.task_id.cmp(&b.task_id))
        });

        conflicts.push(ResourceConflict {
            resource_id: resource_id.to_string(),
            resource_name: resource_names
                .get(resource_id)
                .copied()
                .unwrap_or(resource_id)
                .to_string(),
            date,
            total_allocation_percent: total,
            entries,
        });
    }

    conflicts.sort_by(|a, b| {
        a.date
            .cmp(&b.date)
            .then_with(|| {
                a.resource_name
                    .to_lowercase()
                    .cmp(&b.resource_name.to_lowercase())
            })
            .then_with(|| cmp_f64(b.total_allocation_percent, a.total_allocation_percent))
            .then_with(|| a.resource_id.cmp(&b.resource_id))
    });

    Ok(conflicts)
}
