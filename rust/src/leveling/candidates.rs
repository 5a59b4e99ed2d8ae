//! Choosing which task to move off a conflict.
//!
//! This is a heuristic, not an optimizer: it prefers tasks that are cheap to
//! move (no progress, no dependents, low importance) and otherwise the one that
//! starts earliest.

use chrono::NaiveDate;
use std::cmp::{Ordering, Reverse};

use super::conflicts::cmp_f64;
use super::types::ResourceConflict;
use crate::cpm::{CpmSchedule, DependencyGraph};
use crate::interner::TaskIdx;
use crate::models::Task;

/// Sort key for leveling candidates (lower = moved first).
///
/// Order: lowest percent complete, then highest priority number, then
/// earliest start, then task id.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct CandidateKey {
    percent_complete: f64,
    priority: Reverse<i32>,
    earliest_start: NaiveDate,
    task_id: String,
}

impl Eq for CandidateKey {}

impl Ord for CandidateKey {
    fn cmp(&self, other: &Self) -> Ordering {
        cmp_f64(self.percent_complete, other.percent_complete)
            .then(self.priority.cmp(&other.priority))
            .then(self.earliest_start.cmp(&other.earliest_start))
            .then_with(|| self.task_id.cmp(&other.task_id))
    }
}

impl PartialOrd for CandidateKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Key for a task that may be moved, or `None` when it must stay put.
///
/// Movable tasks have no successors, no recorded progress and a computed start.
pub(crate) fn candidate_key(
    task: &Task,
    idx: TaskIdx,
    graph: &DependencyGraph,
    schedule: &CpmSchedule,
) -> Option<CandidateKey> {
    if graph.has_successors(idx) || task.has_started() {
        return None;
    }
    let earliest_start = schedule.get(&task.id)?.earliest_start?;
    Some(CandidateKey {
        percent_complete: task.percent_complete,
        priority: Reverse(task.priority),
        earliest_start,
        task_id: task.id.clone(),
    })
}

/// Pick the task to shift for one conflict.
pub(crate) fn choose_candidate(
    conflict: &ResourceConflict,
    tasks: &[Task],
    graph: &DependencyGraph,
    schedule: &CpmSchedule,
) -> Option<TaskIdx> {
    conflict
        .entries
        .iter()
        .filter_map(|entry| {
            let idx = graph.index().get(&entry.task_id)?;
            let key = candidate_key(&tasks[idx as usize], idx, graph, schedule)?;
            Some((key, idx))
        })
        .min_by(|(a, _), (b, _)| a.cmp(b))
        .map(|(_, idx)| idx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::WorkCalendar;
    use crate::config::SchedulingConfig;
    use crate::cpm::recalculate_schedule;
    use crate::leveling::types::ResourceConflictEntry;
    use crate::models::{Dependency, DependencyKind};

    fn d(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn make_task(id: &str, start: NaiveDate, priority: i32) -> Task {
        Task {
            id: id.to_string(),
            name: id.to_string(),
            start_date: Some(start),
            duration_days: Some(2),
            priority,
            ..Task::default()
        }
    }

    fn conflict_over(ids: &[&str]) -> ResourceConflict {
        ResourceConflict {
            resource_id: "r1".to_string(),
            resource_name: "Alice".to_string(),
            date: d(2024, 5, 7),
            total_allocation_percent: 100.0 * ids.len() as f64,
            entries: ids
                .iter()
                .map(|id| ResourceConflictEntry {
                    task_id: id.to_string(),
                    task_name: id.to_string(),
                    allocation_percent: 100.0,
                })
                .collect(),
        }
    }

    fn pick(tasks: &[Task], deps: &[Dependency], ids: &[&str]) -> Option<String> {
        let graph = DependencyGraph::build(tasks, deps).unwrap();
        let schedule =
            recalculate_schedule(&WorkCalendar::default(), tasks, deps, &SchedulingConfig::default())
                .unwrap();
        choose_candidate(&conflict_over(ids), tasks, &graph, &schedule)
            .map(|idx| graph.index().resolve(idx).unwrap().to_string())
    }

    #[test]
    fn test_key_ordering() {
        let base = CandidateKey {
            percent_complete: 0.0,
            priority: Reverse(50),
            earliest_start: d(2024, 5, 6),
            task_id: "b".to_string(),
        };
        let less_important = CandidateKey {
            priority: Reverse(80),
            ..base.clone()
        };
        let later = CandidateKey {
            earliest_start: d(2024, 5, 7),
            task_id: "a".to_string(),
            ..base.clone()
        };
        assert!(less_important < base);
        assert!(base < later);
    }

    #[test]
    fn test_prefers_least_important_task() {
        let tasks = vec![
            make_task("a", d(2024, 5, 6), 10),
            make_task("b", d(2024, 5, 7), 90),
        ];
        assert_eq!(pick(&tasks, &[], &["a", "b"]), Some("b".to_string()));
    }

    #[test]
    fn test_ties_break_on_earliest_start_then_id() {
        let tasks = vec![
            make_task("b", d(2024, 5, 6), 50),
            make_task("a", d(2024, 5, 7), 50),
            make_task("c", d(2024, 5, 6), 50),
        ];
        assert_eq!(pick(&tasks, &[], &["a", "b", "c"]), Some("b".to_string()));
    }

    #[test]
    fn test_started_and_predecessor_tasks_are_not_candidates() {
        let tasks = vec![
            Task {
                percent_complete: 25.0,
                ..make_task("started", d(2024, 5, 6), 90)
            },
            make_task("pred", d(2024, 5, 6), 90),
            make_task("succ", d(2024, 5, 6), 10),
        ];
        let deps = vec![Dependency::new("pred", "succ", DependencyKind::FinishToStart, 0)];
        assert_eq!(
            pick(&tasks, &deps, &["started", "pred", "succ"]),
            Some("succ".to_string())
        );
        assert_eq!(pick(&tasks, &deps, &["started", "pred"]), None);
    }
}
