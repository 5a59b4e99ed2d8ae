//! Forward and backward passes over working-day dates.
//!
//! Both passes work on vectors indexed by [`crate::interner::TaskIdx`]. A `None` slot is a task
//! that received no dates (no duration, or nothing to anchor it).

use chrono::NaiveDate;

use super::graph::DependencyGraph;
use super::types::{DateSpan, Relation};
use crate::calendar::WorkCalendar;
use crate::models::Task;
use crate::{log_checks, log_debug};

/// Working days covered by a task: 0 for milestones.
fn span_days(task: &Task) -> i64 {
    task.duration_days.unwrap_or(0).max(0)
}

/// Finish of a task of `span` working days starting on `start`.
pub(crate) fn finish_for_start(calendar: &WorkCalendar, start: NaiveDate, span: i64) -> NaiveDate {
    if span == 0 {
        start
    } else {
        calendar.add_working_days(start, span)
    }
}

/// Start of a task of `span` working days finishing on `finish`.
pub(crate) fn start_for_finish(calendar: &WorkCalendar, finish: NaiveDate, span: i64) -> NaiveDate {
    if span <= 1 {
        finish
    } else {
        calendar.add_working_days(finish, -(span - 1))
    }
}

/// Earliest start a single predecessor allows for a successor of `span` days.
///
/// A lag of 0 lines the constrained date up with the predecessor's date, so a
/// finish-to-start successor may start on the day its predecessor finishes.
fn earliest_start_bound(
    calendar: &WorkCalendar,
    relation: Relation,
    pred: DateSpan,
    span: i64,
) -> NaiveDate {
    match relation {
        Relation::FinishToStart(lag) => calendar.offset_working_days(pred.finish, lag),
        Relation::StartToStart(lag) => calendar.offset_working_days(pred.start, lag),
        Relation::FinishToFinish(lag) => {
            start_for_finish(calendar, calendar.offset_working_days(pred.finish, lag), span)
        }
        Relation::StartToFinish(lag) => {
            start_for_finish(calendar, calendar.offset_working_days(pred.start, lag), span)
        }
    }
}

/// Latest start a single successor allows for a predecessor of `span` days.
///
/// Mirror image of [`earliest_start_bound`].
fn latest_start_bound(
    calendar: &WorkCalendar,
    relation: Relation,
    succ: DateSpan,
    span: i64,
) -> NaiveDate {
    match relation {
        Relation::FinishToStart(lag) => {
            start_for_finish(calendar, calendar.offset_working_days(succ.start, -lag), span)
        }
        Relation::StartToStart(lag) => calendar.offset_working_days(succ.start, -lag),
        Relation::FinishToFinish(lag) => {
            start_for_finish(calendar, calendar.offset_working_days(succ.finish, -lag), span)
        }
        Relation::StartToFinish(lag) => calendar.offset_working_days(succ.finish, -lag),
    }
}

/// Apply recorded progress on top of the planned start.
///
/// An actual end pins the finish (and the start, derived from the duration
/// unless an actual start is recorded). An actual start only ever delays.
fn apply_actuals(
    calendar: &WorkCalendar,
    task: &Task,
    planned_start: Option<NaiveDate>,
    span: i64,
) -> Option<DateSpan> {
    match (task.actual_start, task.actual_end, planned_start) {
        (actual_start, Some(actual_end), _) => Some(DateSpan {
            start: actual_start.unwrap_or_else(|| start_for_finish(calendar, actual_end, span)),
            finish: actual_end,
        }),
        (Some(actual_start), None, planned) if planned.map_or(true, |p| actual_start > p) => {
            Some(DateSpan {
                start: actual_start,
                finish: finish_for_start(calendar, actual_start, span),
            })
        }
        (_, None, Some(start)) => Some(DateSpan {
            start,
            finish: finish_for_start(calendar, start, span),
        }),
        _ => None,
    }
}

/// Move a start by a leveling offset in working days.
fn shifted(calendar: &WorkCalendar, start: NaiveDate, offset: i64) -> NaiveDate {
    if offset == 0 {
        start
    } else {
        calendar.offset_working_days(start, offset)
    }
}

/// Compute earliest start/finish for every task in topological order.
///
/// `offsets` holds per-task leveling shifts in working days (missing entries are
/// zero). A shift never pulls a task ahead of what its predecessors allow.
pub(crate) fn forward_pass(
    calendar: &WorkCalendar,
    tasks: &[Task],
    graph: &DependencyGraph,
    project_start: Option<NaiveDate>,
    offsets: &[i64],
    verbosity: u8,
) -> Vec<Option<DateSpan>> {
    let mut early: Vec<Option<DateSpan>> = vec![None; tasks.len()];

    for &idx in graph.topo_order() {
        let i = idx as usize;
        let task = &tasks[i];
        if task.duration_days.is_none() {
            log_checks!(verbosity, "  Skip {}: no duration", task.id);
            continue;
        }
        let span = span_days(task);
        let offset = offsets.get(i).copied().unwrap_or(0);

        let mut bound: Option<NaiveDate> = None;
        for &(pred, relation) in graph.predecessors(idx) {
            let Some(pred_dates) = early[pred as usize] else {
                continue;
            };
            let candidate = earliest_start_bound(calendar, relation, pred_dates, span);
            log_debug!(
                verbosity,
                "    {} -> {} ({:?}): start >= {}",
                tasks[pred as usize].id,
                task.id,
                relation,
                candidate
            );
            bound = Some(bound.map_or(candidate, |b: NaiveDate| b.max(candidate)));
        }

        let planned = match bound {
            Some(bound) => Some(shifted(calendar, bound, offset).max(bound)),
            None => task
                .start_date
                .or(project_start)
                .map(|anchor| shifted(calendar, calendar.next_working_day(anchor, true), offset)),
        };

        early[i] = apply_actuals(calendar, task, planned, span);
        if early[i].is_none() {
            log_checks!(verbosity, "  Skip {}: nothing to anchor on", task.id);
        }
    }

    early
}

/// Compute latest start/finish in reverse topological order.
///
/// Every task is held to `project_end` as well as to its successors, so a task
/// that finishes the project stays critical even when its only successors hang
/// off its start. A non-working `project_end` (an actual end recorded on a
/// weekend) counts from the working day before it.
pub(crate) fn backward_pass(
    calendar: &WorkCalendar,
    tasks: &[Task],
    graph: &DependencyGraph,
    early: &[Option<DateSpan>],
    project_end: NaiveDate,
) -> Vec<Option<DateSpan>> {
    let mut late: Vec<Option<DateSpan>> = vec![None; tasks.len()];
    let last_day = calendar.previous_working_day(project_end, true);

    for &idx in graph.topo_order().iter().rev() {
        let i = idx as usize;
        let Some(own) = early[i] else {
            continue;
        };
        let span = scheduled_span(calendar, &tasks[i], own);

        let mut start = start_for_finish(calendar, last_day, span);
        for &(succ, relation) in graph.successors(idx) {
            let Some(succ_dates) = late[succ as usize] else {
                continue;
            };
            start = start.min(latest_start_bound(calendar, relation, succ_dates, span));
        }

        late[i] = Some(DateSpan {
            start,
            finish: finish_for_start(calendar, start, span),
        });
    }

    late
}

/// Span of the dates a task actually received, which differs from its
/// duration when progress was recorded.
fn scheduled_span(calendar: &WorkCalendar, task: &Task, dates: DateSpan) -> i64 {
    if span_days(task) == 0 {
        0
    } else {
        calendar.working_days_between(dates.start, dates.finish)
    }
}

/// Total float in working days: 0 whenever the latest start does not trail the earliest.
pub(crate) fn total_float(calendar: &WorkCalendar, early: DateSpan, late: DateSpan) -> i64 {
    if late.start <= early.start {
        return 0;
    }
    (calendar.working_days_between(early.start, late.start) - 1).max(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Dependency, DependencyKind};
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};

    fn d(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn task(id: &str, duration: Option<i64>) -> Task {
        Task {
            id: id.to_string(),
            name: id.to_string(),
            duration_days: duration,
            ..Task::default()
        }
    }

    fn dep(pred: &str, succ: &str, kind: DependencyKind, lag: i64) -> Dependency {
        Dependency::new(pred, succ, kind, lag)
    }

    fn run(tasks: &[Task], deps: &[Dependency], start: NaiveDate) -> Vec<Option<DateSpan>> {
        let graph = DependencyGraph::build(tasks, deps).unwrap();
        forward_pass(&WorkCalendar::default(), tasks, &graph, Some(start), &[], 0)
    }

    /// Both passes; returns (early, late, float) per task.
    fn run_both(
        tasks: &[Task],
        deps: &[Dependency],
        start: NaiveDate,
    ) -> Vec<(DateSpan, DateSpan, i64)> {
        let cal = WorkCalendar::default();
        let graph = DependencyGraph::build(tasks, deps).unwrap();
        let early = forward_pass(&cal, tasks, &graph, Some(start), &[], 0);
        let project_end = early.iter().flatten().map(|s| s.finish).max().unwrap();
        let late = backward_pass(&cal, tasks, &graph, &early, project_end);
        early
            .iter()
            .zip(&late)
            .map(|(e, l)| {
                let (e, l) = (e.unwrap(), l.unwrap());
                (e, l, total_float(&cal, e, l))
            })
            .collect()
    }

    #[test]
    fn test_finish_to_start_starts_on_predecessor_finish() {
        // Mon 2024-05-06
        let tasks = vec![task("a", Some(2)), task("b", Some(3))];
        let deps = vec![dep("a", "b", DependencyKind::FinishToStart, 0)];
        let early = run(&tasks, &deps, d(2024, 5, 6));

        let a = early[0].unwrap();
        let b = early[1].unwrap();
        assert_eq!((a.start, a.finish), (d(2024, 5, 6), d(2024, 5, 7)));
        assert_eq!(b.start, a.finish);
        assert_eq!(b.finish, d(2024, 5, 9));
    }

    #[test]
    fn test_finish_to_start_lag_skips_weekend() {
        // a ends Fri 2024-05-10; one working day later is Mon 2024-05-13.
        let tasks = vec![task("a", Some(5)), task("b", Some(1))];
        let deps = vec![dep("a", "b", DependencyKind::FinishToStart, 1)];
        let early = run(&tasks, &deps, d(2024, 5, 6));
        assert_eq!(early[1].unwrap().start, d(2024, 5, 13));
    }

    #[test]
    fn test_start_to_start_with_lag() {
        let tasks = vec![task("a", Some(5)), task("b", Some(2))];
        let deps = vec![dep("a", "b", DependencyKind::StartToStart, 2)];
        let early = run(&tasks, &deps, d(2024, 5, 6));
        assert_eq!(early[1].unwrap().start, d(2024, 5, 8));
    }

    #[test]
    fn test_start_to_start_with_lead() {
        // a starts Thu 2024-05-09; b may start two working days earlier.
        let tasks = vec![
            Task {
                start_date: Some(d(2024, 5, 9)),
                ..task("a", Some(5))
            },
            task("b", Some(2)),
        ];
        let deps = vec![dep("a", "b", DependencyKind::StartToStart, -2)];
        let early = run(&tasks, &deps, d(2024, 5, 6));
        assert_eq!(early[1].unwrap().start, d(2024, 5, 7));
    }

    #[test]
    fn test_finish_to_finish_aligns_finish() {
        let tasks = vec![task("a", Some(5)), task("b", Some(2))];
        let deps = vec![dep("a", "b", DependencyKind::FinishToFinish, 0)];
        let early = run(&tasks, &deps, d(2024, 5, 6));
        let b = early[1].unwrap();
        assert_eq!((b.start, b.finish), (d(2024, 5, 9), d(2024, 5, 10)));
    }

    #[test]
    fn test_start_to_finish() {
        // b must finish no earlier than a starts (Wed 2024-05-08).
        let tasks = vec![
            Task {
                start_date: Some(d(2024, 5, 8)),
                ..task("a", Some(1))
            },
            task("b", Some(3)),
        ];
        let deps = vec![dep("a", "b", DependencyKind::StartToFinish, 0)];
        let early = run(&tasks, &deps, d(2024, 5, 6));
        let b = early[1].unwrap();
        assert_eq!((b.start, b.finish), (d(2024, 5, 6), d(2024, 5, 8)));
    }

    #[test]
    fn test_milestone_sits_on_predecessor_finish() {
        let tasks = vec![task("a", Some(2)), task("m", Some(0))];
        let deps = vec![dep("a", "m", DependencyKind::FinishToStart, 0)];
        let early = run(&tasks, &deps, d(2024, 5, 6));
        let m = early[1].unwrap();
        assert_eq!((m.start, m.finish), (d(2024, 5, 7), d(2024, 5, 7)));
    }

    #[test]
    fn test_actual_end_pins_finish() {
        let tasks = vec![
            Task {
                actual_end: Some(d(2024, 5, 14)),
                ..task("a", Some(2))
            },
            task("b", Some(1)),
        ];
        let deps = vec![dep("a", "b", DependencyKind::FinishToStart, 0)];
        let early = run(&tasks, &deps, d(2024, 5, 6));
        let a = early[0].unwrap();
        assert_eq!((a.start, a.finish), (d(2024, 5, 13), d(2024, 5, 14)));
        assert_eq!(early[1].unwrap().start, d(2024, 5, 14));
    }

    #[test]
    fn test_earlier_actual_start_does_not_pull_ahead() {
        let tasks = vec![Task {
            actual_start: Some(d(2024, 5, 1)),
            start_date: Some(d(2024, 5, 6)),
            ..task("a", Some(1))
        }];
        let early = run(&tasks, &[], d(2024, 5, 6));
        assert_eq!(early[0].unwrap().start, d(2024, 5, 6));
    }

    #[test]
    fn test_unanchored_and_durationless_tasks_stay_unscheduled() {
        let tasks = vec![task("a", None), task("b", Some(2))];
        let graph = DependencyGraph::build(&tasks, &[]).unwrap();
        let early = forward_pass(&WorkCalendar::default(), &tasks, &graph, None, &[], 0);
        assert!(early.iter().all(Option::is_none));
    }

    #[test]
    fn test_offset_delays_but_never_pulls_ahead_of_predecessor() {
        let tasks = vec![task("a", Some(1)), task("b", Some(1))];
        let deps = vec![dep("a", "b", DependencyKind::FinishToStart, 0)];
        let graph = DependencyGraph::build(&tasks, &deps).unwrap();
        let cal = WorkCalendar::default();

        let delayed = forward_pass(&cal, &tasks, &graph, Some(d(2024, 5, 6)), &[0, 2], 0);
        assert_eq!(delayed[1].unwrap().start, d(2024, 5, 8));

        let pulled = forward_pass(&cal, &tasks, &graph, Some(d(2024, 5, 6)), &[0, -3], 0);
        assert_eq!(pulled[1].unwrap().start, d(2024, 5, 6));
    }

    #[test]
    fn test_backward_pass_gives_float_to_short_branch() {
        // a(1) -> b(3), a(1) -> c(1); project ends with b on Wed 2024-05-08.
        let tasks = vec![task("a", Some(1)), task("b", Some(3)), task("c", Some(1))];
        let deps = vec![
            dep("a", "b", DependencyKind::FinishToStart, 0),
            dep("a", "c", DependencyKind::FinishToStart, 0),
        ];
        let dates = run_both(&tasks, &deps, d(2024, 5, 6));

        let (_, c_late, c_float) = dates[2];
        assert_eq!((c_late.start, c_late.finish), (d(2024, 5, 8), d(2024, 5, 8)));
        assert_eq!(c_float, 2);
        assert_eq!(dates[0].2, 0);
        assert_eq!(dates[1].2, 0);
    }

    #[test]
    fn test_backward_finish_to_start_lead() {
        let tasks = vec![task("a", Some(3)), task("b", Some(2))];
        let deps = vec![dep("a", "b", DependencyKind::FinishToStart, -1)];
        let dates = run_both(&tasks, &deps, d(2024, 5, 6));

        assert_eq!(dates[1].0.start, d(2024, 5, 7));
        assert_eq!(dates[0].1.start, d(2024, 5, 6));
        assert_eq!((dates[0].2, dates[1].2), (0, 0));
    }

    #[test]
    fn test_backward_start_to_start_keeps_project_finisher_critical() {
        // a(4) ends the project on Thu 2024-05-09; its only successor hangs off its start.
        let tasks = vec![task("a", Some(4)), task("m", Some(0))];
        let deps = vec![dep("a", "m", DependencyKind::StartToStart, 0)];
        let dates = run_both(&tasks, &deps, d(2024, 5, 6));

        let (a_early, a_late, a_float) = dates[0];
        assert_eq!(a_late, a_early);
        assert_eq!(a_float, 0);

        let (m_early, m_late, m_float) = dates[1];
        assert_eq!(m_early.start, d(2024, 5, 6));
        assert_eq!(m_late.start, d(2024, 5, 9));
        assert_eq!(m_float, 3);
    }

    #[test]
    fn test_backward_finish_to_finish_with_lead() {
        // b must finish one working day before a does.
        let tasks = vec![task("a", Some(5)), task("b", Some(2))];
        let deps = vec![dep("a", "b", DependencyKind::FinishToFinish, -1)];
        let dates = run_both(&tasks, &deps, d(2024, 5, 6));

        let (b_early, b_late, b_float) = dates[1];
        assert_eq!((b_early.start, b_early.finish), (d(2024, 5, 8), d(2024, 5, 9)));
        assert_eq!((b_late.start, b_late.finish), (d(2024, 5, 9), d(2024, 5, 10)));
        assert_eq!(b_float, 1);
        assert_eq!(dates[0].2, 0);
    }

    #[test]
    fn test_backward_start_to_finish() {
        // c(4) sets the project end on Thu 2024-05-09.
        let tasks = vec![
            Task {
                start_date: Some(d(2024, 5, 8)),
                ..task("a", Some(1))
            },
            task("b", Some(3)),
            task("c", Some(4)),
        ];
        let deps = vec![dep("a", "b", DependencyKind::StartToFinish, 0)];
        let dates = run_both(&tasks, &deps, d(2024, 5, 6));

        let (_, b_late, b_float) = dates[1];
        assert_eq!((b_late.start, b_late.finish), (d(2024, 5, 7), d(2024, 5, 9)));
        assert_eq!(b_float, 1);

        let (_, a_late, a_float) = dates[0];
        assert_eq!(a_late.start, d(2024, 5, 9));
        assert_eq!(a_float, 1);
        assert_eq!(dates[2].2, 0);
    }

    #[test]
    fn test_backward_weekend_actual_end_stays_critical() {
        // Actuals Mon 2024-05-06 .. Sat 2024-05-11.
        let tasks = vec![Task {
            actual_start: Some(d(2024, 5, 6)),
            actual_end: Some(d(2024, 5, 11)),
            ..task("a", Some(5))
        }];
        let dates = run_both(&tasks, &[], d(2024, 5, 6));

        let (early, late, float) = dates[0];
        assert_eq!(early.finish, d(2024, 5, 11));
        assert_eq!(late.start, d(2024, 5, 6));
        assert_eq!(float, 0);
    }

    #[test]
    fn test_generated_networks_have_a_critical_task() {
        const KINDS: [DependencyKind; 4] = [
            DependencyKind::FinishToStart,
            DependencyKind::StartToStart,
            DependencyKind::FinishToFinish,
            DependencyKind::StartToFinish,
        ];
        let cal = WorkCalendar::default();

        for seed in 0..500u64 {
            let mut rng = SmallRng::seed_from_u64(seed);
            let count = rng.gen_range(1..8usize);
            let tasks: Vec<Task> = (0..count)
                .map(|i| task(&format!("t{}", i), Some(rng.gen_range(0..5i64))))
                .collect();

            let mut deps = Vec::new();
            for succ in 1..count {
                for pred in 0..succ {
                    if rng.gen_bool(0.35) {
                        deps.push(dep(
                            &tasks[pred].id,
                            &tasks[succ].id,
                            KINDS[rng.gen_range(0..KINDS.len())],
                            rng.gen_range(-2..4i64),
                        ));
                    }
                }
            }

            let graph = DependencyGraph::build(&tasks, &deps).unwrap();
            let early = forward_pass(&cal, &tasks, &graph, Some(d(2024, 5, 6)), &[], 0);
            let project_end = early.iter().flatten().map(|s| s.finish).max().unwrap();
            let late = backward_pass(&cal, &tasks, &graph, &early, project_end);

            let mut critical = 0;
            for (e, l) in early.iter().zip(&late) {
                let (e, l) = (e.unwrap(), l.unwrap());
                assert!(l.finish <= project_end, "seed {}: {:?} past {}", seed, l, project_end);
                if total_float(&cal, e, l) == 0 {
                    critical += 1;
                }
            }
            assert!(critical > 0, "seed {}: no critical task in {:?}", seed, deps);
        }
    }
}
