//! Working calendar: conversions between calendar dates and working-day counts.
//!
//! A working day is a date whose weekday is in the working set and which is not
//! a holiday. Weekdays are numbered 0 = Monday .. 6 = Sunday.

use chrono::{Datelike, Days, NaiveDate};
use pyo3::prelude::*;
use rustc_hash::FxHashSet;

use crate::error::SchedulingError;

// Date walks saturate at NaiveDate::MIN / NaiveDate::MAX instead of looping.
fn next_day(d: NaiveDate) -> Option<NaiveDate> {
    d.checked_add_days(Days::new(1))
}

fn prev_day(d: NaiveDate) -> Option<NaiveDate> {
    d.checked_sub_days(Days::new(1))
}

/// Working weekdays, hours per day and holidays for one project context.
///
/// Immutable once built; an edit replaces the whole calendar.
#[pyclass]
#[derive(Clone, Debug, PartialEq)]
pub struct WorkCalendar {
    working_weekdays: [bool; 7],
    hours_per_day: f64,
    holidays: FxHashSet<NaiveDate>,
}

impl WorkCalendar {
    /// Build a calendar, failing fast on a configuration that cannot schedule.
    pub fn new(
        working_weekdays: impl IntoIterator<Item = u8>,
        hours_per_day: f64,
        holidays: impl IntoIterator<Item = NaiveDate>,
    ) -> Result<Self, SchedulingError> {
        let mut weekdays = [false; 7];
        for day in working_weekdays {
            if day > 6 {
                return Err(SchedulingError::Configuration(format!(
                    "weekday {} is outside 0..=6",
                    day
                )));
            }
            weekdays[day as usize] = true;
        }
        if !weekdays.iter().any(|&w| w) {
            return Err(SchedulingError::Configuration(
                "calendar has no working weekdays".to_string(),
            ));
        }
        if !hours_per_day.is_finite() || hours_per_day <= 0.0 {
            return Err(SchedulingError::Configuration(format!(
                "hours_per_day must be positive, got {}",
                hours_per_day
            )));
        }

        Ok(Self {
            working_weekdays: weekdays,
            hours_per_day,
            holidays: holidays.into_iter().collect(),
        })
    }

    /// All working days in `[start, end]`, in date order.
    pub fn working_days_in(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> impl Iterator<Item = NaiveDate> + '_ {
        start
            .iter_days()
            .take_while(move |d| *d <= end)
            .filter(move |d| self.is_working_day(*d))
    }
}

impl Default for WorkCalendar {
    fn default() -> Self {
        Self {
            working_weekdays: [true, true, true, true, true, false, false],
            hours_per_day: 8.0,
            holidays: FxHashSet::default(),
        }
    }
}

#[pymethods]
impl WorkCalendar {
    #[new]
    #[pyo3(signature = (working_weekdays=None, hours_per_day=8.0, holidays=None))]
    fn py_new(
        working_weekdays: Option<Vec<u8>>,
        hours_per_day: f64,
        holidays: Option<Vec<NaiveDate>>,
    ) -> PyResult<Self> {
        let weekdays = working_weekdays.unwrap_or_else(|| vec![0, 1, 2, 3, 4]);
        Ok(Self::new(
            weekdays,
            hours_per_day,
            holidays.unwrap_or_default(),
        )?)
    }

    /// Working weekday numbers in ascending order.
    #[getter]
    pub fn working_weekdays(&self) -> Vec<u8> {
        (0u8..7)
            .filter(|&d| self.working_weekdays[d as usize])
            .collect()
    }

    #[getter]
    pub fn hours_per_day(&self) -> f64 {
        self.hours_per_day
    }

    /// Holidays in ascending order.
    #[getter]
    pub fn holidays(&self) -> Vec<NaiveDate> {
        let mut days: Vec<NaiveDate> = self.holidays.iter().copied().collect();
        days.sort();
        days
    }

    pub fn is_working_day(&self, d: NaiveDate) -> bool {
        let weekday = d.weekday().num_days_from_monday() as usize;
        self.working_weekdays[weekday] && !self.holidays.contains(&d)
    }

    /// Smallest working day >= `d` (or > `d` when `include_today` is false).
    #[pyo3(signature = (d, include_today=true))]
    pub fn next_working_day(&self, d: NaiveDate, include_today: bool) -> NaiveDate {
        let mut current = if include_today {
            d
        } else {
            match next_day(d) {
                Some(next) => next,
                None => return d,
            }
        };
        while !self.is_working_day(current) {
            match next_day(current) {
                Some(next) => current = next,
                None => break,
            }
        }
        current
    }

    /// Largest working day <= `d` (or < `d` when `include_today` is false).
    #[pyo3(signature = (d, include_today=true))]
    pub fn previous_working_day(&self, d: NaiveDate, include_today: bool) -> NaiveDate {
        let mut current = if include_today {
            d
        } else {
            match prev_day(d) {
                Some(prev) => prev,
                None => return d,
            }
        };
        while !self.is_working_day(current) {
            match prev_day(current) {
                Some(prev) => current = prev,
                None => break,
            }
        }
        current
    }

    /// Convert a working-day count into a date.
    ///
    /// Forward counting includes the anchor (the first working day >= `start`)
    /// as day 1. Backward counting starts from the same anchor and excludes it.
    /// `n == 0` returns `start` untouched, even on a non-working day.
    /// Counts that run past the representable range stop at its end.
    pub fn add_working_days(&self, start: NaiveDate, n: i64) -> NaiveDate {
        if n == 0 {
            return start;
        }

        let (step, mut remaining): (fn(NaiveDate) -> Option<NaiveDate>, u64) = if n > 0 {
            (next_day, n.unsigned_abs() - 1)
        } else {
            (prev_day, n.unsigned_abs())
        };
        let mut current = self.next_working_day(start, true);
        while remaining > 0 {
            let Some(day) = step(current) else {
                break;
            };
            current = day;
            if self.is_working_day(current) {
                remaining -= 1;
            }
        }
        current
    }

    /// The working day `k` working days after (k > 0) or before (k < 0) the
    /// anchor of `d`. `k == 0` is the anchor itself.
    pub fn offset_working_days(&self, d: NaiveDate, k: i64) -> NaiveDate {
        match k {
            0 => self.next_working_day(d, true),
            k if k > 0 => self.add_working_days(d, k.saturating_add(1)),
            k => self.add_working_days(d, k),
        }
    }

    /// Inclusive count of working days in `[start, end]`; 0 when `end < start`.
    pub fn working_days_between(&self, start: NaiveDate, end: NaiveDate) -> i64 {
        if end < start {
            return 0;
        }
        self.working_days_in(start, end).count() as i64
    }

    pub fn working_hours_between(&self, start: NaiveDate, end: NaiveDate) -> f64 {
        self.working_days_between(start, end) as f64 * self.hours_per_day
    }

    fn __repr__(&self) -> String {
        format!(
            "WorkCalendar(working_weekdays={:?}, hours_per_day={}, holidays={})",
            self.working_weekdays(),
            self.hours_per_day,
            self.holidays.len()
        )
    }
}
