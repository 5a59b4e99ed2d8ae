//! Configuration types for schedule recalculation and resource leveling.

use chrono::NaiveDate;
use pyo3::prelude::*;

use crate::error::SchedulingError;

/// Configuration for CPM recalculation.
#[pyclass]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SchedulingConfig {
    /// Anchor for tasks that have neither a start date nor a scheduled predecessor
    #[pyo3(get, set)]
    pub project_start: Option<NaiveDate>,
    /// Verbosity level: 0=silent, 1=changes, 2=checks, 3=debug
    #[pyo3(get, set)]
    pub verbosity: u8,
}

#[pymethods]
impl SchedulingConfig {
    #[new]
    #[pyo3(signature = (project_start=None, verbosity=0))]
    fn new(project_start: Option<NaiveDate>, verbosity: u8) -> Self {
        Self {
            project_start,
            verbosity,
        }
    }

    fn __repr__(&self) -> String {
        format!(
            "SchedulingConfig(project_start={:?}, verbosity={})",
            self.project_start, self.verbosity
        )
    }
}

/// Configuration for conflict detection and auto-leveling.
#[pyclass]
#[derive(Clone, Debug, PartialEq)]
pub struct LevelingConfig {
    /// Daily allocation (percent) a resource may carry before it is over-allocated
    #[pyo3(get, set)]
    pub threshold_percent: f64,
    /// Upper bound on shifts performed by one auto-leveling run
    #[pyo3(get, set)]
    pub max_iterations: u32,
    /// Anchor passed to every recalculation the leveling run performs
    #[pyo3(get, set)]
    pub project_start: Option<NaiveDate>,
    /// Verbosity level: 0=silent, 1=changes, 2=checks, 3=debug
    #[pyo3(get, set)]
    pub verbosity: u8,
}

impl Default for LevelingConfig {
    fn default() -> Self {
        Self {
            threshold_percent: 100.0,
            max_iterations: 60,
            project_start: None,
            verbosity: 0,
        }
    }
}

impl LevelingConfig {
    pub(crate) fn validate(&self) -> Result<(), SchedulingError> {
        validate_threshold(self.threshold_percent)
    }

    /// Scheduling settings for the recalculations a leveling run triggers.
    pub fn scheduling_config(&self) -> SchedulingConfig {
        SchedulingConfig {
            project_start: self.project_start,
            verbosity: self.verbosity,
        }
    }
}

pub(crate) fn validate_threshold(threshold_percent: f64) -> Result<(), SchedulingError> {
    if !threshold_percent.is_finite() || threshold_percent <= 0.0 {
        return Err(SchedulingError::Configuration(format!(
            "threshold_percent must be greater than zero, got {}",
            threshold_percent
        )));
    }
    Ok(())
}

#[pymethods]
impl LevelingConfig {
    #[new]
    #[pyo3(signature = (threshold_percent=None, max_iterations=None, project_start=None, verbosity=None))]
    fn new(
        threshold_percent: Option<f64>,
        max_iterations: Option<u32>,
        project_start: Option<NaiveDate>,
        verbosity: Option<u8>,
    ) -> Self {
        let defaults = Self::default();
        Self {
            threshold_percent: threshold_percent.unwrap_or(defaults.threshold_percent),
            max_iterations: max_iterations.unwrap_or(defaults.max_iterations),
            project_start,
            verbosity: verbosity.unwrap_or(defaults.verbosity),
        }
    }

    fn __repr__(&self) -> String {
        format!(
            "LevelingConfig(threshold_percent={}, max_iterations={})",
            self.threshold_percent, self.max_iterations
        )
    }
}
