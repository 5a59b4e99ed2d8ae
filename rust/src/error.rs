//! Error type shared by the calendar, the CPM scheduler and the leveling engine.

use thiserror::Error;

/// Errors that can occur while building or recalculating a schedule.
///
/// Every variant is raised before any partial result is produced.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchedulingError {
    #[error("Invalid configuration: {0}")]
    Configuration(String),
    #[error("Circular dependency detected: {predecessor} -> {successor}")]
    Cycle {
        predecessor: String,
        successor: String,
    },
    #[error("Unknown {kind} referenced: {id}")]
    DanglingReference { kind: &'static str, id: String },
    #[error("Task cannot be scheduled: {0}")]
    UnschedulableTask(String),
    #[error("Invalid shift for task {task_id}: {reason}")]
    InvalidShift { task_id: String, reason: String },
}

impl SchedulingError {
    pub(crate) fn unknown_task(id: &str) -> Self {
        Self::DanglingReference {
            kind: "task",
            id: id.to_string(),
        }
    }

    pub(crate) fn unknown_resource(id: &str) -> Self {
        Self::DanglingReference {
            kind: "resource",
            id: id.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_message_names_edge() {
        let err = SchedulingError::Cycle {
            predecessor: "a".to_string(),
            successor: "b".to_string(),
        };
        assert_eq!(err.to_string(), "Circular dependency detected: a -> b");
    }

    #[test]
    fn test_dangling_reference_message() {
        assert_eq!(
            SchedulingError::unknown_resource("r9").to_string(),
            "Unknown resource referenced: r9"
        );
    }
}
