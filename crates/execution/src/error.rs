//! Execution error types.

use thiserror::Error;

use crate::status::ProcessStatus;

/// Errors raised while mutating a [`ProcessState`](crate::ProcessState).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExecutionError {
    /// A status transition is not valid for the current status.
    #[error("invalid transition from {from} to {to}")]
    InvalidTransition {
        /// Current status.
        from: String,
        /// Attempted target status.
        to: String,
    },

    /// Work-item counters would break `active + completed <= total`.
    #[error("inconsistent work items: {active} active + {completed} completed > {total} total")]
    InconsistentCounts {
        /// Active work items.
        active: u64,
        /// Completed work items.
        completed: u64,
        /// Total work items.
        total: u64,
    },
}

impl ExecutionError {
    /// Create an invalid-transition error from process statuses.
    pub fn invalid_transition(from: ProcessStatus, to: ProcessStatus) -> Self {
        Self::InvalidTransition {
            from: from.to_string(),
            to: to.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_transition_display() {
        let err = ExecutionError::invalid_transition(ProcessStatus::Completed, ProcessStatus::Running);
        assert_eq!(
            err.to_string(),
            "invalid transition from completed to running"
        );
    }

    #[test]
    fn inconsistent_counts_display() {
        let err = ExecutionError::InconsistentCounts {
            active: 2,
            completed: 3,
            total: 4,
        };
        assert_eq!(
            err.to_string(),
            "inconsistent work items: 2 active + 3 completed > 4 total"
        );
    }
}
