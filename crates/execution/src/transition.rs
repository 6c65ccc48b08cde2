//! Status transition validation.

use crate::error::ExecutionError;
use crate::status::ProcessStatus;

/// Returns `true` if the process-level transition from `from` to `to` is valid.
#[must_use]
pub fn can_transition(from: ProcessStatus, to: ProcessStatus) -> bool {
    matches!(
        (from, to),
        (ProcessStatus::Created, ProcessStatus::Running)
            | (ProcessStatus::Created, ProcessStatus::Faulted)
            | (ProcessStatus::Created, ProcessStatus::Canceled)
            | (ProcessStatus::Running, ProcessStatus::Completed)
            | (ProcessStatus::Running, ProcessStatus::Faulted)
            | (ProcessStatus::Running, ProcessStatus::UserException)
            | (ProcessStatus::Running, ProcessStatus::Canceled)
    )
}

/// Validate a process-level transition, returning an error if invalid.
pub fn validate_transition(from: ProcessStatus, to: ProcessStatus) -> Result<(), ExecutionError> {
    if can_transition(from, to) {
        Ok(())
    } else {
        Err(ExecutionError::invalid_transition(from, to))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_transitions() {
        assert!(can_transition(ProcessStatus::Created, ProcessStatus::Running));
        assert!(can_transition(ProcessStatus::Created, ProcessStatus::Canceled));
        assert!(can_transition(ProcessStatus::Running, ProcessStatus::Completed));
        assert!(can_transition(ProcessStatus::Running, ProcessStatus::UserException));
    }

    #[test]
    fn terminal_states_have_no_exits() {
        let all = [
            ProcessStatus::Created,
            ProcessStatus::Running,
            ProcessStatus::Completed,
            ProcessStatus::Faulted,
            ProcessStatus::UserException,
            ProcessStatus::Canceled,
        ];
        for from in all.iter().filter(|s| s.is_terminal()) {
            for to in &all {
                assert!(!can_transition(*from, *to), "{from} -> {to} must be rejected");
            }
        }
    }

    #[test]
    fn backwards_transition_rejected() {
        let err = validate_transition(ProcessStatus::Running, ProcessStatus::Created).unwrap_err();
        assert!(err.to_string().contains("invalid transition"));
    }

    #[test]
    fn completing_without_running_rejected() {
        assert!(validate_transition(ProcessStatus::Created, ProcessStatus::Completed).is_err());
    }
}
