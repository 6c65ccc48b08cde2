//! Process-level status tracking.

use serde::{Deserialize, Serialize};

/// The overall status of a remote process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessStatus {
    /// Submitted but no work item has started.
    Created,
    /// At least one work item is executing.
    Running,
    /// Finished and produced a result.
    Completed,
    /// The runtime failed while executing the process.
    Faulted,
    /// User code raised an error.
    UserException,
    /// Cancellation was observed and the process stopped.
    Canceled,
}

impl ProcessStatus {
    /// Returns `true` once the process can no longer change status.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Completed | Self::Faulted | Self::UserException | Self::Canceled
        )
    }

    /// Returns `true` if the process completed with a result.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Completed)
    }

    /// Returns `true` if the process ended in an error state.
    #[must_use]
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Faulted | Self::UserException)
    }

    /// Position in the lifecycle: created, running, terminal.
    pub(crate) fn rank(self) -> u8 {
        match self {
            Self::Created => 0,
            Self::Running => 1,
            _ => 2,
        }
    }
}

impl std::fmt::Display for ProcessStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Created => write!(f, "created"),
            Self::Running => write!(f, "running"),
            Self::Completed => write!(f, "completed"),
            Self::Faulted => write!(f, "faulted"),
            Self::UserException => write!(f, "user_exception"),
            Self::Canceled => write!(f, "canceled"),
        }
    }
}
