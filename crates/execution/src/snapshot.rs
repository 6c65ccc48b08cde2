//! Point-in-time view of a process.

use std::time::Duration;

use chrono::{DateTime, Local, Utc};
use cumulus_core::ProcessId;
use serde::{Deserialize, Serialize};

use crate::info::ProcessInfo;
use crate::state::ProcessState;
use crate::status::ProcessStatus;

/// Immutable projection of a [`ProcessState`] into local wall-clock time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessSnapshot {
    /// Process identifier.
    pub id: ProcessId,
    /// Submission metadata.
    pub info: ProcessInfo,
    /// State the snapshot was derived from.
    pub state: ProcessState,
    /// When the process started, in local time.
    pub start_time: Option<DateTime<Local>>,
    /// Time spent executing as of the snapshot.
    #[serde(default, with = "crate::serde_duration_opt")]
    pub execution_time: Option<Duration>,
    /// When the process finished, in local time.
    pub completion_time: Option<DateTime<Local>>,
}

impl ProcessSnapshot {
    /// Project `state` as of `now`.
    #[must_use]
    pub fn project(info: ProcessInfo, state: ProcessState, now: DateTime<Utc>) -> Self {
        let timing = state.execution_time;
        Self {
            id: info.id,
            start_time: timing.start_time().map(|t| t.with_timezone(&Local)),
            execution_time: timing.elapsed(now),
            completion_time: timing.completion_time().map(|t| t.with_timezone(&Local)),
            info,
            state,
        }
    }

    /// Shorthand for `self.state.status`.
    #[must_use]
    pub fn status(&self) -> ProcessStatus {
        self.state.status
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::ExecutionTime;
    use pretty_assertions::assert_eq;

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000 + secs, 0).unwrap()
    }

    fn info() -> ProcessInfo {
        ProcessInfo::new(ProcessId::v4(), "\"u64\"", "u64")
    }

    #[test]
    fn not_started_has_no_times() {
        let snap = ProcessSnapshot::project(info(), ProcessState::new(), at(10));
        assert_eq!(snap.start_time, None);
        assert_eq!(snap.execution_time, None);
        assert_eq!(snap.completion_time, None);
        assert_eq!(snap.status(), ProcessStatus::Created);
    }

    #[test]
    fn running_reports_elapsed_time() {
        let state = ProcessState {
            status: ProcessStatus::Running,
            execution_time: ExecutionTime::Started { start_time: at(0) },
            ..ProcessState::new()
        };
        let snap = ProcessSnapshot::project(info(), state, at(7));
        assert_eq!(snap.start_time, Some(at(0).with_timezone(&Local)));
        assert_eq!(snap.execution_time, Some(Duration::from_secs(7)));
        assert_eq!(snap.completion_time, None);
    }

    #[test]
    fn finished_reports_completion_time() {
        let state = ProcessState {
            status: ProcessStatus::Completed,
            execution_time: ExecutionTime::Finished {
                start_time: at(0),
                execution_time: Duration::from_secs(3),
            },
            ..ProcessState::new()
        };
        let snap = ProcessSnapshot::project(info(), state, at(100));
        assert_eq!(snap.execution_time, Some(Duration::from_secs(3)));
        assert_eq!(snap.completion_time, Some(at(3).with_timezone(&Local)));
    }

    #[test]
    fn id_matches_info() {
        let info = info();
        let id = info.id;
        let snap = ProcessSnapshot::project(info, ProcessState::new(), at(0));
        assert_eq!(snap.id, id);
    }
}
