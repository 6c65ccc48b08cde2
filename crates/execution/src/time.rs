//! Execution timing of a process.

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

/// Where a process is on its timeline.
///
/// Progresses `NotStarted → Started → Finished` and never goes back; the
/// start time is fixed the first time it is observed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExecutionTime {
    /// No work item has started yet.
    #[default]
    NotStarted,
    /// Running since `start_time`.
    Started {
        /// When the first work item started.
        start_time: DateTime<Utc>,
    },
    /// Finished after running for `execution_time`.
    Finished {
        /// When the first work item started.
        start_time: DateTime<Utc>,
        /// Wall-clock time between start and completion.
        #[serde(with = "crate::serde_duration")]
        execution_time: Duration,
    },
}

impl ExecutionTime {
    /// Start time, if the process has started.
    #[must_use]
    pub fn start_time(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::NotStarted => None,
            Self::Started { start_time } | Self::Finished { start_time, .. } => Some(*start_time),
        }
    }

    /// Completion time, if the process has finished.
    #[must_use]
    pub fn completion_time(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Finished {
                start_time,
                execution_time,
            } => TimeDelta::from_std(*execution_time)
                .ok()
                .and_then(|delta| start_time.checked_add_signed(delta)),
            _ => None,
        }
    }

    /// Time spent executing as of `now`: running time so far for a started
    /// process, the recorded duration for a finished one.
    #[must_use]
    pub fn elapsed(&self, now: DateTime<Utc>) -> Option<Duration> {
        match self {
            Self::NotStarted => None,
            Self::Started { start_time } => Some((now - *start_time).to_std().unwrap_or_default()),
            Self::Finished { execution_time, .. } => Some(*execution_time),
        }
    }

    /// Returns `true` once the process has finished.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Finished { .. })
    }

    /// `Started` at `now`. A no-op if already started or finished.
    #[must_use]
    pub fn start(self, now: DateTime<Utc>) -> Self {
        match self {
            Self::NotStarted => Self::Started { start_time: now },
            other => other,
        }
    }

    /// `Finished` at `now`. A process that never started finishes with a zero
    /// duration starting at `now`.
    #[must_use]
    pub fn finish(self, now: DateTime<Utc>) -> Self {
        match self {
            Self::NotStarted => Self::Finished {
                start_time: now,
                execution_time: Duration::ZERO,
            },
            Self::Started { start_time } => Self::Finished {
                start_time,
                execution_time: (now - start_time).to_std().unwrap_or_default(),
            },
            finished @ Self::Finished { .. } => finished,
        }
    }

    /// Merge a newer observation into `self` without ever moving backwards.
    ///
    /// An observation that regresses (e.g. read from a lagging replica) is
    /// ignored. An observation that advances keeps the start time already
    /// known to `self`.
    #[must_use]
    pub fn advance(self, observed: Self) -> Self {
        if observed.rank() < self.rank() {
            return self;
        }
        match (self.start_time(), observed) {
            (Some(start_time), Self::Started { .. }) => Self::Started { start_time },
            (Some(start_time), Self::Finished { execution_time, .. }) => Self::Finished {
                start_time,
                execution_time,
            },
            _ => observed,
        }
    }

    pub(crate) fn rank(&self) -> u8 {
        match self {
            Self::NotStarted => 0,
            Self::Started { .. } => 1,
            Self::Finished { .. } => 2,
        }
    }
}
