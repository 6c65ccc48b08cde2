//! Process state: status, timing and work-item counters.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ExecutionError;
use crate::status::ProcessStatus;
use crate::time::ExecutionTime;
use crate::transition::validate_transition;

/// The mutable state of a remote process as reported by its entry.
///
/// Invariant: `active_work_items + completed_work_items <= total_work_items`
/// for every state produced by the mutators below.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessState {
    /// Current lifecycle status.
    pub status: ProcessStatus,
    /// Timing information.
    pub execution_time: ExecutionTime,
    /// Work items currently executing.
    pub active_work_items: u64,
    /// Work items that finished successfully.
    pub completed_work_items: u64,
    /// Work items that faulted.
    pub faulted_work_items: u64,
    /// Work items scheduled so far.
    pub total_work_items: u64,
}

impl ProcessState {
    /// A freshly created process with no scheduled work.
    #[must_use]
    pub fn new() -> Self {
        Self {
            status: ProcessStatus::Created,
            execution_time: ExecutionTime::NotStarted,
            active_work_items: 0,
            completed_work_items: 0,
            faulted_work_items: 0,
            total_work_items: 0,
        }
    }

    /// Returns `true` if the counters satisfy `active + completed <= total`.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.active_work_items
            .checked_add(self.completed_work_items)
            .is_some_and(|sum| sum <= self.total_work_items)
    }

    /// Fails with [`ExecutionError::InconsistentCounts`] if the counters are off.
    pub fn check_counts(&self) -> Result<(), ExecutionError> {
        if self.is_consistent() {
            Ok(())
        } else {
            Err(ExecutionError::InconsistentCounts {
                active: self.active_work_items,
                completed: self.completed_work_items,
                total: self.total_work_items,
            })
        }
    }

    /// Transition the status, updating the execution time accordingly.
    pub fn transition_status(
        &mut self,
        new_status: ProcessStatus,
        now: DateTime<Utc>,
    ) -> Result<(), ExecutionError> {
        validate_transition(self.status, new_status)?;
        self.status = new_status;
        if new_status == ProcessStatus::Running {
            self.execution_time = self.execution_time.start(now);
        }
        if new_status.is_terminal() {
            self.execution_time = self.execution_time.finish(now);
            self.active_work_items = 0;
        }
        Ok(())
    }

    /// Add `count` work items to the schedule.
    pub fn schedule_work_items(&mut self, count: u64) {
        self.total_work_items = self.total_work_items.saturating_add(count);
    }

    /// Mark one scheduled work item as executing.
    pub fn start_work_item(&mut self) -> Result<(), ExecutionError> {
        let next = Self {
            active_work_items: self.active_work_items + 1,
            ..self.clone()
        };
        next.check_counts()?;
        *self = next;
        Ok(())
    }

    /// Mark one executing work item as completed.
    pub fn complete_work_item(&mut self) -> Result<(), ExecutionError> {
        self.finish_work_item(true)
    }

    /// Mark one executing work item as faulted.
    pub fn fault_work_item(&mut self) -> Result<(), ExecutionError> {
        self.finish_work_item(false)
    }

    fn finish_work_item(&mut self, success: bool) -> Result<(), ExecutionError> {
        if self.active_work_items == 0 {
            return Err(ExecutionError::InconsistentCounts {
                active: 0,
                completed: self.completed_work_items,
                total: self.total_work_items,
            });
        }
        self.active_work_items -= 1;
        if success {
            self.completed_work_items += 1;
        } else {
            self.faulted_work_items += 1;
        }
        Ok(())
    }

    /// Fold a newly observed state into the last known one.
    ///
    /// Status and execution time never move backwards: an observation that
    /// regresses either of them is stale and the previous state is kept
    /// whole, so counters always belong to the status they are shown with.
    /// An observation that advances is taken as-is except for the start
    /// time, which stays pinned to the first one seen.
    #[must_use]
    pub fn reconcile(previous: Option<&Self>, observed: Self) -> Self {
        let Some(previous) = previous else {
            return observed;
        };
        let status_regressed = observed.status.rank() < previous.status.rank()
            || (previous.status.is_terminal() && observed.status != previous.status);
        let time_regressed = observed.execution_time.rank() < previous.execution_time.rank();
        if status_regressed || time_regressed {
            return previous.clone();
        }
        Self {
            execution_time: previous.execution_time.advance(observed.execution_time),
            ..observed
        }
    }
}

impl Default for ProcessState {
    fn default() -> Self {
        Self::new()
    }
}
