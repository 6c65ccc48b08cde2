//! Caller-driven in-memory process.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use cumulus_core::{LogEntry, LogLevel, ProcessId};
use cumulus_execution::{ExecutionError, ProcessInfo, ProcessState, ProcessStatus};
use cumulus_ports::{PortsError, ProcessEntry, ProcessResult};
use parking_lot::Mutex;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::logs::InMemoryLogs;

/// A process whose lifecycle is driven by explicit method calls.
pub struct InMemoryProcess {
    info: ProcessInfo,
    state: Mutex<ProcessState>,
    /// When set, `get_state` reports this instead of the live state.
    observed_override: Mutex<Option<ProcessState>>,
    result: watch::Sender<Option<ProcessResult>>,
    cancellation: CancellationToken,
    logs: Arc<InMemoryLogs>,
    state_reads: AtomicUsize,
}

impl InMemoryProcess {
    pub(crate) fn new(info: ProcessInfo, logs: Arc<InMemoryLogs>) -> Self {
        let (result, _) = watch::channel(None);
        Self {
            info,
            state: Mutex::new(ProcessState::new()),
            observed_override: Mutex::new(None),
            result,
            cancellation: CancellationToken::new(),
            logs,
            state_reads: AtomicUsize::new(0),
        }
    }

    /// The live state.
    pub fn state(&self) -> ProcessState {
        self.state.lock().clone()
    }

    /// Move to `Running`.
    pub fn start(&self) -> Result<(), ExecutionError> {
        self.state
            .lock()
            .transition_status(ProcessStatus::Running, Utc::now())
    }

    /// Schedule `count` work items.
    pub fn schedule(&self, count: u64) {
        self.state.lock().schedule_work_items(count);
    }

    /// Start one scheduled work item.
    pub fn start_work_item(&self) -> Result<(), ExecutionError> {
        self.state.lock().start_work_item()
    }

    /// Complete one active work item.
    pub fn complete_work_item(&self) -> Result<(), ExecutionError> {
        self.state.lock().complete_work_item()
    }

    /// Fault one active work item.
    pub fn fault_work_item(&self) -> Result<(), ExecutionError> {
        self.state.lock().fault_work_item()
    }

    /// Finish with a value.
    pub fn complete(&self, value: serde_json::Value) -> Result<(), ExecutionError> {
        self.finish(ProcessStatus::Completed, ProcessResult::Completed(value))
    }

    /// Finish with a user-code error.
    pub fn fail(&self, message: impl Into<String>) -> Result<(), ExecutionError> {
        self.finish(
            ProcessStatus::UserException,
            ProcessResult::UserException(message.into()),
        )
    }

    /// Finish with a runtime fault.
    pub fn fault(&self, message: impl Into<String>) -> Result<(), ExecutionError> {
        self.finish(ProcessStatus::Faulted, ProcessResult::Faulted(message.into()))
    }

    /// Finish as canceled, as a worker does after observing the token.
    pub fn acknowledge_cancellation(&self) -> Result<(), ExecutionError> {
        self.finish(ProcessStatus::Canceled, ProcessResult::Canceled)
    }

    fn finish(&self, status: ProcessStatus, result: ProcessResult) -> Result<(), ExecutionError> {
        self.state.lock().transition_status(status, Utc::now())?;
        self.result.send_replace(Some(result));
        Ok(())
    }

    /// Report `state` from `get_state` regardless of the live state, as a
    /// lagging replica would. `None` restores live reporting.
    pub fn set_observed_state(&self, state: Option<ProcessState>) {
        *self.observed_override.lock() = state;
    }

    /// Append a log line for this process.
    pub fn log(&self, level: LogLevel, message: impl Into<String>) {
        self.logs.append(LogEntry::new(self.info.id, level, message));
    }

    /// The token a simulated worker watches.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation.clone()
    }

    /// Whether cancellation has been requested.
    pub fn is_cancellation_requested(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    /// Number of `get_state` calls served.
    pub fn state_reads(&self) -> usize {
        self.state_reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProcessEntry for InMemoryProcess {
    fn id(&self) -> ProcessId {
        self.info.id
    }

    fn info(&self) -> &ProcessInfo {
        &self.info
    }

    async fn get_state(&self) -> Result<ProcessState, PortsError> {
        self.state_reads.fetch_add(1, Ordering::SeqCst);
        if let Some(observed) = self.observed_override.lock().clone() {
            return Ok(observed);
        }
        Ok(self.state())
    }

    async fn await_result(&self) -> Result<ProcessResult, PortsError> {
        let mut rx = self.result.subscribe();
        let result = rx
            .wait_for(Option::is_some)
            .await
            .map_err(|_| PortsError::Internal("process result channel closed".into()))?;
        result
            .clone()
            .ok_or_else(|| PortsError::Internal("process result missing".into()))
    }

    async fn try_get_result(&self) -> Result<Option<ProcessResult>, PortsError> {
        Ok(self.result.borrow().clone())
    }

    fn cancel(&self) {
        self.cancellation.cancel();
    }
}
