//! Remote process entry port.

use async_trait::async_trait;
use cumulus_core::ProcessId;
use cumulus_execution::{ProcessInfo, ProcessState};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::PortsError;

/// The untyped outcome of a terminal process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "value", rename_all = "snake_case")]
pub enum ProcessResult {
    /// Completed with a value.
    Completed(Value),
    /// User code raised an error.
    UserException(String),
    /// The runtime failed to execute the process.
    Faulted(String),
    /// The process was canceled.
    Canceled,
}

/// Opaque reference to one process held by the cluster.
#[async_trait]
pub trait ProcessEntry: Send + Sync {
    /// Process identifier.
    fn id(&self) -> ProcessId;

    /// Immutable submission metadata.
    fn info(&self) -> &ProcessInfo;

    /// Fetch the current state.
    async fn get_state(&self) -> Result<ProcessState, PortsError>;

    /// Suspend until the process is terminal and return its outcome.
    async fn await_result(&self) -> Result<ProcessResult, PortsError>;

    /// Outcome if the process is terminal, `None` otherwise.
    async fn try_get_result(&self) -> Result<Option<ProcessResult>, PortsError>;

    /// Signal the process cancellation token. Does not wait for the
    /// process to observe it.
    fn cancel(&self);
}
