//! Process log port.

use async_trait::async_trait;
use cumulus_core::{LogEntry, ProcessId};
use futures::stream::BoxStream;

use crate::error::PortsError;

/// Live feed of log entries in the backend's append order.
pub type LogStream = BoxStream<'static, LogEntry>;

/// Retrieves the logs processes write on worker nodes.
#[async_trait]
pub trait LogManager: Send + Sync {
    /// Open a live feed of new entries for `process_id`.
    async fn log_poller(&self, process_id: ProcessId) -> Result<LogStream, PortsError>;

    /// Every entry recorded so far for `process_id`.
    async fn all_logs(&self, process_id: ProcessId) -> Result<Vec<LogEntry>, PortsError>;
}
