//! Cluster-wide process directory port.

use std::sync::Arc;

use async_trait::async_trait;
use cumulus_core::ProcessId;

use crate::error::PortsError;
use crate::process::ProcessEntry;

/// Lists and clears the processes a cluster knows about.
#[async_trait]
pub trait ProcessDirectory: Send + Sync {
    /// Every process entry.
    async fn get_all(&self) -> Result<Vec<Arc<dyn ProcessEntry>>, PortsError>;

    /// The entry for `id`, if any.
    async fn try_get(&self, id: ProcessId) -> Result<Option<Arc<dyn ProcessEntry>>, PortsError>;

    /// Remove the record of `id`. Clearing an unknown id is a no-op.
    async fn clear(&self, id: ProcessId) -> Result<(), PortsError>;

    /// Remove every record.
    async fn clear_all(&self) -> Result<(), PortsError>;
}
