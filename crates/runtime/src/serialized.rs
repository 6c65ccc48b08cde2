//! Serialized form of a process handle and its rehydration.

use std::sync::Arc;

use cumulus_core::{ProcessId, RuntimeId};
use cumulus_execution::ProcessInfo;
use cumulus_ports::{ProcessEntry, RuntimeManager};
use serde::{Deserialize, Serialize};

use crate::config::HandleConfig;
use crate::error::{RuntimeError, directory_target};
use crate::factory::HandleFactory;
use crate::handle::{AnyProcessHandle, ProcessHandle};
use crate::registry::ManagerRegistry;

/// What survives when a [`ProcessHandle`] crosses a node boundary: the
/// runtime id, the process id and the submission metadata.
///
/// Locks, the status cache, the manager reference and the log feed are not
/// serialized. [`rehydrate`](Self::rehydrate) rebuilds them on the
/// receiving node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializedProcessHandle {
    /// Runtime the handle was created against.
    pub runtime_id: RuntimeId,
    /// Process the handle refers to.
    pub process_id: ProcessId,
    /// Submission metadata.
    pub info: ProcessInfo,
}

impl SerializedProcessHandle {
    /// Rebuild a typed handle.
    ///
    /// Resolves the runtime through `registry` and fails with
    /// [`RuntimeError::NotRegistered`] if it is unknown here; the process
    /// must still be known to that runtime. The new handle has a fresh
    /// status cache and no log feed until one is requested.
    pub async fn rehydrate<T>(
        self,
        registry: &ManagerRegistry,
        config: &HandleConfig,
    ) -> Result<ProcessHandle<T>, RuntimeError> {
        let (manager, entry) = self.bind(registry).await?;
        Ok(ProcessHandle::new(entry, manager, config))
    }

    /// Rebuild an untyped handle, choosing the result type from the
    /// process's pickled return type.
    pub async fn rehydrate_any(
        self,
        registry: &ManagerRegistry,
        factory: &HandleFactory,
    ) -> Result<Arc<dyn AnyProcessHandle>, RuntimeError> {
        let (manager, entry) = self.bind(registry).await?;
        factory.materialize(&manager, entry).await
    }

    async fn bind(
        &self,
        registry: &ManagerRegistry,
    ) -> Result<(Arc<dyn RuntimeManager>, Arc<dyn ProcessEntry>), RuntimeError> {
        let manager = registry.resolve(self.runtime_id)?;
        let entry = manager
            .process_directory()
            .try_get(self.process_id)
            .await
            .map_err(|source| RuntimeError::transport(directory_target(self.runtime_id), source))?
            .ok_or(RuntimeError::ProcessNotFound {
                process_id: self.process_id,
            })?;
        tracing::debug!(
            process_id = %self.process_id,
            runtime_id = %self.runtime_id,
            "rehydrated process handle"
        );
        Ok((manager, entry))
    }
}
