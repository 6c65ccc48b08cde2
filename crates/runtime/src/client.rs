//! Runtime client: the entry point bound to one runtime manager.

use std::sync::Arc;

use cumulus_core::{ProcessId, RuntimeId};
use cumulus_execution::ProcessSnapshot;
use cumulus_ports::{ProcessEntry, RuntimeManager};
use futures::{StreamExt, TryStreamExt, stream};
use serde::de::DeserializeOwned;

use crate::config::ClientConfig;
use crate::error::{RuntimeError, directory_target};
use crate::factory::HandleFactory;
use crate::handle::{AnyProcessHandle, ProcessHandle};
use crate::registry::ManagerRegistry;
use crate::report::format_report;
use crate::serialized::SerializedProcessHandle;

/// Client bound to one runtime manager.
///
/// Creating a client registers its manager in the [`ManagerRegistry`] so
/// handles serialized elsewhere can be rehydrated here; dropping it
/// unregisters the manager again.
pub struct RuntimeClient {
    manager: Arc<dyn RuntimeManager>,
    registry: Arc<ManagerRegistry>,
    factory: HandleFactory,
    config: ClientConfig,
}

impl RuntimeClient {
    /// Bind to `manager` and register it in `registry`.
    pub fn new(
        manager: Arc<dyn RuntimeManager>,
        registry: Arc<ManagerRegistry>,
        config: ClientConfig,
    ) -> Self {
        registry.register(Arc::clone(&manager));
        let factory = HandleFactory::new(config.handle.clone());
        Self {
            manager,
            registry,
            factory,
            config,
        }
    }

    /// Bind to `manager` using the process-wide registry and default config.
    pub fn with_global_registry(manager: Arc<dyn RuntimeManager>) -> Self {
        Self::new(manager, ManagerRegistry::global(), ClientConfig::default())
    }

    /// Id of the bound runtime.
    pub fn id(&self) -> RuntimeId {
        self.manager.id()
    }

    /// The bound manager.
    pub fn manager(&self) -> &Arc<dyn RuntimeManager> {
        &self.manager
    }

    /// The registry this client registered in.
    pub fn registry(&self) -> &Arc<ManagerRegistry> {
        &self.registry
    }

    /// The handle factory, e.g. to register user result types.
    pub fn factory(&self) -> &HandleFactory {
        &self.factory
    }

    /// Client settings.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// A handle for every process in the runtime.
    ///
    /// Entries are materialized concurrently, at most
    /// [`max_parallelism`](ClientConfig::max_parallelism) at a time; the
    /// result keeps the directory's order.
    pub async fn list_all(&self) -> Result<Vec<Arc<dyn AnyProcessHandle>>, RuntimeError> {
        let entries = self
            .manager
            .process_directory()
            .get_all()
            .await
            .map_err(|source| RuntimeError::transport(directory_target(self.id()), source))?;
        stream::iter(entries)
            .map(|entry| self.factory.materialize(&self.manager, entry))
            .buffered(self.config.max_parallelism.get())
            .try_collect()
            .await
    }

    /// An untyped handle for `id`, if the runtime knows it.
    pub async fn get_by_id(
        &self,
        id: ProcessId,
    ) -> Result<Option<Arc<dyn AnyProcessHandle>>, RuntimeError> {
        match self.entry(id).await? {
            Some(entry) => Ok(Some(self.factory.materialize(&self.manager, entry).await?)),
            None => Ok(None),
        }
    }

    /// A handle for `id` typed by the caller.
    ///
    /// Fails with [`RuntimeError::ProcessNotFound`] if the runtime does not
    /// know the process. The declared type is not checked against the
    /// recorded one until a result is decoded.
    pub async fn get_process<T: DeserializeOwned + 'static>(
        &self,
        id: ProcessId,
    ) -> Result<ProcessHandle<T>, RuntimeError> {
        let entry = self
            .entry(id)
            .await?
            .ok_or(RuntimeError::ProcessNotFound { process_id: id })?;
        Ok(ProcessHandle::new(
            entry,
            Arc::clone(&self.manager),
            &self.config.handle,
        ))
    }

    /// Rebuild a serialized handle against this client's registry.
    pub async fn rehydrate<T: DeserializeOwned + 'static>(
        &self,
        serialized: SerializedProcessHandle,
    ) -> Result<ProcessHandle<T>, RuntimeError> {
        serialized
            .rehydrate(&self.registry, &self.config.handle)
            .await
    }

    /// Remove the record of process `id`.
    pub async fn clear(&self, id: ProcessId) -> Result<(), RuntimeError> {
        self.manager
            .process_directory()
            .clear(id)
            .await
            .map_err(|source| RuntimeError::transport(directory_target(self.id()), source))?;
        tracing::debug!(process_id = %id, runtime_id = %self.id(), "cleared process");
        Ok(())
    }

    /// Remove every process record.
    pub async fn clear_all(&self) -> Result<(), RuntimeError> {
        self.manager
            .process_directory()
            .clear_all()
            .await
            .map_err(|source| RuntimeError::transport(directory_target(self.id()), source))?;
        tracing::debug!(runtime_id = %self.id(), "cleared all processes");
        Ok(())
    }

    /// Snapshots of every process, in directory order.
    pub async fn snapshots(&self) -> Result<Vec<ProcessSnapshot>, RuntimeError> {
        let handles = self.list_all().await?;
        stream::iter(handles)
            .map(|handle| async move { handle.snapshot().await })
            .buffered(self.config.max_parallelism.get())
            .try_collect()
            .await
    }

    /// Render a table of every process, oldest start first.
    pub async fn format_report(&self) -> Result<String, RuntimeError> {
        Ok(format_report(&self.snapshots().await?))
    }

    async fn entry(&self, id: ProcessId) -> Result<Option<Arc<dyn ProcessEntry>>, RuntimeError> {
        self.manager
            .process_directory()
            .try_get(id)
            .await
            .map_err(|source| RuntimeError::transport(directory_target(self.id()), source))
    }
}

impl Drop for RuntimeClient {
    fn drop(&mut self) {
        self.registry.unregister_exact(&self.manager);
    }
}

impl std::fmt::Debug for RuntimeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuntimeClient")
            .field("runtime_id", &self.id())
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cumulus_runtime_memory::InMemoryRuntime;
    use pretty_assertions::assert_eq;

    fn client() -> (Arc<InMemoryRuntime>, RuntimeClient) {
        let runtime = Arc::new(InMemoryRuntime::new());
        let client = RuntimeClient::new(
            Arc::clone(&runtime) as Arc<dyn RuntimeManager>,
            Arc::new(ManagerRegistry::new()),
            ClientConfig::default(),
        );
        (runtime, client)
    }

    #[test]
    fn construction_registers_and_drop_unregisters() {
        let registry = Arc::new(ManagerRegistry::new());
        let runtime: Arc<dyn RuntimeManager> = Arc::new(InMemoryRuntime::new());
        let id = runtime.id();
        let client = RuntimeClient::new(runtime, Arc::clone(&registry), ClientConfig::default());
        assert!(registry.contains(id));
        drop(client);
        assert!(!registry.contains(id));
    }

    #[tokio::test]
    async fn list_all_materializes_every_entry() {
        let (runtime, client) = client();
        runtime.submit::<u64>(Some("a"));
        runtime.submit::<String>(Some("b"));
        runtime.submit::<bool>(Some("c"));

        let handles = client.list_all().await.unwrap();
        assert_eq!(handles.len(), 3);
        let mut names: Vec<_> = handles
            .iter()
            .filter_map(|h| h.info().name.clone())
            .collect();
        names.sort();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn get_by_id_and_missing() {
        let (runtime, client) = client();
        let process = runtime.submit::<u64>(None);
        let found = client.get_by_id(process.info().id).await.unwrap().unwrap();
        assert_eq!(found.id(), process.info().id);
        assert!(client.get_by_id(ProcessId::v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn get_process_unknown_is_not_found() {
        let (_runtime, client) = client();
        let err = client.get_process::<u64>(ProcessId::v4()).await.unwrap_err();
        assert!(matches!(err, RuntimeError::ProcessNotFound { .. }));
    }

    #[tokio::test]
    async fn clear_and_clear_all() {
        let (runtime, client) = client();
        let a = runtime.submit::<u64>(None);
        runtime.submit::<u64>(None);
        client.clear(a.info().id).await.unwrap();
        assert_eq!(client.list_all().await.unwrap().len(), 1);
        client.clear_all().await.unwrap();
        assert!(client.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn report_lists_every_process() {
        let (runtime, client) = client();
        runtime.submit::<u64>(Some("first")).start().unwrap();
        runtime.submit::<u64>(Some("second"));
        let report = client.format_report().await.unwrap();
        assert_eq!(report.lines().count(), 3);
        assert!(report.contains("first"));
        assert!(report.contains("second"));
    }
}
