//! In-memory process directory.

use std::sync::Arc;

use async_trait::async_trait;
use cumulus_core::ProcessId;
use cumulus_ports::{PortsError, ProcessDirectory, ProcessEntry};
use dashmap::DashMap;

use crate::process::InMemoryProcess;

/// Process directory backed by a `DashMap`.
#[derive(Default)]
pub struct InMemoryDirectory {
    processes: DashMap<ProcessId, Arc<InMemoryProcess>>,
}

impl InMemoryDirectory {
    /// Empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&self, process: Arc<InMemoryProcess>) {
        self.processes.insert(process.info().id, process);
    }

    /// Concrete process by id.
    pub fn get(&self, id: ProcessId) -> Option<Arc<InMemoryProcess>> {
        self.processes.get(&id).map(|entry| Arc::clone(entry.value()))
    }

    /// Number of processes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.processes.len()
    }

    /// Whether the directory is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.processes.is_empty()
    }
}

#[async_trait]
impl ProcessDirectory for InMemoryDirectory {
    async fn get_all(&self) -> Result<Vec<Arc<dyn ProcessEntry>>, PortsError> {
        Ok(self
            .processes
            .iter()
            .map(|entry| Arc::clone(entry.value()) as Arc<dyn ProcessEntry>)
            .collect())
    }

    async fn try_get(&self, id: ProcessId) -> Result<Option<Arc<dyn ProcessEntry>>, PortsError> {
        Ok(self.get(id).map(|process| process as Arc<dyn ProcessEntry>))
    }

    async fn clear(&self, id: ProcessId) -> Result<(), PortsError> {
        self.processes.remove(&id);
        Ok(())
    }

    async fn clear_all(&self) -> Result<(), PortsError> {
        self.processes.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::InMemoryRuntime;
    use cumulus_core::ProcessId;
    use cumulus_ports::{ProcessDirectory, ProcessEntry};

    #[tokio::test]
    async fn clear_removes_entries() {
        let runtime = InMemoryRuntime::new();
        let a = runtime.submit::<u8>(None);
        runtime.submit::<u8>(None);
        let directory = runtime.directory();
        assert_eq!(directory.len(), 2);

        directory.clear(a.info().id).await.unwrap();
        directory.clear(ProcessId::v4()).await.unwrap();
        assert_eq!(directory.get_all().await.unwrap().len(), 1);

        directory.clear_all().await.unwrap();
        assert!(directory.is_empty());
    }
}
