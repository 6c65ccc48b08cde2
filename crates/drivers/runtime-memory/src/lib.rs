#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! # Cumulus Runtime Memory Driver
//!
//! In-memory implementation of the [`RuntimeManager`] port and the ports it
//! hands out: a process directory, a log manager and a dependency loader.
//!
//! Processes are driven by the caller. A test creates one with
//! [`InMemoryRuntime::submit`], moves it through its lifecycle with the
//! methods on [`InMemoryProcess`], and observes it through the runtime core
//! exactly as it would observe a real cluster.
//!
//! # Examples
//!
//! ```rust,no_run
//! use cumulus_runtime_memory::InMemoryRuntime;
//! use cumulus_ports::{ProcessDirectory, RuntimeManager};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let runtime = InMemoryRuntime::new();
//! let process = runtime.submit::<u64>(Some("word-count"));
//! process.start()?;
//! process.complete(serde_json::json!(42))?;
//! let all = runtime.process_directory().get_all().await?;
//! assert_eq!(all.len(), 1);
//! # Ok(())
//! # }
//! ```

mod directory;
mod loader;
mod logs;
mod process;

use std::sync::Arc;

use cumulus_core::{ProcessId, RuntimeId, TypeDescriptor};
use cumulus_execution::{Dependency, ProcessInfo};
use cumulus_ports::{
    DependencyLoader, JsonTypeCodec, LogManager, ProcessDirectory, ProcessEntry, RuntimeManager,
    TypeCodec,
};
use serde::de::DeserializeOwned;

pub use directory::InMemoryDirectory;
pub use loader::InMemoryDependencyLoader;
pub use logs::InMemoryLogs;
pub use process::InMemoryProcess;

/// A single-process stand-in for a cluster.
pub struct InMemoryRuntime {
    id: RuntimeId,
    directory: Arc<InMemoryDirectory>,
    logs: Arc<InMemoryLogs>,
    loader: Arc<InMemoryDependencyLoader>,
    codec: Arc<JsonTypeCodec>,
}

impl InMemoryRuntime {
    /// Runtime with a fresh random id.
    #[must_use]
    pub fn new() -> Self {
        Self::with_id(RuntimeId::v4())
    }

    /// Runtime with a fixed id, e.g. to simulate the same cluster seen
    /// from two nodes.
    #[must_use]
    pub fn with_id(id: RuntimeId) -> Self {
        Self {
            id,
            directory: Arc::new(InMemoryDirectory::new()),
            logs: Arc::new(InMemoryLogs::new()),
            loader: Arc::new(InMemoryDependencyLoader::new()),
            codec: Arc::new(JsonTypeCodec),
        }
    }

    /// Register a new process whose result type is `T`.
    pub fn submit<T: DeserializeOwned + 'static>(&self, name: Option<&str>) -> Arc<InMemoryProcess> {
        self.submit_with_dependencies::<T>(name, Vec::new())
    }

    /// Register a new process whose result type is `T` and that declares
    /// `dependencies`.
    pub fn submit_with_dependencies<T: DeserializeOwned + 'static>(
        &self,
        name: Option<&str>,
        dependencies: Vec<Dependency>,
    ) -> Arc<InMemoryProcess> {
        let descriptor = TypeDescriptor::of::<T>();
        let return_type = self
            .codec
            .encode(&descriptor)
            .unwrap_or_else(|_| descriptor.name().to_owned());
        self.submit_raw(name, return_type, descriptor.display_name(), dependencies)
    }

    /// Register a new process with an already pickled return type.
    pub fn submit_raw(
        &self,
        name: Option<&str>,
        return_type: impl Into<String>,
        return_type_name: impl Into<String>,
        dependencies: Vec<Dependency>,
    ) -> Arc<InMemoryProcess> {
        let mut info = ProcessInfo::new(ProcessId::v4(), return_type, return_type_name)
            .with_dependencies(dependencies);
        if let Some(name) = name {
            info = info.with_name(name);
        }
        let process = Arc::new(InMemoryProcess::new(info, Arc::clone(&self.logs)));
        self.directory.insert(Arc::clone(&process));
        tracing::debug!(process_id = %process.info().id, "submitted in-memory process");
        process
    }

    /// The concrete directory, for test inspection.
    pub fn directory(&self) -> &Arc<InMemoryDirectory> {
        &self.directory
    }

    /// The concrete log manager, for appending entries.
    pub fn logs(&self) -> &Arc<InMemoryLogs> {
        &self.logs
    }

    /// The concrete dependency loader, for configuring outcomes.
    pub fn loader(&self) -> &Arc<InMemoryDependencyLoader> {
        &self.loader
    }
}

impl Default for InMemoryRuntime {
    fn default() -> Self {
        Self::new()
    }
}

impl RuntimeManager for InMemoryRuntime {
    fn id(&self) -> RuntimeId {
        self.id
    }

    fn log_manager(&self) -> Arc<dyn LogManager> {
        Arc::clone(&self.logs) as Arc<dyn LogManager>
    }

    fn process_directory(&self) -> Arc<dyn ProcessDirectory> {
        Arc::clone(&self.directory) as Arc<dyn ProcessDirectory>
    }

    fn dependency_loader(&self) -> Arc<dyn DependencyLoader> {
        Arc::clone(&self.loader) as Arc<dyn DependencyLoader>
    }

    fn type_codec(&self) -> Arc<dyn TypeCodec> {
        Arc::clone(&self.codec) as Arc<dyn TypeCodec>
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn submit_registers_in_directory() {
        let runtime = InMemoryRuntime::new();
        let process = runtime.submit::<u64>(Some("p"));
        let found = runtime
            .process_directory()
            .try_get(process.info().id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.info().name.as_deref(), Some("p"));
    }

    #[test]
    fn return_type_decodes_to_descriptor() {
        let runtime = InMemoryRuntime::new();
        let process = runtime.submit::<Vec<String>>(None);
        let decoded = runtime
            .type_codec()
            .decode(&process.info().return_type)
            .unwrap();
        assert_eq!(decoded, TypeDescriptor::of::<Vec<String>>());
        assert_eq!(process.info().return_type_name, "Vec<String>");
    }

    #[test]
    fn fixed_id_is_reported() {
        let id = RuntimeId::v4();
        assert_eq!(InMemoryRuntime::with_id(id).id(), id);
    }
}
