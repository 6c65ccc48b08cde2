//! Materialization of typed handles from type descriptors known only at
//! run time.
//!
//! A process records its result type as a pickled [`TypeDescriptor`]. The
//! factory maps descriptors to constructor functions, each of which
//! instantiates `ProcessHandle<T>` for one concrete `T`. This is the only
//! place an untyped process entry becomes a typed handle.

use std::sync::Arc;

use cumulus_core::TypeDescriptor;
use cumulus_execution::ProcessInfo;
use cumulus_ports::{LoadOutcome, ProcessEntry, RuntimeManager};
use dashmap::DashMap;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::config::HandleConfig;
use crate::error::RuntimeError;
use crate::handle::{AnyProcessHandle, ProcessHandle};

type Constructor =
    fn(Arc<dyn ProcessEntry>, Arc<dyn RuntimeManager>, &HandleConfig) -> Arc<dyn AnyProcessHandle>;

fn construct<T: DeserializeOwned + 'static>(
    entry: Arc<dyn ProcessEntry>,
    manager: Arc<dyn RuntimeManager>,
    config: &HandleConfig,
) -> Arc<dyn AnyProcessHandle> {
    Arc::new(ProcessHandle::<T>::new(entry, manager, config))
}

/// Table of handle constructors keyed by result type.
pub struct HandleFactory {
    constructors: DashMap<TypeDescriptor, Constructor>,
    config: HandleConfig,
}

impl HandleFactory {
    /// Factory preloaded with constructors for common result types.
    #[must_use]
    pub fn new(config: HandleConfig) -> Self {
        let factory = Self::empty(config);
        factory.register::<()>();
        factory.register::<bool>();
        factory.register::<i8>();
        factory.register::<i16>();
        factory.register::<i32>();
        factory.register::<i64>();
        factory.register::<u8>();
        factory.register::<u16>();
        factory.register::<u32>();
        factory.register::<u64>();
        factory.register::<usize>();
        factory.register::<f32>();
        factory.register::<f64>();
        factory.register::<String>();
        factory.register::<Vec<u8>>();
        factory.register::<Vec<String>>();
        factory.register::<Value>();
        factory
    }

    /// Factory without any constructors. Every entry falls back to an
    /// untyped handle.
    #[must_use]
    pub fn empty(config: HandleConfig) -> Self {
        Self {
            constructors: DashMap::new(),
            config,
        }
    }

    /// Make `T` materializable.
    pub fn register<T: DeserializeOwned + 'static>(&self) {
        self.constructors
            .insert(TypeDescriptor::of::<T>(), construct::<T>);
    }

    /// Whether a constructor exists for `descriptor`.
    #[must_use]
    pub fn contains(&self, descriptor: &TypeDescriptor) -> bool {
        self.constructors.contains_key(descriptor)
    }

    /// Settings given to every handle built here.
    pub fn config(&self) -> &HandleConfig {
        &self.config
    }

    /// Build a handle for `entry` typed by its recorded return type.
    ///
    /// Declared dependencies are loaded first, best-effort: a dependency
    /// that fails to load is logged and skipped, since status and logs do
    /// not need it. A return type that cannot be decoded is an error; one
    /// with no registered constructor yields a `ProcessHandle<Value>`.
    pub async fn materialize(
        &self,
        manager: &Arc<dyn RuntimeManager>,
        entry: Arc<dyn ProcessEntry>,
    ) -> Result<Arc<dyn AnyProcessHandle>, RuntimeError> {
        let info = entry.info();
        let process_id = info.id;
        load_dependencies(manager, info).await;

        let descriptor = manager
            .type_codec()
            .decode(&info.return_type)
            .map_err(|source| RuntimeError::TypeDecode { process_id, source })?;

        let constructor = match self.constructors.get(&descriptor) {
            Some(constructor) => *constructor.value(),
            None => {
                tracing::warn!(
                    %process_id,
                    result_type = %descriptor,
                    "no handle constructor for result type, using untyped handle"
                );
                construct::<Value>
            }
        };
        Ok(constructor(entry, Arc::clone(manager), &self.config))
    }
}

async fn load_dependencies(manager: &Arc<dyn RuntimeManager>, info: &ProcessInfo) {
    if info.dependencies.is_empty() {
        return;
    }
    let process_id = info.id;
    let loader = manager.dependency_loader();
    if let Err(error) = loader.download(&info.dependencies).await {
        tracing::warn!(%process_id, %error, "dependency download failed");
    }
    let outcomes = match loader.load(&info.dependencies).await {
        Ok(outcomes) => outcomes,
        Err(error) => {
            tracing::warn!(%process_id, %error, "dependency load failed");
            return;
        }
    };
    for outcome in outcomes {
        match outcome {
            LoadOutcome::Loaded(dependency) => {
                tracing::debug!(%process_id, %dependency, "dependency loaded");
            }
            LoadOutcome::LoadFault(dependency, reason) => {
                tracing::warn!(%process_id, %dependency, %reason, "dependency failed to load");
            }
            LoadOutcome::NotLoaded(dependency) => {
                tracing::warn!(%process_id, %dependency, "dependency not loaded");
            }
        }
    }
}

impl Default for HandleFactory {
    fn default() -> Self {
        Self::new(HandleConfig::default())
    }
}

impl std::fmt::Debug for HandleFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandleFactory")
            .field("constructors", &self.constructors.len())
            .field("config", &self.config)
            .finish()
    }
}
