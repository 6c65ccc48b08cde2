//! In-memory dependency loader.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use cumulus_execution::Dependency;
use cumulus_ports::{DependencyLoader, LoadOutcome, PortsError};
use dashmap::DashMap;

/// Configured outcome for one dependency name.
#[derive(Debug, Clone)]
enum Behavior {
    Fault(String),
    Missing,
}

/// Dependency loader whose outcomes are configured per name.
///
/// Dependencies load successfully unless configured otherwise.
#[derive(Default)]
pub struct InMemoryDependencyLoader {
    behaviors: DashMap<String, Behavior>,
    downloads: AtomicUsize,
    loads: AtomicUsize,
}

impl InMemoryDependencyLoader {
    /// Loader where everything loads.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `name` fail to load with `message`.
    pub fn fail_to_load(&self, name: impl Into<String>, message: impl Into<String>) {
        self.behaviors
            .insert(name.into(), Behavior::Fault(message.into()));
    }

    /// Make `name` report as not loaded.
    pub fn mark_missing(&self, name: impl Into<String>) {
        self.behaviors.insert(name.into(), Behavior::Missing);
    }

    /// Number of `download` calls.
    pub fn downloads(&self) -> usize {
        self.downloads.load(Ordering::SeqCst)
    }

    /// Number of `load` calls.
    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DependencyLoader for InMemoryDependencyLoader {
    async fn download(&self, _dependencies: &[Dependency]) -> Result<(), PortsError> {
        self.downloads.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn load(&self, dependencies: &[Dependency]) -> Result<Vec<LoadOutcome>, PortsError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        Ok(dependencies
            .iter()
            .map(|dep| match self.behaviors.get(&dep.name).map(|b| b.clone()) {
                None => LoadOutcome::Loaded(dep.clone()),
                Some(Behavior::Fault(message)) => LoadOutcome::LoadFault(dep.clone(), message),
                Some(Behavior::Missing) => LoadOutcome::NotLoaded(dep.clone()),
            })
            .collect())
    }
}
