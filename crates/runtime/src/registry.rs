//! Process-wide directory of live runtime managers.

use std::sync::{Arc, LazyLock};

use cumulus_core::RuntimeId;
use cumulus_ports::RuntimeManager;
use dashmap::DashMap;

use crate::error::RuntimeError;

static GLOBAL: LazyLock<Arc<ManagerRegistry>> = LazyLock::new(|| Arc::new(ManagerRegistry::new()));

/// Thread-safe table of runtime managers keyed by [`RuntimeId`].
///
/// A deserialized handle only carries the id of the runtime it came from;
/// this table turns that id back into a manager. A
/// [`RuntimeClient`](crate::RuntimeClient) registers its manager when it is
/// created and removes it when dropped.
pub struct ManagerRegistry {
    managers: DashMap<RuntimeId, Arc<dyn RuntimeManager>>,
}

impl ManagerRegistry {
    /// Create a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            managers: DashMap::new(),
        }
    }

    /// The registry shared by the whole process.
    pub fn global() -> Arc<Self> {
        Arc::clone(&GLOBAL)
    }

    /// Register a manager under its own id.
    ///
    /// If a manager with the same id already exists, it is replaced.
    pub fn register(&self, manager: Arc<dyn RuntimeManager>) {
        let runtime_id = manager.id();
        tracing::info!(%runtime_id, "registered runtime manager");
        self.managers.insert(runtime_id, manager);
    }

    /// Remove the manager registered under `id`. Returns it, if any.
    pub fn unregister(&self, id: RuntimeId) -> Option<Arc<dyn RuntimeManager>> {
        let removed = self.managers.remove(&id).map(|(_, manager)| manager);
        if removed.is_some() {
            tracing::info!(runtime_id = %id, "unregistered runtime manager");
        }
        removed
    }

    /// Remove `manager` only if it is still the one registered under its id.
    pub(crate) fn unregister_exact(&self, manager: &Arc<dyn RuntimeManager>) -> bool {
        let runtime_id = manager.id();
        let removed = self
            .managers
            .remove_if(&runtime_id, |_, current| Arc::ptr_eq(current, manager))
            .is_some();
        if removed {
            tracing::info!(%runtime_id, "unregistered runtime manager");
        }
        removed
    }

    /// Look up a manager by id.
    pub fn resolve(&self, id: RuntimeId) -> Result<Arc<dyn RuntimeManager>, RuntimeError> {
        self.managers
            .get(&id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or(RuntimeError::NotRegistered { runtime_id: id })
    }

    /// Whether a manager is registered under `id`.
    #[must_use]
    pub fn contains(&self, id: RuntimeId) -> bool {
        self.managers.contains_key(&id)
    }

    /// Number of registered managers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.managers.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.managers.is_empty()
    }

    /// Ids of all registered managers.
    #[must_use]
    pub fn ids(&self) -> Vec<RuntimeId> {
        self.managers.iter().map(|entry| *entry.key()).collect()
    }
}

impl Default for ManagerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ManagerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManagerRegistry")
            .field("managers", &self.ids())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cumulus_runtime_memory::InMemoryRuntime;
    use pretty_assertions::assert_eq;

    fn manager() -> Arc<dyn RuntimeManager> {
        Arc::new(InMemoryRuntime::new())
    }

    #[test]
    fn register_and_resolve() {
        let reg = ManagerRegistry::new();
        let m = manager();
        reg.register(Arc::clone(&m));

        assert!(reg.contains(m.id()));
        assert_eq!(reg.len(), 1);
        assert_eq!(reg.resolve(m.id()).unwrap().id(), m.id());
    }

    #[test]
    fn resolve_missing_returns_not_registered() {
        let reg = ManagerRegistry::new();
        let id = RuntimeId::v4();
        let Err(err) = reg.resolve(id) else {
            panic!("resolving an unregistered runtime must fail");
        };
        assert!(matches!(err, RuntimeError::NotRegistered { runtime_id } if runtime_id == id));
    }

    #[test]
    fn register_replaces_existing() {
        let reg = ManagerRegistry::new();
        let id = RuntimeId::v4();
        let first: Arc<dyn RuntimeManager> = Arc::new(InMemoryRuntime::with_id(id));
        let second: Arc<dyn RuntimeManager> = Arc::new(InMemoryRuntime::with_id(id));
        reg.register(Arc::clone(&first));
        reg.register(Arc::clone(&second));
        assert_eq!(reg.len(), 1);
        assert!(Arc::ptr_eq(&reg.resolve(id).unwrap(), &second));
    }

    #[test]
    fn unregister_is_idempotent() {
        let reg = ManagerRegistry::new();
        let m = manager();
        reg.register(Arc::clone(&m));
        assert!(reg.unregister(m.id()).is_some());
        assert!(reg.unregister(m.id()).is_none());
        assert!(reg.is_empty());
    }

    #[test]
    fn unregister_exact_keeps_replacement() {
        let reg = ManagerRegistry::new();
        let id = RuntimeId::v4();
        let first: Arc<dyn RuntimeManager> = Arc::new(InMemoryRuntime::with_id(id));
        let second: Arc<dyn RuntimeManager> = Arc::new(InMemoryRuntime::with_id(id));
        reg.register(Arc::clone(&first));
        reg.register(Arc::clone(&second));
        assert!(!reg.unregister_exact(&first));
        assert!(reg.contains(id));
        assert!(reg.unregister_exact(&second));
        assert!(!reg.contains(id));
    }

    #[test]
    fn concurrent_register_and_resolve() {
        let reg = Arc::new(ManagerRegistry::new());
        let threads: Vec<_> = (0..8)
            .map(|_| {
                let reg = Arc::clone(&reg);
                std::thread::spawn(move || {
                    let m = manager();
                    reg.register(Arc::clone(&m));
                    assert!(reg.resolve(m.id()).is_ok());
                    reg.unregister(m.id());
                })
            })
            .collect();
        for t in threads {
            t.join().unwrap();
        }
        assert!(reg.is_empty());
    }

    #[test]
    fn global_is_shared() {
        assert!(Arc::ptr_eq(&ManagerRegistry::global(), &ManagerRegistry::global()));
    }
}
