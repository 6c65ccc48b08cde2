//! The environment cells and sequences are created in.

use std::sync::Arc;

use cumulus_cache::LocalCache;
use cumulus_ports::{PortsError, Serializer, Store};

use crate::config::StoreConfig;
use crate::error::StoreError;
use crate::serializer::JsonSerializer;

/// Store, default serializer, optional node-local cache and defaults.
///
/// Cheap to clone; every handle created from a context keeps its own clone.
#[derive(Clone)]
pub struct StoreContext {
    store: Arc<dyn Store>,
    serializer: Arc<dyn Serializer>,
    local_cache: Option<Arc<LocalCache>>,
    config: StoreConfig,
}

impl StoreContext {
    /// Context over `store` with a fresh local cache and default config.
    pub fn new(store: Arc<dyn Store>, serializer: Arc<dyn Serializer>) -> Self {
        Self {
            store,
            serializer,
            local_cache: Some(Arc::new(LocalCache::new())),
            config: StoreConfig::default(),
        }
    }

    /// Context over `store` using [`JsonSerializer`].
    pub fn json(store: Arc<dyn Store>) -> Self {
        Self::new(store, Arc::new(JsonSerializer))
    }

    /// Replace the defaults.
    #[must_use]
    pub fn with_config(mut self, config: StoreConfig) -> Self {
        self.config = config;
        self
    }

    /// Share `cache` with other contexts on this node.
    #[must_use]
    pub fn with_local_cache(mut self, cache: Arc<LocalCache>) -> Self {
        self.local_cache = Some(cache);
        self
    }

    /// Run without a node-local cache. Cache population becomes a no-op.
    #[must_use]
    pub fn without_local_cache(mut self) -> Self {
        self.local_cache = None;
        self
    }

    /// The backing store.
    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    /// The default serializer.
    pub fn serializer(&self) -> &Arc<dyn Serializer> {
        &self.serializer
    }

    /// The node-local cache, if any.
    pub fn local_cache(&self) -> Option<&Arc<LocalCache>> {
        self.local_cache.as_ref()
    }

    /// The defaults.
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Maps a port failure on `path` into a [`StoreError`].
    pub(crate) fn store_error(&self, path: &str, err: PortsError) -> StoreError {
        if err.is_not_found() {
            StoreError::NotFound {
                path: path.to_owned(),
            }
        } else {
            StoreError::Transport {
                target: format!("store {}:{path}", self.store.name()),
                source: err,
            }
        }
    }

    /// Fails with [`StoreError::NotFound`] unless `path` exists.
    pub(crate) async fn ensure_exists(&self, path: &str) -> Result<(), StoreError> {
        let exists = self
            .store
            .file_exists(path)
            .await
            .map_err(|e| self.store_error(path, e))?;
        if exists {
            Ok(())
        } else {
            Err(StoreError::NotFound {
                path: path.to_owned(),
            })
        }
    }
}

impl std::fmt::Debug for StoreContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreContext")
            .field("store", &self.store.name())
            .field("serializer", &self.serializer.id())
            .field("local_cache", &self.local_cache.is_some())
            .field("config", &self.config)
            .finish()
    }
}
