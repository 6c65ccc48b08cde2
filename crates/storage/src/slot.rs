//! A handle's entry in the node-local cache.

use std::any::Any;
use std::future::Future;
use std::sync::Arc;

use cumulus_cache::LocalCache;
use cumulus_core::ValueId;
use tokio::sync::Mutex;

use crate::error::StoreError;

/// Cache key plus the lock that serializes fills for one handle.
pub(crate) struct CacheSlot {
    id: ValueId,
    cache: Option<Arc<LocalCache>>,
    fill: Mutex<()>,
}

impl CacheSlot {
    pub(crate) fn new(cache: Option<Arc<LocalCache>>) -> Self {
        Self {
            id: ValueId::v4(),
            cache,
            fill: Mutex::new(()),
        }
    }

    pub(crate) fn id(&self) -> ValueId {
        self.id
    }

    pub(crate) fn is_cached(&self) -> bool {
        self.cache.as_ref().is_some_and(|c| c.contains(self.id))
    }

    pub(crate) fn get<V: Any + Send + Sync>(&self) -> Result<Option<Arc<V>>, StoreError> {
        match &self.cache {
            Some(cache) => Ok(cache.get::<V>(self.id)?),
            None => Ok(None),
        }
    }

    /// Returns the cached value, running `load` at most once per handle
    /// when absent. `None` when there is no local cache.
    pub(crate) async fn get_or_fill<V, F, Fut>(&self, load: F) -> Result<Option<Arc<V>>, StoreError>
    where
        V: Any + Send + Sync,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, StoreError>>,
    {
        let Some(cache) = &self.cache else {
            return Ok(None);
        };
        if let Some(value) = cache.get::<V>(self.id)? {
            return Ok(Some(value));
        }

        let _fill = self.fill.lock().await;
        if let Some(value) = cache.get::<V>(self.id)? {
            return Ok(Some(value));
        }
        let value = Arc::new(load().await?);
        cache.try_add(self.id, Arc::clone(&value));
        Ok(Some(cache.get::<V>(self.id)?.unwrap_or(value)))
    }
}
