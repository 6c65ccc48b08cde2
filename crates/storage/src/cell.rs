//! A single value persisted in a store.

use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use cumulus_core::ValueId;
use cumulus_ports::Serializer;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::io::AsyncReadExt;

use crate::context::StoreContext;
use crate::entity::{Disposable, StorageEntity};
use crate::error::StoreError;
use crate::options::{ReadOptions, WriteOptions};
use crate::slot::CacheSlot;

/// Handle to a value of type `T` stored at a fixed path.
///
/// Reads go to the store unless the value has been placed in the
/// node-local cache, either explicitly through
/// [`populate_cache`](Self::populate_cache) or on first read when the handle
/// caches by default. Two handles to the same path never share a cache
/// entry.
pub struct Cell<T> {
    ctx: StoreContext,
    path: String,
    serializer: Arc<dyn Serializer>,
    cache_by_default: bool,
    slot: CacheSlot,
    _value: PhantomData<fn() -> T>,
}

impl<T> Cell<T>
where
    T: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    /// Serialize `value` to a fresh path and return a handle to it.
    pub async fn create(
        ctx: &StoreContext,
        value: &T,
        options: WriteOptions,
    ) -> Result<Self, StoreError> {
        let options = options.resolve(ctx);
        let path = ctx.store().random_file_path(&options.directory);
        let bytes = options
            .serializer
            .serialize(&serde_json::to_value(value)?)
            .map_err(StoreError::codec)?;
        let written = ctx
            .store()
            .write(&path, bytes)
            .await
            .map_err(|e| ctx.store_error(&path, e))?;
        tracing::debug!(path = %path, bytes = written, "created cell");
        Ok(Self::bind(ctx, path, options.serializer, options.cache_by_default))
    }

    /// Bind to an existing object at `path`.
    ///
    /// Fails with [`StoreError::NotFound`] when the object is absent. With
    /// `force`, the value is read now and placed in the local cache.
    pub async fn from_file(
        ctx: &StoreContext,
        path: impl Into<String>,
        options: ReadOptions,
    ) -> Result<Self, StoreError> {
        let path = path.into();
        let (serializer, force, cache_by_default) = options.resolve(ctx);
        ctx.ensure_exists(&path).await?;
        let cell = Self::bind(ctx, path, serializer, cache_by_default);
        if force {
            cell.populate_cache().await?;
        }
        Ok(cell)
    }

    fn bind(
        ctx: &StoreContext,
        path: String,
        serializer: Arc<dyn Serializer>,
        cache_by_default: bool,
    ) -> Self {
        Self {
            ctx: ctx.clone(),
            path,
            serializer,
            cache_by_default,
            slot: CacheSlot::new(ctx.local_cache().cloned()),
            _value: PhantomData,
        }
    }

    /// Store path.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Local cache key of this handle.
    pub fn cache_key(&self) -> ValueId {
        self.slot.id()
    }

    /// Serializer used for this cell.
    pub fn serializer(&self) -> &Arc<dyn Serializer> {
        &self.serializer
    }

    /// Whether reads populate the local cache.
    pub fn cache_by_default(&self) -> bool {
        self.cache_by_default
    }

    /// The stored value.
    pub async fn value(&self) -> Result<Arc<T>, StoreError> {
        if let Some(value) = self.slot.get::<T>()? {
            return Ok(value);
        }
        if self.cache_by_default
            && let Some(value) = self.slot.get_or_fill(|| self.read()).await?
        {
            return Ok(value);
        }
        Ok(Arc::new(self.read().await?))
    }

    /// Place the value in the local cache. Returns `false` when the context
    /// has no local cache.
    ///
    /// Concurrent calls on one handle read the store once.
    pub async fn populate_cache(&self) -> Result<bool, StoreError> {
        Ok(self.slot.get_or_fill(|| self.read()).await?.is_some())
    }

    /// Whether the value is in the local cache.
    pub fn is_cached_locally(&self) -> bool {
        self.slot.is_cached()
    }

    /// Size of the stored object in bytes.
    pub async fn size(&self) -> Result<u64, StoreError> {
        self.ctx
            .store()
            .file_size(&self.path)
            .await
            .map_err(|e| self.ctx.store_error(&self.path, e))
    }

    async fn read(&self) -> Result<T, StoreError> {
        let mut stream = self
            .ctx
            .store()
            .begin_read(&self.path)
            .await
            .map_err(|e| self.ctx.store_error(&self.path, e))?;
        let mut buf = Vec::new();
        stream
            .read_to_end(&mut buf)
            .await
            .map_err(|e| self.ctx.store_error(&self.path, e.into()))?;
        let value = self.serializer.deserialize(&buf).map_err(StoreError::codec)?;
        Ok(serde_json::from_value(value)?)
    }
}

#[async_trait]
impl<T> Disposable for Cell<T>
where
    T: Send + Sync + 'static,
{
    async fn dispose(&self) -> Result<(), StoreError> {
        self.ctx
            .store()
            .delete_file(&self.path)
            .await
            .map_err(|e| self.ctx.store_error(&self.path, e))?;
        tracing::debug!(path = %self.path, "disposed cell");
        Ok(())
    }
}

impl<T> StorageEntity for Cell<T> {
    fn type_tag(&self) -> &'static str {
        "cell"
    }

    fn identity(&self) -> String {
        self.path.clone()
    }
}

impl<T> std::fmt::Debug for Cell<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cell")
            .field("path", &self.path)
            .field("serializer", &self.serializer.id())
            .field("cache_by_default", &self.cache_by_default)
            .finish_non_exhaustive()
    }
}
