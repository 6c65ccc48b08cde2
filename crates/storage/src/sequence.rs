//! Ordered collections persisted in a store.

use std::marker::PhantomData;
use std::ops::Range;
use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use bytes::Bytes;
use cumulus_core::ValueId;
use cumulus_ports::{PortsError, Serializer};
use futures::stream::{self, BoxStream};
use futures::{StreamExt, TryStreamExt};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::context::StoreContext;
use crate::entity::{CloudCollection, Disposable, StorageEntity};
use crate::error::StoreError;
use crate::options::{ReadOptions, WriteOptions};
use crate::slot::CacheSlot;
use crate::text;

/// Stream of decoded elements.
pub type ElementStream<T> = BoxStream<'static, Result<T, StoreError>>;

/// How the bytes of a stored sequence map to elements.
#[derive(Clone)]
pub(crate) enum RecordFormat {
    /// Records written by a [`Serializer`].
    Records(Arc<dyn Serializer>),
    /// Newline-terminated UTF-8 lines, optionally limited to a byte range.
    Lines(Option<Range<u64>>),
}

/// Handle to an ordered collection of `T` stored at a fixed path.
///
/// The element count is known without reading when the sequence was
/// written through this handle's constructor; otherwise it is computed by
/// enumerating once and then memoized.
pub struct Sequence<T> {
    ctx: StoreContext,
    path: String,
    format: RecordFormat,
    cache_by_default: bool,
    count: OnceLock<u64>,
    slot: CacheSlot,
    _element: PhantomData<fn() -> T>,
}

impl<T> Sequence<T>
where
    T: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    /// Write every element of `values` as one store object.
    pub async fn create<I>(
        ctx: &StoreContext,
        values: I,
        options: WriteOptions,
    ) -> Result<Self, StoreError>
    where
        I: IntoIterator<Item = T>,
    {
        let options = options.resolve(ctx);
        let mut buf = Vec::new();
        let mut count = 0u64;
        for value in values {
            encode(options.serializer.as_ref(), &value, &mut buf)?;
            count += 1;
        }
        let path = ctx.store().random_file_path(&options.directory);
        write(ctx, &path, buf).await?;
        tracing::debug!(path = %path, count, "created sequence");
        Ok(Self::bind(
            ctx,
            path,
            RecordFormat::Records(options.serializer),
            options.cache_by_default,
            Some(count),
        ))
    }

    /// Bind to an existing object at `path` without copying it.
    ///
    /// Fails with [`StoreError::NotFound`] when the object is absent. With
    /// `force`, the element count is computed now.
    pub async fn from_file(
        ctx: &StoreContext,
        path: impl Into<String>,
        options: ReadOptions,
    ) -> Result<Self, StoreError> {
        let path = path.into();
        let (serializer, force, cache_by_default) = options.resolve(ctx);
        ctx.ensure_exists(&path).await?;
        let sequence = Self::bind(
            ctx,
            path,
            RecordFormat::Records(serializer),
            cache_by_default,
            None,
        );
        if force {
            sequence.count().await?;
        }
        Ok(sequence)
    }

    pub(crate) fn bind(
        ctx: &StoreContext,
        path: String,
        format: RecordFormat,
        cache_by_default: bool,
        count: Option<u64>,
    ) -> Self {
        let known = OnceLock::new();
        if let Some(count) = count {
            let _ = known.set(count);
        }
        Self {
            ctx: ctx.clone(),
            path,
            format,
            cache_by_default,
            count: known,
            slot: CacheSlot::new(ctx.local_cache().cloned()),
            _element: PhantomData,
        }
    }

    /// Store path.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub(crate) fn context(&self) -> &StoreContext {
        &self.ctx
    }

    /// Byte range this handle is limited to, for text partitions.
    pub fn range(&self) -> Option<Range<u64>> {
        match &self.format {
            RecordFormat::Lines(range) => range.clone(),
            RecordFormat::Records(_) => None,
        }
    }

    /// Local cache key of this handle.
    pub fn cache_key(&self) -> ValueId {
        self.slot.id()
    }

    /// Whether reads populate the local cache.
    pub fn cache_by_default(&self) -> bool {
        self.cache_by_default
    }

    /// Whether the element count is available without reading.
    pub fn is_known_count(&self) -> bool {
        self.count.get().is_some()
    }

    /// Number of elements.
    ///
    /// Enumerates the whole sequence when the count is not yet known.
    pub async fn count(&self) -> Result<u64, StoreError> {
        if let Some(count) = self.count.get() {
            return Ok(*count);
        }
        let count = match self.slot.get::<Vec<T>>()? {
            Some(cached) => cached.len() as u64,
            None => {
                tracing::debug!(path = %self.path, "counting sequence by enumeration");
                self.raw_records()
                    .await?
                    .try_fold(0u64, |n, _| async move { Ok(n + 1) })
                    .await?
            }
        };
        Ok(*self.count.get_or_init(|| count))
    }

    /// Every element, materialized.
    ///
    /// Goes through the local cache when the handle caches by default;
    /// otherwise a cached copy is reused if present and a fresh read is
    /// not retained.
    pub async fn to_array(&self) -> Result<Arc<Vec<T>>, StoreError> {
        if let Some(cached) = self.slot.get::<Vec<T>>()? {
            return Ok(cached);
        }
        if self.cache_by_default
            && let Some(cached) = self.slot.get_or_fill(|| self.read_all()).await?
        {
            return Ok(cached);
        }
        Ok(Arc::new(self.read_all().await?))
    }

    /// Place every element in the local cache. Returns `false` when the
    /// context has no local cache.
    pub async fn force_cache(&self) -> Result<bool, StoreError> {
        Ok(self.slot.get_or_fill(|| self.read_all()).await?.is_some())
    }

    /// Whether the elements are in the local cache.
    pub fn is_cached_locally(&self) -> bool {
        self.slot.is_cached()
    }

    /// Size in bytes of the data this handle covers.
    pub async fn size(&self) -> Result<u64, StoreError> {
        if let Some(range) = self.range() {
            return Ok(range.end - range.start);
        }
        self.ctx
            .store()
            .file_size(&self.path)
            .await
            .map_err(|e| self.ctx.store_error(&self.path, e))
    }

    async fn read_all(&self) -> Result<Vec<T>, StoreError> {
        self.fresh_stream().await?.try_collect().await
    }

    async fn fresh_stream(&self) -> Result<ElementStream<T>, StoreError> {
        Ok(self
            .raw_records()
            .await?
            .and_then(|value| async move { serde_json::from_value::<T>(value).map_err(StoreError::from) })
            .boxed())
    }

    async fn raw_records(&self) -> Result<BoxStream<'static, Result<Value, StoreError>>, StoreError> {
        match &self.format {
            RecordFormat::Records(serializer) => {
                let reader = self
                    .ctx
                    .store()
                    .begin_read(&self.path)
                    .await
                    .map_err(|e| self.ctx.store_error(&self.path, e))?;
                let ctx = self.ctx.clone();
                let path = self.path.clone();
                Ok(serializer
                    .decode_records(reader)
                    .map_err(move |e| match e {
                        PortsError::Serialization(message) => StoreError::Serialization(message),
                        other => ctx.store_error(&path, other),
                    })
                    .boxed())
            }
            RecordFormat::Lines(range) => {
                let lines = text::read_lines(&self.ctx, &self.path, range.clone()).await?;
                Ok(lines.map_ok(Value::String).boxed())
            }
        }
    }
}

impl<T> Sequence<T>
where
    T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
{
    /// Lazy, restartable enumeration of the elements.
    ///
    /// A handle that caches by default materializes into the local cache
    /// first. Otherwise a cached copy is used if present, falling back to
    /// a streaming read that does not populate the cache.
    pub async fn stream(&self) -> Result<ElementStream<T>, StoreError> {
        let cached = if self.cache_by_default {
            Some(self.to_array().await?)
        } else {
            self.slot.get::<Vec<T>>()?
        };
        match cached {
            Some(elements) => {
                let len = elements.len();
                Ok(stream::iter((0..len).map(move |i| Ok(elements[i].clone()))).boxed())
            }
            None => self.fresh_stream().await,
        }
    }
}

pub(crate) fn encode<T: Serialize>(
    serializer: &dyn Serializer,
    value: &T,
    out: &mut Vec<u8>,
) -> Result<(), StoreError> {
    serializer
        .encode_record(&serde_json::to_value(value)?, out)
        .map_err(StoreError::codec)
}

pub(crate) async fn write(ctx: &StoreContext, path: &str, buf: Vec<u8>) -> Result<u64, StoreError> {
    ctx.store()
        .write(path, Bytes::from(buf))
        .await
        .map_err(|e| ctx.store_error(path, e))
}

#[async_trait]
impl<T> CloudCollection<T> for Sequence<T>
where
    T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
{
    async fn count(&self) -> Result<u64, StoreError> {
        Sequence::count(self).await
    }

    fn is_known_count(&self) -> bool {
        Sequence::is_known_count(self)
    }

    async fn size(&self) -> Result<u64, StoreError> {
        Sequence::size(self).await
    }

    async fn to_vec(&self) -> Result<Vec<T>, StoreError> {
        Ok(self.to_array().await?.as_ref().clone())
    }
}

#[async_trait]
impl<T> Disposable for Sequence<T>
where
    T: Send + Sync + 'static,
{
    async fn dispose(&self) -> Result<(), StoreError> {
        self.ctx
            .store()
            .delete_file(&self.path)
            .await
            .map_err(|e| self.ctx.store_error(&self.path, e))?;
        tracing::debug!(path = %self.path, "disposed sequence");
        Ok(())
    }
}

impl<T> StorageEntity for Sequence<T> {
    fn type_tag(&self) -> &'static str {
        match self.format {
            RecordFormat::Records(_) => "sequence",
            RecordFormat::Lines(_) => "text_sequence",
        }
    }

    fn identity(&self) -> String {
        match &self.format {
            RecordFormat::Lines(Some(range)) => {
                format!("{}[{}..{})", self.path, range.start, range.end)
            }
            _ => self.path.clone(),
        }
    }
}

impl<T> std::fmt::Debug for Sequence<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sequence")
            .field("path", &self.path)
            .field("type_tag", &self.type_tag())
            .field("count", &self.count.get())
            .field("cache_by_default", &self.cache_by_default)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cumulus_ports::Store;
    use cumulus_store_memory::MemoryStore;
    use pretty_assertions::assert_eq;

    fn context() -> (Arc<MemoryStore>, StoreContext) {
        let store = Arc::new(MemoryStore::new("memory"));
        let ctx = StoreContext::json(store.clone());
        (store, ctx)
    }

    #[tokio::test]
    async fn create_roundtrip_counts_without_reading() {
        let (store, ctx) = context();
        let xs = vec![3u32, 1, 4, 1, 5, 9];
        let seq = Sequence::create(&ctx, xs.clone(), WriteOptions::default())
            .await
            .unwrap();

        let before = store.reads();
        assert!(seq.is_known_count());
        assert_eq!(seq.count().await.unwrap(), 6);
        assert_eq!(store.reads(), before);

        assert_eq!(*seq.to_array().await.unwrap(), xs);
    }

    #[tokio::test]
    async fn empty_sequence() {
        let (_, ctx) = context();
        let seq = Sequence::<String>::create(&ctx, Vec::new(), WriteOptions::default())
            .await
            .unwrap();
        assert_eq!(seq.count().await.unwrap(), 0);
        assert!(seq.to_array().await.unwrap().is_empty());
        assert_eq!(seq.size().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn from_file_counts_by_enumeration_once() {
        let (store, ctx) = context();
        let seq = Sequence::create(&ctx, vec!["a", "b", "c"].into_iter().map(String::from), WriteOptions::default())
            .await
            .unwrap();
        let bound = Sequence::<String>::from_file(&ctx, seq.path(), ReadOptions::default())
            .await
            .unwrap();
        assert!(!bound.is_known_count());

        let before = store.reads();
        assert_eq!(bound.count().await.unwrap(), 3);
        assert_eq!(bound.count().await.unwrap(), 3);
        assert_eq!(store.reads(), before + 1);
        assert!(bound.is_known_count());
    }

    #[tokio::test]
    async fn forced_from_file_knows_count() {
        let (_, ctx) = context();
        let seq = Sequence::create(&ctx, 0..10u8, WriteOptions::default()).await.unwrap();
        let bound = Sequence::<u8>::from_file(&ctx, seq.path(), ReadOptions::default().force(true))
            .await
            .unwrap();
        assert!(bound.is_known_count());
        assert_eq!(bound.count().await.unwrap(), 10);
    }

    #[tokio::test]
    async fn from_file_missing_is_not_found() {
        let (_, ctx) = context();
        let err = Sequence::<u8>::from_file(&ctx, "cumulus/none", ReadOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn plain_stream_does_not_populate_cache() {
        let (store, ctx) = context();
        let seq = Sequence::create(&ctx, vec![1i64, 2, 3], WriteOptions::default())
            .await
            .unwrap();

        let first: Vec<i64> = seq.stream().await.unwrap().try_collect().await.unwrap();
        let second: Vec<i64> = seq.stream().await.unwrap().try_collect().await.unwrap();
        assert_eq!(first, vec![1, 2, 3]);
        assert_eq!(first, second);
        assert!(!seq.is_cached_locally());

        seq.to_array().await.unwrap();
        assert!(!seq.is_cached_locally());

        assert!(seq.force_cache().await.unwrap());
        let reads = store.reads();
        let third: Vec<i64> = seq.stream().await.unwrap().try_collect().await.unwrap();
        assert_eq!(third, vec![1, 2, 3]);
        assert_eq!(store.reads(), reads);
    }

    #[tokio::test]
    async fn cache_by_default_stream_materializes() {
        let (store, ctx) = context();
        let seq = Sequence::create(&ctx, vec![true, false], WriteOptions::default().cache_by_default(true))
            .await
            .unwrap();
        let items: Vec<bool> = seq.stream().await.unwrap().try_collect().await.unwrap();
        assert_eq!(items, vec![true, false]);
        assert!(seq.is_cached_locally());
        let reads = store.reads();
        seq.to_array().await.unwrap();
        assert_eq!(store.reads(), reads);
    }

    #[tokio::test]
    async fn corrupt_record_surfaces_serialization_error() {
        let (store, ctx) = context();
        store
            .write("cumulus/bad", Bytes::from_static(b"1\n{nope\n"))
            .await
            .unwrap();
        let seq = Sequence::<u32>::from_file(&ctx, "cumulus/bad", ReadOptions::default())
            .await
            .unwrap();
        assert!(matches!(seq.to_array().await, Err(StoreError::Serialization(_))));
    }

    #[tokio::test]
    async fn dispose_removes_object() {
        let (store, ctx) = context();
        let seq = Sequence::create(&ctx, vec![1u8], WriteOptions::default()).await.unwrap();
        assert_eq!(seq.type_tag(), "sequence");
        seq.dispose().await.unwrap();
        assert!(!store.contains(seq.path()));
    }
}
