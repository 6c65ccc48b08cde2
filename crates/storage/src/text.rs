//! Line-delimited text sequences and byte-range partitioning.

use std::ops::Range;
use std::sync::Arc;

use async_trait::async_trait;
use cumulus_core::ValueId;
use futures::StreamExt;
use futures::stream::{self, BoxStream};
use tokio::io::{AsyncBufReadExt, BufReader};

use cumulus_ports::ReadStream;

use crate::context::StoreContext;
use crate::entity::{CloudCollection, Disposable, PartitionableCollection, StorageEntity};
use crate::error::StoreError;
use crate::options::{ReadOptions, WriteOptions};
use crate::sequence::{self, ElementStream, RecordFormat, Sequence};

/// A stored UTF-8 text object read as a sequence of lines.
///
/// Lines are terminated by `\n`; a trailing `\r` is stripped. The object
/// can be split into byte ranges so that several workers each read only
/// their share of a large file.
#[derive(Debug)]
pub struct TextSequence {
    inner: Sequence<String>,
}

impl TextSequence {
    /// Write `lines` as newline-terminated text.
    ///
    /// A line that already ends in `\n` is written as is.
    pub async fn create<I, S>(
        ctx: &StoreContext,
        lines: I,
        options: WriteOptions,
    ) -> Result<Self, StoreError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let options = options.resolve(ctx);
        let mut buf = Vec::new();
        for line in lines {
            let line = line.as_ref();
            buf.extend_from_slice(line.as_bytes());
            if !line.ends_with('\n') {
                buf.push(b'\n');
            }
        }
        let count = buf.iter().filter(|b| **b == b'\n').count() as u64;
        let path = ctx.store().random_file_path(&options.directory);
        sequence::write(ctx, &path, buf).await?;
        tracing::debug!(path = %path, count, "created text sequence");
        Ok(Self {
            inner: Sequence::bind(
                ctx,
                path,
                RecordFormat::Lines(None),
                options.cache_by_default,
                Some(count),
            ),
        })
    }

    /// Bind to an existing text object at `path`.
    ///
    /// Fails with [`StoreError::NotFound`] when the object is absent. With
    /// `force`, the line count is computed now.
    pub async fn from_file(
        ctx: &StoreContext,
        path: impl Into<String>,
        options: ReadOptions,
    ) -> Result<Self, StoreError> {
        let path = path.into();
        let (_, force, cache_by_default) = options.resolve(ctx);
        ctx.ensure_exists(&path).await?;
        let text = Self {
            inner: Sequence::bind(ctx, path, RecordFormat::Lines(None), cache_by_default, None),
        };
        if force {
            text.inner.count().await?;
        }
        Ok(text)
    }

    /// Split into `n` handles over the byte ranges
    /// `[i * len / n, (i + 1) * len / n)`.
    ///
    /// A line belongs to the range holding its first byte, so the
    /// partitions together yield every line exactly once.
    pub async fn partitions(&self, n: usize) -> Result<Vec<Sequence<String>>, StoreError> {
        if n == 0 {
            return Err(StoreError::invalid_argument(
                "partition count must be greater than zero",
            ));
        }
        let len = self.inner.size().await?;
        Ok(byte_ranges(len, n)
            .into_iter()
            .map(|range| {
                Sequence::bind(
                    self.inner.context(),
                    self.inner.path().to_owned(),
                    RecordFormat::Lines(Some(range)),
                    self.inner.cache_by_default(),
                    None,
                )
            })
            .collect())
    }

    /// Store path.
    pub fn path(&self) -> &str {
        self.inner.path()
    }

    /// Local cache key of this handle.
    pub fn cache_key(&self) -> ValueId {
        self.inner.cache_key()
    }

    /// Number of lines. Reads the whole object if not yet known.
    pub async fn count(&self) -> Result<u64, StoreError> {
        self.inner.count().await
    }

    /// Whether the line count is available without reading.
    pub fn is_known_count(&self) -> bool {
        self.inner.is_known_count()
    }

    /// Size of the object in bytes.
    pub async fn size(&self) -> Result<u64, StoreError> {
        self.inner.size().await
    }

    /// Every line, materialized.
    pub async fn to_array(&self) -> Result<Arc<Vec<String>>, StoreError> {
        self.inner.to_array().await
    }

    /// Lazy enumeration of the lines.
    pub async fn stream(&self) -> Result<ElementStream<String>, StoreError> {
        self.inner.stream().await
    }

    /// Place every line in the local cache.
    pub async fn force_cache(&self) -> Result<bool, StoreError> {
        self.inner.force_cache().await
    }

    /// Whether the lines are in the local cache.
    pub fn is_cached_locally(&self) -> bool {
        self.inner.is_cached_locally()
    }

    /// The underlying line sequence.
    pub fn as_sequence(&self) -> &Sequence<String> {
        &self.inner
    }
}

/// Splits `len` bytes into `n` contiguous ranges covering `[0, len)`.
pub(crate) fn byte_ranges(len: u64, n: usize) -> Vec<Range<u64>> {
    let n = n as u128;
    let len = u128::from(len);
    (0..n)
        .map(|i| {
            let start = i * len / n;
            let end = (i + 1) * len / n;
            // start and end never exceed len, which came from a u64.
            u64::try_from(start).unwrap_or(u64::MAX)..u64::try_from(end).unwrap_or(u64::MAX)
        })
        .collect()
}

struct LineReader {
    reader: BufReader<ReadStream>,
    position: u64,
    end: Option<u64>,
    ctx: StoreContext,
    path: String,
}

/// Opens a stream of the lines whose first byte falls in `range`.
pub(crate) async fn read_lines(
    ctx: &StoreContext,
    path: &str,
    range: Option<Range<u64>>,
) -> Result<BoxStream<'static, Result<String, StoreError>>, StoreError> {
    let (start, end) = match range {
        Some(range) => (range.start, Some(range.end)),
        None => (0, None),
    };
    if end.is_some_and(|end| start >= end) {
        return Ok(stream::empty().boxed());
    }

    // Opening one byte early tells whether `start` begins a line.
    let offset = start.saturating_sub(1);
    let stream = ctx
        .store()
        .begin_read_at(path, offset)
        .await
        .map_err(|e| ctx.store_error(path, e))?;
    let mut reader = BufReader::new(stream);
    let mut position = offset;
    if start > 0 {
        let mut partial = Vec::new();
        let skipped = reader
            .read_until(b'\n', &mut partial)
            .await
            .map_err(|e| ctx.store_error(path, e.into()))?;
        position += skipped as u64;
    }

    let state = LineReader {
        reader,
        position,
        end,
        ctx: ctx.clone(),
        path: path.to_owned(),
    };
    Ok(stream::try_unfold(state, next_line).boxed())
}

async fn next_line(mut state: LineReader) -> Result<Option<(String, LineReader)>, StoreError> {
    if state.end.is_some_and(|end| state.position >= end) {
        return Ok(None);
    }
    let mut buf = Vec::new();
    let read = state
        .reader
        .read_until(b'\n', &mut buf)
        .await
        .map_err(|e| state.ctx.store_error(&state.path, e.into()))?;
    if read == 0 {
        return Ok(None);
    }
    state.position += read as u64;
    if buf.last() == Some(&b'\n') {
        buf.pop();
        if buf.last() == Some(&b'\r') {
            buf.pop();
        }
    }
    let line = String::from_utf8(buf).map_err(|e| StoreError::Serialization(e.to_string()))?;
    Ok(Some((line, state)))
}

#[async_trait]
impl CloudCollection<String> for TextSequence {
    async fn count(&self) -> Result<u64, StoreError> {
        TextSequence::count(self).await
    }

    fn is_known_count(&self) -> bool {
        TextSequence::is_known_count(self)
    }

    async fn size(&self) -> Result<u64, StoreError> {
        TextSequence::size(self).await
    }

    async fn to_vec(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.to_array().await?.as_ref().clone())
    }
}

#[async_trait]
impl PartitionableCollection<String> for TextSequence {
    async fn to_partitions(&self, n: usize) -> Result<Vec<Sequence<String>>, StoreError> {
        self.partitions(n).await
    }
}

#[async_trait]
impl Disposable for TextSequence {
    async fn dispose(&self) -> Result<(), StoreError> {
        self.inner.dispose().await
    }
}

impl StorageEntity for TextSequence {
    fn type_tag(&self) -> &'static str {
        "text_sequence"
    }

    fn identity(&self) -> String {
        self.inner.path().to_owned()
    }
}
