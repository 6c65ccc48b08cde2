//! Size-bounded partitioning of sequences across several store objects.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::context::StoreContext;
use crate::entity::{CloudCollection, Disposable, PartitionedCollection, StorageEntity};
use crate::error::StoreError;
use crate::options::{Resolved, WriteOptions};
use crate::sequence::{self, RecordFormat, Sequence};

/// A sequence written as consecutive store objects of bounded size.
#[derive(Debug)]
pub struct PartitionedSequence<T> {
    partitions: Vec<Sequence<T>>,
}

impl<T> PartitionedSequence<T>
where
    T: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    /// Stream `values` into store objects of at most
    /// `max_partition_size` bytes each.
    ///
    /// A partition is closed before a record that would push it past the
    /// limit, and as soon as it reaches the limit. A single record larger
    /// than the limit gets a partition of its own. Only the partition
    /// being filled is held in memory. An empty input yields no
    /// partitions.
    pub async fn create<I>(
        ctx: &StoreContext,
        values: I,
        max_partition_size: u64,
        options: WriteOptions,
    ) -> Result<Self, StoreError>
    where
        I: IntoIterator<Item = T>,
    {
        if max_partition_size == 0 {
            return Err(StoreError::invalid_argument(
                "max partition size must be greater than zero",
            ));
        }
        let options = options.resolve(ctx);
        let mut writer = PartitionWriter {
            ctx,
            options: &options,
            partitions: Vec::new(),
            buf: Vec::new(),
            count: 0,
        };

        let mut record = Vec::new();
        for value in values {
            record.clear();
            sequence::encode(options.serializer.as_ref(), &value, &mut record)?;
            if !writer.buf.is_empty()
                && (writer.buf.len() + record.len()) as u64 > max_partition_size
            {
                writer.flush().await?;
            }
            writer.buf.extend_from_slice(&record);
            writer.count += 1;
            if writer.buf.len() as u64 >= max_partition_size {
                writer.flush().await?;
            }
        }
        if !writer.buf.is_empty() {
            writer.flush().await?;
        }

        tracing::debug!(
            partitions = writer.partitions.len(),
            max_partition_size,
            "created partitioned sequence"
        );
        Ok(Self {
            partitions: writer.partitions,
        })
    }

    /// Number of partitions.
    pub fn partition_count(&self) -> usize {
        self.partitions.len()
    }

    /// Total element count. Known up front for freshly written partitions.
    pub async fn count(&self) -> Result<u64, StoreError> {
        let counts = future::try_join_all(self.partitions.iter().map(Sequence::count)).await?;
        Ok(counts.into_iter().sum())
    }

    /// Total size of all partitions in bytes.
    pub async fn size(&self) -> Result<u64, StoreError> {
        let sizes = future::try_join_all(self.partitions.iter().map(Sequence::size)).await?;
        Ok(sizes.into_iter().sum())
    }

    /// Consume into the individual partition handles.
    pub fn into_partitions(self) -> Vec<Sequence<T>> {
        self.partitions
    }
}

struct PartitionWriter<'a, T> {
    ctx: &'a StoreContext,
    options: &'a Resolved,
    partitions: Vec<Sequence<T>>,
    buf: Vec<u8>,
    count: u64,
}

impl<T> PartitionWriter<'_, T>
where
    T: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    async fn flush(&mut self) -> Result<(), StoreError> {
        let path = self.ctx.store().random_file_path(&self.options.directory);
        let bytes = sequence::write(self.ctx, &path, std::mem::take(&mut self.buf)).await?;
        tracing::debug!(path = %path, bytes, count = self.count, "wrote partition");
        self.partitions.push(Sequence::bind(
            self.ctx,
            path,
            RecordFormat::Records(Arc::clone(&self.options.serializer)),
            self.options.cache_by_default,
            Some(std::mem::take(&mut self.count)),
        ));
        Ok(())
    }
}

#[async_trait]
impl<T> CloudCollection<T> for PartitionedSequence<T>
where
    T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
{
    async fn count(&self) -> Result<u64, StoreError> {
        PartitionedSequence::count(self).await
    }

    fn is_known_count(&self) -> bool {
        self.partitions.iter().all(Sequence::is_known_count)
    }

    async fn size(&self) -> Result<u64, StoreError> {
        PartitionedSequence::size(self).await
    }

    async fn to_vec(&self) -> Result<Vec<T>, StoreError> {
        let mut out = Vec::new();
        for partition in &self.partitions {
            out.extend_from_slice(&partition.to_array().await?);
        }
        Ok(out)
    }
}

impl<T> PartitionedCollection<T> for PartitionedSequence<T>
where
    T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
{
    fn partitions(&self) -> &[Sequence<T>] {
        &self.partitions
    }
}

#[async_trait]
impl<T> Disposable for PartitionedSequence<T>
where
    T: Send + Sync + 'static,
{
    async fn dispose(&self) -> Result<(), StoreError> {
        for partition in &self.partitions {
            partition.dispose().await?;
        }
        Ok(())
    }
}

impl<T> StorageEntity for PartitionedSequence<T> {
    fn type_tag(&self) -> &'static str {
        "sequence"
    }

    fn identity(&self) -> String {
        self.partitions
            .iter()
            .map(StorageEntity::identity)
            .collect::<Vec<_>>()
            .join(",")
    }
}
