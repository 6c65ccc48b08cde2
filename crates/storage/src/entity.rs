//! Traits shared by stored values and collections.

use async_trait::async_trait;

use crate::error::StoreError;
use crate::sequence::Sequence;

/// Something persisted in a store.
pub trait StorageEntity {
    /// Short kind name, e.g. `"cell"`.
    fn type_tag(&self) -> &'static str;

    /// Human-readable identity, normally the store path.
    fn identity(&self) -> String;
}

/// A store object whose backing data can be deleted.
#[async_trait]
pub trait Disposable: Send + Sync {
    /// Delete the backing data. Deleting twice is not an error.
    async fn dispose(&self) -> Result<(), StoreError>;
}

/// A finite collection of `T` kept in a store.
#[async_trait]
pub trait CloudCollection<T: Send>: Send + Sync {
    /// Number of elements. May enumerate if not known up front.
    async fn count(&self) -> Result<u64, StoreError>;

    /// Whether [`count`](Self::count) can answer without reading.
    fn is_known_count(&self) -> bool;

    /// Total stored size in bytes.
    async fn size(&self) -> Result<u64, StoreError>;

    /// Every element, in order.
    async fn to_vec(&self) -> Result<Vec<T>, StoreError>;
}

/// A collection already split into a fixed set of partitions.
pub trait PartitionedCollection<T: Send>: CloudCollection<T> {
    /// The partitions, in element order.
    fn partitions(&self) -> &[Sequence<T>];
}

/// A collection that can be split on demand.
#[async_trait]
pub trait PartitionableCollection<T: Send>: CloudCollection<T> {
    /// Split into `n` partitions covering every element exactly once.
    async fn to_partitions(&self, n: usize) -> Result<Vec<Sequence<T>>, StoreError>;
}
