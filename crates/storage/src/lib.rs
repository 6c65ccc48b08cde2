#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! # Cumulus Storage
//!
//! Store-backed values for passing large data between processes:
//!
//! - [`Cell`] -- one value at a store path.
//! - [`Sequence`] -- an ordered collection, written in one object, with
//!   its length recorded at creation.
//! - [`PartitionedSequence`] -- a collection streamed into several
//!   objects of bounded byte size.
//! - [`TextSequence`] -- a text object read line by line, splittable into
//!   byte ranges for parallel reads.
//!
//! Every handle carries a fresh [`ValueId`](cumulus_core::ValueId) keying
//! its entry in the node-local [`LocalCache`](cumulus_cache::LocalCache);
//! the store path is the durable identity shared across nodes.
//!
//! ```rust,ignore
//! let ctx = StoreContext::json(store);
//! let cell = Cell::create(&ctx, &vec![1, 2, 3], WriteOptions::default()).await?;
//! assert_eq!(*cell.value().await?, vec![1, 2, 3]);
//! cell.dispose().await?;
//! ```

pub mod cell;
pub mod config;
pub mod context;
pub mod entity;
pub mod error;
pub mod options;
pub mod partition;
pub mod sequence;
pub mod serializer;
mod slot;
pub mod text;

pub use cell::Cell;
pub use config::StoreConfig;
pub use context::StoreContext;
pub use entity::{
    CloudCollection, Disposable, PartitionableCollection, PartitionedCollection, StorageEntity,
};
pub use error::StoreError;
pub use options::{ReadOptions, WriteOptions};
pub use partition::PartitionedSequence;
pub use sequence::{ElementStream, Sequence};
pub use serializer::JsonSerializer;
pub use text::TextSequence;

/// Result alias for storage operations.
pub type StoreResult<T> = Result<T, StoreError>;
