#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! # Cumulus Cache
//!
//! Two caches used throughout the Cumulus runtime:
//!
//! - [`StaleCache`] -- a single value refreshed from an async source on a
//!   fixed interval. Serves the last known value immediately and coalesces
//!   concurrent refreshes; refresh failures keep the stale value.
//! - [`LocalCache`] -- a node-local table of materialized values keyed by
//!   [`ValueId`](cumulus_core::ValueId). Inserts are first-writer-wins.

pub mod entry;
pub mod error;
pub mod local;
pub mod stale;

pub use entry::CacheEntry;
pub use error::CacheError;
pub use local::LocalCache;
pub use stale::{Fetch, StaleCache};
