//! Cache errors.

use cumulus_core::ValueId;

/// Errors from [`LocalCache`](crate::LocalCache) lookups.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CacheError {
    /// The entry under `key` holds a different type than requested.
    #[error("cached value {key} is not a {expected}")]
    TypeMismatch {
        /// Key that was looked up.
        key: ValueId,
        /// Requested type name.
        expected: &'static str,
    },
}
