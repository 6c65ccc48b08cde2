//! Cached value with its refresh timestamp.

use tokio::time::Instant;

/// A value and the instant it was fetched.
#[derive(Debug, Clone)]
pub struct CacheEntry<T> {
    /// The cached value.
    pub value: T,
    /// When the value was fetched.
    pub last_refreshed: Instant,
}

impl<T> CacheEntry<T> {
    /// Entry fetched now.
    pub fn new(value: T) -> Self {
        Self {
            value,
            last_refreshed: Instant::now(),
        }
    }

    /// Whether the entry is at least `interval` old.
    pub fn is_stale(&self, interval: std::time::Duration) -> bool {
        self.last_refreshed.elapsed() >= interval
    }
}
