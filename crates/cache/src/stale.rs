//! Stale-tolerant refresh cache.
//!
//! A [`StaleCache`] holds one value pulled from an async source. The first
//! [`get`](StaleCache::get) waits for the source; every later call returns
//! the cached value at once and, when it is older than the refresh interval,
//! starts a background refresh. At most one refresh runs at a time, and a
//! failed refresh keeps the previous value.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use parking_lot::RwLock;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::entry::CacheEntry;

/// Async source of a cached value.
pub type Fetch<T, E> = Arc<dyn Fn() -> BoxFuture<'static, Result<T, E>> + Send + Sync>;

struct Inner<T, E> {
    source: Fetch<T, E>,
    interval: Duration,
    entry: RwLock<Option<CacheEntry<T>>>,
    refresh_lock: Arc<Mutex<()>>,
}

impl<T: Clone, E> Inner<T, E> {
    fn cached(&self) -> Option<CacheEntry<T>> {
        self.entry.read().clone()
    }

    /// Caller must hold `refresh_lock`.
    async fn fetch_and_store(&self) -> Result<T, E> {
        let value = (self.source)().await?;
        *self.entry.write() = Some(CacheEntry::new(value.clone()));
        Ok(value)
    }
}

/// A value refreshed from an async source on a fixed interval.
///
/// Cloning is cheap and clones share the same entry.
pub struct StaleCache<T, E> {
    inner: Arc<Inner<T, E>>,
}

impl<T, E> Clone for StaleCache<T, E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T, E> StaleCache<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: fmt::Display + Send + 'static,
{
    /// Cache over `source`, refreshed when older than `interval`.
    pub fn new(source: Fetch<T, E>, interval: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                source,
                interval,
                entry: RwLock::new(None),
                refresh_lock: Arc::new(Mutex::new(())),
            }),
        }
    }

    /// Cache over a closure returning a future.
    pub fn from_fn<F, Fut>(source: F, interval: Duration) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        Self::new(Arc::new(move || Box::pin(source())), interval)
    }

    /// Refresh interval.
    pub fn interval(&self) -> Duration {
        self.inner.interval
    }

    /// The cached value, fetching it first if the cache is empty.
    ///
    /// Only the very first population can fail; once a value exists this
    /// never waits on the source.
    pub async fn get(&self) -> Result<T, E> {
        if let Some(entry) = self.inner.cached() {
            if entry.is_stale(self.inner.interval) {
                self.spawn_refresh();
            }
            return Ok(entry.value);
        }

        let _guard = self.inner.refresh_lock.lock().await;
        if let Some(entry) = self.inner.cached() {
            return Ok(entry.value);
        }
        self.inner.fetch_and_store().await
    }

    /// Fetch a new value now and wait for it.
    ///
    /// If another refresh finishes while this one waits for its turn, that
    /// value is returned instead of fetching again.
    pub async fn refresh(&self) -> Result<T, E> {
        let requested = Instant::now();
        let _guard = self.inner.refresh_lock.lock().await;
        if let Some(entry) = self.inner.cached()
            && entry.last_refreshed > requested
        {
            return Ok(entry.value);
        }
        self.inner.fetch_and_store().await
    }

    /// The cached value without triggering a refresh.
    pub fn peek(&self) -> Option<T> {
        self.inner.cached().map(|entry| entry.value)
    }

    /// When the cached value was fetched.
    pub fn last_refreshed(&self) -> Option<Instant> {
        self.inner.entry.read().as_ref().map(|entry| entry.last_refreshed)
    }

    fn spawn_refresh(&self) {
        let Ok(guard) = Arc::clone(&self.inner.refresh_lock).try_lock_owned() else {
            return;
        };
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            let _guard = guard;
            if let Err(error) = inner.fetch_and_store().await {
                tracing::warn!(%error, "stale cache refresh failed, keeping previous value");
            }
        });
    }
}

impl<T, E> fmt::Debug for StaleCache<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaleCache")
            .field("interval", &self.inner.interval)
            .field("populated", &self.inner.entry.read().is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

    const INTERVAL: Duration = Duration::from_millis(500);

    /// Source returning 1, 2, 3, ... and failing while `fail` is set.
    fn counting_source(calls: Arc<AtomicU32>, fail: Arc<AtomicBool>) -> StaleCache<u32, String> {
        StaleCache::from_fn(
            move || {
                let calls = Arc::clone(&calls);
                let fail = Arc::clone(&fail);
                async move {
                    let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                    if fail.load(Ordering::SeqCst) {
                        Err(format!("fetch {n} failed"))
                    } else {
                        Ok(n)
                    }
                }
            },
            INTERVAL,
        )
    }

    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn first_get_fetches_then_serves_cached() {
        let calls = Arc::new(AtomicU32::new(0));
        let cache = counting_source(Arc::clone(&calls), Arc::default());
        assert_eq!(cache.peek(), None);
        assert_eq!(cache.get().await.unwrap(), 1);
        assert_eq!(cache.get().await.unwrap(), 1);
        settle().await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn stale_read_returns_old_value_and_refreshes_in_background() {
        let calls = Arc::new(AtomicU32::new(0));
        let cache = counting_source(Arc::clone(&calls), Arc::default());
        cache.get().await.unwrap();

        tokio::time::advance(INTERVAL).await;
        assert_eq!(cache.get().await.unwrap(), 1);
        settle().await;
        assert_eq!(cache.get().await.unwrap(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_stale_reads_start_one_refresh() {
        let calls = Arc::new(AtomicU32::new(0));
        let cache = counting_source(Arc::clone(&calls), Arc::default());
        cache.get().await.unwrap();

        tokio::time::advance(INTERVAL).await;
        for _ in 0..5 {
            assert_eq!(cache.get().await.unwrap(), 1);
        }
        settle().await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_refresh_keeps_stale_value() {
        let calls = Arc::new(AtomicU32::new(0));
        let fail = Arc::new(AtomicBool::new(false));
        let cache = counting_source(Arc::clone(&calls), Arc::clone(&fail));
        cache.get().await.unwrap();
        let first_refresh = cache.last_refreshed().unwrap();

        fail.store(true, Ordering::SeqCst);
        tokio::time::advance(INTERVAL).await;
        assert_eq!(cache.get().await.unwrap(), 1);
        settle().await;
        assert_eq!(cache.get().await.unwrap(), 1);
        assert_eq!(cache.last_refreshed(), Some(first_refresh));
    }

    #[tokio::test(start_paused = true)]
    async fn first_fetch_failure_is_surfaced() {
        let fail = Arc::new(AtomicBool::new(true));
        let cache = counting_source(Arc::default(), Arc::clone(&fail));
        assert_eq!(cache.get().await.unwrap_err(), "fetch 1 failed");
        fail.store(false, Ordering::SeqCst);
        assert_eq!(cache.get().await.unwrap(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn refresh_fetches_even_when_fresh() {
        let calls = Arc::new(AtomicU32::new(0));
        let cache = counting_source(Arc::clone(&calls), Arc::default());
        cache.get().await.unwrap();
        assert_eq!(cache.refresh().await.unwrap(), 2);
        assert_eq!(cache.peek(), Some(2));
    }

    #[tokio::test(start_paused = true)]
    async fn last_refreshed_never_decreases() {
        let cache = counting_source(Arc::default(), Arc::default());
        cache.get().await.unwrap();
        let mut previous = cache.last_refreshed().unwrap();
        for _ in 0..5 {
            tokio::time::advance(INTERVAL).await;
            cache.get().await.unwrap();
            settle().await;
            let current = cache.last_refreshed().unwrap();
            assert!(current >= previous);
            previous = current;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_first_access_fetches_once() {
        let calls = Arc::new(AtomicU32::new(0));
        let cache = counting_source(Arc::clone(&calls), Arc::default());
        let (a, b) = tokio::join!(cache.get(), cache.get());
        assert_eq!(a.unwrap(), 1);
        assert_eq!(b.unwrap(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    proptest! {
        #[test]
        fn get_never_regresses_below_first_value(outcomes in proptest::collection::vec(any::<bool>(), 1..20)) {
            let rt = tokio::runtime::Builder::new_current_thread()
                .enable_time()
                .start_paused(true)
                .build()
                .unwrap();
            rt.block_on(async {
                let calls = Arc::new(AtomicU32::new(0));
                let fail = Arc::new(AtomicBool::new(false));
                let cache = counting_source(Arc::clone(&calls), Arc::clone(&fail));
                let first = cache.get().await.unwrap();
                let mut last_seen = first;
                for succeed in outcomes {
                    fail.store(!succeed, Ordering::SeqCst);
                    tokio::time::advance(INTERVAL).await;
                    let value = cache.get().await.unwrap();
                    settle().await;
                    assert!(value >= first);
                    assert!(value >= last_seen);
                    last_seen = value;
                }
            });
        }
    }
}
