//! Node-local value cache.

use std::any::Any;
use std::sync::Arc;

use cumulus_core::ValueId;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use crate::error::CacheError;

type Slot = Arc<dyn Any + Send + Sync>;

/// Materialized values shared by every cell and sequence handle of a node.
///
/// Keys are per-handle [`ValueId`]s, so two handles bound to the same store
/// path never share an entry. Nothing is evicted.
#[derive(Default)]
pub struct LocalCache {
    entries: DashMap<ValueId, Slot>,
}

impl LocalCache {
    /// Empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `value` under `key` unless an entry already exists.
    ///
    /// Returns `true` if this call inserted the value.
    pub fn try_add<T: Any + Send + Sync>(&self, key: ValueId, value: Arc<T>) -> bool {
        match self.entries.entry(key) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(value);
                true
            }
        }
    }

    /// Value under `key`, if present.
    pub fn get<T: Any + Send + Sync>(&self, key: ValueId) -> Result<Option<Arc<T>>, CacheError> {
        let Some(slot) = self.entries.get(&key).map(|slot| Arc::clone(slot.value())) else {
            return Ok(None);
        };
        slot.downcast::<T>()
            .map(Some)
            .map_err(|_| CacheError::TypeMismatch {
                key,
                expected: std::any::type_name::<T>(),
            })
    }

    /// Whether an entry exists under `key`.
    pub fn contains(&self, key: ValueId) -> bool {
        self.entries.contains_key(&key)
    }

    /// Drop the entry under `key`. Returns `true` if one existed.
    pub fn remove(&self, key: ValueId) -> bool {
        self.entries.remove(&key).is_some()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.entries.clear();
    }
}

impl std::fmt::Debug for LocalCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalCache")
            .field("entries", &self.entries.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn first_writer_wins() {
        let cache = LocalCache::new();
        let key = ValueId::v4();
        assert!(cache.try_add(key, Arc::new(1u32)));
        assert!(!cache.try_add(key, Arc::new(2u32)));
        assert_eq!(*cache.get::<u32>(key).unwrap().unwrap(), 1);
    }

    #[test]
    fn missing_key_is_none() {
        let cache = LocalCache::new();
        assert!(cache.get::<u32>(ValueId::v4()).unwrap().is_none());
    }

    #[test]
    fn wrong_type_is_mismatch() {
        let cache = LocalCache::new();
        let key = ValueId::v4();
        cache.try_add(key, Arc::new(String::from("x")));
        let err = cache.get::<u32>(key).unwrap_err();
        assert_eq!(
            err,
            CacheError::TypeMismatch {
                key,
                expected: "u32"
            }
        );
    }

    #[test]
    fn remove_and_clear() {
        let cache = LocalCache::new();
        let (a, b) = (ValueId::v4(), ValueId::v4());
        cache.try_add(a, Arc::new(1u8));
        cache.try_add(b, Arc::new(2u8));
        assert_eq!(cache.len(), 2);
        assert!(cache.remove(a));
        assert!(!cache.remove(a));
        assert!(!cache.contains(a));
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn concurrent_try_add_has_one_winner() {
        let cache = Arc::new(LocalCache::new());
        let key = ValueId::v4();
        let handles: Vec<_> = (0..8u32)
            .map(|i| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || cache.try_add(key, Arc::new(i)))
            })
            .collect();
        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|won| *won)
            .count();
        assert_eq!(winners, 1);
    }
}
