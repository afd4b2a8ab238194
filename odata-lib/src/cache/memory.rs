//! In-memory cache implementation using DashMap

use async_trait::async_trait;
use dashmap::DashMap;

use super::CacheProvider;
use super::CachedValue;

/// An in-memory cache backed by a concurrent hash map.
///
/// Data is lost when the process exits. Share one instance between sessions
/// (behind an `Arc`) to load each schema once.
///
/// # Example
///
/// ```
/// use odata_lib::cache::InMemoryCache;
///
/// let cache = InMemoryCache::new();
/// assert!(cache.is_empty());
/// ```
#[derive(Debug, Default)]
pub struct InMemoryCache {
    store: DashMap<String, CachedValue>,
}

impl InMemoryCache {
    /// Creates a new empty in-memory cache.
    pub fn new() -> Self {
        Self {
            store: DashMap::new(),
        }
    }

    /// Returns the number of entries in the cache (including expired ones).
    pub fn len(&self) -> usize {
        self.store.len()
    }

    /// Returns `true` if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }
}

#[async_trait]
impl CacheProvider for InMemoryCache {
    async fn get(&self, key: &str) -> Option<CachedValue> {
        let entry = self.store.get(key)?;
        let value = entry.value();

        if value.is_expired() {
            drop(entry);
            self.store.remove(key);
            None
        } else {
            Some(value.clone())
        }
    }

    async fn set(&self, key: &str, value: CachedValue) {
        self.store.insert(key.to_string(), value);
    }

    async fn remove(&self, key: &str) {
        self.store.remove(key);
    }

    async fn gc(&self) -> usize {
        let mut removed = 0;
        self.store.retain(|_, value| {
            if value.is_expired() {
                removed += 1;
                false
            } else {
                true
            }
        });
        removed
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn test_get_set_remove() {
        let cache = InMemoryCache::new();
        cache
            .set("schema:a", CachedValue::with_ttl(vec![1, 2], Duration::from_secs(60)))
            .await;
        assert_eq!(cache.get("schema:a").await.unwrap().data, vec![1, 2]);

        cache.remove("schema:a").await;
        assert!(cache.get("schema:a").await.is_none());
    }

    #[tokio::test]
    async fn test_expired_values_are_dropped() {
        let cache = InMemoryCache::new();
        cache.set("old", CachedValue::with_ttl(vec![1], Duration::ZERO)).await;
        cache.set("fresh", CachedValue::with_ttl(vec![2], Duration::from_secs(60))).await;

        assert_eq!(cache.gc().await, 1);
        assert_eq!(cache.len(), 1);
        assert!(cache.get("old").await.is_none());
    }
}
