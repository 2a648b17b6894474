//! In-memory tile cache using moka.
//!
//! Unbounded by default: tiles stay until the cache is cleared. When a byte
//! budget is configured, moka evicts least-recently-used tiles once the
//! weighted size exceeds it.

use bytes::Bytes;
use moka::future::Cache as MokaCache;

use super::TileKey;

/// Concurrent tile cache keyed by [`TileKey`].
///
/// Cloning is cheap and shares the underlying storage.
#[derive(Clone)]
pub struct TileCache {
    cache: MokaCache<TileKey, Bytes>,
    max_size_bytes: Option<u64>,
}

impl TileCache {
    /// Creates a cache, optionally bounded to `max_size_bytes` of tile data.
    pub fn new(max_size_bytes: Option<u64>) -> Self {
        let cache = match max_size_bytes {
            Some(limit) => MokaCache::builder()
                // moka weights are u32
                .weigher(|_key: &TileKey, value: &Bytes| -> u32 {
                    value.len().min(u32::MAX as usize) as u32
                })
                .max_capacity(limit)
                .build(),
            None => MokaCache::builder().build(),
        };

        Self {
            cache,
            max_size_bytes,
        }
    }

    pub fn unbounded() -> Self {
        Self::new(None)
    }

    pub fn bounded(max_size_bytes: u64) -> Self {
        Self::new(Some(max_size_bytes))
    }

    pub async fn get(&self, key: &TileKey) -> Option<Bytes> {
        self.cache.get(key).await
    }

    pub async fn insert(&self, key: TileKey, data: Bytes) {
        self.cache.insert(key, data).await;
    }

    pub async fn invalidate(&self, key: &TileKey) {
        self.cache.invalidate(key).await;
    }

    pub fn contains(&self, key: &TileKey) -> bool {
        self.cache.contains_key(key)
    }

    /// Drops every cached tile.
    pub fn invalidate_all(&self) {
        self.cache.invalidate_all();
    }

    /// Approximate entry count; call [`TileCache::sync`] first for an exact figure.
    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }

    /// Approximate weighted size in bytes (0 for an unbounded cache).
    pub fn size_bytes(&self) -> u64 {
        self.cache.weighted_size()
    }

    pub fn max_size_bytes(&self) -> Option<u64> {
        self.max_size_bytes
    }

    /// Runs pending maintenance (eviction, invalidation, counters).
    pub async fn sync(&self) {
        self.cache.run_pending_tasks().await;
    }
}

impl Default for TileCache {
    fn default() -> Self {
        Self::unbounded()
    }
}

impl std::fmt::Debug for TileCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TileCache")
            .field("entries", &self.cache.entry_count())
            .field("max_size_bytes", &self.max_size_bytes)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(x: u32) -> TileKey {
        TileKey::new("test", 5, x, 7)
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let cache = TileCache::unbounded();
        assert!(cache.get(&key(1)).await.is_none());

        cache.insert(key(1), Bytes::from_static(b"tile")).await;
        assert_eq!(cache.get(&key(1)).await, Some(Bytes::from_static(b"tile")));
        assert!(cache.contains(&key(1)));
        assert!(!cache.contains(&key(2)));
    }

    #[tokio::test]
    async fn test_entry_count_after_sync() {
        let cache = TileCache::unbounded();
        for x in 0..10 {
            cache.insert(key(x), Bytes::from(vec![0u8; 16])).await;
        }
        cache.sync().await;
        assert_eq!(cache.entry_count(), 10);
    }

    #[tokio::test]
    async fn test_invalidate_all() {
        let cache = TileCache::unbounded();
        cache.insert(key(1), Bytes::from_static(b"a")).await;
        cache.insert(key(2), Bytes::from_static(b"b")).await;

        cache.invalidate_all();
        cache.sync().await;

        assert!(cache.get(&key(1)).await.is_none());
        assert!(cache.get(&key(2)).await.is_none());
        assert_eq!(cache.entry_count(), 0);
    }

    #[tokio::test]
    async fn test_bounded_cache_evicts() {
        let cache = TileCache::bounded(1_000);
        for x in 0..20 {
            cache.insert(key(x), Bytes::from(vec![0u8; 100])).await;
        }
        cache.sync().await;

        assert!(cache.size_bytes() <= 1_000);
        assert!(cache.entry_count() <= 10);
        assert_eq!(cache.max_size_bytes(), Some(1_000));
    }

    #[tokio::test]
    async fn test_clones_share_storage() {
        let cache = TileCache::unbounded();
        let other = cache.clone();
        cache.insert(key(3), Bytes::from_static(b"shared")).await;
        assert!(other.get(&key(3)).await.is_some());
    }
}
