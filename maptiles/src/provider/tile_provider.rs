//! Caching, failover tile provider.
//!
//! Per tile key the lifecycle is `Absent → Fetching → Cached`, or
//! `Absent → Fetching → Absent` when every host fails (failures are never
//! cached, so a later request retries).
//!
//! The fetch itself runs on its own tokio task. A caller that loses interest
//! and drops its future does not stop the fetch; the tile still lands in the
//! cache and is broadcast to any other waiters.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use tracing::{debug, info, trace, warn};

use super::{AsyncHttpClient, BoxFuture, ProviderDescriptor, TileSource, UriTemplate};
use crate::geo::tiles_at_zoom;
use crate::tile::{
    await_outcome, CoalesceResult, CoalescerStats, FetchCoalescer, FetchOutcome, HostFailure,
    TileCache, TileError, TileKey,
};

/// One tile source with its own cache and in-flight fetch table.
pub struct TileProvider<C: AsyncHttpClient> {
    descriptor: ProviderDescriptor,
    id: Arc<str>,
    client: Arc<C>,
    templates: Arc<[UriTemplate]>,
    cache_enabled: Arc<AtomicBool>,
    cache: TileCache,
    coalescer: Arc<FetchCoalescer>,
}

impl<C: AsyncHttpClient> TileProvider<C> {
    /// Creates a provider with an unbounded tile cache.
    pub fn new(descriptor: ProviderDescriptor, client: Arc<C>) -> Result<Self, TileError> {
        Self::with_cache_capacity(descriptor, client, None)
    }

    /// Creates a provider whose cache holds at most `max_size_bytes` of tiles.
    ///
    /// `None` keeps every tile for the life of the provider.
    pub fn with_cache_capacity(
        descriptor: ProviderDescriptor,
        client: Arc<C>,
        max_size_bytes: Option<u64>,
    ) -> Result<Self, TileError> {
        descriptor.validate()?;

        info!(
            provider = %descriptor.id,
            hosts = descriptor.uri_templates.len(),
            min_zoom = descriptor.min_zoom,
            max_zoom = descriptor.max_zoom,
            cacheable = descriptor.memory_cacheable,
            "Tile provider created"
        );

        Ok(Self {
            id: Arc::from(descriptor.id.as_str()),
            templates: Arc::from(descriptor.uri_templates.clone()),
            cache_enabled: Arc::new(AtomicBool::new(descriptor.memory_cache_enabled)),
            cache: TileCache::new(max_size_bytes),
            coalescer: Arc::new(FetchCoalescer::new()),
            client,
            descriptor,
        })
    }

    pub fn descriptor(&self) -> &ProviderDescriptor {
        &self.descriptor
    }

    pub fn cache(&self) -> &TileCache {
        &self.cache
    }

    pub fn coalescer_stats(&self) -> CoalescerStats {
        self.coalescer.stats()
    }

    /// Number of fetches currently in flight.
    pub fn in_flight(&self) -> usize {
        self.coalescer.in_flight_count()
    }

    fn caching(&self) -> bool {
        self.descriptor.memory_cacheable && self.cache_enabled.load(Ordering::SeqCst)
    }

    fn validate(&self, zoom: u8, x: u32, y: u32) -> Result<TileKey, TileError> {
        if !self.descriptor.supports_zoom(zoom) {
            return Err(TileError::ZoomNotSupported {
                provider: self.descriptor.id.clone(),
                zoom,
                min: self.descriptor.min_zoom,
                max: self.descriptor.max_zoom,
            });
        }

        let tiles = tiles_at_zoom(zoom)?;
        if x >= tiles || y >= tiles {
            return Err(TileError::TileIndexOutOfRange { zoom, x, y, tiles });
        }

        Ok(TileKey::new(Arc::clone(&self.id), zoom, x, y))
    }

    /// Returns the tile at `zoom`/`x`/`y`.
    ///
    /// Cache hits return without suspending on I/O. On a miss, exactly one
    /// fetch per key runs at a time; concurrent callers for the same key
    /// share its outcome.
    ///
    /// # Errors
    ///
    /// - [`TileError::ZoomNotSupported`] outside the provider's zoom range
    /// - [`TileError::TileIndexOutOfRange`] if `x` or `y` is `>= 2^zoom`
    /// - [`TileError::TileFetchFailed`] when every host failed
    /// - [`TileError::FetchAborted`] if the fetch task died
    pub async fn get_tile(&self, zoom: u8, x: u32, y: u32) -> Result<Bytes, TileError> {
        let key = self.validate(zoom, x, y)?;
        let caching = self.caching();

        if caching {
            if let Some(bytes) = self.cache.get(&key).await {
                trace!(tile = %key, "Tile cache hit");
                return Ok(bytes);
            }
        }

        let guard = match self.coalescer.register(key.clone()) {
            CoalesceResult::Coalesced(rx) => return await_outcome(rx, &key).await,
            CoalesceResult::NewRequest(guard) => guard,
        };

        // A fetch may have completed between the lookup and registration
        if caching {
            if let Some(bytes) = self.cache.get(&key).await {
                guard.complete(Ok(bytes.clone()));
                return Ok(bytes);
            }
        }

        debug!(tile = %key, caching, "Tile cache miss - fetching");

        let task = FetchTask {
            client: Arc::clone(&self.client),
            templates: Arc::clone(&self.templates),
            cache: self.cache.clone(),
            cache_enabled: self
                .descriptor
                .memory_cacheable
                .then(|| Arc::clone(&self.cache_enabled)),
            key: key.clone(),
        };

        let handle = tokio::spawn(async move {
            let outcome = task.run().await;
            guard.complete(outcome.clone());
            outcome
        });

        match handle.await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(tile = %key, error = %e, "Fetch task failed");
                Err(TileError::FetchAborted(key))
            }
        }
    }

    pub fn set_memory_cache_enabled(&self, enabled: bool) {
        self.cache_enabled.store(enabled, Ordering::SeqCst);
        if !enabled {
            self.cache.invalidate_all();
        }
        debug!(
            provider = %self.id,
            enabled,
            effective = self.caching(),
            "Memory cache toggled"
        );
    }

    pub fn memory_cache_enabled(&self) -> bool {
        self.caching()
    }

    pub fn clear_cache(&self) {
        self.cache.invalidate_all();
        debug!(provider = %self.id, "Tile cache cleared");
    }
}

impl<C: AsyncHttpClient> TileSource for TileProvider<C> {
    fn descriptor(&self) -> &ProviderDescriptor {
        &self.descriptor
    }

    fn get_tile(&self, zoom: u8, x: u32, y: u32) -> BoxFuture<'_, Result<Bytes, TileError>> {
        Box::pin(Self::get_tile(self, zoom, x, y))
    }

    fn set_memory_cache_enabled(&self, enabled: bool) {
        Self::set_memory_cache_enabled(self, enabled)
    }

    fn memory_cache_enabled(&self) -> bool {
        self.caching()
    }

    fn cached_tiles(&self) -> u64 {
        self.cache.entry_count()
    }

    fn clear_cache(&self) {
        Self::clear_cache(self)
    }

    fn log_stats(&self) {
        self.coalescer.log_stats(&self.id)
    }
}

/// Owned state for one detached fetch.
struct FetchTask<C> {
    client: Arc<C>,
    templates: Arc<[UriTemplate]>,
    cache: TileCache,
    /// Provider's live cache toggle; `None` when the provider is not cacheable.
    cache_enabled: Option<Arc<AtomicBool>>,
    key: TileKey,
}

impl<C: AsyncHttpClient> FetchTask<C> {
    fn retaining(&self) -> bool {
        self.cache_enabled
            .as_ref()
            .is_some_and(|enabled| enabled.load(Ordering::SeqCst))
    }

    /// Caches `bytes` unless retention is off when the fetch lands.
    async fn retain(&self, bytes: Bytes) {
        if !self.retaining() {
            return;
        }
        self.cache.insert(self.key.clone(), bytes).await;

        // Disabled between the check and the insert; the invalidation may
        // have run before our entry existed
        if !self.retaining() {
            self.cache.invalidate(&self.key).await;
            trace!(tile = %self.key, "Dropped tile fetched while caching was disabled");
        }
    }

    /// Tries each host in order; the first success wins.
    async fn run(self) -> FetchOutcome {
        let mut failures = Vec::new();

        for (attempt, template) in self.templates.iter().enumerate() {
            let url = template.expand(self.key.zoom, self.key.x, self.key.y);

            match self.client.get(&url).await {
                Ok(bytes) => {
                    debug!(
                        tile = %self.key,
                        url = %url,
                        attempt,
                        bytes = bytes.len(),
                        "Tile fetched"
                    );
                    self.retain(bytes.clone()).await;
                    return Ok(bytes);
                }
                Err(e) => {
                    warn!(
                        tile = %self.key,
                        url = %url,
                        attempt,
                        error = %e,
                        "Tile host failed"
                    );
                    failures.push(HostFailure {
                        url,
                        error: e.to_string(),
                    });
                }
            }
        }

        Err(TileError::TileFetchFailed {
            key: self.key,
            failures,
        })
    }
}
