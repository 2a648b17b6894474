//! Provider registry and tile entry point.
//!
//! Providers are registered explicitly at startup. The registry is
//! read-mostly, so a `parking_lot::RwLock` guards it; the lock is never held
//! across an await.

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use futures::stream::{FuturesUnordered, StreamExt};
use parking_lot::RwLock;
use tokio::sync::oneshot;
use tracing::{debug, info};

use crate::geo::{tiles_covering, validate_zoom, GeoBoundingBox};
use crate::provider::{AsyncHttpClient, ProviderDescriptor, TileProvider, TileSource};
use crate::tile::{Generation, TileError};

/// An asynchronous tile request tagged with the view generation that issued it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileRequest {
    pub provider_id: String,
    pub zoom: u32,
    pub x: u32,
    pub y: u32,
    pub generation: Generation,
}

impl TileRequest {
    pub fn new(
        provider_id: impl Into<String>,
        zoom: u32,
        x: u32,
        y: u32,
        generation: Generation,
    ) -> Self {
        Self {
            provider_id: provider_id.into(),
            zoom,
            x,
            y,
            generation,
        }
    }
}

/// Outcome of a dispatched [`TileRequest`].
#[derive(Debug, Clone)]
pub struct TileDelivery {
    pub request: TileRequest,
    pub result: Result<Bytes, TileError>,
}

/// Outcome counts of [`TileClient::prefetch`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PrefetchSummary {
    pub requested: u64,
    pub fetched: u64,
    pub failed: u64,
}

#[derive(Default)]
struct Registry {
    providers: HashMap<String, Arc<dyn TileSource>>,
    order: Vec<String>,
    current: Option<String>,
}

/// Name → provider registry.
#[derive(Default)]
pub struct TileClient {
    registry: RwLock<Registry>,
}

impl TileClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a provider under its descriptor id.
    ///
    /// With `activate`, or when no provider is current yet, it becomes the
    /// current provider.
    ///
    /// # Errors
    ///
    /// [`TileError::DuplicateProviderId`] if the id is taken.
    pub fn register(&self, source: Arc<dyn TileSource>, activate: bool) -> Result<(), TileError> {
        let id = source.id().to_string();
        let mut registry = self.registry.write();

        if registry.providers.contains_key(&id) {
            return Err(TileError::DuplicateProviderId(id));
        }

        registry.providers.insert(id.clone(), source);
        registry.order.push(id.clone());
        if activate || registry.current.is_none() {
            registry.current = Some(id.clone());
        }

        let current = registry.current.as_deref() == Some(id.as_str());
        info!(provider = %id, current, "Registered tile provider");
        Ok(())
    }

    /// Convenience wrapper around [`TileClient::register`].
    pub fn register_provider<C: AsyncHttpClient>(
        &self,
        provider: TileProvider<C>,
        activate: bool,
    ) -> Result<(), TileError> {
        self.register(Arc::new(provider), activate)
    }

    pub fn provider(&self, id: &str) -> Result<Arc<dyn TileSource>, TileError> {
        self.registry
            .read()
            .providers
            .get(id)
            .cloned()
            .ok_or_else(|| TileError::UnknownProvider(id.to_string()))
    }

    /// Descriptors in registration order.
    pub fn providers(&self) -> Vec<ProviderDescriptor> {
        let registry = self.registry.read();
        registry
            .order
            .iter()
            .filter_map(|id| registry.providers.get(id))
            .map(|p| p.descriptor().clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.registry.read().providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn current_provider_id(&self) -> Option<String> {
        self.registry.read().current.clone()
    }

    pub fn current_provider(&self) -> Option<Arc<dyn TileSource>> {
        let registry = self.registry.read();
        registry
            .current
            .as_ref()
            .and_then(|id| registry.providers.get(id))
            .cloned()
    }

    /// Selects the current provider. Other providers keep their caches.
    pub fn set_current(&self, id: &str) -> Result<(), TileError> {
        let mut registry = self.registry.write();
        if !registry.providers.contains_key(id) {
            return Err(TileError::UnknownProvider(id.to_string()));
        }
        registry.current = Some(id.to_string());
        debug!(provider = id, "Current provider changed");
        Ok(())
    }

    /// Returns a tile from the named provider.
    ///
    /// # Errors
    ///
    /// - [`TileError::UnknownProvider`] if `provider_id` is not registered
    /// - [`TileError::ZoomOutOfRange`] if `zoom > 23`
    /// - anything [`TileProvider::get_tile`] reports
    pub async fn get_tile(
        &self,
        provider_id: &str,
        zoom: u32,
        x: u32,
        y: u32,
    ) -> Result<Bytes, TileError> {
        let provider = self.provider(provider_id)?;
        let zoom = validate_zoom(zoom)?;
        provider.get_tile(zoom, x, y).await
    }

    /// Logs fetch statistics of every provider, in registration order.
    pub fn log_stats(&self) {
        let registry = self.registry.read();
        for provider in registry.order.iter().filter_map(|id| registry.providers.get(id)) {
            provider.log_stats();
        }
    }

    /// Fetches a tile on a background task and delivers it on a channel.
    ///
    /// Dropping the receiver does not cancel the fetch. Must be called from
    /// within a tokio runtime.
    pub fn dispatch(&self, request: TileRequest) -> oneshot::Receiver<TileDelivery> {
        let (tx, rx) = oneshot::channel();
        let provider = self.provider(&request.provider_id);

        tokio::spawn(async move {
            let result = match provider {
                Ok(provider) => match validate_zoom(request.zoom) {
                    Ok(zoom) => provider.get_tile(zoom, request.x, request.y).await,
                    Err(e) => Err(e.into()),
                },
                Err(e) => Err(e),
            };
            // Receiver may have moved on
            let _ = tx.send(TileDelivery { request, result });
        });

        rx
    }

    /// Warms a provider's cache with every tile covering `bbox` at `zoom`.
    ///
    /// At most `max_concurrent` fetches are outstanding; a new one is
    /// submitted as each completes. Per-tile failures are counted, not returned.
    ///
    /// # Errors
    ///
    /// Unknown provider, zoom above 23 or outside the provider's range.
    pub async fn prefetch(
        &self,
        provider_id: &str,
        bbox: &GeoBoundingBox,
        zoom: u32,
        max_concurrent: usize,
    ) -> Result<PrefetchSummary, TileError> {
        let provider = self.provider(provider_id)?;
        let zoom = validate_zoom(zoom)?;
        let descriptor = provider.descriptor();
        if !descriptor.supports_zoom(zoom) {
            return Err(TileError::ZoomNotSupported {
                provider: descriptor.id.clone(),
                zoom,
                min: descriptor.min_zoom,
                max: descriptor.max_zoom,
            });
        }

        let mut tiles = tiles_covering(bbox, zoom)?;
        let mut summary = PrefetchSummary {
            requested: tiles.tile_count(),
            ..Default::default()
        };
        info!(provider = provider_id, zoom, tiles = summary.requested, "Prefetching area");

        let mut pending = FuturesUnordered::new();
        for (x, y) in tiles.by_ref().take(max_concurrent.max(1)) {
            pending.push(provider.get_tile(zoom, x, y));
        }

        while let Some(result) = pending.next().await {
            match result {
                Ok(_) => summary.fetched += 1,
                Err(e) => {
                    debug!(provider = provider_id, error = %e, "Prefetch tile failed");
                    summary.failed += 1;
                }
            }
            if let Some((x, y)) = tiles.next() {
                pending.push(provider.get_tile(zoom, x, y));
            }
        }

        info!(
            provider = provider_id,
            fetched = summary.fetched,
            failed = summary.failed,
            "Prefetch complete"
        );
        Ok(summary)
    }
}

impl std::fmt::Debug for TileClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let registry = self.registry.read();
        f.debug_struct("TileClient")
            .field("providers", &registry.order)
            .field("current", &registry.current)
            .finish()
    }
}
