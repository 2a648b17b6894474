//! Dyn-compatible tile source interface.
//!
//! [`TileClient`](crate::client::TileClient) stores providers behind
//! `Arc<dyn TileSource>`, so the trait returns boxed futures instead of
//! using `async fn`.

use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;

use super::ProviderDescriptor;
use crate::tile::TileError;

/// Boxed future returned by dyn-compatible async methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A provider of map tiles.
pub trait TileSource: Send + Sync {
    /// Registration record of this source.
    fn descriptor(&self) -> &ProviderDescriptor;

    fn id(&self) -> &str {
        &self.descriptor().id
    }

    /// Returns the tile at `zoom`/`x`/`y`, fetching it on a cache miss.
    fn get_tile(&self, zoom: u8, x: u32, y: u32) -> BoxFuture<'_, Result<Bytes, TileError>>;

    /// Toggles tile retention. Ignored when the source is not cacheable.
    fn set_memory_cache_enabled(&self, enabled: bool);

    /// Whether fetched tiles are currently retained.
    fn memory_cache_enabled(&self) -> bool;

    /// Approximate number of retained tiles.
    fn cached_tiles(&self) -> u64;

    /// Drops every retained tile of this source.
    fn clear_cache(&self);

    /// Logs fetch statistics.
    fn log_stats(&self);
}
