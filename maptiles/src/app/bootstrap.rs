//! Tile client construction from configuration.

use std::sync::Arc;

use tracing::info;

use super::AppError;
use crate::client::TileClient;
use crate::config::{format_size, ConfigFile};
use crate::provider::{AsyncHttpClient, ReqwestClient, TileProvider};

/// Builds a tile client using a reqwest HTTP client.
pub fn bootstrap_client(config: &ConfigFile) -> Result<TileClient, AppError> {
    let http = Arc::new(ReqwestClient::with_timeout(config.cache.timeout)?);
    bootstrap_client_with(config, http)
}

/// Builds a tile client on top of the given HTTP client.
pub fn bootstrap_client_with<C: AsyncHttpClient>(
    config: &ConfigFile,
    http: Arc<C>,
) -> Result<TileClient, AppError> {
    let client = TileClient::new();

    for settings in &config.providers {
        let provider = TileProvider::with_cache_capacity(
            settings.descriptor.clone(),
            Arc::clone(&http),
            config.cache.memory_size,
        )?;
        client.register_provider(provider, settings.default)?;
    }

    let current = client.current_provider_id().unwrap_or_default();
    let cache = config
        .cache
        .memory_size
        .map(format_size)
        .unwrap_or_else(|| "unbounded".to_string());
    info!(
        providers = client.len(),
        current = %current,
        cache = %cache,
        "Tile client ready"
    );

    Ok(client)
}
