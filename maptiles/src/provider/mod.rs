//! Tile source abstraction
//!
//! A provider is described by a [`ProviderDescriptor`] (id, hosts, zoom range,
//! cacheability) and served by a [`TileProvider`], which owns the tile cache
//! and the multi-host failover fetch.
//!
//! ```ignore
//! use std::sync::Arc;
//! use maptiles::provider::{ProviderDescriptor, ReqwestClient, TileProvider};
//!
//! let client = Arc::new(ReqwestClient::new()?);
//! let provider = TileProvider::new(ProviderDescriptor::openstreetmap(), client)?;
//! let png = provider.get_tile(12, 2200, 1343).await?;
//! ```

mod descriptor;
mod http;
mod source;
mod template;
mod tile_provider;

pub use descriptor::ProviderDescriptor;
pub use http::{AsyncHttpClient, HttpError, ReqwestClient, DEFAULT_TIMEOUT_SECS, DEFAULT_USER_AGENT};
pub use source::{BoxFuture, TileSource};
pub use template::UriTemplate;
pub use tile_provider::TileProvider;

#[cfg(test)]
pub use http::tests::MockHttpClient;
