//! MapTiles - map tile retrieval, caching and geographic encoding
//!
//! This library provides the core of a slippy-map client:
//!
//! - [`geo`]: geographic coordinates and the spherical Web Mercator projection
//!   used to move between latitude/longitude, world pixels and tile indices
//! - [`geohash`]: base-32 and packed-integer GeoHash encoding
//! - [`shape`]: compact `M x y L x y … Z` path encoding of polygons and
//!   polyfile ingestion
//! - [`provider`]: tile sources with an in-memory cache, multi-host failover
//!   and at-most-one-fetch-per-tile coalescing
//! - [`client`]: a registry of named providers behind a single `get_tile` entry point
//! - [`config`]: the `~/.maptiles/config.ini` file, turned into a client by [`app`]
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use maptiles::client::TileClient;
//! use maptiles::provider::{ProviderDescriptor, ReqwestClient, TileProvider};
//!
//! let http = Arc::new(ReqwestClient::new()?);
//! let client = TileClient::new();
//! client.register_provider(TileProvider::new(ProviderDescriptor::openstreetmap(), http)?, true)?;
//!
//! let png = client.get_tile("openstreetmap", 12, 2200, 1343).await?;
//! ```

pub mod app;
pub mod client;
pub mod config;
pub mod geo;
pub mod geohash;
pub mod logging;
pub mod provider;
#[cfg(feature = "server")]
pub mod server;
pub mod shape;
pub mod tile;
