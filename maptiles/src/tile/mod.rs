//! Tile addressing, caching and fetch coordination.
//!
//! # Architecture
//!
//! ```text
//! get_tile(zoom, x, y)
//!        │
//!        ▼
//!   ┌──────────┐   hit
//!   │TileCache │──────────► bytes
//!   └────┬─────┘
//!        │ miss
//!        ▼
//!   ┌──────────────┐  coalesced
//!   │FetchCoalescer│────────────► wait for leader's result
//!   └────┬─────────┘
//!        │ new
//!        ▼
//!   spawned fetch task ──► host failover ──► cache insert ──► broadcast
//! ```

mod cache;
mod coalesce;
mod generation;

pub use cache::TileCache;
pub(crate) use coalesce::await_outcome;
pub use coalesce::{CoalesceResult, CoalescerStats, FetchCoalescer, FetchOutcome, InFlightGuard};
pub use generation::{Generation, GenerationFilter, RequestGenerations};

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::geo::GeoError;

/// Unique address of a tile within the cache.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TileKey {
    pub provider_id: Arc<str>,
    pub zoom: u8,
    pub x: u32,
    pub y: u32,
}

impl TileKey {
    pub fn new(provider_id: impl Into<Arc<str>>, zoom: u8, x: u32, y: u32) -> Self {
        Self {
            provider_id: provider_id.into(),
            zoom,
            x,
            y,
        }
    }
}

impl fmt::Display for TileKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}/{}", self.provider_id, self.zoom, self.x, self.y)
    }
}

/// One failed attempt against a single host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostFailure {
    pub url: String,
    pub error: String,
}

impl fmt::Display for HostFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.url, self.error)
    }
}

fn last_failure(failures: &[HostFailure]) -> String {
    failures
        .last()
        .map(|f| f.to_string())
        .unwrap_or_else(|| "no hosts attempted".to_string())
}

/// Errors from tile lookup and retrieval.
///
/// Cloneable so a single fetch outcome can be shared by every coalesced caller.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TileError {
    /// Zoom outside the global 0-23 range.
    #[error("Zoom level {0} outside supported range 0-23")]
    ZoomOutOfRange(u32),

    /// Zoom outside the provider's configured range.
    #[error("Zoom level {zoom} not supported by provider '{provider}' (range {min}-{max})")]
    ZoomNotSupported {
        provider: String,
        zoom: u8,
        min: u8,
        max: u8,
    },

    /// x or y outside `[0, 2^zoom)`.
    #[error("Tile ({x}, {y}) out of range at zoom {zoom} ({tiles} tiles per axis)")]
    TileIndexOutOfRange { zoom: u8, x: u32, y: u32, tiles: u32 },

    /// Every configured host failed.
    #[error("Failed to fetch tile {key} from {} host(s): {}", .failures.len(), last_failure(.failures))]
    TileFetchFailed {
        key: TileKey,
        failures: Vec<HostFailure>,
    },

    /// No provider registered under this id.
    #[error("Unknown provider '{0}'")]
    UnknownProvider(String),

    /// A provider with this id is already registered.
    #[error("Provider '{0}' is already registered")]
    DuplicateProviderId(String),

    /// The fetch task ended without publishing a result.
    #[error("Fetch for tile {0} ended without a result")]
    FetchAborted(TileKey),

    /// Provider configured without any URI template.
    #[error("Provider '{0}' has no URI templates")]
    NoTemplates(String),

    /// URI template missing a `{zoom}`, `{x}` or `{y}` placeholder.
    #[error("URI template '{0}' must contain {{zoom}}, {{x}} and {{y}}")]
    InvalidTemplate(String),

    /// Provider zoom range with `min > max`.
    #[error("Provider '{provider}' has invalid zoom range {min}-{max}")]
    InvalidZoomRange { provider: String, min: u8, max: u8 },

    /// Any other projection failure.
    #[error(transparent)]
    Geo(GeoError),
}

impl From<GeoError> for TileError {
    fn from(e: GeoError) -> Self {
        match e {
            GeoError::ZoomOutOfRange(zoom) => TileError::ZoomOutOfRange(zoom),
            GeoError::TileIndexOutOfRange { zoom, x, y, tiles } => {
                TileError::TileIndexOutOfRange { zoom, x, y, tiles }
            }
            other => TileError::Geo(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tile_key_display() {
        let key = TileKey::new("osm", 12, 2200, 1343);
        assert_eq!(key.to_string(), "osm/12/2200/1343");
    }

    #[test]
    fn test_tile_key_equality_includes_provider() {
        assert_eq!(TileKey::new("a", 1, 0, 0), TileKey::new("a", 1, 0, 0));
        assert_ne!(TileKey::new("a", 1, 0, 0), TileKey::new("b", 1, 0, 0));
    }

    #[test]
    fn test_fetch_failed_reports_last_error() {
        let err = TileError::TileFetchFailed {
            key: TileKey::new("osm", 3, 1, 2),
            failures: vec![
                HostFailure {
                    url: "http://a/3/1/2".to_string(),
                    error: "timeout".to_string(),
                },
                HostFailure {
                    url: "http://b/3/1/2".to_string(),
                    error: "HTTP 503".to_string(),
                },
            ],
        };
        let msg = err.to_string();
        assert!(msg.contains("osm/3/1/2"));
        assert!(msg.contains("2 host(s)"));
        assert!(msg.contains("http://b/3/1/2: HTTP 503"));
    }

    #[test]
    fn test_from_geo_error() {
        let err: TileError = GeoError::ZoomOutOfRange(30).into();
        assert_eq!(err, TileError::ZoomOutOfRange(30));

        let err: TileError = GeoError::TileIndexOutOfRange {
            zoom: 2,
            x: 4,
            y: 0,
            tiles: 4,
        }
        .into();
        assert!(matches!(err, TileError::TileIndexOutOfRange { x: 4, .. }));
    }

    #[test]
    fn test_invalid_template_message() {
        let err = TileError::InvalidTemplate("http://x/{z}".to_string());
        assert!(err.to_string().contains("{zoom}"));
    }
}
