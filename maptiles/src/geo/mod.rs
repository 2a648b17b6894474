//! Geographic coordinate module
//!
//! Provides the geographic value types ([`GeoCoordinate`], [`GeoBoundingBox`])
//! and conversions between latitude/longitude and the Web Mercator pixel and
//! tile grids used by tile providers.

mod bbox;
mod coordinate;
mod projection;

pub use bbox::GeoBoundingBox;
pub use coordinate::{normalize_longitude, GeoCoordinate, EARTH_RADIUS_KM};
pub use projection::{
    screen_to_geo, tile_bounds, tile_index_for, tiles_at_zoom, tiles_covering, validate_zoom,
    world_pixel, ScreenXY, TileRange, WorldPixel, MAX_LATITUDE, MAX_ZOOM, MIN_ZOOM, TILE_SIZE,
};

use thiserror::Error;

/// Errors produced by coordinate construction and projection.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeoError {
    /// Latitude at or beyond the poles, where Mercator is undefined.
    #[error("Latitude {0} is outside the Web Mercator projection range")]
    OutOfProjectionRange(f64),

    /// Zoom level outside 0-23.
    #[error("Zoom level {0} outside supported range 0-23")]
    ZoomOutOfRange(u32),

    /// Tile index outside `[0, 2^zoom)` on either axis.
    #[error("Tile ({x}, {y}) outside the {tiles}x{tiles} grid at zoom {zoom}")]
    TileIndexOutOfRange { zoom: u8, x: u32, y: u32, tiles: u32 },

    /// Bounding box whose minimum exceeds its maximum on either axis.
    #[error(
        "Invalid bounds: min ({min_lat}, {min_lon}) exceeds max ({max_lat}, {max_lon})"
    )]
    InvalidBounds {
        min_lat: f64,
        min_lon: f64,
        max_lat: f64,
        max_lon: f64,
    },

    /// Latitude outside [-90, 90] or a non-finite component.
    #[error("Invalid coordinate: latitude {latitude}, longitude {longitude}")]
    InvalidCoordinate { latitude: f64, longitude: f64 },
}
