//! Spherical Web Mercator projection.
//!
//! Converts between geographic coordinates, world pixel space and tile
//! indices. Tiles are 256×256 pixels and the tile grid doubles on each axis
//! with every zoom level, so the world is `256 · 2^zoom` pixels square.
//!
//! # Coordinate System
//!
//! - X: pixel column, 0 at 180°W, increasing eastwards
//! - Y: pixel row, 0 at the northern projection limit, increasing southwards
//! - Zoom: 0 to 23

use std::f64::consts::PI;
use std::ops::Sub;

use serde::Serialize;

use super::{GeoBoundingBox, GeoCoordinate, GeoError};

/// Edge length of a tile in pixels.
pub const TILE_SIZE: u32 = 256;

/// Minimum zoom level.
pub const MIN_ZOOM: u8 = 0;

/// Maximum zoom level.
pub const MAX_ZOOM: u8 = 23;

/// Latitude at which the Mercator square world ends (±85.05112878°).
pub const MAX_LATITUDE: f64 = 85.05112878;

/// Integer pixel position at a specific zoom level.
///
/// Derived from a coordinate and a zoom level; recompute it whenever the
/// zoom changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct ScreenXY {
    pub x: i64,
    pub y: i64,
}

/// World pixel coordinates share the screen representation.
pub type WorldPixel = ScreenXY;

impl ScreenXY {
    pub fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }
}

impl Sub for ScreenXY {
    type Output = ScreenXY;

    fn sub(self, rhs: ScreenXY) -> ScreenXY {
        ScreenXY {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
        }
    }
}

/// Checks a zoom level against the global 0-23 range.
#[inline]
pub fn validate_zoom(zoom: u32) -> Result<u8, GeoError> {
    match u8::try_from(zoom) {
        Ok(z) if z <= MAX_ZOOM => Ok(z),
        _ => Err(GeoError::ZoomOutOfRange(zoom)),
    }
}

/// Number of tiles along each axis at `zoom` (`2^zoom`).
#[inline]
pub fn tiles_at_zoom(zoom: u8) -> Result<u32, GeoError> {
    let zoom = validate_zoom(zoom as u32)?;
    Ok(1u32 << zoom)
}

/// World size in pixels along one axis. Zoom must already be validated.
#[inline]
fn map_size(zoom: u8) -> f64 {
    ((TILE_SIZE as u64) << zoom) as f64
}

/// Projects a coordinate into world pixel space.
///
/// Pixel values are truncated towards zero and lie in `[0, 256 · 2^zoom)`.
/// Latitudes beyond the Mercator limit are clamped to it.
///
/// # Errors
///
/// - [`GeoError::OutOfProjectionRange`] if latitude is at or beyond ±90°
/// - [`GeoError::ZoomOutOfRange`] if zoom exceeds 23
#[inline]
pub fn world_pixel(coord: &GeoCoordinate, zoom: u8) -> Result<ScreenXY, GeoError> {
    let zoom = validate_zoom(zoom as u32)?;

    let lat = coord.latitude();
    if lat <= -90.0 || lat >= 90.0 {
        return Err(GeoError::OutOfProjectionRange(lat));
    }

    let size = map_size(zoom);
    let lat_rad = lat.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();

    let x = (coord.longitude() + 180.0) / 360.0 * size;
    let y = (0.5 - (PI / 4.0 + lat_rad / 2.0).tan().ln() / (2.0 * PI)) * size;

    Ok(ScreenXY {
        x: x.clamp(0.0, size - 1.0) as i64,
        y: y.clamp(0.0, size - 1.0) as i64,
    })
}

/// Converts a world pixel back to a coordinate (the pixel's north-west corner).
///
/// Pixels outside the world are clamped to its edge.
#[inline]
pub fn screen_to_geo(pixel: ScreenXY, zoom: u8) -> Result<GeoCoordinate, GeoError> {
    let zoom = validate_zoom(zoom as u32)?;
    let size = map_size(zoom);

    let x = (pixel.x as f64).clamp(0.0, size);
    let y = (pixel.y as f64).clamp(0.0, size);

    let lon = x / size * 360.0 - 180.0;
    let lat = (PI * (1.0 - 2.0 * y / size)).sinh().atan().to_degrees();

    GeoCoordinate::new(lat, lon)
}

/// Tile containing a world pixel.
#[inline]
pub fn tile_index_for(pixel: ScreenXY) -> (u32, u32) {
    let tile = TILE_SIZE as i64;
    ((pixel.x.max(0) / tile) as u32, (pixel.y.max(0) / tile) as u32)
}

/// Geographic extent of a single tile.
pub fn tile_bounds(zoom: u8, x: u32, y: u32) -> Result<GeoBoundingBox, GeoError> {
    let tiles = tiles_at_zoom(zoom)?;
    if x >= tiles || y >= tiles {
        return Err(GeoError::TileIndexOutOfRange { zoom, x, y, tiles });
    }

    let tile = TILE_SIZE as i64;
    let nw = screen_to_geo(ScreenXY::new(x as i64 * tile, y as i64 * tile), zoom)?;
    let se = screen_to_geo(
        ScreenXY::new((x as i64 + 1) * tile, (y as i64 + 1) * tile),
        zoom,
    )?;

    GeoBoundingBox::new(
        GeoCoordinate::new(se.latitude(), nw.longitude())?,
        GeoCoordinate::new(nw.latitude(), se.longitude())?,
    )
}

/// All tile indices intersecting a bounding box, row by row from the north-west.
///
/// The range is lazy; nothing is allocated per tile.
pub fn tiles_covering(bbox: &GeoBoundingBox, zoom: u8) -> Result<TileRange, GeoError> {
    let north = bbox.max().latitude().clamp(-MAX_LATITUDE, MAX_LATITUDE);
    let south = bbox.min().latitude().clamp(-MAX_LATITUDE, MAX_LATITUDE);

    let nw = world_pixel(&GeoCoordinate::new(north, bbox.min().longitude())?, zoom)?;
    let se = world_pixel(&GeoCoordinate::new(south, bbox.max().longitude())?, zoom)?;

    let (x0, y0) = tile_index_for(nw);
    let (x1, y1) = tile_index_for(se);

    Ok(TileRange::new(x0, y0, x1, y1))
}

/// Rectangular range of tile indices, iterated in row-major order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileRange {
    x0: u32,
    y0: u32,
    x1: u32,
    y1: u32,
    next: Option<(u32, u32)>,
}

impl TileRange {
    /// Inclusive range from `(x0, y0)` to `(x1, y1)`. Empty if inverted.
    pub fn new(x0: u32, y0: u32, x1: u32, y1: u32) -> Self {
        let next = (x0 <= x1 && y0 <= y1).then_some((x0, y0));
        Self {
            x0,
            y0,
            x1,
            y1,
            next,
        }
    }

    /// Number of tiles in the whole range, regardless of iteration progress.
    pub fn tile_count(&self) -> u64 {
        if self.x0 > self.x1 || self.y0 > self.y1 {
            return 0;
        }
        self.columns() * (u64::from(self.y1 - self.y0) + 1)
    }

    /// Tiles not yet yielded.
    pub fn remaining(&self) -> u64 {
        match self.next {
            None => 0,
            Some((x, y)) => {
                let rest_of_row = u64::from(self.x1 - x) + 1;
                rest_of_row + self.columns() * u64::from(self.y1 - y)
            }
        }
    }

    fn columns(&self) -> u64 {
        u64::from(self.x1 - self.x0) + 1
    }
}

impl Iterator for TileRange {
    type Item = (u32, u32);

    fn next(&mut self) -> Option<Self::Item> {
        let (x, y) = self.next?;

        self.next = if x < self.x1 {
            Some((x + 1, y))
        } else if y < self.y1 {
            Some((self.x0, y + 1))
        } else {
            None
        };

        Some((x, y))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.remaining();
        match usize::try_from(remaining) {
            Ok(n) => (n, Some(n)),
            Err(_) => (usize::MAX, None),
        }
    }
}
