//! Axis-aligned geographic bounding box.

use serde::Serialize;

use super::{GeoCoordinate, GeoError};

/// A latitude/longitude rectangle with `min <= max` on both axes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GeoBoundingBox {
    min: GeoCoordinate,
    max: GeoCoordinate,
}

impl GeoBoundingBox {
    /// Creates a bounding box from its south-west and north-east corners.
    ///
    /// # Errors
    ///
    /// Returns [`GeoError::InvalidBounds`] if `min` exceeds `max` on either axis.
    pub fn new(min: GeoCoordinate, max: GeoCoordinate) -> Result<Self, GeoError> {
        if min.latitude() > max.latitude() || min.longitude() > max.longitude() {
            return Err(GeoError::InvalidBounds {
                min_lat: min.latitude(),
                min_lon: min.longitude(),
                max_lat: max.latitude(),
                max_lon: max.longitude(),
            });
        }
        Ok(Self { min, max })
    }

    /// Smallest box enclosing every coordinate, or `None` for an empty input.
    pub fn from_coordinates<'a, I>(coords: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a GeoCoordinate>,
    {
        let mut iter = coords.into_iter();
        let first = iter.next()?;
        let (mut min_lat, mut min_lon) = (first.latitude(), first.longitude());
        let (mut max_lat, mut max_lon) = (min_lat, min_lon);

        for c in iter {
            min_lat = min_lat.min(c.latitude());
            min_lon = min_lon.min(c.longitude());
            max_lat = max_lat.max(c.latitude());
            max_lon = max_lon.max(c.longitude());
        }

        // Components come from valid coordinates, so construction cannot fail.
        let min = GeoCoordinate::new(min_lat, min_lon).ok()?;
        let max = GeoCoordinate::new(max_lat, max_lon).ok()?;
        Some(Self { min, max })
    }

    /// South-west corner.
    pub fn min(&self) -> GeoCoordinate {
        self.min
    }

    /// North-east corner.
    pub fn max(&self) -> GeoCoordinate {
        self.max
    }

    /// Whether `coord` lies inside or on the edge of this box.
    pub fn contains(&self, coord: &GeoCoordinate) -> bool {
        (self.min.latitude()..=self.max.latitude()).contains(&coord.latitude())
            && (self.min.longitude()..=self.max.longitude()).contains(&coord.longitude())
    }

    /// Arithmetic centre of the box.
    pub fn center(&self) -> GeoCoordinate {
        let lat = (self.min.latitude() + self.max.latitude()) / 2.0;
        let lon = (self.min.longitude() + self.max.longitude()) / 2.0;
        // The mean of two in-range values is in range.
        GeoCoordinate::new(lat, lon).unwrap_or(self.min)
    }

    /// Smallest box enclosing both `self` and `other`.
    pub fn union(&self, other: &GeoBoundingBox) -> GeoBoundingBox {
        let corners = [self.min, self.max, other.min, other.max];
        Self::from_coordinates(corners.iter()).unwrap_or(*self)
    }
}
