//! Geographic coordinate value type and great-circle helpers.

use serde::Serialize;

use super::GeoError;

/// Mean Earth radius in kilometres used for great-circle distances.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// A point on the Earth's surface in decimal degrees.
///
/// Latitude is always within [-90, 90]; longitude is wrapped into
/// [-180, 180] on construction rather than rejected. Equality is exact.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GeoCoordinate {
    latitude: f64,
    longitude: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    altitude: Option<f64>,
}

impl GeoCoordinate {
    /// Creates a coordinate, wrapping longitude into [-180, 180].
    ///
    /// # Errors
    ///
    /// Returns [`GeoError::InvalidCoordinate`] if latitude is outside
    /// [-90, 90] or either component is not finite.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, GeoError> {
        if !latitude.is_finite() || !longitude.is_finite() || !(-90.0..=90.0).contains(&latitude)
        {
            return Err(GeoError::InvalidCoordinate {
                latitude,
                longitude,
            });
        }

        Ok(Self {
            latitude,
            longitude: normalize_longitude(longitude),
            altitude: None,
        })
    }

    /// Returns a copy of this coordinate carrying an altitude in metres.
    pub fn with_altitude(mut self, altitude: f64) -> Self {
        self.altitude = Some(altitude);
        self
    }

    /// Latitude in degrees.
    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    /// Longitude in degrees.
    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Altitude in metres, if known.
    pub fn altitude(&self) -> Option<f64> {
        self.altitude
    }

    /// Great-circle distance to `other` in kilometres (haversine).
    pub fn distance_to(&self, other: &GeoCoordinate) -> f64 {
        let lat1 = self.latitude.to_radians();
        let lat2 = other.latitude.to_radians();
        let d_lat = lat2 - lat1;
        let d_lon = (other.longitude - self.longitude).to_radians();

        let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_KM * a.sqrt().asin()
    }

    /// Midpoint along the great circle between this coordinate and `other`.
    pub fn midpoint(&self, other: &GeoCoordinate) -> GeoCoordinate {
        let lat1 = self.latitude.to_radians();
        let lon1 = self.longitude.to_radians();
        let lat2 = other.latitude.to_radians();
        let d_lon = (other.longitude - self.longitude).to_radians();

        let bx = lat2.cos() * d_lon.cos();
        let by = lat2.cos() * d_lon.sin();

        let lat = (lat1.sin() + lat2.sin()).atan2(((lat1.cos() + bx).powi(2) + by * by).sqrt());
        let lon = lon1 + by.atan2(lat1.cos() + bx);

        GeoCoordinate {
            latitude: lat.to_degrees(),
            longitude: normalize_longitude(lon.to_degrees()),
            altitude: None,
        }
    }

    /// Initial bearing from this coordinate towards `other`, in degrees [0, 360).
    pub fn bearing_to(&self, other: &GeoCoordinate) -> f64 {
        let lat1 = self.latitude.to_radians();
        let lat2 = other.latitude.to_radians();
        let d_lon = (other.longitude - self.longitude).to_radians();

        let y = d_lon.sin() * lat2.cos();
        let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * d_lon.cos();

        (y.atan2(x).to_degrees() + 360.0) % 360.0
    }
}

/// Wraps a longitude into [-180, 180].
///
/// Values already in range are returned unchanged, so both -180 and 180
/// survive as given.
pub fn normalize_longitude(longitude: f64) -> f64 {
    if (-180.0..=180.0).contains(&longitude) {
        longitude
    } else {
        (longitude + 180.0).rem_euclid(360.0) - 180.0
    }
}
