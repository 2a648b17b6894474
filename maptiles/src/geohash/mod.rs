//! GeoHash encoding and decoding.
//!
//! A GeoHash is built by repeatedly halving the latitude and longitude
//! ranges and recording which half the coordinate falls in. Longer hashes
//! name smaller cells, and a hash is always a prefix of the hashes of the
//! cells it contains.
//!
//! Three representations are supported:
//!
//! | Form       | Bits per step | Axis order      | Precision counts        |
//! |------------|---------------|-----------------|-------------------------|
//! | Base-32    | 5 per char    | longitude first | characters (1-24)       |
//! | Packed u32 | 2 per pair    | latitude first  | bit pairs (1-16)        |
//! | Packed u64 | 2 per pair    | latitude first  | bit pairs (1-32)        |
//!
//! Packed values are left-aligned: the first bisection lands in the most
//! significant bit, so numeric order follows cell order.
//!
//! Precision is not embedded in the packed forms. Decoding with a different
//! precision than was used to encode yields a different cell; callers must
//! carry the precision alongside the value ([`GeoHash`] does this).

use thiserror::Error;

use crate::geo::{normalize_longitude, GeoBoundingBox, GeoCoordinate, GeoError};

/// Base-32 alphabet (no `a`, `i`, `l`, `o`).
pub const BASE32_ALPHABET: &[u8; 32] = b"0123456789bcdefghjkmnpqrstuvwxyz";

/// Longest supported base-32 hash.
pub const MAX_STRING_PRECISION: usize = 24;

/// Most bit pairs that fit in a `u32`.
pub const MAX_U32_PRECISION: u8 = 16;

/// Most bit pairs that fit in a `u64`.
pub const MAX_U64_PRECISION: u8 = 32;

/// GeoHash errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeoHashError {
    /// A character outside the base-32 alphabet.
    #[error("Invalid GeoHash character '{character}' at position {position}")]
    InvalidCharacter { character: char, position: usize },

    /// Precision of zero or beyond what the representation holds.
    #[error("GeoHash precision {precision} outside supported range 1-{max}")]
    PrecisionOutOfRange { precision: usize, max: usize },

    /// Decoded cell could not be expressed as a coordinate.
    #[error("Decoded GeoHash cell is invalid: {0}")]
    Geo(#[from] GeoError),
}

/// Compass direction for [`neighbor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    North,
    South,
    East,
    West,
}

/// A hash value paired with the precision that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GeoHash {
    /// Base-32 text; precision is the string length.
    Base32(String),
    /// 32-bit packed hash with `precision` bit pairs.
    Packed32 { value: u32, precision: u8 },
    /// 64-bit packed hash with `precision` bit pairs.
    Packed64 { value: u64, precision: u8 },
}

impl GeoHash {
    /// Encodes a coordinate as base-32 text.
    pub fn base32(coord: &GeoCoordinate, precision: usize) -> Result<Self, GeoHashError> {
        encode(coord, precision).map(GeoHash::Base32)
    }

    /// Encodes a coordinate as a packed 32-bit value.
    pub fn packed32(coord: &GeoCoordinate, precision: u8) -> Result<Self, GeoHashError> {
        let value = encode_u32(coord, precision)?;
        Ok(GeoHash::Packed32 { value, precision })
    }

    /// Encodes a coordinate as a packed 64-bit value.
    pub fn packed64(coord: &GeoCoordinate, precision: u8) -> Result<Self, GeoHashError> {
        let value = encode_u64(coord, precision)?;
        Ok(GeoHash::Packed64 { value, precision })
    }

    /// Precision in the representation's own unit (characters or bit pairs).
    pub fn precision(&self) -> usize {
        match self {
            GeoHash::Base32(s) => s.len(),
            GeoHash::Packed32 { precision, .. } | GeoHash::Packed64 { precision, .. } => {
                *precision as usize
            }
        }
    }

    /// Centre of the cell this hash names.
    pub fn decode(&self) -> Result<GeoCoordinate, GeoHashError> {
        Ok(self.bounds()?.center())
    }

    /// The cell this hash names.
    pub fn bounds(&self) -> Result<GeoBoundingBox, GeoHashError> {
        match self {
            GeoHash::Base32(s) => decode_bounds(s),
            GeoHash::Packed32 { value, precision } => {
                check_precision(*precision as usize, MAX_U32_PRECISION as usize)?;
                let bits = 2 * *precision as u32;
                let cell = Cell::from_bits(
                    (*value as u64) >> (32 - bits),
                    bits,
                    Axis::Latitude,
                );
                cell.bounds()
            }
            GeoHash::Packed64 { value, precision } => {
                check_precision(*precision as usize, MAX_U64_PRECISION as usize)?;
                let bits = 2 * *precision as u32;
                let cell = Cell::from_bits(shift_right(*value, 64 - bits), bits, Axis::Latitude);
                cell.bounds()
            }
        }
    }
}

impl std::fmt::Display for GeoHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GeoHash::Base32(s) => write!(f, "{}", s),
            GeoHash::Packed32 { value, .. } => write!(f, "{}", value),
            GeoHash::Packed64 { value, .. } => write!(f, "{}", value),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    Latitude,
    Longitude,
}

impl Axis {
    fn other(self) -> Axis {
        match self {
            Axis::Latitude => Axis::Longitude,
            Axis::Longitude => Axis::Latitude,
        }
    }
}

/// A shrinking lat/lon cell driven one bisection at a time.
#[derive(Debug, Clone, Copy)]
struct Cell {
    lat: (f64, f64),
    lon: (f64, f64),
    next: Axis,
}

impl Cell {
    fn world(first: Axis) -> Self {
        Self {
            lat: (-90.0, 90.0),
            lon: (-180.0, 180.0),
            next: first,
        }
    }

    /// Bisects towards `coord` and returns the chosen half (1 = upper).
    fn bisect_towards(&mut self, coord: &GeoCoordinate) -> bool {
        let value = match self.next {
            Axis::Latitude => coord.latitude(),
            Axis::Longitude => coord.longitude(),
        };
        let range = self.range_mut();
        let mid = (range.0 + range.1) / 2.0;
        let upper = value >= mid;
        if upper {
            range.0 = mid;
        } else {
            range.1 = mid;
        }
        self.next = self.next.other();
        upper
    }

    /// Narrows to the half selected by `bit`.
    fn apply(&mut self, bit: bool) {
        let range = self.range_mut();
        let mid = (range.0 + range.1) / 2.0;
        if bit {
            range.0 = mid;
        } else {
            range.1 = mid;
        }
        self.next = self.next.other();
    }

    fn range_mut(&mut self) -> &mut (f64, f64) {
        match self.next {
            Axis::Latitude => &mut self.lat,
            Axis::Longitude => &mut self.lon,
        }
    }

    /// Replays the low `count` bits of `bits`, most significant first.
    fn from_bits(bits: u64, count: u32, first: Axis) -> Self {
        let mut cell = Cell::world(first);
        for i in (0..count).rev() {
            cell.apply((bits >> i) & 1 == 1);
        }
        cell
    }

    fn bounds(&self) -> Result<GeoBoundingBox, GeoHashError> {
        let min = GeoCoordinate::new(self.lat.0, self.lon.0)?;
        let max = GeoCoordinate::new(self.lat.1, self.lon.1)?;
        Ok(GeoBoundingBox::new(min, max)?)
    }
}

fn check_precision(precision: usize, max: usize) -> Result<(), GeoHashError> {
    if precision == 0 || precision > max {
        return Err(GeoHashError::PrecisionOutOfRange { precision, max });
    }
    Ok(())
}

fn shift_right(value: u64, shift: u32) -> u64 {
    value.checked_shr(shift).unwrap_or(0)
}

fn packed_bits(coord: &GeoCoordinate, bits: u32) -> u64 {
    let mut cell = Cell::world(Axis::Latitude);
    let mut value = 0u64;
    for _ in 0..bits {
        value = (value << 1) | cell.bisect_towards(coord) as u64;
    }
    value
}

/// Encodes a coordinate as a base-32 GeoHash of `precision` characters.
///
/// Longitude takes the first bit of every pair.
pub fn encode(coord: &GeoCoordinate, precision: usize) -> Result<String, GeoHashError> {
    check_precision(precision, MAX_STRING_PRECISION)?;

    let mut cell = Cell::world(Axis::Longitude);
    let mut hash = String::with_capacity(precision);
    for _ in 0..precision {
        let mut index = 0usize;
        for _ in 0..5 {
            index = (index << 1) | cell.bisect_towards(coord) as usize;
        }
        hash.push(BASE32_ALPHABET[index] as char);
    }
    Ok(hash)
}

/// Encodes a coordinate into the top `2 · precision` bits of a `u32`.
///
/// Latitude takes the first bit of every pair.
pub fn encode_u32(coord: &GeoCoordinate, precision: u8) -> Result<u32, GeoHashError> {
    check_precision(precision as usize, MAX_U32_PRECISION as usize)?;
    let bits = 2 * precision as u32;
    Ok((packed_bits(coord, bits) << (32 - bits)) as u32)
}

/// Encodes a coordinate into the top `2 · precision` bits of a `u64`.
///
/// Latitude takes the first bit of every pair.
pub fn encode_u64(coord: &GeoCoordinate, precision: u8) -> Result<u64, GeoHashError> {
    check_precision(precision as usize, MAX_U64_PRECISION as usize)?;
    let bits = 2 * precision as u32;
    Ok(packed_bits(coord, bits).checked_shl(64 - bits).unwrap_or(0))
}

/// Cell named by a base-32 hash.
pub fn decode_bounds(hash: &str) -> Result<GeoBoundingBox, GeoHashError> {
    check_precision(hash.len(), MAX_STRING_PRECISION)?;

    let mut cell = Cell::world(Axis::Longitude);
    for (position, character) in hash.chars().enumerate() {
        let index = BASE32_ALPHABET
            .iter()
            .position(|&b| b as char == character)
            .ok_or(GeoHashError::InvalidCharacter {
                character,
                position,
            })?;
        for i in (0..5).rev() {
            cell.apply((index >> i) & 1 == 1);
        }
    }
    cell.bounds()
}

/// Centre of the cell named by a base-32 hash.
pub fn decode(hash: &str) -> Result<GeoCoordinate, GeoHashError> {
    Ok(decode_bounds(hash)?.center())
}

/// Centre of the cell named by a packed `u32` at `precision` bit pairs.
pub fn decode_u32(value: u32, precision: u8) -> Result<GeoCoordinate, GeoHashError> {
    GeoHash::Packed32 { value, precision }.decode()
}

/// Centre of the cell named by a packed `u64` at `precision` bit pairs.
pub fn decode_u64(value: u64, precision: u8) -> Result<GeoCoordinate, GeoHashError> {
    GeoHash::Packed64 { value, precision }.decode()
}

/// Maximum (latitude, longitude) error in degrees of a decoded base-32 hash.
///
/// This is half the cell extent on each axis.
pub fn error_margin(precision: usize) -> (f64, f64) {
    let bits = 5 * precision as i32;
    let lat_bits = bits / 2;
    let lon_bits = bits - lat_bits;
    (90.0 / 2f64.powi(lat_bits), 180.0 / 2f64.powi(lon_bits))
}

/// Maximum (latitude, longitude) error in degrees of a decoded packed hash.
pub fn packed_error_margin(precision: u8) -> (f64, f64) {
    let bits = precision as i32;
    (90.0 / 2f64.powi(bits), 180.0 / 2f64.powi(bits))
}

/// Adjacent base-32 cell of the same precision.
///
/// Returns `None` when stepping north or south would leave the globe.
/// East and west wrap across the antimeridian.
pub fn neighbor(hash: &str, direction: Direction) -> Result<Option<String>, GeoHashError> {
    let cell = decode_bounds(hash)?;
    let center = cell.center();
    let height = cell.max().latitude() - cell.min().latitude();
    let width = cell.max().longitude() - cell.min().longitude();

    let (lat, lon) = match direction {
        Direction::North => (center.latitude() + height, center.longitude()),
        Direction::South => (center.latitude() - height, center.longitude()),
        Direction::East => (center.latitude(), center.longitude() + width),
        Direction::West => (center.latitude(), center.longitude() - width),
    };

    if !(-90.0..=90.0).contains(&lat) {
        return Ok(None);
    }

    let target = GeoCoordinate::new(lat, normalize_longitude(lon))?;
    encode(&target, hash.len()).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coord(lat: f64, lon: f64) -> GeoCoordinate {
        GeoCoordinate::new(lat, lon).unwrap()
    }

    #[test]
    fn test_encode_reference_vector_jutland() {
        let c = coord(57.64911, 10.40744);
        assert_eq!(encode(&c, 11).unwrap(), "u4pruydqqvj");
        assert_eq!(encode_u32(&c, 16).unwrap(), 3793206966);
        assert_eq!(encode_u64(&c, 32).unwrap(), 16291699867698975045);
    }

    #[test]
    fn test_encode_reference_vector_washington() {
        let c = coord(38.897, -77.036);
        assert_eq!(encode(&c, 20).unwrap(), "dqcjr0bp7n74cjbuqqub");
        assert_eq!(encode_u32(&c, 16).unwrap(), 2590713666);
        assert_eq!(encode_u64(&c, 32).unwrap(), 11127030471626460554);
    }

    #[test]
    fn test_shorter_hash_is_prefix() {
        let c = coord(57.64911, 10.40744);
        let long = encode(&c, 11).unwrap();
        for p in 1..11 {
            assert_eq!(encode(&c, p).unwrap(), long[..p]);
        }
    }

    #[test]
    fn test_packed_lower_precision_is_left_aligned_prefix() {
        let c = coord(38.897, -77.036);
        let full = encode_u32(&c, 16).unwrap();
        let coarse = encode_u32(&c, 8).unwrap();
        assert_eq!(coarse, full & 0xFFFF_0000);

        let full64 = encode_u64(&c, 32).unwrap();
        assert_eq!(encode_u64(&c, 16).unwrap() >> 32, full64 >> 32);
        assert_eq!(full64 >> 32, full as u64);
    }

    #[test]
    fn test_decode_reference_vector() {
        let decoded = decode("u4pruydqqvj").unwrap();
        let (lat_err, lon_err) = error_margin(11);
        assert!((decoded.latitude() - 57.64911).abs() <= lat_err);
        assert!((decoded.longitude() - 10.40744).abs() <= lon_err);
    }

    #[test]
    fn test_decode_packed_reference_vectors() {
        let decoded = decode_u32(3793206966, 16).unwrap();
        let (lat_err, lon_err) = packed_error_margin(16);
        assert!((decoded.latitude() - 57.64911).abs() <= lat_err);
        assert!((decoded.longitude() - 10.40744).abs() <= lon_err);

        let decoded = decode_u64(11127030471626460554, 32).unwrap();
        let (lat_err, lon_err) = packed_error_margin(32);
        assert!((decoded.latitude() - 38.897).abs() <= lat_err);
        assert!((decoded.longitude() - (-77.036)).abs() <= lon_err);
    }

    #[test]
    fn test_decode_invalid_character() {
        let result = decode("u4pa");
        assert_eq!(
            result,
            Err(GeoHashError::InvalidCharacter {
                character: 'a',
                position: 3
            })
        );
    }

    #[test]
    fn test_precision_out_of_range() {
        let c = coord(0.0, 0.0);
        assert!(matches!(
            encode(&c, 0),
            Err(GeoHashError::PrecisionOutOfRange { .. })
        ));
        assert!(matches!(
            encode_u32(&c, 17),
            Err(GeoHashError::PrecisionOutOfRange { precision: 17, max: 16 })
        ));
        assert!(matches!(
            encode_u64(&c, 33),
            Err(GeoHashError::PrecisionOutOfRange { .. })
        ));
        assert!(decode("").is_err());
    }

    #[test]
    fn test_geohash_value_carries_precision() {
        let c = coord(57.64911, 10.40744);
        let hash = GeoHash::packed32(&c, 16).unwrap();
        assert_eq!(hash.precision(), 16);
        assert_eq!(hash.to_string(), "3793206966");

        let text = GeoHash::base32(&c, 11).unwrap();
        assert_eq!(text.precision(), 11);
        assert!(text.bounds().unwrap().contains(&c));
    }

    #[test]
    fn test_error_margin_halves_with_each_bit() {
        let (lat1, lon1) = error_margin(1);
        assert_eq!((lat1, lon1), (22.5, 22.5));
        let (lat2, lon2) = error_margin(2);
        assert_eq!((lat2, lon2), (2.8125, 5.625));
    }

    #[test]
    fn test_neighbors() {
        assert_eq!(neighbor("u4pruyd", Direction::North).unwrap().as_deref(), Some("u4pruyf"));
        assert_eq!(neighbor("u4pruyd", Direction::South).unwrap().as_deref(), Some("u4pruy6"));
        assert_eq!(neighbor("u4pruyd", Direction::East).unwrap().as_deref(), Some("u4pruye"));
        assert_eq!(neighbor("u4pruyd", Direction::West).unwrap().as_deref(), Some("u4pruy9"));
    }

    #[test]
    fn test_neighbor_beyond_pole_is_none() {
        let top = encode(&coord(89.99, 0.0), 3).unwrap();
        assert_eq!(neighbor(&top, Direction::North).unwrap(), None);
    }

    #[test]
    fn test_neighbor_wraps_antimeridian() {
        let east_edge = encode(&coord(0.0, 179.99), 4).unwrap();
        let wrapped = neighbor(&east_edge, Direction::East).unwrap().unwrap();
        let center = decode(&wrapped).unwrap();
        assert!(center.longitude() < -179.0);
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn test_decode_within_cell_error(
                lat in -90.0f64..=90.0,
                lon in -180.0f64..=180.0,
                precision in 1usize..=12
            ) {
                let c = GeoCoordinate::new(lat, lon).unwrap();
                let decoded = decode(&encode(&c, precision).unwrap()).unwrap();
                let (lat_err, lon_err) = error_margin(precision);
                prop_assert!((decoded.latitude() - lat).abs() <= lat_err);
                prop_assert!((decoded.longitude() - lon).abs() <= lon_err);
            }

            #[test]
            fn test_packed_decode_within_cell_error(
                lat in -90.0f64..=90.0,
                lon in -180.0f64..=180.0,
                precision in 1u8..=MAX_U64_PRECISION
            ) {
                let c = GeoCoordinate::new(lat, lon).unwrap();
                let decoded = decode_u64(encode_u64(&c, precision).unwrap(), precision).unwrap();
                let (lat_err, lon_err) = packed_error_margin(precision);
                prop_assert!((decoded.latitude() - lat).abs() <= lat_err);
                prop_assert!((decoded.longitude() - lon).abs() <= lon_err);
            }

            #[test]
            fn test_string_and_packed_agree_on_order(
                lat1 in -89.0f64..89.0, lon1 in -179.0f64..179.0,
                lat2 in -89.0f64..89.0, lon2 in -179.0f64..179.0
            ) {
                let a = GeoCoordinate::new(lat1, lon1).unwrap();
                let b = GeoCoordinate::new(lat2, lon2).unwrap();
                let (a32, b32) = (encode_u32(&a, 16).unwrap(), encode_u32(&b, 16).unwrap());
                let (a64, b64) = (encode_u64(&a, 32).unwrap(), encode_u64(&b, 32).unwrap());
                // The 32-bit hash is the top half of the 64-bit one.
                prop_assert_eq!(a64 >> 32, a32 as u64);
                if a32 < b32 {
                    prop_assert!(a64 < b64);
                }
            }
        }
    }
}
