//! Polygon path encoding.
//!
//! Shapes are rendered as compact move/line path strings in a zoom level's
//! pixel space:
//!
//! ```text
//! M x0 y0 L x1 y1 L x2 y2 … Z
//! ```
//!
//! Pixel values come from [`crate::geo::world_pixel`] (truncated to whole
//! pixels) minus an origin offset, so a path can be drawn directly on a
//! canvas whose top-left corner sits at that origin.
//!
//! Polygon datasets are ingested from polyfiles ([`Polyfile`]) and turned
//! into one path per zoom level ([`ShapeInfo`]).

mod info;
mod path;
mod polyfile;

pub use info::ShapeInfo;
pub use path::{encode_path, encode_shapes, parse_path, project_points, PathCommand};
pub use polyfile::{PolyShape, Polyfile};

use thiserror::Error;

use crate::geo::GeoError;

/// Errors from shape encoding and polyfile ingestion.
#[derive(Debug, Error)]
pub enum ShapeError {
    /// Path encoding requested on zero coordinates.
    #[error("Cannot encode an empty geometry")]
    EmptyGeometry,

    /// Polyfile line that is neither a shape number, `END`, nor a coordinate pair.
    #[error("Unknown line format at line {line_number}: '{line}'")]
    UnknownLineFormat { line_number: usize, line: String },

    /// Coordinate line appearing before any shape number.
    #[error("Coordinate at line {line_number} does not belong to a shape")]
    PointOutsideShape { line_number: usize },

    /// Polyfile without a description line.
    #[error("Polyfile is empty")]
    MissingDescription,

    /// Zoom range with `min > max` or beyond the supported zoom levels.
    #[error("Invalid zoom range {min}-{max}")]
    InvalidZoomRange { min: u8, max: u8 },

    /// Path string that does not follow the `M … L … Z` grammar.
    #[error("Malformed path near '{0}'")]
    MalformedPath(String),

    /// Projection or coordinate failure.
    #[error(transparent)]
    Geo(#[from] GeoError),

    /// Failure reading a polyfile.
    #[error("Failed to read polyfile: {0}")]
    Io(#[from] std::io::Error),
}
