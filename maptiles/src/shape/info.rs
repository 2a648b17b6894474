//! Multi-zoom shape descriptions built from polyfiles.

use std::collections::BTreeMap;

use rayon::prelude::*;
use serde::Serialize;
use tracing::debug;

use super::path::encode_shapes;
use super::{Polyfile, ShapeError};
use crate::geo::{GeoBoundingBox, GeoCoordinate, MAX_ZOOM};

/// A polygon dataset rendered at a range of zoom levels.
///
/// Each zoom level holds the concatenation of every shape's path, all
/// normalised against the dataset's minimum on-screen pixel at that zoom.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShapeInfo {
    description: String,
    bounding_box: GeoBoundingBox,
    paths: BTreeMap<u8, String>,
}

impl ShapeInfo {
    /// Assembles a shape description from pre-computed parts.
    ///
    /// # Errors
    ///
    /// Returns [`ShapeError::EmptyGeometry`] if `paths` is empty.
    pub fn new(
        description: impl Into<String>,
        bounding_box: GeoBoundingBox,
        paths: BTreeMap<u8, String>,
    ) -> Result<Self, ShapeError> {
        if paths.is_empty() {
            return Err(ShapeError::EmptyGeometry);
        }
        Ok(Self {
            description: description.into(),
            bounding_box,
            paths,
        })
    }

    /// Renders every shape of a polyfile for each zoom in `min_zoom..=max_zoom`.
    ///
    /// Zoom levels are encoded in parallel.
    pub fn from_polyfile(
        polyfile: &Polyfile,
        min_zoom: u8,
        max_zoom: u8,
    ) -> Result<Self, ShapeError> {
        if min_zoom > max_zoom || max_zoom > MAX_ZOOM {
            return Err(ShapeError::InvalidZoomRange {
                min: min_zoom,
                max: max_zoom,
            });
        }

        let shapes: Vec<Vec<GeoCoordinate>> = polyfile
            .shapes
            .iter()
            .filter(|s| !s.points.is_empty())
            .map(|s| s.points.clone())
            .collect();

        let bounding_box = GeoBoundingBox::from_coordinates(shapes.iter().flatten())
            .ok_or(ShapeError::EmptyGeometry)?;

        let paths = (min_zoom..=max_zoom)
            .into_par_iter()
            .map(|zoom| {
                let (_, paths) = encode_shapes(&shapes, zoom)?;
                Ok((zoom, paths.join(" ")))
            })
            .collect::<Result<BTreeMap<u8, String>, ShapeError>>()?;

        debug!(
            description = %polyfile.description,
            shapes = shapes.len(),
            min_zoom,
            max_zoom,
            "Encoded shape paths"
        );

        Self::new(polyfile.description.clone(), bounding_box, paths)
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn bounding_box(&self) -> &GeoBoundingBox {
        &self.bounding_box
    }

    /// Path at `zoom`, if that level was rendered.
    pub fn path(&self, zoom: u8) -> Option<&str> {
        self.paths.get(&zoom).map(String::as_str)
    }

    /// Path at `zoom` in its double-quoted, comma-terminated output form.
    pub fn quoted_path(&self, zoom: u8) -> Option<String> {
        self.path(zoom).map(|p| format!("\"{}\",", p))
    }

    /// Rendered zoom levels in ascending order.
    pub fn zoom_levels(&self) -> impl Iterator<Item = u8> + '_ {
        self.paths.keys().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::{parse_path, PathCommand};
    use std::io::Cursor;

    fn sample() -> Polyfile {
        let input = "Two islands\n1\n10.0 55.0\n10.5 55.2\n11.0 54.8\nEND\n2\n12.0 56.0\n12.3 56.1\nEND\n";
        Polyfile::parse(Cursor::new(input)).unwrap()
    }

    #[test]
    fn test_from_polyfile_renders_each_zoom() {
        let info = ShapeInfo::from_polyfile(&sample(), 4, 7).unwrap();

        assert_eq!(info.description(), "Two islands");
        assert_eq!(info.zoom_levels().collect::<Vec<_>>(), vec![4, 5, 6, 7]);
        assert!(info.path(3).is_none());

        let path = info.path(7).unwrap();
        assert_eq!(path.matches('M').count(), 2);
        assert_eq!(path.matches('Z').count(), 2);
    }

    #[test]
    fn test_paths_start_at_shared_origin() {
        let info = ShapeInfo::from_polyfile(&sample(), 10, 10).unwrap();
        let points: Vec<_> = parse_path(info.path(10).unwrap())
            .unwrap()
            .into_iter()
            .filter_map(|c| match c {
                PathCommand::MoveTo(p) | PathCommand::LineTo(p) => Some(p),
                PathCommand::Close => None,
            })
            .collect();

        assert_eq!(points.iter().map(|p| p.x).min(), Some(0));
        assert_eq!(points.iter().map(|p| p.y).min(), Some(0));
    }

    #[test]
    fn test_quoted_path() {
        let info = ShapeInfo::from_polyfile(&sample(), 2, 2).unwrap();
        let quoted = info.quoted_path(2).unwrap();
        assert!(quoted.starts_with("\"M 0 "));
        assert!(quoted.ends_with("Z\","));
    }

    #[test]
    fn test_bounding_box_covers_all_points() {
        let info = ShapeInfo::from_polyfile(&sample(), 1, 1).unwrap();
        let bbox = info.bounding_box();
        assert_eq!(bbox.min().latitude(), 54.8);
        assert_eq!(bbox.min().longitude(), 10.0);
        assert_eq!(bbox.max().latitude(), 56.1);
        assert_eq!(bbox.max().longitude(), 12.3);
    }

    #[test]
    fn test_invalid_zoom_range() {
        assert!(matches!(
            ShapeInfo::from_polyfile(&sample(), 8, 3),
            Err(ShapeError::InvalidZoomRange { min: 8, max: 3 })
        ));
        assert!(matches!(
            ShapeInfo::from_polyfile(&sample(), 0, 24),
            Err(ShapeError::InvalidZoomRange { .. })
        ));
    }

    #[test]
    fn test_polyfile_without_points() {
        let poly = Polyfile::parse(Cursor::new("empty\n1\nEND\n")).unwrap();
        assert!(matches!(
            ShapeInfo::from_polyfile(&poly, 1, 2),
            Err(ShapeError::EmptyGeometry)
        ));
    }

    #[test]
    fn test_new_requires_paths() {
        let c = GeoCoordinate::new(1.0, 1.0).unwrap();
        let bbox = GeoBoundingBox::new(c, c).unwrap();
        assert!(matches!(
            ShapeInfo::new("x", bbox, BTreeMap::new()),
            Err(ShapeError::EmptyGeometry)
        ));
    }

    #[test]
    fn test_serializes_to_json() {
        let info = ShapeInfo::from_polyfile(&sample(), 3, 3).unwrap();
        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["description"], "Two islands");
        assert!(json["paths"]["3"].as_str().unwrap().starts_with("M "));
    }
}
