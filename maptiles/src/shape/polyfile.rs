//! Polyfile parsing.
//!
//! # Format
//!
//! ```text
//! Free-text description
//! 1
//! 10.0 55.0
//! 10.5 55.2
//! END
//! 2
//! …
//! END
//! ```
//!
//! - The first line is the dataset description
//! - A bare integer starts a new shape with that number
//! - `END` is ignored
//! - Two numbers are a point, written **longitude first**
//! - Blank lines are skipped; anything else is an error

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use tracing::debug;

use super::ShapeError;
use crate::geo::GeoCoordinate;

/// A numbered polygon ring.
#[derive(Debug, Clone, PartialEq)]
pub struct PolyShape {
    pub number: i64,
    pub points: Vec<GeoCoordinate>,
}

/// A parsed polyfile.
#[derive(Debug, Clone, PartialEq)]
pub struct Polyfile {
    pub description: String,
    pub shapes: Vec<PolyShape>,
}

impl Polyfile {
    /// Reads and parses a polyfile from disk.
    pub fn from_path(path: &Path) -> Result<Self, ShapeError> {
        let file = File::open(path)?;
        Self::parse(BufReader::new(file))
    }

    /// Parses a polyfile from any buffered reader.
    pub fn parse<R: BufRead>(reader: R) -> Result<Self, ShapeError> {
        let mut lines = reader.lines();

        let description = match lines.next() {
            Some(line) => line?.trim().to_string(),
            None => return Err(ShapeError::MissingDescription),
        };

        let mut shapes: Vec<PolyShape> = Vec::new();

        for (index, line) in lines.enumerate() {
            let line = line?;
            let line_number = index + 2;
            let trimmed = line.trim();

            if trimmed.is_empty() || trimmed == "END" {
                continue;
            }

            if let Ok(number) = trimmed.parse::<i64>() {
                shapes.push(PolyShape {
                    number,
                    points: Vec::new(),
                });
                continue;
            }

            let point = parse_point(trimmed).ok_or_else(|| ShapeError::UnknownLineFormat {
                line_number,
                line: trimmed.to_string(),
            })?;
            let (longitude, latitude) = point;

            let shape = shapes
                .last_mut()
                .ok_or(ShapeError::PointOutsideShape { line_number })?;
            shape.points.push(GeoCoordinate::new(latitude, longitude)?);
        }

        debug!(
            description = %description,
            shapes = shapes.len(),
            "Parsed polyfile"
        );

        Ok(Self {
            description,
            shapes,
        })
    }

    /// Total number of points across all shapes.
    pub fn point_count(&self) -> usize {
        self.shapes.iter().map(|s| s.points.len()).sum()
    }
}

fn parse_point(line: &str) -> Option<(f64, f64)> {
    let mut parts = line.split_whitespace();
    let first = parts.next()?.parse().ok()?;
    let second = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some((first, second))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const SAMPLE: &str = "Test region\n\
                          1\n\
                          10.0 55.0\n\
                          10.5 55.2\n\
                          11.0 54.8\n\
                          END\n\
                          2\n\
                          -3.5 40.25\n\
                          END\n";

    #[test]
    fn test_parse_sample() {
        let poly = Polyfile::parse(Cursor::new(SAMPLE)).unwrap();

        assert_eq!(poly.description, "Test region");
        assert_eq!(poly.shapes.len(), 2);
        assert_eq!(poly.shapes[0].number, 1);
        assert_eq!(poly.shapes[0].points.len(), 3);
        assert_eq!(poly.shapes[1].number, 2);
        assert_eq!(poly.point_count(), 4);
    }

    #[test]
    fn test_points_are_longitude_first() {
        let poly = Polyfile::parse(Cursor::new(SAMPLE)).unwrap();
        let p = poly.shapes[1].points[0];
        assert_eq!(p.latitude(), 40.25);
        assert_eq!(p.longitude(), -3.5);
    }

    #[test]
    fn test_unknown_line_is_error() {
        let input = "desc\n1\n10.0 55.0\nbogus line here\n";
        match Polyfile::parse(Cursor::new(input)) {
            Err(ShapeError::UnknownLineFormat { line_number, line }) => {
                assert_eq!(line_number, 4);
                assert_eq!(line, "bogus line here");
            }
            other => panic!("Expected UnknownLineFormat, got {:?}", other),
        }
    }

    #[test]
    fn test_three_numbers_is_error() {
        let input = "desc\n1\n1.0 2.0 3.0\n";
        assert!(matches!(
            Polyfile::parse(Cursor::new(input)),
            Err(ShapeError::UnknownLineFormat { .. })
        ));
    }

    #[test]
    fn test_point_before_shape_number() {
        let input = "desc\n10.0 55.0\n";
        assert!(matches!(
            Polyfile::parse(Cursor::new(input)),
            Err(ShapeError::PointOutsideShape { line_number: 2 })
        ));
    }

    #[test]
    fn test_invalid_latitude_rejected() {
        let input = "desc\n1\n10.0 95.0\n";
        assert!(matches!(
            Polyfile::parse(Cursor::new(input)),
            Err(ShapeError::Geo(_))
        ));
    }

    #[test]
    fn test_empty_input() {
        assert!(matches!(
            Polyfile::parse(Cursor::new("")),
            Err(ShapeError::MissingDescription)
        ));
    }

    #[test]
    fn test_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("region.poly");
        std::fs::write(&path, SAMPLE).unwrap();

        let poly = Polyfile::from_path(&path).unwrap();
        assert_eq!(poly.shapes.len(), 2);
    }
}
