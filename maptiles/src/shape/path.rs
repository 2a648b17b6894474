//! Path string encoding and parsing.

use std::fmt::Write;

use super::ShapeError;
use crate::geo::{world_pixel, GeoCoordinate, ScreenXY};

/// One command of a parsed path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathCommand {
    MoveTo(ScreenXY),
    LineTo(ScreenXY),
    Close,
}

/// Projects every coordinate to world pixels at `zoom`.
pub fn project_points(coords: &[GeoCoordinate], zoom: u8) -> Result<Vec<ScreenXY>, ShapeError> {
    coords
        .iter()
        .map(|c| world_pixel(c, zoom).map_err(ShapeError::from))
        .collect()
}

/// Encodes a single closed shape relative to `origin`.
///
/// # Errors
///
/// - [`ShapeError::EmptyGeometry`] for an empty coordinate list
/// - [`ShapeError::Geo`] if a coordinate cannot be projected at `zoom`
pub fn encode_path(
    coords: &[GeoCoordinate],
    origin: ScreenXY,
    zoom: u8,
) -> Result<String, ShapeError> {
    if coords.is_empty() {
        return Err(ShapeError::EmptyGeometry);
    }
    let points = project_points(coords, zoom)?;
    Ok(format_path(&points, origin))
}

/// Encodes several shapes against their shared top-left pixel.
///
/// All shapes are projected first; the minimum x and y across every point
/// becomes the origin, so the combined drawing starts at (0, 0). Returns
/// that origin with one path per shape, in input order.
pub fn encode_shapes(
    shapes: &[Vec<GeoCoordinate>],
    zoom: u8,
) -> Result<(ScreenXY, Vec<String>), ShapeError> {
    if shapes.is_empty() || shapes.iter().any(|s| s.is_empty()) {
        return Err(ShapeError::EmptyGeometry);
    }

    let projected = shapes
        .iter()
        .map(|s| project_points(s, zoom))
        .collect::<Result<Vec<_>, _>>()?;

    let origin = projected
        .iter()
        .flatten()
        .fold(ScreenXY::new(i64::MAX, i64::MAX), |min, p| {
            ScreenXY::new(min.x.min(p.x), min.y.min(p.y))
        });

    let paths = projected
        .iter()
        .map(|points| format_path(points, origin))
        .collect();

    Ok((origin, paths))
}

fn format_path(points: &[ScreenXY], origin: ScreenXY) -> String {
    let mut path = String::with_capacity(points.len() * 12 + 2);
    for (i, point) in points.iter().enumerate() {
        let p = *point - origin;
        let command = if i == 0 { 'M' } else { 'L' };
        // Writing to a String cannot fail.
        let _ = write!(path, "{} {} {} ", command, p.x, p.y);
    }
    path.push('Z');
    path
}

/// Parses a path produced by [`encode_path`] back into commands.
pub fn parse_path(path: &str) -> Result<Vec<PathCommand>, ShapeError> {
    let mut tokens = path.split_whitespace();
    let mut commands = Vec::new();

    while let Some(token) = tokens.next() {
        let command = match token {
            "Z" => PathCommand::Close,
            "M" | "L" => {
                let x = next_number(&mut tokens, token)?;
                let y = next_number(&mut tokens, token)?;
                let point = ScreenXY::new(x, y);
                if token == "M" {
                    PathCommand::MoveTo(point)
                } else {
                    PathCommand::LineTo(point)
                }
            }
            other => return Err(ShapeError::MalformedPath(other.to_string())),
        };
        commands.push(command);
    }

    Ok(commands)
}

fn next_number<'a>(
    tokens: &mut impl Iterator<Item = &'a str>,
    command: &str,
) -> Result<i64, ShapeError> {
    tokens
        .next()
        .and_then(|t| t.parse().ok())
        .ok_or_else(|| ShapeError::MalformedPath(command.to_string()))
}
