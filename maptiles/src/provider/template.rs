//! Tile URI templates.

use std::fmt;

use serde::Serialize;

use crate::tile::TileError;

const ZOOM: &str = "{zoom}";
const X: &str = "{x}";
const Y: &str = "{y}";

/// A tile URL with `{zoom}`, `{x}` and `{y}` placeholders.
///
/// Expansion is plain textual replacement with unpadded decimal values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct UriTemplate(String);

impl UriTemplate {
    /// Validates that all three placeholders are present.
    pub fn parse(template: impl Into<String>) -> Result<Self, TileError> {
        let raw = template.into();
        let trimmed = raw.trim();
        if [ZOOM, X, Y].iter().all(|p| trimmed.contains(p)) {
            Ok(Self(trimmed.to_string()))
        } else {
            Err(TileError::InvalidTemplate(raw))
        }
    }

    /// Wraps a compile-time template known to carry every placeholder.
    pub(crate) fn from_static(template: &'static str) -> Self {
        debug_assert!([ZOOM, X, Y].iter().all(|p| template.contains(p)));
        Self(template.to_string())
    }

    pub fn expand(&self, zoom: u8, x: u32, y: u32) -> String {
        self.0
            .replace(ZOOM, &zoom.to_string())
            .replace(X, &x.to_string())
            .replace(Y, &y.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UriTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for UriTemplate {
    type Err = TileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
