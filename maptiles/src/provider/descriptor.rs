//! Provider registration records.

use serde::Serialize;

use super::UriTemplate;
use crate::geo::MAX_ZOOM;
use crate::tile::TileError;

/// Static description of a tile source.
///
/// Everything except the memory-cache toggle is fixed once a provider is
/// built from it; the toggle's initial value comes from
/// `memory_cache_enabled`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProviderDescriptor {
    pub id: String,
    pub description: String,
    pub info_uri: String,
    pub copyright: String,
    /// Whether tiles from this source may be retained at all.
    pub memory_cacheable: bool,
    pub memory_cache_enabled: bool,
    pub min_zoom: u8,
    pub max_zoom: u8,
    /// Hosts in failover order.
    pub uri_templates: Vec<UriTemplate>,
}

impl ProviderDescriptor {
    /// Creates a cacheable descriptor covering every zoom level.
    pub fn new(id: impl Into<String>, uri_templates: Vec<UriTemplate>) -> Self {
        Self {
            id: id.into(),
            description: String::new(),
            info_uri: String::new(),
            copyright: String::new(),
            memory_cacheable: true,
            memory_cache_enabled: true,
            min_zoom: 0,
            max_zoom: MAX_ZOOM,
            uri_templates,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_info_uri(mut self, info_uri: impl Into<String>) -> Self {
        self.info_uri = info_uri.into();
        self
    }

    pub fn with_copyright(mut self, copyright: impl Into<String>) -> Self {
        self.copyright = copyright.into();
        self
    }

    pub fn with_zoom_range(mut self, min_zoom: u8, max_zoom: u8) -> Self {
        self.min_zoom = min_zoom;
        self.max_zoom = max_zoom;
        self
    }

    pub fn with_memory_cache(mut self, cacheable: bool, enabled: bool) -> Self {
        self.memory_cacheable = cacheable;
        self.memory_cache_enabled = enabled;
        self
    }

    pub fn supports_zoom(&self, zoom: u8) -> bool {
        zoom >= self.min_zoom && zoom <= self.max_zoom
    }

    /// Checks templates and zoom range.
    pub fn validate(&self) -> Result<(), TileError> {
        if self.uri_templates.is_empty() {
            return Err(TileError::NoTemplates(self.id.clone()));
        }
        if self.min_zoom > self.max_zoom || self.max_zoom > MAX_ZOOM {
            return Err(TileError::InvalidZoomRange {
                provider: self.id.clone(),
                min: self.min_zoom,
                max: self.max_zoom,
            });
        }
        Ok(())
    }

    /// OpenStreetMap standard tiles, three hosts.
    pub fn openstreetmap() -> Self {
        Self::new(
            "openstreetmap",
            vec![
                UriTemplate::from_static("https://a.tile.openstreetmap.org/{zoom}/{x}/{y}.png"),
                UriTemplate::from_static("https://b.tile.openstreetmap.org/{zoom}/{x}/{y}.png"),
                UriTemplate::from_static("https://c.tile.openstreetmap.org/{zoom}/{x}/{y}.png"),
            ],
        )
        .with_description("OpenStreetMap")
        .with_info_uri("https://www.openstreetmap.org/")
        .with_copyright("© OpenStreetMap contributors")
        .with_zoom_range(0, 19)
    }

    /// OpenTopoMap topographic tiles, three hosts.
    pub fn opentopomap() -> Self {
        Self::new(
            "opentopomap",
            vec![
                UriTemplate::from_static("https://a.tile.opentopomap.org/{zoom}/{x}/{y}.png"),
                UriTemplate::from_static("https://b.tile.opentopomap.org/{zoom}/{x}/{y}.png"),
                UriTemplate::from_static("https://c.tile.opentopomap.org/{zoom}/{x}/{y}.png"),
            ],
        )
        .with_description("OpenTopoMap")
        .with_info_uri("https://opentopomap.org/")
        .with_copyright("© OpenStreetMap contributors, SRTM | © OpenTopoMap (CC-BY-SA)")
        .with_zoom_range(0, 17)
    }

    /// Esri World Imagery. Note the row/column order of the service.
    pub fn esri_world_imagery() -> Self {
        Self::new(
            "esri_world_imagery",
            vec![UriTemplate::from_static(
                "https://server.arcgisonline.com/ArcGIS/rest/services/World_Imagery/MapServer/tile/{zoom}/{y}/{x}",
            )],
        )
        .with_description("Esri World Imagery")
        .with_info_uri("https://www.arcgis.com/home/item.html?id=10df2279f9684e4a9f6a7f08febac2a9")
        .with_copyright("Source: Esri, Maxar, Earthstar Geographics, and the GIS User Community")
        .with_zoom_range(0, 19)
    }

    /// Every built-in descriptor.
    pub fn builtin() -> Vec<Self> {
        vec![
            Self::openstreetmap(),
            Self::opentopomap(),
            Self::esri_world_imagery(),
        ]
    }

    /// Looks up a built-in descriptor by id.
    pub fn builtin_by_id(id: &str) -> Option<Self> {
        Self::builtin().into_iter().find(|d| d.id == id)
    }
}
