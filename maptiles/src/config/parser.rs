//! INI parsing logic for converting `Ini` → `ConfigFile`.
//!
//! This is the single place where INI key names are mapped to struct fields.

use std::path::PathBuf;

use ini::{Ini, Properties};

use super::file::{ConfigFile, ConfigFileError, ProviderSettings};
use super::size::parse_size;
use crate::geo::MAX_ZOOM;
use crate::provider::{ProviderDescriptor, UriTemplate};
use crate::tile::TileError;

/// Prefix of per-provider section names.
pub(super) const PROVIDER_SECTION_PREFIX: &str = "provider.";

/// Parse an `Ini` object into a `ConfigFile`.
///
/// Starts from `ConfigFile::default()` and overlays any values found in the
/// INI. If at least one `[provider.<id>]` section is present, the configured
/// providers replace the built-in default.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    // [cache] section
    if let Some(section) = ini.section(Some("cache")) {
        if let Some(v) = section.get("memory_size") {
            config.cache.memory_size = parse_memory_size(v)?;
        }
        if let Some(v) = section.get("timeout") {
            config.cache.timeout = v
                .trim()
                .parse()
                .ok()
                .filter(|t| *t > 0)
                .ok_or_else(|| {
                    invalid("cache", "timeout", v, "must be a positive integer (seconds)")
                })?;
        }
    }

    // [provider.<id>] sections
    let mut providers = Vec::new();
    for (name, section) in ini.iter() {
        let Some(id) = name.and_then(|n| n.strip_prefix(PROVIDER_SECTION_PREFIX)) else {
            continue;
        };
        let section_name = format!("{}{}", PROVIDER_SECTION_PREFIX, id);
        let id = id.trim();
        if id.is_empty() {
            return Err(invalid(&section_name, "id", id, "provider id must not be empty"));
        }
        if providers.iter().any(|p: &ProviderSettings| p.descriptor.id == id) {
            return Err(invalid(&section_name, "id", id, "duplicate provider id"));
        }
        providers.push(parse_provider(&section_name, id, section)?);
    }
    if !providers.is_empty() {
        config.providers = providers;
    }

    // [logging] section
    if let Some(section) = ini.section(Some("logging")) {
        if let Some(v) = section.get("directory") {
            let v = v.trim();
            if !v.is_empty() {
                config.logging.directory = expand_tilde(v);
            }
        }
        if let Some(v) = section.get("file") {
            let v = v.trim();
            if !v.is_empty() {
                config.logging.file = v.to_string();
            }
        }
    }

    Ok(config)
}

fn parse_memory_size(value: &str) -> Result<Option<u64>, ConfigFileError> {
    let v = value.trim();
    if v.is_empty() || v.eq_ignore_ascii_case("unbounded") {
        return Ok(None);
    }
    parse_size(v).map(Some).map_err(|_| {
        invalid(
            "cache",
            "memory_size",
            value,
            "expected 'unbounded' or a size like '2GB', '500MB', or '1024KB'",
        )
    })
}

/// Builds one provider from its section.
///
/// A section whose id names a built-in provider starts from that descriptor,
/// so only overridden keys need to be given.
fn parse_provider(
    section_name: &str,
    id: &str,
    section: &Properties,
) -> Result<ProviderSettings, ConfigFileError> {
    let mut descriptor = ProviderDescriptor::builtin_by_id(id)
        .unwrap_or_else(|| ProviderDescriptor::new(id, Vec::new()).with_description(id));
    let mut default = false;

    if let Some(v) = section.get("description") {
        descriptor.description = v.trim().to_string();
    }
    if let Some(v) = section.get("info_uri") {
        descriptor.info_uri = v.trim().to_string();
    }
    if let Some(v) = section.get("copyright") {
        descriptor.copyright = v.trim().to_string();
    }
    if let Some(v) = section.get("memory_cacheable") {
        descriptor.memory_cacheable = parse_bool(section_name, "memory_cacheable", v)?;
    }
    if let Some(v) = section.get("memory_cache") {
        descriptor.memory_cache_enabled = parse_bool(section_name, "memory_cache", v)?;
    }
    if let Some(v) = section.get("min_zoom") {
        descriptor.min_zoom = parse_zoom(section_name, "min_zoom", v)?;
    }
    if let Some(v) = section.get("max_zoom") {
        descriptor.max_zoom = parse_zoom(section_name, "max_zoom", v)?;
    }
    if let Some(v) = section.get("uri_templates") {
        descriptor.uri_templates = v
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(UriTemplate::parse)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| invalid(section_name, "uri_templates", v, &e.to_string()))?;
    }
    if let Some(v) = section.get("default") {
        default = parse_bool(section_name, "default", v)?;
    }

    descriptor.validate().map_err(|e| match e {
        TileError::NoTemplates(_) => invalid(
            section_name,
            "uri_templates",
            "",
            "at least one template with {zoom}, {x} and {y} is required",
        ),
        other => invalid(
            section_name,
            "min_zoom",
            &format!("{}-{}", descriptor.min_zoom, descriptor.max_zoom),
            &other.to_string(),
        ),
    })?;

    Ok(ProviderSettings {
        descriptor,
        default,
    })
}

fn parse_zoom(section: &str, key: &str, value: &str) -> Result<u8, ConfigFileError> {
    value
        .trim()
        .parse::<u8>()
        .ok()
        .filter(|z| *z <= MAX_ZOOM)
        .ok_or_else(|| invalid(section, key, value, "must be an integer between 0 and 23"))
}

fn parse_bool(section: &str, key: &str, value: &str) -> Result<bool, ConfigFileError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(invalid(section, key, value, "must be true or false")),
    }
}

fn invalid(section: &str, key: &str, value: &str, reason: &str) -> ConfigFileError {
    ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Expand ~ to home directory in paths.
pub(super) fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}
