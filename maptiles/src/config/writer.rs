//! INI serialization logic for converting `ConfigFile` → INI string.

use std::fmt::Write;
use std::path::Path;

use super::file::ConfigFile;
use super::parser::PROVIDER_SECTION_PREFIX;
use super::size::format_size;

/// Convert a `ConfigFile` to a commented INI string for saving.
pub(super) fn to_config_string(config: &ConfigFile) -> String {
    let memory_size = config
        .cache
        .memory_size
        .map(format_size)
        .unwrap_or_else(|| "unbounded".to_string());

    let mut out = format!(
        r#"[cache]
; Tile cache size per provider (e.g. 512MB, 2GB), or 'unbounded' to keep
; every tile for the life of the process
memory_size = {}
; HTTP timeout in seconds
timeout = {}

[logging]
directory = {}
file = {}
"#,
        memory_size,
        config.cache.timeout,
        path_to_string(&config.logging.directory),
        config.logging.file,
    );

    for provider in &config.providers {
        let d = &provider.descriptor;
        let templates: Vec<&str> = d.uri_templates.iter().map(|t| t.as_str()).collect();

        // Writing to a String cannot fail.
        let _ = write!(
            out,
            r#"
[{}{}]
description = {}
info_uri = {}
copyright = {}
memory_cacheable = {}
memory_cache = {}
min_zoom = {}
max_zoom = {}
; Hosts in failover order, comma-separated
uri_templates = {}
default = {}
"#,
            PROVIDER_SECTION_PREFIX,
            d.id,
            d.description,
            d.info_uri,
            d.copyright,
            d.memory_cacheable,
            d.memory_cache_enabled,
            d.min_zoom,
            d.max_zoom,
            templates.join(", "),
            provider.default,
        );
    }

    out
}

fn path_to_string(path: &Path) -> String {
    if let Some(home) = dirs::home_dir() {
        if let Ok(stripped) = path.strip_prefix(&home) {
            return format!("~/{}", stripped.display());
        }
    }
    path.display().to_string()
}
