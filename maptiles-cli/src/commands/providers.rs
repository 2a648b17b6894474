//! Providers command - list configured tile providers.

use maptiles::config::{format_size, ConfigFile};

use super::common::build_client;
use crate::error::CliError;

/// Run the providers command.
pub fn run(config: &ConfigFile) -> Result<(), CliError> {
    let client = build_client(config)?;
    let current = client.current_provider_id();

    println!("Tile Providers");
    println!("==============");

    for descriptor in client.providers() {
        let marker = if current.as_deref() == Some(descriptor.id.as_str()) {
            "*"
        } else {
            " "
        };

        println!();
        println!("{} {}  {}", marker, descriptor.id, descriptor.description);
        println!("    Zoom:      {}-{}", descriptor.min_zoom, descriptor.max_zoom);
        if !descriptor.copyright.is_empty() {
            println!("    Copyright: {}", descriptor.copyright);
        }
        if !descriptor.info_uri.is_empty() {
            println!("    Info:      {}", descriptor.info_uri);
        }
        println!(
            "    Cache:     {}",
            cache_status(
                descriptor.memory_cacheable,
                descriptor.memory_cache_enabled,
                config.cache.memory_size
            )
        );
        for (i, template) in descriptor.uri_templates.iter().enumerate() {
            println!("    Host {}:    {}", i + 1, template);
        }
    }

    Ok(())
}

fn cache_status(cacheable: bool, enabled: bool, capacity: Option<u64>) -> String {
    match (cacheable, enabled, capacity) {
        (false, _, _) => "not cacheable".to_string(),
        (true, false, _) => "disabled".to_string(),
        (true, true, None) => "enabled (unbounded)".to_string(),
        (true, true, Some(bytes)) => format!("enabled ({})", format_size(bytes)),
    }
}
