//! Common types and utilities shared across CLI commands.

use std::path::Path;

use maptiles::app::bootstrap_client;
use maptiles::client::TileClient;
use maptiles::config::ConfigFile;
use tokio::runtime::Runtime;

use crate::error::CliError;

/// Load the configuration from `path`, or from ~/.maptiles/config.ini.
///
/// A missing file yields the defaults.
pub fn load_config(path: Option<&Path>) -> Result<ConfigFile, CliError> {
    let config = match path {
        Some(path) => ConfigFile::load_from(path)?,
        None => ConfigFile::load()?,
    };
    Ok(config)
}

/// Build the tile client for a configuration.
pub fn build_client(config: &ConfigFile) -> Result<TileClient, CliError> {
    Ok(bootstrap_client(config)?)
}

/// Resolve an explicit provider id, falling back to the current provider.
pub fn resolve_provider(client: &TileClient, provider: Option<String>) -> Result<String, CliError> {
    provider
        .or_else(|| client.current_provider_id())
        .ok_or_else(|| CliError::Usage("No tile providers are configured".to_string()))
}

/// Multi-threaded runtime for commands that fetch tiles.
pub fn runtime() -> Result<Runtime, CliError> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(CliError::Runtime)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_config_from_path() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.ini");
        std::fs::write(&path, "[provider.opentopomap]\ndefault = true\n").unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.providers[0].descriptor.id, "opentopomap");
    }

    #[test]
    fn test_load_config_reports_invalid_values() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.ini");
        std::fs::write(&path, "[cache]\ntimeout = soon\n").unwrap();

        assert!(matches!(load_config(Some(&path)), Err(CliError::Config(_))));
    }

    #[test]
    fn test_resolve_provider() {
        let client = build_client(&ConfigFile::default()).unwrap();
        assert_eq!(resolve_provider(&client, None).unwrap(), "openstreetmap");
        assert_eq!(
            resolve_provider(&client, Some("other".to_string())).unwrap(),
            "other"
        );

        let empty = TileClient::new();
        assert!(matches!(
            resolve_provider(&empty, None),
            Err(CliError::Usage(_))
        ));
    }
}
