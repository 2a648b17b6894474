//! Configuration file handling for ~/.maptiles/config.ini.
//!
//! Parsing lives in [`super::parser`], serialization in [`super::writer`].

use std::path::{Path, PathBuf};

use ini::Ini;
use thiserror::Error;

use crate::provider::{ProviderDescriptor, DEFAULT_TIMEOUT_SECS};

/// Default log file name.
pub const DEFAULT_LOG_FILE: &str = "maptiles.log";

/// Configuration file errors.
#[derive(Debug, Error)]
pub enum ConfigFileError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] ini::Error),

    /// Failed to write config file
    #[error("Failed to write config file: {0}")]
    WriteError(std::io::Error),

    /// Invalid configuration value
    #[error("Invalid configuration: {section}.{key} = '{value}' - {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },

    /// Failed to create config directory
    #[error("Failed to create config directory: {0}")]
    DirectoryError(std::io::Error),
}

/// `[cache]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheSettings {
    /// Byte budget per provider; `None` keeps every tile.
    pub memory_size: Option<u64>,
    /// HTTP timeout in seconds.
    pub timeout: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            memory_size: None,
            timeout: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// One `[provider.<id>]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderSettings {
    pub descriptor: ProviderDescriptor,
    /// Activate as the current provider on registration.
    pub default: bool,
}

/// `[logging]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingSettings {
    pub directory: PathBuf,
    pub file: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            directory: config_directory(),
            file: DEFAULT_LOG_FILE.to_string(),
        }
    }
}

impl LoggingSettings {
    pub fn path(&self) -> PathBuf {
        self.directory.join(&self.file)
    }
}

/// Parsed configuration file.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigFile {
    pub cache: CacheSettings,
    /// Providers in file order.
    pub providers: Vec<ProviderSettings>,
    pub logging: LoggingSettings,
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            cache: CacheSettings::default(),
            providers: vec![ProviderSettings {
                descriptor: ProviderDescriptor::openstreetmap(),
                default: true,
            }],
            logging: LoggingSettings::default(),
        }
    }
}

impl ConfigFile {
    /// Load configuration from the default path (~/.maptiles/config.ini).
    pub fn load() -> Result<Self, ConfigFileError> {
        Self::load_from(&config_file_path())
    }

    /// Load configuration from a specific path.
    ///
    /// If the file doesn't exist, returns defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigFileError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let ini = Ini::load_from_file(path)?;
        super::parser::parse_ini(&ini)
    }

    /// Parse configuration from INI text.
    pub fn from_ini_str(content: &str) -> Result<Self, ConfigFileError> {
        let ini = Ini::load_from_str(content).map_err(ini::Error::Parse)?;
        super::parser::parse_ini(&ini)
    }

    /// Save configuration to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigFileError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(ConfigFileError::DirectoryError)?;
        }

        std::fs::write(path, self.to_ini_string()).map_err(ConfigFileError::WriteError)
    }

    /// Serialize to the commented INI form written by [`ConfigFile::save_to`].
    pub fn to_ini_string(&self) -> String {
        super::writer::to_config_string(self)
    }

    /// Create the default config file if it doesn't exist.
    ///
    /// Returns the path to the config file.
    pub fn ensure_exists() -> Result<PathBuf, ConfigFileError> {
        let path = config_file_path();
        if !path.exists() {
            Self::default().save_to(&path)?;
        }
        Ok(path)
    }
}

/// Get the path to the config directory (~/.maptiles).
pub fn config_directory() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".maptiles")
}

/// Get the path to the config file (~/.maptiles/config.ini).
pub fn config_file_path() -> PathBuf {
    config_directory().join("config.ini")
}
