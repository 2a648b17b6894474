//! User configuration (`~/.maptiles/config.ini`).
//!
//! ```ini
//! [cache]
//! memory_size = 512MB
//! timeout = 30
//!
//! [provider.openstreetmap]
//! default = true
//!
//! [provider.local]
//! uri_templates = http://a.local/{zoom}/{x}/{y}.png, http://b.local/{zoom}/{x}/{y}.png
//! max_zoom = 18
//!
//! [logging]
//! directory = ~/.maptiles
//! file = maptiles.log
//! ```
//!
//! A section named after a built-in provider only needs the keys it changes.

mod file;
mod parser;
mod size;
mod writer;

pub use file::{
    config_directory, config_file_path, CacheSettings, ConfigFile, ConfigFileError,
    LoggingSettings, ProviderSettings, DEFAULT_LOG_FILE,
};
pub use size::{format_size, parse_size, SizeParseError};
