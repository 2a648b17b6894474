//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and appropriate exit codes.

use std::fmt;
use std::process;

use maptiles::app::AppError;
use maptiles::config::ConfigFileError;
use maptiles::geo::GeoError;
use maptiles::geohash::GeoHashError;
use maptiles::shape::ShapeError;
use maptiles::tile::TileError;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(std::io::Error),
    /// Configuration file could not be loaded
    Config(ConfigFileError),
    /// Tile client could not be built from the configuration
    Bootstrap(AppError),
    /// Failed to start the async runtime
    Runtime(std::io::Error),
    /// Tile request failed
    Tile(TileError),
    /// Coordinate or projection error
    Geo(GeoError),
    /// GeoHash encoding or decoding error
    GeoHash(GeoHashError),
    /// Polyfile or path encoding error
    Shape(ShapeError),
    /// JSON serialization failed
    Json(serde_json::Error),
    /// Invalid combination of arguments
    Usage(String),
    /// Failed to write output file
    FileWrite { path: String, error: std::io::Error },
    /// Tile server error
    #[cfg_attr(not(feature = "server"), allow(dead_code))]
    Serve(std::io::Error),
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        // Print additional help for specific errors
        match self {
            CliError::Tile(TileError::TileFetchFailed { failures, .. }) => {
                eprintln!();
                eprintln!("Hosts tried:");
                for failure in failures {
                    eprintln!("  {}", failure);
                }
            }
            CliError::Tile(TileError::UnknownProvider(_)) => {
                eprintln!();
                eprintln!("Run 'maptiles providers' to list configured providers.");
            }
            _ => {
                let mut source = std::error::Error::source(self);
                while let Some(cause) = source {
                    eprintln!("  caused by: {}", cause);
                    source = cause.source();
                }
            }
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(e) => write!(f, "Failed to initialize logging: {}", e),
            CliError::Config(_) => write!(f, "Failed to load configuration"),
            CliError::Bootstrap(_) => write!(f, "Failed to set up tile providers"),
            CliError::Runtime(e) => write!(f, "Failed to start async runtime: {}", e),
            CliError::Tile(e) => write!(f, "{}", e),
            CliError::Geo(e) => write!(f, "{}", e),
            CliError::GeoHash(e) => write!(f, "{}", e),
            CliError::Shape(_) => write!(f, "Failed to process shape data"),
            CliError::Json(e) => write!(f, "Failed to serialize output: {}", e),
            CliError::Usage(msg) => write!(f, "{}", msg),
            CliError::FileWrite { path, error } => {
                write!(f, "Failed to write file '{}': {}", path, error)
            }
            CliError::Serve(e) => write!(f, "Tile server error: {}", e),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Config(e) => Some(e),
            CliError::Bootstrap(e) => Some(e),
            CliError::Shape(e) => Some(e),
            CliError::FileWrite { error, .. } => Some(error),
            _ => None,
        }
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::Config(e)
    }
}

impl From<AppError> for CliError {
    fn from(e: AppError) -> Self {
        CliError::Bootstrap(e)
    }
}

impl From<TileError> for CliError {
    fn from(e: TileError) -> Self {
        CliError::Tile(e)
    }
}

impl From<GeoError> for CliError {
    fn from(e: GeoError) -> Self {
        CliError::Geo(e)
    }
}

impl From<GeoHashError> for CliError {
    fn from(e: GeoHashError) -> Self {
        CliError::GeoHash(e)
    }
}

impl From<ShapeError> for CliError {
    fn from(e: ShapeError) -> Self {
        CliError::Shape(e)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        CliError::Json(e)
    }
}
