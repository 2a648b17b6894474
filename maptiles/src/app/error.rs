//! Application error types.

use std::fmt;

use crate::config::ConfigFileError;
use crate::provider::HttpError;
use crate::tile::TileError;

/// Errors that can occur while bootstrapping the tile client.
#[derive(Debug)]
pub enum AppError {
    /// Configuration could not be loaded.
    Config(ConfigFileError),

    /// Failed to create the HTTP client.
    HttpClient(HttpError),

    /// A configured provider was rejected.
    Provider(TileError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(e) => write!(f, "Configuration error: {}", e),
            AppError::HttpClient(e) => write!(f, "HTTP client error: {}", e),
            AppError::Provider(e) => write!(f, "Provider error: {}", e),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(e) => Some(e),
            AppError::HttpClient(e) => Some(e),
            AppError::Provider(e) => Some(e),
        }
    }
}

impl From<ConfigFileError> for AppError {
    fn from(e: ConfigFileError) -> Self {
        AppError::Config(e)
    }
}

impl From<HttpError> for AppError {
    fn from(e: HttpError) -> Self {
        AppError::HttpClient(e)
    }
}

impl From<TileError> for AppError {
    fn from(e: TileError) -> Self {
        AppError::Provider(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_app_error_display() {
        let err = AppError::Provider(TileError::DuplicateProviderId("osm".to_string()));
        assert_eq!(
            err.to_string(),
            "Provider error: Provider 'osm' is already registered"
        );
    }

    #[test]
    fn test_app_error_source() {
        let err: AppError = HttpError::Client("no tls".to_string()).into();
        assert!(err.source().is_some());
        assert!(err.to_string().starts_with("HTTP client error"));
    }
}
