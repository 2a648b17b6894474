//! Application bootstrap.
//!
//! Turns a [`ConfigFile`](crate::config::ConfigFile) into a ready
//! [`TileClient`](crate::client::TileClient): one HTTP client shared by every
//! provider, each provider registered in file order, the `default = true`
//! provider activated.
//!
//! ```ignore
//! use maptiles::app::bootstrap_client;
//! use maptiles::config::ConfigFile;
//!
//! let config = ConfigFile::load()?;
//! let client = bootstrap_client(&config)?;
//! let tile = client.get_tile("openstreetmap", 3, 4, 2).await?;
//! ```

mod bootstrap;
mod error;

pub use bootstrap::{bootstrap_client, bootstrap_client_with};
pub use error::AppError;
