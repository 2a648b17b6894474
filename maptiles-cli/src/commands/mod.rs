//! CLI command implementations.
//!
//! Each subcommand has its own module with argument definitions and handlers.
//!
//! # Command Modules
//!
//! - [`providers`] - List configured tile providers
//! - [`fetch`] - Download a single tile
//! - [`prefetch`] - Fetch every tile covering an area
//! - [`project`] - Coordinate to pixel/tile projection
//! - [`geohash`] - GeoHash encode, decode and neighbours
//! - [`polyfile`] - Polyfile to multi-zoom path encoding
//! - [`serve`] - HTTP tile server (feature `server`)

pub mod common;
pub mod fetch;
pub mod geohash;
pub mod polyfile;
pub mod prefetch;
pub mod project;
pub mod providers;
#[cfg(feature = "server")]
pub mod serve;
