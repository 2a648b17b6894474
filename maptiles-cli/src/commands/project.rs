//! Project command - show where a coordinate lands on the tile grid.

use clap::Args;
use maptiles::geo::{tile_bounds, tile_index_for, validate_zoom, world_pixel, GeoCoordinate};

use crate::error::CliError;

/// Arguments for the project command.
#[derive(Debug, Args)]
pub struct ProjectArgs {
    /// Latitude in decimal degrees
    #[arg(long, allow_negative_numbers = true)]
    pub lat: f64,

    /// Longitude in decimal degrees
    #[arg(long, allow_negative_numbers = true)]
    pub lon: f64,

    /// Zoom level (0-23)
    #[arg(long)]
    pub zoom: u32,
}

/// Run the project command.
pub fn run(args: ProjectArgs) -> Result<(), CliError> {
    let zoom = validate_zoom(args.zoom)?;
    let coord = GeoCoordinate::new(args.lat, args.lon)?;

    let pixel = world_pixel(&coord, zoom)?;
    let (x, y) = tile_index_for(pixel);
    let bounds = tile_bounds(zoom, x, y)?;

    println!("Coordinate: {:.6}, {:.6}", coord.latitude(), coord.longitude());
    println!("Zoom:       {}", zoom);
    println!("Pixel:      {}, {}", pixel.x, pixel.y);
    println!("Tile:       {}/{}/{}", zoom, x, y);
    println!(
        "Tile bounds: {:.6}, {:.6} to {:.6}, {:.6}",
        bounds.min().latitude(),
        bounds.min().longitude(),
        bounds.max().latitude(),
        bounds.max().longitude()
    );
    Ok(())
}
