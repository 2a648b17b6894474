//! Fetch command - download a single tile to a file.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use maptiles::config::{format_size, ConfigFile};
use maptiles::geo::{tile_index_for, validate_zoom, world_pixel, GeoCoordinate};

use super::common::{build_client, resolve_provider, runtime};
use crate::error::CliError;

/// Arguments for the fetch command.
#[derive(Debug, Args)]
pub struct FetchArgs {
    /// Provider id (defaults to the current provider)
    #[arg(long)]
    pub provider: Option<String>,

    /// Zoom level (0-23)
    #[arg(long)]
    pub zoom: u32,

    /// Tile column
    #[arg(long, requires = "y", conflicts_with_all = ["lat", "lon"])]
    pub x: Option<u32>,

    /// Tile row
    #[arg(long, requires = "x")]
    pub y: Option<u32>,

    /// Latitude of a point inside the tile, in decimal degrees
    #[arg(long, requires = "lon", allow_negative_numbers = true)]
    pub lat: Option<f64>,

    /// Longitude of a point inside the tile, in decimal degrees
    #[arg(long, requires = "lat", allow_negative_numbers = true)]
    pub lon: Option<f64>,

    /// Output file, or '-' for stdout
    #[arg(long, short)]
    pub output: PathBuf,
}

/// Run the fetch command.
pub fn run(args: FetchArgs, config: &ConfigFile) -> Result<(), CliError> {
    let (x, y) = tile_for(&args)?;
    let client = build_client(config)?;
    let provider = resolve_provider(&client, args.provider.clone())?;

    let start = Instant::now();
    let data = runtime()?.block_on(client.get_tile(&provider, args.zoom, x, y))?;
    let elapsed = start.elapsed();

    write_output(&args.output, &data)?;

    eprintln!(
        "Fetched {}/{}/{}/{} ({}) in {:.2}s",
        provider,
        args.zoom,
        x,
        y,
        format_size(data.len() as u64),
        elapsed.as_secs_f64()
    );
    Ok(())
}

/// Tile indices from `--x/--y`, or the tile containing `--lat/--lon`.
fn tile_for(args: &FetchArgs) -> Result<(u32, u32), CliError> {
    match (args.x, args.y, args.lat, args.lon) {
        (Some(x), Some(y), _, _) => Ok((x, y)),
        (_, _, Some(lat), Some(lon)) => {
            let zoom = validate_zoom(args.zoom)?;
            let pixel = world_pixel(&GeoCoordinate::new(lat, lon)?, zoom)?;
            Ok(tile_index_for(pixel))
        }
        _ => Err(CliError::Usage(
            "Either --x and --y or --lat and --lon are required".to_string(),
        )),
    }
}

fn write_output(output: &Path, data: &[u8]) -> Result<(), CliError> {
    let result = if output.as_os_str() == "-" {
        let mut stdout = std::io::stdout().lock();
        stdout.write_all(data).and_then(|_| stdout.flush())
    } else {
        std::fs::write(output, data)
    };

    result.map_err(|error| CliError::FileWrite {
        path: output.display().to_string(),
        error,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn args(x: Option<u32>, y: Option<u32>, lat: Option<f64>, lon: Option<f64>) -> FetchArgs {
        FetchArgs {
            provider: None,
            zoom: 10,
            x,
            y,
            lat,
            lon,
            output: PathBuf::from("-"),
        }
    }

    #[test]
    fn test_tile_from_indices() {
        assert_eq!(tile_for(&args(Some(3), Some(4), None, None)).unwrap(), (3, 4));
    }

    #[test]
    fn test_tile_from_coordinate() {
        // Greenwich at zoom 10
        assert_eq!(
            tile_for(&args(None, None, Some(51.4779), Some(0.0))).unwrap(),
            (512, 340)
        );
    }

    #[test]
    fn test_tile_requires_position() {
        assert!(matches!(
            tile_for(&args(None, None, None, None)),
            Err(CliError::Usage(_))
        ));
    }

    #[test]
    fn test_write_output_to_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("tile.png");

        write_output(&path, b"tile").unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"tile");
    }

    #[test]
    fn test_write_output_missing_directory() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("missing/tile.png");

        assert!(matches!(
            write_output(&path, b"tile"),
            Err(CliError::FileWrite { .. })
        ));
    }
}
