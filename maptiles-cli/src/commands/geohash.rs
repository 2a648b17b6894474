//! GeoHash commands - encode, decode and neighbours.

use clap::{Subcommand, ValueEnum};
use maptiles::geo::GeoCoordinate;
use maptiles::geohash::{self, Direction, GeoHash};

use crate::error::CliError;

/// Hash representation selection for CLI arguments.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum HashFormat {
    /// Base-32 text; precision is the number of characters
    String,
    /// 32-bit integer; precision is the number of bit pairs (max 16)
    U32,
    /// 64-bit integer; precision is the number of bit pairs (max 32)
    U64,
}

/// GeoHash subcommands.
#[derive(Debug, Subcommand)]
pub enum GeoHashCommands {
    /// Encode a coordinate
    Encode {
        /// Latitude in decimal degrees
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,

        /// Longitude in decimal degrees
        #[arg(long, allow_negative_numbers = true)]
        lon: f64,

        /// Characters (string) or bit pairs (integers)
        #[arg(long, default_value = "12")]
        precision: usize,

        /// Hash representation
        #[arg(long, value_enum, default_value = "string")]
        format: HashFormat,
    },

    /// Decode a hash to its cell centre and bounds
    Decode {
        /// Hash text, or a decimal integer for the integer formats
        hash: String,

        /// Hash representation
        #[arg(long, value_enum, default_value = "string")]
        format: HashFormat,

        /// Bit pairs in an integer hash (ignored for strings)
        #[arg(long, default_value = "16")]
        precision: u8,
    },

    /// Show the eight cells around a base-32 hash
    Neighbors {
        /// Base-32 hash
        hash: String,
    },
}

/// Run a geohash subcommand.
pub fn run(command: GeoHashCommands) -> Result<(), CliError> {
    match command {
        GeoHashCommands::Encode {
            lat,
            lon,
            precision,
            format,
        } => {
            let hash = encode(&GeoCoordinate::new(lat, lon)?, precision, format)?;
            println!("{}", hash);
            Ok(())
        }
        GeoHashCommands::Decode {
            hash,
            format,
            precision,
        } => run_decode(parse_hash(&hash, format, precision)?),
        GeoHashCommands::Neighbors { hash } => run_neighbors(&hash),
    }
}

fn encode(
    coord: &GeoCoordinate,
    precision: usize,
    format: HashFormat,
) -> Result<GeoHash, CliError> {
    let hash = match format {
        HashFormat::String => GeoHash::base32(coord, precision)?,
        HashFormat::U32 => GeoHash::packed32(coord, bit_pairs(precision)?)?,
        HashFormat::U64 => GeoHash::packed64(coord, bit_pairs(precision)?)?,
    };
    Ok(hash)
}

fn bit_pairs(precision: usize) -> Result<u8, CliError> {
    u8::try_from(precision)
        .map_err(|_| CliError::Usage(format!("Precision {} is too large", precision)))
}

fn parse_hash(hash: &str, format: HashFormat, precision: u8) -> Result<GeoHash, CliError> {
    let invalid = || CliError::Usage(format!("'{}' is not a decimal integer hash", hash));
    Ok(match format {
        HashFormat::String => GeoHash::Base32(hash.to_string()),
        HashFormat::U32 => GeoHash::Packed32 {
            value: hash.parse().map_err(|_| invalid())?,
            precision,
        },
        HashFormat::U64 => GeoHash::Packed64 {
            value: hash.parse().map_err(|_| invalid())?,
            precision,
        },
    })
}

fn run_decode(hash: GeoHash) -> Result<(), CliError> {
    let bounds = hash.bounds()?;
    let centre = bounds.center();
    let lat_err = (bounds.max().latitude() - bounds.min().latitude()) / 2.0;
    let lon_err = (bounds.max().longitude() - bounds.min().longitude()) / 2.0;

    println!("Centre: {:.8}, {:.8}", centre.latitude(), centre.longitude());
    println!("Error:  ±{:.8} lat, ±{:.8} lon", lat_err, lon_err);
    println!(
        "Bounds: {:.8}, {:.8} to {:.8}, {:.8}",
        bounds.min().latitude(),
        bounds.min().longitude(),
        bounds.max().latitude(),
        bounds.max().longitude()
    );
    Ok(())
}

fn run_neighbors(hash: &str) -> Result<(), CliError> {
    let grid = neighbor_grid(hash)?;
    for row in grid {
        let cells: Vec<String> = row
            .into_iter()
            .map(|cell| cell.unwrap_or_else(|| "-".repeat(hash.len())))
            .collect();
        println!("{}", cells.join(" "));
    }
    Ok(())
}

/// 3x3 grid centred on `hash`, north row first. Cells past a pole are `None`.
fn neighbor_grid(hash: &str) -> Result<[[Option<String>; 3]; 3], CliError> {
    let north = geohash::neighbor(hash, Direction::North)?;
    let south = geohash::neighbor(hash, Direction::South)?;
    let step = |cell: &Option<String>, direction| -> Result<Option<String>, CliError> {
        match cell {
            Some(cell) => Ok(geohash::neighbor(cell, direction)?),
            None => Ok(None),
        }
    };

    Ok([
        [
            step(&north, Direction::West)?,
            north.clone(),
            step(&north, Direction::East)?,
        ],
        [
            geohash::neighbor(hash, Direction::West)?,
            Some(hash.to_string()),
            geohash::neighbor(hash, Direction::East)?,
        ],
        [
            step(&south, Direction::West)?,
            south.clone(),
            step(&south, Direction::East)?,
        ],
    ])
}
