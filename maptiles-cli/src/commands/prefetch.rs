//! Prefetch command - fetch every tile covering an area.
//!
//! Exercises a provider's hosts and coalescing path for a whole region.
//! The in-memory cache lives only as long as the process.

use std::time::Instant;

use clap::Args;
use maptiles::config::ConfigFile;
use maptiles::geo::{GeoBoundingBox, GeoCoordinate};

use super::common::{build_client, resolve_provider, runtime};
use crate::error::CliError;

/// Arguments for the prefetch command.
#[derive(Debug, Args)]
pub struct PrefetchArgs {
    /// Provider id (defaults to the current provider)
    #[arg(long)]
    pub provider: Option<String>,

    /// Zoom level (0-23)
    #[arg(long)]
    pub zoom: u32,

    /// Southern edge in decimal degrees
    #[arg(long, allow_negative_numbers = true)]
    pub min_lat: f64,

    /// Western edge in decimal degrees
    #[arg(long, allow_negative_numbers = true)]
    pub min_lon: f64,

    /// Northern edge in decimal degrees
    #[arg(long, allow_negative_numbers = true)]
    pub max_lat: f64,

    /// Eastern edge in decimal degrees
    #[arg(long, allow_negative_numbers = true)]
    pub max_lon: f64,

    /// Maximum concurrent tile fetches
    #[arg(long, default_value = "8")]
    pub concurrency: usize,
}

/// Run the prefetch command.
pub fn run(args: PrefetchArgs, config: &ConfigFile) -> Result<(), CliError> {
    let bbox = GeoBoundingBox::new(
        GeoCoordinate::new(args.min_lat, args.min_lon)?,
        GeoCoordinate::new(args.max_lat, args.max_lon)?,
    )?;
    let client = build_client(config)?;
    let provider = resolve_provider(&client, args.provider)?;

    println!("Prefetching {} at zoom {}...", provider, args.zoom);
    let start = Instant::now();

    let summary = runtime()?.block_on(client.prefetch(
        &provider,
        &bbox,
        args.zoom,
        args.concurrency,
    ))?;

    println!(
        "{} of {} tiles fetched, {} failed, in {:.2}s",
        summary.fetched,
        summary.requested,
        summary.failed,
        start.elapsed().as_secs_f64()
    );
    client.log_stats();
    Ok(())
}
