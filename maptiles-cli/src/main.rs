//! MapTiles CLI - Command-line interface
//!
//! This binary provides a command-line interface to the MapTiles library:
//! tile fetching through the configured providers, projection and GeoHash
//! utilities, polyfile encoding and an optional HTTP tile server.

mod commands;
mod error;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use maptiles::config::ConfigFile;
use maptiles::logging::{init_logging, init_stderr_logging, LoggingGuard};

use commands::common::load_config;
use commands::fetch::FetchArgs;
use commands::geohash::GeoHashCommands;
use commands::polyfile::PolyfileArgs;
use commands::prefetch::PrefetchArgs;
use commands::project::ProjectArgs;
#[cfg(feature = "server")]
use commands::serve::ServeArgs;
use error::CliError;

#[derive(Parser)]
#[command(name = "maptiles")]
#[command(version, about = "Map tile fetching, caching and geo-encoding tools", long_about = None)]
struct Cli {
    /// Configuration file (defaults to ~/.maptiles/config.ini)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List configured tile providers
    Providers,

    /// Download a single tile
    Fetch(FetchArgs),

    /// Fetch every tile covering an area
    Prefetch(PrefetchArgs),

    /// Show the pixel and tile a coordinate projects to
    Project(ProjectArgs),

    /// GeoHash encoding and decoding
    Geohash {
        #[command(subcommand)]
        command: GeoHashCommands,
    },

    /// Encode a polyfile as per-zoom paths (JSON on stdout)
    Polyfile(PolyfileArgs),

    /// Serve tiles over HTTP
    #[cfg(feature = "server")]
    Serve(ServeArgs),
}

impl Commands {
    /// Long-running commands log to the configured file as well as stdout.
    fn logs_to_file(&self) -> bool {
        match self {
            #[cfg(feature = "server")]
            Commands::Serve(_) => true,
            _ => false,
        }
    }
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        e.exit();
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let config = load_config(cli.config.as_deref())?;
    let _logging = init(&cli, &config)?;

    match cli.command {
        Commands::Providers => commands::providers::run(&config),
        Commands::Fetch(args) => commands::fetch::run(args, &config),
        Commands::Prefetch(args) => commands::prefetch::run(args, &config),
        Commands::Project(args) => commands::project::run(args),
        Commands::Geohash { command } => commands::geohash::run(command),
        Commands::Polyfile(args) => commands::polyfile::run(args),
        #[cfg(feature = "server")]
        Commands::Serve(args) => commands::serve::run(args, &config),
    }
}

fn init(cli: &Cli, config: &ConfigFile) -> Result<Option<LoggingGuard>, CliError> {
    if cli.command.logs_to_file() {
        let guard = init_logging(&config.logging.directory, &config.logging.file)
            .map_err(CliError::LoggingInit)?;
        return Ok(Some(guard));
    }

    init_stderr_logging(cli.verbose);
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_fetch_by_coordinate() {
        let cli = Cli::parse_from([
            "maptiles", "fetch", "--zoom", "12", "--lat", "-33.86", "--lon", "151.2", "-o", "t.png",
        ]);
        match cli.command {
            Commands::Fetch(args) => {
                assert_eq!(args.lat, Some(-33.86));
                assert_eq!(args.x, None);
            }
            _ => panic!("expected fetch"),
        }
    }

    #[test]
    fn test_fetch_rejects_mixed_position() {
        let result = Cli::try_parse_from([
            "maptiles", "fetch", "--zoom", "1", "--x", "0", "--y", "0", "--lat", "1", "--lon",
            "1", "-o", "-",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_global_config_flag() {
        let cli = Cli::parse_from(["maptiles", "providers", "--config", "/tmp/x.ini"]);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/x.ini")));
        assert!(!cli.command.logs_to_file());
    }
}
