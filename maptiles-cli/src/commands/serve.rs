//! Serve command - run the HTTP tile server.

use std::net::SocketAddr;
use std::sync::Arc;

use clap::Args;
use maptiles::config::ConfigFile;
use maptiles::server;
use tracing::{info, warn};

use super::common::{build_client, runtime};
use crate::error::CliError;

/// Arguments for the serve command.
#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Address to listen on
    #[arg(long, default_value = "127.0.0.1:8080")]
    pub bind: SocketAddr,
}

/// Run the serve command until Ctrl+C.
pub fn run(args: ServeArgs, config: &ConfigFile) -> Result<(), CliError> {
    let client = Arc::new(build_client(config)?);

    println!("Serving tiles on http://{}/tiles/{{provider}}/{{zoom}}/{{x}}/{{y}}", args.bind);
    println!("Press Ctrl+C to stop");

    runtime()?
        .block_on(server::serve(args.bind, client, shutdown_signal()))
        .map_err(CliError::Serve)
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown requested"),
        // Without a signal handler the server runs until killed
        Err(e) => {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await
        }
    }
}
