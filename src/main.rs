//! MTA violations proxy - caching HTTP front for the MTA Bus ACE dataset

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mta_violations::{cli::Cli, web::WebServer};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| cli.log_filter().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting MTA violations proxy v{}", env!("CARGO_PKG_VERSION"));

    let config = cli.to_config()?;
    info!(
        upstream = %config.upstream_url,
        cache_ttl_secs = config.cache_ttl_secs,
        stale_policy = ?config.stale_policy,
        "Configuration loaded"
    );

    let server = WebServer::new(&config)?;
    info!("Starting web server on {}", server.addr());
    server.serve().await
}
