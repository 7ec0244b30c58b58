//! Pubsub Workflow - publishes to four load tiers on independent timers
//!
//! | Tier    | Component             | Topic          | Period |
//! |---------|-----------------------|----------------|--------|
//! | rapid   | `longhaul-sb-rapid`   | `rapidtopic`   | 10s    |
//! | medium  | `longhaul-sb-medium`  | `mediumtopic`  | 5m     |
//! | slow    | `longhaul-sb-slow`    | `slowtopic`    | 1h     |
//! | glacial | `longhaul-sb-glacial` | `glacialtopic` | 12h    |
//!
//! # Environment Variables
//! - `APP_PORT` - App listener port (also `DaprHTTPAppPort` in `appsettings.json`)
//! - `METRICS_PORT` - Prometheus scrape port (default: 9988)
//! - `PUBLISH_TIERS` - Comma-separated subset of tiers to run (default: all)

use anyhow::Result;
use clap::Parser;
use longhaul_publishers::application::system::{Application, Workload, shutdown_signal};
use longhaul_publishers::config::{CliOverrides, Config};
use longhaul_publishers::domain::routes::Tier;
use longhaul_publishers::infrastructure::observability::logging::init_tracing;
use tracing::{error, info};

#[derive(Parser)]
#[command(author, version, about = "Publishes to the longhaul load tiers", long_about = None)]
struct Cli {
    /// Tiers to run
    #[arg(
        long,
        env = "PUBLISH_TIERS",
        value_delimiter = ',',
        default_value = "rapid,medium,slow,glacial"
    )]
    tiers: Vec<Tier>,

    #[command(flatten)]
    overrides: CliOverrides,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    init_tracing();

    let cli = Cli::parse();

    let mut tiers = cli.tiers;
    tiers.sort();
    tiers.dedup();

    info!("Pubsub Workflow {} starting...", env!("CARGO_PKG_VERSION"));

    let config = Config::load(&cli.overrides)?;
    info!(
        "Configuration loaded: Mode={:?}, Tiers={:?}, AppPort={}, MetricsPort={}",
        config.mode, tiers, config.app_port, config.observability.port
    );

    let app = Application::build(config, Workload::PubsubWorkflow { tiers })?;
    let handle = match app.start().await {
        Ok(handle) => handle,
        Err(e) => {
            error!("Startup failed: {:#}", e);
            return Err(e);
        }
    };

    info!(
        "Pubsub workflow running {} publisher(s). Press Ctrl+C to shutdown.",
        handle.publisher_count()
    );
    shutdown_signal().await?;

    handle.shutdown().await;
    Ok(())
}
