//! Feed Generator - publishes a synthetic social-media post on a fixed delay
//!
//! Waits for the sidecar, then publishes one message to
//! `receivemediapost/receivemediapost` every `DELAY_MS` milliseconds
//! (default 10000). Publish latency and failures are exported on the
//! metrics port for scraping.
//!
//! # Usage
//! ```sh
//! cargo run --bin feed-generator -- 5000
//! ```

use anyhow::Result;
use clap::Parser;
use longhaul_publishers::application::system::{Application, Workload, shutdown_signal};
use longhaul_publishers::config::{CliOverrides, Config, parse_startup_delay};
use longhaul_publishers::infrastructure::observability::logging::init_tracing;
use tracing::{error, info};

#[derive(Parser)]
#[command(author, version, about = "Publishes synthetic posts on a fixed delay", long_about = None)]
struct Cli {
    /// Delay between publishes in milliseconds (default 10000)
    #[arg(allow_hyphen_values = true)]
    delay_ms: Option<String>,

    #[command(flatten)]
    overrides: CliOverrides,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    init_tracing();

    let cli = Cli::parse();

    let delay = match parse_startup_delay(cli.delay_ms.as_deref()) {
        Ok(delay) => delay,
        Err(e) => {
            error!("{}", e);
            return Err(e);
        }
    };

    info!("Feed Generator {} starting...", env!("CARGO_PKG_VERSION"));

    let config = Config::load(&cli.overrides)?;
    info!(
        "Configuration loaded: Mode={:?}, Delay={:?}, AppPort={}, MetricsPort={}",
        config.mode, delay, config.app_port, config.observability.port
    );

    let app = Application::build(config, Workload::FeedGenerator { delay })?;
    let handle = match app.start().await {
        Ok(handle) => handle,
        Err(e) => {
            error!("Startup failed: {:#}", e);
            return Err(e);
        }
    };

    info!("Feed generator running. Press Ctrl+C to shutdown.");
    shutdown_signal().await?;

    handle.shutdown().await;
    Ok(())
}
