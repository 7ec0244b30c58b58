//! Process lifecycle: listeners, readiness gate and publisher tasks.

use crate::application::publisher::{Cadence, MessagePublisher};
use crate::application::readiness::wait_for_sidecar;
use crate::config::{Config, Mode};
use crate::domain::ports::PubSubClient;
use crate::domain::routes::{PubSubRoute, TIER_INITIAL_DELAY, Tier};
use crate::infrastructure::app_host::app_router;
use crate::infrastructure::observability::Metrics;
use crate::infrastructure::observability::metrics::{
    FEED_GENERATOR_PREFIX, PUBSUB_WORKFLOW_PREFIX,
};
use crate::infrastructure::observability::server::metrics_router;
use crate::infrastructure::{DaprClient, MockPubSubClient, http_server};
use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// What a process publishes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Workload {
    /// One route, fixed delay between publishes
    FeedGenerator { delay: Duration },
    /// One periodic publisher per tier
    PubsubWorkflow { tiers: Vec<Tier> },
}

impl Workload {
    pub fn name(&self) -> &'static str {
        match self {
            Workload::FeedGenerator { .. } => "feed-generator",
            Workload::PubsubWorkflow { .. } => "pubsub-workflow",
        }
    }

    pub fn metrics_prefix(&self) -> &'static str {
        match self {
            Workload::FeedGenerator { .. } => FEED_GENERATOR_PREFIX,
            Workload::PubsubWorkflow { .. } => PUBSUB_WORKFLOW_PREFIX,
        }
    }

    /// Routes and cadences this workload schedules
    pub fn schedule(&self) -> Vec<(PubSubRoute, Cadence)> {
        match self {
            Workload::FeedGenerator { delay } => {
                vec![(PubSubRoute::feed(), Cadence::FixedDelay(*delay))]
            }
            Workload::PubsubWorkflow { tiers } => tiers
                .iter()
                .map(|tier| {
                    (
                        tier.route(),
                        Cadence::Periodic {
                            initial_delay: TIER_INITIAL_DELAY,
                            period: tier.period(),
                        },
                    )
                })
                .collect(),
        }
    }
}

pub struct Application {
    config: Config,
    workload: Workload,
    client: Arc<dyn PubSubClient>,
    metrics: Metrics,
}

impl Application {
    /// Build the application with the sidecar client selected by `config.mode`
    pub fn build(config: Config, workload: Workload) -> Result<Self> {
        let client: Arc<dyn PubSubClient> = match config.mode {
            Mode::Dapr => {
                let dapr = DaprClient::new(
                    &config.sidecar.endpoint,
                    config.sidecar.api_token.clone(),
                    config.sidecar.request_timeout,
                )
                .context("Failed to create sidecar client")?;
                info!("Using Dapr sidecar at {}", dapr.endpoint());
                Arc::new(dapr)
            }
            Mode::Mock => {
                warn!("PUBSUB_MODE=mock: messages are kept in memory, nothing reaches a broker");
                Arc::new(MockPubSubClient::new())
            }
        };

        Self::with_client(config, workload, client)
    }

    pub fn with_client(
        config: Config,
        workload: Workload,
        client: Arc<dyn PubSubClient>,
    ) -> Result<Self> {
        let metrics = Metrics::new(workload.metrics_prefix())?;
        // Series read 0 from the first scrape, before the readiness gate
        for (route, _) in workload.schedule() {
            metrics.for_route(&route);
        }

        Ok(Self {
            config,
            workload,
            client,
            metrics,
        })
    }

    /// Start listeners, wait for the sidecar, then spawn the publishers.
    ///
    /// Fails when a listener cannot bind or the sidecar is not ready in time.
    pub async fn start(self) -> Result<ApplicationHandle> {
        let shutdown = CancellationToken::new();
        let mut servers = Vec::new();

        let metrics_listener = http_server::bind(self.config.metrics_addr()?).await?;
        let metrics_addr = metrics_listener.local_addr()?;
        servers.push(tokio::spawn(http_server::serve(
            "metrics",
            metrics_listener,
            metrics_router(self.metrics.clone()),
            shutdown.clone(),
        )));

        let app_listener = match http_server::bind(self.config.app_addr()?).await {
            Ok(listener) => listener,
            Err(e) => {
                shutdown.cancel();
                return Err(e);
            }
        };
        let app_addr = app_listener.local_addr()?;
        servers.push(tokio::spawn(http_server::serve(
            "app",
            app_listener,
            app_router(),
            shutdown.clone(),
        )));

        if let Err(e) = wait_for_sidecar(
            self.client.as_ref(),
            self.config.sidecar.ready_timeout,
            self.config.sidecar.poll_interval,
        )
        .await
        {
            shutdown.cancel();
            return Err(e).context("Sidecar readiness gate failed");
        }

        info!("Starting {}", self.workload.name());

        let publishers = self
            .workload
            .schedule()
            .into_iter()
            .map(|(route, cadence)| {
                let publisher = MessagePublisher::new(self.client.clone(), route, &self.metrics);
                tokio::spawn(publisher.run(cadence, shutdown.clone()))
            })
            .collect();

        Ok(ApplicationHandle {
            name: self.workload.name(),
            metrics: self.metrics,
            metrics_addr,
            app_addr,
            shutdown,
            publishers,
            servers,
        })
    }
}

/// A running application
pub struct ApplicationHandle {
    name: &'static str,
    pub metrics: Metrics,
    pub metrics_addr: SocketAddr,
    pub app_addr: SocketAddr,
    shutdown: CancellationToken,
    publishers: Vec<JoinHandle<()>>,
    servers: Vec<JoinHandle<Result<()>>>,
}

impl ApplicationHandle {
    pub fn publisher_count(&self) -> usize {
        self.publishers.len()
    }

    /// Stop publishers and listeners. In-flight publishes are abandoned.
    pub async fn shutdown(self) {
        info!("Exiting {}", self.name);
        self.shutdown.cancel();

        for result in futures::future::join_all(self.publishers).await {
            if let Err(e) = result {
                error!("Publisher task ended abnormally: {}", e);
            }
        }

        for result in futures::future::join_all(self.servers).await {
            match result {
                Ok(Ok(())) => {}
                Ok(Err(e)) => error!("Listener error: {:#}", e),
                Err(e) => error!("Listener task ended abnormally: {}", e),
            }
        }
    }
}

/// Resolves on Ctrl+C or, on Unix, SIGTERM
pub async fn shutdown_signal() -> Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        let mut sigterm =
            signal(SignalKind::terminate()).context("Failed to install SIGTERM handler")?;
        tokio::select! {
            res = tokio::signal::ctrl_c() => res.context("Failed to listen for Ctrl+C")?,
            _ = sigterm.recv() => {}
        }
    }

    #[cfg(not(unix))]
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl+C")?;

    info!("Shutdown signal received");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feed_generator_schedule() {
        let workload = Workload::FeedGenerator {
            delay: Duration::from_millis(250),
        };
        assert_eq!(
            workload.schedule(),
            vec![(
                PubSubRoute::feed(),
                Cadence::FixedDelay(Duration::from_millis(250))
            )]
        );
        assert_eq!(workload.metrics_prefix(), "lh_feed_generator");
    }

    #[test]
    fn test_route_series_exported_before_start() {
        let app = Application::with_client(
            Config {
                mode: Mode::Mock,
                app_port: 0,
                app_bind_address: "127.0.0.1".to_string(),
                sidecar: Default::default(),
                observability: Default::default(),
            },
            Workload::PubsubWorkflow {
                tiers: vec![Tier::Rapid, Tier::Glacial],
            },
            Arc::new(MockPubSubClient::never_ready()),
        )
        .expect("build");

        let output = app.metrics.render();
        assert!(output.contains(
            r#"lh_pubsub_workflow_publish_failure_count{pubsub="longhaul-sb-rapid",topic="rapidtopic"} 0"#
        ));
        assert!(output.contains(
            r#"lh_pubsub_workflow_publish_call_time{pubsub="longhaul-sb-glacial",topic="glacialtopic"} 0"#
        ));
        assert!(!output.contains("longhaul-sb-medium"));
    }

    #[test]
    fn test_workflow_schedule() {
        let workload = Workload::PubsubWorkflow {
            tiers: Tier::ALL.to_vec(),
        };
        let schedule = workload.schedule();

        assert_eq!(schedule.len(), 4);
        for ((route, cadence), tier) in schedule.iter().zip(Tier::ALL) {
            assert_eq!(*route, tier.route());
            assert_eq!(
                *cadence,
                Cadence::Periodic {
                    initial_delay: Duration::from_secs(5),
                    period: tier.period(),
                }
            );
        }
    }
}
