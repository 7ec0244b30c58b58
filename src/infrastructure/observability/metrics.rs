//! Prometheus metrics for the publishers
//!
//! Every series is labelled by `pubsub` and `topic` so the multi-tier
//! workflow can share one registry.

use crate::domain::routes::PubSubRoute;
use crate::infrastructure::observability::latency_tracker::PublishTimer;
use prometheus::{
    CounterVec, GaugeVec, Opts, Registry, TextEncoder,
    core::{AtomicF64, GenericCounter, GenericGauge},
};
use std::sync::Arc;

/// Metric name prefix of the feed generator process
pub const FEED_GENERATOR_PREFIX: &str = "lh_feed_generator";
/// Metric name prefix of the pubsub workflow process
pub const PUBSUB_WORKFLOW_PREFIX: &str = "lh_pubsub_workflow";

const ROUTE_LABELS: &[&str] = &["pubsub", "topic"];

/// Process-wide metrics registry
#[derive(Clone)]
pub struct Metrics {
    registry: Arc<Registry>,
    /// Duration of the last publish call in seconds
    pub publish_call_time: GaugeVec,
    /// Publish calls that returned an error
    pub publish_failure_count: CounterVec,
    /// Publish calls accepted by the sidecar
    pub publish_success_count: CounterVec,
}

impl Metrics {
    /// Create a registry whose series are named `{prefix}_publish_*`
    pub fn new(prefix: &str) -> anyhow::Result<Self> {
        let registry = Registry::new();

        let publish_call_time = GaugeVec::new(
            Opts::new(
                format!("{prefix}_publish_call_time"),
                "The time it takes for the publish call to return",
            ),
            ROUTE_LABELS,
        )?;
        registry.register(Box::new(publish_call_time.clone()))?;

        let publish_failure_count = CounterVec::new(
            Opts::new(
                format!("{prefix}_publish_failure_count"),
                "Publish calls that fail",
            ),
            ROUTE_LABELS,
        )?;
        registry.register(Box::new(publish_failure_count.clone()))?;

        let publish_success_count = CounterVec::new(
            Opts::new(
                format!("{prefix}_publish_success_count"),
                "Publish calls accepted by the sidecar",
            ),
            ROUTE_LABELS,
        )?;
        registry.register(Box::new(publish_success_count.clone()))?;

        Ok(Self {
            registry: Arc::new(registry),
            publish_call_time,
            publish_failure_count,
            publish_success_count,
        })
    }

    /// Render all metrics in Prometheus text format
    pub fn render(&self) -> String {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        encoder
            .encode_to_string(&metric_families)
            .unwrap_or_default()
    }

    /// Bind the series of one route so the hot path skips label lookups
    pub fn for_route(&self, route: &PubSubRoute) -> RouteMetrics {
        let labels = [route.pubsub_name.as_str(), route.topic.as_str()];
        RouteMetrics {
            call_time: self.publish_call_time.with_label_values(&labels),
            failures: self.publish_failure_count.with_label_values(&labels),
            successes: self.publish_success_count.with_label_values(&labels),
        }
    }
}

/// Series of a single pubsub/topic pair
#[derive(Clone)]
pub struct RouteMetrics {
    call_time: GenericGauge<AtomicF64>,
    failures: GenericCounter<AtomicF64>,
    successes: GenericCounter<AtomicF64>,
}

impl RouteMetrics {
    /// Starts timing a publish call; the gauge is set when the guard drops
    pub fn start_publish_timer(&self) -> PublishTimer {
        PublishTimer::new(self.call_time.clone())
    }

    pub fn inc_failures(&self) {
        self.failures.inc();
    }

    pub fn inc_successes(&self) {
        self.successes.inc();
    }

    pub fn failures(&self) -> f64 {
        self.failures.get()
    }

    pub fn successes(&self) -> f64 {
        self.successes.get()
    }

    pub fn last_call_time(&self) -> f64 {
        self.call_time.get()
    }
}
