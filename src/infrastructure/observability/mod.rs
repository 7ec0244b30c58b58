//! Pull-based observability for the publishers
//!
//! Counters and gauges live in a Prometheus registry owned by [`Metrics`]
//! and are exposed over HTTP by [`server`] for scraping. [`logging`] sets up
//! the tracing subscriber.

pub mod latency_tracker;
pub mod logging;
pub mod metrics;
pub mod server;

pub use latency_tracker::PublishTimer;
pub use metrics::{Metrics, RouteMetrics};
