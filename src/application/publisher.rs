//! Best-effort periodic publisher, one per route.
//!
//! Each tick builds a fresh [`SocialMediaMessage`](crate::domain::message::SocialMediaMessage),
//! publishes it once and records the outcome. Errors are logged and counted,
//! never propagated: a failed tick has no effect on the next one.

use crate::domain::errors::SidecarError;
use crate::domain::message::generate_post;
use crate::domain::ports::PubSubClient;
use crate::domain::routes::PubSubRoute;
use crate::infrastructure::observability::{Metrics, RouteMetrics};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use uuid::Uuid;

/// When a publisher fires
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cadence {
    /// Sleep, publish, repeat. The next sleep starts once the call returns.
    FixedDelay(Duration),
    /// First tick after `initial_delay`, then every `period` regardless of
    /// how long individual publishes take.
    Periodic {
        initial_delay: Duration,
        period: Duration,
    },
}

/// Result of a single tick
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    Published { message_id: Uuid, latency: Duration },
    Failed { message_id: Uuid, reason: String },
}

#[derive(Clone)]
pub struct MessagePublisher {
    client: Arc<dyn PubSubClient>,
    route: PubSubRoute,
    metrics: RouteMetrics,
}

impl MessagePublisher {
    pub fn new(client: Arc<dyn PubSubClient>, route: PubSubRoute, metrics: &Metrics) -> Self {
        let metrics = metrics.for_route(&route);
        Self {
            client,
            route,
            metrics,
        }
    }

    /// Build one message and publish it once
    pub async fn publish_once(&self) -> PublishOutcome {
        let message = generate_post();
        let message_id = message.message_id;

        let result = async {
            let payload = message.to_json_bytes()?;
            info!(
                "Publishing {} to {} (correlation {})",
                message_id, self.route, message.correlation_id
            );

            let timer = self.metrics.start_publish_timer();
            self.client
                .publish_event(&self.route.pubsub_name, &self.route.topic, &payload)
                .await?;
            Ok::<Duration, SidecarError>(timer.elapsed())
        }
        .await;

        match result {
            Ok(latency) => {
                self.metrics.inc_successes();
                PublishOutcome::Published {
                    message_id,
                    latency,
                }
            }
            Err(e) => {
                error!("Publish to {} failed: {}", self.route, e);
                self.metrics.inc_failures();
                PublishOutcome::Failed {
                    message_id,
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Drive the publisher until `shutdown` fires
    pub async fn run(self, cadence: Cadence, shutdown: CancellationToken) {
        info!("Publisher {} starting with {:?}", self.route, cadence);

        match cadence {
            Cadence::FixedDelay(delay) => self.run_fixed_delay(delay, &shutdown).await,
            Cadence::Periodic {
                initial_delay,
                period,
            } => self.run_periodic(initial_delay, period, &shutdown).await,
        }

        info!("Publisher {} stopped", self.route);
    }

    async fn run_fixed_delay(&self, delay: Duration, shutdown: &CancellationToken) {
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => return,
                _ = tokio::time::sleep(delay) => {}
            }

            tokio::select! {
                _ = shutdown.cancelled() => return,
                _ = self.publish_once() => {}
            }
        }
    }

    async fn run_periodic(
        &self,
        initial_delay: Duration,
        period: Duration,
        shutdown: &CancellationToken,
    ) {
        let mut ticker = tokio::time::interval_at(Instant::now() + initial_delay, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        // In-flight ticks are dropped with the set on shutdown
        let mut in_flight = JoinSet::new();

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => return,
                _ = ticker.tick() => {
                    let publisher = self.clone();
                    in_flight.spawn(async move { publisher.publish_once().await });
                }
                Some(_) = in_flight.join_next(), if !in_flight.is_empty() => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::message::SocialMediaMessage;
    use crate::infrastructure::mock::MockPubSubClient;
    use crate::infrastructure::observability::metrics::FEED_GENERATOR_PREFIX;
    use std::collections::HashSet;

    fn setup() -> (MockPubSubClient, Metrics, MessagePublisher) {
        let mock = MockPubSubClient::new();
        let metrics = Metrics::new(FEED_GENERATOR_PREFIX).expect("Failed to create metrics");
        let publisher =
            MessagePublisher::new(Arc::new(mock.clone()), PubSubRoute::feed(), &metrics);
        (mock, metrics, publisher)
    }

    #[tokio::test]
    async fn test_success_does_not_count_failure() {
        let (mock, metrics, publisher) = setup();

        let outcome = publisher.publish_once().await;

        assert!(matches!(outcome, PublishOutcome::Published { .. }));
        let route = metrics.for_route(&PubSubRoute::feed());
        assert_eq!(route.failures(), 0.0);
        assert_eq!(route.successes(), 1.0);

        let published = mock.published().await;
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].pubsub_name, "receivemediapost");
        assert_eq!(published[0].topic, "receivemediapost");

        let body: SocialMediaMessage =
            serde_json::from_slice(&published[0].payload).expect("payload is a message");
        match outcome {
            PublishOutcome::Published { message_id, .. } => {
                assert_eq!(body.message_id, message_id)
            }
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_failure_counts_exactly_once() {
        let (mock, metrics, publisher) = setup();
        mock.set_failing("receivemediapost", true).await;

        let outcome = publisher.publish_once().await;

        assert!(matches!(outcome, PublishOutcome::Failed { .. }));
        let route = metrics.for_route(&PubSubRoute::feed());
        assert_eq!(route.failures(), 1.0);
        assert_eq!(route.successes(), 0.0);
        assert_eq!(mock.publish_attempts(), 1);
    }

    #[tokio::test]
    async fn test_publish_sets_call_time_gauge() {
        let (mock, metrics, publisher) = setup();
        mock.set_stall("receivemediapost", Duration::from_millis(20)).await;

        publisher.publish_once().await;

        assert!(metrics.for_route(&PubSubRoute::feed()).last_call_time() >= 0.02);
    }

    #[tokio::test]
    async fn test_ticks_use_fresh_ids() {
        let (mock, _metrics, publisher) = setup();

        for _ in 0..50 {
            publisher.publish_once().await;
        }

        let mut ids = HashSet::new();
        for event in mock.published().await {
            let msg: SocialMediaMessage = serde_json::from_slice(&event.payload).expect("message");
            assert!(ids.insert(msg.correlation_id));
            assert!(ids.insert(msg.message_id));
        }
        assert_eq!(ids.len(), 100);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fixed_delay_first_attempt_not_before_delay() {
        let (mock, _metrics, publisher) = setup();
        let shutdown = CancellationToken::new();
        let started = Instant::now();
        let delay = Duration::from_millis(1500);

        let handle = tokio::spawn(publisher.run(Cadence::FixedDelay(delay), shutdown.clone()));

        tokio::time::sleep(delay - Duration::from_millis(1)).await;
        assert_eq!(mock.publish_attempts(), 0);

        // Attempts at 1.5s, 3.0s and 4.5s; stop at 5.0s
        tokio::time::sleep(Duration::from_millis(1) + 2 * delay + Duration::from_millis(500)).await;
        shutdown.cancel();
        handle.await.expect("publisher task");

        let published = mock.published().await;
        assert_eq!(published.len(), 3);
        assert!(published[0].at - started >= delay);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fixed_delay_survives_failures() {
        let (mock, metrics, publisher) = setup();
        mock.set_failing("receivemediapost", true).await;
        let shutdown = CancellationToken::new();

        let handle = tokio::spawn(
            publisher.run(Cadence::FixedDelay(Duration::from_secs(1)), shutdown.clone()),
        );

        tokio::time::sleep(Duration::from_millis(3500)).await;
        mock.set_failing("receivemediapost", false).await;
        tokio::time::sleep(Duration::from_secs(2)).await;
        shutdown.cancel();
        handle.await.expect("publisher task");

        let route = metrics.for_route(&PubSubRoute::feed());
        assert_eq!(route.failures(), 3.0);
        assert_eq!(route.successes(), 2.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_periodic_slow_publish_does_not_delay_next_tick() {
        let (mock, _metrics, publisher) = setup();
        mock.set_stall("receivemediapost", Duration::from_secs(25)).await;
        let shutdown = CancellationToken::new();

        let handle = tokio::spawn(publisher.run(
            Cadence::Periodic {
                initial_delay: Duration::from_secs(5),
                period: Duration::from_secs(10),
            },
            shutdown.clone(),
        ));

        // Ticks at 5, 15, 25 and 35 have all started by t=36
        tokio::time::sleep(Duration::from_secs(36)).await;
        assert_eq!(mock.publish_attempts(), 4);

        shutdown.cancel();
        handle.await.expect("publisher task");
    }
}
