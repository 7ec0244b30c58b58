use crate::domain::errors::SidecarError;
use crate::domain::ports::PubSubClient;
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::info;

/// Accepted publishes kept for inspection; older ones are dropped
pub const RETAINED_EVENTS: usize = 1_000;

/// A publish accepted by [`MockPubSubClient`]
#[derive(Debug, Clone)]
pub struct PublishedEvent {
    pub pubsub_name: String,
    pub topic: String,
    pub payload: Vec<u8>,
    pub at: tokio::time::Instant,
}

/// In-process stand-in for the sidecar.
///
/// Becomes healthy after a configurable number of probes, keeps the most
/// recent accepted publishes and can be told to fail or stall per pubsub
/// component.
#[derive(Clone)]
pub struct MockPubSubClient {
    probes_until_ready: Option<usize>,
    probes: Arc<AtomicUsize>,
    publish_attempts: Arc<AtomicUsize>,
    accepted: Arc<AtomicUsize>,
    published: Arc<RwLock<VecDeque<PublishedEvent>>>,
    failing: Arc<RwLock<HashMap<String, bool>>>,
    stalls: Arc<RwLock<HashMap<String, Duration>>>,
}

impl Default for MockPubSubClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MockPubSubClient {
    fn with_readiness(probes_until_ready: Option<usize>) -> Self {
        Self {
            probes_until_ready,
            probes: Arc::new(AtomicUsize::new(0)),
            publish_attempts: Arc::new(AtomicUsize::new(0)),
            accepted: Arc::new(AtomicUsize::new(0)),
            published: Arc::new(RwLock::new(VecDeque::new())),
            failing: Arc::new(RwLock::new(HashMap::new())),
            stalls: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Healthy from the first probe
    pub fn new() -> Self {
        Self::with_readiness(Some(0))
    }

    /// Healthy once `n` probes have failed
    pub fn ready_after(n: usize) -> Self {
        Self::with_readiness(Some(n))
    }

    /// Never becomes healthy
    pub fn never_ready() -> Self {
        Self::with_readiness(None)
    }

    /// Make publishes to `pubsub_name` fail (or succeed again)
    pub async fn set_failing(&self, pubsub_name: &str, failing: bool) {
        self.failing
            .write()
            .await
            .insert(pubsub_name.to_string(), failing);
    }

    /// Make publishes to `pubsub_name` take `delay` before returning
    pub async fn set_stall(&self, pubsub_name: &str, delay: Duration) {
        self.stalls
            .write()
            .await
            .insert(pubsub_name.to_string(), delay);
    }

    pub fn probe_count(&self) -> usize {
        self.probes.load(Ordering::SeqCst)
    }

    pub fn publish_attempts(&self) -> usize {
        self.publish_attempts.load(Ordering::SeqCst)
    }

    /// Publishes accepted so far, including those no longer retained
    pub fn accepted_count(&self) -> usize {
        self.accepted.load(Ordering::SeqCst)
    }

    /// The most recent accepted publishes, oldest first
    pub async fn published(&self) -> Vec<PublishedEvent> {
        self.published.read().await.iter().cloned().collect()
    }

    pub async fn published_to(&self, pubsub_name: &str) -> Vec<PublishedEvent> {
        self.published
            .read()
            .await
            .iter()
            .filter(|e| e.pubsub_name == pubsub_name)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl PubSubClient for MockPubSubClient {
    async fn check_health(&self) -> Result<(), SidecarError> {
        let seen = self.probes.fetch_add(1, Ordering::SeqCst);
        match self.probes_until_ready {
            Some(n) if seen >= n => Ok(()),
            _ => Err(SidecarError::Rejected {
                operation: "health check",
                status: 500,
                body: "mock sidecar not ready".to_string(),
            }),
        }
    }

    async fn publish_event(
        &self,
        pubsub_name: &str,
        topic: &str,
        payload: &[u8],
    ) -> Result<(), SidecarError> {
        self.publish_attempts.fetch_add(1, Ordering::SeqCst);

        let stall = self.stalls.read().await.get(pubsub_name).copied();
        if let Some(delay) = stall {
            tokio::time::sleep(delay).await;
        }

        let failing = self
            .failing
            .read()
            .await
            .get(pubsub_name)
            .copied()
            .unwrap_or(false);
        if failing {
            return Err(SidecarError::Rejected {
                operation: "publish",
                status: 500,
                body: format!("mock failure for {}/{}", pubsub_name, topic),
            });
        }

        {
            let mut published = self.published.write().await;
            published.push_back(PublishedEvent {
                pubsub_name: pubsub_name.to_string(),
                topic: topic.to_string(),
                payload: payload.to_vec(),
                at: tokio::time::Instant::now(),
            });
            while published.len() > RETAINED_EVENTS {
                published.pop_front();
            }
        }

        let accepted = self.accepted.fetch_add(1, Ordering::SeqCst) + 1;
        // Log every 100th publish to avoid spam
        if accepted % 100 == 0 {
            info!("MockPubSubClient: {} events accepted", accepted);
        }
        Ok(())
    }
}
