use crate::domain::errors::SidecarError;
use async_trait::async_trait;

/// Broker access through the co-located sidecar.
///
/// Implementations perform exactly one round trip per call; retrying is the
/// caller's decision.
#[async_trait]
pub trait PubSubClient: Send + Sync {
    /// Single readiness probe. `Ok(())` means the sidecar can reach its
    /// outbound components.
    async fn check_health(&self) -> Result<(), SidecarError>;

    /// Publish an already-serialized JSON payload to `pubsub_name`/`topic`.
    async fn publish_event(
        &self,
        pubsub_name: &str,
        topic: &str,
        payload: &[u8],
    ) -> Result<(), SidecarError>;
}
