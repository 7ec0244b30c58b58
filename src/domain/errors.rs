use std::time::Duration;
use thiserror::Error;

/// Errors raised while talking to the pub/sub sidecar
#[derive(Debug, Error)]
pub enum SidecarError {
    #[error("Sidecar not ready after {waited:?}")]
    NotReady { waited: Duration },

    #[error("Sidecar request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Sidecar rejected {operation}: status {status}, body: {body}")]
    Rejected {
        operation: &'static str,
        status: u16,
        body: String,
    },

    #[error("Failed to serialize message: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Invalid sidecar endpoint {endpoint}: {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_ready_formatting() {
        let error = SidecarError::NotReady {
            waited: Duration::from_secs(60),
        };
        assert_eq!(error.to_string(), "Sidecar not ready after 60s");
    }

    #[test]
    fn test_rejected_formatting() {
        let error = SidecarError::Rejected {
            operation: "publish",
            status: 500,
            body: "ERR_PUBSUB_PUBLISH_MESSAGE".to_string(),
        };

        let msg = error.to_string();
        assert!(msg.contains("publish"));
        assert!(msg.contains("500"));
        assert!(msg.contains("ERR_PUBSUB_PUBLISH_MESSAGE"));
    }
}
