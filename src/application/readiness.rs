//! Startup gate that holds the process until the sidecar answers.

use crate::domain::errors::SidecarError;
use crate::domain::ports::PubSubClient;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info};

/// Default bound on the whole wait
pub const DEFAULT_READY_TIMEOUT: Duration = Duration::from_secs(60);
/// Default pause between probes
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Probe the sidecar until it reports ready.
///
/// The bound covers the probes themselves, so a probe that never returns
/// still ends in [`SidecarError::NotReady`] once `timeout` elapses.
pub async fn wait_for_sidecar(
    client: &dyn PubSubClient,
    timeout: Duration,
    poll_interval: Duration,
) -> Result<(), SidecarError> {
    info!("Waiting for sidecar to be ready (timeout: {:?})...", timeout);
    let started = Instant::now();

    let probe_loop = async {
        let mut attempt: u64 = 0;
        loop {
            attempt += 1;
            match client.check_health().await {
                Ok(()) => return attempt,
                Err(e) => debug!("Sidecar probe #{} not ready: {}", attempt, e),
            }
            tokio::time::sleep(poll_interval).await;
        }
    };

    match tokio::time::timeout(timeout, probe_loop).await {
        Ok(attempts) => {
            info!(
                "Sidecar ready after {} probe(s) in {:?}",
                attempts,
                started.elapsed()
            );
            Ok(())
        }
        Err(_) => Err(SidecarError::NotReady { waited: timeout }),
    }
}
