//! Sidecar connection configuration parsing from environment variables.

use super::{EnvLookup, parse_or};
use crate::application::readiness::{DEFAULT_POLL_INTERVAL, DEFAULT_READY_TIMEOUT};
use anyhow::Result;
use std::time::Duration;

pub const DEFAULT_DAPR_HTTP_PORT: u16 = 3500;

/// How to reach the sidecar and how long to wait for it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SidecarEnvConfig {
    pub endpoint: String,
    pub api_token: Option<String>,
    pub ready_timeout: Duration,
    pub poll_interval: Duration,
    pub request_timeout: Duration,
}

impl Default for SidecarEnvConfig {
    fn default() -> Self {
        Self {
            endpoint: format!("http://127.0.0.1:{}", DEFAULT_DAPR_HTTP_PORT),
            api_token: None,
            ready_timeout: DEFAULT_READY_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl SidecarEnvConfig {
    pub fn from_lookup(lookup: &EnvLookup<'_>) -> Result<Self> {
        let endpoint = match lookup("DAPR_HTTP_ENDPOINT").filter(|e| !e.is_empty()) {
            Some(endpoint) => endpoint,
            None => {
                let port: u16 = parse_or(lookup, "DAPR_HTTP_PORT", DEFAULT_DAPR_HTTP_PORT)?;
                format!("http://127.0.0.1:{}", port)
            }
        };

        let ready_timeout_secs: u64 = parse_or(
            lookup,
            "SIDECAR_READY_TIMEOUT_SECS",
            DEFAULT_READY_TIMEOUT.as_secs(),
        )?;
        let poll_interval_ms: u64 = parse_or(
            lookup,
            "SIDECAR_POLL_INTERVAL_MS",
            DEFAULT_POLL_INTERVAL.as_millis() as u64,
        )?;
        let request_timeout_secs: u64 = parse_or(lookup, "PUBLISH_TIMEOUT_SECS", 30)?;

        if poll_interval_ms == 0 {
            anyhow::bail!("SIDECAR_POLL_INTERVAL_MS must be greater than 0");
        }

        Ok(Self {
            endpoint,
            api_token: lookup("DAPR_API_TOKEN").filter(|t| !t.is_empty()),
            ready_timeout: Duration::from_secs(ready_timeout_secs),
            poll_interval: Duration::from_millis(poll_interval_ms),
            request_timeout: Duration::from_secs(request_timeout_secs),
        })
    }
}
