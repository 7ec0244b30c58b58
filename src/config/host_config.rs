//! Command-line flags, the optional settings file and the startup delay argument.

use super::Mode;
use anyhow::{Context, Result};
use clap::Args;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Delay used by the feed generator when no argument is given
pub const DEFAULT_STARTUP_DELAY: Duration = Duration::from_millis(10_000);

/// Left in argv when the launcher did not expand its argument template
pub const LAUNCHER_ARGS_PLACEHOLDER: &str = "%LAUNCHER_ARGS%";

/// Flags shared by both binaries
#[derive(Args, Clone, Debug, Default)]
pub struct CliOverrides {
    /// Port of the app listener the sidecar calls into
    #[arg(long, alias = "DaprHTTPAppPort", env = "APP_PORT")]
    pub app_port: Option<u16>,

    /// Port of the Prometheus scrape listener
    #[arg(long, env = "METRICS_PORT")]
    pub metrics_port: Option<u16>,

    /// Sidecar implementation: dapr or mock
    #[arg(long, env = "PUBSUB_MODE")]
    pub mode: Option<Mode>,

    /// Optional JSON settings file
    #[arg(long, default_value = "appsettings.json", env = "APP_SETTINGS")]
    pub settings: String,
}

/// Keys read from `appsettings.json`
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct AppSettings {
    #[serde(
        rename = "DaprHTTPAppPort",
        default,
        deserialize_with = "port_from_number_or_string"
    )]
    pub dapr_http_app_port: Option<u16>,
}

impl AppSettings {
    /// Read `path` if it exists; a missing file yields the defaults
    pub fn load_optional(path: &str) -> Result<Self> {
        if path.is_empty() || !Path::new(path).exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot read settings file {}", path))?;
        Self::from_json(&content).with_context(|| format!("Bad settings file {}", path))
    }

    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }
}

fn port_from_number_or_string<'de, D>(deserializer: D) -> Result<Option<u16>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u16),
        Text(String),
    }

    match Option::<Raw>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Raw::Number(port)) => Ok(Some(port)),
        Some(Raw::Text(text)) => text
            .trim()
            .parse::<u16>()
            .map(Some)
            .map_err(|e| serde::de::Error::custom(format!("invalid port {:?}: {}", text, e))),
    }
}

/// Interpret the feed generator's optional delay argument (milliseconds).
///
/// A missing argument or the unexpanded launcher placeholder selects
/// [`DEFAULT_STARTUP_DELAY`]; anything else must be a non-negative integer.
pub fn parse_startup_delay(arg: Option<&str>) -> Result<Duration> {
    match arg {
        None => Ok(DEFAULT_STARTUP_DELAY),
        Some(LAUNCHER_ARGS_PLACEHOLDER) => Ok(DEFAULT_STARTUP_DELAY),
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .map(Duration::from_millis)
            .map_err(|_| anyhow::anyhow!("Could not parse delay: {:?}", raw)),
    }
}
