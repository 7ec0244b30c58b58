//! Configuration module for the longhaul publishers.
//!
//! Settings come from (lowest to highest precedence) built-in defaults, the
//! optional `appsettings.json`, environment variables (a `.env` file is
//! loaded by the binaries) and command-line flags.

mod host_config;
mod observability_config;
mod sidecar_config;

pub use host_config::{
    AppSettings, CliOverrides, DEFAULT_STARTUP_DELAY, LAUNCHER_ARGS_PLACEHOLDER,
    parse_startup_delay,
};
pub use observability_config::ObservabilityEnvConfig;
pub use sidecar_config::{DEFAULT_DAPR_HTTP_PORT, SidecarEnvConfig};

use anyhow::{Context, Result};
use std::env;
use std::fmt::Display;
use std::str::FromStr;

/// Source of configuration values, keyed by environment variable name
pub type EnvLookup<'a> = dyn Fn(&str) -> Option<String> + 'a;

pub const DEFAULT_APP_PORT: u16 = 3000;

/// Parse `key` if present, otherwise fall back to `default`
pub(crate) fn parse_or<T>(lookup: &EnvLookup<'_>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("{}", e))
            .with_context(|| format!("Failed to parse {}={:?}", key, raw)),
        None => Ok(default),
    }
}

/// Which sidecar implementation the process talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Dapr,
    Mock,
}

impl FromStr for Mode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dapr" => Ok(Mode::Dapr),
            "mock" => Ok(Mode::Mock),
            _ => anyhow::bail!("Invalid PUBSUB_MODE: {}. Must be 'dapr' or 'mock'", s),
        }
    }
}

/// Main process configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub mode: Mode,
    /// Port of the app listener the sidecar calls into
    pub app_port: u16,
    pub app_bind_address: String,
    pub sidecar: SidecarEnvConfig,
    pub observability: ObservabilityEnvConfig,
}

impl Config {
    /// Load configuration with the full precedence chain:
    /// defaults < settings file < environment < CLI flags.
    pub fn load(overrides: &CliOverrides) -> Result<Self> {
        let settings = AppSettings::load_optional(&overrides.settings)?;
        let mut config = Self::from_lookup(&|key: &str| env::var(key).ok(), &settings)?;
        config.apply(overrides);
        Ok(config)
    }

    pub fn from_lookup(lookup: &EnvLookup<'_>, settings: &AppSettings) -> Result<Self> {
        let mode_str = lookup("PUBSUB_MODE").unwrap_or_else(|| "dapr".to_string());
        let mode = Mode::from_str(&mode_str)?;

        let app_port = parse_or(
            lookup,
            "APP_PORT",
            settings.dapr_http_app_port.unwrap_or(DEFAULT_APP_PORT),
        )?;

        let sidecar =
            SidecarEnvConfig::from_lookup(lookup).context("Failed to load sidecar config")?;
        let observability = ObservabilityEnvConfig::from_lookup(lookup)
            .context("Failed to load observability config")?;

        Ok(Self {
            mode,
            app_port,
            app_bind_address: lookup("APP_BIND_ADDRESS").unwrap_or_else(|| "0.0.0.0".to_string()),
            sidecar,
            observability,
        })
    }

    /// Command-line flags take precedence over everything else
    pub fn apply(&mut self, overrides: &CliOverrides) {
        if let Some(mode) = overrides.mode {
            self.mode = mode;
        }
        if let Some(port) = overrides.app_port {
            self.app_port = port;
        }
        if let Some(port) = overrides.metrics_port {
            self.observability.port = port;
        }
    }

    pub fn app_addr(&self) -> Result<std::net::SocketAddr> {
        format!("{}:{}", self.app_bind_address, self.app_port)
            .parse()
            .with_context(|| format!("Invalid app listener address {}", self.app_bind_address))
    }

    pub fn metrics_addr(&self) -> Result<std::net::SocketAddr> {
        format!(
            "{}:{}",
            self.observability.bind_address, self.observability.port
        )
        .parse()
        .with_context(|| {
            format!(
                "Invalid metrics listener address {}",
                self.observability.bind_address
            )
        })
    }
}
