//! Metrics listener configuration parsing from environment variables.

use super::{EnvLookup, parse_or};
use anyhow::Result;

/// Metrics scrape listener configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservabilityEnvConfig {
    pub port: u16,
    pub bind_address: String,
}

impl Default for ObservabilityEnvConfig {
    fn default() -> Self {
        Self {
            port: 9988,
            bind_address: "0.0.0.0".to_string(),
        }
    }
}

impl ObservabilityEnvConfig {
    pub fn from_lookup(lookup: &EnvLookup<'_>) -> Result<Self> {
        let defaults = Self::default();
        Ok(Self {
            port: parse_or(lookup, "METRICS_PORT", defaults.port)?,
            bind_address: lookup("METRICS_BIND_ADDRESS").unwrap_or(defaults.bind_address),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::tests::lookup_from;

    #[test]
    fn test_observability_config_defaults() {
        let config = ObservabilityEnvConfig::from_lookup(&lookup_from(&[])).unwrap();
        assert_eq!(config.port, 9988);
        assert_eq!(config.bind_address, "0.0.0.0");
    }

    #[test]
    fn test_observability_config_rejects_bad_port() {
        let lookup = lookup_from(&[("METRICS_PORT", "99999")]);
        assert!(ObservabilityEnvConfig::from_lookup(&lookup).is_err());
    }
}
