//! Fixed broker routes and their publishing cadences.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Component and topic a publisher writes to
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PubSubRoute {
    pub pubsub_name: String,
    pub topic: String,
}

impl PubSubRoute {
    pub fn new(pubsub_name: impl Into<String>, topic: impl Into<String>) -> Self {
        Self {
            pubsub_name: pubsub_name.into(),
            topic: topic.into(),
        }
    }

    /// Route used by the feed generator. Component and topic share a name.
    pub fn feed() -> Self {
        Self::new(FEED_PUBSUB_NAME, FEED_TOPIC)
    }
}

impl fmt::Display for PubSubRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.pubsub_name, self.topic)
    }
}

pub const FEED_PUBSUB_NAME: &str = "receivemediapost";
pub const FEED_TOPIC: &str = "receivemediapost";

/// Delay before the first tick of every workflow tier
pub const TIER_INITIAL_DELAY: Duration = Duration::from_secs(5);

/// Load tiers of the workflow process
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Tier {
    Rapid,
    Medium,
    Slow,
    Glacial,
}

impl Tier {
    pub const ALL: [Tier; 4] = [Tier::Rapid, Tier::Medium, Tier::Slow, Tier::Glacial];

    pub fn pubsub_name(self) -> &'static str {
        match self {
            Tier::Rapid => "longhaul-sb-rapid",
            Tier::Medium => "longhaul-sb-medium",
            Tier::Slow => "longhaul-sb-slow",
            Tier::Glacial => "longhaul-sb-glacial",
        }
    }

    pub fn topic(self) -> &'static str {
        match self {
            Tier::Rapid => "rapidtopic",
            Tier::Medium => "mediumtopic",
            Tier::Slow => "slowtopic",
            Tier::Glacial => "glacialtopic",
        }
    }

    pub fn period(self) -> Duration {
        match self {
            Tier::Rapid => Duration::from_secs(10),
            Tier::Medium => Duration::from_secs(300),
            Tier::Slow => Duration::from_secs(3600),
            Tier::Glacial => Duration::from_secs(3600 * 12),
        }
    }

    pub fn route(self) -> PubSubRoute {
        PubSubRoute::new(self.pubsub_name(), self.topic())
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Tier::Rapid => "rapid",
            Tier::Medium => "medium",
            Tier::Slow => "slow",
            Tier::Glacial => "glacial",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tier {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "rapid" => Ok(Tier::Rapid),
            "medium" => Ok(Tier::Medium),
            "slow" => Ok(Tier::Slow),
            "glacial" => Ok(Tier::Glacial),
            _ => anyhow::bail!(
                "Invalid tier: {}. Must be 'rapid', 'medium', 'slow' or 'glacial'",
                s
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_tier_table() {
        assert_eq!(Tier::Rapid.period(), Duration::from_secs(10));
        assert_eq!(Tier::Medium.period(), Duration::from_secs(300));
        assert_eq!(Tier::Slow.period(), Duration::from_secs(3600));
        assert_eq!(Tier::Glacial.period(), Duration::from_secs(43_200));
        assert_eq!(
            Tier::Glacial.route(),
            PubSubRoute::new("longhaul-sb-glacial", "glacialtopic")
        );
    }

    #[test]
    fn test_tier_routes_are_distinct() {
        let routes: HashSet<PubSubRoute> = Tier::ALL.iter().map(|t| t.route()).collect();
        assert_eq!(routes.len(), Tier::ALL.len());
    }

    #[test]
    fn test_tier_parsing() {
        assert_eq!(Tier::from_str("RAPID").unwrap(), Tier::Rapid);
        assert_eq!(Tier::from_str("glacial").unwrap(), Tier::Glacial);
        assert!(Tier::from_str("instant").is_err());
    }

    #[test]
    fn test_feed_route() {
        let route = PubSubRoute::feed();
        assert_eq!(route.to_string(), "receivemediapost/receivemediapost");
    }
}
