//! Client configuration

use std::time::Duration;

/// Configuration for connecting to the order document endpoint
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Server base URL (e.g., "http://localhost:8080")
    pub base_url: String,

    /// Collection holding the order documents
    pub collection: String,

    /// Bearer token for authentication
    pub token: Option<String>,

    /// Request timeout
    pub timeout: Duration,

    /// Delay between two polls while healthy
    pub poll_interval: Duration,

    /// Upper bound of the backoff after consecutive failures
    pub max_reconnect_delay: Duration,
}

impl ClientConfig {
    /// Create a new client configuration
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            collection: shared::feed::ORDERS_COLLECTION.to_string(),
            token: None,
            timeout: Duration::from_secs(10),
            poll_interval: Duration::from_secs(2),
            max_reconnect_delay: Duration::from_secs(30),
        }
    }

    /// Set the collection name
    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = collection.into();
        self
    }

    /// Set the bearer token
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the poll interval
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Set the backoff cap
    pub fn with_max_reconnect_delay(mut self, delay: Duration) -> Self {
        self.max_reconnect_delay = delay;
        self
    }

    /// Backoff after a failed poll: doubles, never below the poll interval,
    /// never above the cap
    pub fn next_delay(&self, current: Duration) -> Duration {
        current
            .max(self.poll_interval)
            .saturating_mul(2)
            .min(self.max_reconnect_delay.max(self.poll_interval))
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new("http://localhost:8080")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = ClientConfig::new("http://kds.local")
            .with_token("secret")
            .with_timeout(Duration::from_secs(3))
            .with_poll_interval(Duration::from_millis(500));

        assert_eq!(config.base_url, "http://kds.local");
        assert_eq!(config.collection, "orders");
        assert_eq!(config.token.as_deref(), Some("secret"));
        assert_eq!(config.timeout, Duration::from_secs(3));
        assert_eq!(config.poll_interval, Duration::from_millis(500));
    }

    #[test]
    fn test_backoff_doubles_up_to_cap() {
        let config = ClientConfig::default()
            .with_poll_interval(Duration::from_secs(1))
            .with_max_reconnect_delay(Duration::from_secs(5));

        let d1 = config.next_delay(config.poll_interval);
        let d2 = config.next_delay(d1);
        let d3 = config.next_delay(d2);
        assert_eq!(d1, Duration::from_secs(2));
        assert_eq!(d2, Duration::from_secs(4));
        assert_eq!(d3, Duration::from_secs(5));
        assert_eq!(config.next_delay(d3), Duration::from_secs(5));
    }

    #[test]
    fn test_backoff_cap_below_interval() {
        let config = ClientConfig::default()
            .with_poll_interval(Duration::from_secs(4))
            .with_max_reconnect_delay(Duration::from_secs(1));
        assert_eq!(config.next_delay(Duration::ZERO), Duration::from_secs(4));
    }
}
