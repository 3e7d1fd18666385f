use crate::{error::ConfigError, feed::FeedName};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000";
pub const DEFAULT_METRICS_INTERVAL: Duration = Duration::from_millis(30_000);
pub const DEFAULT_ORDERS_INTERVAL: Duration = Duration::from_millis(5_000);
pub const DEFAULT_SETTINGS_INTERVAL: Duration = Duration::from_millis(60_000);
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_EVENT_BUFFER: usize = 256;

/// Synchronizer configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    /// Origin of the dashboard backend; endpoint paths are joined onto it
    pub base_url: String,
    /// Poll interval for performance metrics, trading history and trade distribution
    pub metrics_interval: Duration,
    /// Poll interval for open orders
    pub orders_interval: Duration,
    /// Poll interval for settings, if they are polled at all
    pub settings_interval: Duration,
    /// Upper bound on a single fetch or mutation; expiry is a transport failure
    pub fetch_timeout: Duration,
    /// Capacity of the [`SyncEvent`](crate::event::SyncEvent) broadcast channel
    pub event_buffer: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            metrics_interval: DEFAULT_METRICS_INTERVAL,
            orders_interval: DEFAULT_ORDERS_INTERVAL,
            settings_interval: DEFAULT_SETTINGS_INTERVAL,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            event_buffer: DEFAULT_EVENT_BUFFER,
        }
    }
}

impl SyncConfig {
    /// Create a new configuration with custom base URL
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Load configuration from `DASHBOARD_*` environment variables, defaulting unset ones.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let millis = |var: &str, default: Duration| -> Result<Duration, ConfigError> {
            match lookup(var) {
                None => Ok(default),
                Some(value) => value
                    .trim()
                    .parse::<u64>()
                    .ok()
                    .filter(|millis| *millis > 0)
                    .map(Duration::from_millis)
                    .ok_or_else(|| ConfigError::InvalidEnv {
                        var: var.to_string(),
                        value,
                    }),
            }
        };

        let event_buffer = match lookup("DASHBOARD_EVENT_BUFFER") {
            None => defaults.event_buffer,
            Some(value) => value
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|size| *size > 0)
                .ok_or_else(|| ConfigError::InvalidEnv {
                    var: "DASHBOARD_EVENT_BUFFER".to_string(),
                    value,
                })?,
        };

        Ok(Self {
            base_url: lookup("DASHBOARD_API_URL").unwrap_or(defaults.base_url),
            metrics_interval: millis("DASHBOARD_METRICS_INTERVAL_MS", defaults.metrics_interval)?,
            orders_interval: millis("DASHBOARD_ORDERS_INTERVAL_MS", defaults.orders_interval)?,
            settings_interval: millis(
                "DASHBOARD_SETTINGS_INTERVAL_MS",
                defaults.settings_interval,
            )?,
            fetch_timeout: millis("DASHBOARD_FETCH_TIMEOUT_MS", defaults.fetch_timeout)?,
            event_buffer,
        })
    }

    /// Set metrics, history and distribution poll interval
    pub fn with_metrics_interval(mut self, interval: Duration) -> Self {
        self.metrics_interval = interval;
        self
    }

    /// Set open orders poll interval
    pub fn with_orders_interval(mut self, interval: Duration) -> Self {
        self.orders_interval = interval;
        self
    }

    /// Set settings poll interval
    pub fn with_settings_interval(mut self, interval: Duration) -> Self {
        self.settings_interval = interval;
        self
    }

    /// Set fetch timeout
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    /// Set event channel capacity
    pub fn with_event_buffer(mut self, size: usize) -> Self {
        self.event_buffer = size;
        self
    }

    /// Poll interval the given feed is registered with by default.
    pub fn interval_for(&self, name: FeedName) -> Duration {
        match name {
            FeedName::PerformanceMetrics | FeedName::TradingHistory | FeedName::TradeDistribution => {
                self.metrics_interval
            }
            FeedName::OpenOrders => self.orders_interval,
            FeedName::Settings => self.settings_interval,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars = vars
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect::<HashMap<_, _>>();
        move |var| vars.get(var).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = SyncConfig::default();
        assert_eq!(config.base_url, "http://127.0.0.1:5000");
        assert_eq!(config.interval_for(FeedName::PerformanceMetrics), Duration::from_millis(30_000));
        assert_eq!(config.interval_for(FeedName::TradingHistory), Duration::from_millis(30_000));
        assert_eq!(config.interval_for(FeedName::TradeDistribution), Duration::from_millis(30_000));
        assert_eq!(config.interval_for(FeedName::OpenOrders), Duration::from_millis(5_000));
        assert_eq!(config.fetch_timeout, Duration::from_secs(10));
        assert_eq!(config.event_buffer, 256);
    }

    #[test]
    fn test_config_builder() {
        let config = SyncConfig::new("http://dashboard:8080")
            .with_metrics_interval(Duration::from_secs(60))
            .with_orders_interval(Duration::from_secs(1))
            .with_settings_interval(Duration::from_secs(120))
            .with_fetch_timeout(Duration::from_secs(3))
            .with_event_buffer(16);

        assert_eq!(config.base_url, "http://dashboard:8080");
        assert_eq!(config.metrics_interval, Duration::from_secs(60));
        assert_eq!(config.orders_interval, Duration::from_secs(1));
        assert_eq!(config.interval_for(FeedName::Settings), Duration::from_secs(120));
        assert_eq!(config.fetch_timeout, Duration::from_secs(3));
        assert_eq!(config.event_buffer, 16);
    }

    #[test]
    fn test_from_lookup() {
        let config = SyncConfig::from_lookup(lookup(&[
            ("DASHBOARD_API_URL", "http://10.0.0.2:5000"),
            ("DASHBOARD_ORDERS_INTERVAL_MS", "2500"),
            ("DASHBOARD_EVENT_BUFFER", "64"),
        ]))
        .unwrap();

        assert_eq!(config.base_url, "http://10.0.0.2:5000");
        assert_eq!(config.orders_interval, Duration::from_millis(2_500));
        assert_eq!(config.metrics_interval, DEFAULT_METRICS_INTERVAL);
        assert_eq!(config.event_buffer, 64);
    }

    #[test]
    fn test_from_lookup_invalid() {
        struct TestCase {
            input: (&'static str, &'static str),
        }

        let tests = vec![
            TestCase {
                // TC0: not a number
                input: ("DASHBOARD_METRICS_INTERVAL_MS", "thirty"),
            },
            TestCase {
                // TC1: zero interval would spin
                input: ("DASHBOARD_ORDERS_INTERVAL_MS", "0"),
            },
            TestCase {
                // TC2: zero capacity broadcast channel panics
                input: ("DASHBOARD_EVENT_BUFFER", "0"),
            },
        ];

        for (index, test) in tests.into_iter().enumerate() {
            let (var, value) = test.input;
            let actual = SyncConfig::from_lookup(lookup(&[test.input]));
            assert_eq!(
                actual,
                Err(ConfigError::InvalidEnv {
                    var: var.to_string(),
                    value: value.to_string(),
                }),
                "TC{} failed",
                index
            );
        }
    }
}
