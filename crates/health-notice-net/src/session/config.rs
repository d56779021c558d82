//! Configuration for a notice session and its reconnect policy.

use std::collections::HashMap;
use std::time::Duration;

use rand::Rng;
use url::Url;

use crate::error::Result;

/// Endpoint used when none is configured.
pub const DEFAULT_ENDPOINT: &str = "ws://socket.art2cat.com/ws/health";

/// Configuration for a [`NoticeSession`](super::NoticeSession).
#[derive(Clone, Debug)]
pub struct SessionConfig {
    /// The WebSocket URL (ws:// or wss://).
    pub url: String,
    /// Custom headers to send on the upgrade request.
    pub headers: HashMap<String, String>,
    /// Reconnect policy. If `None`, the session stops after the first disconnect.
    pub reconnect: Option<ReconnectConfig>,
    /// Interval for keep-alive pings. `None` disables them.
    pub keep_alive: Option<Duration>,
    /// Upper bound on a single connect attempt.
    pub connect_timeout: Duration,
    /// Capacity of the queue between the session and the notification sink.
    pub notice_queue_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::new(DEFAULT_ENDPOINT)
    }
}

impl SessionConfig {
    /// Create a configuration for `url` with reconnect enabled.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            headers: HashMap::new(),
            reconnect: Some(ReconnectConfig::default()),
            keep_alive: None,
            connect_timeout: Duration::from_secs(30),
            notice_queue_capacity: 32,
        }
    }

    /// Build a `ws://host/path` endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidUrl`](crate::SessionError::InvalidUrl)
    /// if `host` does not form a valid URL.
    pub fn from_host(host: &str, path: &str) -> Result<Self> {
        let mut url = Url::parse(&format!("ws://{host}"))?;
        url.set_path(path);
        Ok(Self::new(url.as_str()))
    }

    /// Add a custom header for the upgrade request.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Add multiple headers.
    pub fn headers(mut self, headers: impl IntoIterator<Item = (String, String)>) -> Self {
        self.headers.extend(headers);
        self
    }

    /// Use a custom reconnect policy.
    pub fn reconnect_config(mut self, config: ReconnectConfig) -> Self {
        self.reconnect = Some(config);
        self
    }

    /// Disable automatic reconnection.
    pub fn no_reconnect(mut self) -> Self {
        self.reconnect = None;
        self
    }

    /// Send a keep-alive ping every `interval` while open.
    ///
    /// A zero interval disables keep-alive.
    pub fn keep_alive(mut self, interval: Duration) -> Self {
        self.keep_alive = (!interval.is_zero()).then_some(interval);
        self
    }

    /// Set the connect timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the notice queue capacity.
    pub fn notice_queue_capacity(mut self, capacity: usize) -> Self {
        self.notice_queue_capacity = capacity;
        self
    }
}

/// Configuration for automatic reconnection.
#[derive(Clone, Debug)]
pub struct ReconnectConfig {
    /// Maximum number of reconnection attempts. `None` means infinite retries.
    pub max_attempts: Option<u32>,
    /// Delay before the first reconnection attempt.
    pub initial_delay: Duration,
    /// Maximum delay between reconnection attempts.
    pub max_delay: Duration,
    /// Multiplier for exponential backoff.
    pub backoff_multiplier: f64,
    /// Relative jitter applied to each delay, e.g. `0.1` for +/-10%.
    ///
    /// Values outside `0.0..=1.0` are clamped; a non-finite value disables jitter.
    pub jitter: f64,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            max_attempts: None,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
            backoff_multiplier: 2.0,
            jitter: 0.1,
        }
    }
}

impl ReconnectConfig {
    /// Create a new reconnect configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum number of reconnection attempts.
    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = Some(attempts);
        self
    }

    /// Set the initial delay between reconnection attempts.
    pub fn initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Set the maximum delay between reconnection attempts.
    pub fn max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Set the backoff multiplier for exponential backoff.
    pub fn backoff_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    /// Set the relative jitter. `0.0` makes delays deterministic.
    pub fn jitter(mut self, jitter: f64) -> Self {
        self.jitter = jitter;
        self
    }

    /// Delay before reconnection attempt `attempt` (0-indexed).
    ///
    /// Never exceeds `max_delay`.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let base = self.initial_delay.as_secs_f64() * self.backoff_multiplier.powi(exponent);
        let max = self.max_delay.as_secs_f64();
        // f64::min discards NaN, so a degenerate product falls back to max.
        let capped = base.min(max);

        let jitter = if self.jitter.is_finite() {
            self.jitter.clamp(0.0, 1.0)
        } else {
            0.0
        };
        let factor = if jitter > 0.0 {
            1.0 + rand::thread_rng().gen_range(-jitter..=jitter)
        } else {
            1.0
        };

        // `max` may round above the largest representable Duration.
        Duration::try_from_secs_f64((capped * factor).clamp(0.0, max))
            .map_or(self.max_delay, |delay| delay.min(self.max_delay))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_grows_and_caps() {
        let config = ReconnectConfig::new()
            .initial_delay(Duration::from_millis(100))
            .max_delay(Duration::from_secs(1))
            .jitter(0.0);

        assert_eq!(config.delay_for_attempt(0), Duration::from_millis(100));
        assert_eq!(config.delay_for_attempt(1), Duration::from_millis(200));
        assert_eq!(config.delay_for_attempt(3), Duration::from_millis(800));
        assert_eq!(config.delay_for_attempt(4), Duration::from_secs(1));
        assert_eq!(config.delay_for_attempt(u32::MAX), Duration::from_secs(1));
    }

    #[test]
    fn test_jitter_stays_in_band() {
        let config = ReconnectConfig::new()
            .initial_delay(Duration::from_millis(1000))
            .max_delay(Duration::from_secs(10))
            .jitter(0.1);

        for _ in 0..200 {
            let delay = config.delay_for_attempt(0);
            assert!(delay >= Duration::from_millis(899), "{delay:?}");
            assert!(delay <= Duration::from_millis(1101), "{delay:?}");
        }
    }

    #[test]
    fn test_extreme_policies_do_not_panic() {
        let huge = ReconnectConfig::new()
            .initial_delay(Duration::from_secs(1))
            .max_delay(Duration::MAX)
            .jitter(0.0);
        assert_eq!(huge.delay_for_attempt(2000), Duration::MAX);
        assert!(huge.jitter(0.1).delay_for_attempt(2000) <= Duration::MAX);

        for jitter in [f64::INFINITY, f64::NAN, -0.5] {
            let config = ReconnectConfig::new()
                .initial_delay(Duration::from_millis(100))
                .jitter(jitter);
            assert_eq!(config.delay_for_attempt(0), Duration::from_millis(100));
        }
    }

    #[test]
    fn test_zero_keep_alive_is_disabled() {
        let config = SessionConfig::new(DEFAULT_ENDPOINT).keep_alive(Duration::ZERO);
        assert_eq!(config.keep_alive, None);

        let config = config.keep_alive(Duration::from_secs(15));
        assert_eq!(config.keep_alive, Some(Duration::from_secs(15)));
    }

    #[test]
    fn test_from_host_builds_ws_url() {
        let config = SessionConfig::from_host("socket.art2cat.com", "ws/health").unwrap();
        assert_eq!(config.url, DEFAULT_ENDPOINT);
    }
}
