//! Polling and retry configuration.

use std::time::Duration;

const DEFAULT_HOMEWORK_POLL_SECS: u64 = 10;
const DEFAULT_FEE_POLL_SECS: u64 = 15;
const DEFAULT_MESSAGE_POLL_SECS: u64 = 10;
const DEFAULT_READ_RETRIES: u32 = 3;
const DEFAULT_CACHE_IDLE_SECS: u64 = 300;

/// Backoff between retries of a failed read.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Upper bound on the delay between retries.
    pub max_delay: Duration,
    /// Factor by which the delay grows after each failure.
    pub multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            multiplier: 2.0,
        }
    }
}

/// Calculate the next backoff delay, clamped to [`RetryConfig::max_delay`].
pub fn next_delay(current: Duration, config: &RetryConfig) -> Duration {
    let next_ms = (current.as_millis() as f64 * config.multiplier) as u64;
    Duration::from_millis(next_ms).min(config.max_delay)
}

/// Refetch cadence and retry policy for cached reads.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncConfig {
    pub homework_poll: Duration,
    pub fee_poll: Duration,
    pub message_poll: Duration,
    /// Retries after a failed read. The caller profile is never retried.
    pub read_retries: u32,
    pub retry: RetryConfig,
    /// How long an unwatched cache entry survives without a fetch.
    pub cache_idle: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            homework_poll: Duration::from_secs(DEFAULT_HOMEWORK_POLL_SECS),
            fee_poll: Duration::from_secs(DEFAULT_FEE_POLL_SECS),
            message_poll: Duration::from_secs(DEFAULT_MESSAGE_POLL_SECS),
            read_retries: DEFAULT_READ_RETRIES,
            retry: RetryConfig::default(),
            cache_idle: Duration::from_secs(DEFAULT_CACHE_IDLE_SECS),
        }
    }
}

impl SyncConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                   | Default |
    /// |---------------------------|---------|
    /// | `IEMS_HOMEWORK_POLL_SECS` | `10`    |
    /// | `IEMS_FEE_POLL_SECS`      | `15`    |
    /// | `IEMS_MESSAGE_POLL_SECS`  | `10`    |
    /// | `IEMS_READ_RETRIES`       | `3`     |
    /// | `IEMS_CACHE_IDLE_SECS`    | `300`   |
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`SyncConfig::from_env`] with a custom variable source.
    /// Unparseable or zero intervals fall back to the default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let secs = |name: &str, default: u64| {
            let value = lookup(name)
                .and_then(|v| v.trim().parse::<u64>().ok())
                .filter(|v| *v > 0)
                .unwrap_or(default);
            Duration::from_secs(value)
        };

        Self {
            homework_poll: secs("IEMS_HOMEWORK_POLL_SECS", DEFAULT_HOMEWORK_POLL_SECS),
            fee_poll: secs("IEMS_FEE_POLL_SECS", DEFAULT_FEE_POLL_SECS),
            message_poll: secs("IEMS_MESSAGE_POLL_SECS", DEFAULT_MESSAGE_POLL_SECS),
            read_retries: lookup("IEMS_READ_RETRIES")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(DEFAULT_READ_RETRIES),
            retry: RetryConfig::default(),
            cache_idle: secs("IEMS_CACHE_IDLE_SECS", DEFAULT_CACHE_IDLE_SECS),
        }
    }
}
