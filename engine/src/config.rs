//! Configuration for the sync engine and the HTTP remote.

use crate::history::DEFAULT_HISTORY_LIMIT;
use std::env;
use std::time::Duration;

/// Configuration for the sync engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Quiescence window before the record collection is written locally.
    pub records_debounce: Duration,
    /// Quiescence window before the search history is written locally.
    pub history_debounce: Duration,
    /// Maximum number of search history entries.
    pub history_limit: usize,
    /// Retry configuration for background pushes.
    pub retry: RetryConfig,
    /// Whether the search history is synced with the remote.
    pub sync_search_history: bool,
    /// Whether startup pushes the merged collection when the remote is
    /// missing local records.
    pub push_after_initial_merge: bool,
}

impl EngineConfig {
    /// Creates a configuration with default values.
    pub fn new() -> Self {
        Self {
            records_debounce: Duration::from_millis(1000),
            history_debounce: Duration::from_millis(500),
            history_limit: DEFAULT_HISTORY_LIMIT,
            retry: RetryConfig::default(),
            sync_search_history: true,
            push_after_initial_merge: true,
        }
    }

    /// Sets the record debounce window.
    pub fn with_records_debounce(mut self, window: Duration) -> Self {
        self.records_debounce = window;
        self
    }

    /// Sets the search history debounce window.
    pub fn with_history_debounce(mut self, window: Duration) -> Self {
        self.history_debounce = window;
        self
    }

    /// Sets the search history bound.
    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self
    }

    /// Sets the retry configuration.
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Enables or disables search history sync.
    pub fn with_search_history_sync(mut self, enabled: bool) -> Self {
        self.sync_search_history = enabled;
        self
    }

    /// Enables or disables the push that follows the startup merge.
    pub fn with_push_after_initial_merge(mut self, enabled: bool) -> Self {
        self.push_after_initial_merge = enabled;
        self
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Configuration for retry behavior.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts, including the first one.
    pub max_attempts: u32,
    /// Initial delay between retries.
    pub initial_delay: Duration,
    /// Maximum delay between retries.
    pub max_delay: Duration,
    /// Multiplier for exponential backoff.
    pub backoff_multiplier: f64,
}

impl RetryConfig {
    /// Creates a new retry configuration.
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
            backoff_multiplier: 2.0,
        }
    }

    /// Creates a configuration with no retries.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            initial_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            backoff_multiplier: 1.0,
        }
    }

    /// Sets the initial delay.
    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Sets the maximum delay.
    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Sets the backoff multiplier.
    ///
    /// Values below 1 and non-finite values mean a constant delay.
    pub fn with_backoff_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = if multiplier.is_finite() && multiplier >= 1.0 {
            multiplier
        } else {
            1.0
        };
        self
    }

    /// Delay before retry number `retry` (0 = first retry).
    ///
    /// Never panics: a delay that does not fit a `Duration` is `max_delay`.
    pub fn delay_for(&self, retry: u32) -> Duration {
        let exponent = i32::try_from(retry).unwrap_or(i32::MAX);
        let factor = self.backoff_multiplier.powi(exponent);
        let secs = self.initial_delay.as_secs_f64() * factor;
        Duration::try_from_secs_f64(secs)
            .map_or(self.max_delay, |delay| delay.min(self.max_delay))
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::new(3)
    }
}

/// Connection settings for [`HttpRemote`](crate::HttpRemote).
#[derive(Debug, Clone)]
pub struct RemoteConfig {
    /// Base URL of the remote store, without a trailing slash.
    pub base_url: String,
    /// Bearer token sent with every request.
    pub auth_token: Option<String>,
    /// Request timeout.
    pub timeout: Duration,
}

impl RemoteConfig {
    /// Creates a configuration for `base_url` with default settings.
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            auth_token: None,
            timeout: Duration::from_secs(30),
        }
    }

    /// Load from `STASH_REMOTE_URL`, `STASH_REMOTE_TOKEN` and
    /// `STASH_REMOTE_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let base_url = env::var("STASH_REMOTE_URL").map_err(|_| ConfigError::MissingRemoteUrl)?;

        let mut config = Self::new(base_url);
        config.auth_token = env::var("STASH_REMOTE_TOKEN").ok().filter(|t| !t.is_empty());

        if let Ok(secs) = env::var("STASH_REMOTE_TIMEOUT_SECS") {
            let secs: u64 = secs.parse().map_err(|_| ConfigError::InvalidTimeout)?;
            config.timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }

    /// Sets the bearer token.
    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("STASH_REMOTE_URL environment variable is required")]
    MissingRemoteUrl,

    #[error("Invalid STASH_REMOTE_TIMEOUT_SECS value")]
    InvalidTimeout,
}
