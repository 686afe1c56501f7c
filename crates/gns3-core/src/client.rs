//! HTTP settings for GNS3 connectors and the rules for retrying requests.
//!
//! A GNS3 server answers `POST` with a newly created resource or a side effect
//! (start a node, open a project), so only `GET`, `PUT` and `DELETE` are ever
//! sent twice. Those are retried on rate limiting, 5xx answers, timeouts and
//! refused connections, with a doubling delay between attempts.

use crate::Error;
use reqwest::{Method, StatusCode};
use std::time::Duration;

/// Request timeout of a GNS3 connector (seconds).
pub const GNS3_DEFAULT_TIMEOUT: u64 = 30;

/// Port the GNS3 server listens on out of the box.
pub const GNS3_DEFAULT_PORT: u16 = 3080;

/// REST API version targeted unless configured otherwise.
pub const DEFAULT_API_VERSION: u8 = 2;

/// Idle connections are dropped after this many seconds.
pub const DEFAULT_POOL_IDLE_TIMEOUT: u64 = 90;

/// Idle connections kept per host.
pub const DEFAULT_POOL_MAX_IDLE_PER_HOST: usize = 10;

/// TCP connect timeout (seconds).
pub const DEFAULT_CONNECT_TIMEOUT: u64 = 10;

/// Retries after the first attempt of an idempotent request.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Delay before the first retry (milliseconds).
pub const DEFAULT_RETRY_DELAY_MS: u64 = 500;

/// Upper bound of the retry delay (milliseconds).
pub const DEFAULT_RETRY_MAX_DELAY_MS: u64 = 5000;

/// Whether requests with this method may be sent again after a failure.
#[must_use]
pub fn is_idempotent(method: &Method) -> bool {
    matches!(*method, Method::GET | Method::PUT | Method::DELETE)
}

/// Whether an error status from the server is worth retrying.
#[must_use]
pub fn is_transient_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

/// How often, and how patiently, idempotent requests are retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Delay before the first retry; doubled for every further retry.
    pub initial_delay: Duration,
    /// Cap on the delay.
    pub max_delay: Duration,
}

impl RetryPolicy {
    /// Three retries starting at 500 ms, capped at 5 s.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            initial_delay: Duration::from_millis(DEFAULT_RETRY_DELAY_MS),
            max_delay: Duration::from_millis(DEFAULT_RETRY_MAX_DELAY_MS),
        }
    }

    /// Send every request exactly once.
    #[must_use]
    pub const fn no_retry() -> Self {
        Self {
            max_retries: 0,
            initial_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    /// Set the number of retries.
    #[must_use]
    pub const fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Set the delay before the first retry.
    #[must_use]
    pub const fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Set the delay cap.
    #[must_use]
    pub const fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Delay before retry number `attempt` (1-based).
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }

        let factor = 2u32.saturating_pow(attempt - 1);
        self.initial_delay.saturating_mul(factor).min(self.max_delay)
    }

    /// Whether a request that failed with `error` gets retry number `attempt`.
    #[must_use]
    pub fn should_retry(&self, method: &Method, error: &Error, attempt: u32) -> bool {
        is_idempotent(method) && error.is_retryable() && attempt <= self.max_retries
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new()
    }
}

/// Settings of the HTTP client behind a connector.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Whole-request timeout.
    pub timeout: Duration,
    /// Retry policy for idempotent requests.
    pub retry_policy: RetryPolicy,
    /// How long idle pooled connections are kept.
    pub pool_idle_timeout: Duration,
    /// Idle pooled connections kept per host.
    pub pool_max_idle_per_host: usize,
    /// Log every request at `info` level.
    pub enable_logging: bool,
    /// Accept gzip encoded responses.
    pub enable_compression: bool,
}

impl ClientConfig {
    /// Defaults for a GNS3 server on the local network.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            timeout: Duration::from_secs(GNS3_DEFAULT_TIMEOUT),
            retry_policy: RetryPolicy::new(),
            pool_idle_timeout: Duration::from_secs(DEFAULT_POOL_IDLE_TIMEOUT),
            pool_max_idle_per_host: DEFAULT_POOL_MAX_IDLE_PER_HOST,
            enable_logging: true,
            enable_compression: true,
        }
    }

    /// Set the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the retry policy.
    #[must_use]
    pub const fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    /// Turn per-request logging on or off.
    #[must_use]
    pub const fn with_logging(mut self, enabled: bool) -> Self {
        self.enable_logging = enabled;
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new()
    }
}
