use std::time::Duration;

/// Configures HTTP timeout and retry behavior.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ClientOptions {
    /// Per-request timeout in milliseconds.
    pub timeout_ms: u64,
    /// Maximum number of request attempts, the first one included.
    pub max_retries: usize,
    /// Retry backoff unit in milliseconds (linear strategy).
    pub retry_backoff_ms: u64,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout_ms: 60_000,
            max_retries: 3,
            retry_backoff_ms: 3_000,
        }
    }
}

impl ClientOptions {
    pub(crate) fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Delay after the `attempt`-th (1-based) attempt hit a retryable status.
    pub(crate) fn backoff_delay(&self, attempt: usize) -> Duration {
        let attempt = u64::try_from(attempt).unwrap_or(u64::MAX);
        Duration::from_millis(self.retry_backoff_ms.saturating_mul(attempt))
    }
}
