//! Listener backoff state.

use std::time::Duration;

/// Exponential backoff for consecutive receive failures.
///
/// The first failure waits the base delay; each further one doubles it up
/// to the cap. Any successful receive resets it.
#[derive(Debug, Clone)]
pub struct ExponentialBackoff {
    /// Base delay (first retry)
    base_delay: Duration,
    /// Delay the next failure will wait
    current_delay: Duration,
    /// Maximum delay cap
    max_delay: Duration,
    /// Number of consecutive failures
    failure_count: u32,
}

impl ExponentialBackoff {
    /// Default: 100ms base, 5s max.
    pub fn new() -> Self {
        Self::with_config(Duration::from_millis(100), Duration::from_secs(5))
    }

    pub fn with_config(base_delay: Duration, max_delay: Duration) -> Self {
        let base_delay = base_delay.min(max_delay);
        Self {
            base_delay,
            current_delay: base_delay,
            max_delay,
            failure_count: 0,
        }
    }

    /// Record a failure and return how long to wait before the next receive.
    pub fn record_failure(&mut self) -> Duration {
        self.failure_count = self.failure_count.saturating_add(1);
        let delay = self.current_delay;
        self.current_delay = (self.current_delay * 2).min(self.max_delay);
        delay
    }

    /// Reset backoff on success.
    pub fn reset(&mut self) {
        if self.failure_count > 0 {
            tracing::info!(
                "Device events flowing again after {} failed receives",
                self.failure_count
            );
        }
        self.failure_count = 0;
        self.current_delay = self.base_delay;
    }

    pub fn failure_count(&self) -> u32 {
        self.failure_count
    }

    /// Delay the next failure will wait.
    pub fn current_delay(&self) -> Duration {
        self.current_delay
    }
}

impl Default for ExponentialBackoff {
    fn default() -> Self {
        Self::new()
    }
}
