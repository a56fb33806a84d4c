//! Backoff policy for per-asset fetch attempts.

use crate::config::RetryConfig;
use std::time::Duration;

/// Linear backoff with a cap: attempt `n` waits `base_delay * n`, at most
/// `max_delay`. Pure; the fetch loop owns the actual sleeping.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the first).
    pub max_attempts: u32,
    /// Delay after the first failed attempt; grows linearly from here.
    pub base_delay: Duration,
    /// Upper bound on the backoff delay.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    pub fn from_config(cfg: &RetryConfig) -> Self {
        Self {
            max_attempts: cfg.max_attempts.max(1),
            base_delay: Duration::from_secs_f64(cfg.base_delay_secs.max(0.0)),
            max_delay: Duration::from_secs(cfg.max_delay_secs),
        }
    }

    /// Delay to wait after the failed attempt number `attempt` (1-based).
    /// Returns `None` once the attempt budget is exhausted, i.e. when
    /// `attempt` was the last allowed attempt.
    pub fn next_delay(&self, attempt: u32) -> Option<Duration> {
        if attempt >= self.max_attempts {
            return None;
        }
        Some(self.base_delay.saturating_mul(attempt).min(self.max_delay))
    }
}
