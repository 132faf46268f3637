//! Backoff for blocked drains.

use std::time::Duration;

use crate::config::RetryConfig;

/// Exponential backoff between re-drain attempts.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Delay after the first blocked pass.
    pub base_delay: Duration,
    /// Growth factor per consecutive blocked pass.
    pub multiplier: f64,
    /// Upper bound.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_secs(5),
            multiplier: 2.0,
            max_delay: Duration::from_secs(300),
        }
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            base_delay: Duration::from_secs(config.base_delay_secs),
            multiplier: config.multiplier.max(1.0),
            max_delay: Duration::from_secs(config.max_delay_secs),
        }
    }
}

impl RetryPolicy {
    /// Delay after `failures` consecutive blocked passes (1-based).
    ///
    /// `base * multiplier^(failures - 1)`, capped at `max_delay`.
    #[must_use]
    pub fn next_delay(&self, failures: u32) -> Duration {
        let exponent = i32::try_from(failures.saturating_sub(1)).unwrap_or(i32::MAX);
        let secs = self.base_delay.as_secs_f64() * self.multiplier.powi(exponent);

        if !secs.is_finite() || secs >= self.max_delay.as_secs_f64() {
            self.max_delay
        } else {
            Duration::from_secs_f64(secs)
        }
    }
}
