//! Backoff schedule for page fetches.
//!
//! Only content sources retry. The queue reports a failed write to the
//! caller and never tries again on its own.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// How many times a fetch is tried and how long to wait in between
///
/// Any field may be left out of `fetch.retry` in the config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Tries per URL, the first one included (0 behaves like 1)
    pub max_attempts: u32,

    /// Wait after the first failure, in ms
    pub initial_delay_ms: u64,

    /// Growth factor for each further wait
    pub multiplier: f64,

    /// Ceiling for a single wait, in ms
    pub max_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay_ms: 1_000,
            multiplier: 2.0,
            max_delay_ms: 30_000,
        }
    }
}

impl RetryPolicy {
    /// Try once, never wait
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Wait before retry number `retry` (1 is the wait after the first failure)
    pub fn backoff(&self, retry: u32) -> Duration {
        let exponent = i32::try_from(retry.saturating_sub(1)).unwrap_or(i32::MAX);
        let millis = (self.initial_delay_ms as f64 * self.multiplier.powi(exponent))
            .min(self.max_delay_ms as f64)
            .max(0.0);
        Duration::from_millis(millis as u64)
    }

    /// Waits between consecutive tries, one fewer than `max_attempts`
    pub fn schedule(&self) -> impl Iterator<Item = Duration> + '_ {
        (1..self.max_attempts.max(1)).map(|retry| self.backoff(retry))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_grows_until_capped() {
        let policy = RetryPolicy {
            max_attempts: 6,
            max_delay_ms: 10_000,
            ..Default::default()
        };

        let waits: Vec<u64> = policy.schedule().map(|d| d.as_millis() as u64).collect();
        assert_eq!(waits, vec![1_000, 2_000, 4_000, 8_000, 10_000]);
    }

    #[test]
    fn test_schedule_length_follows_attempts() {
        assert_eq!(RetryPolicy::default().schedule().count(), 2);
        assert_eq!(RetryPolicy::no_retry().schedule().count(), 0);

        let zero = RetryPolicy {
            max_attempts: 0,
            ..Default::default()
        };
        assert_eq!(zero.schedule().count(), 0);
    }

    #[test]
    fn test_flat_backoff() {
        let policy = RetryPolicy {
            multiplier: 1.0,
            initial_delay_ms: 250,
            ..Default::default()
        };
        assert_eq!(policy.backoff(1), Duration::from_millis(250));
        assert_eq!(policy.backoff(40), Duration::from_millis(250));
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let policy: RetryPolicy = serde_yaml::from_str("max_attempts: 5").unwrap();
        assert_eq!(policy.max_attempts, 5);
        assert_eq!(policy.initial_delay_ms, 1_000);
        assert_eq!(policy.multiplier, 2.0);
        assert_eq!(policy.max_delay_ms, 30_000);
    }
}
