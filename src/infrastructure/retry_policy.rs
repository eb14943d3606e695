//! Retry policy for transient transport failures
//!
//! Exponential backoff (`base * 2^(attempt - 1)`, capped) with an optional
//! attempt limit. An unlimited policy retries a failing request forever,
//! which is only appropriate when outages are known to be short.

use std::num::NonZeroU32;
use std::time::Duration;

use crate::infrastructure::config::defaults;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts per request; `None` means unlimited
    pub max_attempts: Option<NonZeroU32>,
    pub base_backoff: Duration,
    pub max_backoff: Duration,
    /// Budget for a single attempt
    pub hop_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: NonZeroU32::new(defaults::RETRY_ATTEMPTS),
            base_backoff: Duration::from_millis(defaults::BASE_BACKOFF_MS),
            max_backoff: Duration::from_millis(defaults::MAX_BACKOFF_MS),
            hop_timeout: Duration::from_secs(defaults::HOP_TIMEOUT_SECONDS),
        }
    }
}

impl RetryPolicy {
    /// Policy that never gives up on a hop
    pub fn unlimited() -> Self {
        Self {
            max_attempts: None,
            ..Self::default()
        }
    }

    /// Bounded policy with no delay between attempts
    pub fn immediate(max_attempts: NonZeroU32) -> Self {
        Self {
            max_attempts: Some(max_attempts),
            base_backoff: Duration::ZERO,
            max_backoff: Duration::ZERO,
            ..Self::default()
        }
    }

    /// Whether another attempt follows a failed `attempt` (1-based)
    pub fn should_retry(&self, attempt: u32) -> bool {
        self.max_attempts
            .is_none_or(|max_attempts| attempt < max_attempts.get())
    }

    /// Delay to wait after the failed `attempt` (1-based)
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        self.base_backoff
            .saturating_mul(2_u32.saturating_pow(exponent))
            .min(self.max_backoff)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_until_capped() {
        let policy = RetryPolicy {
            max_attempts: NonZeroU32::new(10),
            base_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(10),
            hop_timeout: Duration::from_secs(5),
        };

        assert_eq!(policy.backoff(1), Duration::from_secs(1));
        assert_eq!(policy.backoff(2), Duration::from_secs(2));
        assert_eq!(policy.backoff(3), Duration::from_secs(4));
        assert_eq!(policy.backoff(4), Duration::from_secs(8));
        assert_eq!(policy.backoff(5), Duration::from_secs(10));
        assert_eq!(policy.backoff(200), Duration::from_secs(10));
    }

    #[test]
    fn bounded_policy_stops_at_max_attempts() {
        let policy = RetryPolicy::immediate(NonZeroU32::new(3).unwrap());
        assert!(policy.should_retry(1));
        assert!(policy.should_retry(2));
        assert!(!policy.should_retry(3));
    }

    #[test]
    fn unlimited_policy_always_retries() {
        let policy = RetryPolicy::unlimited();
        assert!(policy.should_retry(1));
        assert!(policy.should_retry(u32::MAX));
    }
}
