//! Retry policy for resource downloads.
//!
//! Policy is data, mechanism lives in the downloader: the upstream hosts
//! serving these archives drop connections routinely, so transient
//! failures get a progressive, jittered backoff, while permanent HTTP
//! statuses fail fast (a 404 is still a 404 on attempt three).

use std::time::Duration;

use rand::Rng;

use crate::error::DownloadError;

/// Explicit retry policy: attempt budget, backoff shape, and an overall
/// deadline bounding one download including every retry and sleep.
#[derive(Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Delay before the second attempt; grows linearly per attempt
    /// (base, 2x, 3x, ...).
    pub base_delay: Duration,
    /// Upper bound on a single backoff delay.
    pub max_delay: Duration,
    /// Bound on one whole download. Lets a caller abandon a stuck
    /// resource instead of waiting out every retry.
    pub overall_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(10),
            max_delay: Duration::from_secs(60),
            overall_timeout: Duration::from_secs(30 * 60),
        }
    }
}

impl RetryPolicy {
    /// Delay to sleep before the given attempt (1-indexed; attempt 1 has
    /// none). Progressive with ±20% jitter, capped at `max_delay`.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt <= 1 {
            return Duration::ZERO;
        }
        let scaled = self
            .base_delay
            .saturating_mul(attempt - 1)
            .min(self.max_delay);
        let jitter = rand::thread_rng().gen_range(0.8..1.2);
        Duration::from_secs_f64(scaled.as_secs_f64() * jitter)
    }

    /// Whether a failed attempt is worth repeating.
    pub fn is_retryable(&self, err: &DownloadError) -> bool {
        match err {
            DownloadError::Network(_) => true,
            DownloadError::Truncated { .. } => true,
            DownloadError::HttpStatus { status } => *status == 429 || *status >= 500,
            DownloadError::DeadlineExceeded => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_attempt_has_no_delay() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for_attempt(1), Duration::ZERO);
    }

    #[test]
    fn delay_grows_per_attempt_within_jitter() {
        let policy = RetryPolicy {
            base_delay: Duration::from_secs(10),
            max_delay: Duration::from_secs(600),
            ..RetryPolicy::default()
        };
        let second = policy.delay_for_attempt(2).as_secs_f64();
        let third = policy.delay_for_attempt(3).as_secs_f64();
        assert!((8.0..=12.0).contains(&second), "got {second}");
        assert!((16.0..=24.0).contains(&third), "got {third}");
    }

    #[test]
    fn delay_is_capped() {
        let policy = RetryPolicy {
            base_delay: Duration::from_secs(10),
            max_delay: Duration::from_secs(15),
            ..RetryPolicy::default()
        };
        let delay = policy.delay_for_attempt(10).as_secs_f64();
        assert!(delay <= 15.0 * 1.2, "got {delay}");
    }

    #[test]
    fn permanent_statuses_are_not_retryable() {
        let policy = RetryPolicy::default();
        assert!(!policy.is_retryable(&DownloadError::HttpStatus { status: 404 }));
        assert!(!policy.is_retryable(&DownloadError::HttpStatus { status: 403 }));
        assert!(!policy.is_retryable(&DownloadError::DeadlineExceeded));
    }

    #[test]
    fn transient_statuses_are_retryable() {
        let policy = RetryPolicy::default();
        assert!(policy.is_retryable(&DownloadError::HttpStatus { status: 429 }));
        assert!(policy.is_retryable(&DownloadError::HttpStatus { status: 502 }));
        assert!(policy.is_retryable(&DownloadError::Truncated {
            received: 10,
            expected: 20
        }));
    }
}
