//! Retry policy building blocks.
//!
//! The actual async retry execution lives in `quill-session` (which has
//! access to tokio); this module contains the portable, sync-only pieces:
//!
//! - [`RetryPolicy`]: fixed schedule: up to 3 attempts, 1s/2s/4s backoff
//! - [`backoff_delay_ms`]: exponential delay for a zero-based attempt index
//! - [`should_retry`]: combines category rules with the attempt count
//!
//! A connection-refused error is never retried, regardless of remaining
//! attempts; client errors likewise.

use serde::{Deserialize, Serialize};

use crate::errors::ErrorCategory;

/// Default maximum retry attempts after the initial call.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default base delay in milliseconds.
pub const DEFAULT_BASE_DELAY_MS: u64 = 1000;

/// Retry policy for model-collaborator calls.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetryPolicy {
    /// Maximum retry attempts after the initial call (default: 3).
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Base delay for exponential backoff in ms (default: 1000).
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
}

fn default_max_retries() -> u32 {
    DEFAULT_MAX_RETRIES
}
fn default_base_delay_ms() -> u64 {
    DEFAULT_BASE_DELAY_MS
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay_ms: DEFAULT_BASE_DELAY_MS,
        }
    }
}

impl RetryPolicy {
    /// Whether another attempt should be made.
    ///
    /// `attempt` is the zero-based index of the attempt that just failed.
    #[must_use]
    pub fn should_retry(&self, category: ErrorCategory, attempt: u32) -> bool {
        category.is_retryable() && attempt < self.max_retries
    }

    /// Delay before the retry following failed attempt `attempt` (zero-based).
    ///
    /// `base * 2^attempt`, so the default schedule is 1s, 2s, 4s.
    #[must_use]
    pub fn backoff_delay_ms(&self, attempt: u32) -> u64 {
        self.base_delay_ms.saturating_mul(1u64 << attempt.min(31))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_schedule_is_1_2_4_seconds() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff_delay_ms(0), 1000);
        assert_eq!(policy.backoff_delay_ms(1), 2000);
        assert_eq!(policy.backoff_delay_ms(2), 4000);
    }

    #[test]
    fn high_attempt_no_overflow() {
        let policy = RetryPolicy::default();
        assert!(policy.backoff_delay_ms(100) > 0);
    }

    #[test]
    fn network_error_retried_within_budget() {
        let policy = RetryPolicy::default();
        assert!(policy.should_retry(ErrorCategory::Network, 0));
        assert!(policy.should_retry(ErrorCategory::Network, 2));
        assert!(!policy.should_retry(ErrorCategory::Network, 3));
    }

    #[test]
    fn refused_never_retried() {
        let policy = RetryPolicy::default();
        assert!(!policy.should_retry(ErrorCategory::ConnectionRefused, 0));
    }

    #[test]
    fn client_error_never_retried() {
        let policy = RetryPolicy::default();
        assert!(!policy.should_retry(ErrorCategory::Client, 0));
    }

    #[test]
    fn serde_defaults() {
        let policy: RetryPolicy = serde_json::from_str("{}").unwrap();
        assert_eq!(policy.max_retries, 3);
        assert_eq!(policy.base_delay_ms, 1000);
    }
}
