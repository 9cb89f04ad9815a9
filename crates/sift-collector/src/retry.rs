//! Retry with exponential backoff
//!
//! Only errors that report themselves as transient (rate limiting) are
//! retried. Everything else fails on the first attempt.

use crate::error::{CollectorError, Result};
use sift_domain::TransientError;
use std::fmt;
use std::time::Duration;

/// Default number of attempts
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default delay before the second attempt
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(1);

/// How often and how patiently to retry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, first call included (at least 1)
    pub max_attempts: u32,

    /// Delay after the first failure; doubles after each further failure
    pub base_delay: Duration,
}

impl RetryPolicy {
    /// Create a policy; `max_attempts` is clamped to at least 1
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    /// Policy that never retries
    pub fn none() -> Self {
        Self::new(1, Duration::ZERO)
    }

    /// Delay to wait after the given failed attempt (1-based)
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.base_delay.saturating_mul(2u32.pow(exponent))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS, DEFAULT_BASE_DELAY)
    }
}

/// Run `op` until it succeeds, fails permanently, or runs out of attempts
///
/// Blocks the calling thread while backing off.
///
/// # Examples
///
/// ```
/// use sift_collector::{retry, RetryPolicy};
/// use sift_domain::TransientError;
///
/// #[derive(Debug)]
/// struct Busy;
/// impl std::fmt::Display for Busy {
///     fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
///         write!(f, "busy")
///     }
/// }
/// impl TransientError for Busy {
///     fn is_transient(&self) -> bool { true }
/// }
///
/// let mut calls = 0;
/// let result = retry(&RetryPolicy::new(3, std::time::Duration::ZERO), || {
///     calls += 1;
///     if calls < 3 { Err(Busy) } else { Ok(calls) }
/// });
/// assert_eq!(result.unwrap(), 3);
/// ```
pub fn retry<T, E, F>(policy: &RetryPolicy, mut op: F) -> Result<T>
where
    E: TransientError + fmt::Display,
    F: FnMut() -> std::result::Result<T, E>,
{
    let mut attempt = 0;
    loop {
        attempt += 1;
        match op() {
            Ok(value) => return Ok(value),
            Err(e) if e.is_transient() => {
                if attempt >= policy.max_attempts {
                    tracing::error!("Giving up after {} attempts: {}", attempt, e);
                    return Err(CollectorError::RetriesExhausted {
                        attempts: attempt,
                        last_error: e.to_string(),
                    });
                }
                let delay = policy.delay_after(attempt);
                tracing::warn!(
                    "Attempt {}/{} failed: {}; retrying in {:?}",
                    attempt,
                    policy.max_attempts,
                    e,
                    delay
                );
                std::thread::sleep(delay);
            }
            Err(e) => return Err(CollectorError::Forum(e.to_string())),
        }
    }
}
