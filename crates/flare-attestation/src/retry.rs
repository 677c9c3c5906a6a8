//! Fixed-delay retry with an explicit exhaustion outcome.
//!
//! Unlike exponential backoff against a flaky endpoint, this is meant for
//! operations that fail until some external process catches up (a block
//! explorer indexing a fresh contract, a verifier indexing a fresh block).

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use crate::constants::{DEFAULT_RETRY_ATTEMPTS, DEFAULT_RETRY_DELAY};
use crate::error::AttestationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total number of calls, including the first. Zero is treated as one.
    pub attempts: u32,
    /// Pause between a failed call and the next one.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: DEFAULT_RETRY_ATTEMPTS,
            delay: DEFAULT_RETRY_DELAY,
        }
    }
}

/// Result of [`retry_fixed`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryOutcome<T, E> {
    Succeeded(T),
    ExhaustedRetries { attempts: u32, last_error: E },
}

impl<T, E> RetryOutcome<T, E> {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded(_))
    }

    pub fn ok(self) -> Option<T> {
        match self {
            Self::Succeeded(value) => Some(value),
            Self::ExhaustedRetries { .. } => None,
        }
    }

    pub fn into_result(self) -> Result<T, E> {
        match self {
            Self::Succeeded(value) => Ok(value),
            Self::ExhaustedRetries { last_error, .. } => Err(last_error),
        }
    }
}

impl<T, E: Display> RetryOutcome<T, E> {
    /// Map exhaustion to [`AttestationError::VerificationTimeout`].
    pub fn into_verification_result(self) -> Result<T, AttestationError> {
        match self {
            Self::Succeeded(value) => Ok(value),
            Self::ExhaustedRetries {
                attempts,
                last_error,
            } => Err(AttestationError::VerificationTimeout {
                attempts,
                last_error: last_error.to_string(),
            }),
        }
    }
}

/// Call `op` until it succeeds or `policy.attempts` calls have failed.
///
/// Sleeps `policy.delay` between attempts only: never after a success and
/// never after the final failure.
pub async fn retry_fixed<T, E, F, Fut>(policy: &RetryPolicy, mut op: F) -> RetryOutcome<T, E>
where
    E: Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let attempts = policy.attempts.max(1);
    let mut attempt = 1;

    loop {
        match op().await {
            Ok(value) => return RetryOutcome::Succeeded(value),
            Err(e) if attempt >= attempts => {
                tracing::warn!(attempt, attempts, error = %e, "giving up after final attempt");
                return RetryOutcome::ExhaustedRetries {
                    attempts,
                    last_error: e,
                };
            }
            Err(e) => {
                tracing::warn!(
                    attempt,
                    attempts,
                    delay_ms = policy.delay.as_millis() as u64,
                    error = %e,
                    "attempt failed, retrying"
                );
            }
        }

        attempt += 1;
        if !policy.delay.is_zero() {
            tokio::time::sleep(policy.delay).await;
        }
    }
}
