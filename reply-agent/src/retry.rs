//! Backoff wrapper for outbound calls.
//!
//! A `RetryPolicy` is applied explicitly at each call site. The error type
//! decides whether a failure is a rate limit (exponential backoff), a
//! transient server failure (constant backoff) or fatal (no retry).

use std::future::Future;
use std::time::Duration;

use crate::error::PlatformError;

/// Default retry ceiling for Twitter calls
pub const DEFAULT_MAX_RETRIES: u32 = 5;

/// Default base wait for Twitter calls (seconds)
pub const DEFAULT_BASE_WAIT_SECS: u64 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryClass {
    RateLimit,
    Transient,
}

/// Implemented by error types that can be retried by `RetryPolicy`.
pub trait Retryable: Sized {
    /// `None` means the error is fatal and must propagate immediately.
    fn retry_class(&self) -> Option<RetryClass>;

    /// Converts the last error into its "budget exhausted" form.
    fn exhausted(self, class: RetryClass, attempts: u32) -> Self;
}

impl Retryable for PlatformError {
    fn retry_class(&self) -> Option<RetryClass> {
        match self {
            PlatformError::RateLimited { .. } => Some(RetryClass::RateLimit),
            PlatformError::Server { .. } => Some(RetryClass::Transient),
            _ => None,
        }
    }

    fn exhausted(self, class: RetryClass, attempts: u32) -> Self {
        match class {
            RetryClass::RateLimit => PlatformError::RateLimitExceeded { attempts },
            RetryClass::Transient => PlatformError::TransientServiceError {
                attempts,
                message: self.to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_wait: Duration,
    /// Log prefix, e.g. "[TWITTER]"
    pub label: &'static str,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::twitter(DEFAULT_MAX_RETRIES, DEFAULT_BASE_WAIT_SECS)
    }
}

/// Per-invocation bookkeeping. Never outlives a single `run` call.
#[derive(Debug, Clone, Copy)]
struct RetryState {
    attempt_count: u32,
    max_attempts: u32,
}

impl RetryPolicy {
    pub fn twitter(max_retries: u32, base_wait_secs: u64) -> Self {
        RetryPolicy {
            max_retries,
            base_wait: Duration::from_secs(base_wait_secs),
            label: "[TWITTER]",
        }
    }

    /// Wait before retry number `attempt` (1-based).
    pub fn wait_for(&self, class: RetryClass, attempt: u32) -> Duration {
        match class {
            RetryClass::RateLimit => {
                let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
                self.base_wait.saturating_mul(factor)
            }
            RetryClass::Transient => self.base_wait,
        }
    }

    /// Execute `call`, retrying rate-limit and transient failures.
    ///
    /// Gives up after `max_retries + 1` total attempts and returns the
    /// exhausted form of the last error.
    pub async fn run<T, E, F, Fut>(&self, operation: &str, mut call: F) -> Result<T, E>
    where
        E: Retryable + std::fmt::Display,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let mut state = RetryState {
            attempt_count: 0,
            max_attempts: self.max_retries.saturating_add(1),
        };

        loop {
            let err = match call().await {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };

            let Some(class) = err.retry_class() else {
                return Err(err);
            };

            state.attempt_count = state.attempt_count.saturating_add(1);
            if state.attempt_count > self.max_retries {
                log::error!(
                    "{} {}: maximum retries exceeded, giving up after {} attempts: {}",
                    self.label,
                    operation,
                    state.max_attempts,
                    err
                );
                return Err(err.exhausted(class, state.attempt_count));
            }

            let wait = self.wait_for(class, state.attempt_count);
            let reason = match class {
                RetryClass::RateLimit => "Rate limit reached",
                RetryClass::Transient => "Server error",
            };
            log::warn!(
                "{} {}: {}. Waiting {} seconds before retry {}/{}.",
                self.label,
                operation,
                reason,
                wait.as_secs(),
                state.attempt_count,
                self.max_retries
            );
            tokio::time::sleep(wait).await;
        }
    }
}
