//! Retry decisions shared by the async and blocking transports.

use std::time::Duration;

use crate::{ClientConfig, ClientError};

/// How many times a request is attempted and how long to wait in between.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    attempts: u32,
    base_delay: Duration,
}

impl RetryPolicy {
    /// Creates a policy; `attempts` below one still performs a single attempt.
    pub fn new(attempts: u32, base_delay: Duration) -> Self {
        Self {
            attempts: attempts.max(1),
            base_delay,
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.retry_count, config.retry_delay)
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Returns how long to wait before retrying after `error` failed
    /// attempt number `attempt` (0-based), or `None` to give up.
    ///
    /// Rate limits honor the server's `Retry-After`; connection failures and
    /// timeouts back off exponentially. Nothing else is retried.
    pub fn delay_for(&self, error: &ClientError, attempt: u32) -> Option<Duration> {
        if attempt.saturating_add(1) >= self.attempts {
            return None;
        }

        match error {
            ClientError::RateLimited { retry_after, .. } => {
                if retry_after.is_zero() {
                    Some(self.base_delay)
                } else {
                    Some(*retry_after)
                }
            }
            ClientError::Request(error) if error.is_connect() || error.is_timeout() => {
                Some(self.backoff(attempt))
            }
            _ => None,
        }
    }

    /// Exponential backoff: `base_delay * 2^attempt`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2_u32.saturating_pow(attempt);
        self.base_delay.saturating_mul(factor)
    }
}
