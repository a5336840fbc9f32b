//! Bounded retry for transient provider overload

use std::time::Duration;

/// Retry policy for provider calls
///
/// A transient overload response is retried after a fixed delay until
/// `max_attempts` calls have been made.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of calls, including the first
    pub max_attempts: u32,
    /// Fixed delay before each retry
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Policy that never waits between attempts
    #[must_use]
    pub const fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            delay: Duration::ZERO,
        }
    }

    /// Whether another attempt is allowed after `attempt` calls failed
    #[must_use]
    pub const fn should_retry(&self, attempt: u32, status: u16) -> bool {
        attempt < self.max_attempts && is_transient(status)
    }
}

/// Whether an HTTP status means the provider is temporarily overloaded
#[must_use]
pub const fn is_transient(status: u16) -> bool {
    status == 503
}
