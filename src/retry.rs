//! Retry policy.
//!
//! Deciding whether to try again is kept apart from the bus and the delay so it can
//! be checked without hardware.

use core::time::Duration;

use crate::frame::Reading;

/// Attempts made per read before giving up.
pub const MAX_ATTEMPTS: u8 = 5;

/// Wait between failed attempts.
pub const BACKOFF: Duration = Duration::from_millis(2_500);

/// What to do after an attempt.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Action {
    /// Wait, then run another bus cycle.
    Retry {
        /// How long to wait first.
        after: Duration,
    },
    /// Stop and hand this reading to the caller.
    Return(Reading),
}

/// Bounded retry with a fixed backoff.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total number of attempts, including the first one.
    pub max_attempts: u8,
    /// Wait between failed attempts.
    pub backoff: Duration,
}

impl RetryPolicy {
    /// Five attempts, 2.5 s apart.
    pub const DEFAULT: Self = Self {
        max_attempts: MAX_ATTEMPTS,
        backoff: BACKOFF,
    };

    /// Overrides the attempt budget. Zero behaves like one.
    pub const fn with_max_attempts(mut self, max_attempts: u8) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Overrides the backoff.
    pub const fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    /// Decides the next step after attempt number `attempt` (counting from zero).
    ///
    /// A good reading is returned straight away. A failure is retried until the
    /// budget is spent, after which the sentinel reading is returned.
    pub fn next_action<E>(&self, attempt: u8, result: Result<Reading, E>) -> Action {
        match result {
            Ok(reading) => Action::Return(reading),
            Err(_) if attempt.saturating_add(1) < self.max_attempts => Action::Retry {
                after: self.backoff,
            },
            Err(_) => Action::Return(Reading::sentinel()),
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::DEFAULT
    }
}
