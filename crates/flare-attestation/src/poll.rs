//! Bounded polling used while waiting on the indexer or the state connector.

use std::time::Duration;

use crate::constants::{DEFAULT_POLL_INTERVAL, DEFAULT_POLL_MAX_WAIT, MIN_POLL_INTERVAL};

/// How often to poll and for how long before giving up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Pause between polls. Raised to [`MIN_POLL_INTERVAL`] when smaller.
    pub interval: Duration,
    pub max_wait: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            max_wait: DEFAULT_POLL_MAX_WAIT,
        }
    }
}

impl PollPolicy {
    /// Delay before the next poll, or `None` once `elapsed` has used up the budget.
    ///
    /// The last delay is clipped so a wait never overshoots `max_wait`.
    pub fn next_delay(&self, elapsed: Duration) -> Option<Duration> {
        let remaining = self.max_wait.checked_sub(elapsed)?;
        if remaining.is_zero() {
            return None;
        }
        Some(self.interval.max(MIN_POLL_INTERVAL).min(remaining))
    }
}
