//! Periodic task timing.

use std::time::Duration;

/// A job that becomes due every `period`.
///
/// The next due time is advanced by exactly one period each time the task
/// fires, so a late pass does not shift the schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodicTask {
    period: Duration,
    next_due: Duration,
}

impl PeriodicTask {
    /// Create a task first due at `first_due`.
    pub fn new(period: Duration, first_due: Duration) -> Self {
        Self { period, next_due: first_due }
    }

    /// Returns `true` if the task is due at `now`, and schedules the next run.
    pub fn poll(&mut self, now: Duration) -> bool {
        if now >= self.next_due {
            self.next_due += self.period;
            true
        } else {
            false
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn next_due(&self) -> Duration {
        self.next_due
    }
}
