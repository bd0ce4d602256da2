//! Cooperative timing primitives for a single-threaded host loop.
//!
//! Nothing here owns a thread or a real timer. Callers pass `now` into every
//! operation and decide when to poll, which keeps the scheduling primitive
//! swappable and lets tests drive time with plain `Instant` arithmetic.
//!
//! - `PeriodicTask` is an armed interval that reports when it is due.
//! - `Debouncer` collapses a burst of triggers into one firing after the
//!   burst has been quiet for a full window.
use std::time::{Duration, Instant};

use tracing::trace;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SchedulerError {
    #[error("periodic task period must be greater than zero")]
    ZeroPeriod,
}

#[derive(Debug, Clone)]
pub struct PeriodicTask {
    period: Duration,
    next_due: Instant,
}

impl PeriodicTask {
    /// Arms a task whose first firing is one full period after `now`.
    pub fn arm(period: Duration, now: Instant) -> Result<Self, SchedulerError> {
        if period.is_zero() {
            return Err(SchedulerError::ZeroPeriod);
        }
        Ok(Self {
            period,
            next_due: now + period,
        })
    }

    pub fn next_due(&self) -> Instant {
        self.next_due
    }

    /// Returns `true` at most once per call when the task is due.
    ///
    /// A host that fell more than a period behind gets a single firing and the
    /// task re-anchors on `now`; missed intervals are dropped, not replayed.
    pub fn poll(&mut self, now: Instant) -> bool {
        if now < self.next_due {
            return false;
        }
        self.next_due += self.period;
        if self.next_due <= now {
            trace!(
                behind_ms = now.duration_since(self.next_due).as_millis() as u64,
                "periodic task fell behind; re-anchoring"
            );
            self.next_due = now + self.period;
        }
        true
    }
}

#[derive(Debug, Clone)]
pub struct Debouncer {
    window: Duration,
    deadline: Option<Instant>,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            deadline: None,
        }
    }

    /// Restarts the quiet window; only the latest trigger in a burst counts.
    pub fn trigger(&mut self, now: Instant) {
        self.deadline = Some(now + self.window);
    }

    pub fn poll(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }
}
