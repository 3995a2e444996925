//! Deadline timers on the simulation clock.
//!
//! RULE: nothing in the simulation sleeps or yields. A pending timer is
//! a due time compared against `SimClock::now` once per tick pass, so
//! any number of timers can be outstanding without a worker each.

use crate::types::SimTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deadline {
    pub due: SimTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeadlineStatus {
    Pending { remaining: SimTime },
    Due,
}

impl Deadline {
    pub fn at(due: SimTime) -> Self {
        Self { due }
    }

    pub fn after(now: SimTime, delay: SimTime) -> Self {
        Self { due: now.saturating_add(delay) }
    }

    pub fn poll(&self, now: SimTime) -> DeadlineStatus {
        if now >= self.due {
            DeadlineStatus::Due
        } else {
            DeadlineStatus::Pending { remaining: self.due - now }
        }
    }

    pub fn is_due(&self, now: SimTime) -> bool {
        matches!(self.poll(now), DeadlineStatus::Due)
    }
}

/// Fixed-cadence accumulator. Fires once the accumulated time reaches
/// the interval, then restarts from zero (overshoot is discarded).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntervalTimer {
    interval: SimTime,
    elapsed: SimTime,
}

impl IntervalTimer {
    pub fn new(interval: SimTime) -> Self {
        Self { interval, elapsed: 0 }
    }

    /// Add `dt` and report whether the interval elapsed.
    pub fn advance(&mut self, dt: SimTime) -> bool {
        self.elapsed += dt;
        if self.elapsed >= self.interval {
            self.elapsed = 0;
            true
        } else {
            false
        }
    }

    pub fn elapsed(&self) -> SimTime {
        self.elapsed
    }

    pub fn interval(&self) -> SimTime {
        self.interval
    }
}
