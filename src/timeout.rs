//! Single-shot readout timeout.
//!
//! The guard holds a deadline rather than relying on a timer interrupt: the
//! receive loop hands [`TimeoutGuard::remaining`] to each timed read, so a
//! pending read never outlives the deadline, and polls
//! [`TimeoutGuard::poll_expired`] between reads.

use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct TimeoutGuard {
    duration: Option<Duration>,
    deadline: Option<Instant>,
    armed: bool,
}

impl TimeoutGuard {
    /// Create a disarmed guard. `None` means an armed guard never fires.
    pub fn new(duration: Option<Duration>) -> Self {
        TimeoutGuard {
            duration,
            deadline: None,
            armed: false,
        }
    }

    /// Start the countdown, restarting it if already running
    pub fn arm(&mut self) {
        self.armed = true;
        self.deadline = self.duration.map(|d| Instant::now() + d);
    }

    /// Stop the countdown without firing
    pub fn disarm(&mut self) {
        self.armed = false;
        self.deadline = None;
    }

    /// Whether a countdown is running
    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// Time left before firing, `None` when the wait is unbounded
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    /// Report expiry exactly once; the guard disarms itself when it fires
    pub fn poll_expired(&mut self) -> bool {
        match self.deadline {
            Some(deadline) if self.armed && Instant::now() >= deadline => {
                self.disarm();
                true
            }
            _ => false,
        }
    }
}
