//! Edge detection and scroll rate limiting.

use std::time::{Duration, Instant};

/// Remembers whether a condition held on the previous tick so an action
/// fires once per false→true transition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EdgeTracker {
    previous: bool,
}

impl EdgeTracker {
    /// Records `current` and reports a rising edge.
    #[inline(always)]
    pub fn observe(&mut self, current: bool) -> bool {
        let fired = current && !self.previous;
        self.previous = current;
        fired
    }

    /// Forgets the previous state; a condition still true fires next tick.
    #[inline(always)]
    pub fn reset(&mut self) {
        self.previous = false;
    }

    /// Records `current` without firing; a condition still true needs a
    /// fresh release and press.
    #[inline(always)]
    pub fn prime(&mut self, current: bool) {
        self.previous = current;
    }
}

/// Fires on the first tick of a hold, then at most once per `interval`.
#[derive(Debug, Clone, Copy)]
pub struct ScrollCadence {
    interval: Duration,
    held: bool,
    next_fire: Option<Instant>,
    /// Set by `prime`; nothing fires until the hold ends.
    suppressed: bool,
}

impl ScrollCadence {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            held: false,
            next_fire: None,
            suppressed: false,
        }
    }

    pub fn poll(&mut self, held: bool, now: Instant) -> bool {
        if self.suppressed {
            self.suppressed = held;
            self.held = held;
            return false;
        }
        let due = !self.held || self.next_fire.is_none_or(|at| now >= at);
        let fire = held && due;
        if fire {
            self.next_fire = Some(now + self.interval);
        } else if !held {
            self.next_fire = None;
        }
        self.held = held;
        fire
    }

    pub fn reset(&mut self) {
        self.held = false;
        self.next_fire = None;
        self.suppressed = false;
    }

    /// Like [`EdgeTracker::prime`]: a hold already in progress never fires.
    pub fn prime(&mut self, held: bool) {
        self.held = held;
        self.next_fire = None;
        self.suppressed = held;
    }
}
