//! Cooperative one-shot timers.
//!
//! Everything here runs on one UI event loop; "waiting" is never blocking,
//! it is a deadline checked when the host pumps `tick(now_ms)`. A timer is
//! a cancellable deadline: arming replaces any earlier deadline, cancelling
//! clears it, and firing consumes it so each arm fires at most once.

/// Delay before the initial overlay scan after a slide's data or children
/// change, so the asynchronous renderer can finish producing the tree.
pub const SCAN_DELAY_MS: u64 = 400;

/// Debounce before a mutation-triggered rescan.
pub const RESCAN_DEBOUNCE_MS: u64 = 100;

/// Delay before the history manager leaves the Applying state.
pub const HISTORY_SETTLE_MS: u64 = 100;

/// A cancellable one-shot deadline in host milliseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Timer {
    deadline: Option<u64>,
}

impl Timer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm (or re-arm) the timer `delay` ms from `now`.
    pub fn arm(&mut self, now: u64, delay: u64) {
        self.deadline = Some(now + delay);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// Consume the deadline if it has passed. Returns true at most once
    /// per arm.
    pub fn fire_due(&mut self, now: u64) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}
