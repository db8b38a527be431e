//! Cancellable expiry driven by an explicit clock.

use std::time::{Duration, Instant};

/// A single cancellable expiry.
///
/// Arming replaces any outstanding deadline, so there is never more than one
/// live timer per owner. Time is always passed in, which keeps every owner
/// deterministic under a virtual clock.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Deadline {
    at: Option<Instant>,
}

impl Deadline {
    pub fn arm(&mut self, now: Instant, after: Duration) {
        self.at = Some(now + after);
    }

    pub fn cancel(&mut self) {
        self.at = None;
    }

    pub fn is_armed(&self) -> bool {
        self.at.is_some()
    }

    /// True once `now` has reached the deadline. A key arriving at that
    /// instant is ordered after the expiry.
    pub fn is_due(&self, now: Instant) -> bool {
        self.at.is_some_and(|at| now >= at)
    }

    /// Disarms and reports `true` if the deadline has passed.
    pub fn fire(&mut self, now: Instant) -> bool {
        if self.is_due(now) {
            self.at = None;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MS: Duration = Duration::from_millis(1);

    #[test]
    fn fires_once_at_deadline() {
        let t0 = Instant::now();
        let mut deadline = Deadline::default();
        deadline.arm(t0, 100 * MS);

        assert!(!deadline.fire(t0 + 99 * MS));
        assert!(deadline.fire(t0 + 100 * MS));
        assert!(!deadline.is_armed());
        assert!(!deadline.fire(t0 + 500 * MS));
    }

    #[test]
    fn rearming_replaces_previous_deadline() {
        let t0 = Instant::now();
        let mut deadline = Deadline::default();
        deadline.arm(t0, 100 * MS);
        deadline.arm(t0 + 80 * MS, 100 * MS);

        assert!(!deadline.fire(t0 + 150 * MS));
        assert!(deadline.fire(t0 + 180 * MS));
    }

    #[test]
    fn cancel_disarms() {
        let t0 = Instant::now();
        let mut deadline = Deadline::default();
        deadline.arm(t0, MS);
        deadline.cancel();
        assert!(!deadline.fire(t0 + 10 * MS));
    }
}
