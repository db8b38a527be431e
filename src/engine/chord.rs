//! Double-press recognizer (`gg`, `,,`, `dd`).

use std::time::{Duration, Instant};

use super::timer::Deadline;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChordOutcome {
    /// First press; waiting for the second.
    Armed,
    /// Second press inside the window.
    Committed,
}

#[derive(Debug, Clone)]
pub struct PendingChord {
    key: char,
    window: Duration,
    deadline: Deadline,
}

impl PendingChord {
    pub fn new(key: char, window: Duration) -> Self {
        Self {
            key,
            window,
            deadline: Deadline::default(),
        }
    }

    pub fn key(&self) -> char {
        self.key
    }

    /// One press of this chord's key.
    pub fn press(&mut self, now: Instant) -> ChordOutcome {
        // An expired window counts as already cleared.
        self.deadline.fire(now);

        if self.deadline.is_armed() {
            self.deadline.cancel();
            ChordOutcome::Committed
        } else {
            self.deadline.arm(now, self.window);
            ChordOutcome::Armed
        }
    }

    /// Clears the pending state once the window has passed. Returns `true`
    /// if it did.
    pub fn expire(&mut self, now: Instant) -> bool {
        self.deadline.fire(now)
    }

    pub fn cancel(&mut self) {
        self.deadline.cancel();
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_armed()
    }
}
