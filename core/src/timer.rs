use core::time::Duration;
use web_time::Instant;

/// One-shot deadline. Polling past the deadline fires it exactly once, and cancelling is
/// always safe, armed or not.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Timer {
    deadline: Option<Instant>,
}

impl Timer {
    pub const fn new() -> Self {
        Self { deadline: None }
    }

    /// (Re)arms the timer to fire `after` from `now`.
    pub fn arm(&mut self, now: Instant, after: Duration) {
        self.deadline = Some(now + after);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    /// Returns `true` once when `now` reaches the deadline, disarming the timer.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }
}
