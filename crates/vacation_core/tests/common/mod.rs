use std::cell::Cell;
use vacation_core::{Clock, Timestamp};

/// Deterministic clock: returns `start`, then advances by `step` per read.
pub struct StepClock {
    next: Cell<Timestamp>,
    step: Timestamp,
}

impl StepClock {
    pub fn new(start: Timestamp, step: Timestamp) -> Self {
        Self {
            next: Cell::new(start),
            step,
        }
    }
}

impl Clock for StepClock {
    fn now(&self) -> Timestamp {
        let now = self.next.get();
        self.next.set(now + self.step);
        now
    }
}

/// Clock that runs backwards, to exercise monotonic last-modified stamping.
#[allow(dead_code)]
pub fn rewinding_clock(start: Timestamp) -> StepClock {
    StepClock::new(start, -100)
}
