//! Timestamp capabilities and the clock that feeds them.

use std::time::{SystemTime, UNIX_EPOCH};

/// UTC wall-clock instant as Unix epoch milliseconds.
pub type Timestamp = i64;

/// Entity capability: creation time, set once when first added.
pub trait CreatedAt {
    fn created_at(&self) -> Option<Timestamp>;
    fn set_created_at(&mut self, at: Timestamp);
}

/// Entity capability: last modification time, refreshed on add and update.
pub trait LastModifiedAt {
    fn last_modified_at(&self) -> Option<Timestamp>;
    fn set_last_modified_at(&mut self, at: Timestamp);
}

/// Source of "now" for timestamp stamping.
pub trait Clock {
    fn now(&self) -> Timestamp;
}

/// Reads the system wall clock in UTC.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |elapsed| {
                Timestamp::try_from(elapsed.as_millis()).unwrap_or(Timestamp::MAX)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::{Clock, SystemClock};

    #[test]
    fn system_clock_is_after_2020() {
        // 2020-01-01T00:00:00Z
        assert!(SystemClock.now() > 1_577_836_800_000);
    }
}
