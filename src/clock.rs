//! Time source for the controller. Production uses the wall clock; tests and
//! demos drive a [`ManualClock`].

use std::cell::Cell;
use std::rc::Rc;

use chrono::{DateTime, Duration, Utc};

pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A shared, settable clock. Clones observe the same instant.
#[derive(Debug, Clone)]
pub struct ManualClock(Rc<Cell<DateTime<Utc>>>);

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self(Rc::new(Cell::new(start)))
    }

    pub fn set(&self, now: DateTime<Utc>) {
        self.0.set(now);
    }

    pub fn advance(&self, by: Duration) {
        self.0.set(self.0.get() + by);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        self.0.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn manual_clock_is_shared() {
        let start = Utc.with_ymd_and_hms(2026, 3, 14, 18, 0, 0).unwrap();
        let clock = ManualClock::new(start);
        let other = clock.clone();
        other.advance(Duration::minutes(20));
        assert_eq!(clock.now(), start + Duration::minutes(20));
        clock.set(start);
        assert_eq!(other.now(), start);
    }
}
