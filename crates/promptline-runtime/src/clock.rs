//! Wall-clock source for the ambient date and time values.

use jiff::Zoned;

/// Provides the current time.
pub trait Clock: Send + Sync {
    /// Returns the current time in the clock's time zone.
    fn now(&self) -> Zoned;
}

/// System clock in the local time zone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Zoned {
        Zoned::now()
    }
}

/// Clock frozen at a fixed instant.
#[derive(Debug, Clone)]
pub struct FixedClock {
    now: Zoned,
}

impl FixedClock {
    /// Creates a clock that always returns `now`.
    pub fn new(now: Zoned) -> Self {
        Self { now }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> Zoned {
        self.now.clone()
    }
}

/// Date and time captured once at the start of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ambient {
    /// `%Y-%m-%d`.
    pub date: String,
    /// `%H:%M:%S`.
    pub time: String,
}

impl Ambient {
    /// Reads `clock` once.
    pub fn capture(clock: &dyn Clock) -> Self {
        let now = clock.now();
        Self {
            date: now.strftime("%Y-%m-%d").to_string(),
            time: now.strftime("%H:%M:%S").to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use jiff::civil::date;
    use jiff::tz::TimeZone;

    use super::*;

    #[test]
    fn captures_fixed_instant() {
        let now = date(2024, 3, 5)
            .at(14, 30, 9, 0)
            .to_zoned(TimeZone::UTC)
            .unwrap();
        let ambient = Ambient::capture(&FixedClock::new(now));

        assert_eq!(ambient.date, "2024-03-05");
        assert_eq!(ambient.time, "14:30:09");
    }
}
