use std::fmt::{Debug, Formatter};

use chrono::{DateTime, Local, TimeDelta};

/// Half-open date range of the requested readings.
#[derive(Copy, Clone, Eq, PartialEq)]
#[must_use]
pub struct Interval {
    /// Inclusive.
    pub start: DateTime<Local>,

    /// Exclusive.
    pub end: DateTime<Local>,
}

impl Debug for Interval {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}..{:?}", self.start, self.end)
    }
}

impl Interval {
    pub const fn new(start: DateTime<Local>, end: DateTime<Local>) -> Self {
        Self { start, end }
    }

    /// The specified number of days until `end`.
    pub fn days_until(n_days: u32, end: DateTime<Local>) -> Self {
        Self::new(end - TimeDelta::days(i64::from(n_days)), end)
    }

    #[must_use]
    pub fn contains(self, other: DateTime<Local>) -> bool {
        (self.start <= other) && (other < self.end)
    }
}
