//! Source of "today" for validation and duplicate checks.

use core::fmt;

use chrono::{Local, NaiveDate};

/// Supplies the current calendar date.
pub trait Clock: fmt::Debug + Send + Sync {
    /// The current date in the user's time zone.
    fn today(&self) -> NaiveDate;
}

/// Reads the local system clock.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SystemClock;

impl Clock for SystemClock {
    #[inline]
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Always reports the same date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    #[inline]
    fn today(&self) -> NaiveDate {
        self.0
    }
}
