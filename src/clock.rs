// clock.rs
use chrono::{Local, NaiveDate, NaiveDateTime, Utc};

/// Source of "now" for handlers. Tours run on local wall-clock time; stored
/// timestamps are unix seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Clock {
    System,
    /// Frozen at a local date-time.
    Fixed(NaiveDateTime),
}

impl Clock {
    pub fn now(&self) -> NaiveDateTime {
        match self {
            Clock::System => Local::now().naive_local(),
            Clock::Fixed(at) => *at,
        }
    }

    pub fn unix(&self) -> i64 {
        match self {
            Clock::System => Utc::now().timestamp(),
            Clock::Fixed(at) => at.and_utc().timestamp(),
        }
    }

    pub fn today(&self) -> NaiveDate {
        self.now().date()
    }

    /// Today as `YYYY-MM-DD`.
    pub fn today_iso(&self) -> String {
        self.today().format("%Y-%m-%d").to_string()
    }
}
