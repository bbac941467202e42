//! Date source for stamping records and exports.

use chrono::{Local, NaiveDate, SecondsFormat, Utc};

/// Supplies "today" and "now" to the store.
pub trait Clock {
    /// Current local calendar date.
    fn today(&self) -> NaiveDate;

    /// Current instant as an RFC 3339 UTC timestamp.
    fn now_rfc3339(&self) -> String;

    /// `today()` formatted as `YYYY-MM-DD`.
    fn today_iso(&self) -> String {
        self.today().format("%Y-%m-%d").to_string()
    }
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }

    fn now_rfc3339(&self) -> String {
        Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
    }
}

/// Clock pinned to midnight UTC of one date. Used by tests and replays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock {
    date: NaiveDate,
}

impl FixedClock {
    pub fn new(date: NaiveDate) -> Self {
        Self { date }
    }

    /// Returns `None` for an invalid calendar date.
    pub fn ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self::new)
    }
}

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.date
    }

    fn now_rfc3339(&self) -> String {
        format!("{}T00:00:00.000Z", self.date.format("%Y-%m-%d"))
    }
}

#[cfg(test)]
mod tests {
    use super::{Clock, FixedClock};

    #[test]
    fn fixed_clock_formats_iso_dates() {
        let clock = FixedClock::ymd(2026, 3, 7).expect("valid date");
        assert_eq!(clock.today_iso(), "2026-03-07");
        assert_eq!(clock.now_rfc3339(), "2026-03-07T00:00:00.000Z");
        assert!(FixedClock::ymd(2026, 2, 30).is_none());
    }
}
