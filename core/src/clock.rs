//! Simulation calendar: maps day indices to UTC instants.

use crate::types::Day;
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};

pub const SECONDS_PER_DAY: i64 = 86_400;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimCalendar {
    start: DateTime<Utc>,
    horizon_days: Day,
}

impl SimCalendar {
    pub fn new(start_date: NaiveDate, horizon_days: Day) -> Self {
        Self {
            start: Utc.from_utc_datetime(&start_date.and_time(NaiveTime::MIN)),
            horizon_days,
        }
    }

    pub fn horizon_days(&self) -> Day {
        self.horizon_days
    }

    /// 00:00:00 UTC of `day`.
    pub fn day_start(&self, day: Day) -> DateTime<Utc> {
        self.start + Duration::days(i64::from(day))
    }

    /// Exclusive end of the whole horizon.
    pub fn horizon_end(&self) -> DateTime<Utc> {
        self.day_start(self.horizon_days)
    }

    pub fn date_of(&self, day: Day) -> NaiveDate {
        self.day_start(day).date_naive()
    }

    /// Day index containing `ts`, or None outside the horizon.
    pub fn day_of(&self, ts: DateTime<Utc>) -> Option<Day> {
        let secs = (ts - self.start).num_seconds();
        if secs < 0 {
            return None;
        }
        let day = secs / SECONDS_PER_DAY;
        (day < i64::from(self.horizon_days)).then_some(day as Day)
    }

    /// `day_start(day) + seconds`.
    pub fn at(&self, day: Day, seconds: i64) -> DateTime<Utc> {
        self.day_start(day) + Duration::seconds(seconds)
    }
}

/// ISO-8601 with a literal `Z`, second precision. The only timestamp
/// format written to the store.
pub fn format_ts(ts: &DateTime<Utc>) -> String {
    ts.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

pub fn format_date(date: &NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}
