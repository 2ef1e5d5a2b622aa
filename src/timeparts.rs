//! Epoch-millisecond to wall-clock conversion used by the time dimension.
//!
//! Mirrors what Redshift computes for
//! `TIMESTAMP WITH TIME ZONE 'epoch' + ts/1000 * INTERVAL '1 Second '`:
//! integer seconds, UTC, and a start_time key that keeps only `HH:MM:SS`.

use chrono::{DateTime, Datelike, Timelike, Utc};
use std::str::FromStr;

/// SQLite scalar function returning the `HH:MM:SS` key for an epoch-millis value
pub const CLOCK_FUNCTION: &str = "epoch_clock";

/// SQLite scalar function `epoch_part('<part>', ts)`
pub const PART_FUNCTION: &str = "epoch_part";

/// Calendar fields extracted into the time dimension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimePart {
    Hour,
    Day,
    Week,
    Month,
    Year,
    Weekday,
}

impl TimePart {
    pub const ALL: [TimePart; 6] = [
        TimePart::Hour,
        TimePart::Day,
        TimePart::Week,
        TimePart::Month,
        TimePart::Year,
        TimePart::Weekday,
    ];

    pub fn name(self) -> &'static str {
        match self {
            TimePart::Hour => "hour",
            TimePart::Day => "day",
            TimePart::Week => "week",
            TimePart::Month => "month",
            TimePart::Year => "year",
            TimePart::Weekday => "weekday",
        }
    }

    /// Datepart abbreviation accepted by Redshift's `extract`
    pub fn redshift_datepart(self) -> &'static str {
        match self {
            TimePart::Hour => "hr",
            TimePart::Day => "day",
            TimePart::Week => "w",
            TimePart::Month => "mon",
            TimePart::Year => "y",
            TimePart::Weekday => "weekday",
        }
    }
}

impl FromStr for TimePart {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TimePart::ALL
            .into_iter()
            .find(|p| p.name() == s)
            .ok_or_else(|| format!("Unknown time part: {}", s))
    }
}

/// One row of the time dimension
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeParts {
    pub start_time: String,
    pub hour: u32,
    pub day: u32,
    /// ISO 8601 week number
    pub week: u32,
    pub month: u32,
    pub year: i32,
    /// 0 = Sunday
    pub weekday: u32,
}

impl TimeParts {
    /// Returns `None` when the instant is outside chrono's representable range.
    pub fn from_epoch_millis(ts: i64) -> Option<Self> {
        // Integer division truncates toward zero, like BIGINT / INT in SQL.
        let instant = DateTime::<Utc>::from_timestamp(ts / 1000, 0)?;

        Some(Self {
            start_time: instant.format("%H:%M:%S").to_string(),
            hour: instant.hour(),
            day: instant.day(),
            week: instant.iso_week().week(),
            month: instant.month(),
            year: instant.year(),
            weekday: instant.weekday().num_days_from_sunday(),
        })
    }

    pub fn part(&self, part: TimePart) -> i64 {
        match part {
            TimePart::Hour => self.hour as i64,
            TimePart::Day => self.day as i64,
            TimePart::Week => self.week as i64,
            TimePart::Month => self.month as i64,
            TimePart::Year => self.year as i64,
            TimePart::Weekday => self.weekday as i64,
        }
    }
}
