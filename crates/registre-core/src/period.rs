//! Calendar buckets used for reporting.
//!
//! A [`Period`] plus an offset into the past resolves to a [`Bucket`]: a
//! concrete, calendar-aligned span of days. Buckets are inclusive on both
//! ends at day granularity; [`Bucket::utc_bounds`] turns them into a
//! half-open instant range for querying.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Days, Months, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::ValidationError;

/// Reporting granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Day,
    Week,
    Month,
}

impl Period {
    /// String representation used on the command line and in JSON.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
        }
    }

    /// Resolves the bucket `offset` periods before the one containing `today`.
    ///
    /// - Day: `today - offset days`.
    /// - Week: the Monday-to-Sunday week containing `today - offset weeks`.
    /// - Month: `offset` whole months back from the first of the current month.
    ///
    /// Returns `None` if the offset walks off the representable calendar.
    pub fn bucket(self, today: NaiveDate, offset: u32) -> Option<Bucket> {
        match self {
            Self::Day => today
                .checked_sub_days(Days::new(u64::from(offset)))
                .map(Bucket::day),
            Self::Week => today
                .checked_sub_days(Days::new(7 * u64::from(offset)))
                .and_then(Bucket::week_containing),
            Self::Month => YearMonth::of(today)
                .checked_sub(offset)
                .map(Bucket::month),
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Period {
    type Err = UnknownPeriod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "day" => Ok(Self::Day),
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            _ => Err(UnknownPeriod(s.to_string())),
        }
    }
}

/// Error type for unknown period strings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown period \"{0}\", expected one of day, week, month")]
pub struct UnknownPeriod(String);

/// A calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct YearMonth {
    first: NaiveDate,
    last: NaiveDate,
}

impl YearMonth {
    /// Creates a month from its year and 1-based month number.
    pub fn new(year: i32, month: u32) -> Result<Self, ValidationError> {
        NaiveDate::from_ymd_opt(year, month, 1)
            .map(Self::of)
            .ok_or(ValidationError::InvalidMonth { year, month })
    }

    /// The month containing `date`.
    pub fn of(date: NaiveDate) -> Self {
        let first = date - Days::new(u64::from(date.day0()));
        // Only the last representable month has no successor, and it ends on MAX.
        let last = first
            .checked_add_months(Months::new(1))
            .and_then(|next| next.pred_opt())
            .unwrap_or(NaiveDate::MAX);
        Self { first, last }
    }

    pub fn year(&self) -> i32 {
        self.first.year()
    }

    pub fn month(&self) -> u32 {
        self.first.month()
    }

    pub const fn first_day(&self) -> NaiveDate {
        self.first
    }

    pub const fn last_day(&self) -> NaiveDate {
        self.last
    }

    /// The month `months` months earlier, handling year rollover.
    pub fn checked_sub(&self, months: u32) -> Option<Self> {
        self.first
            .checked_sub_months(Months::new(months))
            .map(Self::of)
    }

    /// The month before this one.
    pub fn previous(&self) -> Option<Self> {
        self.checked_sub(1)
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year(), self.month())
    }
}

/// A resolved calendar span of whole days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bucket {
    period: Period,
    first: NaiveDate,
    last: NaiveDate,
}

impl Bucket {
    /// A single day.
    pub const fn day(date: NaiveDate) -> Self {
        Self {
            period: Period::Day,
            first: date,
            last: date,
        }
    }

    /// The ISO week (Monday to Sunday) containing `date`.
    pub fn week_containing(date: NaiveDate) -> Option<Self> {
        let days_since_monday = date.weekday().num_days_from_monday();
        let monday = date.checked_sub_days(Days::new(u64::from(days_since_monday)))?;
        let sunday = monday
            .checked_add_days(Days::new(6))
            .unwrap_or(NaiveDate::MAX);
        Some(Self {
            period: Period::Week,
            first: monday,
            last: sunday,
        })
    }

    /// A calendar month.
    pub const fn month(month: YearMonth) -> Self {
        Self {
            period: Period::Month,
            first: month.first_day(),
            last: month.last_day(),
        }
    }

    pub const fn period(&self) -> Period {
        self.period
    }

    /// First day of the bucket (inclusive).
    pub const fn first_day(&self) -> NaiveDate {
        self.first
    }

    /// Last day of the bucket (inclusive).
    pub const fn last_day(&self) -> NaiveDate {
        self.last
    }

    /// Returns true if `date` falls within the bucket.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.first <= date && date <= self.last
    }

    /// Half-open UTC instant range covering the bucket.
    ///
    /// The end is `None` when the bucket ends on the last representable day.
    pub fn utc_bounds(&self) -> (DateTime<Utc>, Option<DateTime<Utc>>) {
        (
            utc_midnight(self.first),
            self.last.succ_opt().map(utc_midnight),
        )
    }
}

/// Start of `date` in UTC.
pub fn utc_midnight(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}
