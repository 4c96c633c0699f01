//! Shared utilities for CLI commands.

use std::sync::LazyLock;

use anyhow::Context;
use chrono::{DateTime, Local, NaiveDate, TimeDelta, Utc};
use regex::Regex;
use registre_core::Record;
use registre_core::period::utc_midnight;
use registre_db::{Database, DbError};

/// Display format for local timestamps.
pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Pre-compiled regex for relative time parsing.
static RELATIVE_TIME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)\s+(minute|hour|day|week)s?\s+ago$").unwrap());

/// Conservative bounds for relative time parsing (~1000 years in minutes).
const MAX_RELATIVE_MINUTES: i64 = 1000 * 365 * 24 * 60;

/// Parse a datetime string as ISO 8601, a plain date, or relative time.
///
/// Supports:
/// - ISO 8601: "2026-01-15T10:30:00Z"
/// - Date: "2026-01-15" (UTC midnight)
/// - Relative: "2 hours ago", "30 minutes ago", "1 day ago", "1 week ago"
pub fn parse_datetime(s: &str, now: DateTime<Utc>) -> anyhow::Result<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(utc_midnight(date));
    }

    let Some(caps) = RELATIVE_TIME_RE.captures(s) else {
        anyhow::bail!(
            "Invalid datetime: {s}. Use ISO 8601 (e.g., 2026-01-15T10:30:00Z), a date (2026-01-15) or relative (e.g., '2 hours ago')"
        );
    };

    let n: i64 = caps[1]
        .parse()
        .context("failed to parse number in relative time")?;

    let (max_for_unit, minutes_per_unit) = match &caps[2] {
        "minute" => (MAX_RELATIVE_MINUTES, 1),
        "hour" => (MAX_RELATIVE_MINUTES / 60, 60),
        "day" => (MAX_RELATIVE_MINUTES / (60 * 24), 60 * 24),
        "week" => (MAX_RELATIVE_MINUTES / (60 * 24 * 7), 60 * 24 * 7),
        unit => anyhow::bail!("Unknown time unit: {unit}"),
    };

    if n > max_for_unit {
        anyhow::bail!("Relative time value too large: {n} {}", &caps[2]);
    }

    Ok(now - TimeDelta::minutes(n * minutes_per_unit))
}

/// Renders a UTC instant in the local timezone.
pub fn format_local(instant: DateTime<Utc>) -> String {
    instant.with_timezone(&Local).format(TIME_FORMAT).to_string()
}

/// Formats a duration as "Xh Ym", "Ym" or "Zs".
///
/// Hours and minutes are floored; seconds only show for sub-minute spans.
pub fn format_duration(duration: TimeDelta) -> String {
    let secs = duration.num_seconds();
    if secs <= 0 {
        return "0s".to_string();
    }
    let total_minutes = secs / 60;
    let hours = total_minutes / 60;
    let minutes = total_minutes % 60;

    if hours >= 1 {
        format!("{hours}h {minutes}m")
    } else if minutes >= 1 {
        format!("{minutes}m")
    } else {
        format!("{secs}s")
    }
}

/// Returns the open record, pointing at `stop` if several are open.
pub fn current_open(db: &Database) -> anyhow::Result<Option<Record>> {
    match db.current_open() {
        Err(err @ DbError::MultipleOpenIntervals { .. }) => {
            Err(anyhow::Error::new(err).context("run `registre stop` to close every open interval"))
        }
        other => Ok(other?),
    }
}

/// Stop time for closing `record` at `now`.
///
/// Never earlier than the record's start, so a clock that went backwards
/// cannot produce a negative interval.
pub fn stop_time(record: &Record, now: DateTime<Utc>) -> DateTime<Utc> {
    if now < record.start {
        tracing::warn!(
            id = record.id,
            start = %record.start,
            %now,
            "clock is behind the open interval's start, closing at its start"
        );
        record.start
    } else {
        now
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 15, 12, 0, 0).unwrap()
    }

    #[test]
    fn parses_rfc3339_and_dates() {
        assert_eq!(
            parse_datetime("2026-01-15T10:30:00Z", now()).unwrap(),
            Utc.with_ymd_and_hms(2026, 1, 15, 10, 30, 0).unwrap()
        );
        assert_eq!(
            parse_datetime("2026-01-15T10:30:00+02:00", now()).unwrap(),
            Utc.with_ymd_and_hms(2026, 1, 15, 8, 30, 0).unwrap()
        );
        assert_eq!(
            parse_datetime("2026-01-10", now()).unwrap(),
            Utc.with_ymd_and_hms(2026, 1, 10, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn parses_relative_times() {
        assert_eq!(
            parse_datetime("2 hours ago", now()).unwrap(),
            Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap()
        );
        assert_eq!(
            parse_datetime("1 week ago", now()).unwrap(),
            Utc.with_ymd_and_hms(2026, 1, 8, 12, 0, 0).unwrap()
        );
        assert_eq!(
            parse_datetime("30 minutes ago", now()).unwrap(),
            Utc.with_ymd_and_hms(2026, 1, 15, 11, 30, 0).unwrap()
        );
    }

    #[test]
    fn rejects_garbage_and_huge_values() {
        assert!(parse_datetime("yesterday", now()).is_err());
        assert!(parse_datetime("99999999999 weeks ago", now()).is_err());
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(TimeDelta::minutes(150)), "2h 30m");
        assert_eq!(format_duration(TimeDelta::hours(1)), "1h 0m");
        assert_eq!(format_duration(TimeDelta::seconds(2754)), "45m");
        assert_eq!(format_duration(TimeDelta::seconds(59)), "59s");
        assert_eq!(format_duration(TimeDelta::zero()), "0s");
        assert_eq!(format_duration(TimeDelta::seconds(-5)), "0s");
    }

    #[test]
    fn stop_time_never_precedes_start() {
        let record = Record {
            id: 1,
            project: "p".to_string(),
            task: None,
            start: now(),
            stop: None,
        };
        let earlier = now() - TimeDelta::minutes(5);
        let later = now() + TimeDelta::minutes(5);
        assert_eq!(stop_time(&record, earlier), now());
        assert_eq!(stop_time(&record, later), later);
    }
}
