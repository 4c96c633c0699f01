//! Report command for per-project time totals.
//!
//! This module implements `registre report <day|week|month> [offset]` with
//! human-readable and JSON output. Buckets are resolved against the current
//! UTC date, matching how the store buckets records.

use std::fmt::Write;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use registre_core::{Bucket, Period, ProjectTotal, aggregate, grand_total};
use registre_db::Database;
use serde::Serialize;

use super::util::format_duration;

/// Zone whose civil dates define the buckets.
const BUCKET_TIMEZONE: &str = "UTC";

/// Computed report data.
#[derive(Debug)]
pub struct ReportData {
    pub generated_at: DateTime<Utc>,
    pub bucket: Bucket,
    /// Zone of the bucket's start and end dates.
    pub timezone: String,
    pub totals: Vec<ProjectTotal>,
}

// ========== Report Generation ==========

/// Generates report data from the database.
pub fn generate_report_data(
    db: &Database,
    period: Period,
    offset: u32,
    generated_at: DateTime<Utc>,
) -> Result<ReportData> {
    let today = generated_at.date_naive();
    let bucket = period
        .bucket(today, offset)
        .with_context(|| format!("offset {offset} is too far in the past"))?;

    let records = db.query_bucket(&bucket)?;
    let totals = aggregate(&records);
    tracing::debug!(
        records = records.len(),
        projects = totals.len(),
        "aggregated report"
    );

    Ok(ReportData {
        generated_at,
        bucket,
        timezone: BUCKET_TIMEZONE.to_string(),
        totals,
    })
}

/// Formats the period description for the report header.
fn format_period_description(bucket: &Bucket) -> String {
    let first = bucket.first_day();
    match bucket.period() {
        // "Wednesday, Jan 29, 2025"
        Period::Day => format!("{}", first.format("%A, %b %-d, %Y")),
        // "Week of Jan 27, 2025"
        Period::Week => format!("Week of {}", first.format("%b %-d, %Y")),
        // "January 2025"
        Period::Month => format!("{}", first.format("%B %Y")),
    }
}

/// Formats the human-readable report output.
pub fn format_report(data: &ReportData) -> String {
    let mut output = String::new();

    let period_desc = format_period_description(&data.bucket);
    writeln!(output, "TIME REPORT: {period_desc}").unwrap();
    writeln!(output).unwrap();

    if data.totals.is_empty() {
        writeln!(
            output,
            "No time recorded this {}.",
            data.bucket.period().as_str()
        )
        .unwrap();
        return output;
    }

    let total = grand_total(&data.totals);
    let rows: Vec<(&str, String)> = data
        .totals
        .iter()
        .map(|t| (t.project.as_str(), format_duration(t.total)))
        .collect();
    let name_width = rows
        .iter()
        .map(|(name, _)| name.chars().count())
        .chain(["PROJECT".len()])
        .max()
        .unwrap_or_default();
    let total_text = format_duration(total);
    let duration_width = rows
        .iter()
        .map(|(_, duration)| duration.len())
        .chain(["TOTAL".len(), total_text.len()])
        .max()
        .unwrap_or_default();

    writeln!(
        output,
        "{:<name_width$}  {:>duration_width$}",
        "PROJECT", "TOTAL"
    )
    .unwrap();
    for (name, duration) in &rows {
        writeln!(output, "{name:<name_width$}  {duration:>duration_width$}").unwrap();
    }
    writeln!(output, "{}", "─".repeat(name_width + 2 + duration_width)).unwrap();
    writeln!(
        output,
        "{:<name_width$}  {total_text:>duration_width$}",
        "Total"
    )
    .unwrap();

    output
}

// ========== JSON Output ==========

/// JSON report structure.
#[derive(Debug, Serialize)]
pub struct JsonReport {
    pub generated_at: String,
    pub timezone: String,
    pub period: JsonPeriod,
    pub projects: Vec<JsonProject>,
    pub total_seconds: i64,
}

#[derive(Debug, Serialize)]
pub struct JsonPeriod {
    pub start: String,
    pub end: String,
    #[serde(rename = "type")]
    pub period_type: Period,
}

#[derive(Debug, Serialize)]
pub struct JsonProject {
    pub project: String,
    pub total_seconds: i64,
}

fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Formats report data as JSON.
pub fn format_report_json(data: &ReportData) -> Result<String> {
    let report = JsonReport {
        generated_at: data.generated_at.to_rfc3339(),
        timezone: data.timezone.clone(),
        period: JsonPeriod {
            start: format_date(data.bucket.first_day()),
            end: format_date(data.bucket.last_day()),
            period_type: data.bucket.period(),
        },
        projects: data
            .totals
            .iter()
            .map(|t| JsonProject {
                project: t.project.clone(),
                total_seconds: t.total.num_seconds(),
            })
            .collect(),
        total_seconds: grand_total(&data.totals).num_seconds(),
    };

    Ok(serde_json::to_string_pretty(&report)?)
}

// ========== Public Interface ==========

/// Runs the report command.
pub fn run<W: std::io::Write>(
    db: &Database,
    writer: &mut W,
    period: Period,
    offset: u32,
    json: bool,
    now: DateTime<Utc>,
) -> Result<()> {
    let data = generate_report_data(db, period, offset, now)?;

    if json {
        let output = format_report_json(&data)?;
        writeln!(writer, "{output}")?;
    } else {
        let output = format_report(&data);
        write!(writer, "{output}")?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeDelta, TimeZone};
    use insta::assert_snapshot;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn total(project: &str, minutes: i64) -> ProjectTotal {
        ProjectTotal {
            project: project.to_string(),
            total: TimeDelta::minutes(minutes),
        }
    }

    fn week_data(totals: Vec<ProjectTotal>) -> ReportData {
        ReportData {
            generated_at: Utc.with_ymd_and_hms(2025, 1, 29, 16, 0, 0).unwrap(),
            bucket: Bucket::week_containing(date(2025, 1, 29)).unwrap(),
            timezone: BUCKET_TIMEZONE.to_string(),
            totals,
        }
    }

    #[test]
    fn test_period_descriptions() {
        assert_eq!(
            format_period_description(&Bucket::day(date(2025, 1, 29))),
            "Wednesday, Jan 29, 2025"
        );
        assert_eq!(
            format_period_description(&Bucket::week_containing(date(2025, 1, 29)).unwrap()),
            "Week of Jan 27, 2025"
        );
        let month = Period::Month.bucket(date(2025, 1, 29), 1).unwrap();
        assert_eq!(format_period_description(&month), "December 2024");
    }

    #[test]
    fn test_report_empty_period() {
        let output = format_report(&week_data(vec![]));
        assert_snapshot!(output, @r"
        TIME REPORT: Week of Jan 27, 2025

        No time recorded this week.
        ");
    }

    #[test]
    fn test_report_table() {
        let output = format_report(&week_data(vec![
            total("client-work", 150),
            total("docs", 45),
            total("x", 0),
        ]));
        assert_snapshot!(output, @r"
        TIME REPORT: Week of Jan 27, 2025

        PROJECT       TOTAL
        client-work  2h 30m
        docs            45m
        x                0s
        ───────────────────
        Total        3h 15m
        ");
    }

    #[test]
    fn test_report_json_output() {
        let data = week_data(vec![total("client-work", 150), total("docs", 45)]);
        let output = format_report_json(&data).unwrap();
        assert_snapshot!(output, @r#"
        {
          "generated_at": "2025-01-29T16:00:00+00:00",
          "timezone": "UTC",
          "period": {
            "start": "2025-01-27",
            "end": "2025-02-02",
            "type": "week"
          },
          "projects": [
            {
              "project": "client-work",
              "total_seconds": 9000
            },
            {
              "project": "docs",
              "total_seconds": 2700
            }
          ],
          "total_seconds": 11700
        }
        "#);
        assert_eq!(grand_total(&data.totals), TimeDelta::minutes(195));
    }

    #[test]
    fn test_generate_report_data_buckets_and_aggregates() {
        let mut db = Database::open_in_memory().unwrap();
        let at = |d: u32, h: u32, m: u32| Utc.with_ymd_and_hms(2024, 1, d, h, m, 0).unwrap();

        let id = db.append("p1", Some("a"), at(1, 0, 0)).unwrap();
        db.close(id, at(1, 1, 0)).unwrap();
        let id = db.append("p1", Some("b"), at(1, 1, 0)).unwrap();
        db.close(id, at(1, 1, 30)).unwrap();
        let id = db.append("p3", Some("other day"), at(2, 9, 0)).unwrap();
        db.close(id, at(2, 10, 0)).unwrap();
        db.append("p2", Some("c"), at(3, 2, 0)).unwrap();

        let now = at(3, 12, 0);
        let today = generate_report_data(&db, Period::Day, 0, now).unwrap();
        assert!(
            today.totals.is_empty(),
            "open interval alone reports nothing"
        );
        assert_eq!(today.timezone, "UTC");

        let jan_1 = generate_report_data(&db, Period::Day, 2, now).unwrap();
        assert_eq!(jan_1.totals, vec![total("p1", 90)]);
        assert_eq!(jan_1.bucket.first_day(), date(2024, 1, 1));

        // Jan 3, 2024 is a Wednesday; its week starts on Jan 1
        let week = generate_report_data(&db, Period::Week, 0, now).unwrap();
        assert_eq!(week.totals, vec![total("p1", 90), total("p3", 60)]);

        let month = generate_report_data(&db, Period::Month, 0, now).unwrap();
        assert_eq!(month.totals, week.totals);

        let previous_month = generate_report_data(&db, Period::Month, 1, now).unwrap();
        assert!(previous_month.totals.is_empty());
        assert_eq!(previous_month.bucket.first_day(), date(2023, 12, 1));
    }

    #[test]
    fn test_generate_report_data_rejects_huge_offset() {
        let db = Database::open_in_memory().unwrap();
        let now = Utc.with_ymd_and_hms(2024, 1, 3, 12, 0, 0).unwrap();
        let err = generate_report_data(&db, Period::Day, u32::MAX, now).unwrap_err();
        assert!(err.to_string().contains("too far in the past"));
    }
}
