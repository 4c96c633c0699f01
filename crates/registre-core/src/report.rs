//! Per-project aggregation of tracked intervals.

use std::collections::BTreeMap;

use chrono::TimeDelta;

use crate::record::Record;

/// Total closed time for one project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectTotal {
    pub project: String,
    pub total: TimeDelta,
}

/// Sums closed interval durations per project.
///
/// Open records are ignored, and a project with no closed record in the
/// input does not appear at all. Output is sorted by project name.
pub fn aggregate<'a, I>(records: I) -> Vec<ProjectTotal>
where
    I: IntoIterator<Item = &'a Record>,
{
    let mut totals: BTreeMap<&str, TimeDelta> = BTreeMap::new();
    let mut skipped_open = 0_usize;
    for record in records {
        let Some(duration) = record.duration() else {
            skipped_open += 1;
            continue;
        };
        *totals.entry(record.project.as_str()).or_default() += duration;
    }
    if skipped_open > 0 {
        tracing::trace!(skipped_open, "open records excluded from aggregate");
    }

    totals
        .into_iter()
        .map(|(project, total)| ProjectTotal {
            project: project.to_string(),
            total,
        })
        .collect()
}

/// Sum of all project totals.
pub fn grand_total(totals: &[ProjectTotal]) -> TimeDelta {
    totals.iter().map(|t| t.total).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, h, m, 0).unwrap()
    }

    fn record(id: i64, project: &str, start: (u32, u32), stop: Option<(u32, u32)>) -> Record {
        Record {
            id,
            project: project.to_string(),
            task: None,
            start: at(start.0, start.1),
            stop: stop.map(|(h, m)| at(h, m)),
        }
    }

    fn totals(records: &[Record]) -> Vec<(String, TimeDelta)> {
        aggregate(records)
            .into_iter()
            .map(|t| (t.project, t.total))
            .collect()
    }

    #[test]
    fn aggregate_table() {
        let cases: Vec<(&str, Vec<Record>, Vec<(&str, TimeDelta)>)> = vec![
            ("empty input", vec![], vec![]),
            (
                "open interval project is omitted",
                vec![
                    record(1, "p1", (0, 0), Some((1, 0))),
                    record(2, "p1", (1, 0), Some((1, 30))),
                    record(3, "p2", (2, 0), None),
                ],
                vec![("p1", TimeDelta::minutes(90))],
            ),
            (
                "open interval does not count toward its project",
                vec![
                    record(1, "p1", (0, 0), Some((0, 20))),
                    record(2, "p1", (1, 0), None),
                ],
                vec![("p1", TimeDelta::minutes(20))],
            ),
            (
                "sorted by project name",
                vec![
                    record(1, "zeta", (0, 0), Some((0, 10))),
                    record(2, "alpha", (1, 0), Some((1, 5))),
                    record(3, "Beta", (2, 0), Some((2, 1))),
                ],
                vec![
                    ("Beta", TimeDelta::minutes(1)),
                    ("alpha", TimeDelta::minutes(5)),
                    ("zeta", TimeDelta::minutes(10)),
                ],
            ),
            (
                "zero-length closed interval keeps the project",
                vec![record(1, "p1", (3, 0), Some((3, 0)))],
                vec![("p1", TimeDelta::zero())],
            ),
            (
                "grouping is exact string match",
                vec![
                    record(1, "work", (0, 0), Some((1, 0))),
                    record(2, "Work", (1, 0), Some((2, 0))),
                ],
                vec![("Work", TimeDelta::hours(1)), ("work", TimeDelta::hours(1))],
            ),
        ];

        for (name, input, expected) in cases {
            let expected: Vec<(String, TimeDelta)> = expected
                .into_iter()
                .map(|(p, d)| (p.to_string(), d))
                .collect();
            assert_eq!(totals(&input), expected, "{name}");
        }
    }

    #[test]
    fn grand_total_sums_projects() {
        let records = vec![
            record(1, "p1", (0, 0), Some((1, 0))),
            record(2, "p2", (1, 0), Some((1, 15))),
        ];
        let totals = aggregate(&records);
        assert_eq!(grand_total(&totals), TimeDelta::minutes(75));
        assert_eq!(grand_total(&[]), TimeDelta::zero());
    }
}
