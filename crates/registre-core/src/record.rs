//! Tracked time intervals.

use chrono::{DateTime, SubsecRound, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

/// A tracked span of work.
///
/// A record is created open (`stop` is `None`) and closed exactly once.
/// Serializes as a flat object with RFC 3339 UTC timestamps, which is the
/// export/import format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Store-assigned identifier, increasing in insertion order.
    pub id: i64,

    /// Activity grouping.
    pub project: String,

    /// Free-form label for the unit of work.
    #[serde(default)]
    pub task: Option<String>,

    /// When work started.
    pub start: DateTime<Utc>,

    /// When work stopped, `None` while the interval is still open.
    #[serde(default)]
    pub stop: Option<DateTime<Utc>>,
}

impl Record {
    /// Returns true while the interval has no stop time.
    pub const fn is_open(&self) -> bool {
        self.stop.is_none()
    }

    /// Length of a closed interval, `None` while open.
    pub fn duration(&self) -> Option<TimeDelta> {
        self.stop.map(|stop| stop - self.start)
    }

    /// Length of the interval, measuring open intervals up to `now`.
    pub fn elapsed(&self, now: DateTime<Utc>) -> TimeDelta {
        self.stop.unwrap_or(now) - self.start
    }

    /// Task label for display.
    pub fn task_label(&self) -> &str {
        self.task.as_deref().unwrap_or("(no task)")
    }
}

/// Current instant truncated to whole seconds.
///
/// The store keeps second precision, so every timestamp the tool writes
/// goes through here to keep round-trips exact.
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Timelike};

    fn record(stop: Option<DateTime<Utc>>) -> Record {
        Record {
            id: 1,
            project: "p1".to_string(),
            task: Some("t1".to_string()),
            start: Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap(),
            stop,
        }
    }

    #[test]
    fn open_record_has_no_duration() {
        let open = record(None);
        assert!(open.is_open());
        assert_eq!(open.duration(), None);

        let now = Utc.with_ymd_and_hms(2024, 1, 1, 12, 45, 0).unwrap();
        assert_eq!(open.elapsed(now), TimeDelta::minutes(45));
    }

    #[test]
    fn closed_record_duration() {
        let closed = record(Some(Utc.with_ymd_and_hms(2024, 1, 1, 13, 30, 0).unwrap()));
        assert!(!closed.is_open());
        assert_eq!(closed.duration(), Some(TimeDelta::minutes(90)));

        let later = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();
        assert_eq!(closed.elapsed(later), TimeDelta::minutes(90));
    }

    #[test]
    fn now_has_whole_seconds() {
        assert_eq!(now().nanosecond(), 0);
    }

    #[test]
    fn task_label_falls_back_when_missing() {
        let mut r = record(None);
        assert_eq!(r.task_label(), "t1");
        r.task = None;
        assert_eq!(r.task_label(), "(no task)");
    }

    #[test]
    fn serializes_as_flat_object() {
        let r = record(None);
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "id": 1,
                "project": "p1",
                "task": "t1",
                "start": "2024-01-01T12:00:00Z",
                "stop": null,
            })
        );
    }

    #[test]
    fn deserializes_without_optional_fields() {
        let r: Record =
            serde_json::from_str(r#"{"id":7,"project":"p","start":"2024-01-01T12:00:00Z"}"#)
                .unwrap();
        assert_eq!(r.id, 7);
        assert_eq!(r.task, None);
        assert!(r.is_open());
    }
}
