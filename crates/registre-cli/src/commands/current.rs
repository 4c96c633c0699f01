//! Current command: shows the running interval.

use std::io::Write;

use anyhow::Result;
use chrono::{DateTime, Utc};
use registre_db::Database;

use super::util::{current_open, format_duration, format_local};

/// Runs the current command. Prints nothing when no interval is open.
pub fn run<W: Write>(
    db: &Database,
    writer: &mut W,
    short: bool,
    now: DateTime<Utc>,
) -> Result<()> {
    let Some(open) = current_open(db)? else {
        return Ok(());
    };

    if short {
        writeln!(writer, "\"{}\" on {}", open.task_label(), open.project)?;
    } else {
        writeln!(
            writer,
            "Working on \"{}\" for {} since {} ({})",
            open.task_label(),
            open.project,
            format_local(open.start),
            format_duration(open.elapsed(now))
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io;

    use chrono::{TimeDelta, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()
    }

    fn output(db: &Database, short: bool, now: DateTime<Utc>) -> String {
        let mut out = Vec::new();
        run(db, &mut out, short, now).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn silent_when_nothing_open() {
        let mut db = Database::open_in_memory().unwrap();
        assert_eq!(output(&db, false, t0()), "");

        let id = db.append("p1", Some("t1"), t0()).unwrap();
        db.close(id, t0() + TimeDelta::minutes(5)).unwrap();
        assert_eq!(output(&db, true, t0()), "");
    }

    #[test]
    fn short_and_long_forms() {
        let mut db = Database::open_in_memory().unwrap();
        db.append("project1", Some("task1"), t0()).unwrap();
        let now = t0() + TimeDelta::minutes(90);

        assert_eq!(output(&db, true, now), "\"task1\" on project1\n");
        assert_eq!(
            output(&db, false, now),
            format!(
                "Working on \"task1\" for project1 since {} (1h 30m)\n",
                format_local(t0())
            )
        );
    }

    #[test]
    fn corrupt_store_is_reported() {
        let mut db = Database::open_in_memory().unwrap();
        db.append("p1", None, t0()).unwrap();
        db.append("p2", None, t0()).unwrap();

        let err = run(&db, &mut io::sink(), false, t0()).unwrap_err();
        let message = format!("{err:#}");
        assert!(message.contains("found 2 open intervals"), "{message}");
        assert!(message.contains("registre stop"), "{message}");
    }
}
