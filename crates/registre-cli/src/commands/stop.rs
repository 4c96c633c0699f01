//! Stop command: closes the running interval.

use std::io::Write;

use anyhow::Result;
use chrono::{DateTime, Utc};
use registre_core::Record;
use registre_db::Database;

use super::util::{format_duration, format_local, stop_time};

/// Runs the stop command, returning the closed records.
///
/// Having nothing open is not an error: it prints "Nothing to stop." and
/// returns an empty list. If several intervals are open, all of them are
/// closed at `now` in one transaction.
pub fn run<W: Write>(
    db: &mut Database,
    writer: &mut W,
    now: DateTime<Utc>,
) -> Result<Vec<Record>> {
    let mut open = db.open_records()?;
    if open.is_empty() {
        writeln!(writer, "Nothing to stop.")?;
        return Ok(open);
    }
    if open.len() > 1 {
        tracing::warn!(count = open.len(), "closing multiple open intervals");
        writeln!(
            writer,
            "Found {} open intervals; stopping all of them.",
            open.len()
        )?;
    }

    let closes: Vec<_> = open.iter().map(|r| (r.id, stop_time(r, now))).collect();
    db.close_all(&closes)?;

    for (record, &(_, stop)) in open.iter_mut().zip(&closes) {
        record.stop = Some(stop);
        writeln!(
            writer,
            "Stopped task \"{}\" for {} at {}. Lasted: {}",
            record.task_label(),
            record.project,
            format_local(stop),
            format_duration(stop - record.start)
        )?;
    }
    Ok(open)
}
