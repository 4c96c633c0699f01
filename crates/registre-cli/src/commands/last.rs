//! Last command: shows the most recently started interval.

use std::io::Write;

use anyhow::Result;
use chrono::{DateTime, Utc};
use registre_db::Database;

use super::util::{format_duration, format_local};

/// Runs the last command, optionally restricted to one project.
pub fn run<W: Write>(
    db: &Database,
    writer: &mut W,
    project: Option<&str>,
    now: DateTime<Utc>,
) -> Result<()> {
    let Some(record) = db.last_started(project)? else {
        match project {
            Some(project) => writeln!(writer, "No records for {project}.")?,
            None => writeln!(writer, "No records.")?,
        }
        return Ok(());
    };

    let status = match record.stop {
        Some(stop) => format!(
            "until {}, lasted {}",
            format_local(stop),
            format_duration(record.elapsed(now))
        ),
        None => format!(
            "still running, {} so far",
            format_duration(record.elapsed(now))
        ),
    };
    writeln!(
        writer,
        "\"{}\" for {} from {} ({status})",
        record.task_label(),
        record.project,
        format_local(record.start)
    )?;
    Ok(())
}
