//! Implementation of the `registre export` command.
//!
//! Writes records as a pretty-printed JSON array of flat objects
//! (`id`, `project`, `task`, `start`, `stop`) with RFC 3339 UTC timestamps.
//! The same format is read back by `registre import`.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use registre_core::Record;
use registre_db::Database;

use super::util::parse_datetime;

/// Runs the export command, returning the number of records written.
///
/// `from` and `to` bound the record start time as `from <= start < to`.
pub fn run(
    db: &Database,
    outfile: Option<&Path>,
    from: Option<&str>,
    to: Option<&str>,
    now: DateTime<Utc>,
) -> Result<usize> {
    let records = select_records(db, from, to, now)?;

    match outfile {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            let mut writer = BufWriter::new(file);
            write_records(&mut writer, &records)?;
            writer
                .flush()
                .with_context(|| format!("failed to write {}", path.display()))?;
        }
        None => {
            let stdout = io::stdout();
            write_records(&mut stdout.lock(), &records)?;
        }
    }

    tracing::debug!(count = records.len(), "exported records");
    Ok(records.len())
}

fn select_records(
    db: &Database,
    from: Option<&str>,
    to: Option<&str>,
    now: DateTime<Utc>,
) -> Result<Vec<Record>> {
    let from = from
        .map(|s| parse_datetime(s, now))
        .transpose()
        .context("invalid --from")?;
    let to = to
        .map(|s| parse_datetime(s, now))
        .transpose()
        .context("invalid --to")?;
    if let (Some(from), Some(to)) = (from, to) {
        if to < from {
            anyhow::bail!("--to ({to}) is before --from ({from})");
        }
    }
    Ok(db.query_range(from, to)?)
}

/// Serializes records as a JSON array followed by a newline.
pub fn write_records<W: Write>(writer: &mut W, records: &[Record]) -> Result<()> {
    serde_json::to_writer_pretty(&mut *writer, records).context("failed to serialize records")?;
    writeln!(writer)?;
    Ok(())
}
