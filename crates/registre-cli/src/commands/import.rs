//! Import command for loading a JSON export into the local `SQLite` store.

use std::fs::File;
use std::io::{self, BufReader, Read, Write};
use std::path::Path;

use anyhow::{Context, Result};
use registre_core::Record;
use registre_db::{Database, ImportSummary};

/// Runs the import command, reading from `file` or stdin when it is `None` or `-`.
pub fn run<W: Write>(
    db: &mut Database,
    writer: &mut W,
    file: Option<&Path>,
) -> Result<ImportSummary> {
    let records = match file {
        Some(path) if path != Path::new("-") => {
            let file = File::open(path)
                .with_context(|| format!("failed to open {}", path.display()))?;
            parse_records(BufReader::new(file))
                .with_context(|| format!("invalid export file {}", path.display()))?
        }
        _ => parse_records(io::stdin().lock()).context("invalid export on stdin")?,
    };

    let summary = db.import_records(&records)?;
    writeln!(
        writer,
        "Imported {} records ({} already present)",
        summary.inserted, summary.unchanged
    )?;
    Ok(summary)
}

/// Parses a JSON array of records as written by `registre export`.
pub fn parse_records<R: Read>(reader: R) -> Result<Vec<Record>> {
    let records: Vec<Record> = serde_json::from_reader(reader)?;
    Ok(records)
}
