//! Info command: version, storage location and counts.

use std::io::Write;
use std::path::Path;

use anyhow::Result;
use registre_db::Database;

/// Runs the info command.
pub fn run<W: Write>(writer: &mut W, db: &Database, db_path: &Path) -> Result<()> {
    let stats = db.stats()?;

    writeln!(writer, "Version: {}", env!("CARGO_PKG_VERSION"))?;
    writeln!(writer, "Database path: {}", db_path.display())?;
    writeln!(writer, "Records: {}", stats.record_count)?;
    if stats.projects.is_empty() {
        writeln!(writer, "Projects: 0")?;
    } else {
        writeln!(
            writer,
            "Projects: {} ({})",
            stats.projects.len(),
            stats.projects.join(", ")
        )?;
    }
    Ok(())
}
