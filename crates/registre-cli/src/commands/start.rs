//! Start command: opens a new interval, closing the running one on confirmation.

use std::io::{BufRead, Write};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use registre_core::ProjectName;
use registre_db::Database;

use super::util::{current_open, format_duration, stop_time};

/// Asks the user a yes/no question.
pub trait Confirm {
    fn confirm(&mut self, question: &str) -> Result<bool>;
}

/// Accepts every question without asking (`--yes`).
#[derive(Debug, Default)]
pub struct AssumeYes;

impl Confirm for AssumeYes {
    fn confirm(&mut self, _question: &str) -> Result<bool> {
        Ok(true)
    }
}

/// Prompts on `output` and reads one answer line from `input`.
///
/// Only `y` or `yes` (any case) accepts; an empty answer or end of input
/// declines, so non-interactive runs never close anything by accident.
pub struct LinePrompt<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> LinePrompt<R, W> {
    pub const fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl<R: BufRead, W: Write> Confirm for LinePrompt<R, W> {
    fn confirm(&mut self, question: &str) -> Result<bool> {
        write!(self.output, "{question} [y/N] ")?;
        self.output.flush()?;

        let mut answer = String::new();
        let read = self
            .input
            .read_line(&mut answer)
            .context("failed to read confirmation")?;
        if read == 0 {
            writeln!(self.output)?;
            return Ok(false);
        }
        let answer = answer.trim().to_ascii_lowercase();
        Ok(answer == "y" || answer == "yes")
    }
}

/// Runs the start command, returning the id of the new record.
///
/// If an interval is open, the user must confirm closing it; declining
/// aborts with an error and leaves the store untouched. Closing the old
/// interval and opening the new one happen in a single transaction.
pub fn run<W: Write, C: Confirm + ?Sized>(
    db: &mut Database,
    writer: &mut W,
    confirm: &mut C,
    project: &str,
    task: Option<&str>,
    now: DateTime<Utc>,
) -> Result<i64> {
    let project = ProjectName::new(project)?;
    let task = task.map(str::trim).filter(|t| !t.is_empty());

    let id = if let Some(open) = current_open(db)? {
        writeln!(
            writer,
            "Looks like you are already working on {} doing \"{}\"",
            open.project,
            open.task_label()
        )?;
        if !confirm.confirm("Do you want to stop it and start this task?")? {
            anyhow::bail!(
                "aborted: \"{}\" for {} is still running",
                open.task_label(),
                open.project
            );
        }

        let stop = stop_time(&open, now);
        let id = db.switch_to(open.id, stop, project.as_str(), task, now)?;
        writeln!(
            writer,
            "Stopped \"{}\" for {}. Lasted: {}",
            open.task_label(),
            open.project,
            format_duration(stop - open.start)
        )?;
        id
    } else {
        db.append(project.as_str(), task, now)?
    };

    writeln!(
        writer,
        "Started \"{}\" for project {project}",
        task.unwrap_or("(no task)")
    )?;
    Ok(id)
}
