//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use registre_core::Period;

/// Personal time tracker.
///
/// Records when you start and stop working on a task for a project and
/// reports the time spent per project by day, week or month.
#[derive(Debug, Parser)]
#[command(name = "registre", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Print version, database location and record counts.
    Info,

    /// Start a task for a project, offering to stop the running one.
    Start {
        /// Project the work belongs to.
        project: String,

        /// What you are working on.
        task: String,

        /// Stop the running task without asking.
        #[arg(short, long)]
        yes: bool,
    },

    /// Stop the running task.
    Stop,

    /// Print the running task.
    Current {
        /// Print a one-line summary.
        #[arg(short, long)]
        short: bool,
    },

    /// Print the most recently started task.
    Last {
        /// Only consider this project.
        project: Option<String>,
    },

    /// Report time per project for a day, week or month.
    Report {
        /// Period to report on: day, week or month.
        mode: Period,

        /// Number of periods to go back (0 is the current one).
        #[arg(default_value_t = 0)]
        offset: u32,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Export records as a JSON array.
    Export {
        /// Write to this file instead of stdout.
        #[arg(short, long)]
        outfile: Option<PathBuf>,

        /// Only records starting at or after this time
        /// (ISO 8601, YYYY-MM-DD or e.g. '2 days ago').
        #[arg(long)]
        from: Option<String>,

        /// Only records starting before this time.
        #[arg(long)]
        to: Option<String>,
    },

    /// Import records from a JSON export.
    Import {
        /// File to read; stdin when omitted or '-'.
        file: Option<PathBuf>,
    },
}
