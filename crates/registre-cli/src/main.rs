use std::io;
use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use registre_cli::commands::start::{AssumeYes, Confirm, LinePrompt};
use registre_cli::commands::{current, export, import, info, last, report, start, stop};
use registre_cli::{Cli, Commands, Config};

/// Load config and open database, ensuring the parent directory exists.
fn open_database(config_path: Option<&Path>) -> Result<(registre_db::Database, Config)> {
    let config = Config::load_from(config_path).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    if let Some(parent) = config.db_path.parent() {
        std::fs::create_dir_all(parent).context("failed to create database directory")?;
    }

    let db = registre_db::Database::open(&config.db_path)
        .with_context(|| format!("failed to open database {}", config.db_path.display()))?;
    Ok((db, config))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Logs go to stderr so stdout stays clean for `export`
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    let Some(command) = &cli.command else {
        // No subcommand, show help
        use clap::CommandFactory;
        Cli::command().print_help()?;
        println!();
        return Ok(());
    };

    let (mut db, config) = open_database(cli.config.as_deref())?;
    let now = registre_core::now();
    let stdout = io::stdout();
    let mut out = stdout.lock();

    match command {
        Commands::Info => info::run(&mut out, &db, &config.db_path)?,
        Commands::Start { project, task, yes } => {
            let mut confirm: Box<dyn Confirm> = if *yes {
                Box::new(AssumeYes)
            } else {
                Box::new(LinePrompt::new(io::stdin().lock(), io::stderr()))
            };
            start::run(
                &mut db,
                &mut out,
                confirm.as_mut(),
                project,
                Some(task.as_str()),
                now,
            )?;
        }
        Commands::Stop => {
            stop::run(&mut db, &mut out, now)?;
        }
        Commands::Current { short } => current::run(&db, &mut out, *short, now)?,
        Commands::Last { project } => last::run(&db, &mut out, project.as_deref(), now)?,
        Commands::Report { mode, offset, json } => {
            report::run(&db, &mut out, *mode, *offset, *json, now)?;
        }
        Commands::Export { outfile, from, to } => {
            drop(out);
            export::run(&db, outfile.as_deref(), from.as_deref(), to.as_deref(), now)?;
        }
        Commands::Import { file } => {
            import::run(&mut db, &mut out, file.as_deref())?;
        }
    }

    Ok(())
}
