//! Taskboard operator CLI.
//!
//! # Responsibility
//! - Provide a health probe for `taskboard_core` linkage.
//! - Drive the reminder dispatch sweep that the core leaves to an external
//!   poller, printing each delivered reminder as one JSON line on stdout.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use std::path::PathBuf;
use std::time::Duration;
use taskboard_core::db::open_db;
use taskboard_core::{
    core_version, default_log_level, init_logging, ping, Reminder, ReminderService,
    SqliteReminderRepository,
};

#[derive(Debug, Parser)]
#[command(name = "taskboard", version, about = "Taskboard core operator tools")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print core linkage and version.
    Ping,
    /// List reminders that are due and not yet dispatched.
    Pending {
        #[command(flatten)]
        store: StoreArgs,
    },
    /// Deliver due reminders to stdout and mark them dispatched.
    Sweep {
        #[command(flatten)]
        store: StoreArgs,
        /// Keep sweeping every N seconds instead of running once.
        #[arg(long, env = "TASKBOARD_SWEEP_INTERVAL_SECS")]
        interval_secs: Option<u64>,
    },
}

#[derive(Debug, clap::Args)]
struct StoreArgs {
    /// SQLite database file.
    #[arg(long, env = "TASKBOARD_DB")]
    db: PathBuf,
    /// Absolute directory for rolling log files. Logging stays off when unset.
    #[arg(long, env = "TASKBOARD_LOG_DIR")]
    log_dir: Option<String>,
    /// trace|debug|info|warn|error; defaults by build mode.
    #[arg(long, env = "TASKBOARD_LOG_LEVEL")]
    log_level: Option<String>,
}

impl StoreArgs {
    fn init_logging(&self) -> Result<()> {
        if let Some(log_dir) = &self.log_dir {
            let level = self.log_level.as_deref().unwrap_or(default_log_level());
            init_logging(level, log_dir).map_err(anyhow::Error::msg)?;
        }
        Ok(())
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Command::Ping => {
            println!("taskboard_core ping={}", ping());
            println!("taskboard_core version={}", core_version());
            Ok(())
        }
        Command::Pending { store } => run_pending(&store),
        Command::Sweep {
            store,
            interval_secs,
        } => run_sweep(&store, interval_secs.map(Duration::from_secs)),
    }
}

fn run_pending(store: &StoreArgs) -> Result<()> {
    store.init_logging()?;
    let conn = open_db(&store.db)
        .with_context(|| format!("failed to open database `{}`", store.db.display()))?;
    let service = ReminderService::new(SqliteReminderRepository::try_new(&conn)?);

    for reminder in service.get_pending_reminders()? {
        println!("{}", serde_json::to_string(&reminder)?);
    }
    Ok(())
}

fn run_sweep(store: &StoreArgs, interval: Option<Duration>) -> Result<()> {
    store.init_logging()?;
    let conn = open_db(&store.db)
        .with_context(|| format!("failed to open database `{}`", store.db.display()))?;
    let service = ReminderService::new(SqliteReminderRepository::try_new(&conn)?);

    let mut print_line = |reminder: &Reminder| -> Result<(), String> {
        let line = serde_json::to_string(reminder).map_err(|err| err.to_string())?;
        println!("{line}");
        Ok(())
    };

    loop {
        let report = service.sweep(&mut print_line)?;
        for (reminder_id, message) in &report.failed {
            eprintln!("reminder {reminder_id} not delivered: {message}");
        }

        let Some(interval) = interval else {
            return Ok(());
        };
        info!(
            "event=sweep_wait module=cli status=ok interval_secs={}",
            interval.as_secs()
        );
        std::thread::sleep(interval);
    }
}
