use std::path::PathBuf;

use chrono::Utc;
use clap::Subcommand;
use timerqueue_core::{format_duration, Config, Database, RunLog, RunOutcome};

use crate::state::{load_session, update_session};

#[derive(Subcommand)]
pub enum LogAction {
    /// Print the run log
    Show {
        /// Print entries as JSON
        #[arg(long)]
        json: bool,
    },
    /// Write the run log to a timestamped JSON file
    Export {
        /// Target directory (defaults to `export.directory`, then the
        /// current directory)
        #[arg(long)]
        dir: Option<PathBuf>,
    },
    /// Discard every log entry
    Clear,
    /// Totals over the whole log
    Summary,
}

pub fn run(action: LogAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;

    match action {
        LogAction::Show { json } => {
            let session = load_session(&db)?;
            if json {
                println!("{}", serde_json::to_string_pretty(session.log.entries())?);
            } else if session.log.is_empty() {
                println!("no runs logged");
            } else {
                for entry in session.log.entries() {
                    let outcome = match entry.outcome {
                        RunOutcome::Completed => "done",
                        RunOutcome::Cancelled => "cancelled",
                    };
                    println!(
                        "{}  {:<9}  {:>8} / {:<8}  {}",
                        entry.started_at.format("%Y-%m-%d %H:%M:%S"),
                        outcome,
                        format_duration(entry.actual_elapsed_ms),
                        format_duration(entry.planned_duration_ms),
                        entry.label
                    );
                }
            }
        }
        LogAction::Export { dir } => {
            let session = load_session(&db)?;
            let dir = dir
                .or_else(|| Config::load_or_default().export.directory.map(PathBuf::from))
                .unwrap_or_else(|| PathBuf::from("."));
            std::fs::create_dir_all(&dir)?;
            let path = dir.join(RunLog::export_file_name(Utc::now()));
            std::fs::write(&path, session.log.serialize()?)?;
            tracing::info!(path = %path.display(), entries = session.log.len(), "run log exported");
            println!("{}", path.display());
        }
        LogAction::Clear => {
            let dropped = update_session(&db, |session| {
                let dropped = session.log.len();
                session.log.clear();
                dropped
            })?;
            println!("cleared {dropped} log entries");
        }
        LogAction::Summary => {
            let summary = load_session(&db)?.log.summary();
            println!("runs:      {}", summary.total_runs);
            println!("completed: {}", summary.completed);
            println!("cancelled: {}", summary.cancelled);
            println!("planned:   {}", format_duration(summary.total_planned_ms));
            println!("actual:    {}", format_duration(summary.total_actual_ms));
        }
    }
    Ok(())
}
