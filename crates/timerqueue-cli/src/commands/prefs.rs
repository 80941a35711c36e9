use clap::{Subcommand, ValueEnum};
use timerqueue_core::{Database, Preferences};

#[derive(Clone, Copy, ValueEnum)]
pub enum Toggle {
    On,
    Off,
}

#[derive(Subcommand)]
pub enum PrefsAction {
    /// Print current preferences
    Show {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Set the completion sound level (off, soft, medium, loud)
    Alert {
        level: String,
    },
    /// Turn desktop notifications on or off
    Notifications {
        #[arg(value_enum)]
        state: Toggle,
    },
}

pub fn run(action: PrefsAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let mut prefs = Preferences::load(&db);

    match action {
        PrefsAction::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(&prefs)?);
            } else {
                println!("alert level:   {}", prefs.alert_level);
                println!(
                    "notifications: {}",
                    if prefs.notifications_enabled { "on" } else { "off" }
                );
            }
            return Ok(());
        }
        PrefsAction::Alert { level } => {
            if let Some(warning) = prefs.set_alert_level(&level) {
                eprintln!("warning: {warning}");
            }
            println!("alert level: {}", prefs.alert_level);
        }
        PrefsAction::Notifications { state } => {
            prefs.set_notifications_enabled(matches!(state, Toggle::On));
            println!(
                "notifications: {}",
                if prefs.notifications_enabled { "on" } else { "off" }
            );
        }
    }

    prefs.save(&db);
    Ok(())
}
