use clap::{Parser, Subcommand};

mod commands;
mod logging;
mod state;
mod terminal;

#[derive(Parser)]
#[command(name = "timerqueue", version, about = "Queue labeled countdowns and run them back to back")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a timer to the end of the queue
    Add(commands::queue::AddArgs),
    /// Show queued timers
    List {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Remove a queued timer by id (full id or unique prefix)
    Remove {
        id: String,
    },
    /// Drop every queued timer (the run log is kept)
    Clear,
    /// Run the queue in the foreground; Ctrl-C, SIGTERM or SIGHUP cancels the active timer
    Run(commands::run::RunArgs),
    /// Run log
    Log {
        #[command(subcommand)]
        action: commands::log::LogAction,
    },
    /// Alert and notification preferences
    Prefs {
        #[command(subcommand)]
        action: commands::prefs::PrefsAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn main() {
    logging::init();
    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Add(args) => commands::queue::add(args),
        Commands::List { json } => commands::queue::list(json),
        Commands::Remove { id } => commands::queue::remove(&id),
        Commands::Clear => commands::queue::clear(),
        Commands::Run(args) => commands::run::run(args),
        Commands::Log { action } => commands::log::run(action),
        Commands::Prefs { action } => commands::prefs::run(action),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
