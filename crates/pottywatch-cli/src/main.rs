use clap::{Parser, Subcommand};
use pottywatch_core::EventKind;
use tracing_subscriber::EnvFilter;

mod commands;
mod render;

#[derive(Parser)]
#[command(name = "pottywatch", version, about = "Dog potty tracker")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Record an event that just happened
    Record {
        /// Event kind: pee or poop
        kind: EventKind,
        /// Print the recorded event as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show time since the last events and whether it is time to go out
    Status {
        #[arg(long)]
        json: bool,
    },
    /// Show recorded events, newest first
    History {
        /// Maximum number of entries (defaults to display.history_limit)
        #[arg(long)]
        limit: Option<usize>,
        #[arg(long)]
        json: bool,
    },
    /// Alert threshold management
    Threshold {
        #[command(subcommand)]
        action: commands::threshold::ThresholdAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Keep running, raise the alarm when due and read commands from stdin
    Watch {
        /// Seconds between evaluations (defaults to alarm.tick_interval_secs)
        #[arg(long)]
        tick_secs: Option<u64>,
        #[arg(long)]
        json: bool,
    },
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("POTTYWATCH_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    init_tracing();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Record { kind, json } => commands::record::run(kind, json),
        Commands::Status { json } => commands::status::run(json),
        Commands::History { limit, json } => commands::history::run(limit, json),
        Commands::Threshold { action } => commands::threshold::run(action),
        Commands::Config { action } => commands::config::run(action),
        Commands::Watch { tick_secs, json } => commands::watch::run(tick_secs, json),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
