use clap::Subcommand;
use pottywatch_core::Config;

use super::open_engine;

#[derive(Subcommand)]
pub enum ThresholdAction {
    /// Print the current threshold in hours
    Get,
    /// Set the threshold in hours; invalid values fall back to 8
    Set {
        /// Hours, e.g. 3.5
        #[arg(allow_hyphen_values = true)]
        hours: String,
    },
}

pub fn run(action: ThresholdAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let mut engine = open_engine(&config)?;

    match action {
        ThresholdAction::Get => {
            println!("{}", engine.threshold_hours());
        }
        ThresholdAction::Set { hours } => {
            let requested = hours.trim().parse::<f64>().unwrap_or(f64::NAN);
            let applied = engine.set_threshold(requested);
            if applied != requested {
                eprintln!("invalid threshold '{hours}', using default");
            }
            println!("{applied}");
        }
    }
    Ok(())
}
