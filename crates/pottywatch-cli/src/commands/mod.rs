pub mod config;
pub mod history;
pub mod record;
pub mod status;
pub mod threshold;
pub mod watch;

use pottywatch_core::{Config, Database, TrackerEngine};

/// Open the tracker over the on-disk database.
pub fn open_engine(config: &Config) -> Result<TrackerEngine<Database>, Box<dyn std::error::Error>> {
    let db = Database::open()?;
    Ok(TrackerEngine::new(db).with_ack_policy(config.alarm.acknowledge_policy))
}
