use chrono::Utc;
use pottywatch_core::{Config, Event, EventKind};

use super::open_engine;

pub fn run(kind: EventKind, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let mut engine = open_engine(&config)?;

    let at = Utc::now();
    let entry = engine.record_event(kind, at);

    if json || config.display.json {
        let event = Event::EventRecorded { kind, entry, at };
        println!("{}", serde_json::to_string_pretty(&event)?);
    } else {
        println!("Recorded: {entry}");
    }
    Ok(())
}
