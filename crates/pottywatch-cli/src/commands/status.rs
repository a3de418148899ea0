use chrono::Utc;
use pottywatch_core::{Config, Event};

use super::open_engine;
use crate::render;

pub fn run(json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let engine = open_engine(&config)?;

    let at = Utc::now();
    let status = engine.status(at);
    if json || config.display.json {
        let snapshot = Event::StateSnapshot { status, at };
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    } else {
        print!("{}", render::status_text(&status));
    }
    Ok(())
}
