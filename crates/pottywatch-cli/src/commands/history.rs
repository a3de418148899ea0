use pottywatch_core::Config;

use super::open_engine;

pub fn run(limit: Option<usize>, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let engine = open_engine(&config)?;
    let limit = limit.unwrap_or(config.display.history_limit);
    let entries: Vec<_> = engine.history().iter().take(limit).collect();

    if json || config.display.json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else if entries.is_empty() {
        println!("No events recorded yet.");
    } else {
        for entry in entries {
            println!("{entry}");
        }
    }
    Ok(())
}
