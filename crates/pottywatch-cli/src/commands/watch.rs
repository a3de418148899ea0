//! Long-running mode: the monitor ticks in the background while stdin
//! carries user actions.

use std::time::Duration;

use pottywatch_core::{
    alert_from_config, Config, Event, EventKind, Monitor, MonitorHandle, SystemClock,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::info;

use super::open_engine;
use crate::render;

/// One line of user input.
#[derive(Debug, Clone, PartialEq)]
pub enum WatchInput {
    Record(EventKind),
    Acknowledge,
    Threshold(f64),
    Status,
    Help,
    Quit,
    Empty,
    Unknown(String),
}

pub fn parse_input(line: &str) -> WatchInput {
    let mut words = line.split_whitespace();
    let Some(cmd) = words.next() else {
        return WatchInput::Empty;
    };
    match cmd.to_ascii_lowercase().as_str() {
        "pee" => WatchInput::Record(EventKind::Pee),
        "poop" => WatchInput::Record(EventKind::Poop),
        "ack" | "acknowledge" => WatchInput::Acknowledge,
        "threshold" => WatchInput::Threshold(
            words
                .next()
                .and_then(|h| h.parse::<f64>().ok())
                .unwrap_or(f64::NAN),
        ),
        "status" => WatchInput::Status,
        "help" | "?" => WatchInput::Help,
        "quit" | "exit" | "q" => WatchInput::Quit,
        _ => WatchInput::Unknown(line.trim().to_string()),
    }
}

const HELP: &str = "commands: pee | poop | ack | threshold <hours> | status | quit";

pub fn run(tick_secs: Option<u64>, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let json = json || config.display.json;
    let period = Duration::from_secs(
        tick_secs
            .unwrap_or(config.alarm.tick_interval_secs)
            .max(1),
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(watch(config, period, json))
}

async fn watch(config: Config, period: Duration, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let engine = open_engine(&config)?;
    let alert = alert_from_config(&config.alarm);
    let (tx, mut events) = mpsc::unbounded_channel();
    let monitor = Monitor::new(engine, alert, SystemClock, tx);

    print_event(&monitor.snapshot(), json)?;
    if !json {
        println!("{HELP}");
    }
    let handle = monitor.spawn(period);
    info!(period_secs = period.as_secs(), "watching");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let result = loop {
        tokio::select! {
            Some(event) = events.recv() => print_event(&event, json)?,
            line = lines.next_line() => {
                let line = match line {
                    Ok(Some(line)) => line,
                    Ok(None) => break Ok(()),
                    Err(e) => break Err(e.into()),
                };
                match dispatch(&handle, parse_input(&line), json).await {
                    Ok(true) => {}
                    Ok(false) => break Ok(()),
                    Err(e) => break Err(e),
                }
            }
            _ = tokio::signal::ctrl_c() => break Ok(()),
        }
    };

    // Flush queued commands before stopping so their events get printed.
    let _ = handle.status().await;
    handle.shutdown().await;
    while let Ok(event) = events.try_recv() {
        print_event(&event, json)?;
    }
    result
}

/// Apply one input line. Returns `false` when the user asked to quit.
async fn dispatch(
    handle: &MonitorHandle,
    input: WatchInput,
    json: bool,
) -> Result<bool, Box<dyn std::error::Error>> {
    match input {
        WatchInput::Record(kind) => handle.record(kind)?,
        WatchInput::Acknowledge => handle.acknowledge()?,
        WatchInput::Threshold(hours) => handle.set_threshold(hours)?,
        WatchInput::Status => {
            let status = handle.status().await?;
            let snapshot = Event::StateSnapshot {
                status,
                at: chrono::Utc::now(),
            };
            print_event(&snapshot, json)?;
        }
        WatchInput::Help => println!("{HELP}"),
        WatchInput::Quit => return Ok(false),
        WatchInput::Empty => {}
        WatchInput::Unknown(line) => eprintln!("unknown command: {line} ({HELP})"),
    }
    Ok(true)
}

fn print_event(event: &Event, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    if json {
        println!("{}", serde_json::to_string(event)?);
    } else {
        print!("{}", render::event_text(event));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_actions() {
        assert_eq!(parse_input("pee"), WatchInput::Record(EventKind::Pee));
        assert_eq!(parse_input("  POOP "), WatchInput::Record(EventKind::Poop));
        assert_eq!(parse_input("ack"), WatchInput::Acknowledge);
        assert_eq!(parse_input("threshold 3.5"), WatchInput::Threshold(3.5));
        assert_eq!(parse_input("quit"), WatchInput::Quit);
        assert_eq!(parse_input(""), WatchInput::Empty);
        assert_eq!(parse_input("walk"), WatchInput::Unknown("walk".to_string()));
    }

    #[test]
    fn bad_threshold_input_becomes_nan() {
        match parse_input("threshold soon") {
            WatchInput::Threshold(h) => assert!(h.is_nan()),
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(parse_input("threshold"), WatchInput::Threshold(h) if h.is_nan()));
    }
}
