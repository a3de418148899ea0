//! Text rendering for the terminal.

use chrono::{DateTime, Local, Utc};
use pottywatch_core::alert::ALERT_BANNER as ALERT_LINE;
use pottywatch_core::{format_instant_in, Event, TrackerStatus};

/// Rough distance like "about 2 hours", for minutes elapsed.
pub fn humanize_minutes(minutes: i64) -> String {
    match minutes {
        m if m < 1 => "less than a minute".to_string(),
        1 => "1 minute".to_string(),
        m if m < 45 => format!("{m} minutes"),
        m if m < 90 => "about 1 hour".to_string(),
        m if m < 24 * 60 => format!("about {} hours", (m + 30) / 60),
        m if m < 48 * 60 => "1 day".to_string(),
        m => format!("{} days", (m + 12 * 60) / (24 * 60)),
    }
}

fn last_line(label: &str, at: Option<DateTime<Utc>>, minutes: Option<i64>) -> String {
    match (at, minutes) {
        (Some(at), Some(minutes)) => format!(
            "{label}: {} ago ({})\n",
            humanize_minutes(minutes),
            format_instant_in(at, &Local)
        ),
        _ => format!("{label}: Not recorded\n"),
    }
}

pub fn status_text(status: &TrackerStatus) -> String {
    let mut out = String::new();
    out.push_str(&last_line("Last Pee", status.last_pee, status.minutes_since_pee));
    out.push_str(&last_line("Last Poop", status.last_poop, status.minutes_since_poop));
    out.push_str(&format!("Threshold: {} hours\n", status.threshold_hours));
    if status.due {
        out.push_str(ALERT_LINE);
        out.push('\n');
    }
    out
}

pub fn event_text(event: &Event) -> String {
    match event {
        Event::EventRecorded { entry, .. } => format!("Recorded: {entry}\n"),
        Event::AlarmActivated { .. } => format!("{ALERT_LINE} (type `ack` to silence)\n"),
        Event::AlarmDeactivated { .. } => "Alarm cleared\n".to_string(),
        Event::AlarmAcknowledged { was_active, .. } => {
            if *was_active {
                "Alarm acknowledged\n".to_string()
            } else {
                "No active alarm\n".to_string()
            }
        }
        Event::ThresholdChanged {
            requested_hours,
            applied_hours,
            ..
        } => {
            if requested_hours == applied_hours {
                format!("Threshold set to {applied_hours} hours\n")
            } else {
                format!("Invalid threshold, using {applied_hours} hours\n")
            }
        }
        Event::StateSnapshot { status, .. } => status_text(status),
    }
}
