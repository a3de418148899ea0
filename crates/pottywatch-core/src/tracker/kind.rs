use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Local, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Human-readable timestamp layout used in history lines,
/// e.g. `Jan 5, 2025, 3:04:05 PM`.
const ENTRY_TIME_FORMAT: &str = "%b %-d, %Y, %-I:%M:%S %p";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Pee,
    Poop,
}

impl EventKind {
    pub const ALL: [EventKind; 2] = [EventKind::Pee, EventKind::Poop];

    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::Pee => "pee",
            EventKind::Poop => "poop",
        }
    }

    /// Store key holding the last occurrence of this kind.
    pub fn storage_key(self) -> &'static str {
        match self {
            EventKind::Pee => "lastPeeTime",
            EventKind::Poop => "lastPoopTime",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pee" => Ok(EventKind::Pee),
            "poop" => Ok(EventKind::Poop),
            other => Err(format!("unknown event kind: {other}")),
        }
    }
}

/// A single occurrence. Immutable once created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    pub kind: EventKind,
    pub occurred_at: DateTime<Utc>,
}

impl EventRecord {
    pub fn new(kind: EventKind, occurred_at: DateTime<Utc>) -> Self {
        Self { kind, occurred_at }
    }

    /// Render as a history line in the local timezone.
    pub fn to_entry(&self) -> HistoryEntry {
        self.to_entry_in(&Local)
    }

    /// Render as a history line in an explicit timezone.
    pub fn to_entry_in<Tz>(&self, tz: &Tz) -> HistoryEntry
    where
        Tz: TimeZone,
        Tz::Offset: fmt::Display,
    {
        HistoryEntry(format!(
            "{} - {}",
            format_instant_in(self.occurred_at, tz),
            self.kind
        ))
    }
}

/// Render an instant the way history lines do.
pub fn format_instant_in<Tz>(at: DateTime<Utc>, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    at.with_timezone(tz).format(ENTRY_TIME_FORMAT).to_string()
}

/// Pre-formatted `"<date> - <kind>"` line, stored newest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HistoryEntry(String);

impl HistoryEntry {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Kind suffix of the line, if it carries one.
    pub fn kind(&self) -> Option<EventKind> {
        self.0.rsplit_once(" - ").and_then(|(_, k)| k.parse().ok())
    }
}

impl From<String> for HistoryEntry {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for HistoryEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    #[test]
    fn parse_kind_is_case_insensitive() {
        assert_eq!("PEE".parse::<EventKind>().unwrap(), EventKind::Pee);
        assert_eq!(" poop ".parse::<EventKind>().unwrap(), EventKind::Poop);
        assert!("walk".parse::<EventKind>().is_err());
    }

    #[test]
    fn entry_uses_twelve_hour_clock() {
        let at = Utc.with_ymd_and_hms(2025, 1, 5, 15, 4, 5).unwrap();
        let entry = EventRecord::new(EventKind::Poop, at).to_entry_in(&Utc);
        assert_eq!(entry.as_str(), "Jan 5, 2025, 3:04:05 PM - poop");
        assert_eq!(entry.kind(), Some(EventKind::Poop));
    }

    #[test]
    fn entry_respects_timezone() {
        let at = Utc.with_ymd_and_hms(2025, 3, 1, 23, 30, 0).unwrap();
        let tz = FixedOffset::east_opt(2 * 3600).unwrap();
        let entry = EventRecord::new(EventKind::Pee, at).to_entry_in(&tz);
        assert_eq!(entry.as_str(), "Mar 2, 2025, 1:30:00 AM - pee");
    }

    #[test]
    fn storage_keys_match_persisted_layout() {
        assert_eq!(EventKind::Pee.storage_key(), "lastPeeTime");
        assert_eq!(EventKind::Poop.storage_key(), "lastPoopTime");
    }
}
