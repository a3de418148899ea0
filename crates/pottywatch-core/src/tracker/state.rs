//! Tracker state and its key-value layout.
//!
//! Every field is persisted under its own key so that one corrupt value
//! never costs the others:
//!
//! | key            | value                         |
//! |----------------|-------------------------------|
//! | `lastPeeTime`  | RFC 3339 instant              |
//! | `lastPoopTime` | RFC 3339 instant              |
//! | `history`      | JSON array of strings         |
//! | `thresholdHours` | decimal string              |
//!
//! `alarm_active` is runtime-only and always hydrates as `false`.

use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::kind::{EventKind, HistoryEntry};

pub const HISTORY_KEY: &str = "history";
pub const THRESHOLD_KEY: &str = "thresholdHours";

/// Default alert threshold: 8 hours (480 minutes).
pub const DEFAULT_THRESHOLD_HOURS: f64 = 8.0;

/// Clamp a requested threshold to a valid one.
///
/// NaN, infinities and non-positive values all fall back to the default.
pub fn coerce_threshold(hours: f64) -> f64 {
    if hours.is_finite() && hours > 0.0 {
        hours
    } else {
        DEFAULT_THRESHOLD_HOURS
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackerState {
    pub last_pee: Option<DateTime<Utc>>,
    pub last_poop: Option<DateTime<Utc>>,
    /// Newest first.
    pub history: Vec<HistoryEntry>,
    pub threshold_hours: f64,
    #[serde(skip)]
    pub alarm_active: bool,
}

impl Default for TrackerState {
    fn default() -> Self {
        Self {
            last_pee: None,
            last_poop: None,
            history: Vec::new(),
            threshold_hours: DEFAULT_THRESHOLD_HOURS,
            alarm_active: false,
        }
    }
}

impl TrackerState {
    pub fn last(&self, kind: EventKind) -> Option<DateTime<Utc>> {
        match kind {
            EventKind::Pee => self.last_pee,
            EventKind::Poop => self.last_poop,
        }
    }

    pub(crate) fn set_last(&mut self, kind: EventKind, at: DateTime<Utc>) {
        match kind {
            EventKind::Pee => self.last_pee = Some(at),
            EventKind::Poop => self.last_poop = Some(at),
        }
    }

    /// Flatten into persisted key-value pairs. Unrecorded timestamps are omitted.
    pub fn to_kv(&self) -> BTreeMap<String, String> {
        let mut map = BTreeMap::new();
        for kind in EventKind::ALL {
            if let Some(at) = self.last(kind) {
                map.insert(kind.storage_key().to_string(), encode_timestamp(at));
            }
        }
        map.insert(HISTORY_KEY.to_string(), encode_history(&self.history));
        map.insert(THRESHOLD_KEY.to_string(), encode_threshold(self.threshold_hours));
        map
    }

    /// Rebuild from persisted key-value pairs with per-field fallback.
    pub fn from_kv(map: &BTreeMap<String, String>) -> Self {
        Self::from_lookup(|key| map.get(key).cloned())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let history = lookup(HISTORY_KEY)
            .map(|raw| decode_history(&raw))
            .unwrap_or_default();
        let threshold_hours = lookup(THRESHOLD_KEY)
            .map(|raw| decode_threshold(&raw))
            .unwrap_or(DEFAULT_THRESHOLD_HOURS);

        Self {
            last_pee: lookup(EventKind::Pee.storage_key())
                .and_then(|raw| decode_timestamp(EventKind::Pee, &raw)),
            last_poop: lookup(EventKind::Poop.storage_key())
                .and_then(|raw| decode_timestamp(EventKind::Poop, &raw)),
            history,
            threshold_hours,
            alarm_active: false,
        }
    }
}

pub(crate) fn encode_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

pub(crate) fn encode_history(history: &[HistoryEntry]) -> String {
    // Vec<String-like> always serializes.
    serde_json::to_string(history).unwrap_or_else(|_| "[]".to_string())
}

pub(crate) fn encode_threshold(hours: f64) -> String {
    hours.to_string()
}

/// RFC 3339 proper, or the signed extended-year form chrono writes outside
/// years 0000 to 9999 (e.g. `+10000-01-01T00:00:00Z`).
fn decode_timestamp(kind: EventKind, raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    let parsed = DateTime::parse_from_rfc3339(raw).or_else(|_| DateTime::parse_from_str(raw, "%+"));
    match parsed {
        Ok(at) => Some(at.with_timezone(&Utc)),
        Err(e) => {
            warn!(kind = %kind, value = raw, error = %e, "discarding unparsable timestamp");
            None
        }
    }
}

fn decode_history(raw: &str) -> Vec<HistoryEntry> {
    match serde_json::from_str::<Vec<HistoryEntry>>(raw) {
        Ok(history) => history,
        Err(e) => {
            warn!(error = %e, "history is not a JSON string array, starting empty");
            Vec::new()
        }
    }
}

fn decode_threshold(raw: &str) -> f64 {
    match raw.trim().parse::<f64>() {
        Ok(hours) => coerce_threshold(hours),
        Err(_) => {
            warn!(value = raw, "unparsable threshold, using default");
            DEFAULT_THRESHOLD_HOURS
        }
    }
}
