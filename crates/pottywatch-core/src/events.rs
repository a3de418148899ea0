use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::tracker::{EventKind, HistoryEntry, TrackerStatus};

/// Every state change in the tracker produces an Event.
/// The presentation layer renders them; nothing else consumes them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    EventRecorded {
        kind: EventKind,
        entry: HistoryEntry,
        at: DateTime<Utc>,
    },
    /// The threshold was crossed on this tick.
    AlarmActivated {
        at: DateTime<Utc>,
    },
    /// The threshold is no longer exceeded.
    AlarmDeactivated {
        at: DateTime<Utc>,
    },
    /// The user silenced the alarm.
    AlarmAcknowledged {
        was_active: bool,
        at: DateTime<Utc>,
    },
    ThresholdChanged {
        requested_hours: f64,
        applied_hours: f64,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        status: TrackerStatus,
        at: DateTime<Utc>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn events_are_tagged_by_type() {
        let at = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let json = serde_json::to_value(Event::AlarmActivated { at }).unwrap();
        assert_eq!(json["type"], "AlarmActivated");
    }
}
