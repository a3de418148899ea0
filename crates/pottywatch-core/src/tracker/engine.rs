//! Tracker engine implementation.
//!
//! The engine holds the last occurrence of each event kind, the alert
//! threshold and the history log. It owns no timer and no audio device: the
//! caller evaluates it against a reference instant, typically once a minute.
//!
//! ## Alarm states
//!
//! ```text
//! Inactive --(threshold exceeded)--> Active
//! Active   --(acknowledge)---------> Inactive
//! Active   --(threshold cleared)---> Inactive
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = TrackerEngine::new(MemoryStore::new());
//! engine.record_event(EventKind::Pee, Utc::now());
//! // On every tick:
//! let transition = engine.evaluate_and_transition_alarm(Utc::now());
//! ```

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::alarm::{AckPolicy, AlarmTransition};
use super::kind::{EventKind, EventRecord, HistoryEntry};
use super::state::{
    coerce_threshold, encode_history, encode_threshold, encode_timestamp, TrackerState,
    HISTORY_KEY, THRESHOLD_KEY,
};
use crate::storage::KvStore;

/// Point-in-time view for rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackerStatus {
    pub last_pee: Option<DateTime<Utc>>,
    pub last_poop: Option<DateTime<Utc>>,
    /// Whole minutes since the last pee; `None` when never recorded.
    pub minutes_since_pee: Option<i64>,
    pub minutes_since_poop: Option<i64>,
    pub threshold_hours: f64,
    /// Threshold currently exceeded.
    pub due: bool,
    pub alarm_active: bool,
    pub history_len: usize,
}

/// Event tracker and threshold alarm.
///
/// Every mutation is written through to the store. Write failures are
/// logged and otherwise ignored.
pub struct TrackerEngine<S> {
    store: S,
    state: TrackerState,
    ack_policy: AckPolicy,
    /// Set by an acknowledgement under [`AckPolicy::UntilRecorded`].
    suppressed: bool,
}

impl<S: KvStore> TrackerEngine<S> {
    /// Create an engine hydrated from `store`.
    ///
    /// Starts with the alarm inactive regardless of the stored timestamps.
    pub fn new(store: S) -> Self {
        let state = load_state(&store);
        debug!(
            history_len = state.history.len(),
            threshold_hours = state.threshold_hours,
            "tracker hydrated"
        );
        Self {
            store,
            state,
            ack_policy: AckPolicy::default(),
            suppressed: false,
        }
    }

    pub fn with_ack_policy(mut self, policy: AckPolicy) -> Self {
        self.ack_policy = policy;
        self
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> &TrackerState {
        &self.state
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.state.history
    }

    pub fn threshold_hours(&self) -> f64 {
        self.state.threshold_hours
    }

    pub fn alarm_active(&self) -> bool {
        self.state.alarm_active
    }

    pub fn ack_policy(&self) -> AckPolicy {
        self.ack_policy
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Whole minutes from `timestamp` to `now`, truncated toward zero.
    ///
    /// An unrecorded timestamp is infinitely far in the past.
    pub fn minutes_since(timestamp: Option<DateTime<Utc>>, now: DateTime<Utc>) -> f64 {
        match timestamp {
            None => f64::INFINITY,
            Some(ts) => (now - ts).num_minutes() as f64,
        }
    }

    /// True iff either kind has gone longer than the threshold.
    ///
    /// The threshold is kept in hours and compared in minutes.
    pub fn is_time_to_go_out(&self, now: DateTime<Utc>) -> bool {
        let threshold_minutes = self.state.threshold_hours * 60.0;
        Self::minutes_since(self.state.last_pee, now) > threshold_minutes
            || Self::minutes_since(self.state.last_poop, now) > threshold_minutes
    }

    pub fn status(&self, now: DateTime<Utc>) -> TrackerStatus {
        let since = |ts: Option<DateTime<Utc>>| ts.map(|ts| (now - ts).num_minutes());
        TrackerStatus {
            last_pee: self.state.last_pee,
            last_poop: self.state.last_poop,
            minutes_since_pee: since(self.state.last_pee),
            minutes_since_poop: since(self.state.last_poop),
            threshold_hours: self.state.threshold_hours,
            due: self.is_time_to_go_out(now),
            alarm_active: self.state.alarm_active,
            history_len: self.state.history.len(),
        }
    }

    /// Persisted form of the current state.
    pub fn serialize(&self) -> BTreeMap<String, String> {
        self.state.to_kv()
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Record an occurrence of `kind` at `at`. Always succeeds.
    pub fn record_event(&mut self, kind: EventKind, at: DateTime<Utc>) -> HistoryEntry {
        let entry = EventRecord::new(kind, at).to_entry();
        self.state.set_last(kind, at);
        self.state.history.insert(0, entry.clone());
        self.suppressed = false;

        self.persist(kind.storage_key(), &encode_timestamp(at));
        self.persist(HISTORY_KEY, &encode_history(&self.state.history));

        info!(kind = %kind, at = %at, "event recorded");
        entry
    }

    /// Re-evaluate the alarm against `now`.
    ///
    /// Only the tick that flips the state reports an edge, so the caller
    /// can start playback once instead of on every tick.
    pub fn evaluate_and_transition_alarm(&mut self, now: DateTime<Utc>) -> AlarmTransition {
        let due = self.is_time_to_go_out(now) && !self.suppressed;
        match (due, self.state.alarm_active) {
            (true, false) => {
                self.state.alarm_active = true;
                info!(threshold_hours = self.state.threshold_hours, "alarm activated");
                AlarmTransition::activated()
            }
            (false, true) => {
                self.state.alarm_active = false;
                info!("alarm deactivated");
                AlarmTransition::deactivated()
            }
            (_, active) => AlarmTransition::steady(active),
        }
    }

    /// Silence the alarm unconditionally.
    ///
    /// Under [`AckPolicy::Rearm`] the next evaluation raises it again if the
    /// threshold is still exceeded. Under [`AckPolicy::UntilRecorded`] only
    /// an active alarm is suppressed; an idle acknowledge changes nothing.
    pub fn acknowledge(&mut self) {
        let was_active = self.state.alarm_active;
        if was_active {
            info!(policy = ?self.ack_policy, "alarm acknowledged");
        }
        self.state.alarm_active = false;
        if was_active && self.ack_policy == AckPolicy::UntilRecorded {
            self.suppressed = true;
        }
    }

    /// Apply a new threshold in hours and return the value actually used.
    pub fn set_threshold(&mut self, hours: f64) -> f64 {
        let applied = coerce_threshold(hours);
        if applied != hours {
            debug!(requested = hours, applied, "threshold coerced to default");
        }
        self.state.threshold_hours = applied;
        self.persist(THRESHOLD_KEY, &encode_threshold(applied));
        applied
    }

    /// Replace the in-memory state with a persisted mapping.
    ///
    /// The alarm comes back inactive.
    pub fn hydrate(&mut self, map: &BTreeMap<String, String>) {
        self.state = TrackerState::from_kv(map);
        self.suppressed = false;
    }

    /// Re-read everything from the backing store.
    pub fn reload(&mut self) {
        self.state = load_state(&self.store);
        self.suppressed = false;
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn persist(&mut self, key: &str, value: &str) {
        if let Err(e) = self.store.set(key, value) {
            warn!(key, error = %e, "failed to persist tracker field");
        }
    }
}

fn load_state<S: KvStore>(store: &S) -> TrackerState {
    TrackerState::from_lookup(|key| match store.get(key) {
        Ok(value) => value,
        Err(e) => {
            warn!(key, error = %e, "failed to read tracker field");
            None
        }
    })
}
