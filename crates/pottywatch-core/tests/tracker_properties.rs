//! Property tests for the alarm predicate, threshold coercion and the
//! key-value round trip.

use chrono::{DateTime, Duration, TimeZone, Utc};
use pottywatch_core::{EventKind, HistoryEntry, MemoryStore, TrackerEngine, TrackerState};
use proptest::prelude::*;

fn base() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
}

fn instant() -> impl Strategy<Value = DateTime<Utc>> {
    (0i64..4_000_000_000, 0u32..1_000_000_000)
        .prop_map(|(secs, nanos)| Utc.timestamp_opt(secs, nanos).unwrap())
}

/// Spans negative years and years past 9999.
fn any_instant() -> impl Strategy<Value = DateTime<Utc>> {
    (-100_000_000_000i64..1_000_000_000_000, 0u32..1_000_000_000)
        .prop_map(|(secs, nanos)| Utc.timestamp_opt(secs, nanos).unwrap())
}

fn stale(elapsed_secs: Option<i64>, threshold_hours: f64) -> bool {
    match elapsed_secs {
        None => true,
        Some(secs) => (secs / 60) as f64 > threshold_hours * 60.0,
    }
}

proptest! {
    /// Due iff either kind's whole elapsed minutes exceed threshold * 60.
    #[test]
    fn predicate_matches_minute_comparison(
        threshold in 0.01f64..48.0,
        pee_secs in proptest::option::of(0i64..400_000),
        poop_secs in proptest::option::of(0i64..400_000),
    ) {
        let now = base();
        let mut engine = TrackerEngine::new(MemoryStore::new());
        prop_assert_eq!(engine.set_threshold(threshold), threshold);
        if let Some(secs) = pee_secs {
            engine.record_event(EventKind::Pee, now - Duration::seconds(secs));
        }
        if let Some(secs) = poop_secs {
            engine.record_event(EventKind::Poop, now - Duration::seconds(secs));
        }

        let expected = stale(pee_secs, threshold) || stale(poop_secs, threshold);
        prop_assert_eq!(engine.is_time_to_go_out(now), expected);
    }

    #[test]
    fn record_event_grows_history_by_one(
        kinds in proptest::collection::vec(prop_oneof![Just(EventKind::Pee), Just(EventKind::Poop)], 1..20),
        at in instant(),
    ) {
        let mut engine = TrackerEngine::new(MemoryStore::new());
        for (i, kind) in kinds.iter().enumerate() {
            let before: Vec<HistoryEntry> = engine.history().to_vec();
            let when = at + Duration::seconds(i as i64);
            let entry = engine.record_event(*kind, when);

            prop_assert_eq!(engine.state().last(*kind), Some(when));
            prop_assert_eq!(engine.history().len(), before.len() + 1);
            prop_assert_eq!(&engine.history()[0], &entry);
            prop_assert_eq!(&engine.history()[1..], &before[..]);
        }
    }

    #[test]
    fn invalid_threshold_always_defaults(hours in prop_oneof![
        Just(f64::NAN),
        Just(f64::NEG_INFINITY),
        Just(f64::INFINITY),
        -1.0e9f64..=0.0,
    ]) {
        let mut engine = TrackerEngine::new(MemoryStore::new());
        prop_assert_eq!(engine.set_threshold(hours), 8.0);
    }

    #[test]
    fn kv_round_trip(
        last_pee in proptest::option::of(any_instant()),
        last_poop in proptest::option::of(any_instant()),
        history in proptest::collection::vec("\\PC{0,40}", 0..8),
        threshold_hours in 0.001f64..1000.0,
    ) {
        let state = TrackerState {
            last_pee,
            last_poop,
            history: history.into_iter().map(HistoryEntry::from).collect(),
            threshold_hours,
            alarm_active: false,
        };
        prop_assert_eq!(TrackerState::from_kv(&state.to_kv()), state);
    }
}
