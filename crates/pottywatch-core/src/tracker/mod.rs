mod alarm;
mod engine;
mod kind;
mod state;

pub use alarm::{AckPolicy, AlarmTransition};
pub use engine::{TrackerEngine, TrackerStatus};
pub use kind::{format_instant_in, EventKind, EventRecord, HistoryEntry};
pub use state::{coerce_threshold, TrackerState, DEFAULT_THRESHOLD_HOURS};
