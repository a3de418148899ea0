//! # PottyWatch Core Library
//!
//! This library provides the core logic for PottyWatch, a reminder that
//! tracks when the dog last peed and pooped and raises an alarm once either
//! has been too long ago. All operations are available through the
//! standalone CLI, which is a thin presentation layer over this crate.
//!
//! ## Architecture
//!
//! - **Tracker Engine**: a state container evaluated against an explicit
//!   instant; the caller drives it with periodic ticks
//! - **Storage**: SQLite key-value persistence and TOML configuration
//! - **Monitor**: a tokio actor that owns the engine, the alert device and
//!   the 60-second ticker
//!
//! ## Key Components
//!
//! - [`TrackerEngine`]: event tracking and threshold alarm
//! - [`Database`]: key-value persistence
//! - [`Config`]: application configuration management
//! - [`Monitor`]: periodic evaluation and alert playback

pub mod alert;
pub mod clock;
pub mod error;
pub mod events;
pub mod monitor;
pub mod storage;
pub mod tracker;

pub use alert::{alert_from_config, AlertSink, BellAlert, CommandAlert, MultiAlert, SilentAlert};
pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{AlertError, ConfigError, CoreError, StoreError};
pub use events::Event;
pub use monitor::{Monitor, MonitorCommand, MonitorHandle, DEFAULT_TICK_INTERVAL};
pub use storage::{Config, Database, KvStore, MemoryStore};
pub use tracker::{
    format_instant_in, AckPolicy, AlarmTransition, EventKind, EventRecord, HistoryEntry, TrackerEngine,
    TrackerState, TrackerStatus, DEFAULT_THRESHOLD_HOURS,
};
