//! Periodic alarm monitor.
//!
//! The monitor is the single actor that owns the tracker engine, the alert
//! sink and the clock. It re-evaluates the alarm on a fixed interval (60 s by
//! default) and applies user commands in between ticks, so state is never
//! mutated concurrently.
//!
//! ```ignore
//! let (tx, mut events) = mpsc::unbounded_channel();
//! let monitor = Monitor::new(engine, alert, SystemClock, tx);
//! let handle = monitor.spawn(Duration::from_secs(60));
//! handle.record(EventKind::Pee)?;
//! handle.shutdown().await;
//! ```
//!
//! Dropping the [`MonitorHandle`] aborts the task; the alert sink is silenced
//! when the monitor itself is dropped, whichever way that happens.

use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::alert::AlertSink;
use crate::clock::Clock;
use crate::error::{CoreError, Result};
use crate::events::Event;
use crate::storage::KvStore;
use crate::tracker::{AlarmTransition, EventKind, HistoryEntry, TrackerEngine, TrackerStatus};

/// Default evaluation cadence.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(60);

/// User actions forwarded to a running monitor.
#[derive(Debug)]
pub enum MonitorCommand {
    Record(EventKind),
    Acknowledge,
    SetThreshold(f64),
    /// Evaluate now instead of waiting for the next tick.
    Tick,
    Status(oneshot::Sender<TrackerStatus>),
}

pub struct Monitor<S: KvStore, C: Clock> {
    engine: TrackerEngine<S>,
    alert: Box<dyn AlertSink>,
    clock: C,
    events: mpsc::UnboundedSender<Event>,
}

impl<S: KvStore, C: Clock> Monitor<S, C> {
    pub fn new(
        engine: TrackerEngine<S>,
        alert: Box<dyn AlertSink>,
        clock: C,
        events: mpsc::UnboundedSender<Event>,
    ) -> Self {
        Self {
            engine,
            alert,
            clock,
            events,
        }
    }

    pub fn engine(&self) -> &TrackerEngine<S> {
        &self.engine
    }

    pub fn alert(&self) -> &dyn AlertSink {
        self.alert.as_ref()
    }

    /// Evaluate the alarm and drive the alert sink on edges only.
    pub fn tick(&mut self) -> AlarmTransition {
        let now = self.clock.now();
        let transition = self.engine.evaluate_and_transition_alarm(now);

        if transition.just_activated {
            // Playback failures never keep the alarm from showing.
            if let Err(e) = self.alert.play_loop() {
                warn!(error = %e, "alert playback failed");
            }
            self.emit(Event::AlarmActivated { at: now });
        } else if transition.just_deactivated {
            self.silence();
            self.emit(Event::AlarmDeactivated { at: now });
        }
        transition
    }

    pub fn record(&mut self, kind: EventKind) -> HistoryEntry {
        let at = self.clock.now();
        let entry = self.engine.record_event(kind, at);
        self.emit(Event::EventRecorded {
            kind,
            entry: entry.clone(),
            at,
        });
        self.tick();
        entry
    }

    pub fn acknowledge(&mut self) {
        let was_active = self.engine.alarm_active();
        self.engine.acknowledge();
        self.silence();
        self.emit(Event::AlarmAcknowledged {
            was_active,
            at: self.clock.now(),
        });
    }

    pub fn set_threshold(&mut self, hours: f64) -> f64 {
        let applied = self.engine.set_threshold(hours);
        self.emit(Event::ThresholdChanged {
            requested_hours: hours,
            applied_hours: applied,
            at: self.clock.now(),
        });
        self.tick();
        applied
    }

    pub fn status(&self) -> TrackerStatus {
        self.engine.status(self.clock.now())
    }

    pub fn snapshot(&self) -> Event {
        let at = self.clock.now();
        Event::StateSnapshot {
            status: self.engine.status(at),
            at,
        }
    }

    fn apply(&mut self, command: MonitorCommand) {
        debug!(?command, "monitor command");
        match command {
            MonitorCommand::Record(kind) => {
                self.record(kind);
            }
            MonitorCommand::Acknowledge => self.acknowledge(),
            MonitorCommand::SetThreshold(hours) => {
                self.set_threshold(hours);
            }
            MonitorCommand::Tick => {
                self.tick();
            }
            MonitorCommand::Status(reply) => {
                // Requester may have given up.
                let _ = reply.send(self.status());
            }
        }
    }

    fn silence(&mut self) {
        if let Err(e) = self.alert.pause() {
            warn!(error = %e, "failed to pause alert");
        }
        if let Err(e) = self.alert.reset_position() {
            warn!(error = %e, "failed to rewind alert");
        }
    }

    fn emit(&self, event: Event) {
        if self.events.send(event).is_err() {
            debug!("no event subscriber");
        }
    }
}

impl<S, C> Monitor<S, C>
where
    S: KvStore + 'static,
    C: Clock + 'static,
{
    /// Move the monitor onto a tokio task ticking every `period`.
    ///
    /// The first evaluation happens immediately.
    pub fn spawn(self, period: Duration) -> MonitorHandle {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let task = tokio::spawn(self.run(period, cmd_rx, shutdown_rx));
        MonitorHandle {
            commands: cmd_tx,
            shutdown: Some(shutdown_tx),
            task: Some(task),
        }
    }

    async fn run(
        mut self,
        period: Duration,
        mut commands: mpsc::UnboundedReceiver<MonitorCommand>,
        mut shutdown: oneshot::Receiver<()>,
    ) {
        info!(period_secs = period.as_secs_f64(), "monitor started");
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                _ = interval.tick() => {
                    self.tick();
                }
                command = commands.recv() => match command {
                    Some(command) => self.apply(command),
                    None => break,
                },
            }
        }
        info!("monitor stopped");
    }
}

impl<S: KvStore, C: Clock> Drop for Monitor<S, C> {
    fn drop(&mut self) {
        if self.alert.is_playing() {
            self.silence();
        }
    }
}

/// Owner of a spawned monitor task.
///
/// Dropping the handle aborts the task.
pub struct MonitorHandle {
    commands: mpsc::UnboundedSender<MonitorCommand>,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl MonitorHandle {
    pub fn send(&self, command: MonitorCommand) -> Result<()> {
        self.commands
            .send(command)
            .map_err(|_| CoreError::MonitorStopped)
    }

    pub fn record(&self, kind: EventKind) -> Result<()> {
        self.send(MonitorCommand::Record(kind))
    }

    pub fn acknowledge(&self) -> Result<()> {
        self.send(MonitorCommand::Acknowledge)
    }

    pub fn set_threshold(&self, hours: f64) -> Result<()> {
        self.send(MonitorCommand::SetThreshold(hours))
    }

    pub fn tick(&self) -> Result<()> {
        self.send(MonitorCommand::Tick)
    }

    pub async fn status(&self) -> Result<TrackerStatus> {
        let (tx, rx) = oneshot::channel();
        self.send(MonitorCommand::Status(tx))?;
        rx.await.map_err(|_| CoreError::MonitorStopped)
    }

    /// Stop the task after it finishes the command in hand.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!(error = %e, "monitor task ended abnormally");
            }
        }
    }
}

impl Drop for MonitorHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::error::AlertError;
    use crate::storage::MemoryStore;
    use chrono::{TimeZone, Utc};
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct RecordingAlert {
        calls: Arc<Mutex<Vec<&'static str>>>,
        playing: Arc<Mutex<bool>>,
        fail_play: bool,
    }

    impl RecordingAlert {
        fn calls(&self) -> Vec<&'static str> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl AlertSink for RecordingAlert {
        fn play_loop(&mut self) -> Result<(), AlertError> {
            self.calls.lock().unwrap().push("play");
            if self.fail_play {
                return Err(AlertError::NoCommand);
            }
            *self.playing.lock().unwrap() = true;
            Ok(())
        }
        fn pause(&mut self) -> Result<(), AlertError> {
            self.calls.lock().unwrap().push("pause");
            *self.playing.lock().unwrap() = false;
            Ok(())
        }
        fn reset_position(&mut self) -> Result<(), AlertError> {
            self.calls.lock().unwrap().push("reset");
            Ok(())
        }
        fn is_playing(&self) -> bool {
            *self.playing.lock().unwrap()
        }
    }

    fn setup(
        alert: RecordingAlert,
    ) -> (
        Monitor<MemoryStore, FixedClock>,
        FixedClock,
        mpsc::UnboundedReceiver<Event>,
    ) {
        let clock = FixedClock::new(Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap());
        let (tx, rx) = mpsc::unbounded_channel();
        let engine = TrackerEngine::new(MemoryStore::new());
        let monitor = Monitor::new(engine, Box::new(alert), clock.clone(), tx);
        (monitor, clock, rx)
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<Event>) -> Vec<Event> {
        let mut out = Vec::new();
        while let Ok(event) = rx.try_recv() {
            out.push(event);
        }
        out
    }

    #[test]
    fn playback_starts_only_on_activation_edge() {
        let alert = RecordingAlert::default();
        let (mut monitor, clock, mut rx) = setup(alert.clone());

        assert!(monitor.tick().just_activated);
        clock.advance(chrono::Duration::minutes(1));
        assert!(!monitor.tick().just_activated);

        assert_eq!(alert.calls(), vec!["play"]);
        let events = drain(&mut rx);
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], Event::AlarmActivated { .. }));
    }

    #[test]
    fn recording_both_kinds_deactivates_and_silences() {
        let alert = RecordingAlert::default();
        let (mut monitor, _clock, mut rx) = setup(alert.clone());
        monitor.tick();

        monitor.record(EventKind::Pee);
        assert!(monitor.engine().alarm_active());
        monitor.record(EventKind::Poop);
        assert!(!monitor.engine().alarm_active());

        assert_eq!(alert.calls(), vec!["play", "pause", "reset"]);
        let events = drain(&mut rx);
        assert!(matches!(events.last(), Some(Event::AlarmDeactivated { .. })));
    }

    #[test]
    fn acknowledge_silences_then_rearms() {
        let alert = RecordingAlert::default();
        let (mut monitor, clock, mut rx) = setup(alert.clone());
        monitor.tick();
        monitor.acknowledge();
        assert!(!monitor.engine().alarm_active());
        assert!(!alert.is_playing());

        clock.advance(chrono::Duration::minutes(1));
        assert!(monitor.tick().just_activated);
        assert_eq!(alert.calls(), vec!["play", "pause", "reset", "play"]);

        let events = drain(&mut rx);
        assert!(events.iter().any(|e| matches!(
            e,
            Event::AlarmAcknowledged {
                was_active: true,
                ..
            }
        )));
    }

    #[test]
    fn playback_failure_still_activates() {
        let alert = RecordingAlert {
            fail_play: true,
            ..RecordingAlert::default()
        };
        let (mut monitor, _clock, _rx) = setup(alert);
        assert!(monitor.tick().alarm_active);
        assert!(monitor.engine().alarm_active());
    }

    #[test]
    fn threshold_change_reports_applied_value() {
        let (mut monitor, _clock, mut rx) = setup(RecordingAlert::default());
        assert_eq!(monitor.set_threshold(-2.0), 8.0);
        let events = drain(&mut rx);
        assert!(matches!(
            events[0],
            Event::ThresholdChanged {
                applied_hours,
                ..
            } if applied_hours == 8.0
        ));
    }

    #[test]
    fn dropping_monitor_stops_playback() {
        let alert = RecordingAlert::default();
        let (mut monitor, _clock, _rx) = setup(alert.clone());
        monitor.tick();
        assert!(alert.is_playing());
        drop(monitor);
        assert!(!alert.is_playing());
    }

    #[tokio::test(start_paused = true)]
    async fn spawned_monitor_ticks_and_shuts_down() {
        let alert = RecordingAlert::default();
        let (monitor, clock, mut rx) = setup(alert.clone());
        let handle = monitor.spawn(DEFAULT_TICK_INTERVAL);

        handle.record(EventKind::Pee).unwrap();
        handle.record(EventKind::Poop).unwrap();
        handle.set_threshold(1.0).unwrap();
        let status = handle.status().await.unwrap();
        assert!(!status.alarm_active);
        assert_eq!(status.history_len, 2);

        clock.advance(chrono::Duration::minutes(61));
        // Sleep past the next tick so the monitor evaluates first.
        tokio::time::sleep(DEFAULT_TICK_INTERVAL + Duration::from_secs(1)).await;
        let status = handle.status().await.unwrap();
        assert!(status.alarm_active);

        handle.shutdown().await;
        assert!(!alert.is_playing());
        assert!(drain(&mut rx)
            .iter()
            .any(|e| matches!(e, Event::AlarmActivated { .. })));
    }

    #[tokio::test]
    async fn dropped_handle_aborts_task() {
        let (monitor, _clock, _rx) = setup(RecordingAlert::default());
        let handle = monitor.spawn(DEFAULT_TICK_INTERVAL);
        let commands = handle.commands.clone();
        drop(handle);
        tokio::task::yield_now().await;
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(commands.is_closed());
    }
}
