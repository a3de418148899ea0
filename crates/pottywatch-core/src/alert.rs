//! Alert output devices.
//!
//! The monitor owns exactly one [`AlertSink`] for its whole lifetime and only
//! calls `play_loop` on the inactive-to-active edge. Sinks still treat a
//! second `play_loop` while playing as a no-op.

use std::io::Write;
use std::process::{Child, Command, Stdio};

use tracing::{debug, warn};

use crate::error::AlertError;
use crate::storage::AlarmConfig;

pub const ALERT_BANNER: &str = "Time to let the dog out!";

pub trait AlertSink: Send {
    /// Start looping playback. No-op when already playing.
    fn play_loop(&mut self) -> Result<(), AlertError>;
    fn pause(&mut self) -> Result<(), AlertError>;
    /// Rewind so the next `play_loop` starts from the beginning.
    fn reset_position(&mut self) -> Result<(), AlertError>;
    fn is_playing(&self) -> bool;
}

/// Discards everything.
#[derive(Debug, Default)]
pub struct SilentAlert {
    playing: bool,
}

impl AlertSink for SilentAlert {
    fn play_loop(&mut self) -> Result<(), AlertError> {
        self.playing = true;
        Ok(())
    }

    fn pause(&mut self) -> Result<(), AlertError> {
        self.playing = false;
        Ok(())
    }

    fn reset_position(&mut self) -> Result<(), AlertError> {
        Ok(())
    }

    fn is_playing(&self) -> bool {
        self.playing
    }
}

/// Terminal bell plus a banner line.
pub struct BellAlert<W> {
    out: W,
    playing: bool,
}

impl BellAlert<std::io::Stderr> {
    pub fn stderr() -> Self {
        Self::new(std::io::stderr())
    }
}

impl<W: Write + Send> BellAlert<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            playing: false,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write + Send> AlertSink for BellAlert<W> {
    fn play_loop(&mut self) -> Result<(), AlertError> {
        if self.playing {
            return Ok(());
        }
        writeln!(self.out, "\x07{ALERT_BANNER}")?;
        self.out.flush()?;
        self.playing = true;
        Ok(())
    }

    fn pause(&mut self) -> Result<(), AlertError> {
        self.playing = false;
        Ok(())
    }

    fn reset_position(&mut self) -> Result<(), AlertError> {
        Ok(())
    }

    fn is_playing(&self) -> bool {
        self.playing
    }
}

/// External player process, e.g. `mpv --loop alarm.mp3`.
///
/// Looping is the player's job; pausing kills the process, so the next
/// start always plays from the top.
pub struct CommandAlert {
    program: String,
    args: Vec<String>,
    child: Option<Child>,
}

impl CommandAlert {
    pub fn new(command: &[String]) -> Result<Self, AlertError> {
        let (program, args) = command.split_first().ok_or(AlertError::NoCommand)?;
        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
            child: None,
        })
    }

    fn running(&mut self) -> bool {
        match self.child.as_mut().map(Child::try_wait) {
            Some(Ok(None)) => true,
            Some(Ok(Some(status))) => {
                debug!(program = %self.program, %status, "player exited");
                self.child = None;
                false
            }
            Some(Err(e)) => {
                warn!(program = %self.program, error = %e, "cannot poll player");
                self.child = None;
                false
            }
            None => false,
        }
    }
}

impl AlertSink for CommandAlert {
    fn play_loop(&mut self) -> Result<(), AlertError> {
        if self.running() {
            return Ok(());
        }
        let child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| AlertError::SpawnFailed {
                program: self.program.clone(),
                source,
            })?;
        debug!(program = %self.program, pid = child.id(), "player started");
        self.child = Some(child);
        Ok(())
    }

    /// Kill the player without blocking the caller, which may be the
    /// monitor's async task. A child that has not exited yet is reaped on
    /// a helper thread.
    fn pause(&mut self) -> Result<(), AlertError> {
        let Some(mut child) = self.child.take() else {
            return Ok(());
        };
        // Already exited is fine.
        let _ = child.kill();
        if child.try_wait()?.is_none() {
            let program = self.program.clone();
            std::thread::spawn(move || {
                if let Err(e) = child.wait() {
                    warn!(program = %program, error = %e, "failed to reap player");
                }
            });
        }
        Ok(())
    }

    fn reset_position(&mut self) -> Result<(), AlertError> {
        Ok(())
    }

    fn is_playing(&self) -> bool {
        self.child.is_some()
    }
}

impl Drop for CommandAlert {
    fn drop(&mut self) {
        if let Err(e) = self.pause() {
            warn!(program = %self.program, error = %e, "failed to stop player");
        }
    }
}

/// Fans every call out to several sinks.
///
/// All sinks are driven even when one fails; the first error is returned.
#[derive(Default)]
pub struct MultiAlert {
    sinks: Vec<Box<dyn AlertSink>>,
}

impl MultiAlert {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, sink: Box<dyn AlertSink>) {
        self.sinks.push(sink);
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    fn each<F>(&mut self, mut f: F) -> Result<(), AlertError>
    where
        F: FnMut(&mut dyn AlertSink) -> Result<(), AlertError>,
    {
        let mut first_err = None;
        for sink in &mut self.sinks {
            if let Err(e) = f(sink.as_mut()) {
                first_err.get_or_insert(e);
            }
        }
        first_err.map_or(Ok(()), Err)
    }
}

impl AlertSink for MultiAlert {
    fn play_loop(&mut self) -> Result<(), AlertError> {
        self.each(|s| s.play_loop())
    }

    fn pause(&mut self) -> Result<(), AlertError> {
        self.each(|s| s.pause())
    }

    fn reset_position(&mut self) -> Result<(), AlertError> {
        self.each(|s| s.reset_position())
    }

    fn is_playing(&self) -> bool {
        self.sinks.iter().any(|s| s.is_playing())
    }
}

/// Build the sink described by the alarm config.
pub fn alert_from_config(config: &AlarmConfig) -> Box<dyn AlertSink> {
    let mut multi = MultiAlert::new();
    if config.bell {
        multi.push(Box::new(BellAlert::stderr()));
    }
    if !config.sound_command.is_empty() {
        match CommandAlert::new(&config.sound_command) {
            Ok(cmd) => multi.push(Box::new(cmd)),
            Err(e) => warn!(error = %e, "ignoring sound command"),
        }
    }
    if multi.is_empty() {
        Box::new(SilentAlert::default())
    } else {
        Box::new(multi)
    }
}
