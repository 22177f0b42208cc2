//! External audio player control.
//!
//! Audio decoding stays outside the core: each playback channel is an
//! mpg123-compatible process driven in remote mode over stdin. A reader
//! thread parses the process's status lines and feeds frame/end events
//! back through the command channel, tagged with the playback generation
//! so reports from a torn-down player can never affect a newer one.

use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use std::process::{Child, ChildStdin, Command as ProcessCommand, Stdio};
use std::sync::mpsc::Sender;
use std::thread;

use anyhow::{Context, Result};
use tracing::{debug, warn};

use crate::config::PlayerChannelConfig;
use crate::input::command::Command;
use crate::model::FrameInfo;

/// Playback channels driven by the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerChannel {
    /// Backing samples for the front mix.
    Samples,
    /// Click track for the performer's ears.
    Click,
}

/// Transport-facing contract of one player instance.
///
/// All verbs are non-blocking requests; completion is observed through
/// the asynchronous frame/end events.
pub trait PlayerBackend {
    fn load(&mut self, path: &Path) -> Result<()>;
    fn play(&mut self) -> Result<()>;
    fn pause(&mut self) -> Result<()>;
    fn stop(&mut self) -> Result<()>;
    fn seek(&mut self, frame: u64) -> Result<()>;
    fn set_gain(&mut self, percent: u8) -> Result<()>;
    fn quit(&mut self) -> Result<()>;
}

/// Creates player instances for a playback generation.
///
/// A disabled channel yields `Ok(None)`; playback simply proceeds
/// without it.
pub trait PlayerSpawner {
    type Player: PlayerBackend;

    fn spawn(&mut self, channel: PlayerChannel, generation: u64)
        -> Result<Option<Self::Player>>;
}

/// Event parsed from a player status line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlayerEvent {
    Frame(FrameInfo),
    Ended,
}

/// Parse one remote-mode status line.
///
/// `@F <frame> <frames-remaining> <seconds> <seconds-remaining>` reports
/// playback position; `@P 0` reports that playback stopped. Everything
/// else is chatter from the process and is ignored.
pub fn parse_status_line(line: &str) -> Option<PlayerEvent> {
    let line = line.trim();
    if let Some(rest) = line.strip_prefix("@F ") {
        let mut fields = rest.split_whitespace();
        let current_frame = fields.next()?.parse().ok()?;
        let frames_remaining = fields.next()?.parse().ok()?;
        let current_time = fields.next()?.parse().ok()?;
        let time_remaining = fields.next()?.parse().ok()?;
        return Some(PlayerEvent::Frame(FrameInfo {
            current_frame,
            frames_remaining,
            current_time,
            time_remaining,
        }));
    }
    if line == "@P 0" {
        return Some(PlayerEvent::Ended);
    }
    None
}

/// One mpg123-compatible child process in remote mode.
pub struct RemotePlayer {
    child: Child,
    stdin: ChildStdin,
    paused: bool,
}

impl RemotePlayer {
    /// Spawn the player process and its status reader thread.
    ///
    /// `report_frames` is set for the samples channel only: it is the
    /// single source of truth for playback position.
    pub fn spawn(
        config: &PlayerChannelConfig,
        generation: u64,
        tx: Sender<Command>,
        report_frames: bool,
    ) -> Result<Self> {
        let mut child = ProcessCommand::new(&config.command)
            .arg("-R")
            .args(["-o", "alsa", "-a", &config.device])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .with_context(|| format!("can't spawn player process \"{}\"", config.command))?;

        let stdin = child
            .stdin
            .take()
            .context("player process has no stdin pipe")?;
        let stdout = child
            .stdout
            .take()
            .context("player process has no stdout pipe")?;

        thread::spawn(move || {
            let reader = BufReader::new(stdout);
            for line in reader.lines() {
                let line = match line {
                    Ok(line) => line,
                    Err(_) => break,
                };
                match parse_status_line(&line) {
                    Some(PlayerEvent::Frame(info)) if report_frames => {
                        if tx.send(Command::PlayerFrame { generation, info }).is_err() {
                            break;
                        }
                    }
                    Some(PlayerEvent::Ended) => {
                        if tx.send(Command::PlayerEnded { generation }).is_err() {
                            break;
                        }
                    }
                    _ => {}
                }
            }
            debug!("player status reader finished (generation {generation})");
        });

        Ok(Self {
            child,
            stdin,
            paused: false,
        })
    }

    fn send(&mut self, command: &str) -> Result<()> {
        writeln!(self.stdin, "{command}").context("can't write to player process")?;
        Ok(())
    }
}

impl PlayerBackend for RemotePlayer {
    /// Load a file paused so both channels can be started in sync.
    fn load(&mut self, path: &Path) -> Result<()> {
        self.send(&format!("LOADPAUSED {}", path.display()))?;
        self.paused = true;
        Ok(())
    }

    fn play(&mut self) -> Result<()> {
        // Remote mode only has a pause toggle.
        if self.paused {
            self.send("PAUSE")?;
            self.paused = false;
        }
        Ok(())
    }

    fn pause(&mut self) -> Result<()> {
        if !self.paused {
            self.send("PAUSE")?;
            self.paused = true;
        }
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        self.send("STOP")
    }

    fn seek(&mut self, frame: u64) -> Result<()> {
        self.send(&format!("JUMP {frame}"))
    }

    fn set_gain(&mut self, percent: u8) -> Result<()> {
        self.send(&format!("VOLUME {percent}"))
    }

    fn quit(&mut self) -> Result<()> {
        // The process may already be gone; releasing twice is a no-op.
        // Kill before reaping: quit runs on the dispatcher thread, and a
        // wedged process that ignores QUIT must not stall it behind an
        // unbounded wait.
        let _ = self.send("QUIT");
        let _ = self.child.kill();
        if let Err(err) = self.child.wait() {
            warn!("player process wait failed: {err}");
        }
        Ok(())
    }
}

impl Drop for RemotePlayer {
    fn drop(&mut self) {
        let _ = self.send("QUIT");
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}
