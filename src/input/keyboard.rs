//! Terminal keyboard listener.
//!
//! The console is operated over SSH during setup, so the keyboard mirrors
//! the transport: arrows navigate, space selects, `s` stops. Four letter
//! keys step the two gain levels, `a`/`z` nudge the progress slider and
//! Escape triggers the orderly shutdown sequence.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::terminal;
use tracing::warn;

use crate::input::command::{Command, GainChannel};

/// Map one key to a transport command. Fixed bindings.
pub fn map_key(code: KeyCode, modifiers: KeyModifiers) -> Option<Command> {
    if code == KeyCode::Char('c') && modifiers.contains(KeyModifiers::CONTROL) {
        return Some(Command::Shutdown);
    }
    match code {
        KeyCode::Left => Some(Command::NavPrev),
        KeyCode::Right => Some(Command::NavNext),
        KeyCode::Char(' ') => Some(Command::Select),
        KeyCode::Char('s') => Some(Command::Stop),
        KeyCode::Char('a') => Some(Command::SliderStep { delta: -1 }),
        KeyCode::Char('z') => Some(Command::SliderStep { delta: 1 }),
        KeyCode::Char('w') => Some(Command::KnobStep {
            channel: GainChannel::EarMonitoring,
            delta: -1,
        }),
        KeyCode::Char('x') => Some(Command::KnobStep {
            channel: GainChannel::EarMonitoring,
            delta: 1,
        }),
        KeyCode::Char('c') => Some(Command::KnobStep {
            channel: GainChannel::SamplesMix,
            delta: -1,
        }),
        KeyCode::Char('v') => Some(Command::KnobStep {
            channel: GainChannel::SamplesMix,
            delta: 1,
        }),
        KeyCode::Esc => Some(Command::Shutdown),
        _ => None,
    }
}

/// Put the terminal in raw mode and start reading keys.
///
/// The loop polls with a short timeout so it can observe the shutdown
/// flag; raw mode is released by the application shutdown sequence.
pub fn spawn(tx: Sender<Command>, running: Arc<AtomicBool>) -> Result<JoinHandle<()>> {
    terminal::enable_raw_mode()?;

    let handle = thread::spawn(move || {
        while running.load(Ordering::Relaxed) {
            match event::poll(Duration::from_millis(100)) {
                Ok(false) => continue,
                Ok(true) => {}
                Err(err) => {
                    warn!("keyboard poll failed: {err}");
                    return;
                }
            }
            let key = match event::read() {
                Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => key,
                Ok(_) => continue,
                Err(err) => {
                    warn!("keyboard read failed: {err}");
                    return;
                }
            };
            if let Some(command) = map_key(key.code, key.modifiers) {
                let is_shutdown = command == Command::Shutdown;
                if tx.send(command).is_err() || is_shutdown {
                    return;
                }
            }
        }
    });
    Ok(handle)
}
