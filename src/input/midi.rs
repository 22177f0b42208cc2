//! MIDI controller listener.
//!
//! Incoming messages are matched by exact `(status, data1, data2)` triple
//! against the four configured bindings. Messages arriving closer together
//! than the debounce threshold are controller chatter and are discarded
//! outright; that is a designed filter, not an error.

use std::sync::mpsc::Sender;

use anyhow::{anyhow, Result};
use midir::MidiInputConnection;
use tracing::{debug, trace};

use crate::config::{MidiBinding, MidiConfig};
use crate::input::command::Command;

/// Pure message matcher; kept separate from the port plumbing so the
/// binding and debounce logic is testable without hardware.
pub struct MidiMatcher {
    config: MidiConfig,
    debounce_us: u64,
    last_message_us: Option<u64>,
}

impl MidiMatcher {
    pub fn new(config: MidiConfig) -> Self {
        let debounce_us = config.debounce_ms * 1000;
        Self {
            config,
            debounce_us,
            last_message_us: None,
        }
    }

    /// Match one raw message against the configured bindings.
    ///
    /// `timestamp_us` is the device timestamp. Every message advances the
    /// debounce clock, matched or not, mirroring how chattering hardware
    /// behaves.
    pub fn match_message(&mut self, message: &[u8], timestamp_us: u64) -> Option<Command> {
        if message.len() < 2 {
            return None;
        }
        let triple = MidiBinding {
            status: message[0],
            data1: message[1],
            data2: message.get(2).copied().unwrap_or(0),
        };

        let within_debounce = self
            .last_message_us
            .is_some_and(|t| timestamp_us.saturating_sub(t) < self.debounce_us);
        self.last_message_us = Some(timestamp_us);
        if within_debounce {
            trace!("MIDI message within debounce window, discarded");
            return None;
        }

        if triple == self.config.nav_left {
            Some(Command::NavPrev)
        } else if triple == self.config.nav_right {
            Some(Command::NavNext)
        } else if triple == self.config.play {
            Some(Command::Select)
        } else if triple == self.config.stop {
            Some(Command::Stop)
        } else {
            None
        }
    }
}

/// Open the configured MIDI input port and forward matched commands.
///
/// The returned connection must be kept alive for the callback to run;
/// dropping it closes the port. A missing port is fatal at startup.
pub fn connect(config: &MidiConfig, tx: Sender<Command>) -> Result<MidiInputConnection<()>> {
    let midi_in = midir::MidiInput::new("trackstation")?;
    let ports = midi_in.ports();

    let mut names = Vec::with_capacity(ports.len());
    let mut target = None;
    for port in &ports {
        let name = midi_in
            .port_name(port)
            .unwrap_or_else(|_| "unknown".to_string());
        if name == config.port_name {
            target = Some(port.clone());
        }
        names.push(name);
    }
    debug!("{} MIDI input port(s) found: {names:?}", names.len());

    let port = target.ok_or_else(|| {
        anyhow!(
            "MIDI input port \"{}\" not found (available: {names:?})",
            config.port_name
        )
    })?;

    let mut matcher = MidiMatcher::new(config.clone());
    let connection = midi_in
        .connect(
            &port,
            "trackstation-input",
            move |timestamp_us, message, _| {
                if let Some(command) = matcher.match_message(message, timestamp_us) {
                    let _ = tx.send(command);
                }
            },
            (),
        )
        .map_err(|e| anyhow!("can't open MIDI input port \"{}\": {e}", config.port_name))?;

    Ok(connection)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> MidiConfig {
        MidiConfig {
            enabled: true,
            port_name: "nanoKONTROL".to_string(),
            debounce_ms: 100,
            nav_left: MidiBinding {
                status: 0x90,
                data1: 0x30,
                data2: 0x7F,
            },
            nav_right: MidiBinding {
                status: 0x90,
                data1: 0x31,
                data2: 0x7F,
            },
            play: MidiBinding {
                status: 0xB0,
                data1: 0x29,
                data2: 0x7F,
            },
            stop: MidiBinding {
                status: 0xB0,
                data1: 0x2A,
                data2: 0x7F,
            },
        }
    }

    #[test]
    fn bindings_match_exact_triples() {
        let mut m = MidiMatcher::new(config());
        assert_eq!(
            m.match_message(&[0x90, 0x30, 0x7F], 0),
            Some(Command::NavPrev)
        );
        assert_eq!(
            m.match_message(&[0x90, 0x31, 0x7F], 200_000),
            Some(Command::NavNext)
        );
        assert_eq!(
            m.match_message(&[0xB0, 0x29, 0x7F], 400_000),
            Some(Command::Select)
        );
        assert_eq!(
            m.match_message(&[0xB0, 0x2A, 0x7F], 600_000),
            Some(Command::Stop)
        );
    }

    #[test]
    fn near_miss_triples_do_not_match() {
        let mut m = MidiMatcher::new(config());
        // Same note, different velocity: no match.
        assert_eq!(m.match_message(&[0x90, 0x30, 0x40], 0), None);
        // Same velocity, different note: no match.
        assert_eq!(m.match_message(&[0x90, 0x32, 0x7F], 200_000), None);
    }

    #[test]
    fn chatter_within_debounce_window_is_discarded() {
        let mut m = MidiMatcher::new(config());
        assert_eq!(
            m.match_message(&[0x90, 0x30, 0x7F], 1_000_000),
            Some(Command::NavPrev)
        );
        // 50 ms later with a 100 ms threshold: at most one transition.
        assert_eq!(m.match_message(&[0x90, 0x30, 0x7F], 1_050_000), None);
    }

    #[test]
    fn unmatched_chatter_still_advances_the_debounce_clock() {
        let mut m = MidiMatcher::new(config());
        assert_eq!(m.match_message(&[0x80, 0x30, 0x00], 1_000_000), None);
        // A bound message 50 ms after unrelated chatter is still suppressed.
        assert_eq!(m.match_message(&[0x90, 0x30, 0x7F], 1_050_000), None);
        // And passes once the window has elapsed.
        assert_eq!(
            m.match_message(&[0x90, 0x30, 0x7F], 1_150_000),
            Some(Command::NavPrev)
        );
    }

    #[test]
    fn two_byte_messages_default_data2_to_zero() {
        let mut cfg = config();
        cfg.play = MidiBinding {
            status: 0xC0,
            data1: 0x05,
            data2: 0x00,
        };
        let mut m = MidiMatcher::new(cfg);
        assert_eq!(m.match_message(&[0xC0, 0x05], 0), Some(Command::Select));
    }

    #[test]
    fn truncated_messages_are_ignored() {
        let mut m = MidiMatcher::new(config());
        assert_eq!(m.match_message(&[0xF8], 0), None);
        assert_eq!(m.match_message(&[], 100), None);
    }

    #[test]
    fn first_message_always_passes_debounce() {
        let mut m = MidiMatcher::new(config());
        assert_eq!(
            m.match_message(&[0x90, 0x30, 0x7F], 5),
            Some(Command::NavPrev)
        );
    }
}
