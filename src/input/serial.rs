//! Serial knob listener.
//!
//! The knob box streams line-oriented `KEY=VALUE` records; two fixed keys
//! each set one gain level absolutely. Anything else on the line is noise
//! from the microcontroller and is skipped.

use std::io::{self, Read};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::warn;

use crate::config::SerialConfig;
use crate::input::command::{Command, GainChannel};

/// Parse one `KEY=VALUE` line into a knob command.
pub fn parse_line(line: &str, config: &SerialConfig) -> Option<Command> {
    let (key, value) = line.trim().split_once('=')?;
    let channel = if key == config.ear_monitoring_key {
        GainChannel::EarMonitoring
    } else if key == config.samples_mix_key {
        GainChannel::SamplesMix
    } else {
        return None;
    };
    let percent = value.trim().parse::<i64>().ok()?.clamp(0, 100) as u8;
    Some(Command::KnobSet { channel, percent })
}

/// Open the serial port and start the line reader.
///
/// Reads are accumulated into a line buffer because the port delivers
/// arbitrary chunks; read timeouts just give the loop a chance to check
/// the shutdown flag.
pub fn spawn(
    config: SerialConfig,
    tx: Sender<Command>,
    running: Arc<AtomicBool>,
) -> Result<JoinHandle<()>> {
    let mut port = serialport::new(&config.port_path, config.baud_rate)
        .timeout(Duration::from_millis(100))
        .open()
        .with_context(|| format!("can't open serial port {}", config.port_path))?;

    let handle = thread::spawn(move || {
        let mut pending = String::new();
        let mut buf = [0u8; 256];
        while running.load(Ordering::Relaxed) {
            match port.read(&mut buf) {
                Ok(0) => {}
                Ok(n) => {
                    pending.push_str(&String::from_utf8_lossy(&buf[..n]));
                    while let Some(pos) = pending.find('\n') {
                        let line: String = pending.drain(..=pos).collect();
                        if let Some(command) = parse_line(&line, &config) {
                            if tx.send(command).is_err() {
                                return;
                            }
                        }
                    }
                }
                Err(err) if err.kind() == io::ErrorKind::TimedOut => {}
                Err(err) => {
                    if running.load(Ordering::Relaxed) {
                        warn!("serial port read failed: {err}");
                    }
                    return;
                }
            }
        }
    });
    Ok(handle)
}
