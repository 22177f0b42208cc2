//! Touchscreen input: device discovery, blocking read loop and mapping of
//! decoded events onto transport commands.

pub mod decoder;
pub mod geometry;

use std::fs::{self, File};
use std::io::Read;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use anyhow::{bail, Context, Result};
use tracing::{debug, warn};

use crate::input::command::Command;
use decoder::{Calibration, RawInputDecoder, TouchEvent, RECORD_SIZE};
use geometry::{ButtonZone, TouchLayout};

const DEVICE_REGISTRY: &str = "/proc/bus/input/devices";

/// Find the event file for a named device in the kernel input registry.
///
/// The registry lists one block per device, blank-line separated; the
/// matching block's handler list names the `eventN` node.
pub fn resolve_device_path(registry: &str, device_name: &str) -> Option<PathBuf> {
    let needle = format!("Name=\"{device_name}\"");
    for block in registry.split("\n\n") {
        if !block.contains(&needle) {
            continue;
        }
        for word in block.split_whitespace() {
            if let Some(num) = word.strip_prefix("event") {
                if !num.is_empty() && num.bytes().all(|b| b.is_ascii_digit()) {
                    return Some(PathBuf::from(format!("/dev/input/{word}")));
                }
            }
        }
    }
    None
}

/// Locate the touch device by its configured name. One-time setup; a
/// missing device is fatal at startup.
pub fn find_device(device_name: &str) -> Result<PathBuf> {
    let registry = fs::read_to_string(DEVICE_REGISTRY)
        .with_context(|| format!("can't read {DEVICE_REGISTRY}"))?;
    match resolve_device_path(&registry, device_name) {
        Some(path) if path.exists() => {
            debug!("touch device \"{device_name}\" found at {}", path.display());
            Ok(path)
        }
        Some(path) => bail!("touch device event file {} doesn't exist", path.display()),
        None => bail!("can't find touch device named \"{device_name}\""),
    }
}

/// Map one decoded touch event onto transport commands.
///
/// A discrete touch is tested against the buttons and both knobs; a
/// pressure event only drives the knobs. A single point may hit a button
/// and a knob at once.
pub fn commands_for(layout: &TouchLayout, event: TouchEvent) -> Vec<Command> {
    let mut commands = Vec::with_capacity(2);
    let point = match event {
        TouchEvent::Touch(p) => {
            match layout.button_at(p) {
                Some(ButtonZone::Previous) => commands.push(Command::NavPrev),
                Some(ButtonZone::PlayStop) => commands.push(Command::TogglePlay),
                Some(ButtonZone::Next) => commands.push(Command::NavNext),
                None => {}
            }
            p
        }
        TouchEvent::Pressure(p) => p,
    };
    if let Some((channel, percent)) = layout.knob_at(point) {
        commands.push(Command::KnobSet { channel, percent });
    }
    commands
}

/// Open the touch device and start its blocking read loop.
///
/// The loop runs until the shutdown flag drops or the device read fails;
/// decode-level problems never unwind past this listener.
pub fn spawn(
    device_path: PathBuf,
    calibration: Calibration,
    layout: TouchLayout,
    tx: Sender<Command>,
    running: Arc<AtomicBool>,
) -> Result<JoinHandle<()>> {
    let mut file = File::open(&device_path)
        .with_context(|| format!("can't open touch device {}", device_path.display()))?;

    let handle = thread::spawn(move || {
        let mut decoder = RawInputDecoder::new(calibration);
        let mut buf = [0u8; RECORD_SIZE];
        while running.load(Ordering::Relaxed) {
            match file.read_exact(&mut buf) {
                Ok(()) => {
                    if let Some(event) = decoder.decode(&buf) {
                        for command in commands_for(&layout, event) {
                            if tx.send(command).is_err() {
                                return;
                            }
                        }
                    }
                }
                Err(err) => {
                    if running.load(Ordering::Relaxed) {
                        warn!("touch device read failed: {err}");
                    }
                    return;
                }
            }
        }
    });
    Ok(handle)
}
