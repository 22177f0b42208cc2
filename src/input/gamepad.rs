//! Gamepad listener.
//!
//! One configured axis drives navigation with a dead zone and an optional
//! reversal flag; configured button ids map to select/stop/save/restore,
//! and releasing the show-progress button switches progress publishing off.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::{anyhow, bail, Result};
use gilrs::{Event, EventType, Gilrs};
use tracing::debug;

use crate::config::GamepadConfig;
use crate::input::command::Command;

/// Gamepad event reduced to the raw ids the bindings refer to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PadEvent {
    Axis { axis_id: u32, value: f32 },
    ButtonDown { button_id: u32 },
    ButtonUp { button_id: u32 },
}

fn normalize(event: &EventType) -> Option<PadEvent> {
    match *event {
        EventType::AxisChanged(_, value, code) => Some(PadEvent::Axis {
            axis_id: code.into_u32(),
            value,
        }),
        EventType::ButtonPressed(_, code) => Some(PadEvent::ButtonDown {
            button_id: code.into_u32(),
        }),
        EventType::ButtonReleased(_, code) => Some(PadEvent::ButtonUp {
            button_id: code.into_u32(),
        }),
        _ => None,
    }
}

/// Map a normalized gamepad event onto a transport command.
pub fn map_event(config: &GamepadConfig, event: PadEvent) -> Option<Command> {
    match event {
        PadEvent::Axis { axis_id, value } if axis_id == config.navigation_axis_id => {
            let effective = if config.reverse_navigation_axis {
                -value
            } else {
                value
            };
            if effective > config.axis_threshold {
                Some(Command::NavNext)
            } else if effective < -config.axis_threshold {
                Some(Command::NavPrev)
            } else {
                // Dead zone
                None
            }
        }
        PadEvent::ButtonDown { button_id } => {
            if button_id == config.play_button_id {
                Some(Command::Select)
            } else if button_id == config.stop_button_id {
                Some(Command::Stop)
            } else if button_id == config.save_state_button_id {
                Some(Command::SaveState)
            } else if button_id == config.restore_state_button_id {
                Some(Command::RestoreState)
            } else {
                None
            }
        }
        PadEvent::ButtonUp { button_id } if button_id == config.show_progress_button_id => {
            Some(Command::ShowProgress(false))
        }
        _ => None,
    }
}

/// Initialize gamepad support and start the event loop.
///
/// No gamepad present is fatal at startup when the source is enabled.
pub fn spawn(
    config: GamepadConfig,
    tx: Sender<Command>,
    running: Arc<AtomicBool>,
) -> Result<JoinHandle<()>> {
    let mut gilrs =
        Gilrs::new().map_err(|e| anyhow!("can't initialize gamepad support: {e}"))?;

    if gilrs.gamepads().next().is_none() {
        bail!("no gamepad detected");
    }
    for (id, gamepad) in gilrs.gamepads() {
        debug!("gamepad {}: {}", usize::from(id), gamepad.name());
    }

    let handle = thread::spawn(move || {
        while running.load(Ordering::Relaxed) {
            while let Some(Event { id, event, .. }) =
                gilrs.next_event_blocking(Some(Duration::from_millis(100)))
            {
                if usize::from(id) != config.device_id {
                    continue;
                }
                let Some(pad) = normalize(&event) else {
                    continue;
                };
                if let Some(command) = map_event(&config, pad) {
                    if tx.send(command).is_err() {
                        return;
                    }
                }
            }
        }
    });
    Ok(handle)
}
