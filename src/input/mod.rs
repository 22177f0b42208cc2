//! Input listeners.
//!
//! Five independent sources (touchscreen, MIDI controller, gamepad,
//! terminal keyboard, serial knob box) each normalize their native events
//! into [`command::Command`] values and send them over one channel to the
//! transport dispatcher. No source mutates transport state directly.

pub mod command;
pub mod gamepad;
pub mod keyboard;
pub mod midi;
pub mod serial;
pub mod touch;

pub use command::{Command, GainChannel};
