//! Raw touch event decoding.
//!
//! The touch device delivers fixed 16-byte records: an 8-byte timestamp
//! prefix (parsed but unused), a 16-bit *kind* at offset 8, a 16-bit
//! *subcode* at offset 10 and a 32-bit *value* at offset 12, all
//! little-endian. The decoder rescales absolute-axis samples into screen
//! coordinates and classifies contact markers into logical events.

use serde::{Deserialize, Serialize};

/// Fixed size of one raw input record in bytes.
pub const RECORD_SIZE: usize = 16;

/// Absolute-axis sample record kind.
const KIND_ABS_AXIS: u16 = 3;
/// Subcode for the X axis.
const SUBCODE_AXIS_X: u16 = 0;
/// Subcode for the Y axis.
const SUBCODE_AXIS_Y: u16 = 1;
/// Subcode for a pressure marker while the panel is held.
const SUBCODE_PRESSURE: u16 = 24;
/// Subcode for contact state; value 0 means the finger was released.
const SUBCODE_CONTACT: u16 = 330;

/// One record as read off the device, still in device units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawRecord {
    pub kind: u16,
    pub subcode: u16,
    pub value: u32,
}

impl RawRecord {
    /// Split a 16-byte record into its fields. The timestamp prefix is
    /// skipped.
    pub fn parse(buf: &[u8; RECORD_SIZE]) -> Self {
        Self {
            kind: u16::from_le_bytes([buf[8], buf[9]]),
            subcode: u16::from_le_bytes([buf[10], buf[11]]),
            value: u32::from_le_bytes([buf[12], buf[13], buf[14], buf[15]]),
        }
    }
}

/// A point in screen-resolution units, produced by calibration.
///
/// Deliberately a distinct type from the raw device values so geometry
/// code can never consume uncalibrated coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CalibratedPoint {
    pub x: i32,
    pub y: i32,
}

/// Logical touch events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchEvent {
    /// Finger released: a discrete tap at the last known position.
    Touch(CalibratedPoint),
    /// Finger still down: continuous pressure at the last known position.
    Pressure(CalibratedPoint),
}

/// Calibration bounds of the raw axes and the target screen resolution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Calibration {
    pub min_x: i32,
    pub max_x: i32,
    pub min_y: i32,
    pub max_y: i32,
    pub res_x: i32,
    pub res_y: i32,
}

impl Calibration {
    fn scale_x(&self, value: u32) -> i32 {
        let span = (self.max_x - self.min_x) as f64;
        ((value as f64 - self.min_x as f64) / span * self.res_x as f64).round() as i32
    }

    fn scale_y(&self, value: u32) -> i32 {
        let span = (self.max_y - self.min_y) as f64;
        ((value as f64 - self.min_y as f64) / span * self.res_y as f64).round() as i32
    }
}

/// Stateful decoder over the raw record stream.
///
/// Owns only the rolling last-known position; it resets to the origin on
/// reconnect. Records that match no recognized shape advance the stream
/// silently.
#[derive(Debug)]
pub struct RawInputDecoder {
    calibration: Calibration,
    position: CalibratedPoint,
}

impl RawInputDecoder {
    pub fn new(calibration: Calibration) -> Self {
        Self {
            calibration,
            position: CalibratedPoint::default(),
        }
    }

    /// Drop the rolling position, as after a device reconnect.
    pub fn reset(&mut self) {
        self.position = CalibratedPoint::default();
    }

    /// Decode one record; most records update internal state or are
    /// ignored, only contact markers yield an event.
    pub fn decode(&mut self, buf: &[u8; RECORD_SIZE]) -> Option<TouchEvent> {
        let record = RawRecord::parse(buf);

        if record.kind == KIND_ABS_AXIS && record.subcode == SUBCODE_AXIS_X && record.value > 0 {
            self.position.x = self.calibration.scale_x(record.value);
        }
        if record.kind == KIND_ABS_AXIS && record.subcode == SUBCODE_AXIS_Y && record.value > 0 {
            self.position.y = self.calibration.scale_y(record.value);
        }

        if record.subcode == SUBCODE_PRESSURE {
            return Some(TouchEvent::Pressure(self.position));
        }
        if record.subcode == SUBCODE_CONTACT && record.value == 0 {
            return Some(TouchEvent::Touch(self.position));
        }

        None
    }
}
