//! Touch panel geometry: button rectangles and knob annuli.
//!
//! All predicates work on calibrated (screen-space) coordinates; raw device
//! values never reach this module.

use serde::{Deserialize, Serialize};

use crate::input::command::GainChannel;
use crate::input::touch::decoder::CalibratedPoint;

/// Axis-aligned button rectangle, inclusive on all four edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Rect {
    pub fn contains(&self, p: CalibratedPoint) -> bool {
        p.x >= self.x && p.x <= self.x + self.w && p.y >= self.y && p.y <= self.y + self.h
    }
}

/// Circular knob region mapped to an angular arc.
///
/// A point belongs to the knob if its distance from the center lies within
/// `[min_radius, max_radius]`. Angles strictly inside
/// `(min_angle, max_angle)` map linearly to a 0..=100 percentage; the rest
/// of the circle is a dead zone.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KnobZone {
    pub center_x: i32,
    pub center_y: i32,
    pub min_radius: f64,
    pub max_radius: f64,
    pub min_angle: f64,
    pub max_angle: f64,
}

impl KnobZone {
    /// Angle of a point around the knob center, in degrees within [0, 360).
    ///
    /// Zero sits at the knob's six o'clock and grows clockwise (nine
    /// o'clock = 90, twelve = 180, three = 270), matching a volume pot
    /// whose sweep starts just right of straight down.
    pub fn angle_at(&self, p: CalibratedPoint) -> f64 {
        let dx = (p.x - self.center_x) as f64;
        let dy = (p.y - self.center_y) as f64;
        let mut deg = (-dy).atan2(-dx).to_degrees() + 90.0;
        if deg < 0.0 {
            deg += 360.0;
        }
        deg
    }

    /// Map a touch point to a knob percentage.
    ///
    /// Returns `None` when the point is outside the annulus or the angle
    /// falls in the dead zone outside `(min_angle, max_angle)`.
    pub fn percent_at(&self, p: CalibratedPoint) -> Option<u8> {
        let dx = (p.x - self.center_x) as f64;
        let dy = (p.y - self.center_y) as f64;
        let dist = (dx * dx + dy * dy).sqrt();
        if dist < self.min_radius || dist > self.max_radius {
            return None;
        }

        let angle = self.angle_at(p);
        if angle <= self.min_angle || angle >= self.max_angle {
            return None;
        }

        let percent = (angle - self.min_angle) / (self.max_angle - self.min_angle) * 100.0;
        Some(percent.round() as u8)
    }
}

/// Button identities on the touch panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonZone {
    Previous,
    PlayStop,
    Next,
}

/// Full panel layout: three transport buttons and two gain knobs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TouchLayout {
    pub previous: Rect,
    pub play_stop: Rect,
    pub next: Rect,
    pub ear_monitoring: KnobZone,
    pub samples_mix: KnobZone,
}

impl TouchLayout {
    /// Classify a point against the button rectangles.
    pub fn button_at(&self, p: CalibratedPoint) -> Option<ButtonZone> {
        if self.previous.contains(p) {
            Some(ButtonZone::Previous)
        } else if self.play_stop.contains(p) {
            Some(ButtonZone::PlayStop)
        } else if self.next.contains(p) {
            Some(ButtonZone::Next)
        } else {
            None
        }
    }

    /// Classify a point against both knob zones.
    ///
    /// Buttons and knobs are independent regions; callers evaluate both
    /// predicates for every point.
    pub fn knob_at(&self, p: CalibratedPoint) -> Option<(GainChannel, u8)> {
        if let Some(percent) = self.ear_monitoring.percent_at(p) {
            return Some((GainChannel::EarMonitoring, percent));
        }
        if let Some(percent) = self.samples_mix.percent_at(p) {
            return Some((GainChannel::SamplesMix, percent));
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pt(x: i32, y: i32) -> CalibratedPoint {
        CalibratedPoint { x, y }
    }

    fn knob() -> KnobZone {
        KnobZone {
            center_x: 800,
            center_y: 400,
            min_radius: 20.0,
            max_radius: 100.0,
            min_angle: 30.0,
            max_angle: 330.0,
        }
    }

    #[test]
    fn rect_contains_is_inclusive_on_edges() {
        let r = Rect {
            x: 10,
            y: 20,
            w: 100,
            h: 50,
        };
        // Corner and far-edge points count as inside.
        assert!(r.contains(pt(10, 70)));
        assert!(r.contains(pt(10, 20)));
        assert!(r.contains(pt(110, 70)));
        assert!(!r.contains(pt(9, 20)));
        assert!(!r.contains(pt(111, 20)));
        assert!(!r.contains(pt(10, 71)));
    }

    #[test]
    fn angle_convention_matches_the_panel_artwork() {
        let k = knob();
        // Six o'clock is the sweep origin.
        assert!(k.angle_at(pt(800, 450)).abs() < 1e-9);
        // Clockwise: nine o'clock = 90, twelve = 180, three = 270.
        assert!((k.angle_at(pt(750, 400)) - 90.0).abs() < 1e-9);
        assert!((k.angle_at(pt(800, 350)) - 180.0).abs() < 1e-9);
        assert!((k.angle_at(pt(850, 400)) - 270.0).abs() < 1e-9);
    }

    #[test]
    fn negative_angle_normalizes_into_0_360() {
        let k = knob();
        // Lower-right quadrant computes negative before normalization;
        // -30 must wrap to 330, never stay negative.
        let deg = k.angle_at(pt(800 + 25, 400 + 43));
        assert!((deg - 330.0).abs() < 0.5, "got {deg}");
    }

    #[test]
    fn percent_interpolates_linearly_over_the_arc() {
        let k = knob();
        // Twelve o'clock = 180 degrees = exactly mid-arc of (30, 330).
        assert_eq!(k.percent_at(pt(800, 350)), Some(50));
        // Nine o'clock = 90 degrees = (90 - 30) / 300 = 20 percent.
        assert_eq!(k.percent_at(pt(750, 400)), Some(20));
        // Three o'clock = 270 degrees = 80 percent.
        assert_eq!(k.percent_at(pt(850, 400)), Some(80));
    }

    #[test]
    fn dead_zone_outside_arc_produces_no_update() {
        let k = knob();
        // Six o'clock is 0 degrees, below min_angle: dead zone.
        assert_eq!(k.percent_at(pt(800, 450)), None);
    }

    #[test]
    fn points_outside_annulus_are_ignored() {
        let k = knob();
        assert_eq!(k.percent_at(pt(800, 355)), None); // inside min radius
        assert_eq!(k.percent_at(pt(800, 900)), None); // outside max radius
    }

    #[test]
    fn annulus_bounds_are_inclusive() {
        let k = knob();
        // Exactly on max_radius at twelve o'clock.
        assert_eq!(k.percent_at(pt(800, 300)), Some(50));
        // Exactly on min_radius at twelve o'clock.
        assert_eq!(k.percent_at(pt(800, 380)), Some(50));
    }

    fn layout() -> TouchLayout {
        TouchLayout {
            previous: Rect {
                x: 0,
                y: 0,
                w: 100,
                h: 100,
            },
            play_stop: Rect {
                x: 200,
                y: 0,
                w: 100,
                h: 100,
            },
            next: Rect {
                x: 400,
                y: 0,
                w: 100,
                h: 100,
            },
            ear_monitoring: knob(),
            samples_mix: KnobZone {
                center_x: 1200,
                ..knob()
            },
        }
    }

    #[test]
    fn buttons_classify_by_rectangle() {
        let l = layout();
        assert_eq!(l.button_at(pt(50, 50)), Some(ButtonZone::Previous));
        assert_eq!(l.button_at(pt(250, 50)), Some(ButtonZone::PlayStop));
        assert_eq!(l.button_at(pt(450, 50)), Some(ButtonZone::Next));
        assert_eq!(l.button_at(pt(150, 50)), None);
    }

    #[test]
    fn knobs_map_to_their_gain_channels() {
        let l = layout();
        assert_eq!(
            l.knob_at(pt(800, 350)),
            Some((GainChannel::EarMonitoring, 50))
        );
        assert_eq!(
            l.knob_at(pt(1200, 350)),
            Some((GainChannel::SamplesMix, 50))
        );
        assert_eq!(l.knob_at(pt(50, 50)), None);
    }
}
