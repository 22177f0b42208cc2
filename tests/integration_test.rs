//! Integration tests for trackstation.
//!
//! Drives the transport through its public API with in-memory player and
//! publisher doubles, and runs the touch pipeline from raw device bytes
//! to transport commands.

use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use anyhow::Result;

use trackstation::input::command::{Command, GainChannel};
use trackstation::input::touch::decoder::{Calibration, RawInputDecoder};
use trackstation::input::touch::{self, geometry::KnobZone, geometry::Rect, geometry::TouchLayout};
use trackstation::model::{FrameInfo, TrackCatalog};
use trackstation::player::{PlayerBackend, PlayerChannel, PlayerSpawner};
use trackstation::status::StatusPublisher;
use trackstation::transport::store::PositionStore;
use trackstation::transport::Transport;

type CallLog = Rc<RefCell<Vec<String>>>;

struct FakePlayer {
    channel: &'static str,
    log: CallLog,
}

impl FakePlayer {
    fn record(&self, call: String) {
        self.log.borrow_mut().push(format!("{}:{call}", self.channel));
    }
}

impl PlayerBackend for FakePlayer {
    fn load(&mut self, path: &Path) -> Result<()> {
        self.record(format!("load {}", path.display()));
        Ok(())
    }
    fn play(&mut self) -> Result<()> {
        self.record("play".to_string());
        Ok(())
    }
    fn pause(&mut self) -> Result<()> {
        self.record("pause".to_string());
        Ok(())
    }
    fn stop(&mut self) -> Result<()> {
        self.record("stop".to_string());
        Ok(())
    }
    fn seek(&mut self, frame: u64) -> Result<()> {
        self.record(format!("seek {frame}"));
        Ok(())
    }
    fn set_gain(&mut self, percent: u8) -> Result<()> {
        self.record(format!("gain {percent}"));
        Ok(())
    }
    fn quit(&mut self) -> Result<()> {
        self.record("quit".to_string());
        Ok(())
    }
}

struct FakeSpawner {
    log: CallLog,
}

impl PlayerSpawner for FakeSpawner {
    type Player = FakePlayer;

    fn spawn(&mut self, channel: PlayerChannel, _generation: u64) -> Result<Option<FakePlayer>> {
        let channel = match channel {
            PlayerChannel::Samples => "samples",
            PlayerChannel::Click => "click",
        };
        Ok(Some(FakePlayer {
            channel,
            log: Rc::clone(&self.log),
        }))
    }
}

struct RecordingPublisher {
    events: Rc<RefCell<Vec<(String, String)>>>,
}

impl StatusPublisher for RecordingPublisher {
    fn publish(&self, path: &str, value: &str) {
        self.events
            .borrow_mut()
            .push((path.to_string(), value.to_string()));
    }
}

const TRACK_JSON: &str = r#"{
    "title": "Set Opener",
    "samples_file": "samples.mp3",
    "click_file": "click.mp3",
    "midi_file": "lights.mid"
}"#;

fn write_track(dir: &Path, folder: &str) {
    let track_dir = dir.join(folder);
    std::fs::create_dir(&track_dir).unwrap();
    std::fs::write(track_dir.join("track.json"), TRACK_JSON).unwrap();
    std::fs::write(track_dir.join("samples.mp3"), b"mp3").unwrap();
    std::fs::write(track_dir.join("click.mp3"), b"mp3").unwrap();
}

fn console(
    tracks_dir: &Path,
    state_file: PathBuf,
) -> (
    Transport<FakeSpawner, RecordingPublisher>,
    CallLog,
    Rc<RefCell<Vec<(String, String)>>>,
) {
    let calls: CallLog = Rc::new(RefCell::new(Vec::new()));
    let events = Rc::new(RefCell::new(Vec::new()));
    let catalog = TrackCatalog::scan(tracks_dir, true, true).unwrap();
    let transport = Transport::new(
        catalog,
        tracks_dir.to_path_buf(),
        80,
        70,
        FakeSpawner {
            log: Rc::clone(&calls),
        },
        PositionStore::new(state_file),
        RecordingPublisher {
            events: Rc::clone(&events),
        },
    );
    (transport, calls, events)
}

/// A full set flow: scan the tracks folder, navigate, play, adjust a
/// knob, save mid-track, stop, and restore to the saved frame.
#[test]
fn test_full_set_flow_with_save_and_restore() {
    let dir = tempfile::tempdir().unwrap();
    write_track(dir.path(), "01_opener");
    write_track(dir.path(), "02_anthem");
    let (mut transport, calls, _events) =
        console(dir.path(), dir.path().join("savestat.json"));

    transport.handle(Command::NavNext);
    transport.handle(Command::Select);
    assert_eq!(transport.playing_index(), Some(1));

    transport.handle(Command::KnobSet {
        channel: GainChannel::EarMonitoring,
        percent: 55,
    });
    assert!(calls.borrow().contains(&"click:gain 55".to_string()));

    let generation = transport.generation();
    transport.handle(Command::PlayerFrame {
        generation,
        info: FrameInfo {
            current_frame: 1500,
            frames_remaining: 500,
            current_time: 90.0,
            time_remaining: 30.0,
        },
    });
    transport.handle(Command::SaveState);
    transport.handle(Command::Stop);
    assert_eq!(transport.playing_index(), None);

    calls.borrow_mut().clear();
    transport.handle(Command::RestoreState);
    assert_eq!(transport.playing_index(), Some(1));
    let calls = calls.borrow();
    assert!(calls.contains(&"samples:seek 1500".to_string()));
    assert!(calls
        .iter()
        .any(|c| c.starts_with("samples:load") && c.contains("02_anthem")));
}

/// The status display mirrors the track count, navigation cursor and
/// play/stop button through a set.
#[test]
fn test_status_display_mirrors_transport() {
    let dir = tempfile::tempdir().unwrap();
    write_track(dir.path(), "01_opener");
    write_track(dir.path(), "02_anthem");
    write_track(dir.path(), "03_encore");
    let (mut transport, _calls, events) =
        console(dir.path(), dir.path().join("savestat.json"));

    let last = |events: &Rc<RefCell<Vec<(String, String)>>>, path: &str| {
        events
            .borrow()
            .iter()
            .rev()
            .find(|(p, _)| p == path)
            .map(|(_, v)| v.clone())
    };

    assert_eq!(last(&events, "infos/tracks/count").as_deref(), Some("03"));
    assert_eq!(
        last(&events, "buttons/play_stop/value").as_deref(),
        Some("play")
    );

    transport.handle(Command::NavNext);
    assert_eq!(
        last(&events, "infos/navigation_track/num").as_deref(),
        Some("02")
    );

    transport.handle(Command::Select);
    assert_eq!(
        last(&events, "infos/playing_track/num").as_deref(),
        Some("02")
    );
    assert_eq!(
        last(&events, "buttons/play_stop/value").as_deref(),
        Some("stop")
    );

    transport.handle(Command::Stop);
    assert_eq!(
        last(&events, "infos/playing_track/num").as_deref(),
        Some("00")
    );
    assert_eq!(
        last(&events, "buttons/play_stop/value").as_deref(),
        Some("play")
    );
}

/// Raw 16-byte device records decode, calibrate and map onto transport
/// commands through the panel layout.
#[test]
fn test_touch_pipeline_from_raw_bytes_to_commands() {
    let calibration = Calibration {
        min_x: 150,
        max_x: 3950,
        min_y: 150,
        max_y: 3950,
        res_x: 1600,
        res_y: 900,
    };
    let layout = TouchLayout {
        previous: Rect {
            x: 0,
            y: 0,
            w: 200,
            h: 200,
        },
        play_stop: Rect {
            x: 700,
            y: 0,
            w: 200,
            h: 200,
        },
        next: Rect {
            x: 1400,
            y: 0,
            w: 200,
            h: 200,
        },
        ear_monitoring: KnobZone {
            center_x: 400,
            center_y: 600,
            min_radius: 10.0,
            max_radius: 120.0,
            min_angle: 30.0,
            max_angle: 330.0,
        },
        samples_mix: KnobZone {
            center_x: 1200,
            center_y: 600,
            min_radius: 10.0,
            max_radius: 120.0,
            min_angle: 30.0,
            max_angle: 330.0,
        },
    };

    let record = |subcode: u16, value: u32| {
        let mut bytes = [0u8; 16];
        bytes[8..10].copy_from_slice(&3u16.to_le_bytes());
        bytes[10..12].copy_from_slice(&subcode.to_le_bytes());
        bytes[12..16].copy_from_slice(&value.to_le_bytes());
        bytes
    };
    let contact = |value: u32| {
        let mut bytes = [0u8; 16];
        bytes[8..10].copy_from_slice(&1u16.to_le_bytes());
        bytes[10..12].copy_from_slice(&330u16.to_le_bytes());
        bytes[12..16].copy_from_slice(&value.to_le_bytes());
        bytes
    };

    let mut decoder = RawInputDecoder::new(calibration);
    let mut commands = Vec::new();

    // Press in the middle of the play/stop button: raw 2000 maps to
    // calibrated 779 on both axes.
    assert!(decoder.decode(&record(0, 2000)).is_none());
    assert!(decoder.decode(&record(1, 350)).is_none());
    if let Some(event) = decoder.decode(&contact(0)) {
        commands.extend(touch::commands_for(&layout, event));
    }
    assert_eq!(commands, vec![Command::TogglePlay]);
}
