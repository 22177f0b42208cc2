use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::input::touch::decoder::Calibration;
use crate::input::touch::geometry::{KnobZone, Rect, TouchLayout};

/// Root configuration, read from `configuration.json`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub tracks_folder: PathBuf,
    pub savestate_file: PathBuf,
    pub show_playing_progress_interval_ms: u64,
    pub status: StatusConfig,
    pub samples: PlayerChannelConfig,
    pub click: PlayerChannelConfig,
    pub touchscreen: TouchscreenConfig,
    /// Button rectangles and knob zones of the touch panel.
    pub panel: TouchLayout,
    pub midi_input: MidiConfig,
    pub gamepad: GamepadConfig,
    pub serial: SerialConfig,
}

/// UDP status display target.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StatusConfig {
    pub enabled: bool,
    pub host: String,
    pub port: u16,
    /// Path prefix expected by the display node.
    pub node: String,
}

/// One external player channel (samples or click).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PlayerChannelConfig {
    pub enabled: bool,
    /// Player binary driven in remote mode.
    pub command: String,
    /// ALSA output device name.
    pub device: String,
    /// Initial gain percentage.
    pub gain: u8,
}

/// Touch device identity and axis calibration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TouchscreenConfig {
    pub enabled: bool,
    /// Device name as listed in the kernel input registry.
    pub device_name: String,
    #[serde(flatten)]
    pub calibration: Calibration,
}

/// Exact MIDI message bound to one logical command.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct MidiBinding {
    pub status: u8,
    pub data1: u8,
    pub data2: u8,
}

/// MIDI controller port and command bindings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MidiConfig {
    pub enabled: bool,
    pub port_name: String,
    /// Messages closer together than this are controller chatter and are
    /// discarded.
    pub debounce_ms: u64,
    pub nav_left: MidiBinding,
    pub nav_right: MidiBinding,
    pub play: MidiBinding,
    pub stop: MidiBinding,
}

/// Gamepad device, axis and button bindings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GamepadConfig {
    pub enabled: bool,
    pub device_id: usize,
    pub navigation_axis_id: u32,
    pub reverse_navigation_axis: bool,
    pub axis_threshold: f32,
    pub play_button_id: u32,
    pub stop_button_id: u32,
    pub save_state_button_id: u32,
    pub restore_state_button_id: u32,
    pub show_progress_button_id: u32,
}

/// Serial link to the analog knob box.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SerialConfig {
    pub enabled: bool,
    pub port_path: String,
    pub baud_rate: u32,
    /// Line key carrying the ear-monitoring level.
    pub ear_monitoring_key: String,
    /// Line key carrying the samples-mix level.
    pub samples_mix_key: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tracks_folder: PathBuf::from("tracks"),
            savestate_file: PathBuf::from("savestat.json"),
            show_playing_progress_interval_ms: 500,
            status: StatusConfig::default(),
            samples: PlayerChannelConfig::default(),
            click: PlayerChannelConfig {
                device: "hw:1,0".to_string(),
                ..PlayerChannelConfig::default()
            },
            touchscreen: TouchscreenConfig::default(),
            panel: default_panel(),
            midi_input: MidiConfig::default(),
            gamepad: GamepadConfig::default(),
            serial: SerialConfig::default(),
        }
    }
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            host: "127.0.0.1".to_string(),
            port: 4444,
            node: "info-beamer-ui-node".to_string(),
        }
    }
}

impl Default for PlayerChannelConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            command: "mpg123".to_string(),
            device: "hw:0,0".to_string(),
            gain: 80,
        }
    }
}

impl Default for TouchscreenConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            device_name: "eGalax Inc. USB TouchController".to_string(),
            calibration: Calibration {
                min_x: 150,
                max_x: 3950,
                min_y: 150,
                max_y: 3950,
                res_x: 1600,
                res_y: 900,
            },
        }
    }
}

impl Default for MidiConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            port_name: String::new(),
            debounce_ms: 100,
            nav_left: MidiBinding::default(),
            nav_right: MidiBinding::default(),
            play: MidiBinding::default(),
            stop: MidiBinding::default(),
        }
    }
}

impl Default for GamepadConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            device_id: 0,
            navigation_axis_id: 0,
            reverse_navigation_axis: false,
            axis_threshold: 0.1,
            play_button_id: 0,
            stop_button_id: 1,
            save_state_button_id: 2,
            restore_state_button_id: 3,
            show_progress_button_id: 4,
        }
    }
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            port_path: "/dev/ttyUSB0".to_string(),
            baud_rate: 9600,
            ear_monitoring_key: "A2".to_string(),
            samples_mix_key: "A1".to_string(),
        }
    }
}

fn default_panel() -> TouchLayout {
    TouchLayout {
        previous: Rect {
            x: 40,
            y: 700,
            w: 300,
            h: 160,
        },
        play_stop: Rect {
            x: 650,
            y: 700,
            w: 300,
            h: 160,
        },
        next: Rect {
            x: 1260,
            y: 700,
            w: 300,
            h: 160,
        },
        ear_monitoring: KnobZone {
            center_x: 400,
            center_y: 300,
            min_radius: 40.0,
            max_radius: 140.0,
            min_angle: 30.0,
            max_angle: 330.0,
        },
        samples_mix: KnobZone {
            center_x: 1200,
            center_y: 300,
            min_radius: 40.0,
            max_radius: 140.0,
            min_angle: 30.0,
            max_angle: 330.0,
        },
    }
}

impl Config {
    /// Load configuration from a file. A missing or unparseable file is
    /// fatal: the console must not start on guessed settings.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("can't read configuration file {}", path.display()))?;
        let config = serde_json::from_str(&content)
            .with_context(|| format!("can't parse configuration file {}", path.display()))?;
        Ok(config)
    }

    /// Write the configuration back out (used to seed a fresh install).
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path.as_ref(), content)?;
        Ok(())
    }
}
