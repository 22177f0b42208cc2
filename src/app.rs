//! Application wiring: catalog scan, listener startup, the command
//! dispatch loop and the orderly shutdown sequence.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Sender};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::terminal;
use tracing::info;

use crate::config::{Config, PlayerChannelConfig};
use crate::input::command::Command;
use crate::input::{gamepad, keyboard, midi, serial, touch};
use crate::model::TrackCatalog;
use crate::player::{PlayerChannel, PlayerSpawner, RemotePlayer};
use crate::status::{NullPublisher, StatusPublisher, UdpPublisher};
use crate::transport::store::PositionStore;
use crate::transport::Transport;

/// Spawns one remote-mode player process per enabled channel.
struct RemoteSpawner {
    samples: PlayerChannelConfig,
    click: PlayerChannelConfig,
    tx: Sender<Command>,
}

impl PlayerSpawner for RemoteSpawner {
    type Player = RemotePlayer;

    fn spawn(&mut self, channel: PlayerChannel, generation: u64) -> Result<Option<RemotePlayer>> {
        // The samples channel alone reports frames; it is the position
        // reference for save/restore and the progress display.
        let (config, report_frames) = match channel {
            PlayerChannel::Samples => (&self.samples, true),
            PlayerChannel::Click => (&self.click, false),
        };
        if !config.enabled {
            return Ok(None);
        }
        RemotePlayer::spawn(config, generation, self.tx.clone(), report_frames).map(Some)
    }
}

/// Run the console until a shutdown command arrives.
pub fn run(config: Config) -> Result<()> {
    let catalog = TrackCatalog::scan(
        &config.tracks_folder,
        config.samples.enabled,
        config.click.enabled,
    )?;
    info!("{} track(s) in the catalog", catalog.len());

    let publisher: Box<dyn StatusPublisher> = if config.status.enabled {
        Box::new(UdpPublisher::new(
            &config.status.host,
            config.status.port,
            &config.status.node,
        )?)
    } else {
        Box::new(NullPublisher)
    };

    let (tx, rx) = mpsc::channel();
    let running = Arc::new(AtomicBool::new(true));

    let spawner = RemoteSpawner {
        samples: config.samples.clone(),
        click: config.click.clone(),
        tx: tx.clone(),
    };
    let mut transport = Transport::new(
        catalog,
        config.tracks_folder.clone(),
        config.click.gain,
        config.samples.gain,
        spawner,
        PositionStore::new(config.savestate_file.clone()),
        publisher,
    );

    // Every enabled listener must come up or startup fails; a console
    // with a silently dead input source is worse than one that refuses
    // to start.
    if config.touchscreen.enabled {
        let device_path = touch::find_device(&config.touchscreen.device_name)?;
        touch::spawn(
            device_path,
            config.touchscreen.calibration,
            config.panel.clone(),
            tx.clone(),
            Arc::clone(&running),
        )
        .context("can't start touchscreen listener")?;
    }
    let midi_connection = if config.midi_input.enabled {
        Some(midi::connect(&config.midi_input, tx.clone())?)
    } else {
        None
    };
    if config.gamepad.enabled {
        gamepad::spawn(config.gamepad.clone(), tx.clone(), Arc::clone(&running))
            .context("can't start gamepad listener")?;
    }
    if config.serial.enabled {
        serial::spawn(config.serial.clone(), tx.clone(), Arc::clone(&running))
            .context("can't start serial listener")?;
    }
    keyboard::spawn(tx.clone(), Arc::clone(&running))
        .context("can't start keyboard listener")?;

    spawn_progress_ticker(
        Duration::from_millis(config.show_playing_progress_interval_ms),
        tx.clone(),
        Arc::clone(&running),
    );
    drop(tx);

    info!("console ready");
    for command in rx {
        if !transport.handle(command) {
            break;
        }
    }

    // Shutdown order: flag stops the listener loops, dropping the MIDI
    // connection closes its port, and raw mode release is a no-op when
    // it already happened.
    running.store(false, Ordering::Relaxed);
    drop(midi_connection);
    let _ = terminal::disable_raw_mode();
    info!("console stopped");
    Ok(())
}

fn spawn_progress_ticker(interval: Duration, tx: Sender<Command>, running: Arc<AtomicBool>) {
    thread::spawn(move || {
        while running.load(Ordering::Relaxed) {
            thread::sleep(interval);
            if tx.send(Command::ProgressTick).is_err() {
                return;
            }
        }
    });
}
