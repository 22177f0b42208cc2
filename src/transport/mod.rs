//! Transport state machine.
//!
//! The single consumer of the command channel. Owns the navigation
//! cursor, the playing state, the gain levels and the pending seek
//! target; every transition runs to completion before the next command
//! is taken, so no two transitions ever interleave.

pub mod store;

use std::path::PathBuf;

use tracing::{debug, info, warn};

use crate::input::command::{Command, GainChannel};
use crate::model::{format_mmss, FrameInfo, TrackCatalog};
use crate::player::{PlayerBackend, PlayerChannel, PlayerSpawner};
use crate::status::StatusPublisher;
use crate::transport::store::{PositionStore, SavedPlaybackState};

pub struct Transport<S: PlayerSpawner, P: StatusPublisher> {
    catalog: TrackCatalog,
    tracks_dir: PathBuf,
    nav_index: usize,
    playing_index: Option<usize>,
    /// Click-track level in the performer's ears.
    ear_monitoring: u8,
    /// Backing samples level in the front mix.
    samples_mix: u8,
    slider_percent: u8,
    /// Frame to seek to before the next playback starts (armed by restore).
    pending_seek: Option<u64>,
    show_progress: bool,
    frame: FrameInfo,
    /// Bumped on every player teardown; events from older generations
    /// are stale and ignored.
    generation: u64,
    samples: Option<S::Player>,
    click: Option<S::Player>,
    spawner: S,
    store: PositionStore,
    publisher: P,
}

impl<S: PlayerSpawner, P: StatusPublisher> Transport<S, P> {
    pub fn new(
        catalog: TrackCatalog,
        tracks_dir: PathBuf,
        ear_monitoring: u8,
        samples_mix: u8,
        spawner: S,
        store: PositionStore,
        publisher: P,
    ) -> Self {
        let transport = Self {
            catalog,
            tracks_dir,
            nav_index: 0,
            playing_index: None,
            ear_monitoring,
            samples_mix,
            slider_percent: 0,
            pending_seek: None,
            show_progress: false,
            frame: FrameInfo::default(),
            generation: 0,
            samples: None,
            click: None,
            spawner,
            store,
            publisher,
        };
        transport.publish_snapshot();
        transport
    }

    pub fn nav_index(&self) -> usize {
        self.nav_index
    }

    pub fn playing_index(&self) -> Option<usize> {
        self.playing_index
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Apply one command. Returns `false` once the shutdown sequence ran
    /// and the dispatch loop should end.
    pub fn handle(&mut self, command: Command) -> bool {
        match command {
            Command::NavPrev => self.navigate(-1, false),
            Command::NavNext => self.navigate(1, false),
            Command::Select => self.select(false),
            Command::Stop => self.stop_playing(false),
            Command::TogglePlay => self.toggle_play(),
            Command::KnobSet { channel, percent } => self.knob_set(channel, percent),
            Command::KnobStep { channel, delta } => self.knob_step(channel, delta),
            Command::SliderStep { delta } => self.slider_step(delta),
            Command::SaveState => self.save_state(),
            Command::RestoreState => self.restore_state(),
            Command::ShowProgress(enabled) => self.show_progress = enabled,
            Command::ProgressTick => self.progress_tick(),
            Command::PlayerFrame { generation, info } => {
                if generation == self.generation {
                    self.frame = info;
                }
            }
            Command::PlayerEnded { generation } => self.player_ended(generation),
            Command::Shutdown => {
                info!("shutting down");
                self.stop_playing(true);
                return false;
            }
        }
        true
    }

    /// Move the navigation cursor, clamped to the catalog. At a bound the
    /// move is a silent no-op unless forced.
    fn navigate(&mut self, delta: i64, force: bool) {
        let max = self.catalog.len() as i64 - 1;
        let target = (self.nav_index as i64 + delta).clamp(0, max) as usize;
        if target == self.nav_index && !force {
            return;
        }
        self.nav_index = target;
        debug!("navigation at track {:02}", self.nav_index + 1);
        self.publish_navigation();
    }

    fn select(&mut self, force: bool) {
        if self.playing_index == Some(self.nav_index) && !force {
            debug!("track already playing, select ignored");
            return;
        }
        self.start_track(self.nav_index);
    }

    fn toggle_play(&mut self) {
        if self.playing_index.is_some() {
            self.stop_playing(false);
        } else {
            self.select(false);
        }
    }

    /// Stop whatever is playing, then start the given track.
    fn start_track(&mut self, index: usize) {
        if self.playing_index.is_some() {
            self.stop_playing(true);
        }
        self.playing_index = Some(index);
        self.show_progress = true;
        self.publish_playing_set(index);
        self.start_players(index);
    }

    fn stop_playing(&mut self, force: bool) {
        if self.playing_index.is_none() && !force {
            debug!("nothing playing, stop ignored");
            return;
        }
        let was_playing = self.playing_index.take().is_some();
        self.frame = FrameInfo::default();
        self.teardown_players();
        if was_playing {
            info!("playback stopped");
            self.publish_playing_cleared();
        }
    }

    /// Quit and drop both players. Safe to call when nothing is running.
    fn teardown_players(&mut self) {
        self.generation += 1;
        if let Some(mut player) = self.samples.take() {
            let _ = player.stop();
            let _ = player.quit();
        }
        if let Some(mut player) = self.click.take() {
            let _ = player.stop();
            let _ = player.quit();
        }
    }

    /// Spawn fresh players for a track and start them together.
    ///
    /// Player failures are logged and swallowed: a dead channel must not
    /// take the console down mid-set.
    fn start_players(&mut self, index: usize) {
        self.teardown_players();
        let Some(track) = self.catalog.get(index).cloned() else {
            return;
        };
        let dir = self.tracks_dir.join(&track.folder);

        self.samples = match self.spawner.spawn(PlayerChannel::Samples, self.generation) {
            Ok(player) => player,
            Err(err) => {
                warn!("can't start samples player: {err:#}");
                None
            }
        };
        self.click = match self.spawner.spawn(PlayerChannel::Click, self.generation) {
            Ok(player) => player,
            Err(err) => {
                warn!("can't start click player: {err:#}");
                None
            }
        };

        let seek = self.pending_seek.take();
        if let Some(player) = self.samples.as_mut() {
            if let Err(err) = player.load(&dir.join(&track.samples_file)) {
                warn!("can't load samples file: {err:#}");
            }
            let _ = player.set_gain(self.samples_mix);
            if let Some(frame) = seek {
                let _ = player.seek(frame);
            }
        }
        if let Some(player) = self.click.as_mut() {
            if let Err(err) = player.load(&dir.join(&track.click_file)) {
                warn!("can't load click file: {err:#}");
            }
            let _ = player.set_gain(self.ear_monitoring);
            // Both channels seek so they stay aligned after a restore.
            if let Some(frame) = seek {
                let _ = player.seek(frame);
            }
        }

        if let Some(player) = self.samples.as_mut() {
            let _ = player.play();
        }
        if let Some(player) = self.click.as_mut() {
            let _ = player.play();
        }
        info!("playing track {:02} \"{}\"", index + 1, track.title);
    }

    fn knob_set(&mut self, channel: GainChannel, percent: u8) {
        let percent = percent.min(100);
        match channel {
            GainChannel::EarMonitoring => {
                self.ear_monitoring = percent;
                if let Some(player) = self.click.as_mut() {
                    if let Err(err) = player.set_gain(percent) {
                        warn!("can't set click gain: {err:#}");
                    }
                }
                self.publisher
                    .publish("knobs/ear_monitoring", &percent.to_string());
            }
            GainChannel::SamplesMix => {
                self.samples_mix = percent;
                if let Some(player) = self.samples.as_mut() {
                    if let Err(err) = player.set_gain(percent) {
                        warn!("can't set samples gain: {err:#}");
                    }
                }
                self.publisher
                    .publish("knobs/samples_mix", &percent.to_string());
            }
        }
    }

    fn knob_step(&mut self, channel: GainChannel, delta: i8) {
        let current = match channel {
            GainChannel::EarMonitoring => self.ear_monitoring,
            GainChannel::SamplesMix => self.samples_mix,
        };
        let target = (current as i16 + delta as i16).clamp(0, 100) as u8;
        self.knob_set(channel, target);
    }

    fn slider_step(&mut self, delta: i8) {
        self.slider_percent = (self.slider_percent as i16 + delta as i16).clamp(0, 100) as u8;
        self.publisher
            .publish("sliders/track", &self.slider_percent.to_string());
    }

    fn save_state(&mut self) {
        let Some(index) = self.playing_index else {
            info!("no track playing, nothing to save");
            return;
        };
        let Some(track) = self.catalog.get(index) else {
            return;
        };
        let state = SavedPlaybackState {
            track_folder: track.folder.clone(),
            samples_file_frame: self.frame.current_frame,
        };
        match self.store.save(&state) {
            Ok(()) => info!(
                "saved \"{}\" at frame {}",
                state.track_folder, state.samples_file_frame
            ),
            Err(err) => warn!("can't save state: {err:#}"),
        }
    }

    /// Restart the saved track at its saved frame. Navigation stays where
    /// it is; a stale or missing snapshot leaves the state unchanged.
    fn restore_state(&mut self) {
        let state = match self.store.load() {
            Ok(state) => state,
            Err(err) => {
                warn!("can't restore state: {err:#}");
                return;
            }
        };
        let Some(index) = self.catalog.index_of_folder(&state.track_folder) else {
            warn!("saved track \"{}\" is not in the catalog", state.track_folder);
            return;
        };
        info!(
            "restoring \"{}\" at frame {}",
            state.track_folder, state.samples_file_frame
        );
        self.pending_seek = Some(state.samples_file_frame);
        self.start_track(index);
    }

    fn player_ended(&mut self, generation: u64) {
        if generation != self.generation {
            return;
        }
        if self.playing_index.is_some() {
            info!("track finished");
            self.stop_playing(false);
        }
    }

    fn progress_tick(&self) {
        if !self.show_progress || self.playing_index.is_none() {
            return;
        }
        if self.frame == FrameInfo::default() {
            // No report from the player yet.
            return;
        }
        self.publisher.publish(
            "infos/playing_track/current_time",
            &format_mmss(self.frame.current_time),
        );
        self.publisher.publish(
            "infos/playing_track/total_time",
            &format_mmss(self.frame.total_time()),
        );
        self.publisher.publish(
            "sliders/track",
            &(self.frame.progress_percent().round() as i64).to_string(),
        );
    }

    /// Initial display state pushed once at startup.
    fn publish_snapshot(&self) {
        self.publisher
            .publish("infos/tracks/count", &format!("{:02}", self.catalog.len()));
        self.publish_navigation();
        self.publish_playing_cleared();
        self.publisher
            .publish("knobs/ear_monitoring", &self.ear_monitoring.to_string());
        self.publisher
            .publish("knobs/samples_mix", &self.samples_mix.to_string());
    }

    fn publish_navigation(&self) {
        if let Some(track) = self.catalog.get(self.nav_index) {
            self.publisher
                .publish("infos/navigation_track/title", &track.title);
            self.publisher
                .publish("infos/navigation_track/num", &format!("{:02}", self.nav_index + 1));
        }
    }

    fn publish_playing_set(&self, index: usize) {
        if let Some(track) = self.catalog.get(index) {
            self.publisher
                .publish("infos/playing_track/title", &track.title);
            self.publisher
                .publish("infos/playing_track/num", &format!("{:02}", index + 1));
            self.publisher.publish("buttons/play_stop/value", "stop");
        }
    }

    fn publish_playing_cleared(&self) {
        self.publisher.publish("infos/playing_track/title", "");
        self.publisher.publish("infos/playing_track/num", "00");
        self.publisher
            .publish("infos/playing_track/current_time", "00:00");
        self.publisher
            .publish("infos/playing_track/total_time", "00:00");
        self.publisher.publish("sliders/track", "0");
        self.publisher.publish("buttons/play_stop/value", "play");
    }
}
