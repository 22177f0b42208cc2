use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

/// Per-track metadata read from `track.json` inside a track directory.
#[derive(Debug, Clone, Deserialize)]
struct TrackFile {
    title: String,
    samples_file: String,
    click_file: String,
    midi_file: String,
}

/// One entry of the track catalog.
#[derive(Debug, Clone)]
pub struct Track {
    pub title: String,
    /// Directory name under the tracks folder.
    pub folder: String,
    pub samples_file: String,
    pub click_file: String,
    pub midi_file: String,
}

/// Ordered, immutable set of tracks found under the tracks folder.
#[derive(Debug, Clone)]
pub struct TrackCatalog {
    tracks: Vec<Track>,
}

impl TrackCatalog {
    /// Scan the tracks folder for track directories and validate each one.
    ///
    /// Every subdirectory must carry a parseable `track.json` with all
    /// required fields; referenced audio files are checked for the enabled
    /// channels. Any failure is fatal, as is an empty catalog.
    pub fn scan(tracks_dir: &Path, check_samples: bool, check_click: bool) -> Result<Self> {
        let entries = fs::read_dir(tracks_dir)
            .with_context(|| format!("can't read tracks folder {}", tracks_dir.display()))?;

        let mut folders: Vec<String> = Vec::new();
        for entry in entries {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                folders.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        folders.sort();
        tracing::debug!("{} track dir(s) found", folders.len());

        let mut tracks = Vec::with_capacity(folders.len());
        for folder in folders {
            let dir = tracks_dir.join(&folder);
            let json_path = dir.join("track.json");
            let data = fs::read_to_string(&json_path)
                .with_context(|| format!("can't read {}", json_path.display()))?;
            let info: TrackFile = serde_json::from_str(&data)
                .with_context(|| format!("can't parse {}", json_path.display()))?;

            if check_samples {
                let samples = dir.join(&info.samples_file);
                if !samples.is_file() {
                    bail!(
                        "track \"{}\": samples file {} not found",
                        folder,
                        samples.display()
                    );
                }
            }
            if check_click {
                let click = dir.join(&info.click_file);
                if !click.is_file() {
                    bail!(
                        "track \"{}\": click file {} not found",
                        folder,
                        click.display()
                    );
                }
            }

            tracks.push(Track {
                title: info.title,
                folder,
                samples_file: info.samples_file,
                click_file: info.click_file,
                midi_file: info.midi_file,
            });
        }

        if tracks.is_empty() {
            bail!("no tracks found in {}", tracks_dir.display());
        }

        Ok(Self { tracks })
    }

    /// Build a catalog from already-validated tracks (tests, tooling).
    pub fn from_tracks(tracks: Vec<Track>) -> Result<Self> {
        if tracks.is_empty() {
            bail!("track catalog can't be empty");
        }
        Ok(Self { tracks })
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Track> {
        self.tracks.get(index)
    }

    /// Resolve a track directory name back to its catalog index.
    pub fn index_of_folder(&self, folder: &str) -> Option<usize> {
        self.tracks.iter().position(|t| t.folder == folder)
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }
}
