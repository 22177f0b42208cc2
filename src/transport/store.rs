//! Persisted playback position.
//!
//! A single JSON file remembers which track was playing and the frame the
//! samples player had reached, so a set can resume mid-track after a
//! power cycle.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Snapshot written by save-state and read back by restore-state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedPlaybackState {
    /// Folder name of the track that was playing.
    pub track_folder: String,
    /// Frame the samples player had reached.
    pub samples_file_frame: u64,
}

/// File-backed store for the playback snapshot.
pub struct PositionStore {
    path: PathBuf,
}

impl PositionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn save(&self, state: &SavedPlaybackState) -> Result<()> {
        let json = serde_json::to_string_pretty(state)?;
        fs::write(&self.path, json)
            .with_context(|| format!("can't write savestate file {}", self.path.display()))?;
        debug!(
            "saved position: {} at frame {}",
            state.track_folder, state.samples_file_frame
        );
        Ok(())
    }

    pub fn load(&self) -> Result<SavedPlaybackState> {
        let json = fs::read_to_string(&self.path)
            .with_context(|| format!("can't read savestate file {}", self.path.display()))?;
        let state = serde_json::from_str(&json)
            .with_context(|| format!("invalid savestate file {}", self.path.display()))?;
        Ok(state)
    }
}
