/// Playback position snapshot reported by the external player.
///
/// Refreshed on every frame line from the samples player; zeroed when
/// playback stops.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameInfo {
    pub current_frame: u64,
    pub frames_remaining: u64,
    /// Elapsed playback time in seconds.
    pub current_time: f64,
    /// Remaining playback time in seconds.
    pub time_remaining: f64,
}

impl FrameInfo {
    pub fn total_time(&self) -> f64 {
        (self.current_time + self.time_remaining).round()
    }

    /// Playback progress in percent of the playing track's duration.
    pub fn progress_percent(&self) -> f64 {
        let total = self.total_time();
        if total <= 0.0 {
            return 0.0;
        }
        self.current_time / total * 100.0
    }
}

/// Format a seconds count as an "MM:SS" display string.
pub fn format_mmss(seconds: f64) -> String {
    let total = seconds.round().max(0.0) as u64;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;
    format!("{minutes:02}:{secs:02}")
}
