use crate::model::FrameInfo;

/// Gain channel addressed by knobs, serial input and keyboard steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GainChannel {
    /// Click-track level in the performer's ears.
    EarMonitoring,
    /// Backing samples level in the front mix.
    SamplesMix,
}

/// Logical command produced by an input listener or a player callback.
///
/// Commands are serialized through a single channel; the transport
/// dispatcher is the only consumer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    /// Move the navigation cursor to the previous track.
    NavPrev,
    /// Move the navigation cursor to the next track.
    NavNext,
    /// Start playback of the track under the navigation cursor.
    Select,
    /// Stop playback.
    Stop,
    /// Play/stop button on the touch panel: stop when playing, select otherwise.
    TogglePlay,
    /// Set a gain channel to an absolute percentage.
    KnobSet { channel: GainChannel, percent: u8 },
    /// Nudge a gain channel by a signed step (keyboard).
    KnobStep { channel: GainChannel, delta: i8 },
    /// Nudge the display-only progress slider (keyboard).
    SliderStep { delta: i8 },
    /// Persist the playing track and current frame.
    SaveState,
    /// Restore the persisted track and seek to its saved frame.
    RestoreState,
    /// Enable or disable periodic progress publishing.
    ShowProgress(bool),
    /// Periodic tick from the progress interval thread.
    ProgressTick,
    /// Frame report from the external samples player. The generation
    /// identifies which playback the report belongs to.
    PlayerFrame { generation: u64, info: FrameInfo },
    /// The external player reached end of track.
    PlayerEnded { generation: u64 },
    /// Orderly shutdown requested.
    Shutdown,
}
