use crate::time::format_clock;
use serde::{Deserialize, Serialize};

/// The single mutable record describing what is playing and where the
/// timeline is.
///
/// Only [`PlaybackController`](crate::PlaybackController) mutates it; every
/// other component gets a read-only view or a clone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackState {
    /// Current channel id
    pub channel_id: String,
    /// Position in the channel's playlist, always within bounds
    pub song_index: usize,
    /// Seconds played of the current song, never past `duration_secs`
    pub elapsed_secs: u32,
    /// Length of the current song in seconds
    pub duration_secs: u32,
    /// Whether the timeline is advancing
    pub is_playing: bool,
    /// Volume in percent, `0..=100`
    pub volume: u8,
}

impl PlaybackState {
    /// Highest allowed volume
    pub const MAX_VOLUME: u8 = 100;

    /// Create a state positioned at the start of the first song of a channel
    pub fn new(
        channel_id: impl Into<String>,
        duration_secs: u32,
        is_playing: bool,
        volume: u8,
    ) -> Self {
        Self {
            channel_id: channel_id.into(),
            song_index: 0,
            elapsed_secs: 0,
            duration_secs,
            is_playing,
            volume: volume.min(Self::MAX_VOLUME),
        }
    }

    /// Fraction of the current song already played, in `0.0..=1.0`
    #[must_use]
    pub fn progress(&self) -> f64 {
        if self.duration_secs == 0 {
            return 0.0;
        }
        (f64::from(self.elapsed_secs) / f64::from(self.duration_secs)).clamp(0.0, 1.0)
    }

    /// `m:ss / m:ss` timeline label
    #[must_use]
    pub fn timeline_label(&self) -> String {
        format!(
            "{} / {}",
            format_clock(self.elapsed_secs),
            format_clock(self.duration_secs)
        )
    }
}
