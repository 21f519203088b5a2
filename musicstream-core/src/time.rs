//! Time and duration conversion utilities.
//!
//! The playback timeline counts whole seconds; these helpers convert
//! wall-clock durations into that unit with explicit saturation.

use std::time::Duration;

/// Extension trait for safe Duration conversions.
pub trait DurationExt {
    /// Convert duration to milliseconds as u64, saturating at `u64::MAX`.
    fn as_millis_u64(&self) -> u64;

    /// Convert duration to seconds as u32, saturating at `u32::MAX`.
    ///
    /// In practice, this is always safe for song timelines because
    /// `u32::MAX` seconds is approximately 136 years.
    fn as_secs_u32(&self) -> u32;

    /// Whole seconds as u32, never less than one.
    ///
    /// Turns a tick interval into a timeline step. Only whole-second
    /// intervals keep the timeline in step with wall time.
    fn as_tick_secs(&self) -> u32;
}

impl DurationExt for Duration {
    fn as_millis_u64(&self) -> u64 {
        u64::try_from(self.as_millis()).unwrap_or(u64::MAX)
    }

    fn as_secs_u32(&self) -> u32 {
        u32::try_from(self.as_secs()).unwrap_or(u32::MAX)
    }

    fn as_tick_secs(&self) -> u32 {
        self.as_secs_u32().max(1)
    }
}

/// Format seconds as `m:ss`.
#[must_use]
pub fn format_clock(seconds: u32) -> String {
    let mins = seconds / 60;
    let secs = seconds % 60;
    format!("{mins}:{secs:02}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_as_millis_u64() {
        let duration = Duration::from_millis(1234);
        assert_eq!(duration.as_millis_u64(), 1234);
    }

    #[test]
    fn test_as_secs_u32() {
        let duration = Duration::from_secs(300);
        assert_eq!(duration.as_secs_u32(), 300);
    }

    #[test]
    fn test_as_secs_u32_large() {
        let duration = Duration::from_secs(u64::from(u32::MAX) + 1);
        assert_eq!(duration.as_secs_u32(), u32::MAX);
    }

    #[test]
    fn test_as_tick_secs() {
        assert_eq!(Duration::from_secs(1).as_tick_secs(), 1);
        assert_eq!(Duration::from_millis(250).as_tick_secs(), 1);
        assert_eq!(Duration::from_millis(2500).as_tick_secs(), 2);
    }

    #[test]
    fn test_format_clock() {
        assert_eq!(format_clock(0), "0:00");
        assert_eq!(format_clock(9), "0:09");
        assert_eq!(format_clock(65), "1:05");
        assert_eq!(format_clock(180), "3:00");
        assert_eq!(format_clock(3600), "60:00");
    }
}
