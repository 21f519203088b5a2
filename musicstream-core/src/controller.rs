use crate::catalog::{Catalog, Channel, Song};
use crate::config::SessionConfig;
use crate::error::Result;
use crate::playback::PlaybackState;
use crate::rating::{Rating, RatingStore};
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, warn};

/// Controller shared between the tick driver and user-facing callers.
///
/// The mutex is the single writer lock: every mutation goes through it, so a
/// tick can never interleave with a user action.
pub type SharedController = Arc<Mutex<PlaybackController>>;

/// Why playback moved to another song
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvanceReason {
    /// User pressed skip
    Manual,
    /// Elapsed time reached the song duration
    Auto,
    /// User rated the song
    Rated,
}

/// Events emitted by the playback controller after each state change
#[derive(Debug, Clone)]
pub enum PlaybackEvent {
    /// A different channel was selected
    ChannelSwitched { channel: Channel, song: Song },
    /// Playback moved to another song in the same channel
    SongChanged {
        song: Song,
        song_index: usize,
        reason: AdvanceReason,
    },
    /// Playback was paused
    PlaybackPaused { elapsed_secs: u32 },
    /// Playback was resumed
    PlaybackResumed { elapsed_secs: u32 },
    /// Volume changed (already clamped)
    VolumeChanged { volume: u8 },
    /// A song received a rating
    SongRated { song_id: String, rating: Rating },
    /// The timeline moved forward within the current song
    PositionTick {
        elapsed_secs: u32,
        duration_secs: u32,
    },
}

impl PlaybackEvent {
    /// Whether a user action put the timeline at a new starting point.
    ///
    /// Auto-advance is excluded since it already happens on a tick boundary.
    #[must_use]
    pub const fn restarts_timeline(&self) -> bool {
        matches!(
            self,
            Self::PlaybackResumed { .. }
                | Self::ChannelSwitched { .. }
                | Self::SongChanged {
                    reason: AdvanceReason::Manual | AdvanceReason::Rated,
                    ..
                }
        )
    }
}

/// Result of a single [`PlaybackController::tick`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Paused; nothing changed
    Idle,
    /// Elapsed time moved forward
    Progressed,
    /// The song ended and playback moved to the next one
    Advanced,
}

/// Owns the session's [`PlaybackState`] and [`RatingStore`] and exposes the
/// only operations allowed to change them.
///
/// Every operation is one atomic transition: new values are computed first and
/// committed together, so a failed call leaves the state untouched.
pub struct PlaybackController {
    catalog: Arc<Catalog>,
    state: PlaybackState,
    ratings: RatingStore,
    default_duration_secs: u32,
    event_tx: broadcast::Sender<PlaybackEvent>,
}

impl PlaybackController {
    /// Create the session's controller positioned at the first song of the
    /// configured default channel.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ChannelNotFound`](crate::CoreError::ChannelNotFound)
    /// if the default channel is not in the catalog.
    pub fn new(catalog: Arc<Catalog>, session: &SessionConfig) -> Result<Self> {
        let default_duration_secs = session.default_song_duration_secs.max(1);
        let channel_id = session.default_channel.as_str();
        let duration_secs = catalog.song_duration_secs(channel_id, 0, default_duration_secs)?;
        let (event_tx, _) = broadcast::channel(64);

        info!(
            "Starting playback session on channel {} ({})",
            channel_id,
            if session.autoplay { "playing" } else { "paused" }
        );

        Ok(Self {
            catalog,
            state: PlaybackState::new(
                channel_id,
                duration_secs,
                session.autoplay,
                session.initial_volume,
            ),
            ratings: RatingStore::new(),
            default_duration_secs,
            event_tx,
        })
    }

    /// Wrap the controller in the shared single-writer lock
    #[must_use]
    pub fn into_shared(self) -> SharedController {
        Arc::new(Mutex::new(self))
    }

    /// Subscribe to playback events
    pub fn subscribe(&self) -> broadcast::Receiver<PlaybackEvent> {
        self.event_tx.subscribe()
    }

    /// Current playback state
    #[must_use]
    pub const fn state(&self) -> &PlaybackState {
        &self.state
    }

    /// Ratings recorded so far in this session
    #[must_use]
    pub const fn ratings(&self) -> &RatingStore {
        &self.ratings
    }

    /// Catalog this session plays from
    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Channel currently selected.
    ///
    /// # Errors
    ///
    /// Only fails if the state and catalog are out of sync, which is an
    /// internal invariant violation.
    pub fn current_channel(&self) -> Result<&Channel> {
        self.catalog.get_channel(&self.state.channel_id)
    }

    /// Song currently playing.
    ///
    /// # Errors
    ///
    /// Only fails if the state and catalog are out of sync.
    pub fn current_song(&self) -> Result<&Song> {
        self.catalog
            .get_song(&self.state.channel_id, self.state.song_index)
    }

    /// Songs queued after the current one, in playlist order, without wrapping.
    ///
    /// # Errors
    ///
    /// Only fails if the state and catalog are out of sync.
    pub fn up_next(&self, limit: usize) -> Result<&[Song]> {
        let playlist = self.catalog.get_playlist(&self.state.channel_id)?;
        let start = (self.state.song_index + 1).min(playlist.len());
        let end = start.saturating_add(limit).min(playlist.len());
        Ok(&playlist[start..end])
    }

    /// Fraction of the current song already played
    #[must_use]
    pub fn progress(&self) -> f64 {
        self.state.progress()
    }

    /// Select another channel, restarting at its first song.
    ///
    /// The play/pause flag is left as it was.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ChannelNotFound`](crate::CoreError::ChannelNotFound)
    /// if the channel is unknown; the state is unchanged in that case.
    pub fn switch_channel(&mut self, channel_id: &str) -> Result<()> {
        let lookup = self.catalog.get_channel(channel_id).and_then(|channel| {
            let song = self.catalog.get_song(channel_id, 0)?;
            let duration_secs =
                self.catalog
                    .song_duration_secs(channel_id, 0, self.default_duration_secs)?;
            Ok((channel.clone(), song.clone(), duration_secs))
        });
        let (channel, song, duration_secs) = match lookup {
            Ok(found) => found,
            Err(e) => {
                warn!("Rejected channel switch: {}", e);
                return Err(e);
            }
        };

        self.state.channel_id = channel_id.to_string();
        self.state.song_index = 0;
        self.state.elapsed_secs = 0;
        self.state.duration_secs = duration_secs;

        debug!("Switched to channel {}", channel_id);

        let _ = self
            .event_tx
            .send(PlaybackEvent::ChannelSwitched { channel, song });
        Ok(())
    }

    /// Start or resume playback
    pub fn play(&mut self) {
        self.set_playing(true);
    }

    /// Pause playback
    pub fn pause(&mut self) {
        self.set_playing(false);
    }

    /// Flip between playing and paused
    pub fn toggle(&mut self) {
        self.set_playing(!self.state.is_playing);
    }

    /// Move to the next song in the channel, wrapping to the first.
    ///
    /// # Errors
    ///
    /// Only fails if the state and catalog are out of sync.
    pub fn skip_next(&mut self) -> Result<()> {
        self.advance(AdvanceReason::Manual)
    }

    /// Advance the timeline by `delta_secs`.
    ///
    /// Does nothing while paused. When elapsed time reaches the song duration
    /// playback moves to the next song exactly as [`Self::skip_next`] would.
    ///
    /// # Errors
    ///
    /// Only fails if the state and catalog are out of sync.
    pub fn tick(&mut self, delta_secs: u32) -> Result<TickOutcome> {
        if !self.state.is_playing {
            return Ok(TickOutcome::Idle);
        }

        let elapsed = self.state.elapsed_secs.saturating_add(delta_secs);
        if elapsed >= self.state.duration_secs {
            self.advance(AdvanceReason::Auto)?;
            return Ok(TickOutcome::Advanced);
        }

        self.state.elapsed_secs = elapsed;
        let _ = self.event_tx.send(PlaybackEvent::PositionTick {
            elapsed_secs: elapsed,
            duration_secs: self.state.duration_secs,
        });
        Ok(TickOutcome::Progressed)
    }

    /// Set the volume, clamping into `0..=100`. Returns the applied value.
    pub fn set_volume(&mut self, volume: i32) -> u8 {
        let clamped = u8::try_from(volume.clamp(0, i32::from(PlaybackState::MAX_VOLUME)))
            .unwrap_or(PlaybackState::MAX_VOLUME);
        if clamped != self.state.volume {
            self.state.volume = clamped;
            let _ = self
                .event_tx
                .send(PlaybackEvent::VolumeChanged { volume: clamped });
        }
        clamped
    }

    /// Record a rating for a song and move on to the next song.
    ///
    /// Rating always advances playback, whatever the rating value, elapsed
    /// time or play state.
    ///
    /// # Errors
    ///
    /// Only fails if the state and catalog are out of sync.
    pub fn rate(&mut self, song_id: &str, rating: Rating) -> Result<()> {
        if self.catalog.find_song(song_id).is_none() {
            debug!("Rating song {} which is not in the catalog", song_id);
        }

        let (next_index, duration_secs) = self.next_position()?;
        self.ratings.set(song_id, rating);
        info!("Rated {} as {}", song_id, rating);
        let _ = self.event_tx.send(PlaybackEvent::SongRated {
            song_id: song_id.to_string(),
            rating,
        });
        self.commit_advance(next_index, duration_secs, AdvanceReason::Rated)
    }

    /// Rate the song that is currently playing.
    ///
    /// # Errors
    ///
    /// Only fails if the state and catalog are out of sync.
    pub fn rate_current(&mut self, rating: Rating) -> Result<()> {
        let song_id = self.current_song()?.id.clone();
        self.rate(&song_id, rating)
    }

    fn set_playing(&mut self, playing: bool) {
        if self.state.is_playing == playing {
            return;
        }
        self.state.is_playing = playing;

        let elapsed_secs = self.state.elapsed_secs;
        let event = if playing {
            PlaybackEvent::PlaybackResumed { elapsed_secs }
        } else {
            PlaybackEvent::PlaybackPaused { elapsed_secs }
        };
        let _ = self.event_tx.send(event);
    }

    fn advance(&mut self, reason: AdvanceReason) -> Result<()> {
        let (next_index, duration_secs) = self.next_position()?;
        self.commit_advance(next_index, duration_secs, reason)
    }

    /// Index and duration of the song after the current one
    fn next_position(&self) -> Result<(usize, u32)> {
        let channel_id = &self.state.channel_id;
        let len = self.catalog.playlist_len(channel_id)?;
        let next_index = (self.state.song_index + 1) % len;
        let duration_secs =
            self.catalog
                .song_duration_secs(channel_id, next_index, self.default_duration_secs)?;
        Ok((next_index, duration_secs))
    }

    fn commit_advance(
        &mut self,
        next_index: usize,
        duration_secs: u32,
        reason: AdvanceReason,
    ) -> Result<()> {
        self.state.song_index = next_index;
        self.state.elapsed_secs = 0;
        self.state.duration_secs = duration_secs;

        let song = self.current_song()?.clone();
        debug!(
            "Advanced to {} - {} (index {}, {:?})",
            song.artist, song.title, next_index, reason
        );
        let _ = self.event_tx.send(PlaybackEvent::SongChanged {
            song,
            song_index: next_index,
            reason,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CatalogSnapshot, ChannelEntry};
    use crate::error::CoreError;

    fn controller() -> PlaybackController {
        PlaybackController::new(Arc::new(Catalog::builtin()), &SessionConfig::default()).unwrap()
    }

    fn catalog_with(songs: &[(&str, Option<u32>)]) -> Arc<Catalog> {
        let snapshot = CatalogSnapshot {
            channels: vec![ChannelEntry {
                id: "test".into(),
                name: "Test".into(),
                description: String::new(),
                accent_color: String::new(),
                songs: songs
                    .iter()
                    .map(|(id, duration)| Song {
                        id: (*id).to_string(),
                        title: id.to_uppercase(),
                        artist: "Tester".into(),
                        thumbnail: String::new(),
                        duration_secs: *duration,
                    })
                    .collect(),
            }],
        };
        Arc::new(Catalog::from_snapshot(snapshot).unwrap())
    }

    fn session_on(channel: &str) -> SessionConfig {
        SessionConfig {
            default_channel: channel.into(),
            ..SessionConfig::default()
        }
    }

    #[test]
    fn test_initial_state() {
        let c = controller();
        let state = c.state();
        assert_eq!(state.channel_id, "dancingDJ");
        assert_eq!(state.song_index, 0);
        assert_eq!(state.elapsed_secs, 0);
        assert_eq!(state.duration_secs, 180);
        assert!(state.is_playing);
        assert_eq!(state.volume, 75);
        assert!(c.ratings().is_empty());
    }

    #[test]
    fn test_unknown_default_channel() {
        let result = PlaybackController::new(Arc::new(Catalog::builtin()), &session_on("jazz"));
        assert!(matches!(result, Err(CoreError::ChannelNotFound { .. })));
    }

    #[test]
    fn test_auto_advance_after_duration() {
        let mut c = controller();
        for _ in 0..179 {
            assert_eq!(c.tick(1).unwrap(), TickOutcome::Progressed);
        }
        assert_eq!(c.state().song_index, 0);
        assert_eq!(c.state().elapsed_secs, 179);

        assert_eq!(c.tick(1).unwrap(), TickOutcome::Advanced);
        assert_eq!(c.state().song_index, 1);
        assert_eq!(c.state().elapsed_secs, 0);
    }

    #[test]
    fn test_large_tick_does_not_overshoot() {
        let mut c = controller();
        assert_eq!(c.tick(500).unwrap(), TickOutcome::Advanced);
        assert_eq!(c.state().song_index, 1);
        assert_eq!(c.state().elapsed_secs, 0);
    }

    #[test]
    fn test_pause_suppresses_ticking() {
        let mut c = controller();
        c.tick(10).unwrap();
        c.pause();
        let before = c.state().clone();

        for _ in 0..1000 {
            assert_eq!(c.tick(1).unwrap(), TickOutcome::Idle);
        }
        assert_eq!(c.state(), &before);
    }

    #[test]
    fn test_play_pause_toggle_only_touch_flag() {
        let mut c = controller();
        c.tick(42).unwrap();
        let before = c.state().clone();

        c.pause();
        assert!(!c.state().is_playing);
        c.toggle();
        assert!(c.state().is_playing);
        c.toggle();
        assert!(!c.state().is_playing);
        c.play();

        assert_eq!(c.state(), &before);
    }

    #[test]
    fn test_switch_channel_resets_timeline_and_keeps_flag() {
        let mut c = controller();
        c.skip_next().unwrap();
        c.tick(30).unwrap();
        c.pause();

        c.switch_channel("lofi").unwrap();
        let state = c.state();
        assert_eq!(state.channel_id, "lofi");
        assert_eq!(state.song_index, 0);
        assert_eq!(state.elapsed_secs, 0);
        assert_eq!(state.duration_secs, 180);
        assert!(!state.is_playing);
    }

    #[test]
    fn test_switch_to_same_channel_restarts() {
        let mut c = controller();
        c.skip_next().unwrap();
        c.tick(12).unwrap();

        c.switch_channel("dancingDJ").unwrap();
        assert_eq!(c.state().song_index, 0);
        assert_eq!(c.state().elapsed_secs, 0);
    }

    #[test]
    fn test_switch_unknown_channel_leaves_state() {
        let mut c = controller();
        c.skip_next().unwrap();
        c.tick(5).unwrap();
        let before = c.state().clone();

        let result = c.switch_channel("jazz");
        assert!(matches!(
            result,
            Err(CoreError::ChannelNotFound { channel_id }) if channel_id == "jazz"
        ));
        assert_eq!(c.state(), &before);
    }

    #[test]
    fn test_skip_wraps_around() {
        let mut c = controller();
        c.skip_next().unwrap();
        c.skip_next().unwrap();
        assert_eq!(c.state().song_index, 2);

        c.tick(7).unwrap();
        c.skip_next().unwrap();
        assert_eq!(c.state().song_index, 0);
        assert_eq!(c.state().elapsed_secs, 0);
        assert!(c.state().is_playing);
    }

    #[test]
    fn test_skip_preserves_paused() {
        let mut c = controller();
        c.pause();
        c.skip_next().unwrap();
        assert!(!c.state().is_playing);
        assert_eq!(c.state().song_index, 1);
    }

    #[test]
    fn test_single_song_playlist_wraps_to_itself() {
        let catalog = catalog_with(&[("only", Some(3))]);
        let mut c = PlaybackController::new(catalog, &session_on("test")).unwrap();

        c.tick(2).unwrap();
        c.skip_next().unwrap();
        assert_eq!(c.state().song_index, 0);
        assert_eq!(c.state().elapsed_secs, 0);

        for _ in 0..3 {
            c.tick(1).unwrap();
        }
        assert_eq!(c.state().song_index, 0);
        assert_eq!(c.state().elapsed_secs, 0);
    }

    #[test]
    fn test_duration_recomputed_per_song() {
        let catalog = catalog_with(&[("a", Some(10)), ("b", None), ("c", Some(30))]);
        let mut c = PlaybackController::new(catalog, &session_on("test")).unwrap();
        assert_eq!(c.state().duration_secs, 10);

        c.skip_next().unwrap();
        assert_eq!(c.state().duration_secs, 180);

        c.skip_next().unwrap();
        assert_eq!(c.state().duration_secs, 30);
    }

    #[test]
    fn test_volume_clamping() {
        let mut c = controller();
        assert_eq!(c.set_volume(-5), 0);
        assert_eq!(c.state().volume, 0);
        assert_eq!(c.set_volume(150), 100);
        assert_eq!(c.state().volume, 100);
        assert_eq!(c.set_volume(42), 42);
        assert_eq!(c.state().volume, 42);
    }

    #[test]
    fn test_rate_records_and_advances() {
        let mut c = controller();
        c.pause();

        c.rate("dj1", Rating::Like).unwrap();
        assert_eq!(c.ratings().get("dj1"), Some(Rating::Like));
        assert_eq!(c.state().song_index, 1);
        assert_eq!(c.state().elapsed_secs, 0);
        assert!(!c.state().is_playing);
    }

    #[test]
    fn test_rate_current_overwrites_on_wrap() {
        let mut c = controller();
        c.rate_current(Rating::Like).unwrap();
        c.rate_current(Rating::Like).unwrap();
        c.rate_current(Rating::Dislike).unwrap();
        assert_eq!(c.state().song_index, 0);

        c.rate_current(Rating::Dislike).unwrap();
        assert_eq!(c.ratings().get("dj1"), Some(Rating::Dislike));
        assert_eq!(c.ratings().get("dj2"), Some(Rating::Like));
        assert_eq!(c.ratings().get("dj3"), Some(Rating::Dislike));
        assert_eq!(c.ratings().len(), 3);
    }

    #[test]
    fn test_up_next_does_not_wrap() {
        let mut c = controller();
        let ids: Vec<_> = c.up_next(4).unwrap().iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, ["dj2", "dj3"]);

        c.skip_next().unwrap();
        c.skip_next().unwrap();
        assert!(c.up_next(4).unwrap().is_empty());

        c.skip_next().unwrap();
        assert_eq!(c.up_next(1).unwrap().len(), 1);
    }

    #[test]
    fn test_current_song_and_channel() {
        let mut c = controller();
        c.switch_channel("nepali").unwrap();
        c.skip_next().unwrap();

        assert_eq!(c.current_channel().unwrap().name, "Nepali Songs");
        assert_eq!(c.current_song().unwrap().title, "Classic Nepali Melody");
    }

    #[test]
    fn test_events_emitted() {
        let mut c = controller();
        let mut rx = c.subscribe();

        c.tick(1).unwrap();
        c.pause();
        c.play();
        c.set_volume(10);
        c.rate_current(Rating::Like).unwrap();
        c.switch_channel("lofi").unwrap();

        assert!(matches!(
            rx.try_recv(),
            Ok(PlaybackEvent::PositionTick { elapsed_secs: 1, duration_secs: 180 })
        ));
        assert!(matches!(rx.try_recv(), Ok(PlaybackEvent::PlaybackPaused { elapsed_secs: 1 })));
        assert!(matches!(rx.try_recv(), Ok(PlaybackEvent::PlaybackResumed { elapsed_secs: 1 })));
        assert!(matches!(rx.try_recv(), Ok(PlaybackEvent::VolumeChanged { volume: 10 })));
        assert!(matches!(
            rx.try_recv(),
            Ok(PlaybackEvent::SongRated { ref song_id, rating: Rating::Like }) if song_id == "dj1"
        ));
        assert!(matches!(
            rx.try_recv(),
            Ok(PlaybackEvent::SongChanged { song_index: 1, reason: AdvanceReason::Rated, .. })
        ));
        assert!(matches!(
            rx.try_recv(),
            Ok(PlaybackEvent::ChannelSwitched { ref channel, .. }) if channel.id == "lofi"
        ));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_no_event_for_redundant_changes() {
        let mut c = controller();
        let mut rx = c.subscribe();

        c.play();
        c.set_volume(75);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_timeline_restart_events() {
        let mut c = controller();
        let mut rx = c.subscribe();

        c.tick(1).unwrap();
        c.pause();
        c.play();
        c.set_volume(10);
        c.skip_next().unwrap();
        c.rate_current(Rating::Dislike).unwrap();
        c.switch_channel("lofi").unwrap();
        c.tick(180).unwrap();

        let mut restarts = Vec::new();
        while let Ok(event) = rx.try_recv() {
            restarts.push(event.restarts_timeline());
        }
        // tick, pause, resume, volume, skip, rated, rated advance, switch, auto advance
        assert_eq!(
            restarts,
            [false, false, true, false, true, false, true, true, false]
        );
    }
}
