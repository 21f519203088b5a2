//! Fixed-interval timeline driver.

use crate::config::DriverConfig;
use crate::controller::{PlaybackEvent, SharedController, TickOutcome};
use crate::time::DurationExt;
use std::time::Duration;
use tokio::sync::broadcast::{
    self,
    error::{RecvError, TryRecvError},
};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Advances the playback timeline once per interval while a session exists.
///
/// Paused sessions are still visited, but [`PlaybackController::tick`]
/// ignores them, so nothing changes while paused. Resuming, skipping, rating
/// and switching channel re-arm the interval, so the first tick after any of
/// them lands one full interval later.
///
/// [`PlaybackController::tick`]: crate::PlaybackController::tick
pub struct TickDriver {
    controller: SharedController,
    interval: Duration,
    cancel_token: CancellationToken,
}

impl TickDriver {
    /// Create a new tick driver
    ///
    /// # Arguments
    /// * `controller` - Shared controller to tick
    /// * `interval` - Wall-clock time between ticks
    /// * `cancel_token` - Optional external cancellation token for graceful shutdown
    pub fn new(
        controller: SharedController,
        interval: Duration,
        cancel_token: Option<CancellationToken>,
    ) -> Self {
        Self {
            controller,
            interval,
            cancel_token: cancel_token.unwrap_or_default(),
        }
    }

    /// Create a tick driver using the configured interval
    pub fn from_config(
        controller: SharedController,
        config: &DriverConfig,
        cancel_token: Option<CancellationToken>,
    ) -> Self {
        Self::new(controller, config.tick_interval(), cancel_token)
    }

    /// Get a clone of the cancellation token
    #[must_use]
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel_token.clone()
    }

    /// Start ticking in a background task
    #[must_use]
    pub fn start(self) -> TickHandle {
        let cancel_token = self.cancel_token.clone();
        let join = tokio::spawn(async move {
            self.run().await;
        });
        TickHandle { cancel_token, join }
    }

    async fn run(&self) {
        let delta_secs = self.interval.as_tick_secs();
        info!(
            "Starting tick driver (interval: {}ms, step: {}s)",
            self.interval.as_millis_u64(),
            delta_secs
        );
        if self.interval.subsec_nanos() != 0 || self.interval < Duration::from_secs(1) {
            warn!(
                "Tick interval of {}ms is not whole seconds, timeline will drift from wall time",
                self.interval.as_millis_u64()
            );
        }

        let mut events = self.controller.lock().await.subscribe();
        let mut ticker = tokio::time::interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                () = self.cancel_token.cancelled() => {
                    info!("Tick driver shutting down");
                    break;
                }
                event = events.recv() => match event {
                    Ok(event) if event.restarts_timeline() => {
                        debug!("Timeline restarted, re-arming tick interval");
                        ticker.reset();
                    }
                    Ok(_) => {}
                    Err(RecvError::Lagged(n)) => {
                        debug!("Tick driver missed {} playback events, re-arming", n);
                        ticker.reset();
                    }
                    Err(RecvError::Closed) => {
                        warn!("Playback event channel closed, stopping tick driver");
                        break;
                    }
                },
                _ = ticker.tick() => {
                    let mut controller = self.controller.lock().await;
                    // Cancellation may have happened while waiting for the lock
                    if self.cancel_token.is_cancelled() {
                        info!("Tick driver cancelled before applying tick");
                        break;
                    }
                    // A user action that got the lock first owns this boundary
                    if drain_restarts(&mut events) {
                        debug!("Dropping tick that fired before a timeline restart");
                        ticker.reset();
                        continue;
                    }
                    match controller.tick(delta_secs) {
                        Ok(TickOutcome::Advanced) => {
                            debug!("Auto-advanced to song {}", controller.state().song_index);
                        }
                        Ok(TickOutcome::Progressed | TickOutcome::Idle) => {}
                        Err(e) => {
                            error!("Tick driver stopped, playback state out of sync with catalog: {}", e);
                            break;
                        }
                    }
                }
            }
        }
    }
}

/// Consume queued events, reporting whether any of them restarted the
/// timeline. A lagged receiver counts as a restart.
fn drain_restarts(events: &mut broadcast::Receiver<PlaybackEvent>) -> bool {
    let mut restarted = false;
    loop {
        match events.try_recv() {
            Ok(event) => restarted |= event.restarts_timeline(),
            Err(TryRecvError::Lagged(_)) => restarted = true,
            Err(TryRecvError::Empty | TryRecvError::Closed) => return restarted,
        }
    }
}

/// Handle to a running [`TickDriver`]
pub struct TickHandle {
    cancel_token: CancellationToken,
    join: JoinHandle<()>,
}

impl TickHandle {
    /// Signal the driver to stop without waiting for it
    pub fn cancel(&self) {
        self.cancel_token.cancel();
    }

    /// Whether the driver task has exited
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Stop the driver and wait for its task to exit.
    ///
    /// Once this returns no further tick is applied. Must not be awaited
    /// while holding the controller lock.
    pub async fn stop(self) {
        self.cancel_token.cancel();
        if let Err(e) = self.join.await {
            warn!("Tick driver task ended abnormally: {}", e);
        }
    }
}
