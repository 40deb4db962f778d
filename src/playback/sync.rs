use std::{
    future::Future,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use tokio::{
    sync::watch,
    time::{Instant, MissedTickBehavior},
};

use crate::{
    config::Settings,
    error::{PlaybackError, Result},
    management::{RenewalSignal, SessionListener},
    playback::{InteractionGuard, Latches, PlaybackGateway, PlaybackSnapshot, RefreshStrategy},
    spotify::PlaybackApi,
    types::{Notice, NoticeSender},
    utils,
};

#[derive(Debug, Clone, Copy)]
struct Clock {
    last_fetch: Instant,
    last_advance: Instant,
}

/// Owns the authoritative [`PlaybackSnapshot`].
///
/// Refreshes are single-flight: one fetch sequence at a time, ticks skip when
/// one is running and forced refreshes queue behind it. Every gesture release
/// and every finished command bumps an epoch; a refresh that started under an
/// older epoch is discarded instead of committed.
pub struct Synchronizer<A> {
    gateway: PlaybackGateway<A>,
    guard: Arc<InteractionGuard>,
    snapshot: watch::Sender<PlaybackSnapshot>,
    ticking: watch::Sender<bool>,
    in_flight: tokio::sync::Mutex<()>,
    epoch: AtomicU64,
    idle_announced: AtomicBool,
    clock: Mutex<Clock>,
    strategy: RefreshStrategy,
    tick_interval: Duration,
    renewal: RenewalSignal,
    notices: Option<NoticeSender>,
}

impl<A: PlaybackApi> Synchronizer<A> {
    pub fn new(
        gateway: PlaybackGateway<A>,
        guard: Arc<InteractionGuard>,
        renewal: RenewalSignal,
        settings: &Settings,
    ) -> Self {
        let (snapshot, _) = watch::channel(PlaybackSnapshot::idle());
        let (ticking, _) = watch::channel(false);
        let now = Instant::now();

        Self {
            gateway,
            guard,
            snapshot,
            ticking,
            in_flight: tokio::sync::Mutex::new(()),
            epoch: AtomicU64::new(0),
            idle_announced: AtomicBool::new(false),
            clock: Mutex::new(Clock {
                last_fetch: now,
                last_advance: now,
            }),
            strategy: settings.refresh_strategy,
            tick_interval: settings.tick_interval,
            renewal,
            notices: None,
        }
    }

    pub fn with_notices(mut self, notices: NoticeSender) -> Self {
        self.notices = Some(notices);
        self
    }

    pub fn snapshot(&self) -> PlaybackSnapshot {
        self.snapshot.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<PlaybackSnapshot> {
        self.snapshot.subscribe()
    }

    pub fn guard(&self) -> &Arc<InteractionGuard> {
        &self.guard
    }

    pub fn gateway(&self) -> &PlaybackGateway<A> {
        &self.gateway
    }

    pub fn is_ticking(&self) -> bool {
        *self.ticking.borrow()
    }

    /// Fetches the remote state and commits it, waiting for any refresh that
    /// is already in flight.
    pub async fn refresh(&self) -> Result<PlaybackSnapshot> {
        let _flight = self.in_flight.lock().await;
        self.refresh_locked(true).await
    }

    /// Like [`refresh`](Self::refresh) but gives up when another refresh is in
    /// flight. Returns `None` when skipped.
    pub async fn try_refresh(&self) -> Option<Result<PlaybackSnapshot>> {
        let Ok(_flight) = self.in_flight.try_lock() else {
            tracing::debug!("refresh already in flight, skipping");
            return None;
        };
        Some(self.refresh_locked(true).await)
    }

    async fn refresh_locked(&self, renew_on_expiry: bool) -> Result<PlaybackSnapshot> {
        let epoch = self.epoch.load(Ordering::SeqCst);

        match self.fetch().await {
            Ok(remote) => Ok(self.commit(remote, epoch)),
            Err(PlaybackError::NoTrack) => {
                self.commit_idle(epoch);
                Err(PlaybackError::NoTrack)
            }
            Err(PlaybackError::AuthExpired) => {
                if renew_on_expiry {
                    self.renewal.request();
                }
                Err(PlaybackError::AuthExpired)
            }
            Err(e) => {
                tracing::debug!("refresh failed, keeping snapshot: {}", e);
                Err(e)
            }
        }
    }

    async fn fetch(&self) -> Result<PlaybackSnapshot> {
        let track = self
            .gateway
            .current_track()
            .await?
            .and_then(|c| c.item)
            .ok_or(PlaybackError::NoTrack)?;
        let playback = self
            .gateway
            .playback_state()
            .await?
            .ok_or(PlaybackError::NoTrack)?;

        Ok(PlaybackSnapshot::from_remote(&track, &playback))
    }

    fn commit(&self, mut next: PlaybackSnapshot, epoch: u64) -> PlaybackSnapshot {
        let latches = self.guard.lock();

        if self.epoch.load(Ordering::SeqCst) != epoch {
            tracing::debug!("dropping refresh made stale by a newer gesture or command");
            return self.snapshot.borrow().clone();
        }

        {
            let current = self.snapshot.borrow();
            if latches.seeking_progress {
                next.duration_ms = current.duration_ms;
                next.progress_ms = current.progress_ms;
            }
            if latches.seeking_volume {
                next.volume_percent = current.volume_percent;
            }
        }

        self.snapshot.send_replace(next.clone());
        self.idle_announced.store(false, Ordering::SeqCst);
        self.reset_clock();
        self.set_ticking(next.is_playing);
        drop(latches);

        next
    }

    fn commit_idle(&self, epoch: u64) {
        let latches = self.guard.lock();
        if self.epoch.load(Ordering::SeqCst) != epoch {
            return;
        }

        self.snapshot.send_if_modified(|current| {
            let mut idle = PlaybackSnapshot::idle();
            if latches.seeking_progress {
                idle.duration_ms = current.duration_ms;
                idle.progress_ms = current.progress_ms;
            }
            if latches.seeking_volume {
                idle.volume_percent = current.volume_percent;
            }

            let captured_at = idle.captured_at;
            idle.captured_at = current.captured_at;
            if *current == idle {
                return false;
            }
            idle.captured_at = captured_at;
            *current = idle;
            true
        });
        self.reset_clock();
        self.set_ticking(false);
        drop(latches);

        if !self.idle_announced.swap(true, Ordering::SeqCst) {
            self.notify(Notice::info(PlaybackError::NoTrack.to_string()));
        }
    }

    fn reset_clock(&self) {
        let now = Instant::now();
        let mut clock = match self.clock.lock() {
            Ok(clock) => clock,
            Err(poisoned) => poisoned.into_inner(),
        };
        clock.last_fetch = now;
        clock.last_advance = now;
    }

    fn set_ticking(&self, on: bool) {
        let changed = self.ticking.send_if_modified(|ticking| {
            if *ticking == on {
                return false;
            }
            *ticking = on;
            true
        });
        if changed {
            tracing::debug!("progress tick {}", if on { "started" } else { "stopped" });
        }
    }

    /// One progress tick. What it does depends on the [`RefreshStrategy`].
    pub async fn on_tick(&self) {
        let resync_every = match self.strategy {
            RefreshStrategy::AlwaysRefresh => {
                let _ = self.try_refresh().await;
                return;
            }
            RefreshStrategy::Extrapolate { resync_every } => resync_every,
        };

        let clock = match self.clock.lock() {
            Ok(clock) => *clock,
            Err(poisoned) => *poisoned.into_inner(),
        };

        if clock.last_fetch.elapsed() >= resync_every {
            let _ = self.try_refresh().await;
            return;
        }

        if self.extrapolate() {
            tracing::debug!("track reached its end locally, resyncing");
            let _ = self.try_refresh().await;
        }
    }

    /// Advances progress by the time since the last advance. Returns `true`
    /// when the track has run out.
    fn extrapolate(&self) -> bool {
        let latches = self.guard.lock();

        let elapsed = {
            let mut clock = match self.clock.lock() {
                Ok(clock) => clock,
                Err(poisoned) => poisoned.into_inner(),
            };
            let now = Instant::now();
            let elapsed = now.saturating_duration_since(clock.last_advance);
            clock.last_advance = now;
            elapsed
        };

        if latches.seeking_progress {
            return false;
        }

        let mut ended = false;
        self.snapshot.send_if_modified(|snapshot| {
            let before = snapshot.progress_ms;
            ended = snapshot.advance(elapsed.as_millis() as u64);
            snapshot.progress_ms != before
        });
        ended
    }

    /// Ticks every `tick_interval` while playback is running; idles otherwise.
    /// Runs until the synchronizer is dropped.
    pub async fn run_ticks(&self) {
        let mut enabled = self.ticking.subscribe();

        loop {
            if enabled.wait_for(|on| *on).await.is_err() {
                return;
            }

            let mut ticker =
                tokio::time::interval_at(Instant::now() + self.tick_interval, self.tick_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = ticker.tick() => self.on_tick().await,
                    changed = enabled.changed() => {
                        if changed.is_err() {
                            return;
                        }
                        if !*enabled.borrow() {
                            break;
                        }
                    }
                }
            }
        }
    }

    /// The user grabbed the progress bar. Refreshes keep the displayed
    /// position and duration until the drag ends or is cancelled.
    pub fn on_user_seek_start(&self) {
        self.guard.set_seeking_progress(true);
    }

    /// The drag left the control without a release; nothing is sent.
    pub fn on_user_seek_cancel(&self) {
        self.guard.set_seeking_progress(false);
    }

    /// Seeks to `ratio` of the current track, then refreshes whatever the
    /// outcome.
    ///
    /// # Arguments
    ///
    /// * `ratio` - Release point on the progress bar. Clamped to `0.0..=1.0`;
    ///   NaN counts as the start
    ///
    /// # Returns
    ///
    /// The target position in milliseconds, `round(duration_ms * ratio)`.
    ///
    /// A failed seek surfaces as a warning notice. Either way the latch is
    /// released and any refresh that started before the release is discarded.
    pub async fn on_user_seek_end(&self, ratio: f64) -> u64 {
        let duration_ms = self.snapshot.borrow().duration_ms;
        let target_ms = utils::seek_target_ms(duration_ms, ratio);

        let outcome = self.gateway.seek_to(target_ms).await;
        self.report(&outcome);
        self.release(|latches| latches.seeking_progress = false);

        let _ = self.refresh().await;
        target_ms
    }

    /// The user grabbed the volume slider. Refreshes keep the displayed
    /// volume until the drag ends or is cancelled.
    pub fn on_user_volume_start(&self) {
        self.guard.set_seeking_volume(true);
    }

    /// The slider drag was abandoned; nothing is sent.
    pub fn on_user_volume_cancel(&self) {
        self.guard.set_seeking_volume(false);
    }

    /// Sets the volume to `ratio` of the slider, then refreshes whatever the
    /// outcome.
    ///
    /// # Arguments
    ///
    /// * `ratio` - Release point on the volume slider, clamped to `0.0..=1.0`
    ///
    /// # Returns
    ///
    /// The requested percentage, `round(100 * ratio)`.
    pub async fn on_user_volume_end(&self, ratio: f64) -> u8 {
        let percent = utils::volume_from_ratio(ratio);

        let outcome = self.gateway.set_volume(percent).await;
        self.report(&outcome);
        self.release(|latches| latches.seeking_volume = false);

        let _ = self.refresh().await;
        percent
    }

    /// Pauses when the snapshot says playing, resumes otherwise.
    ///
    /// Like every command, this goes through the gateway's active-device check,
    /// reports a failure as a warning notice, and forces a refresh afterwards.
    /// The snapshot itself is only ever changed by that refresh.
    ///
    /// # Errors
    ///
    /// - [`PlaybackError::NoActiveDevice`] when no device is active
    /// - [`PlaybackError::AuthExpired`] after which a renewal is requested
    /// - [`PlaybackError::TransientNetwork`] or [`PlaybackError::Rejected`] as
    ///   reported by the gateway
    pub async fn toggle_play_pause(&self) -> Result<()> {
        let playing = self.snapshot.borrow().is_playing;
        if playing {
            self.pause().await
        } else {
            self.play().await
        }
    }

    /// Resumes playback on the active device.
    pub async fn play(&self) -> Result<()> {
        self.command(self.gateway.play()).await
    }

    /// Pauses playback on the active device.
    pub async fn pause(&self) -> Result<()> {
        self.command(self.gateway.pause()).await
    }

    /// Skips to the next track. Errors as for
    /// [`toggle_play_pause`](Self::toggle_play_pause).
    pub async fn skip_next(&self) -> Result<()> {
        self.command(self.gateway.skip_next()).await
    }

    pub async fn skip_previous(&self) -> Result<()> {
        self.command(self.gateway.skip_previous()).await
    }

    async fn command(&self, call: impl Future<Output = Result<()>>) -> Result<()> {
        let outcome = call.await;
        self.report(&outcome);
        self.epoch.fetch_add(1, Ordering::SeqCst);

        let _ = self.refresh().await;
        outcome
    }

    fn release(&self, clear: impl FnOnce(&mut Latches)) {
        let mut latches = self.guard.lock();
        clear(&mut latches);
        self.epoch.fetch_add(1, Ordering::SeqCst);
    }

    fn report(&self, outcome: &Result<()>) {
        match outcome {
            Ok(()) => {}
            Err(PlaybackError::AuthExpired) => self.renewal.request(),
            Err(e) => self.notify(Notice::warning(e.to_string())),
        }
    }

    fn notify(&self, notice: Notice) {
        if let Some(tx) = &self.notices {
            let _ = tx.send(notice);
        }
    }
}

#[async_trait]
impl<A: PlaybackApi> SessionListener for Synchronizer<A> {
    async fn session_started(&self) {
        let _flight = self.in_flight.lock().await;
        if let Err(e) = self.refresh_locked(false).await {
            tracing::debug!("refresh after new session failed: {}", e);
        }
    }
}
