use std::{future::Future, sync::Arc, time::Duration};

use crate::{
    error::{PlaybackError, Result},
    spotify::PlaybackApi,
    types::{CurrentPlayback, CurrentlyPlaying, Device},
};

/// Stateless façade that turns intents into player API calls.
///
/// Every command first checks that some device is active and fails with
/// [`PlaybackError::NoActiveDevice`] before touching the control endpoint
/// otherwise. Seeking is held to the same rule as the other commands.
/// Nothing is retried here; each call is bounded by the request timeout.
pub struct PlaybackGateway<A> {
    api: Arc<A>,
    timeout: Duration,
}

impl<A> Clone for PlaybackGateway<A> {
    fn clone(&self) -> Self {
        Self {
            api: Arc::clone(&self.api),
            timeout: self.timeout,
        }
    }
}

impl<A: PlaybackApi> PlaybackGateway<A> {
    pub fn new(api: Arc<A>, timeout: Duration) -> Self {
        Self { api, timeout }
    }

    pub fn api(&self) -> &Arc<A> {
        &self.api
    }

    async fn bounded<T>(&self, call: impl Future<Output = Result<T>>) -> Result<T> {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(PlaybackError::TransientNetwork(format!(
                "no response within {}s",
                self.timeout.as_secs_f32()
            ))),
        }
    }

    async fn ensure_active_device(&self) -> Result<()> {
        let devices = self.bounded(self.api.devices()).await?;
        if devices.iter().any(|d| d.is_active) {
            Ok(())
        } else {
            Err(PlaybackError::NoActiveDevice)
        }
    }

    pub async fn devices(&self) -> Result<Vec<Device>> {
        self.bounded(self.api.devices()).await
    }

    pub async fn current_track(&self) -> Result<Option<CurrentlyPlaying>> {
        self.bounded(self.api.currently_playing()).await
    }

    pub async fn playback_state(&self) -> Result<Option<CurrentPlayback>> {
        self.bounded(self.api.current_playback()).await
    }

    pub async fn play(&self) -> Result<()> {
        self.ensure_active_device().await?;
        self.bounded(self.api.resume()).await
    }

    pub async fn pause(&self) -> Result<()> {
        self.ensure_active_device().await?;
        self.bounded(self.api.pause()).await
    }

    pub async fn skip_next(&self) -> Result<()> {
        self.ensure_active_device().await?;
        self.bounded(self.api.skip_next()).await
    }

    pub async fn skip_previous(&self) -> Result<()> {
        self.ensure_active_device().await?;
        self.bounded(self.api.skip_previous()).await
    }

    pub async fn seek_to(&self, position_ms: u64) -> Result<()> {
        self.ensure_active_device().await?;
        self.bounded(self.api.seek(position_ms)).await
    }

    pub async fn set_volume(&self, percent: u8) -> Result<()> {
        self.ensure_active_device().await?;
        self.bounded(self.api.set_volume(percent.min(100))).await
    }
}
