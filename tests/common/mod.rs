#![allow(dead_code)]

use std::{
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use minify::{
    config::Settings,
    error::{AuthError, PlaybackError, Result},
    management::{RenewalSignal, SessionListener},
    playback::{InteractionGuard, PlaybackGateway, RefreshStrategy, Synchronizer},
    spotify::{AuthProvider, PlaybackApi},
    types::{
        Credential, CurrentPlayback, CurrentlyPlaying, Device, Image, NoticeReceiver, Track,
        TrackAlbum, TrackArtist,
    },
};
use tokio::sync::mpsc;

#[derive(Debug, Clone)]
pub struct Remote {
    pub track: Option<(String, String)>,
    pub is_playing: bool,
    pub progress_ms: u64,
    pub duration_ms: u64,
    pub volume: u8,
    pub active_device: bool,
}

impl Default for Remote {
    fn default() -> Self {
        Self {
            track: Some(("track-1".to_string(), "First Song".to_string())),
            is_playing: true,
            progress_ms: 1_000,
            duration_ms: 200_000,
            volume: 50,
            active_device: true,
        }
    }
}

/// Scripted player API. Reads answer from `remote`; commands mutate it.
#[derive(Default)]
pub struct FakeApi {
    pub remote: Mutex<Remote>,
    pub calls: Mutex<Vec<String>>,
    pub read_error: Mutex<Option<PlaybackError>>,
    /// Applied after `current_playback` has captured its answer.
    pub delay: Mutex<Duration>,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

impl FakeApi {
    pub fn new(remote: Remote) -> Arc<Self> {
        Arc::new(Self {
            remote: Mutex::new(remote),
            ..Default::default()
        })
    }

    pub fn set(&self, update: impl FnOnce(&mut Remote)) {
        update(&mut self.remote.lock().unwrap());
    }

    pub fn fail_reads(&self, err: Option<PlaybackError>) {
        *self.read_error.lock().unwrap() = err;
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = delay;
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, name: &str) -> usize {
        self.calls().iter().filter(|c| c.starts_with(name)).count()
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.lock().unwrap().push(call.into());
    }

    fn read_error(&self) -> Option<PlaybackError> {
        self.read_error.lock().unwrap().clone()
    }

    fn track(remote: &Remote) -> Option<Track> {
        remote.track.as_ref().map(|(id, name)| Track {
            id: Some(id.clone()),
            name: name.clone(),
            artists: vec![TrackArtist {
                id: None,
                name: "Some Artist".to_string(),
            }],
            album: Some(TrackAlbum {
                name: "Some Album".to_string(),
                images: vec![Image {
                    url: format!("https://i.scdn.co/image/{}", id),
                    height: Some(640),
                    width: Some(640),
                }],
            }),
            duration_ms: remote.duration_ms,
        })
    }
}

#[async_trait]
impl PlaybackApi for FakeApi {
    async fn devices(&self) -> Result<Vec<Device>> {
        self.record("devices");
        let active = self.remote.lock().unwrap().active_device;
        Ok(vec![Device {
            id: Some("device-1".to_string()),
            name: "Desk Speaker".to_string(),
            kind: "Speaker".to_string(),
            is_active: active,
            volume_percent: Some(50),
        }])
    }

    async fn currently_playing(&self) -> Result<Option<CurrentlyPlaying>> {
        self.record("currently_playing");
        if let Some(err) = self.read_error() {
            return Err(err);
        }
        let remote = self.remote.lock().unwrap().clone();
        Ok(Some(CurrentlyPlaying {
            is_playing: remote.is_playing,
            progress_ms: Some(remote.progress_ms),
            item: Self::track(&remote),
        }))
    }

    async fn current_playback(&self) -> Result<Option<CurrentPlayback>> {
        self.record("current_playback");
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let answer = match self.read_error() {
            Some(err) => Err(err),
            None => {
                let remote = self.remote.lock().unwrap().clone();
                Ok(Some(CurrentPlayback {
                    is_playing: remote.is_playing,
                    progress_ms: Some(remote.progress_ms),
                    device: Some(Device {
                        id: Some("device-1".to_string()),
                        name: "Desk Speaker".to_string(),
                        kind: "Speaker".to_string(),
                        is_active: remote.active_device,
                        volume_percent: Some(remote.volume),
                    }),
                    item: Self::track(&remote),
                }))
            }
        };

        let delay = *self.delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        answer
    }

    async fn resume(&self) -> Result<()> {
        self.record("resume");
        self.set(|r| r.is_playing = true);
        Ok(())
    }

    async fn pause(&self) -> Result<()> {
        self.record("pause");
        self.set(|r| r.is_playing = false);
        Ok(())
    }

    async fn skip_next(&self) -> Result<()> {
        self.record("skip_next");
        self.set(|r| {
            r.track = Some(("track-2".to_string(), "Second Song".to_string()));
            r.progress_ms = 0;
        });
        Ok(())
    }

    async fn skip_previous(&self) -> Result<()> {
        self.record("skip_previous");
        self.set(|r| r.progress_ms = 0);
        Ok(())
    }

    async fn seek(&self, position_ms: u64) -> Result<()> {
        self.record(format!("seek:{}", position_ms));
        self.set(|r| r.progress_ms = position_ms.min(r.duration_ms));
        Ok(())
    }

    async fn set_volume(&self, percent: u8) -> Result<()> {
        self.record(format!("set_volume:{}", percent));
        self.set(|r| r.volume = percent);
        Ok(())
    }
}

pub struct Harness {
    pub api: Arc<FakeApi>,
    pub sync: Arc<Synchronizer<FakeApi>>,
    pub notices: NoticeReceiver,
    pub renewal: RenewalSignal,
}

impl Harness {
    pub fn new(remote: Remote) -> Self {
        Self::with_strategy(remote, RefreshStrategy::AlwaysRefresh)
    }

    pub fn with_strategy(remote: Remote, strategy: RefreshStrategy) -> Self {
        let api = FakeApi::new(remote);
        let renewal = RenewalSignal::new();
        let (tx, notices) = mpsc::unbounded_channel();
        let settings = Settings {
            refresh_strategy: strategy,
            ..Settings::default()
        };

        let gateway = PlaybackGateway::new(Arc::clone(&api), settings.request_timeout);
        let sync = Arc::new(
            Synchronizer::new(
                gateway,
                Arc::new(InteractionGuard::new()),
                renewal.clone(),
                &settings,
            )
            .with_notices(tx),
        );

        Self {
            api,
            sync,
            notices,
            renewal,
        }
    }

    pub fn drain(&mut self) -> Vec<minify::types::Notice> {
        let mut out = Vec::new();
        while let Ok(notice) = self.notices.try_recv() {
            out.push(notice);
        }
        out
    }
}

#[derive(Clone)]
pub struct FakeAuth {
    pub events: Arc<Mutex<Vec<String>>>,
    pub refresh_result: Arc<Mutex<std::result::Result<Credential, AuthError>>>,
    pub login_result: Arc<Mutex<std::result::Result<Credential, AuthError>>>,
}

impl FakeAuth {
    pub fn new() -> Self {
        Self {
            events: Arc::new(Mutex::new(Vec::new())),
            refresh_result: Arc::new(Mutex::new(Ok(credential("refreshed-access", "refresh-2")))),
            login_result: Arc::new(Mutex::new(Ok(credential("login-access", "login-refresh")))),
        }
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    pub fn fail_refresh(&self) {
        *self.refresh_result.lock().unwrap() = Err(AuthError::Refresh("invalid_grant".to_string()));
    }

    pub fn fail_login(&self) {
        *self.login_result.lock().unwrap() = Err(AuthError::TimedOut);
    }
}

#[async_trait]
impl AuthProvider for FakeAuth {
    async fn login(&self) -> std::result::Result<Credential, AuthError> {
        self.events.lock().unwrap().push("login".to_string());
        self.login_result.lock().unwrap().clone()
    }

    async fn refresh(&self, refresh_token: &str) -> std::result::Result<Credential, AuthError> {
        self.events
            .lock()
            .unwrap()
            .push(format!("refresh:{}", refresh_token));
        self.refresh_result.lock().unwrap().clone()
    }
}

#[derive(Default)]
pub struct CountingListener {
    pub started: AtomicUsize,
}

#[async_trait]
impl SessionListener for CountingListener {
    async fn session_started(&self) {
        self.started.fetch_add(1, Ordering::SeqCst);
    }
}

pub fn credential(access: &str, refresh: &str) -> Credential {
    Credential {
        access_token: access.to_string(),
        refresh_token: refresh.to_string(),
    }
}
