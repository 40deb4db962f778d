//! # CLI Module
//!
//! The presentation surface of Minify. Every command builds the same object
//! graph through [`connect`], lets the token lifecycle establish a session,
//! and then drives the [`Synchronizer`] the way a player window would: plain
//! commands call it once, `watch` keeps it running and renders its snapshot.
//!
//! ```text
//! CLI command
//!     ↓
//! Synchronizer ── TokenLifecycle
//!     ↓                ↓
//! PlaybackGateway   SpotifyAuth / TokenStore
//!     ↓
//! WebApiClient (Spotify Web API)
//! ```

use std::{sync::Arc, time::Duration};

use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::mpsc;

use crate::{
    config::Settings,
    error,
    management::{RenewalSignal, SessionHandle, TokenLifecycle, TokenStore},
    playback::{InteractionGuard, PlaybackGateway, PlaybackSnapshot, Synchronizer},
    spotify::{SpotifyAuth, WebApiClient},
    types::{Notice, NoticeLevel, NoticeReceiver},
    utils,
};

mod auth;
mod control;
mod devices;
mod status;
mod watch;

pub use auth::auth;
pub use control::{next, pause, play, previous, seek, toggle, volume};
pub use devices::devices;
pub use status::status;
pub use watch::watch;

pub type Player = Synchronizer<WebApiClient>;

/// The wired-up application: synchronizer, lifecycle and the notice feed.
pub struct App {
    pub sync: Arc<Player>,
    pub lifecycle: Arc<TokenLifecycle<SpotifyAuth>>,
    pub notices: NoticeReceiver,
}

impl App {
    /// Establishes a session from the stored credential or a fresh login.
    /// Returns `false` when no session could be established.
    pub async fn start(&mut self) -> bool {
        let started = self.lifecycle.start().await.is_ok();
        self.drain_notices();
        started
    }

    /// Prints every pending notice.
    pub fn drain_notices(&mut self) {
        while let Ok(notice) = self.notices.try_recv() {
            print_notice(&notice);
        }
    }
}

pub fn connect(settings: &Settings) -> App {
    let provider = match SpotifyAuth::from_env(settings.login_timeout) {
        Ok(provider) => provider,
        Err(e) => error!("{}. Add it to your environment or the .env file.", e),
    };

    let session = SessionHandle::new();
    let renewal = RenewalSignal::new();
    let (tx, rx) = mpsc::unbounded_channel();

    let api = Arc::new(WebApiClient::new(session.clone(), settings.request_timeout));
    let gateway = PlaybackGateway::new(api, settings.request_timeout);
    let sync = Arc::new(
        Synchronizer::new(
            gateway,
            Arc::new(InteractionGuard::new()),
            renewal.clone(),
            settings,
        )
        .with_notices(tx.clone()),
    );

    let lifecycle = Arc::new(
        TokenLifecycle::new(
            provider,
            TokenStore::new(),
            session,
            renewal,
            settings.renew_interval,
        )
        .with_notices(tx)
        .with_listener(sync.clone()),
    );

    App {
        sync,
        lifecycle,
        notices: rx,
    }
}

pub fn spinner(message: &'static str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_style(
        ProgressStyle::with_template("{spinner:.blue} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
    );
    pb
}

pub fn print_notice(notice: &Notice) {
    match notice.level {
        NoticeLevel::Info => crate::info!("{}", notice.message),
        NoticeLevel::Warning => crate::warning!("{}", notice.message),
    }
}

pub fn print_snapshot(snapshot: &PlaybackSnapshot) {
    if snapshot.is_idle() {
        crate::info!("Nothing is playing.");
        return;
    }

    crate::info!(
        "{} {} - {}",
        if snapshot.is_playing { "▶" } else { "⏸" },
        snapshot.track_name,
        snapshot.artists_display()
    );
    crate::info!(
        "{} / {}   volume {}%",
        utils::format_time(snapshot.progress_ms),
        utils::format_time(snapshot.duration_ms),
        snapshot.volume_percent
    );
    if !snapshot.album_art_url.is_empty() {
        crate::info!("Cover: {}", snapshot.album_art_url);
    }
}
