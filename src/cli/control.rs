use std::{future::Future, sync::Arc};

use crate::{
    cli::{self, App, Player},
    config::Settings,
    error::PlaybackError,
    utils, warning,
};

async fn connected(settings: &Settings) -> Option<App> {
    let mut app = cli::connect(settings);
    if app.start().await { Some(app) } else { None }
}

/// Runs one playback command and shows the state Spotify reports afterwards.
///
/// Command failures arrive as warnings on the notice channel, so the result is
/// only used to decide whether to print the snapshot.
async fn run<F, Fut>(settings: &Settings, message: &'static str, command: F)
where
    F: FnOnce(Arc<Player>) -> Fut,
    Fut: Future<Output = Result<(), PlaybackError>>,
{
    let Some(mut app) = connected(settings).await else {
        return;
    };

    let pb = cli::spinner(message);
    let outcome = command(Arc::clone(&app.sync)).await;
    pb.finish_and_clear();

    app.drain_notices();
    if outcome.is_ok() {
        cli::print_snapshot(&app.sync.snapshot());
    }
}

pub async fn play(settings: &Settings) {
    run(settings, "Resuming playback...", |p| async move { p.play().await }).await
}

pub async fn pause(settings: &Settings) {
    run(settings, "Pausing playback...", |p| async move { p.pause().await }).await
}

pub async fn toggle(settings: &Settings) {
    let Some(mut app) = connected(settings).await else {
        return;
    };

    // the toggle decides from the displayed state, so load it first
    if let Err(e) = app.sync.refresh().await {
        if e != PlaybackError::NoTrack {
            warning!("Could not read playback state: {}", e);
        }
    }

    let pb = cli::spinner("Toggling playback...");
    let outcome = app.sync.toggle_play_pause().await;
    pb.finish_and_clear();

    app.drain_notices();
    if outcome.is_ok() {
        cli::print_snapshot(&app.sync.snapshot());
    }
}

pub async fn next(settings: &Settings) {
    run(settings, "Skipping to next track...", |p| async move { p.skip_next().await }).await
}

pub async fn previous(settings: &Settings) {
    run(settings, "Skipping to previous track...", |p| async move {
        p.skip_previous().await
    })
    .await
}

/// Seeks through the same gesture path a dragged progress bar takes.
pub async fn seek(settings: &Settings, position: String) {
    let Some(mut app) = connected(settings).await else {
        return;
    };

    let snapshot = match app.sync.refresh().await {
        Ok(snapshot) => snapshot,
        Err(e) => {
            app.drain_notices();
            if e != PlaybackError::NoTrack {
                warning!("Could not read playback state: {}", e);
            }
            return;
        }
    };

    let ratio = match utils::parse_position(&position, snapshot.duration_ms) {
        Ok(ratio) => ratio,
        Err(e) => {
            warning!("{}", e);
            return;
        }
    };

    let pb = cli::spinner("Seeking...");
    app.sync.on_user_seek_start();
    let target = app.sync.on_user_seek_end(ratio).await;
    pb.finish_and_clear();

    tracing::debug!("seek target {}", utils::format_time(target));
    app.drain_notices();
    cli::print_snapshot(&app.sync.snapshot());
}

/// Sets the volume through the same gesture path a dragged slider takes.
pub async fn volume(settings: &Settings, percent: u8) {
    let Some(mut app) = connected(settings).await else {
        return;
    };

    let pb = cli::spinner("Setting volume...");
    app.sync.on_user_volume_start();
    let applied = app
        .sync
        .on_user_volume_end(f64::from(percent.min(100)) / 100.0)
        .await;
    pb.finish_and_clear();

    tracing::debug!("volume target {}%", applied);
    app.drain_notices();
    cli::print_snapshot(&app.sync.snapshot());
}
