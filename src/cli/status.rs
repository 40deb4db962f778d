use crate::{cli, config::Settings, error::PlaybackError, warning};

/// Prints what is playing right now.
pub async fn status(settings: &Settings) {
    let mut app = cli::connect(settings);
    if !app.start().await {
        return;
    }

    match app.sync.refresh().await {
        Ok(snapshot) => cli::print_snapshot(&snapshot),
        Err(PlaybackError::NoTrack) => {}
        Err(e) => warning!("Could not read playback state: {}", e),
    }
    app.drain_notices();
}
