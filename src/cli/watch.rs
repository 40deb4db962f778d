use std::sync::Arc;

use indicatif::{ProgressBar, ProgressStyle};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::{
    cli::{self, Player},
    config::Settings,
    info,
    playback::PlaybackSnapshot,
    utils, warning,
};

const HELP: &str = "Commands: p play/pause, n next, b previous, s <pos> seek (0.5, 50%, 01:30), v <0-100> volume, q quit";

/// Live mini-player: keeps the session renewed, ticks while playing and
/// re-renders on every snapshot change. Reads commands from stdin.
pub async fn watch(settings: &Settings) {
    let mut app = cli::connect(settings);
    if !app.start().await {
        return;
    }

    let bar = ProgressBar::new(0);
    bar.set_style(
        ProgressStyle::with_template("{msg}\n[{bar:40.green/white}] {prefix}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("━╸─"),
    );

    let lifecycle = Arc::clone(&app.lifecycle);
    let renewals = tokio::spawn(async move { lifecycle.run().await });

    let ticker = Arc::clone(&app.sync);
    let ticks = tokio::spawn(async move { ticker.run_ticks().await });

    let mut snapshots = app.sync.subscribe();
    let render_bar = bar.clone();
    let renderer = tokio::spawn(async move {
        render(&render_bar, &snapshots.borrow_and_update().clone());
        while snapshots.changed().await.is_ok() {
            let snapshot = snapshots.borrow_and_update().clone();
            render(&render_bar, &snapshot);
        }
    });

    let mut notices = app.notices;
    let notice_bar = bar.clone();
    let printer = tokio::spawn(async move {
        while let Some(notice) = notices.recv().await {
            notice_bar.suspend(|| cli::print_notice(&notice));
        }
    });

    bar.suspend(|| info!("{}", HELP));
    let _ = app.sync.refresh().await;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        if !handle(&app.sync, &bar, line.trim()).await {
            break;
        }
    }

    for task in [renewals, ticks, renderer, printer] {
        task.abort();
    }
    bar.finish_and_clear();
}

/// Returns `false` when the user asked to quit.
async fn handle(sync: &Player, bar: &ProgressBar, line: &str) -> bool {
    let (cmd, arg) = match line.split_once(char::is_whitespace) {
        Some((cmd, arg)) => (cmd, arg.trim()),
        None => (line, ""),
    };

    match cmd {
        "" => {}
        "q" | "quit" => return false,
        "p" | "play" | "pause" => {
            let _ = sync.toggle_play_pause().await;
        }
        "n" | "next" => {
            let _ = sync.skip_next().await;
        }
        "b" | "prev" | "previous" => {
            let _ = sync.skip_previous().await;
        }
        "s" | "seek" => {
            let duration_ms = sync.snapshot().duration_ms;
            match utils::parse_position(arg, duration_ms) {
                Ok(ratio) => {
                    sync.on_user_seek_start();
                    sync.on_user_seek_end(ratio).await;
                }
                Err(e) => bar.suspend(|| warning!("{}", e)),
            }
        }
        "v" | "vol" | "volume" => match arg.parse::<u8>() {
            Ok(percent) => {
                sync.on_user_volume_start();
                sync.on_user_volume_end(f64::from(percent.min(100)) / 100.0)
                    .await;
            }
            Err(_) => bar.suspend(|| warning!("Volume must be between 0 and 100")),
        },
        "r" | "refresh" => {
            let _ = sync.refresh().await;
        }
        _ => bar.suspend(|| info!("{}", HELP)),
    }

    true
}

fn render(bar: &ProgressBar, snapshot: &PlaybackSnapshot) {
    if snapshot.is_idle() {
        bar.set_length(1);
        bar.set_position(0);
        bar.set_message("Nothing is playing");
        bar.set_prefix(format!("volume {}%", snapshot.volume_percent));
        return;
    }

    bar.set_length(snapshot.duration_ms);
    bar.set_position(snapshot.progress_ms);
    bar.set_message(format!(
        "{} {} - {}",
        if snapshot.is_playing { "▶" } else { "⏸" },
        snapshot.track_name,
        snapshot.artists_display()
    ));
    bar.set_prefix(format!(
        "{} / {}   volume {}%",
        utils::format_time(snapshot.progress_ms),
        utils::format_time(snapshot.duration_ms),
        snapshot.volume_percent
    ));
}
