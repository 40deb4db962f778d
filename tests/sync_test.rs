mod common;

use std::{sync::Arc, sync::atomic::Ordering, time::Duration};

use common::{Harness, Remote};
use minify::{
    error::PlaybackError, management::SessionListener, playback::RefreshStrategy,
    types::NoticeLevel,
};

#[tokio::test]
async fn test_refresh_commits_remote_state() {
    let h = Harness::new(Remote::default());

    let snapshot = h.sync.refresh().await.unwrap();

    assert!(snapshot.is_playing);
    assert_eq!(snapshot.track_id, "track-1");
    assert_eq!(snapshot.track_name, "First Song");
    assert_eq!(snapshot.artists_display(), "Some Artist");
    assert_eq!(snapshot.album_art_url, "https://i.scdn.co/image/track-1");
    assert_eq!(snapshot.duration_ms, 200_000);
    assert_eq!(snapshot.progress_ms, 1_000);
    assert_eq!(snapshot.volume_percent, 50);
    assert_eq!(h.sync.snapshot(), snapshot);

    // Playing starts the progress tick
    assert!(h.sync.is_ticking());

    // Track first, then playback state
    assert_eq!(h.api.calls(), vec!["currently_playing", "current_playback"]);
}

#[tokio::test]
async fn test_progress_never_exceeds_duration() {
    let h = Harness::new(Remote {
        progress_ms: 250_000,
        ..Remote::default()
    });

    let snapshot = h.sync.refresh().await.unwrap();
    assert_eq!(snapshot.progress_ms, snapshot.duration_ms);
}

#[tokio::test]
async fn test_paused_playback_stops_ticking() {
    let h = Harness::new(Remote::default());
    h.sync.refresh().await.unwrap();
    assert!(h.sync.is_ticking());

    h.api.set(|r| r.is_playing = false);
    h.sync.refresh().await.unwrap();
    assert!(!h.sync.is_ticking());
}

#[tokio::test]
async fn test_seek_latch_blocks_progress_overwrite() {
    let h = Harness::new(Remote::default());
    h.sync.refresh().await.unwrap();

    h.sync.on_user_seek_start();
    h.api.set(|r| {
        r.progress_ms = 90_000;
        r.volume = 80;
        r.track = Some(("track-1".to_string(), "First Song (Live)".to_string()));
    });
    let snapshot = h.sync.refresh().await.unwrap();

    // Progress belongs to the user while dragging
    assert_eq!(snapshot.progress_ms, 1_000);
    assert_eq!(snapshot.duration_ms, 200_000);

    // Everything else still follows the remote
    assert_eq!(snapshot.track_name, "First Song (Live)");
    assert_eq!(snapshot.volume_percent, 80);

    h.sync.on_user_seek_cancel();
    let snapshot = h.sync.refresh().await.unwrap();
    assert_eq!(snapshot.progress_ms, 90_000);
}

#[tokio::test]
async fn test_volume_latch_blocks_volume_overwrite() {
    let h = Harness::new(Remote::default());
    h.sync.refresh().await.unwrap();

    h.sync.on_user_volume_start();
    h.api.set(|r| {
        r.volume = 10;
        r.progress_ms = 5_000;
    });
    let snapshot = h.sync.refresh().await.unwrap();

    assert_eq!(snapshot.volume_percent, 50);
    assert_eq!(snapshot.progress_ms, 5_000);

    h.sync.on_user_volume_cancel();
    assert_eq!(h.sync.refresh().await.unwrap().volume_percent, 10);
}

#[tokio::test]
async fn test_seek_end_bounds() {
    let h = Harness::new(Remote::default());
    h.sync.refresh().await.unwrap();

    h.sync.on_user_seek_start();
    assert_eq!(h.sync.on_user_seek_end(0.0).await, 0);
    assert_eq!(h.sync.snapshot().progress_ms, 0);

    h.sync.on_user_seek_start();
    assert_eq!(h.sync.on_user_seek_end(1.0).await, 200_000);
    assert_eq!(h.sync.snapshot().progress_ms, 200_000);

    let seeks: Vec<String> = h
        .api
        .calls()
        .into_iter()
        .filter(|c| c.starts_with("seek"))
        .collect();
    assert_eq!(seeks, vec!["seek:0", "seek:200000"]);

    // Latch is released after the gesture
    assert!(!h.sync.guard().seeking_progress());
}

#[tokio::test]
async fn test_volume_end_sets_rounded_percent() {
    let mut h = Harness::new(Remote::default());
    h.sync.refresh().await.unwrap();

    h.sync.on_user_volume_start();
    assert_eq!(h.sync.on_user_volume_end(0.42).await, 42);

    assert_eq!(h.api.count("set_volume:42"), 1);
    assert_eq!(h.sync.snapshot().volume_percent, 42);
    assert!(!h.sync.guard().seeking_volume());
    assert!(h.drain().is_empty());
}

#[tokio::test]
async fn test_play_without_active_device_changes_nothing() {
    let mut h = Harness::new(Remote {
        is_playing: false,
        active_device: false,
        ..Remote::default()
    });
    h.sync.refresh().await.unwrap();

    let result = h.sync.play().await;

    assert_eq!(result, Err(PlaybackError::NoActiveDevice));
    assert!(!h.sync.snapshot().is_playing);
    assert_eq!(h.api.count("resume"), 0);

    let notices = h.drain();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].level, NoticeLevel::Warning);
    assert_eq!(notices[0].message, PlaybackError::NoActiveDevice.to_string());
}

#[tokio::test]
async fn test_seek_without_active_device_is_rejected() {
    let mut h = Harness::new(Remote {
        active_device: false,
        ..Remote::default()
    });
    h.sync.refresh().await.unwrap();

    h.sync.on_user_seek_start();
    h.sync.on_user_seek_end(0.5).await;

    assert_eq!(h.api.count("seek"), 0);
    assert_eq!(h.sync.snapshot().progress_ms, 1_000);
    assert!(!h.sync.guard().seeking_progress());
    assert_eq!(h.drain()[0].level, NoticeLevel::Warning);
}

#[tokio::test]
async fn test_toggle_follows_snapshot() {
    let h = Harness::new(Remote::default());
    h.sync.refresh().await.unwrap();

    h.sync.toggle_play_pause().await.unwrap();
    assert_eq!(h.api.count("pause"), 1);
    assert!(!h.sync.snapshot().is_playing);

    h.sync.toggle_play_pause().await.unwrap();
    assert_eq!(h.api.count("resume"), 1);
    assert!(h.sync.snapshot().is_playing);
}

#[tokio::test]
async fn test_skip_next_refreshes_track() {
    let h = Harness::new(Remote::default());
    h.sync.refresh().await.unwrap();

    h.sync.skip_next().await.unwrap();

    let snapshot = h.sync.snapshot();
    assert_eq!(snapshot.track_id, "track-2");
    assert_eq!(snapshot.track_name, "Second Song");
    assert_eq!(snapshot.progress_ms, 0);
}

#[tokio::test]
async fn test_no_track_goes_idle_once() {
    let mut h = Harness::new(Remote::default());
    h.sync.refresh().await.unwrap();

    h.api.set(|r| r.track = None);
    assert_eq!(h.sync.refresh().await, Err(PlaybackError::NoTrack));

    let snapshot = h.sync.snapshot();
    assert!(snapshot.is_idle());
    assert!(!snapshot.is_playing);
    assert!(!h.sync.is_ticking());

    // Staying idle does not repeat the notice
    let _ = h.sync.refresh().await;
    let notices = h.drain();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].level, NoticeLevel::Info);
    assert_eq!(notices[0].message, PlaybackError::NoTrack.to_string());
}

#[tokio::test]
async fn test_seek_latch_survives_no_track() {
    let mut h = Harness::new(Remote {
        progress_ms: 120_000,
        ..Remote::default()
    });
    h.sync.refresh().await.unwrap();

    h.sync.on_user_seek_start();
    h.api.set(|r| r.track = None);
    assert_eq!(h.sync.refresh().await, Err(PlaybackError::NoTrack));

    // Track details are cleared but the dragged position is not
    let snapshot = h.sync.snapshot();
    assert_eq!(snapshot.progress_ms, 120_000);
    assert_eq!(snapshot.duration_ms, 200_000);
    assert!(snapshot.track_id.is_empty());
    assert!(!snapshot.is_playing);
    assert!(!h.sync.is_ticking());

    // A second idle poll while still dragging changes nothing
    let _ = h.sync.refresh().await;
    assert_eq!(h.sync.snapshot().progress_ms, 120_000);

    h.sync.on_user_seek_cancel();
    let _ = h.sync.refresh().await;
    let snapshot = h.sync.snapshot();
    assert!(snapshot.is_idle());
    assert_eq!(snapshot.progress_ms, 0);

    // One notice for the transition into idle
    assert_eq!(h.drain().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_slow_api_times_out_as_transient() {
    let mut h = Harness::new(Remote::default());
    let before = h.sync.refresh().await.unwrap();

    // Longer than the default request timeout
    h.api.set_delay(Duration::from_secs(30));
    h.api.set(|r| r.progress_ms = 50_000);

    match h.sync.refresh().await {
        Err(PlaybackError::TransientNetwork(msg)) => assert!(msg.contains("no response within")),
        other => panic!("expected timeout, got {:?}", other),
    }
    assert_eq!(h.sync.snapshot(), before);
    assert!(h.drain().is_empty());
}

#[tokio::test]
async fn test_transient_error_keeps_snapshot() {
    let mut h = Harness::new(Remote::default());
    let before = h.sync.refresh().await.unwrap();

    h.api
        .fail_reads(Some(PlaybackError::TransientNetwork("bad gateway".to_string())));
    h.api.set(|r| r.progress_ms = 42_000);

    assert!(matches!(
        h.sync.refresh().await,
        Err(PlaybackError::TransientNetwork(_))
    ));
    assert_eq!(h.sync.snapshot(), before);
    assert!(h.drain().is_empty());
}

#[tokio::test]
async fn test_auth_expired_requests_renewal() {
    let h = Harness::new(Remote::default());
    let before = h.sync.refresh().await.unwrap();

    h.api.fail_reads(Some(PlaybackError::AuthExpired));
    assert_eq!(h.sync.refresh().await, Err(PlaybackError::AuthExpired));
    assert_eq!(h.sync.snapshot(), before);

    tokio::time::timeout(Duration::from_secs(1), h.renewal.requested())
        .await
        .expect("renewal should have been requested");
}

#[tokio::test]
async fn test_session_started_refreshes_without_renewal() {
    let h = Harness::new(Remote::default());

    h.sync.session_started().await;
    assert_eq!(h.sync.snapshot().track_id, "track-1");

    h.api.fail_reads(Some(PlaybackError::AuthExpired));
    h.sync.session_started().await;

    let renewed = tokio::time::timeout(Duration::from_millis(50), h.renewal.requested()).await;
    assert!(renewed.is_err());
}

#[tokio::test(start_paused = true)]
async fn test_refreshes_are_single_flight() {
    let h = Harness::new(Remote::default());
    h.api.set_delay(Duration::from_millis(100));

    let (first, second) = tokio::join!(h.sync.refresh(), h.sync.refresh());
    assert!(first.is_ok());
    assert!(second.is_ok());
    assert_eq!(h.api.max_in_flight.load(Ordering::SeqCst), 1);

    // A tick arriving mid-refresh is skipped
    let (forced, tick) = tokio::join!(h.sync.refresh(), async {
        tokio::task::yield_now().await;
        h.sync.try_refresh().await
    });
    assert!(forced.is_ok());
    assert!(tick.is_none());
    assert_eq!(h.api.count("current_playback"), 3);
}

#[tokio::test(start_paused = true)]
async fn test_refresh_started_before_gesture_is_dropped() {
    let h = Harness::new(Remote::default());
    h.sync.refresh().await.unwrap();

    // The remote moves on; a slow tick captures that state
    h.api.set(|r| r.progress_ms = 2_000);
    h.api.set_delay(Duration::from_millis(100));

    let sync = Arc::clone(&h.sync);
    let tick = tokio::spawn(async move { sync.try_refresh().await });
    tokio::task::yield_now().await;

    h.sync.on_user_seek_start();
    let target = h.sync.on_user_seek_end(0.5).await;
    assert_eq!(target, 100_000);

    let stale = tick.await.unwrap().expect("tick should have run");
    assert_eq!(stale.unwrap().progress_ms, 1_000);
    assert_eq!(h.sync.snapshot().progress_ms, 100_000);
}

#[tokio::test(start_paused = true)]
async fn test_always_refresh_tick_fetches() {
    let h = Harness::new(Remote::default());
    h.sync.refresh().await.unwrap();

    h.sync.on_tick().await;
    h.sync.on_tick().await;

    assert_eq!(h.api.count("current_playback"), 3);
}

#[tokio::test(start_paused = true)]
async fn test_extrapolate_advances_locally_then_resyncs() {
    let h = Harness::with_strategy(
        Remote::default(),
        RefreshStrategy::Extrapolate {
            resync_every: Duration::from_secs(5),
        },
    );
    h.sync.refresh().await.unwrap();

    tokio::time::advance(Duration::from_secs(1)).await;
    h.sync.on_tick().await;
    assert_eq!(h.sync.snapshot().progress_ms, 2_000);
    assert_eq!(h.api.count("current_playback"), 1);

    tokio::time::advance(Duration::from_secs(5)).await;
    h.sync.on_tick().await;
    assert_eq!(h.api.count("current_playback"), 2);

    // Remote did not move, so the resync pulls progress back
    assert_eq!(h.sync.snapshot().progress_ms, 1_000);
}

#[tokio::test(start_paused = true)]
async fn test_extrapolate_holds_while_seeking() {
    let h = Harness::with_strategy(
        Remote::default(),
        RefreshStrategy::Extrapolate {
            resync_every: Duration::from_secs(5),
        },
    );
    h.sync.refresh().await.unwrap();

    h.sync.on_user_seek_start();
    tokio::time::advance(Duration::from_secs(2)).await;
    h.sync.on_tick().await;

    assert_eq!(h.sync.snapshot().progress_ms, 1_000);
}

#[tokio::test(start_paused = true)]
async fn test_extrapolate_resyncs_at_track_end() {
    let h = Harness::with_strategy(
        Remote {
            progress_ms: 199_500,
            ..Remote::default()
        },
        RefreshStrategy::Extrapolate {
            resync_every: Duration::from_secs(5),
        },
    );
    h.sync.refresh().await.unwrap();

    h.api.set(|r| {
        r.track = Some(("track-2".to_string(), "Second Song".to_string()));
        r.progress_ms = 500;
    });
    tokio::time::advance(Duration::from_secs(1)).await;
    h.sync.on_tick().await;

    assert_eq!(h.api.count("current_playback"), 2);
    assert_eq!(h.sync.snapshot().track_id, "track-2");
}

#[tokio::test(start_paused = true)]
async fn test_ticks_run_only_while_playing() {
    let h = Harness::new(Remote::default());

    let sync = Arc::clone(&h.sync);
    let ticks = tokio::spawn(async move { sync.run_ticks().await });

    // Nothing committed yet, so nothing ticks
    tokio::time::sleep(Duration::from_millis(3_500)).await;
    assert_eq!(h.api.count("current_playback"), 0);

    h.sync.refresh().await.unwrap();
    tokio::time::sleep(Duration::from_millis(3_500)).await;
    assert_eq!(h.api.count("current_playback"), 4);

    h.api.set(|r| r.is_playing = false);
    tokio::time::sleep(Duration::from_millis(1_000)).await;
    let after_pause = h.api.count("current_playback");
    tokio::time::sleep(Duration::from_millis(5_000)).await;
    assert_eq!(h.api.count("current_playback"), after_pause);

    ticks.abort();
}
