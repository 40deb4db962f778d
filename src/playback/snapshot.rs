use chrono::{DateTime, Utc};

use crate::types::{CurrentPlayback, Track};

/// The locally displayed view of what Spotify is playing.
///
/// `progress_ms <= duration_ms` holds for every value built through this type's
/// constructors and mutators. A zero duration means nothing is loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackSnapshot {
    pub is_playing: bool,
    pub track_id: String,
    pub track_name: String,
    pub artist_names: Vec<String>,
    pub album_art_url: String,
    pub duration_ms: u64,
    pub progress_ms: u64,
    pub volume_percent: u8,
    pub captured_at: DateTime<Utc>,
}

impl Default for PlaybackSnapshot {
    fn default() -> Self {
        Self::idle()
    }
}

impl PlaybackSnapshot {
    pub fn idle() -> Self {
        Self {
            is_playing: false,
            track_id: String::new(),
            track_name: String::new(),
            artist_names: Vec::new(),
            album_art_url: String::new(),
            duration_ms: 0,
            progress_ms: 0,
            volume_percent: 0,
            captured_at: Utc::now(),
        }
    }

    /// Assembles a snapshot from the track and the playback state.
    ///
    /// Duration comes from the playback item when present, since that is the
    /// response progress was measured against; the track's own duration is the
    /// fallback.
    pub fn from_remote(track: &Track, playback: &CurrentPlayback) -> Self {
        let duration_ms = match playback.duration_ms() {
            0 => track.duration_ms,
            d => d,
        };

        Self {
            is_playing: playback.is_playing,
            track_id: track.id.clone().unwrap_or_default(),
            track_name: track.name.clone(),
            artist_names: track.artist_names(),
            album_art_url: track.cover_art_url().unwrap_or_default().to_string(),
            duration_ms,
            progress_ms: playback.progress_ms.unwrap_or(0).min(duration_ms),
            volume_percent: playback.volume_percent().min(100),
            captured_at: Utc::now(),
        }
    }

    pub fn is_idle(&self) -> bool {
        self.duration_ms == 0
    }

    pub fn artists_display(&self) -> String {
        if self.artist_names.is_empty() {
            return "Unknown Artist".to_string();
        }
        self.artist_names.join(", ")
    }

    pub fn progress_ratio(&self) -> f64 {
        if self.duration_ms == 0 {
            return 0.0;
        }
        self.progress_ms as f64 / self.duration_ms as f64
    }

    pub fn set_progress(&mut self, progress_ms: u64) {
        self.progress_ms = progress_ms.min(self.duration_ms);
    }

    /// Moves progress forward by locally measured time. Returns `true` once the
    /// end of the track is reached.
    pub fn advance(&mut self, elapsed_ms: u64) -> bool {
        if self.is_playing && !self.is_idle() {
            self.set_progress(self.progress_ms.saturating_add(elapsed_ms));
        }
        !self.is_idle() && self.progress_ms >= self.duration_ms
    }
}
