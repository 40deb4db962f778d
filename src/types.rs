use serde::{Deserialize, Serialize};
use tabled::Tabled;

/// Persisted credential pair.
///
/// Stored on disk as `{"AccessToken": "...", "RefreshToken": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Credential {
    pub access_token: String,
    pub refresh_token: String,
}

/// Body of a successful `/api/token` response.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
}

impl TokenResponse {
    /// Builds a credential, keeping `previous_refresh` when the response
    /// carries no new refresh token.
    pub fn into_credential(self, previous_refresh: Option<&str>) -> Credential {
        let refresh_token = self
            .refresh_token
            .filter(|t| !t.is_empty())
            .or_else(|| previous_refresh.map(str::to_string))
            .unwrap_or_default();

        Credential {
            access_token: self.access_token,
            refresh_token,
        }
    }
}

/// PKCE parameters of one login attempt.
#[derive(Debug, Clone)]
pub struct PkceToken {
    pub code_verifier: String,
    pub code_challenge: String,
    pub state: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Device {
    pub id: Option<String>,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub is_active: bool,
    pub volume_percent: Option<u8>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DevicesResponse {
    pub devices: Vec<Device>,
}

#[derive(Tabled)]
pub struct DeviceTableRow {
    pub name: String,
    pub kind: String,
    pub active: String,
    pub volume: String,
}

impl From<&Device> for DeviceTableRow {
    fn from(device: &Device) -> Self {
        Self {
            name: device.name.clone(),
            kind: device.kind.clone(),
            active: if device.is_active { "yes" } else { "" }.to_string(),
            volume: device
                .volume_percent
                .map(|v| format!("{}%", v))
                .unwrap_or_else(|| "-".to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Image {
    pub url: String,
    pub height: Option<u32>,
    pub width: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackArtist {
    pub id: Option<String>,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackAlbum {
    pub name: String,
    #[serde(default)]
    pub images: Vec<Image>,
}

/// A full track object as returned in `item` of the player endpoints.
///
/// Episodes and local files deserialize into this too; the fields they lack
/// fall back to defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Track {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub artists: Vec<TrackArtist>,
    #[serde(default)]
    pub album: Option<TrackAlbum>,
    #[serde(default)]
    pub duration_ms: u64,
}

impl Track {
    /// Largest cover image, which Spotify lists first.
    pub fn cover_art_url(&self) -> Option<&str> {
        self.album
            .as_ref()
            .and_then(|a| a.images.first())
            .map(|i| i.url.as_str())
    }

    pub fn artist_names(&self) -> Vec<String> {
        self.artists.iter().map(|a| a.name.clone()).collect()
    }
}

/// `GET /me/player/currently-playing`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentlyPlaying {
    #[serde(default)]
    pub is_playing: bool,
    #[serde(default)]
    pub progress_ms: Option<u64>,
    #[serde(default)]
    pub item: Option<Track>,
}

/// `GET /me/player`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentPlayback {
    #[serde(default)]
    pub is_playing: bool,
    #[serde(default)]
    pub progress_ms: Option<u64>,
    #[serde(default)]
    pub device: Option<Device>,
    #[serde(default)]
    pub item: Option<Track>,
}

impl CurrentPlayback {
    pub fn duration_ms(&self) -> u64 {
        self.item.as_ref().map_or(0, |t| t.duration_ms)
    }

    pub fn volume_percent(&self) -> u8 {
        self.device
            .as_ref()
            .and_then(|d| d.volume_percent)
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
}

/// A non-fatal message for the presentation surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            message: message.into(),
        }
    }
}

pub type NoticeSender = tokio::sync::mpsc::UnboundedSender<Notice>;
pub type NoticeReceiver = tokio::sync::mpsc::UnboundedReceiver<Notice>;
