use thiserror::Error;

/// Failures of playback reads and commands.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlaybackError {
    #[error("No active device found. Please start playback on a device first.")]
    NoActiveDevice,

    #[error("No track is currently playing.")]
    NoTrack,

    #[error("Access token expired or was rejected")]
    AuthExpired,

    #[error("Network error: {0}")]
    TransientNetwork(String),

    #[error("Failed to persist token: {0}")]
    TokenPersistence(String),

    #[error("Spotify rejected the request: {0}")]
    Rejected(String),
}

impl From<reqwest::Error> for PlaybackError {
    fn from(err: reqwest::Error) -> Self {
        if err.status() == Some(reqwest::StatusCode::UNAUTHORIZED) {
            return PlaybackError::AuthExpired;
        }
        PlaybackError::TransientNetwork(err.to_string())
    }
}

/// Failures of the OAuth login and refresh exchanges.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Missing configuration: {0}")]
    MissingConfig(String),

    #[error("Could not start callback listener: {0}")]
    Listener(String),

    #[error("Login timed out before Spotify redirected back")]
    TimedOut,

    #[error("Authorization denied: {0}")]
    Denied(String),

    #[error("OAuth state mismatch in callback")]
    StateMismatch,

    #[error("Token exchange failed: {0}")]
    Exchange(String),

    #[error("Token refresh failed: {0}")]
    Refresh(String),
}

pub type Result<T> = std::result::Result<T, PlaybackError>;
