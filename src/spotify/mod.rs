//! # Spotify integration
//!
//! Two collaborators live here:
//!
//! - [`player`] - the Web API player endpoints behind the [`PlaybackApi`] trait
//! - [`auth`] - OAuth 2.0 PKCE login and the refresh exchange behind
//!   [`auth::AuthProvider`]
//!
//! Everything above this layer talks to the traits, which keeps the
//! synchronizer and the lifecycle manager testable without a network.

use async_trait::async_trait;

use crate::{
    error::Result,
    types::{CurrentPlayback, CurrentlyPlaying, Device},
};

pub mod auth;
pub mod player;

pub use auth::{AuthProvider, SpotifyAuth};
pub use player::WebApiClient;

/// The subset of the Spotify player API the application needs.
///
/// Reads return `Ok(None)` when Spotify answers with no content (nothing is
/// playing). Errors follow [`crate::error::PlaybackError`]: `AuthExpired` for
/// rejected tokens, `TransientNetwork` for anything worth retrying later.
#[async_trait]
pub trait PlaybackApi: Send + Sync {
    async fn devices(&self) -> Result<Vec<Device>>;
    async fn currently_playing(&self) -> Result<Option<CurrentlyPlaying>>;
    async fn current_playback(&self) -> Result<Option<CurrentPlayback>>;
    async fn resume(&self) -> Result<()>;
    async fn pause(&self) -> Result<()>;
    async fn skip_next(&self) -> Result<()>;
    async fn skip_previous(&self) -> Result<()>;
    async fn seek(&self, position_ms: u64) -> Result<()>;
    async fn set_volume(&self, percent: u8) -> Result<()>;
}
