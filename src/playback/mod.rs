//! # Playback
//!
//! The part of Minify with real state-transition concerns.
//!
//! ```text
//! gesture / tick ──► Synchronizer ──► PlaybackGateway ──► PlaybackApi
//!                        │
//!                        └──► watch::Sender<PlaybackSnapshot> ──► surface
//! ```
//!
//! - [`PlaybackSnapshot`] is the displayed state
//! - [`InteractionGuard`] holds the drag latches owned by the surface
//! - [`PlaybackGateway`] enforces the active-device precondition and timeouts
//! - [`Synchronizer`] decides between fetching and extrapolating, applies the
//!   failure policy and keeps refreshes single-flight

use std::time::Duration;

mod gateway;
mod guard;
mod snapshot;
mod sync;

pub use gateway::PlaybackGateway;
pub use guard::InteractionGuard;
pub use guard::Latches;
pub use snapshot::PlaybackSnapshot;
pub use sync::Synchronizer;

/// What a progress tick does while playing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RefreshStrategy {
    /// Re-fetch the remote state on every tick.
    #[default]
    AlwaysRefresh,
    /// Advance progress with the local clock, re-fetching every
    /// `resync_every` or when the track runs out.
    Extrapolate { resync_every: Duration },
}
