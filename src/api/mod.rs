//! # API Module
//!
//! Handlers served by the short-lived local listener that receives the OAuth
//! redirect during login.
//!
//! - `GET /callback` - receives `code` and `state` from Spotify and hands the
//!   code to the waiting login flow
//! - `GET /health` - liveness check reporting the crate version

mod callback;
mod health;

pub use callback::CallbackState;
pub use callback::callback;
pub use health::health;
