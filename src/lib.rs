//! Minify, a tiny Spotify remote.
//!
//! This library mirrors the playback state of the user's Spotify account and
//! forwards play, pause, skip, seek and volume commands to the Spotify Web API.
//! The interesting part lives in [`playback`]: a synchronizer that owns the
//! locally displayed snapshot, decides when to poll and when to extrapolate,
//! and keeps user drags from being overwritten by in-flight refreshes.
//!
//! # Modules
//!
//! - `api` - HTTP handlers for the local OAuth callback listener
//! - `cli` - Command-line front-end (the presentation surface)
//! - `config` - Environment-backed configuration and runtime settings
//! - `error` - Error taxonomy shared by all layers
//! - `management` - Token persistence, session handle and credential lifecycle
//! - `playback` - Gateway, interaction guard, snapshot and synchronizer
//! - `server` - One-shot local listener for the OAuth redirect
//! - `spotify` - Spotify Web API client and OAuth exchange
//! - `types` - Wire and domain data structures
//! - `utils` - PKCE helpers, time formatting and ratio math

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod management;
pub mod playback;
pub mod server;
pub mod spotify;
pub mod types;
pub mod utils;

/// Prints an informational message with a blue bullet point.
///
/// # Example
///
/// ```
/// info!("Waiting for Spotify login...");
/// info!("Now playing {}", name);
/// ```
#[macro_export]
macro_rules! info {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "o".blue().bold(), std::format_args!($($arg)*));
  })
}

/// Prints a success message with a green checkmark.
///
/// # Example
///
/// ```
/// success!("Authentication completed successfully");
/// ```
#[macro_export]
macro_rules! success {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "✓".green().bold(), std::format_args!($($arg)*));
  })
}

/// Prints an error message with a red exclamation mark and exits the program.
///
/// Only the CLI entry points use this, for configuration problems that leave
/// nothing to run. Playback and authentication failures are never fatal and
/// go through [`warning!`] or the notice channel instead.
///
/// # Example
///
/// ```
/// error!("Missing required environment variable: {}", var_name);
/// // Program exits here - code after this will not execute
/// ```
#[macro_export]
macro_rules! error {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "!".red().bold(), std::format_args!($($arg)*));
    std::process::exit(1);
  })
}

/// Prints a warning message with a yellow exclamation mark.
///
/// # Example
///
/// ```
/// warning!("No active device found. Start playback on a device first.");
/// ```
#[macro_export]
macro_rules! warning {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "!".yellow().bold(), std::format_args!($($arg)*));
  })
}
