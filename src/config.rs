//! Configuration management for Minify.
//!
//! Endpoint and credential values come from environment variables, optionally
//! loaded from a `.env` file in the local data directory. Every endpoint has a
//! Spotify default, so only the client id is strictly required.
//!
//! Runtime knobs for the synchronizer and the credential lifecycle live in
//! [`Settings`], which is read once at startup.

use std::{env, path::PathBuf, str::FromStr, time::Duration};

use crate::playback::RefreshStrategy;

const DEFAULT_SERVER_ADDRESS: &str = "127.0.0.1:5000";
const DEFAULT_REDIRECT_URI: &str = "http://127.0.0.1:5000/callback";
const DEFAULT_SCOPE: &str =
    "user-read-playback-state user-modify-playback-state user-read-currently-playing";
const DEFAULT_AUTH_URL: &str = "https://accounts.spotify.com/authorize";
const DEFAULT_API_URL: &str = "https://api.spotify.com/v1";
const DEFAULT_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";

/// Returns the application directory inside the platform's local data dir.
///
/// - Linux: `~/.local/share/minify`
/// - macOS: `~/Library/Application Support/minify`
/// - Windows: `%LOCALAPPDATA%/minify`
pub fn app_dir() -> PathBuf {
    let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("minify");
    path
}

/// Loads environment variables from `<app_dir>/.env`.
///
/// Creates the application directory if needed. A missing `.env` file is not
/// an error, since plain environment variables work just as well; a file that
/// exists but cannot be parsed is reported.
pub async fn load_env() -> Result<(), String> {
    let path = app_dir().join(".env");
    if let Some(parent) = path.parent() {
        async_fs::create_dir_all(parent)
            .await
            .map_err(|e| e.to_string())?;
    }

    match dotenv::from_path(&path) {
        Ok(()) => Ok(()),
        Err(dotenv::Error::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(format!("{}: {}", path.display(), e)),
    }
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

/// Address the OAuth callback listener binds to, e.g. `127.0.0.1:5000`.
pub fn server_addr() -> String {
    var_or("SERVER_ADDRESS", DEFAULT_SERVER_ADDRESS)
}

/// Spotify application client id.
///
/// This is the only value without a default; it has to come from the user's
/// registration on the Spotify developer dashboard.
pub fn spotify_client_id() -> Result<String, String> {
    env::var("SPOTIFY_API_AUTH_CLIENT_ID")
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| "SPOTIFY_API_AUTH_CLIENT_ID must be set".to_string())
}

/// Redirect URI registered for the application. Must point at [`server_addr`].
pub fn spotify_redirect_uri() -> String {
    var_or("SPOTIFY_API_REDIRECT_URI", DEFAULT_REDIRECT_URI)
}

/// Space-separated OAuth scopes requested at login.
pub fn spotify_scope() -> String {
    var_or("SPOTIFY_API_AUTH_SCOPE", DEFAULT_SCOPE)
}

/// Authorization endpoint the browser is sent to.
pub fn spotify_apiauth_url() -> String {
    var_or("SPOTIFY_API_AUTH_URL", DEFAULT_AUTH_URL)
}

/// Base URL of the Web API, without trailing slash.
pub fn spotify_apiurl() -> String {
    var_or("SPOTIFY_API_URL", DEFAULT_API_URL)
        .trim_end_matches('/')
        .to_string()
}

/// Token endpoint used for code and refresh exchanges.
pub fn spotify_apitoken_url() -> String {
    var_or("SPOTIFY_API_TOKEN_URL", DEFAULT_TOKEN_URL)
}

/// Timing knobs for the synchronizer and the credential lifecycle.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Local progress tick while playing.
    pub tick_interval: Duration,
    /// Whether ticks re-fetch remote state or extrapolate locally.
    pub refresh_strategy: RefreshStrategy,
    /// Period of the credential renewal timer. Access tokens live 60 minutes.
    pub renew_interval: Duration,
    /// Upper bound for any single remote call.
    pub request_timeout: Duration,
    /// How long the login flow waits for the browser redirect.
    pub login_timeout: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(1),
            refresh_strategy: RefreshStrategy::AlwaysRefresh,
            renew_interval: Duration::from_secs(55 * 60),
            request_timeout: Duration::from_secs(10),
            login_timeout: Duration::from_secs(60),
        }
    }
}

impl Settings {
    /// Reads the `MINIFY_*` variables, falling back to defaults for anything
    /// missing or unparseable.
    ///
    /// | Variable | Default |
    /// |---|---|
    /// | `MINIFY_TICK_MILLIS` | 1000 |
    /// | `MINIFY_REFRESH_STRATEGY` | `always` (or `extrapolate`) |
    /// | `MINIFY_RESYNC_SECS` | 5 |
    /// | `MINIFY_TOKEN_RENEW_MINUTES` | 55 |
    /// | `MINIFY_REQUEST_TIMEOUT_SECS` | 10 |
    /// | `MINIFY_LOGIN_TIMEOUT_SECS` | 60 |
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let resync_every = Duration::from_secs(parse_var("MINIFY_RESYNC_SECS").unwrap_or(5));
        let refresh_strategy = match env::var("MINIFY_REFRESH_STRATEGY")
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase()
            .as_str()
        {
            "extrapolate" => RefreshStrategy::Extrapolate { resync_every },
            _ => RefreshStrategy::AlwaysRefresh,
        };

        Self {
            tick_interval: parse_var("MINIFY_TICK_MILLIS")
                .filter(|ms: &u64| *ms > 0)
                .map(Duration::from_millis)
                .unwrap_or(defaults.tick_interval),
            refresh_strategy,
            renew_interval: parse_var("MINIFY_TOKEN_RENEW_MINUTES")
                .filter(|m: &u64| *m > 0)
                .map(|m| Duration::from_secs(m * 60))
                .unwrap_or(defaults.renew_interval),
            request_timeout: parse_var("MINIFY_REQUEST_TIMEOUT_SECS")
                .filter(|s: &u64| *s > 0)
                .map(Duration::from_secs)
                .unwrap_or(defaults.request_timeout),
            login_timeout: parse_var("MINIFY_LOGIN_TIMEOUT_SECS")
                .filter(|s: &u64| *s > 0)
                .map(Duration::from_secs)
                .unwrap_or(defaults.login_timeout),
        }
    }
}

fn parse_var<T: FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.trim().parse().ok())
}
