use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;

use crate::{
    config,
    error::{PlaybackError, Result},
    management::SessionHandle,
    spotify::PlaybackApi,
    types::{CurrentPlayback, CurrentlyPlaying, Device, DevicesResponse},
};

/// reqwest-backed [`PlaybackApi`] that signs every call with the current session.
///
/// The bearer token is read from the [`SessionHandle`] per request, so a
/// renewal takes effect on the next call without rebuilding the client.
#[derive(Clone)]
pub struct WebApiClient {
    client: Client,
    session: SessionHandle,
    base_url: String,
}

impl WebApiClient {
    pub fn new(session: SessionHandle, timeout: Duration) -> Self {
        Self::with_base_url(session, timeout, config::spotify_apiurl())
    }

    pub fn with_base_url(session: SessionHandle, timeout: Duration, base_url: String) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            session,
            base_url,
        }
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder> {
        let Some(session) = self.session.current() else {
            return Err(PlaybackError::AuthExpired);
        };

        let url = format!("{uri}{path}", uri = self.base_url, path = path);
        Ok(self
            .client
            .request(method, url)
            .bearer_auth(session.access_token()))
    }

    async fn read<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>> {
        let response = self.request(Method::GET, path)?.send().await?;
        let response = check_status(response).await?;

        if response.status() == StatusCode::NO_CONTENT {
            return Ok(None);
        }

        let body = response.bytes().await?;
        if body.is_empty() {
            return Ok(None);
        }

        serde_json::from_slice(&body)
            .map(Some)
            .map_err(|e| PlaybackError::TransientNetwork(format!("malformed response: {}", e)))
    }

    async fn control(&self, method: Method, path: &str) -> Result<()> {
        let response = self
            .request(method, path)?
            .header(reqwest::header::CONTENT_LENGTH, "0")
            .send()
            .await?;
        check_status(response).await.map(|_| ())
    }
}

/// Maps Spotify's status codes onto the playback error taxonomy.
async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("?")
            .to_string();
        return Err(PlaybackError::TransientNetwork(format!(
            "rate limited, retry after {}s",
            retry_after
        )));
    }

    let message = response
        .json::<serde_json::Value>()
        .await
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| status.to_string());

    Err(classify(status, message))
}

pub(crate) fn classify(status: StatusCode, message: String) -> PlaybackError {
    match status {
        StatusCode::UNAUTHORIZED => PlaybackError::AuthExpired,
        StatusCode::NOT_FOUND if message.to_ascii_lowercase().contains("device") => {
            PlaybackError::NoActiveDevice
        }
        s if s.is_server_error() => PlaybackError::TransientNetwork(message),
        _ => PlaybackError::Rejected(message),
    }
}

#[async_trait]
impl PlaybackApi for WebApiClient {
    async fn devices(&self) -> Result<Vec<Device>> {
        let devices: Option<DevicesResponse> = self.read("/me/player/devices").await?;
        Ok(devices.map(|d| d.devices).unwrap_or_default())
    }

    async fn currently_playing(&self) -> Result<Option<CurrentlyPlaying>> {
        self.read("/me/player/currently-playing").await
    }

    async fn current_playback(&self) -> Result<Option<CurrentPlayback>> {
        self.read("/me/player").await
    }

    async fn resume(&self) -> Result<()> {
        self.control(Method::PUT, "/me/player/play").await
    }

    async fn pause(&self) -> Result<()> {
        self.control(Method::PUT, "/me/player/pause").await
    }

    async fn skip_next(&self) -> Result<()> {
        self.control(Method::POST, "/me/player/next").await
    }

    async fn skip_previous(&self) -> Result<()> {
        self.control(Method::POST, "/me/player/previous").await
    }

    async fn seek(&self, position_ms: u64) -> Result<()> {
        let path = format!("/me/player/seek?position_ms={}", position_ms);
        self.control(Method::PUT, &path).await
    }

    async fn set_volume(&self, percent: u8) -> Result<()> {
        let path = format!("/me/player/volume?volume_percent={}", percent.min(100));
        self.control(Method::PUT, &path).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_maps_statuses() {
        assert_eq!(
            classify(StatusCode::UNAUTHORIZED, "expired".into()),
            PlaybackError::AuthExpired
        );
        assert_eq!(
            classify(StatusCode::NOT_FOUND, "Player command failed: No active device found".into()),
            PlaybackError::NoActiveDevice
        );
        assert!(matches!(
            classify(StatusCode::BAD_GATEWAY, "upstream".into()),
            PlaybackError::TransientNetwork(_)
        ));
        assert_eq!(
            classify(StatusCode::FORBIDDEN, "Premium required".into()),
            PlaybackError::Rejected("Premium required".into())
        );
    }

    #[tokio::test]
    async fn missing_session_is_auth_expired() {
        let client = WebApiClient::with_base_url(
            SessionHandle::new(),
            Duration::from_secs(1),
            "http://127.0.0.1:9".to_string(),
        );
        assert_eq!(client.pause().await, Err(PlaybackError::AuthExpired));
    }
}
