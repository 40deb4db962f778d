use std::{net::SocketAddr, str::FromStr, time::Duration};

use async_trait::async_trait;
use reqwest::{Client, Url};

use crate::{
    config,
    error::AuthError,
    server::CallbackListener,
    types::{Credential, PkceToken, TokenResponse},
    utils, warning,
};

/// The OAuth side of Spotify: interactive login and refresh-token exchange.
///
/// [`TokenLifecycle`](crate::management::TokenLifecycle) drives an
/// implementation of this trait and owns everything around it: persistence,
/// the shared session and the renewal schedule. Implementations only talk to
/// the authorization server.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Runs the interactive authorization-code flow.
    ///
    /// # Returns
    ///
    /// A credential holding both the access token and the refresh token.
    ///
    /// # Errors
    ///
    /// - [`AuthError::Listener`] when the redirect listener cannot be bound
    /// - [`AuthError::TimedOut`] when the user does not finish in time
    /// - [`AuthError::Denied`] or [`AuthError::StateMismatch`] for a rejected
    ///   or forged redirect
    /// - [`AuthError::Exchange`] when the code cannot be traded for tokens
    async fn login(&self) -> Result<Credential, AuthError>;

    /// Exchanges a refresh token for a fresh credential.
    ///
    /// # Arguments
    ///
    /// * `refresh_token` - The refresh token of the current credential
    ///
    /// # Returns
    ///
    /// The new credential. When Spotify does not rotate the refresh token, the
    /// one passed in is carried over.
    ///
    /// # Errors
    ///
    /// [`AuthError::Refresh`] for any transport or grant failure, including a
    /// revoked refresh token.
    async fn refresh(&self, refresh_token: &str) -> Result<Credential, AuthError>;
}

/// PKCE login against accounts.spotify.com with a local redirect listener.
pub struct SpotifyAuth {
    client: Client,
    client_id: String,
    redirect_uri: String,
    server_addr: String,
    auth_url: String,
    token_url: String,
    scope: String,
    login_timeout: Duration,
}

impl SpotifyAuth {
    /// Builds the provider from the environment (see [`config`]).
    ///
    /// # Arguments
    ///
    /// * `login_timeout` - How long [`login`](AuthProvider::login) waits for
    ///   the browser redirect
    ///
    /// # Errors
    ///
    /// [`AuthError::MissingConfig`] when `SPOTIFY_API_AUTH_CLIENT_ID` is unset.
    pub fn from_env(login_timeout: Duration) -> Result<Self, AuthError> {
        let client_id = config::spotify_client_id().map_err(AuthError::MissingConfig)?;

        Ok(Self {
            client: Client::new(),
            client_id,
            redirect_uri: config::spotify_redirect_uri(),
            server_addr: config::server_addr(),
            auth_url: config::spotify_apiauth_url(),
            token_url: config::spotify_apitoken_url(),
            scope: config::spotify_scope(),
            login_timeout,
        })
    }

    /// Builds the authorization URL the user is sent to.
    ///
    /// # Arguments
    ///
    /// * `pkce` - Code challenge and `state` of this login attempt
    ///
    /// # Returns
    ///
    /// The configured auth URL with `client_id`, `response_type=code`,
    /// `redirect_uri`, the S256 `code_challenge`, `scope` and `state` as
    /// properly encoded query parameters.
    pub fn authorize_url(&self, pkce: &PkceToken) -> Result<Url, AuthError> {
        Url::parse_with_params(
            &self.auth_url,
            &[
                ("client_id", self.client_id.as_str()),
                ("response_type", "code"),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("code_challenge", pkce.code_challenge.as_str()),
                ("code_challenge_method", "S256"),
                ("scope", self.scope.as_str()),
                ("state", pkce.state.as_str()),
            ],
        )
        .map_err(|e| AuthError::MissingConfig(format!("invalid auth url: {}", e)))
    }

    async fn exchange_code_pkce(&self, code: &str, verifier: &str) -> Result<Credential, AuthError> {
        let res = self
            .client
            .post(&self.token_url)
            .form(&[
                ("grant_type", "authorization_code"),
                ("client_id", self.client_id.as_str()),
                ("code", code),
                ("code_verifier", verifier),
                ("redirect_uri", self.redirect_uri.as_str()),
            ])
            .send()
            .await
            .map_err(|e| AuthError::Exchange(e.to_string()))?;

        let res = res
            .error_for_status()
            .map_err(|e| AuthError::Exchange(e.to_string()))?;
        let token: TokenResponse = res
            .json()
            .await
            .map_err(|e| AuthError::Exchange(e.to_string()))?;

        Ok(token.into_credential(None))
    }
}

#[async_trait]
impl AuthProvider for SpotifyAuth {
    async fn login(&self) -> Result<Credential, AuthError> {
        let pkce = utils::new_pkce();

        let addr = SocketAddr::from_str(&self.server_addr)
            .map_err(|e| AuthError::MissingConfig(format!("SERVER_ADDRESS: {}", e)))?;
        let listener = CallbackListener::bind(addr, pkce.state.clone()).await?;

        let auth_url = self.authorize_url(&pkce)?;
        if webbrowser::open(auth_url.as_str()).is_err() {
            warning!(
                "Failed to open browser. Please navigate to the following URL manually:\n{}",
                auth_url
            )
        }

        let code = listener.wait(self.login_timeout).await?;
        self.exchange_code_pkce(&code, &pkce.code_verifier).await
    }

    async fn refresh(&self, refresh_token: &str) -> Result<Credential, AuthError> {
        let res = self
            .client
            .post(&self.token_url)
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
                ("client_id", self.client_id.as_str()),
            ])
            .send()
            .await
            .map_err(|e| AuthError::Refresh(e.to_string()))?;

        let res = res
            .error_for_status()
            .map_err(|e| AuthError::Refresh(e.to_string()))?;
        let token: TokenResponse = res
            .json()
            .await
            .map_err(|e| AuthError::Refresh(e.to_string()))?;

        Ok(token.into_credential(Some(refresh_token)))
    }
}
