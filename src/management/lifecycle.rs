use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use tokio::{
    sync::{Mutex, watch},
    time::{Instant, MissedTickBehavior},
};

use crate::{
    error::AuthError,
    management::{RenewalSignal, Session, SessionHandle, TokenStore},
    spotify::AuthProvider,
    types::{Credential, Notice, NoticeSender},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    Unauthenticated,
    Authenticating,
    Authenticated,
    Expiring,
}

/// Told about every freshly installed session.
#[async_trait]
pub trait SessionListener: Send + Sync {
    async fn session_started(&self);
}

/// Owns the credential: startup, periodic renewal and re-login.
///
/// All transitions run under one mutex, so the renewal timer and renewal
/// requests raised by expired responses never overlap.
pub struct TokenLifecycle<P> {
    provider: P,
    store: TokenStore,
    session: SessionHandle,
    renewal: RenewalSignal,
    renew_interval: Duration,
    state: watch::Sender<AuthState>,
    notices: Option<NoticeSender>,
    listener: Option<Arc<dyn SessionListener>>,
    transition: Mutex<()>,
}

impl<P: AuthProvider> TokenLifecycle<P> {
    pub fn new(
        provider: P,
        store: TokenStore,
        session: SessionHandle,
        renewal: RenewalSignal,
        renew_interval: Duration,
    ) -> Self {
        let (state, _) = watch::channel(AuthState::Unauthenticated);
        Self {
            provider,
            store,
            session,
            renewal,
            renew_interval,
            state,
            notices: None,
            listener: None,
            transition: Mutex::new(()),
        }
    }

    pub fn with_notices(mut self, notices: NoticeSender) -> Self {
        self.notices = Some(notices);
        self
    }

    pub fn with_listener(mut self, listener: Arc<dyn SessionListener>) -> Self {
        self.listener = Some(listener);
        self
    }

    pub fn state(&self) -> AuthState {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    pub fn session(&self) -> &SessionHandle {
        &self.session
    }

    /// Restores the persisted credential by refreshing it, or logs in when
    /// there is none.
    ///
    /// # Behavior
    ///
    /// 1. **Stored credential**: its refresh token is exchanged right away, so
    ///    no browser is opened for a returning user
    /// 2. **Refresh rejected**: a `Token Error` warning goes to the notice
    ///    channel and the interactive login runs instead
    /// 3. **No stored credential**: the interactive login runs; the refresh
    ///    endpoint is never called
    ///
    /// On success the credential is persisted, the session replaced and the
    /// listener told about it.
    ///
    /// # Errors
    ///
    /// The login error when no session could be established. The state is
    /// then [`AuthState::Unauthenticated`].
    pub async fn start(&self) -> Result<(), AuthError> {
        let _guard = self.transition.lock().await;

        let Some(stored) = self.store.load().await else {
            tracing::debug!("no stored credential, starting login");
            return self.login().await;
        };

        match self.provider.refresh(&stored.refresh_token).await {
            Ok(credential) => {
                self.install(credential).await;
                Ok(())
            }
            Err(e) => {
                self.notify(Notice::warning(format!("Token Error: {}", e)));
                self.login().await
            }
        }
    }

    /// Runs the interactive login regardless of any stored credential.
    pub async fn authenticate(&self) -> Result<(), AuthError> {
        let _guard = self.transition.lock().await;
        self.login().await
    }

    /// Renews the current credential; falls back to a full login on failure.
    ///
    /// The refresh token comes from the live session, or from the token file
    /// when there is no session yet. Without either, this is a plain login.
    /// While the exchange runs the state is [`AuthState::Expiring`].
    ///
    /// Expiry reports raised through the [`RenewalSignal`] before this renewal
    /// completes are discarded, since the new credential already answers them.
    ///
    /// # Errors
    ///
    /// The login error when both the refresh and the fallback login failed.
    pub async fn renew(&self) -> Result<(), AuthError> {
        let _guard = self.transition.lock().await;

        let refresh_token = match self.session.current() {
            Some(session) => Some(session.credential().refresh_token.clone()),
            None => self.store.load().await.map(|c| c.refresh_token),
        }
        .filter(|t| !t.is_empty());

        let Some(refresh_token) = refresh_token else {
            return self.login().await;
        };

        self.state.send_replace(AuthState::Expiring);
        match self.provider.refresh(&refresh_token).await {
            Ok(credential) => {
                self.install(credential).await;
                Ok(())
            }
            Err(e) => {
                tracing::warn!("token renewal failed: {}", e);
                self.notify(Notice::warning(format!("Token Error: {}", e)));
                self.login().await
            }
        }
    }

    /// Renewal loop: fires every `renew_interval` and whenever a renewal is
    /// requested through the [`RenewalSignal`]. Never returns.
    pub async fn run(&self) {
        let mut timer = tokio::time::interval_at(
            Instant::now() + self.renew_interval,
            self.renew_interval,
        );
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = timer.tick() => tracing::debug!("scheduled token renewal"),
                _ = self.renewal.requested() => tracing::debug!("token renewal requested"),
            }

            if let Err(e) = self.renew().await {
                tracing::warn!("renewal ended unauthenticated: {}", e);
            }
        }
    }

    async fn login(&self) -> Result<(), AuthError> {
        self.state.send_replace(AuthState::Authenticating);

        match self.provider.login().await {
            Ok(credential) => {
                self.install(credential).await;
                self.notify(Notice::info("Authenticated!"));
                Ok(())
            }
            Err(e) => {
                self.session.clear();
                self.state.send_replace(AuthState::Unauthenticated);
                self.notify(Notice::warning(format!("Login failed: {}", e)));
                Err(e)
            }
        }
    }

    async fn install(&self, credential: Credential) {
        if let Err(e) = self.store.save(&credential).await {
            tracing::warn!("{}", e);
        }

        self.session.replace(Session::new(credential));
        self.state.send_replace(AuthState::Authenticated);

        if let Some(listener) = &self.listener {
            listener.session_started().await;
        }

        // expiry reports raised so far were about the replaced token
        self.renewal.settle();
    }

    fn notify(&self, notice: Notice) {
        if let Some(tx) = &self.notices {
            let _ = tx.send(notice);
        }
    }
}
