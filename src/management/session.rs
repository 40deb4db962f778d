use std::sync::{
    Arc, RwLock,
    atomic::{AtomicBool, Ordering},
};

use tokio::sync::Notify;

use crate::types::Credential;

/// An authenticated session. Immutable once built; renewal builds a new one.
#[derive(Debug, Clone)]
pub struct Session {
    credential: Credential,
}

impl Session {
    pub fn new(credential: Credential) -> Self {
        Self { credential }
    }

    pub fn access_token(&self) -> &str {
        &self.credential.access_token
    }

    pub fn credential(&self) -> &Credential {
        &self.credential
    }
}

/// Shared handle to the current session.
///
/// Readers clone out the inner `Arc<Session>` and keep using it even if a
/// renewal swaps in a newer one while their request is in flight.
#[derive(Debug, Clone, Default)]
pub struct SessionHandle {
    inner: Arc<RwLock<Option<Arc<Session>>>>,
}

impl SessionHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<Arc<Session>> {
        match self.inner.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn replace(&self, session: Session) -> Arc<Session> {
        let session = Arc::new(session);
        let mut guard = match self.inner.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = Some(Arc::clone(&session));
        session
    }

    pub fn clear(&self) {
        let mut guard = match self.inner.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = None;
    }
}

/// Wakes the credential lifecycle when a request was rejected as expired.
///
/// Requests raised while nobody is waiting are kept as one pending request, so
/// a burst of expired responses results in a single renewal. A renewal that
/// completes calls [`settle`](Self::settle), which drops every request raised
/// before that point: those were answered by the credential just installed.
#[derive(Debug, Clone, Default)]
pub struct RenewalSignal {
    notify: Arc<Notify>,
    pending: Arc<AtomicBool>,
}

impl RenewalSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&self) {
        self.pending.store(true, Ordering::SeqCst);
        self.notify.notify_one();
    }

    /// Resolves once a request is pending and consumes it.
    pub async fn requested(&self) {
        loop {
            if self.pending.swap(false, Ordering::SeqCst) {
                return;
            }
            self.notify.notified().await;
        }
    }

    /// Discards requests raised so far.
    pub fn settle(&self) {
        self.pending.store(false, Ordering::SeqCst);
    }
}
