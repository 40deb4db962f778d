use std::{net::SocketAddr, sync::Arc, time::Duration};

use axum::{Extension, Router, routing::get};
use tokio::{sync::oneshot, task::JoinHandle};

use crate::{
    api::{self, CallbackState},
    error::AuthError,
};

/// Local HTTP listener that lives for exactly one OAuth redirect.
///
/// Bind it before sending the user to the browser, then [`wait`](Self::wait)
/// for the code. The server is shut down when the wait ends, and also when
/// the listener is dropped without waiting.
pub struct CallbackListener {
    local_addr: SocketAddr,
    code_rx: Option<oneshot::Receiver<Result<String, AuthError>>>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl CallbackListener {
    pub async fn bind(addr: SocketAddr, expected_state: String) -> Result<Self, AuthError> {
        let (code_tx, code_rx) = oneshot::channel();
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let state = Arc::new(CallbackState::new(expected_state, code_tx));

        let app = Router::new()
            .route("/health", get(api::health))
            .route("/callback", get(api::callback).layer(Extension(state)));

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| AuthError::Listener(format!("{}: {}", addr, e)))?;
        let local_addr = listener
            .local_addr()
            .map_err(|e| AuthError::Listener(e.to_string()))?;

        let handle = tokio::spawn(async move {
            let shutdown = async {
                let _ = shutdown_rx.await;
            };
            if let Err(e) = axum::serve(listener, app)
                .with_graceful_shutdown(shutdown)
                .await
            {
                tracing::warn!("callback listener stopped with error: {}", e);
            }
        });

        tracing::debug!("callback listener bound on {}", local_addr);

        Ok(Self {
            local_addr,
            code_rx: Some(code_rx),
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Waits for the single callback, then stops the server.
    pub async fn wait(mut self, timeout: Duration) -> Result<String, AuthError> {
        let outcome = match self.code_rx.take() {
            Some(rx) => match tokio::time::timeout(timeout, rx).await {
                Ok(Ok(result)) => result,
                Ok(Err(_)) => Err(AuthError::Listener("callback channel closed".to_string())),
                Err(_) => Err(AuthError::TimedOut),
            },
            None => Err(AuthError::Listener("callback already consumed".to_string())),
        };

        self.shutdown().await;
        outcome
    }

    async fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(mut handle) = self.handle.take() {
            // A browser may hold a keep-alive connection open.
            if tokio::time::timeout(Duration::from_secs(2), &mut handle)
                .await
                .is_err()
            {
                handle.abort();
            }
        }
    }
}

impl Drop for CallbackListener {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}
