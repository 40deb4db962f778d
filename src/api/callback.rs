use std::{collections::HashMap, sync::Arc};

use axum::{Extension, extract::Query, response::Html};
use tokio::sync::{Mutex, oneshot};

use crate::error::AuthError;

/// Shared state of a single login attempt.
///
/// The sender is taken by the first callback hit; later hits are answered but
/// ignored.
pub struct CallbackState {
    pub expected_state: String,
    pub sender: Mutex<Option<oneshot::Sender<Result<String, AuthError>>>>,
}

impl CallbackState {
    pub fn new(expected_state: String, sender: oneshot::Sender<Result<String, AuthError>>) -> Self {
        Self {
            expected_state,
            sender: Mutex::new(Some(sender)),
        }
    }
}

pub async fn callback(
    Query(params): Query<HashMap<String, String>>,
    Extension(shared_state): Extension<Arc<CallbackState>>,
) -> Html<&'static str> {
    let Some(sender) = shared_state.sender.lock().await.take() else {
        return Html("<h4>Login already handled. You can close this window.</h4>");
    };

    let (outcome, page) = match (params.get("code"), params.get("error")) {
        (_, Some(err)) => (
            Err(AuthError::Denied(err.clone())),
            "<h4>Login was denied.</h4>",
        ),
        (Some(_), None)
            if params.get("state").map(String::as_str)
                != Some(shared_state.expected_state.as_str()) =>
        {
            (Err(AuthError::StateMismatch), "<h4>Login failed.</h4>")
        }
        (Some(code), None) => (
            Ok(code.clone()),
            "<h2>Authentication successful.</h2><p>Close this browser window.</p>",
        ),
        (None, None) => (
            Err(AuthError::Exchange("callback without code".to_string())),
            "<h4>Missing authorization code.</h4>",
        ),
    };

    let _ = sender.send(outcome);
    Html(page)
}
