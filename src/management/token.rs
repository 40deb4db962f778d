use std::path::{Path, PathBuf};

use crate::{config, error::PlaybackError, types::Credential};

/// JSON file holding the last known credential.
#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl Default for TokenStore {
    fn default() -> Self {
        Self {
            path: config::app_dir().join("token.json"),
        }
    }
}

impl TokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the stored credential. A missing, unreadable or corrupt file all
    /// mean "no credential".
    pub async fn load(&self) -> Option<Credential> {
        let content = match async_fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) => {
                tracing::debug!("no stored token at {}: {}", self.path.display(), e);
                return None;
            }
        };

        match serde_json::from_str::<Credential>(&content) {
            Ok(credential) => Some(credential),
            Err(e) => {
                tracing::warn!("ignoring corrupt token file {}: {}", self.path.display(), e);
                None
            }
        }
    }

    pub async fn save(&self, credential: &Credential) -> Result<(), PlaybackError> {
        if let Some(parent) = self.path.parent() {
            async_fs::create_dir_all(parent)
                .await
                .map_err(|e| PlaybackError::TokenPersistence(e.to_string()))?;
        }

        let json = serde_json::to_string_pretty(credential)
            .map_err(|e| PlaybackError::TokenPersistence(e.to_string()))?;
        async_fs::write(&self.path, json)
            .await
            .map_err(|e| PlaybackError::TokenPersistence(e.to_string()))
    }
}
