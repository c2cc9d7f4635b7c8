//! JSON file-backed SessionRepository implementation.
//!
//! The full session collection is one JSON array, rewritten wholesale on
//! every save. File I/O runs on the blocking pool so callers never block the
//! async runtime.

use crate::atomic_json::AtomicJsonFile;
use crate::paths::ParleyPaths;
use async_trait::async_trait;
use parley_core::error::{ParleyError, Result};
use parley_core::session::{ChatSession, SessionRepository};
use std::path::PathBuf;

/// Stores the session collection in a single JSON file.
pub struct JsonSessionRepository {
    path: PathBuf,
}

impl JsonSessionRepository {
    /// Creates a repository backed by the given file.
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Creates a repository at the default location
    /// (`~/.config/parley/sessions.json`).
    pub fn default_location() -> Result<Self> {
        let path = ParleyPaths::sessions_file()
            .map_err(|e| ParleyError::config(format!("Failed to resolve sessions file: {}", e)))?;
        Ok(Self::new(path))
    }
}

#[async_trait]
impl SessionRepository for JsonSessionRepository {
    /// Loads the persisted collection.
    ///
    /// Absent, empty, or unreadable data degrades to an empty collection
    /// with a warning; a broken state file must not prevent startup.
    async fn load_sessions(&self) -> Result<Vec<ChatSession>> {
        let path = self.path.clone();
        let sessions = tokio::task::spawn_blocking(move || {
            let file = AtomicJsonFile::<Vec<ChatSession>>::new(path.clone());
            match file.load() {
                Ok(Some(sessions)) => sessions,
                Ok(None) => Vec::new(),
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "discarding unreadable session store"
                    );
                    Vec::new()
                }
            }
        })
        .await
        .map_err(|e| ParleyError::internal(format!("Failed to join load task: {}", e)))?;

        Ok(sessions)
    }

    async fn save_sessions(&self, sessions: &[ChatSession]) -> Result<()> {
        let path = self.path.clone();
        let snapshot = sessions.to_vec();
        tokio::task::spawn_blocking(move || {
            AtomicJsonFile::new(path).save(&snapshot)
        })
        .await
        .map_err(|e| ParleyError::internal(format!("Failed to join save task: {}", e)))?
        .map_err(ParleyError::from)
    }
}
