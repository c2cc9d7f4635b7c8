//! JSON file-backed SettingsRepository implementation.

use crate::atomic_json::AtomicJsonFile;
use crate::paths::ParleyPaths;
use async_trait::async_trait;
use parley_core::error::{ParleyError, Result};
use parley_core::settings::{Settings, SettingsRepository};
use std::path::PathBuf;

/// Stores the settings record in a single JSON file.
pub struct JsonSettingsRepository {
    path: PathBuf,
}

impl JsonSettingsRepository {
    /// Creates a repository backed by the given file.
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Creates a repository at the default location
    /// (`~/.config/parley/settings.json`).
    pub fn default_location() -> Result<Self> {
        let path = ParleyPaths::settings_file()
            .map_err(|e| ParleyError::config(format!("Failed to resolve settings file: {}", e)))?;
        Ok(Self::new(path))
    }
}

#[async_trait]
impl SettingsRepository for JsonSettingsRepository {
    /// Loads the persisted settings, defaulting absent or unreadable data.
    async fn load_settings(&self) -> Result<Settings> {
        let path = self.path.clone();
        let settings = tokio::task::spawn_blocking(move || {
            let file = AtomicJsonFile::<Settings>::new(path.clone());
            match file.load() {
                Ok(Some(settings)) => settings,
                Ok(None) => Settings::default(),
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "discarding unreadable settings, using defaults"
                    );
                    Settings::default()
                }
            }
        })
        .await
        .map_err(|e| ParleyError::internal(format!("Failed to join load task: {}", e)))?;

        Ok(settings)
    }

    async fn save_settings(&self, settings: &Settings) -> Result<()> {
        let path = self.path.clone();
        let snapshot = *settings;
        tokio::task::spawn_blocking(move || AtomicJsonFile::new(path).save(&snapshot))
            .await
            .map_err(|e| ParleyError::internal(format!("Failed to join save task: {}", e)))?
            .map_err(ParleyError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_core::settings::{PromptMode, Theme};
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_round_trip() {
        let dir = TempDir::new().unwrap();
        let repo = JsonSettingsRepository::new(dir.path().join("settings.json"));

        let settings = Settings {
            mode: PromptMode::Technical,
            theme: Theme::Dark,
        };
        repo.save_settings(&settings).await.unwrap();
        assert_eq!(repo.load_settings().await.unwrap(), settings);
    }

    #[tokio::test]
    async fn test_missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let repo = JsonSettingsRepository::new(dir.path().join("settings.json"));
        assert_eq!(repo.load_settings().await.unwrap(), Settings::default());
    }

    #[tokio::test]
    async fn test_malformed_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "[1, 2, 3]").unwrap();

        let repo = JsonSettingsRepository::new(path);
        assert_eq!(repo.load_settings().await.unwrap(), Settings::default());
    }
}
