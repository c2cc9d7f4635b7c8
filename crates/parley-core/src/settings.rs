//! Application settings: prompting mode and display theme.
//!
//! Two independent toggles with trivial flip semantics. Changes persist
//! immediately and are visible to the next turn submission synchronously.

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// The prompt-shaping flag: alters the system instruction and sampling
/// temperature the external capability is opened with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptMode {
    /// Expert answers focused on architecture, efficiency, and good practice.
    Technical,
    /// Friendly, concise answers to general questions.
    #[default]
    General,
}

impl PromptMode {
    pub fn flipped(self) -> Self {
        match self {
            Self::Technical => Self::General,
            Self::General => Self::Technical,
        }
    }
}

/// Display theme. Read by the renderer only; carried here because it is part
/// of the persisted settings record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn flipped(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }
}

/// The persisted settings record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub mode: PromptMode,
    #[serde(default)]
    pub theme: Theme,
}

/// An abstract repository for the settings record.
///
/// `load_settings` must degrade absent or malformed data to defaults rather
/// than failing application start.
#[async_trait]
pub trait SettingsRepository: Send + Sync {
    async fn load_settings(&self) -> Result<Settings>;
    async fn save_settings(&self, settings: &Settings) -> Result<()>;
}

/// Owns the in-memory settings and persists every change immediately.
pub struct SettingsState {
    settings: Settings,
    repository: Arc<dyn SettingsRepository>,
}

impl SettingsState {
    /// Loads the persisted settings, defaulting when nothing is stored.
    pub async fn load(repository: Arc<dyn SettingsRepository>) -> Result<Self> {
        let settings = repository.load_settings().await?;
        Ok(Self {
            settings,
            repository,
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Flips between technical and general mode, persisting the change.
    pub async fn toggle_mode(&mut self) -> Result<PromptMode> {
        self.settings.mode = self.settings.mode.flipped();
        self.repository.save_settings(&self.settings).await?;
        Ok(self.settings.mode)
    }

    /// Flips between light and dark theme, persisting the change.
    pub async fn toggle_theme(&mut self) -> Result<Theme> {
        self.settings.theme = self.settings.theme.flipped();
        self.repository.save_settings(&self.settings).await?;
        Ok(self.settings.theme)
    }
}
