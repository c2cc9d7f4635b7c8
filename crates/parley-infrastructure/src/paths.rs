//! Unified path management for parley state files.
//!
//! All parley configuration, credentials, and session data live under one
//! platform config directory so the storage layout stays predictable.

use std::path::PathBuf;

/// Errors that can occur during path resolution.
#[derive(Debug)]
pub enum PathError {
    /// Config directory could not be determined.
    ConfigDirNotFound,
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::ConfigDirNotFound => write!(f, "Cannot find config directory"),
        }
    }
}

impl std::error::Error for PathError {}

/// Unified path management for parley.
///
/// # Directory Structure
///
/// ```text
/// ~/.config/parley/            # Config directory
/// ├── sessions.json            # Full session collection
/// ├── settings.json            # Mode/theme settings
/// └── secret.json              # API keys
/// ```
pub struct ParleyPaths;

impl ParleyPaths {
    /// Returns the parley configuration directory.
    ///
    /// # Returns
    ///
    /// - `Ok(PathBuf)`: Path to config directory (e.g. `~/.config/parley/`)
    /// - `Err(PathError::ConfigDirNotFound)`: Could not determine directory
    pub fn config_dir() -> Result<PathBuf, PathError> {
        dirs::config_dir()
            .map(|dir| dir.join("parley"))
            .ok_or(PathError::ConfigDirNotFound)
    }

    /// Returns the path to the persisted session collection.
    pub fn sessions_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("sessions.json"))
    }

    /// Returns the path to the persisted settings record.
    pub fn settings_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("settings.json"))
    }

    /// Returns the path to the secrets file.
    ///
    /// # Security Note
    ///
    /// API keys are stored in plain text; the file should only be readable
    /// by the current user.
    pub fn secret_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("secret.json"))
    }
}
