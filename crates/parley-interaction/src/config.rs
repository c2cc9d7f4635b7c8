//! Credential file management.
//!
//! Supports reading secrets from `~/.config/parley/secret.json`.

use parley_core::error::{ParleyError, Result};
use parley_infrastructure::ParleyPaths;
use serde::Deserialize;
use std::fs;

/// Root structure for secret.json
#[derive(Debug, Clone, Deserialize)]
pub struct SecretConfig {
    #[serde(default)]
    pub gemini: Option<GeminiConfig>,
}

/// Gemini API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct GeminiConfig {
    pub api_key: String,
    #[serde(default)]
    pub model_name: Option<String>,
}

/// Loads the secret configuration file from ~/.config/parley/secret.json
pub fn load_secret_config() -> Result<SecretConfig> {
    let config_path = ParleyPaths::secret_file()
        .map_err(|e| ParleyError::config(format!("Failed to resolve secret file: {}", e)))?;

    if !config_path.exists() {
        return Err(ParleyError::config(format!(
            "Credential file not found at: {}",
            config_path.display()
        )));
    }

    let content = fs::read_to_string(&config_path).map_err(|e| {
        ParleyError::config(format!(
            "Failed to read credential file at {}: {}",
            config_path.display(),
            e
        ))
    })?;

    serde_json::from_str(&content).map_err(|e| {
        ParleyError::config(format!(
            "Failed to parse credential file at {}: {}",
            config_path.display(),
            e
        ))
    })
}
