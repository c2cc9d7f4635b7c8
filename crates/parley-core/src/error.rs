//! Error types for the Parley application.

use thiserror::Error;

/// A shared error type for the entire Parley application.
///
/// This provides typed, structured error variants with constructor helpers
/// and a single place to derive user-facing error text from.
#[derive(Error, Debug, Clone)]
pub enum ParleyError {
    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization {
        format: String, // "JSON", etc.
        message: String,
    },

    /// Data access error (repository/storage layer)
    #[error("Data access error: {0}")]
    DataAccess(String),

    /// Configuration error (missing credentials, unreadable config files)
    #[error("Configuration error: {0}")]
    Config(String),

    /// The external API rejected the configured credential.
    #[error("Invalid API key. Please check your credentials in settings.")]
    InvalidApiKey,

    /// The external API completed a turn without producing any text.
    #[error("The model returned an empty response.")]
    EmptyResponse,

    /// Any other failure raised by the external API, message passed through.
    #[error("{0}")]
    Api(String),

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Fallback shown when a failure carries no usable message.
const GENERIC_FAILURE: &str = "Something went wrong while processing your request.";

impl ParleyError {
    /// Creates an IO error
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Creates a Serialization error
    pub fn serialization(format: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Serialization {
            format: format.into(),
            message: message.into(),
        }
    }

    /// Creates a DataAccess error
    pub fn data_access(message: impl Into<String>) -> Self {
        Self::DataAccess(message.into())
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates an Api error
    pub fn api(message: impl Into<String>) -> Self {
        Self::Api(message.into())
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Check if this is the fixed invalid-credential error
    pub fn is_invalid_api_key(&self) -> bool {
        matches!(self, Self::InvalidApiKey)
    }

    /// The message a user should see for this failure.
    ///
    /// Credential failures map to a fixed message distinct from the raw API
    /// text; other API failures pass their message through verbatim, falling
    /// back to a generic string when the failure carries no message.
    pub fn user_message(&self) -> String {
        match self {
            Self::Api(message) if message.trim().is_empty() => GENERIC_FAILURE.to_string(),
            Self::Api(message) => message.clone(),
            Self::InvalidApiKey | Self::EmptyResponse => self.to_string(),
            _ => GENERIC_FAILURE.to_string(),
        }
    }
}

/// Convenient Result type alias for Parley operations
pub type Result<T> = std::result::Result<T, ParleyError>;
