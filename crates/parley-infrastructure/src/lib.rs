//! Durable local storage for Parley: atomic JSON files under the platform
//! config directory.

pub mod atomic_json;
pub mod json_session_repository;
pub mod json_settings_repository;
pub mod paths;

pub use atomic_json::{AtomicJsonError, AtomicJsonFile};
pub use json_session_repository::JsonSessionRepository;
pub use json_settings_repository::JsonSettingsRepository;
pub use paths::ParleyPaths;
