//! Session repository trait.
//!
//! Defines the interface for session persistence operations.

use super::model::ChatSession;
use crate::error::Result;
use async_trait::async_trait;

/// An abstract repository for persisting the full session collection.
///
/// The store rewrites the whole collection on every mutation, so the
/// contract is deliberately coarse: load everything, save everything.
/// Implementations decide the storage format and location.
///
/// # Implementation Notes
///
/// `load_sessions` must degrade gracefully: absent or malformed data yields
/// an empty collection rather than failing application start.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Loads all persisted sessions, most-recent-first.
    async fn load_sessions(&self) -> Result<Vec<ChatSession>>;

    /// Persists the full session collection, replacing the previous state.
    async fn save_sessions(&self, sessions: &[ChatSession]) -> Result<()>;
}
