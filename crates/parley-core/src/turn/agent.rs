//! The consumed LLM capability.
//!
//! The external API is modeled as a trait yielding cumulative chunks over a
//! channel. The producer never holds a reference to session state; it only
//! yields values that the turn controller folds in.

use crate::error::Result;
use crate::session::message::{GroundingSource, Message};
use crate::settings::PromptMode;
use async_trait::async_trait;
use tokio::sync::mpsc;

/// One streamed unit from the capability.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnChunk {
    /// The full response so far, not a delta. The latest chunk always
    /// supersedes the previous one wholesale.
    pub text: String,
    /// Citations discovered so far, when the event carried grounding
    /// metadata.
    pub sources: Option<Vec<GroundingSource>>,
}

/// The receiving half of an open response stream. Dropping it ends the
/// producer, which stops consuming the remote stream.
pub type TurnStream = mpsc::Receiver<Result<TurnChunk>>;

/// A capability that answers one user turn, given the prompt, the prior
/// conversation history (excluding the prompt itself), and the prompting
/// mode.
#[async_trait]
pub trait ChatAgent: Send + Sync {
    /// Opens a response stream. Chunks arrive in order and each carries the
    /// cumulative text so far; a failure may arrive at any point, before or
    /// after partial chunks.
    async fn stream_turn(
        &self,
        prompt: &str,
        history: &[Message],
        mode: PromptMode,
    ) -> Result<TurnStream>;

    /// Non-streaming variant: one final text, no incremental chunks.
    async fn send_turn(&self, prompt: &str, history: &[Message], mode: PromptMode)
    -> Result<String>;
}
