//! The turn controller: orchestrates one user-submitted turn.

use super::agent::ChatAgent;
use crate::error::{ParleyError, Result};
use crate::session::message::{Message, MessagePatch};
use crate::session::store::SessionStore;
use crate::settings::Settings;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;

/// How a submission ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// The turn ran to the end of the stream (or the session vanished
    /// mid-stream, which degrades to stopping early).
    Completed { session_id: String },
    /// Nothing happened: empty prompt, or another turn was already in
    /// flight.
    Skipped,
}

/// Orchestrates a single turn: resolves the target session, appends the user
/// message and an assistant placeholder, then folds the capability's chunks
/// into the placeholder until the stream ends or fails.
///
/// This is the only component that mutates the store as a side effect of
/// talking to the capability. It performs no storage access itself.
pub struct TurnController<A: ChatAgent> {
    store: Arc<Mutex<SessionStore>>,
    agent: A,
    in_flight: AtomicBool,
}

/// Clears the busy flag on every exit path, including early `?` returns.
struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl<A: ChatAgent> TurnController<A> {
    pub fn new(store: Arc<Mutex<SessionStore>>, agent: A) -> Self {
        Self {
            store,
            agent,
            in_flight: AtomicBool::new(false),
        }
    }

    /// The store this controller folds into.
    pub fn store(&self) -> &Arc<Mutex<SessionStore>> {
        &self.store
    }

    /// Whether a turn is currently in flight.
    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Submits a turn against the selected session (creating one when none
    /// is selected) and streams the response into the assistant placeholder.
    ///
    /// A failure at any point is returned as-is: partial placeholder content
    /// is kept, nothing is rolled back, and the store stays persistable.
    pub async fn submit_turn(&self, prompt: &str, settings: &Settings) -> Result<TurnOutcome> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Ok(TurnOutcome::Skipped);
        }
        if self.in_flight.swap(true, Ordering::SeqCst) {
            tracing::debug!("turn already in flight, submission skipped");
            return Ok(TurnOutcome::Skipped);
        }
        let _guard = InFlightGuard(&self.in_flight);

        let (session_id, placeholder_id, history) = self.begin_turn(prompt).await?;

        let mut stream = self
            .agent
            .stream_turn(prompt, &history, settings.mode)
            .await?;

        while let Some(item) = stream.recv().await {
            let chunk = item?;
            let applied = self
                .store
                .lock()
                .await
                .update_message(
                    &session_id,
                    &placeholder_id,
                    MessagePatch {
                        content: Some(chunk.text),
                        sources: chunk.sources,
                    },
                )
                .await?;
            if !applied {
                // Target was deleted mid-stream. Dropping the receiver ends
                // the producer, so we stop paying for the remote stream.
                tracing::debug!(%session_id, "stream target gone, abandoning turn");
                break;
            }
        }

        Ok(TurnOutcome::Completed { session_id })
    }

    /// Non-streaming variant: a single final text fills the placeholder.
    ///
    /// Unlike the streaming path, an empty final text is a failure here; a
    /// stream may legitimately end with no chunks, a completed request may
    /// not.
    pub async fn submit_turn_buffered(
        &self,
        prompt: &str,
        settings: &Settings,
    ) -> Result<TurnOutcome> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Ok(TurnOutcome::Skipped);
        }
        if self.in_flight.swap(true, Ordering::SeqCst) {
            tracing::debug!("turn already in flight, submission skipped");
            return Ok(TurnOutcome::Skipped);
        }
        let _guard = InFlightGuard(&self.in_flight);

        let (session_id, placeholder_id, history) = self.begin_turn(prompt).await?;

        let text = self.agent.send_turn(prompt, &history, settings.mode).await?;
        if text.is_empty() {
            return Err(ParleyError::EmptyResponse);
        }

        self.store
            .lock()
            .await
            .update_message(&session_id, &placeholder_id, MessagePatch::content(text))
            .await?;

        Ok(TurnOutcome::Completed { session_id })
    }

    /// Resolves the target session and appends the user message plus the
    /// assistant placeholder.
    ///
    /// The returned history is the conversation as it was before this turn:
    /// the prompt is passed to the capability separately, not as part of the
    /// history.
    async fn begin_turn(&self, prompt: &str) -> Result<(String, String, Vec<Message>)> {
        let mut store = self.store.lock().await;

        let session_id = match store.selected_id() {
            Some(id) => id.to_string(),
            None => store.create_session().await?,
        };

        let history = store
            .session(&session_id)
            .map(|s| s.messages.clone())
            .unwrap_or_default();

        store
            .append_message(&session_id, Message::user(prompt))
            .await?;

        let placeholder = Message::assistant_placeholder();
        let placeholder_id = placeholder.id.clone();
        store.append_message(&session_id, placeholder).await?;

        Ok((session_id, placeholder_id, history))
    }
}
