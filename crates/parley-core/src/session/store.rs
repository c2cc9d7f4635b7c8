//! The session store: the single source of truth for conversations.

use super::message::{Message, MessagePatch, Role};
use super::model::ChatSession;
use super::repository::SessionRepository;
use crate::error::Result;
use std::sync::Arc;

/// Owns the ordered collection of conversations and the active selection.
///
/// Ordering is most-recent-first: new sessions are inserted at the head.
/// Every mutation rewrites the full collection through the repository, so a
/// persisted snapshot never reflects part of one logical mutation.
///
/// Mutations against a missing session or message are silent no-ops. That is
/// the documented degradation for the "session deleted while a stream is
/// still yielding chunks" race: the dangling update must neither resurrect
/// the session nor fail.
pub struct SessionStore {
    sessions: Vec<ChatSession>,
    active_id: Option<String>,
    repository: Arc<dyn SessionRepository>,
}

impl SessionStore {
    /// Loads the persisted collection and starts with no active selection.
    ///
    /// The selection is deliberately transient: it is UI state, not data.
    pub async fn load(repository: Arc<dyn SessionRepository>) -> Result<Self> {
        let sessions = repository.load_sessions().await?;
        Ok(Self {
            sessions,
            active_id: None,
            repository,
        })
    }

    /// All sessions, most-recent-first.
    pub fn sessions(&self) -> &[ChatSession] {
        &self.sessions
    }

    /// Looks up a session by id.
    pub fn session(&self, id: &str) -> Option<&ChatSession> {
        self.sessions.iter().find(|s| s.id == id)
    }

    /// The id of the active session, if one is selected.
    pub fn selected_id(&self) -> Option<&str> {
        self.active_id.as_deref()
    }

    /// The active session, if one is selected and still present.
    pub fn selected_session(&self) -> Option<&ChatSession> {
        let id = self.active_id.as_deref()?;
        self.session(id)
    }

    /// Inserts a new empty session at the head of the collection, selects it,
    /// and returns its id.
    pub async fn create_session(&mut self) -> Result<String> {
        let session = ChatSession::new();
        let id = session.id.clone();
        self.sessions.insert(0, session);
        self.active_id = Some(id.clone());
        self.persist().await?;
        Ok(id)
    }

    /// Selects the given session. Returns false when the id is unknown, in
    /// which case the previous selection is kept.
    pub fn select_session(&mut self, id: &str) -> bool {
        if self.session(id).is_some() {
            self.active_id = Some(id.to_string());
            true
        } else {
            false
        }
    }

    /// Removes a session and all of its messages.
    ///
    /// Clears the active selection when it pointed at the deleted session.
    /// A no-op (not an error) when the id is absent.
    pub async fn delete_session(&mut self, id: &str) -> Result<()> {
        let before = self.sessions.len();
        self.sessions.retain(|s| s.id != id);
        if self.sessions.len() == before {
            return Ok(());
        }
        if self.active_id.as_deref() == Some(id) {
            self.active_id = None;
        }
        self.persist().await
    }

    /// Appends a message to a session's sequence.
    ///
    /// When the session had no messages and the appended message is a user
    /// message, the session title is set to a 30-character prefix of its
    /// content. That fires at most once per session: any later append finds
    /// a non-empty sequence.
    ///
    /// Returns whether the session existed; a missing session is a no-op.
    pub async fn append_message(&mut self, session_id: &str, message: Message) -> Result<bool> {
        let Some(session) = self.sessions.iter_mut().find(|s| s.id == session_id) else {
            tracing::debug!(session_id, "append dropped, session no longer exists");
            return Ok(false);
        };
        if session.messages.is_empty() && message.role == Role::User {
            session.title = ChatSession::derive_title(&message.content);
        }
        session.messages.push(message);
        self.persist().await?;
        Ok(true)
    }

    /// Patches a message in place: content replaced wholesale, sources merged
    /// with dedup by URI.
    ///
    /// Returns whether the target existed; a missing session or message is a
    /// no-op, which is how a stream for a deleted session degrades.
    pub async fn update_message(
        &mut self,
        session_id: &str,
        message_id: &str,
        patch: MessagePatch,
    ) -> Result<bool> {
        let target = self
            .sessions
            .iter_mut()
            .find(|s| s.id == session_id)
            .and_then(|s| s.messages.iter_mut().find(|m| m.id == message_id));
        let Some(message) = target else {
            tracing::debug!(session_id, message_id, "update dropped, target no longer exists");
            return Ok(false);
        };
        message.apply(patch);
        self.persist().await?;
        Ok(true)
    }

    async fn persist(&self) -> Result<()> {
        self.repository.save_sessions(&self.sessions).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::message::GroundingSource;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// In-memory repository capturing the last persisted snapshot.
    struct MockSessionRepository {
        snapshot: Mutex<Vec<ChatSession>>,
        saves: Mutex<usize>,
    }

    impl MockSessionRepository {
        fn new() -> Self {
            Self {
                snapshot: Mutex::new(Vec::new()),
                saves: Mutex::new(0),
            }
        }

        fn save_count(&self) -> usize {
            *self.saves.lock().unwrap()
        }

        fn snapshot(&self) -> Vec<ChatSession> {
            self.snapshot.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl SessionRepository for MockSessionRepository {
        async fn load_sessions(&self) -> Result<Vec<ChatSession>> {
            Ok(self.snapshot.lock().unwrap().clone())
        }

        async fn save_sessions(&self, sessions: &[ChatSession]) -> Result<()> {
            *self.snapshot.lock().unwrap() = sessions.to_vec();
            *self.saves.lock().unwrap() += 1;
            Ok(())
        }
    }

    async fn empty_store() -> (SessionStore, Arc<MockSessionRepository>) {
        let repository = Arc::new(MockSessionRepository::new());
        let store = SessionStore::load(repository.clone()).await.unwrap();
        (store, repository)
    }

    #[tokio::test]
    async fn test_create_inserts_at_head_and_selects() {
        let (mut store, _) = empty_store().await;
        let first = store.create_session().await.unwrap();
        let second = store.create_session().await.unwrap();

        assert_eq!(store.sessions()[0].id, second);
        assert_eq!(store.sessions()[1].id, first);
        assert_eq!(store.selected_id(), Some(second.as_str()));
    }

    #[tokio::test]
    async fn test_surviving_sessions_equal_creates_minus_deletes() {
        let (mut store, _) = empty_store().await;
        let a = store.create_session().await.unwrap();
        let b = store.create_session().await.unwrap();
        let c = store.create_session().await.unwrap();

        store.delete_session(&b).await.unwrap();

        let ids: Vec<&str> = store.sessions().iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec![c.as_str(), a.as_str()]);
    }

    #[tokio::test]
    async fn test_delete_clears_matching_selection() {
        let (mut store, _) = empty_store().await;
        let id = store.create_session().await.unwrap();
        assert_eq!(store.selected_id(), Some(id.as_str()));

        store.delete_session(&id).await.unwrap();
        assert_eq!(store.selected_id(), None);
        assert!(store.selected_session().is_none());
    }

    #[tokio::test]
    async fn test_delete_absent_session_is_noop() {
        let (mut store, repository) = empty_store().await;
        store.create_session().await.unwrap();
        let saves = repository.save_count();

        store.delete_session("no-such-id").await.unwrap();
        assert_eq!(store.sessions().len(), 1);
        assert_eq!(repository.save_count(), saves);
    }

    #[tokio::test]
    async fn test_first_user_message_titles_session_once() {
        let (mut store, _) = empty_store().await;
        let id = store.create_session().await.unwrap();

        store
            .append_message(&id, Message::user("Explain recursion"))
            .await
            .unwrap();
        assert_eq!(store.session(&id).unwrap().title, "Explain recursion");

        store
            .append_message(&id, Message::user("A different question"))
            .await
            .unwrap();
        assert_eq!(store.session(&id).unwrap().title, "Explain recursion");
    }

    #[tokio::test]
    async fn test_title_is_truncated_to_thirty_chars() {
        let (mut store, _) = empty_store().await;
        let id = store.create_session().await.unwrap();
        let prompt = "x".repeat(80);

        store.append_message(&id, Message::user(prompt)).await.unwrap();
        assert_eq!(store.session(&id).unwrap().title.chars().count(), 30);
    }

    #[tokio::test]
    async fn test_assistant_placeholder_does_not_title_session() {
        let (mut store, _) = empty_store().await;
        let id = store.create_session().await.unwrap();

        store
            .append_message(&id, Message::assistant_placeholder())
            .await
            .unwrap();
        assert_eq!(
            store.session(&id).unwrap().title,
            crate::session::model::UNTITLED_SESSION
        );
    }

    #[tokio::test]
    async fn test_append_to_missing_session_is_silent_noop() {
        let (mut store, repository) = empty_store().await;
        let applied = store
            .append_message("gone", Message::user("hello"))
            .await
            .unwrap();
        assert!(!applied);
        assert_eq!(repository.save_count(), 0);
    }

    #[tokio::test]
    async fn test_update_after_delete_does_not_resurrect() {
        let (mut store, _) = empty_store().await;
        let id = store.create_session().await.unwrap();
        let placeholder = Message::assistant_placeholder();
        let message_id = placeholder.id.clone();
        store.append_message(&id, placeholder).await.unwrap();

        store.delete_session(&id).await.unwrap();

        let applied = store
            .update_message(&id, &message_id, MessagePatch::content("late chunk"))
            .await
            .unwrap();
        assert!(!applied);
        assert!(store.sessions().is_empty());
    }

    #[tokio::test]
    async fn test_update_merges_sources_deduped_by_uri() {
        let (mut store, _) = empty_store().await;
        let id = store.create_session().await.unwrap();
        let placeholder = Message::assistant_placeholder();
        let message_id = placeholder.id.clone();
        store.append_message(&id, placeholder).await.unwrap();

        let source = |title: &str, uri: &str| GroundingSource {
            title: title.to_string(),
            uri: uri.to_string(),
        };

        store
            .update_message(
                &id,
                &message_id,
                MessagePatch {
                    content: Some("partial".into()),
                    sources: Some(vec![source("A", "u1")]),
                },
            )
            .await
            .unwrap();
        store
            .update_message(
                &id,
                &message_id,
                MessagePatch {
                    content: Some("final".into()),
                    sources: Some(vec![source("A2", "u1"), source("B", "u2")]),
                },
            )
            .await
            .unwrap();

        let message = &store.session(&id).unwrap().messages[0];
        assert_eq!(message.content, "final");
        assert_eq!(
            message.sources,
            Some(vec![source("A", "u1"), source("B", "u2")])
        );
    }

    #[tokio::test]
    async fn test_every_mutation_persists_full_snapshot() {
        let (mut store, repository) = empty_store().await;
        let id = store.create_session().await.unwrap();
        assert_eq!(repository.save_count(), 1);

        store.append_message(&id, Message::user("hi")).await.unwrap();
        assert_eq!(repository.save_count(), 2);
        assert_eq!(repository.snapshot(), store.sessions());
    }

    #[tokio::test]
    async fn test_reload_round_trips_persisted_state() {
        let (mut store, repository) = empty_store().await;
        let id = store.create_session().await.unwrap();
        store
            .append_message(&id, Message::user("persist me"))
            .await
            .unwrap();

        let reloaded = SessionStore::load(repository).await.unwrap();
        assert_eq!(reloaded.sessions(), store.sessions());
        // Selection is transient and not part of the persisted state.
        assert_eq!(reloaded.selected_id(), None);
    }
}
