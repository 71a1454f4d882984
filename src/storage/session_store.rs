//! Chat session persistence
//!
//! [`SessionStore`] owns the persisted collection of chat sessions and the
//! pointer to the current session. The collection is one JSON array under
//! [`SESSIONS_KEY`], most recently inserted first; the pointer is a bare id
//! under [`CURRENT_SESSION_KEY`].
//!
//! None of the public operations fail. A store that cannot be read behaves as
//! if it were empty, and a write that cannot complete is logged and dropped,
//! so the conversation in memory keeps going either way.

use super::types::{now_millis, ChatSession};
use super::KeyValueStore;
use crate::error::{Result, TravelChatError};
use std::sync::Arc;

/// Key holding the JSON array of sessions
pub const SESSIONS_KEY: &str = "chatSessions";

/// Key holding the id of the most recently saved or selected session
pub const CURRENT_SESSION_KEY: &str = "currentChatSession";

/// Number of sessions kept by default
pub const DEFAULT_MAX_SESSIONS: usize = 50;

/// Persistence for the chat session collection
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use travelchat::storage::{ChatMessage, ChatSession, MemoryStore, SessionStore};
///
/// let store = SessionStore::new(Arc::new(MemoryStore::new()));
/// let mut session = ChatSession::new("session_1", "Hotels paris");
/// session.push(ChatMessage::user("hotels in Paris"));
/// store.save_session(&session);
///
/// assert_eq!(store.list_sessions().len(), 1);
/// assert_eq!(store.current_session_id().as_deref(), Some("session_1"));
/// ```
#[derive(Clone)]
pub struct SessionStore {
    backend: Arc<dyn KeyValueStore>,
    max_sessions: usize,
}

impl SessionStore {
    /// Create a store over the given backend with the default capacity
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        Self::with_capacity(backend, DEFAULT_MAX_SESSIONS)
    }

    /// Create a store that keeps at most `max_sessions` sessions
    pub fn with_capacity(backend: Arc<dyn KeyValueStore>, max_sessions: usize) -> Self {
        Self {
            backend,
            max_sessions: max_sessions.max(1),
        }
    }

    /// Maximum number of sessions retained
    pub fn capacity(&self) -> usize {
        self.max_sessions
    }

    /// All stored sessions, most recently inserted first
    ///
    /// An unreadable or corrupted collection yields an empty list.
    pub fn list_sessions(&self) -> Vec<ChatSession> {
        match self.load_all() {
            Ok(sessions) => sessions,
            Err(e) => {
                tracing::warn!("Treating chat history as empty: {:#}", e);
                Vec::new()
            }
        }
    }

    /// Look up a session by id
    pub fn get_session(&self, id: &str) -> Option<ChatSession> {
        self.list_sessions().into_iter().find(|s| s.id == id)
    }

    /// Insert or update a session
    ///
    /// An existing session keeps its position and `created_at`; a new one is
    /// inserted at the head with `created_at` set to now, and the collection
    /// is truncated to capacity. `updated_at` is set to now and the session
    /// becomes current. Sessions holding nothing beyond the welcome greeting,
    /// or that would not read back, are not written.
    pub fn save_session(&self, session: &ChatSession) {
        if session.is_welcome_only() {
            tracing::debug!(
                "Not persisting session {} without user messages",
                session.id
            );
            return;
        }

        if let Err(e) = self.try_save(session) {
            tracing::warn!("Failed to save chat session {}: {:#}", session.id, e);
        }
    }

    /// Remove a session; a missing id is a no-op
    ///
    /// The current-session pointer is left untouched.
    pub fn delete_session(&self, id: &str) {
        if let Err(e) = self.try_delete(id) {
            tracing::warn!("Failed to delete chat session {}: {:#}", id, e);
        }
    }

    /// Id of the most recently saved or selected session
    pub fn current_session_id(&self) -> Option<String> {
        match self.backend.get(CURRENT_SESSION_KEY) {
            Ok(id) => id.filter(|id| !id.is_empty()),
            Err(e) => {
                tracing::warn!("Failed to read current chat session: {:#}", e);
                None
            }
        }
    }

    /// Point the current-session pointer at `id`
    pub fn set_current_session_id(&self, id: &str) {
        if let Err(e) = self.backend.set(CURRENT_SESSION_KEY, id) {
            tracing::warn!("Failed to set current chat session: {:#}", e);
        }
    }

    /// Clear the current-session pointer
    pub fn clear_current_session_id(&self) {
        if let Err(e) = self.backend.remove(CURRENT_SESSION_KEY) {
            tracing::warn!("Failed to clear current chat session: {:#}", e);
        }
    }

    fn load_all(&self) -> Result<Vec<ChatSession>> {
        let Some(raw) = self.backend.get(SESSIONS_KEY)? else {
            return Ok(Vec::new());
        };

        let sessions: Vec<ChatSession> = serde_json::from_str(&raw)
            .map_err(|e| TravelChatError::MalformedRecord(format!("{}: {}", SESSIONS_KEY, e)))?;
        Ok(sessions)
    }

    fn store_all(&self, sessions: &[ChatSession]) -> Result<()> {
        let raw = serde_json::to_string(sessions).map_err(|e| {
            TravelChatError::StorageUnavailable(format!("Serialization failed: {}", e))
        })?;
        self.backend.set(SESSIONS_KEY, &raw)
    }

    fn try_save(&self, session: &ChatSession) -> Result<()> {
        let mut record = session.clone();
        record.updated_at = now_millis();
        ensure_loadable(&record)?;

        // Only a collection that was read but does not parse is replaced. A
        // failed read leaves whatever is stored untouched.
        let mut sessions = match self.load_all() {
            Ok(sessions) => sessions,
            Err(e) if is_malformed(&e) => {
                tracing::warn!("Discarding unreadable chat history: {:#}", e);
                Vec::new()
            }
            Err(e) => return Err(e),
        };

        match sessions.iter_mut().find(|s| s.id == session.id) {
            Some(existing) => {
                record.created_at = existing.created_at;
                *existing = record;
            }
            None => {
                record.created_at = record.updated_at;
                sessions.insert(0, record);
                sessions.truncate(self.max_sessions);
            }
        }

        self.store_all(&sessions)?;
        self.backend.set(CURRENT_SESSION_KEY, &session.id)?;

        tracing::debug!(
            "Saved chat session {} ({} messages, {} stored)",
            session.id,
            session.messages.len(),
            sessions.len()
        );
        Ok(())
    }

    fn try_delete(&self, id: &str) -> Result<()> {
        let mut sessions = self.load_all()?;
        let before = sessions.len();
        sessions.retain(|s| s.id != id);

        if sessions.len() == before {
            tracing::debug!("Chat session {} not found, nothing to delete", id);
            return Ok(());
        }

        self.store_all(&sessions)?;
        tracing::debug!("Deleted chat session {}", id);
        Ok(())
    }
}

fn is_malformed(error: &anyhow::Error) -> bool {
    matches!(
        error.downcast_ref::<TravelChatError>(),
        Some(TravelChatError::MalformedRecord(_))
    )
}

/// Reject a record that would not read back, so one bad session cannot
/// invalidate the whole stored collection.
fn ensure_loadable(session: &ChatSession) -> Result<()> {
    let raw = serde_json::to_string(session).map_err(|e| {
        TravelChatError::MalformedRecord(format!("session {}: {}", session.id, e))
    })?;
    serde_json::from_str::<ChatSession>(&raw).map_err(|e| {
        TravelChatError::MalformedRecord(format!("session {} would not load: {}", session.id, e))
    })?;
    Ok(())
}
