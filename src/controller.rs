//! Conversation controller
//!
//! Drives one conversation at a time: appends user messages, asks the
//! assistant backend for replies, and writes the whole session back to the
//! [`SessionStore`] after every change to the message list. Backend failures
//! never reach the caller; they turn into an apologetic assistant message so
//! the conversation can carry on.

use crate::backend::{AssistantBackend, ChatRequest, SpeechBackend};
use crate::error::{Result, TravelChatError};
use crate::storage::{
    generate_title, new_session_id, ChatMessage, ChatSession, SessionStore, DEFAULT_TITLE,
};
use serde_json::Value;
use std::sync::Arc;

/// Reply shown when the assistant backend cannot be reached
pub const FALLBACK_REPLY: &str =
    "I'm having trouble connecting to my services right now. Please try again later.";

/// Drives message exchange for the open conversation
pub struct ConversationController {
    store: SessionStore,
    backend: Arc<dyn AssistantBackend>,
    speech: Option<Arc<dyn SpeechBackend>>,
    session: ChatSession,
}

impl ConversationController {
    /// Open a fresh, unsaved conversation
    ///
    /// The store is not touched until the first user message is sent.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::sync::Arc;
    /// use async_trait::async_trait;
    /// use travelchat::backend::{AssistantBackend, ChatRequest, ChatResponse};
    /// use travelchat::controller::ConversationController;
    /// use travelchat::storage::{MemoryStore, SessionStore};
    ///
    /// struct Offline;
    ///
    /// #[async_trait]
    /// impl AssistantBackend for Offline {
    ///     async fn chat(&self, _request: &ChatRequest) -> travelchat::Result<ChatResponse> {
    ///         anyhow::bail!("offline")
    ///     }
    /// }
    ///
    /// let store = SessionStore::new(Arc::new(MemoryStore::new()));
    /// let controller = ConversationController::new(store.clone(), Arc::new(Offline));
    /// assert_eq!(controller.messages().len(), 1);
    /// assert!(store.list_sessions().is_empty());
    /// ```
    pub fn new(store: SessionStore, backend: Arc<dyn AssistantBackend>) -> Self {
        Self {
            store,
            backend,
            speech: None,
            session: fresh_session(),
        }
    }

    /// Open a stored conversation, or a fresh one if `id` is unknown
    pub fn resume(store: SessionStore, backend: Arc<dyn AssistantBackend>, id: &str) -> Self {
        let mut controller = Self::new(store, backend);
        controller.select_session(id);
        controller
    }

    /// Enable voice input through the given speech backend
    pub fn with_speech(mut self, speech: Arc<dyn SpeechBackend>) -> Self {
        self.speech = Some(speech);
        self
    }

    /// Id of the open conversation
    pub fn session_id(&self) -> &str {
        &self.session.id
    }

    /// Title of the open conversation
    pub fn title(&self) -> &str {
        &self.session.title
    }

    /// Messages of the open conversation, oldest first
    pub fn messages(&self) -> &[ChatMessage] {
        &self.session.messages
    }

    /// The open conversation
    pub fn session(&self) -> &ChatSession {
        &self.session
    }

    /// The store this controller writes to
    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Switch to a stored conversation
    ///
    /// Returns `false` and opens a fresh conversation when `id` is not stored.
    pub fn select_session(&mut self, id: &str) -> bool {
        match self.store.get_session(id) {
            Some(session) => {
                tracing::info!(
                    "Opened chat session {} ({} messages)",
                    session.id,
                    session.messages.len()
                );
                self.store.set_current_session_id(&session.id);
                self.session = session;
                true
            }
            None => {
                tracing::warn!("Chat session {} not found, starting a new one", id);
                self.session = fresh_session();
                false
            }
        }
    }

    /// Start a new conversation, forgetting the current-session pointer
    pub fn new_chat(&mut self) {
        self.store.clear_current_session_id();
        self.session = fresh_session();
        tracing::info!("Started new chat session {}", self.session.id);
    }

    /// Delete a stored conversation; deleting the open one starts a new chat
    pub fn delete_session(&mut self, id: &str) {
        self.store.delete_session(id);
        if id == self.session.id {
            self.new_chat();
        }
    }

    /// Send a typed message and return the assistant's reply
    ///
    /// Blank input is ignored and yields `None`.
    pub async fn send_message(&mut self, text: &str) -> Option<ChatMessage> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        Some(self.exchange(ChatMessage::user(text)).await)
    }

    /// Transcribe recorded audio and send it as a voice message
    ///
    /// The reply is flagged for immediate playback.
    ///
    /// # Errors
    ///
    /// Returns error if voice input is not enabled or transcription fails;
    /// nothing is appended to the conversation in that case.
    pub async fn send_voice(&mut self, audio: Vec<u8>, file_name: &str) -> Result<ChatMessage> {
        let speech = self
            .speech
            .clone()
            .ok_or_else(|| TravelChatError::Speech("Voice input is not enabled".to_string()))?;

        let text = speech.transcribe(audio, file_name).await?;
        tracing::info!("Transcribed voice message ({} chars)", text.len());

        let reply = self
            .exchange(ChatMessage::user(text).voice_origin())
            .await;
        Ok(reply)
    }

    async fn exchange(&mut self, message: ChatMessage) -> ChatMessage {
        let voice = message.is_voice_origin;
        let request = ChatRequest::new(message.content.clone(), self.session.id.clone());
        self.append(message);

        let mut reply = match self.backend.chat(&request).await {
            Ok(response) => {
                let offered = response.hotel_data.unwrap_or_default();
                let total = offered.len();
                let hotels: Vec<Value> = offered.into_iter().filter(Value::is_object).collect();
                if hotels.len() < total {
                    tracing::warn!(
                        "Dropped {} hotel entries that are not JSON objects",
                        total - hotels.len()
                    );
                }

                let results = match response.selected_hotel {
                    Some(selected) if hotels.is_empty() && selected.is_object() => vec![selected],
                    _ => hotels,
                };
                ChatMessage::assistant(response.reply).with_results(results)
            }
            Err(e) => {
                tracing::error!("Assistant backend failed: {:#}", e);
                ChatMessage::assistant(FALLBACK_REPLY)
            }
        };

        if voice {
            reply = reply.auto_play();
        }

        self.append(reply.clone());
        reply
    }

    fn append(&mut self, message: ChatMessage) {
        self.session.push(message);
        self.persist();
    }

    fn persist(&mut self) {
        if self.session.title.is_empty() || self.session.title == DEFAULT_TITLE {
            let derived = self
                .session
                .first_user_message()
                .map(|first| generate_title(&first.content));
            if let Some(title) = derived {
                self.session.title = title;
            }
        }
        self.store.save_session(&self.session);
    }
}

fn fresh_session() -> ChatSession {
    let mut session = ChatSession::new(new_session_id(), DEFAULT_TITLE);
    session.push(ChatMessage::greeting());
    session
}
