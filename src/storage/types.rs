//! Chat session and message records
//!
//! In memory a message carries its structured results as a tagged
//! [`MessageKind`]. On disk it uses the flat camelCase layout shared with the
//! web client (`hotelData`, `autoPlay`, `isVoiceOrigin`). The conversion
//! between the two validates each record, so a malformed entry is rejected at
//! the storage boundary instead of surfacing half-populated fields later.

use crate::error::TravelChatError;
use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::atomic::{AtomicI64, Ordering};
use ulid::Ulid;

/// Reserved message id of the synthetic welcome greeting
pub const GREETING_ID: &str = "welcome";

/// Text of the synthetic welcome greeting shown in a fresh conversation
pub const GREETING_TEXT: &str = "Hi! I'm your travel assistant. Tell me about your dream trip and \
I'll help you find the perfect place to stay.";

/// Current time truncated to millisecond precision.
///
/// Stored timestamps carry milliseconds only; truncating at creation keeps a
/// saved-then-loaded timestamp equal to the original.
pub fn now_millis() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

static LAST_SESSION_MILLIS: AtomicI64 = AtomicI64::new(0);

/// Generate a new session id of the form `session_<unix millis>`
///
/// Ids issued by one process are strictly increasing: two sessions created
/// within the same millisecond get consecutive values.
pub fn new_session_id() -> String {
    let now = Utc::now().timestamp_millis();
    let prev = LAST_SESSION_MILLIS
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
            Some(now.max(last + 1))
        })
        .unwrap_or(now);
    format!("session_{}", now.max(prev + 1))
}

/// Author of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// Typed or spoken by the traveller
    User,
    /// Produced by the remote assistant
    Assistant,
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
        }
    }
}

/// Payload shape of a message
#[derive(Debug, Clone, PartialEq, Default)]
pub enum MessageKind {
    /// Plain text only
    #[default]
    Text,
    /// Text with structured results attached (e.g. hotel candidates)
    Results(Vec<Value>),
}

/// A single message in a conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "StoredMessage", into = "StoredMessage")]
pub struct ChatMessage {
    /// Opaque unique identifier, never reused
    pub id: String,
    /// Text payload (may be a speech transcription)
    pub content: String,
    /// Author, fixed at creation
    pub role: MessageRole,
    /// Creation time
    pub timestamp: DateTime<Utc>,
    /// Structured results attached to the message
    pub kind: MessageKind,
    /// Play the message audio as soon as it is shown
    pub auto_play: bool,
    /// Produced from a speech transcription rather than typed text
    pub is_voice_origin: bool,
}

impl ChatMessage {
    fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            id: Ulid::new().to_string(),
            content: content.into(),
            role,
            timestamp: now_millis(),
            kind: MessageKind::Text,
            auto_play: false,
            is_voice_origin: false,
        }
    }

    /// Create a user message
    ///
    /// # Examples
    ///
    /// ```
    /// use travelchat::storage::{ChatMessage, MessageRole};
    ///
    /// let msg = ChatMessage::user("hotels in Paris");
    /// assert_eq!(msg.role, MessageRole::User);
    /// ```
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    /// Create an assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }

    /// The synthetic welcome greeting that opens every fresh conversation
    pub fn greeting() -> Self {
        Self {
            id: GREETING_ID.to_string(),
            ..Self::assistant(GREETING_TEXT)
        }
    }

    /// Attach structured results
    ///
    /// Only JSON objects are kept. Nothing else could be read back from
    /// storage. If no objects remain, the message stays plain text.
    pub fn with_results(mut self, results: Vec<Value>) -> Self {
        let results: Vec<Value> = results.into_iter().filter(Value::is_object).collect();
        self.kind = if results.is_empty() {
            MessageKind::Text
        } else {
            MessageKind::Results(results)
        };
        self
    }

    /// Mark the message as produced from speech
    pub fn voice_origin(mut self) -> Self {
        self.is_voice_origin = true;
        self
    }

    /// Request immediate audio playback
    pub fn auto_play(mut self) -> Self {
        self.auto_play = true;
        self
    }

    /// Whether this is the synthetic welcome greeting
    pub fn is_greeting(&self) -> bool {
        self.id == GREETING_ID
    }

    /// Structured results, if any
    pub fn results(&self) -> Option<&[Value]> {
        match &self.kind {
            MessageKind::Text => None,
            MessageKind::Results(results) => Some(results),
        }
    }
}

/// On-disk layout of a message
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredMessage {
    id: String,
    content: String,
    role: String,
    timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    hotel_data: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    auto_play: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    is_voice_origin: Option<bool>,
}

impl TryFrom<StoredMessage> for ChatMessage {
    type Error = TravelChatError;

    fn try_from(stored: StoredMessage) -> Result<Self, Self::Error> {
        if stored.id.is_empty() {
            return Err(TravelChatError::MalformedRecord(
                "message id is empty".to_string(),
            ));
        }

        let role = match stored.role.as_str() {
            "user" => MessageRole::User,
            "assistant" => MessageRole::Assistant,
            other => {
                return Err(TravelChatError::MalformedRecord(format!(
                    "message {} has unknown role '{}'",
                    stored.id, other
                )))
            }
        };

        let timestamp = parse_timestamp(&stored.timestamp).map_err(|e| {
            TravelChatError::MalformedRecord(format!("message {}: {}", stored.id, e))
        })?;

        let kind = match stored.hotel_data {
            None => MessageKind::Text,
            Some(_) if role == MessageRole::User => {
                return Err(TravelChatError::MalformedRecord(format!(
                    "user message {} carries structured results",
                    stored.id
                )))
            }
            Some(results) if results.iter().any(|r| !r.is_object()) => {
                return Err(TravelChatError::MalformedRecord(format!(
                    "message {} has non-object structured results",
                    stored.id
                )))
            }
            Some(results) if results.is_empty() => MessageKind::Text,
            Some(results) => MessageKind::Results(results),
        };

        Ok(Self {
            id: stored.id,
            content: stored.content,
            role,
            timestamp,
            kind,
            auto_play: stored.auto_play.unwrap_or(false),
            is_voice_origin: stored.is_voice_origin.unwrap_or(false),
        })
    }
}

impl From<ChatMessage> for StoredMessage {
    fn from(msg: ChatMessage) -> Self {
        let hotel_data = match msg.kind {
            MessageKind::Text => None,
            MessageKind::Results(results) => Some(results),
        };
        Self {
            id: msg.id,
            content: msg.content,
            role: msg.role.to_string(),
            timestamp: format_timestamp(&msg.timestamp),
            hotel_data,
            auto_play: msg.auto_play.then_some(true),
            is_voice_origin: msg.is_voice_origin.then_some(true),
        }
    }
}

/// One continuous conversation thread
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "StoredSession", into = "StoredSession")]
pub struct ChatSession {
    /// Unique session identifier
    pub id: String,
    /// Short label derived from the first user message
    pub title: String,
    /// Conversation in order; only ever appended to
    pub messages: Vec<ChatMessage>,
    /// Copy of the most recent message's content
    pub last_message: Option<String>,
    /// Fixed at first save
    pub created_at: DateTime<Utc>,
    /// Refreshed on every save
    pub updated_at: DateTime<Utc>,
}

impl ChatSession {
    /// Create an empty session with the given id
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        let now = now_millis();
        Self {
            id: id.into(),
            title: title.into(),
            messages: Vec::new(),
            last_message: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Append a message and keep the preview in sync
    pub fn push(&mut self, message: ChatMessage) {
        self.last_message = Some(message.content.clone());
        self.messages.push(message);
    }

    /// True when the session holds nothing beyond the welcome greeting
    pub fn is_welcome_only(&self) -> bool {
        self.messages.iter().all(ChatMessage::is_greeting)
    }

    /// First user-authored message, if any
    pub fn first_user_message(&self) -> Option<&ChatMessage> {
        self.messages.iter().find(|m| m.role == MessageRole::User)
    }
}

/// On-disk layout of a session
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredSession {
    id: String,
    title: String,
    messages: Vec<ChatMessage>,
    #[serde(default)]
    last_message: Option<String>,
    created_at: String,
    updated_at: String,
}

impl TryFrom<StoredSession> for ChatSession {
    type Error = TravelChatError;

    fn try_from(stored: StoredSession) -> Result<Self, Self::Error> {
        if stored.id.is_empty() {
            return Err(TravelChatError::MalformedRecord(
                "session id is empty".to_string(),
            ));
        }
        let created_at = parse_timestamp(&stored.created_at).map_err(|e| {
            TravelChatError::MalformedRecord(format!("session {}: {}", stored.id, e))
        })?;
        let updated_at = parse_timestamp(&stored.updated_at).map_err(|e| {
            TravelChatError::MalformedRecord(format!("session {}: {}", stored.id, e))
        })?;

        Ok(Self {
            id: stored.id,
            title: stored.title,
            messages: stored.messages,
            last_message: stored.last_message,
            created_at,
            updated_at,
        })
    }
}

impl From<ChatSession> for StoredSession {
    fn from(session: ChatSession) -> Self {
        Self {
            id: session.id,
            title: session.title,
            messages: session.messages,
            last_message: session.last_message,
            created_at: format_timestamp(&session.created_at),
            updated_at: format_timestamp(&session.updated_at),
        }
    }
}

fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| format!("invalid timestamp '{}': {}", raw, e))
}
