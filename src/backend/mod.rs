//! Remote assistant backend
//!
//! The assistant itself (language understanding, hotel search, pricing) runs
//! in a separate service. This module defines the wire types it speaks and the
//! [`AssistantBackend`] trait the conversation controller talks through.

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub mod http;
pub mod speech;

pub use http::HttpAssistantBackend;
pub use speech::{HttpSpeechBackend, SpeechBackend};

/// Request body for a chat turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    /// The user's message text
    pub message: String,
    /// Client-side session identifier
    pub session_id: String,
}

impl ChatRequest {
    /// Build a request for one chat turn
    pub fn new(message: impl Into<String>, session_id: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            session_id: session_id.into(),
        }
    }
}

/// Reply to a chat turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    /// Assistant reply text
    pub reply: String,
    /// Session identifier echoed back
    pub session_id: String,
    /// Tools the assistant invoked while answering
    #[serde(default)]
    pub tools_used: Option<Vec<String>>,
    /// Hotel candidates found for the request
    #[serde(default)]
    pub hotel_data: Option<Vec<Value>>,
    /// Hotel the assistant singled out, if any
    #[serde(default)]
    pub selected_hotel: Option<Value>,
    /// Server-side time of the reply
    #[serde(default)]
    pub timestamp: Option<String>,
}

/// A bookable hotel as returned by the search endpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hotel {
    pub id: String,
    pub name: String,
    pub location: String,
    pub price: f64,
    pub rating: f64,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub amenities: Vec<String>,
    #[serde(default)]
    pub description: String,
}

/// Remote conversational assistant
///
/// # Examples
///
/// ```
/// use async_trait::async_trait;
/// use travelchat::backend::{AssistantBackend, ChatRequest, ChatResponse};
/// use travelchat::error::Result;
///
/// struct Echo;
///
/// #[async_trait]
/// impl AssistantBackend for Echo {
///     async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse> {
///         Ok(ChatResponse {
///             reply: format!("Echo: {}", request.message),
///             session_id: request.session_id.clone(),
///             tools_used: None,
///             hotel_data: None,
///             selected_hotel: None,
///             timestamp: None,
///         })
///     }
/// }
/// ```
#[async_trait]
pub trait AssistantBackend: Send + Sync {
    /// Send one message and wait for the assistant's reply
    ///
    /// # Errors
    ///
    /// Returns error on transport failure or an unusable response
    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse>;

    /// Server-side history for a session
    ///
    /// Backends without server-side history return an empty list.
    async fn history(&self, _session_id: &str) -> Result<Vec<ChatResponse>> {
        Ok(Vec::new())
    }

    /// Drop server-side history for a session, reporting whether it was cleared
    async fn clear_history(&self, _session_id: &str) -> Result<bool> {
        Ok(false)
    }
}
