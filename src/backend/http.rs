//! HTTP client for the assistant backend
//!
//! Talks JSON to the booking service: chat turns, server-side chat history,
//! and the hotel search endpoints.

use super::{AssistantBackend, ChatRequest, ChatResponse, Hotel};
use crate::config::BackendConfig;
use crate::error::{Result, TravelChatError};
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Assistant backend reached over HTTP
///
/// # Examples
///
/// ```
/// use travelchat::backend::HttpAssistantBackend;
/// use travelchat::config::BackendConfig;
///
/// let backend = HttpAssistantBackend::new(&BackendConfig::default()).unwrap();
/// assert_eq!(backend.base_url(), "http://localhost:8000");
/// ```
pub struct HttpAssistantBackend {
    client: Client,
    base_url: String,
}

impl HttpAssistantBackend {
    /// Create a client for the configured backend
    ///
    /// # Errors
    ///
    /// Returns error if HTTP client initialization fails
    pub fn new(config: &BackendConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(concat!("travelchat/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TravelChatError::Backend(format!("Failed to create HTTP client: {}", e)))?;

        let base_url = config.base_url.trim_end_matches('/').to_string();
        tracing::info!("Initialized assistant backend: base_url={}", base_url);

        Ok(Self { client, base_url })
    }

    /// Base URL requests are sent to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Search hotels matching a free-text query
    pub async fn search_hotels(&self, query: &str) -> Result<Vec<Hotel>> {
        let url = format!("{}/api/hotels/search", self.base_url);
        tracing::debug!("Searching hotels: {}", query);

        let response = self
            .client
            .get(&url)
            .query(&[("q", query)])
            .send()
            .await
            .map_err(|e| request_failed("Hotel search", e))?;

        read_json(check_status("Hotel search", response).await?).await
    }

    /// Details of one hotel; `None` when the backend does not know the id
    ///
    /// # Errors
    ///
    /// Returns error if the id is empty, `.` or `..`, or the request fails
    pub async fn hotel_details(&self, hotel_id: &str) -> Result<Option<Hotel>> {
        let url = self.hotel_url(hotel_id)?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| request_failed("Hotel details", e))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let hotel = read_json(check_status("Hotel details", response).await?).await?;
        Ok(Some(hotel))
    }

    /// `/api/hotels/<id>` with the id encoded as a single path segment
    fn hotel_url(&self, hotel_id: &str) -> Result<Url> {
        if matches!(hotel_id, "" | "." | "..") {
            return Err(TravelChatError::Backend(format!("Invalid hotel id: {:?}", hotel_id)).into());
        }

        let mut url = Url::parse(&self.base_url)
            .map_err(|e| TravelChatError::Backend(format!("Invalid base URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| TravelChatError::Backend(format!("Invalid base URL: {}", self.base_url)))?
            .pop_if_empty()
            .extend(["api", "hotels", hotel_id]);
        Ok(url)
    }

    fn history_url(&self, session_id: &str) -> String {
        format!("{}/api/chat/history/{}", self.base_url, session_id)
    }
}

#[async_trait]
impl AssistantBackend for HttpAssistantBackend {
    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse> {
        let url = format!("{}/api/chat/chat/", self.base_url);
        tracing::debug!(
            "Sending chat turn for session {} ({} chars)",
            request.session_id,
            request.message.len()
        );

        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| request_failed("Chat", e))?;

        let reply: ChatResponse = read_json(check_status("Chat", response).await?).await?;

        tracing::debug!(
            "Chat reply: {} chars, {} hotels, tools={:?}",
            reply.reply.len(),
            reply.hotel_data.as_ref().map_or(0, Vec::len),
            reply.tools_used
        );
        Ok(reply)
    }

    async fn history(&self, session_id: &str) -> Result<Vec<ChatResponse>> {
        let response = self
            .client
            .get(self.history_url(session_id))
            .send()
            .await
            .map_err(|e| request_failed("Chat history", e))?;

        read_json(check_status("Chat history", response).await?).await
    }

    async fn clear_history(&self, session_id: &str) -> Result<bool> {
        let response = self
            .client
            .delete(self.history_url(session_id))
            .send()
            .await
            .map_err(|e| request_failed("Clear chat history", e))?;

        Ok(response.status().is_success())
    }
}

fn request_failed(what: &str, e: reqwest::Error) -> TravelChatError {
    tracing::error!("{} request failed: {}", what, e);
    TravelChatError::Backend(format!("{} request failed: {}", what, e))
}

async fn check_status(what: &str, response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let error_text = response.text().await.unwrap_or_default();
    tracing::error!("{} returned error {}: {}", what, status, error_text);
    Err(TravelChatError::Backend(format!(
        "{} returned error {}: {}",
        what, status, error_text
    ))
    .into())
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T> {
    response.json().await.map_err(|e| {
        tracing::error!("Failed to parse backend response: {}", e);
        TravelChatError::Backend(format!("Failed to parse backend response: {}", e)).into()
    })
}
